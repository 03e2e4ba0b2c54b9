//! REST request and response bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::OperationType;

/// Body of `POST /translate/start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTranslationRequest {
    /// File size in bytes.
    pub video_size: u64,
    pub project_type: OperationType,
    pub use_wallet_balance: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Raw `POST /translate/start` response. Every field but `success` is
/// optional on the wire; [`StartTranslationResponse::validate`] turns it
/// into a [`StartedTranslation`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTranslationResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub upload_token: Option<String>,
    #[serde(default)]
    pub upload_url: Option<String>,
    #[serde(default)]
    pub logs_url: Option<String>,
    #[serde(default)]
    pub chunk_size: Option<u64>,
    #[serde(default)]
    pub price: Option<f64>,
}

/// Why a start response could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidStartResponse {
    #[error("server rejected the request: {0}")]
    Rejected(String),

    #[error("missing field in start response: {0}")]
    Missing(&'static str),

    #[error("chunk size must be positive")]
    ZeroChunkSize,
}

/// Everything the upload session needs from a successful start call.
#[derive(Debug, Clone, PartialEq)]
pub struct StartedTranslation {
    pub project_id: u64,
    pub upload_token: String,
    pub upload_url: String,
    pub logs_url: String,
    pub chunk_size: u64,
    pub price: Option<f64>,
    pub estimated_time: Option<String>,
    pub message: Option<String>,
}

impl StartTranslationResponse {
    pub fn validate(self) -> Result<StartedTranslation, InvalidStartResponse> {
        if !self.success {
            return Err(InvalidStartResponse::Rejected(
                self.message
                    .unwrap_or_else(|| "translation could not be started".into()),
            ));
        }
        let chunk_size = self
            .chunk_size
            .ok_or(InvalidStartResponse::Missing("chunkSize"))?;
        if chunk_size == 0 {
            return Err(InvalidStartResponse::ZeroChunkSize);
        }
        Ok(StartedTranslation {
            project_id: self
                .project_id
                .ok_or(InvalidStartResponse::Missing("projectId"))?,
            upload_token: non_empty(self.upload_token, "uploadToken")?,
            upload_url: non_empty(self.upload_url, "uploadUrl")?,
            logs_url: non_empty(self.logs_url, "logsUrl")?,
            chunk_size,
            price: self.price,
            estimated_time: self.estimated_time,
            message: self.message,
        })
    }
}

fn non_empty(
    value: Option<String>,
    field: &'static str,
) -> Result<String, InvalidStartResponse> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(InvalidStartResponse::Missing(field)),
    }
}

/// `GET /translate/status/{id}` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<StatusData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
    #[serde(default)]
    pub project_id: Option<u64>,
    pub status: String,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub estimated_time_remaining: Option<String>,
}

// --- Auth ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordLoginRequest {
    pub mobile: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobileRequest {
    pub mobile: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpVerifyRequest {
    pub mobile: String,
    pub otp: String,
    pub otp_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupCompleteRequest {
    pub mobile: String,
    pub otp: String,
    pub otp_id: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub otp_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: u64,
    pub mobile: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub user: Option<UserInfo>,
}

// --- Account ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// `GET /account` response; only the fields the client reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<AccountData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountData {
    pub statistics: AccountStatistics,
    #[serde(default)]
    pub profile: Option<AccountProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatistics {
    pub current_balance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Generic `{success, message}` acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

// --- Wallet ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

// --- Errors ---

/// Error details extracted from a failed response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorDetail {
    pub code: Option<String>,
    pub message: String,
}

/// Extracts an error from a response body.
///
/// Understands `{"detail": {code, message}}`, `{"detail": "text"}` and
/// `{"success": false, "error": {code, message}}`.
pub fn parse_error_body(body: &str) -> Option<ErrorDetail> {
    let value: Value = serde_json::from_str(body).ok()?;
    let node = value.get("detail").or_else(|| value.get("error"))?;

    match node {
        Value::String(message) => Some(ErrorDetail {
            code: None,
            message: message.clone(),
        }),
        Value::Object(map) => {
            let message = map.get("message").and_then(Value::as_str)?.to_string();
            let code = map.get("code").and_then(Value::as_str).map(str::to_string);
            Some(ErrorDetail { code, message })
        }
        _ => None,
    }
}
