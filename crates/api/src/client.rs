//! Backend REST client.
//!
//! Async HTTP client using `reqwest` with optional Bearer token
//! authentication. Successful logins store the returned token.

use dubhub_protocol::JobStatus;
use dubhub_protocol::api::{
    Ack, AccountResponse, LoginResponse, MobileRequest, OtpResponse, OtpVerifyRequest,
    PasswordChange, PasswordLoginRequest, PaymentRequest, PaymentResponse, ProfileUpdate,
    SignupCompleteRequest, StartTranslationRequest, StartTranslationResponse, StartedTranslation,
    StatusResponse, UserInfo, parse_error_body,
};
use dubhub_protocol::constants::HTTP_REQUEST_TIMEOUT;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::validate;

/// Result of a status query.
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatusReport {
    pub project_id: Option<u64>,
    pub status: JobStatus,
    /// Status string as sent by the server.
    pub raw_status: String,
    pub progress: Option<f64>,
    pub estimated_time_remaining: Option<String>,
}

/// Token and user returned by a successful login or signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSession {
    pub token: String,
    pub user: Option<UserInfo>,
    pub message: String,
}

/// First half of a one-time-code handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpChallenge {
    pub otp_id: String,
    pub message: String,
}

/// dubhub backend client.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Creates a client for the API rooted at `base_url`
    /// (e.g. `http://127.0.0.1:8000/v1`).
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Attaches a previously stored session token.
    pub fn with_token(mut self, token: impl Into<String>) -> Result<Self, ApiError> {
        self.set_token(token)?;
        Ok(self)
    }

    pub fn set_token(&mut self, token: impl Into<String>) -> Result<(), ApiError> {
        let token = token.into();
        if token.is_empty() || token.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ApiError::InvalidToken);
        }
        self.token = Some(token);
        Ok(())
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, endpoint);
        let req = self.http.request(method, url);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        req: RequestBuilder,
    ) -> Result<T, ApiError> {
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        tracing::debug!(endpoint, status = status.as_u16(), "backend response");

        if !status.is_success() {
            return Err(error_from_body(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.execute(endpoint, self.request(Method::GET, endpoint))
            .await
    }

    async fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(endpoint, self.request(method, endpoint).json(body))
            .await
    }

    // -----------------------------------------------------------------------
    // Translation
    // -----------------------------------------------------------------------

    /// Creates a project and returns the upload parameters.
    pub async fn start_translation(
        &self,
        request: &StartTranslationRequest,
    ) -> Result<StartedTranslation, ApiError> {
        let resp: StartTranslationResponse = self
            .send(Method::POST, "/translate/start", request)
            .await?;
        let started = resp.validate()?;
        tracing::info!(
            project_id = started.project_id,
            chunk_size = started.chunk_size,
            "translation started"
        );
        Ok(started)
    }

    /// Queries the processing status of a project.
    pub async fn translation_status(&self, project_id: u64) -> Result<JobStatusReport, ApiError> {
        let resp: StatusResponse = self
            .get(&format!("/translate/status/{project_id}"))
            .await?;
        if !resp.success {
            return Err(ApiError::Rejected(format!(
                "status unavailable for project {project_id}"
            )));
        }
        let data = resp
            .data
            .ok_or_else(|| ApiError::Malformed("status response without data".into()))?;
        Ok(JobStatusReport {
            project_id: data.project_id,
            status: JobStatus::from_wire(&data.status),
            raw_status: data.status,
            progress: data.progress,
            estimated_time_remaining: data.estimated_time_remaining,
        })
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    /// Logs in with mobile number and password.
    pub async fn login_password(
        &mut self,
        mobile: &str,
        password: &str,
    ) -> Result<LoginSession, ApiError> {
        validate::validate_mobile(mobile)?;
        if password.is_empty() {
            return Err(ApiError::Validation("password is required".into()));
        }
        let body = PasswordLoginRequest {
            mobile: mobile.to_string(),
            password: password.to_string(),
        };
        let resp: LoginResponse = self
            .send(Method::POST, "/auth/login-password", &body)
            .await?;
        self.accept_login(resp)
    }

    /// Asks the server to text a login code to `mobile`.
    pub async fn request_login_otp(&self, mobile: &str) -> Result<OtpChallenge, ApiError> {
        self.request_otp("/auth/login-otp", mobile).await
    }

    /// Completes a code login started with [`request_login_otp`](Self::request_login_otp).
    pub async fn verify_login_otp(
        &mut self,
        mobile: &str,
        otp: &str,
        otp_id: &str,
    ) -> Result<LoginSession, ApiError> {
        validate::validate_mobile(mobile)?;
        validate::validate_otp(otp)?;
        let body = OtpVerifyRequest {
            mobile: mobile.to_string(),
            otp: otp.to_string(),
            otp_id: otp_id.to_string(),
        };
        let resp: LoginResponse = self
            .send(Method::POST, "/auth/login-otp-verify", &body)
            .await?;
        self.accept_login(resp)
    }

    /// Asks the server to text a signup code to `mobile`.
    pub async fn request_signup_otp(&self, mobile: &str) -> Result<OtpChallenge, ApiError> {
        self.request_otp("/auth/signup-otp", mobile).await
    }

    /// Creates the account and logs in.
    pub async fn complete_signup(
        &mut self,
        mobile: &str,
        otp: &str,
        otp_id: &str,
        password: &str,
    ) -> Result<LoginSession, ApiError> {
        validate::validate_mobile(mobile)?;
        validate::validate_otp(otp)?;
        validate::validate_password(password)?;
        let body = SignupCompleteRequest {
            mobile: mobile.to_string(),
            otp: otp.to_string(),
            otp_id: otp_id.to_string(),
            password: password.to_string(),
        };
        let resp: LoginResponse = self
            .send(Method::POST, "/auth/signup-complete", &body)
            .await?;
        self.accept_login(resp)
    }

    async fn request_otp(&self, endpoint: &str, mobile: &str) -> Result<OtpChallenge, ApiError> {
        validate::validate_mobile(mobile)?;
        let body = MobileRequest {
            mobile: mobile.to_string(),
        };
        let resp: OtpResponse = self.send(Method::POST, endpoint, &body).await?;
        if !resp.success {
            return Err(ApiError::Rejected(resp.message));
        }
        if resp.otp_id.is_empty() {
            return Err(ApiError::Malformed("otp response without otpId".into()));
        }
        Ok(OtpChallenge {
            otp_id: resp.otp_id,
            message: resp.message,
        })
    }

    fn accept_login(&mut self, resp: LoginResponse) -> Result<LoginSession, ApiError> {
        if !resp.success {
            return Err(ApiError::Rejected(resp.message));
        }
        if resp.token.is_empty() {
            return Err(ApiError::Malformed("login response without token".into()));
        }
        self.set_token(resp.token.clone())?;
        tracing::info!(
            user_id = resp.user.as_ref().map(|u| u.id),
            "logged in"
        );
        Ok(LoginSession {
            token: resp.token,
            user: resp.user,
            message: resp.message,
        })
    }

    // -----------------------------------------------------------------------
    // Account & wallet
    // -----------------------------------------------------------------------

    /// Current wallet balance in Toman.
    pub async fn account_balance(&self) -> Result<f64, ApiError> {
        let resp: AccountResponse = self.get("/account").await?;
        if !resp.success {
            return Err(ApiError::Rejected("account unavailable".into()));
        }
        resp.data
            .map(|d| d.statistics.current_balance)
            .ok_or_else(|| ApiError::Malformed("account response without data".into()))
    }

    pub async fn update_profile(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<String, ApiError> {
        validate::validate_profile(first_name, last_name)?;
        let body = ProfileUpdate {
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
        };
        let resp: Ack = self.send(Method::PUT, "/account/profile", &body).await?;
        ack_message(resp)
    }

    pub async fn change_password(
        &self,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<String, ApiError> {
        validate::validate_password_change(current, new, confirm)?;
        let body = PasswordChange {
            current_password: current.to_string(),
            new_password: new.to_string(),
        };
        let resp: Ack = self.send(Method::PUT, "/account/password", &body).await?;
        ack_message(resp)
    }

    /// Opens a wallet top-up and returns the payment gateway URL.
    pub async fn wallet_payment(&self, amount: u64) -> Result<String, ApiError> {
        validate::validate_amount(amount)?;
        let resp: PaymentResponse = self
            .send(Method::POST, "/wallet/payment", &PaymentRequest { amount })
            .await?;
        if !resp.success {
            return Err(ApiError::Rejected(resp.message));
        }
        tracing::info!(amount, payment_id = ?resp.payment_id, "payment created");
        resp.redirect_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ApiError::Malformed("payment response without redirectUrl".into()))
    }
}

fn ack_message(resp: Ack) -> Result<String, ApiError> {
    if resp.success {
        Ok(resp.message)
    } else {
        Err(ApiError::Rejected(resp.message))
    }
}

/// Maps a non-2xx response onto an [`ApiError`].
fn error_from_body(status: StatusCode, body: &str) -> ApiError {
    let detail = parse_error_body(body);
    if status == StatusCode::UNAUTHORIZED {
        return ApiError::Unauthorized(
            detail
                .map(|d| d.message)
                .unwrap_or_else(|| "authentication required".into()),
        );
    }
    match detail {
        Some(d) => ApiError::Server {
            status: status.as_u16(),
            code: d.code,
            message: d.message,
        },
        None => ApiError::Server {
            status: status.as_u16(),
            code: None,
            message: match body.trim() {
                "" => status.canonical_reason().unwrap_or("error").to_string(),
                text => text.to_string(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dubhub_protocol::OperationType;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Starts a one-shot HTTP server. The handle resolves to the raw request.
    async fn mock_server(status: u16, body: &str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}/v1");
        let body = body.to_string();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;

            let resp = format!(
                "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(resp.as_bytes()).await;
            let _ = stream.shutdown().await;
            request
        });

        (url, handle)
    }

    async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&data);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if data.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).into_owned()
    }

    fn request_body(raw: &str) -> serde_json::Value {
        let (_, body) = raw.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    #[tokio::test]
    async fn start_translation_posts_camel_case() {
        let json = r#"{"success":true,"message":"ok","projectId":9,"estimatedTime":"10 minutes",
            "uploadToken":"up-tok","uploadUrl":"http://h/v1/ws/upload/x?token=up-tok",
            "logsUrl":"http://h/v1/ws/logs/x?token=up-tok","price":7500.0,"chunkSize":1048576}"#;
        let (url, handle) = mock_server(200, json).await;

        let client = ApiClient::new(&url).unwrap().with_token("session").unwrap();
        let started = client
            .start_translation(&StartTranslationRequest {
                video_size: 2048,
                project_type: OperationType::PersianDubbing,
                use_wallet_balance: true,
                resolution: Some("1920x1080".into()),
                duration: Some(61.0),
            })
            .await
            .unwrap();

        assert_eq!(started.project_id, 9);
        assert_eq!(started.chunk_size, 1_048_576);

        let raw = handle.await.unwrap();
        assert!(raw.starts_with("POST /v1/translate/start "));
        assert!(raw.to_ascii_lowercase().contains("authorization: bearer session"));
        let body = request_body(&raw);
        assert_eq!(body["videoSize"], 2048);
        assert_eq!(body["projectType"], "persian_dubbing");
    }

    #[tokio::test]
    async fn start_translation_rejected() {
        let (url, handle) =
            mock_server(200, r#"{"success":false,"message":"insufficient balance"}"#).await;
        let client = ApiClient::new(&url).unwrap();
        let err = client
            .start_translation(&StartTranslationRequest {
                video_size: 1,
                project_type: OperationType::EnglishSubtitle,
                use_wallet_balance: true,
                resolution: None,
                duration: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "insufficient balance"));
        handle.abort();
    }

    #[tokio::test]
    async fn status_maps_wire_values() {
        let (url, handle) = mock_server(
            200,
            r#"{"success":true,"data":{"projectId":5,"status":"awaiting queue","progress":0}}"#,
        )
        .await;
        let client = ApiClient::new(&url).unwrap();
        let report = client.translation_status(5).await.unwrap();
        assert_eq!(report.status, JobStatus::Processing);
        assert_eq!(report.raw_status, "awaiting queue");

        let raw = handle.await.unwrap();
        assert!(raw.starts_with("GET /v1/translate/status/5 "));
    }

    #[tokio::test]
    async fn status_without_data_is_malformed() {
        let (url, handle) = mock_server(200, r#"{"success":true}"#).await;
        let client = ApiClient::new(&url).unwrap();
        let err = client.translation_status(1).await.unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
        handle.abort();
    }

    #[tokio::test]
    async fn server_error_body_is_parsed() {
        let (url, handle) = mock_server(
            404,
            r#"{"success":false,"error":{"code":"NOT_FOUND","message":"project missing"}}"#,
        )
        .await;
        let client = ApiClient::new(&url).unwrap();
        let err = client.translation_status(77).await.unwrap_err();
        match err {
            ApiError::Server {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 404);
                assert_eq!(code.as_deref(), Some("NOT_FOUND"));
                assert_eq!(message, "project missing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        handle.abort();
    }

    #[tokio::test]
    async fn unauthorized_maps_to_unauthorized() {
        let (url, handle) = mock_server(401, r#"{"detail":"Not authenticated"}"#).await;
        let client = ApiClient::new(&url).unwrap();
        let err = client.account_balance().await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Not authenticated"));
        handle.abort();
    }

    #[tokio::test]
    async fn login_stores_token() {
        let (url, handle) = mock_server(
            200,
            r#"{"success":true,"message":"welcome","token":"jwt-abc","user":{"id":3,"mobile":"09121234567"}}"#,
        )
        .await;
        let mut client = ApiClient::new(&url).unwrap();
        let session = client.login_password("09121234567", "secret12").await.unwrap();

        assert_eq!(session.token, "jwt-abc");
        assert_eq!(client.token(), Some("jwt-abc"));
        assert_eq!(session.user.unwrap().id, 3);

        let raw = handle.await.unwrap();
        let body = request_body(&raw);
        assert_eq!(body["mobile"], "09121234567");
        assert_eq!(body["password"], "secret12");
    }

    #[tokio::test]
    async fn failed_login_keeps_no_token() {
        let (url, handle) = mock_server(
            400,
            r#"{"detail":{"code":"INVALID_CREDENTIALS","message":"wrong password"}}"#,
        )
        .await;
        let mut client = ApiClient::new(&url).unwrap();
        let err = client
            .login_password("09121234567", "secret12")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 400, .. }));
        assert_eq!(client.token(), None);
        handle.abort();
    }

    #[tokio::test]
    async fn otp_login_handshake() {
        let (url, handle) =
            mock_server(200, r#"{"success":true,"message":"code sent","otpId":"otp-1"}"#).await;
        let client = ApiClient::new(&url).unwrap();
        let challenge = client.request_login_otp("09121234567").await.unwrap();
        assert_eq!(challenge.otp_id, "otp-1");
        let raw = handle.await.unwrap();
        assert!(raw.starts_with("POST /v1/auth/login-otp "));

        let (url, handle) = mock_server(
            200,
            r#"{"success":true,"message":"ok","token":"jwt-otp","user":{"id":1,"mobile":"09121234567"}}"#,
        )
        .await;
        let mut client = ApiClient::new(&url).unwrap();
        client
            .verify_login_otp("09121234567", "12345", &challenge.otp_id)
            .await
            .unwrap();
        assert_eq!(client.token(), Some("jwt-otp"));
        let body = request_body(&handle.await.unwrap());
        assert_eq!(body["otpId"], "otp-1");
        assert_eq!(body["otp"], "12345");
    }

    #[tokio::test]
    async fn signup_validates_password_before_request() {
        let mut client = ApiClient::new("http://127.0.0.1:9/v1").unwrap();
        let err = client
            .complete_signup("09121234567", "12345", "otp-1", "short")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn invalid_mobile_is_rejected_locally() {
        let client = ApiClient::new("http://127.0.0.1:9/v1").unwrap();
        let err = client.request_signup_otp("12345").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn profile_update_uses_put() {
        let (url, handle) = mock_server(200, r#"{"success":true,"message":"saved"}"#).await;
        let client = ApiClient::new(&url).unwrap().with_token("t").unwrap();
        let msg = client.update_profile(" Sara ", "Ahmadi").await.unwrap();
        assert_eq!(msg, "saved");

        let raw = handle.await.unwrap();
        assert!(raw.starts_with("PUT /v1/account/profile "));
        let body = request_body(&raw);
        assert_eq!(body["firstName"], "Sara");
        assert_eq!(body["lastName"], "Ahmadi");
    }

    #[tokio::test]
    async fn password_change_mismatch_never_sent() {
        let client = ApiClient::new("http://127.0.0.1:9/v1").unwrap();
        let err = client
            .change_password("oldpass1", "newpass12", "newpass21")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn wallet_payment_returns_redirect() {
        let (url, handle) = mock_server(
            200,
            r#"{"success":true,"message":"ok","paymentId":"p-1","redirectUrl":"https://pay.example/start/p-1"}"#,
        )
        .await;
        let client = ApiClient::new(&url).unwrap().with_token("t").unwrap();
        let redirect = client.wallet_payment(50_000).await.unwrap();
        assert_eq!(redirect, "https://pay.example/start/p-1");
        let body = request_body(&handle.await.unwrap());
        assert_eq!(body["amount"], 50_000);
    }

    #[tokio::test]
    async fn account_balance_reads_statistics() {
        let (url, handle) = mock_server(
            200,
            r#"{"success":true,"data":{"statistics":{"currentBalance":12000}}}"#,
        )
        .await;
        let client = ApiClient::new(&url).unwrap().with_token("t").unwrap();
        assert_eq!(client.account_balance().await.unwrap(), 12000.0);
        handle.abort();
    }

    #[test]
    fn token_validation() {
        let client = ApiClient::new("http://localhost/v1").unwrap();
        assert!(matches!(client.with_token(""), Err(ApiError::InvalidToken)));
        let client = ApiClient::new("http://localhost/v1/").unwrap();
        assert_eq!(client.base_url(), "http://localhost/v1");
        assert!(matches!(
            client.with_token("has space"),
            Err(ApiError::InvalidToken)
        ));
    }

    #[test]
    fn empty_error_body_uses_reason() {
        let err = error_from_body(StatusCode::BAD_GATEWAY, "");
        assert!(matches!(err, ApiError::Server { status: 502, ref message, .. } if message == "Bad Gateway"));
    }
}
