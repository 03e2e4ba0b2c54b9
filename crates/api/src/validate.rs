//! Client-side form checks run before a request is sent.

use dubhub_protocol::constants::MIN_PASSWORD_LEN;

use crate::ApiError;

/// Iranian mobile number: `09` followed by nine digits.
pub fn validate_mobile(mobile: &str) -> Result<(), ApiError> {
    let ok = mobile.len() == 11
        && mobile.starts_with("09")
        && mobile.bytes().all(|b| b.is_ascii_digit());
    if ok {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "invalid mobile number: {mobile}"
        )))
    }
}

/// At least [`MIN_PASSWORD_LEN`] characters including one digit.
pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ApiError::Validation(
            "password must contain at least one digit".into(),
        ));
    }
    Ok(())
}

pub fn validate_otp(otp: &str) -> Result<(), ApiError> {
    if otp.is_empty() || !otp.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::Validation("verification code must be numeric".into()));
    }
    Ok(())
}

pub fn validate_profile(first_name: &str, last_name: &str) -> Result<(), ApiError> {
    if first_name.trim().is_empty() || last_name.trim().is_empty() {
        return Err(ApiError::Validation(
            "first and last name are required".into(),
        ));
    }
    Ok(())
}

/// Checks a password change form: all fields present, the new password
/// long enough and confirmed.
pub fn validate_password_change(
    current: &str,
    new: &str,
    confirm: &str,
) -> Result<(), ApiError> {
    if current.is_empty() || new.is_empty() || confirm.is_empty() {
        return Err(ApiError::Validation("all password fields are required".into()));
    }
    if new.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "new password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if new != confirm {
        return Err(ApiError::Validation(
            "new password and confirmation do not match".into(),
        ));
    }
    Ok(())
}

pub fn validate_amount(amount: u64) -> Result<(), ApiError> {
    if amount == 0 {
        return Err(ApiError::Validation("amount must be positive".into()));
    }
    Ok(())
}
