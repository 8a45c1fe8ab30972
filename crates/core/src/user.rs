//! Account rules: registration input, activation tokens, login gating.

use chrono::{DateTime, Utc};
use splittrip_shared::AppError;
use thiserror::Error;

/// Minimum accepted password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors raised by account rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserRuleError {
    /// Username is blank.
    #[error("username must not be empty")]
    EmptyUsername,

    /// Email is not an address.
    #[error("invalid email address")]
    InvalidEmail,

    /// Password is too short.
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,

    /// Activation token unknown.
    #[error("invalid activation token")]
    TokenInvalid,

    /// Activation token already consumed.
    #[error("activation token already used")]
    TokenUsed,

    /// Activation token past its lifetime.
    #[error("activation token expired")]
    TokenExpired,

    /// Unknown email or wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Account not activated yet.
    #[error("account is not activated")]
    Inactive,
}

impl From<UserRuleError> for AppError {
    fn from(err: UserRuleError) -> Self {
        match err {
            UserRuleError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            UserRuleError::Inactive => Self::Forbidden(err.to_string()),
            _ => Self::BadRequest(err.to_string()),
        }
    }
}

/// Registration input after normalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Trimmed username.
    pub username: String,
    /// Trimmed, lower-cased email.
    pub email: String,
}

/// Lower-cases and trims an email address.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Requires something shaped like `local@domain`.
///
/// # Errors
///
/// Returns `UserRuleError::InvalidEmail` otherwise.
pub fn validate_email(email: &str) -> Result<String, UserRuleError> {
    let email = normalize_email(email);
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(email)
        }
        _ => Err(UserRuleError::InvalidEmail),
    }
}

/// Validates registration input.
///
/// # Errors
///
/// Returns the first rule the input breaks.
pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
) -> Result<Registration, UserRuleError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(UserRuleError::EmptyUsername);
    }
    let email = validate_email(email)?;
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(UserRuleError::PasswordTooShort);
    }
    Ok(Registration {
        username: username.to_string(),
        email,
    })
}

/// Checks a stored activation token at `now`.
///
/// # Errors
///
/// Returns `TokenUsed` or `TokenExpired`.
pub fn check_activation_token(
    expires_at: DateTime<Utc>,
    used_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(), UserRuleError> {
    if used_at.is_some() {
        return Err(UserRuleError::TokenUsed);
    }
    if now >= expires_at {
        return Err(UserRuleError::TokenExpired);
    }
    Ok(())
}

/// Requires an activated account.
///
/// # Errors
///
/// Returns `UserRuleError::Inactive`.
pub fn ensure_active(is_active: bool) -> Result<(), UserRuleError> {
    if is_active {
        Ok(())
    } else {
        Err(UserRuleError::Inactive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;
    use splittrip_shared::ErrorKind;

    #[test]
    fn test_registration_normalises_input() {
        let reg = validate_registration("  alice ", " Alice@Example.COM ", "longenough").unwrap();
        assert_eq!(reg.username, "alice");
        assert_eq!(reg.email, "alice@example.com");
    }

    #[rstest]
    #[case("", "a@b.c", "longenough", UserRuleError::EmptyUsername)]
    #[case("bob", "not-an-email", "longenough", UserRuleError::InvalidEmail)]
    #[case("bob", "@b.c", "longenough", UserRuleError::InvalidEmail)]
    #[case("bob", "a@b@c", "longenough", UserRuleError::InvalidEmail)]
    #[case("bob", "a@b.c", "short", UserRuleError::PasswordTooShort)]
    fn test_registration_rejects(
        #[case] username: &str,
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: UserRuleError,
    ) {
        assert_eq!(validate_registration(username, email, password), Err(expected));
    }

    #[test]
    fn test_activation_token_window() {
        let now = Utc::now();
        let expires = now + Duration::hours(24);
        assert!(check_activation_token(expires, None, now).is_ok());
        assert_eq!(
            check_activation_token(expires, Some(now), now),
            Err(UserRuleError::TokenUsed)
        );
        assert_eq!(
            check_activation_token(expires, None, expires),
            Err(UserRuleError::TokenExpired)
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(AppError::from(UserRuleError::InvalidCredentials).kind(), ErrorKind::Unauthorized);
        assert_eq!(AppError::from(UserRuleError::Inactive).kind(), ErrorKind::Forbidden);
        assert_eq!(AppError::from(UserRuleError::TokenExpired).kind(), ErrorKind::BadRequest);
        assert!(ensure_active(true).is_ok());
    }
}
