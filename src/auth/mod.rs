/// Mock authentication
///
/// A faithful simulation of the backend's login behavior: input and format
/// validation, sliding-window rate limiting, per-account lockout, and mock
/// session issuance. Insecure by design - plaintext credential compare
/// against a seeded table - and only ever used in mock mode.
mod accounts;
mod attempts;
mod session;
mod simulator;

pub use accounts::{Account, AccountTable};
pub use attempts::{AttemptLedger, LoginAttempt, RateDecision};
pub use session::{
    mint_access_token, mint_refresh_token, parse_access_token, Session, SessionState,
    TokenClaims, UserProfile,
};
pub use simulator::{AuthSimulator, RegisterInput};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed failure taxonomy for login/register calls.
/// The simulator returns these and never lets an internal error escape raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginErrorKind {
    ValidationError,
    InvalidCredentials,
    AccountLocked,
    AccountInactive,
    TooManyAttempts,
    NetworkError,
    ServerError,
}

impl LoginErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginErrorKind::ValidationError => "VALIDATION_ERROR",
            LoginErrorKind::InvalidCredentials => "INVALID_CREDENTIALS",
            LoginErrorKind::AccountLocked => "ACCOUNT_LOCKED",
            LoginErrorKind::AccountInactive => "ACCOUNT_INACTIVE",
            LoginErrorKind::TooManyAttempts => "TOO_MANY_ATTEMPTS",
            LoginErrorKind::NetworkError => "NETWORK_ERROR",
            LoginErrorKind::ServerError => "SERVER_ERROR",
        }
    }
}

/// Kind-dependent detail payload surfaced to the UI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginErrorDetails {
    /// Which input fields were missing or malformed (validation errors)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub missing_fields: Vec<String>,
    /// Attempts left before lockout (wrong password)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_remaining: Option<u32>,
    /// When a locked account unlocks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_time: Option<DateTime<Utc>>,
    /// Seconds until the rate-limit window reopens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<i64>,
}

/// A login/register failure: kind, human-readable message, and details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginError {
    pub kind: LoginErrorKind,
    pub message: String,
    #[serde(default)]
    pub details: LoginErrorDetails,
}

impl LoginError {
    pub fn validation(message: impl Into<String>, missing_fields: Vec<String>) -> Self {
        Self {
            kind: LoginErrorKind::ValidationError,
            message: message.into(),
            details: LoginErrorDetails {
                missing_fields,
                ..Default::default()
            },
        }
    }

    /// Deliberately vague: never confirms whether the email exists
    pub fn invalid_credentials(attempts_remaining: Option<u32>) -> Self {
        Self {
            kind: LoginErrorKind::InvalidCredentials,
            message: "Invalid email or password".to_string(),
            details: LoginErrorDetails {
                attempts_remaining,
                ..Default::default()
            },
        }
    }

    pub fn locked(unlock_time: DateTime<Utc>) -> Self {
        Self {
            kind: LoginErrorKind::AccountLocked,
            message: "Account is locked due to too many failed attempts".to_string(),
            details: LoginErrorDetails {
                unlock_time: Some(unlock_time),
                ..Default::default()
            },
        }
    }

    pub fn inactive() -> Self {
        Self {
            kind: LoginErrorKind::AccountInactive,
            message: "Account is deactivated".to_string(),
            details: LoginErrorDetails::default(),
        }
    }

    pub fn too_many_attempts(retry_after_secs: i64) -> Self {
        Self {
            kind: LoginErrorKind::TooManyAttempts,
            message: "Too many login attempts, please try again later".to_string(),
            details: LoginErrorDetails {
                retry_after_secs: Some(retry_after_secs.max(0)),
                ..Default::default()
            },
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: LoginErrorKind::NetworkError,
            message: message.into(),
            details: LoginErrorDetails::default(),
        }
    }

    pub fn server_error() -> Self {
        Self {
            kind: LoginErrorKind::ServerError,
            message: "Something went wrong, please try again".to_string(),
            details: LoginErrorDetails::default(),
        }
    }
}

impl std::fmt::Display for LoginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}
