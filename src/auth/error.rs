use std::fmt::{Display, Formatter};

use serde::Deserialize;

use crate::credential::CredentialError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthErrorCode {
    UserNotFound,
    EmailAlreadyExists,
    UidAlreadyExists,
    InvalidArgument,
    InvalidCustomToken,
    Network,
    Internal,
}

impl AuthErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorCode::UserNotFound => "auth/user-not-found",
            AuthErrorCode::EmailAlreadyExists => "auth/email-already-exists",
            AuthErrorCode::UidAlreadyExists => "auth/uid-already-exists",
            AuthErrorCode::InvalidArgument => "auth/invalid-argument",
            AuthErrorCode::InvalidCustomToken => "auth/invalid-custom-token",
            AuthErrorCode::Network => "auth/network-request-failed",
            AuthErrorCode::Internal => "auth/internal-error",
        }
    }

    /// Maps the identity toolkit message token (`EMAIL_EXISTS`,
    /// `USER_NOT_FOUND : ...`) to a code.
    pub fn from_server_message(message: &str) -> Self {
        let token = message.split(':').next().unwrap_or_default().trim();
        match token {
            "EMAIL_EXISTS" => AuthErrorCode::EmailAlreadyExists,
            "DUPLICATE_LOCAL_ID" => AuthErrorCode::UidAlreadyExists,
            "USER_NOT_FOUND" | "EMAIL_NOT_FOUND" => AuthErrorCode::UserNotFound,
            "INVALID_CUSTOM_TOKEN" | "CREDENTIAL_MISMATCH" => AuthErrorCode::InvalidCustomToken,
            token
                if token.starts_with("INVALID_")
                    || token.starts_with("MISSING_")
                    || token.starts_with("WEAK_PASSWORD") =>
            {
                AuthErrorCode::InvalidArgument
            }
            _ => AuthErrorCode::Internal,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthError {
    pub code: AuthErrorCode,
    message: String,
    status: Option<u16>,
}

impl AuthError {
    pub fn new(code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for AuthError {}

impl From<CredentialError> for AuthError {
    fn from(error: CredentialError) -> Self {
        internal_error(format!("Credential unavailable: {error}"))
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

pub fn invalid_argument(message: impl Into<String>) -> AuthError {
    AuthError::new(AuthErrorCode::InvalidArgument, message)
}

pub fn user_not_found(message: impl Into<String>) -> AuthError {
    AuthError::new(AuthErrorCode::UserNotFound, message)
}

pub fn network_error(message: impl Into<String>) -> AuthError {
    AuthError::new(AuthErrorCode::Network, message)
}

pub fn internal_error(message: impl Into<String>) -> AuthError {
    AuthError::new(AuthErrorCode::Internal, message)
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Builds an error from a non-success identity toolkit response body.
pub(crate) fn map_http_error(status: u16, body: &str) -> AuthError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => {
            let code = AuthErrorCode::from_server_message(&envelope.error.message);
            AuthError::new(code, envelope.error.message).with_status(status)
        }
        _ => internal_error(format!("Auth emulator responded with HTTP {status}: {body}"))
            .with_status(status),
    }
}
