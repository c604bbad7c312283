use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialErrorCode {
    InvalidServiceAccount,
    Io,
    Parse,
}

impl CredentialErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialErrorCode::InvalidServiceAccount => "credential/invalid-service-account",
            CredentialErrorCode::Io => "credential/io",
            CredentialErrorCode::Parse => "credential/parse",
        }
    }
}

#[derive(Clone, Debug)]
pub struct CredentialError {
    pub code: CredentialErrorCode,
    message: String,
}

impl CredentialError {
    pub fn new(code: CredentialErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl Display for CredentialError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl Error for CredentialError {}

pub type CredentialResult<T> = Result<T, CredentialError>;

pub fn invalid_service_account(message: impl Into<String>) -> CredentialError {
    CredentialError::new(CredentialErrorCode::InvalidServiceAccount, message)
}

pub fn io_error(message: impl Into<String>) -> CredentialError {
    CredentialError::new(CredentialErrorCode::Io, message)
}

pub fn parse_error(message: impl Into<String>) -> CredentialError {
    CredentialError::new(CredentialErrorCode::Parse, message)
}
