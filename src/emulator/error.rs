use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmulatorErrorCode {
    InvalidHost,
    InvalidConfig,
    NotReady,
    Internal,
}

impl EmulatorErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmulatorErrorCode::InvalidHost => "emulator/invalid-host",
            EmulatorErrorCode::InvalidConfig => "emulator/invalid-config",
            EmulatorErrorCode::NotReady => "emulator/not-ready",
            EmulatorErrorCode::Internal => "emulator/internal",
        }
    }
}

#[derive(Clone, Debug)]
pub struct EmulatorError {
    pub code: EmulatorErrorCode,
    message: String,
}

impl EmulatorError {
    pub fn new(code: EmulatorErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for EmulatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl Error for EmulatorError {}

pub type EmulatorResult<T> = Result<T, EmulatorError>;

pub fn invalid_host(message: impl Into<String>) -> EmulatorError {
    EmulatorError::new(EmulatorErrorCode::InvalidHost, message)
}

pub fn invalid_config(message: impl Into<String>) -> EmulatorError {
    EmulatorError::new(EmulatorErrorCode::InvalidConfig, message)
}

pub fn not_ready(message: impl Into<String>) -> EmulatorError {
    EmulatorError::new(EmulatorErrorCode::NotReady, message)
}

pub fn internal_error(message: impl Into<String>) -> EmulatorError {
    EmulatorError::new(EmulatorErrorCode::Internal, message)
}
