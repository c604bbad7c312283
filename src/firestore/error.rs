use std::error::Error;
use std::fmt::{Display, Formatter};

/// Canonical codes the Firestore emulator reports, prefixed with `firestore/`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FirestoreErrorCode {
    InvalidArgument,
    FailedPrecondition,
    AlreadyExists,
    Aborted,
    NotFound,
    PermissionDenied,
    Unauthenticated,
    ResourceExhausted,
    DeadlineExceeded,
    Unavailable,
    Internal,
}

impl FirestoreErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "firestore/invalid-argument",
            Self::FailedPrecondition => "firestore/failed-precondition",
            Self::AlreadyExists => "firestore/already-exists",
            Self::Aborted => "firestore/aborted",
            Self::NotFound => "firestore/not-found",
            Self::PermissionDenied => "firestore/permission-denied",
            Self::Unauthenticated => "firestore/unauthenticated",
            Self::ResourceExhausted => "firestore/resource-exhausted",
            Self::DeadlineExceeded => "firestore/deadline-exceeded",
            Self::Unavailable => "firestore/unavailable",
            Self::Internal => "firestore/internal",
        }
    }

    /// Parses the `status` field of a Google API error body.
    pub fn from_status_name(status: &str) -> Option<Self> {
        let code = match status {
            "INVALID_ARGUMENT" | "OUT_OF_RANGE" => Self::InvalidArgument,
            "FAILED_PRECONDITION" => Self::FailedPrecondition,
            "ALREADY_EXISTS" => Self::AlreadyExists,
            "ABORTED" => Self::Aborted,
            "NOT_FOUND" => Self::NotFound,
            "PERMISSION_DENIED" => Self::PermissionDenied,
            "UNAUTHENTICATED" => Self::Unauthenticated,
            "RESOURCE_EXHAUSTED" => Self::ResourceExhausted,
            "DEADLINE_EXCEEDED" => Self::DeadlineExceeded,
            "UNAVAILABLE" => Self::Unavailable,
            "INTERNAL" | "UNKNOWN" | "DATA_LOSS" => Self::Internal,
            _ => return None,
        };
        Some(code)
    }
}

#[derive(Clone, Debug)]
pub struct FirestoreError {
    pub code: FirestoreErrorCode,
    message: String,
    status: Option<u16>,
}

impl FirestoreError {
    pub fn new(code: FirestoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
        }
    }

    /// Records the HTTP status the emulator answered with.
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

impl Display for FirestoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl Error for FirestoreError {}

pub type FirestoreResult<T> = Result<T, FirestoreError>;

pub fn invalid_argument(message: impl Into<String>) -> FirestoreError {
    FirestoreError::new(FirestoreErrorCode::InvalidArgument, message)
}

pub fn internal_error(message: impl Into<String>) -> FirestoreError {
    FirestoreError::new(FirestoreErrorCode::Internal, message)
}

pub fn unavailable(message: impl Into<String>) -> FirestoreError {
    FirestoreError::new(FirestoreErrorCode::Unavailable, message)
}

pub fn deadline_exceeded(message: impl Into<String>) -> FirestoreError {
    FirestoreError::new(FirestoreErrorCode::DeadlineExceeded, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_names_map_to_codes() {
        assert_eq!(
            FirestoreErrorCode::from_status_name("FAILED_PRECONDITION"),
            Some(FirestoreErrorCode::FailedPrecondition)
        );
        assert_eq!(
            FirestoreErrorCode::from_status_name("OUT_OF_RANGE"),
            Some(FirestoreErrorCode::InvalidArgument)
        );
        assert_eq!(FirestoreErrorCode::from_status_name("SOMETHING_NEW"), None);
    }

    #[test]
    fn display_carries_code() {
        let err = unavailable("emulator is starting").with_status(503);
        assert_eq!(err.to_string(), "emulator is starting (firestore/unavailable)");
        assert_eq!(err.status(), Some(503));
    }
}
