use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageErrorCode {
    Unknown,
    InvalidUrl,
    InvalidDefaultBucket,
    NoDefaultBucket,
    InvalidArgument,
    ObjectNotFound,
    Unauthorized,
    Network,
    InternalError,
}

impl StorageErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageErrorCode::Unknown => "storage/unknown",
            StorageErrorCode::InvalidUrl => "storage/invalid-url",
            StorageErrorCode::InvalidDefaultBucket => "storage/invalid-default-bucket",
            StorageErrorCode::NoDefaultBucket => "storage/no-default-bucket",
            StorageErrorCode::InvalidArgument => "storage/invalid-argument",
            StorageErrorCode::ObjectNotFound => "storage/object-not-found",
            StorageErrorCode::Unauthorized => "storage/unauthorized",
            StorageErrorCode::Network => "storage/network-error",
            StorageErrorCode::InternalError => "storage/internal-error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageError {
    pub code: StorageErrorCode,
    message: String,
    pub status: Option<u16>,
    pub server_response: Option<String>,
}

impl StorageError {
    pub fn new(code: StorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            server_response: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_server_response(mut self, response: impl Into<String>) -> Self {
        self.server_response = Some(response.into());
        self
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.server_response.as_deref().filter(|body| !body.is_empty()) {
            Some(server) => write!(f, "{} ({}): {}", self.message, self.code_str(), server),
            None => write!(f, "{} ({})", self.message, self.code_str()),
        }
    }
}

impl Error for StorageError {}

pub type StorageResult<T> = Result<T, StorageError>;

pub fn invalid_url(url: &str) -> StorageError {
    StorageError::new(
        StorageErrorCode::InvalidUrl,
        format!("Invalid storage URL: {url}"),
    )
}

pub fn invalid_default_bucket(bucket: &str) -> StorageError {
    StorageError::new(
        StorageErrorCode::InvalidDefaultBucket,
        format!("Invalid default bucket: {bucket}"),
    )
}

pub fn no_default_bucket() -> StorageError {
    StorageError::new(
        StorageErrorCode::NoDefaultBucket,
        "No storage bucket configured on this app.",
    )
}

pub fn invalid_argument(message: impl Into<String>) -> StorageError {
    StorageError::new(StorageErrorCode::InvalidArgument, message)
}

pub fn network_error(message: impl Into<String>) -> StorageError {
    StorageError::new(StorageErrorCode::Network, message)
}

pub fn internal_error(message: impl Into<String>) -> StorageError {
    StorageError::new(StorageErrorCode::InternalError, message)
}

/// Error for an unexpected HTTP status, keeping the body for diagnostics.
pub fn unexpected_status(operation: &str, path: &str, status: u16, body: &str) -> StorageError {
    let code = match status {
        404 => StorageErrorCode::ObjectNotFound,
        401 | 403 => StorageErrorCode::Unauthorized,
        _ => StorageErrorCode::Unknown,
    };
    StorageError::new(
        code,
        format!("{operation} of '{path}' failed with HTTP {status}"),
    )
    .with_status(status)
    .with_server_response(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_selects_code() {
        assert_eq!(
            unexpected_status("Download", "a.txt", 404, "").code,
            StorageErrorCode::ObjectNotFound
        );
        assert_eq!(
            unexpected_status("Upload", "a.txt", 403, "").code,
            StorageErrorCode::Unauthorized
        );
        let err = unexpected_status("Upload", "a.txt", 500, "boom");
        assert_eq!(err.code, StorageErrorCode::Unknown);
        assert_eq!(err.status, Some(500));
        assert_eq!(
            err.to_string(),
            "Upload of 'a.txt' failed with HTTP 500 (storage/unknown): boom"
        );
    }
}
