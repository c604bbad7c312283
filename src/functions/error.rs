use std::fmt::{Display, Formatter};

use serde_json::Value as JsonValue;

/// Canonical callable error codes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FunctionsErrorCode {
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl FunctionsErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionsErrorCode::Cancelled => "functions/cancelled",
            FunctionsErrorCode::Unknown => "functions/unknown",
            FunctionsErrorCode::InvalidArgument => "functions/invalid-argument",
            FunctionsErrorCode::DeadlineExceeded => "functions/deadline-exceeded",
            FunctionsErrorCode::NotFound => "functions/not-found",
            FunctionsErrorCode::AlreadyExists => "functions/already-exists",
            FunctionsErrorCode::PermissionDenied => "functions/permission-denied",
            FunctionsErrorCode::ResourceExhausted => "functions/resource-exhausted",
            FunctionsErrorCode::FailedPrecondition => "functions/failed-precondition",
            FunctionsErrorCode::Aborted => "functions/aborted",
            FunctionsErrorCode::OutOfRange => "functions/out-of-range",
            FunctionsErrorCode::Unimplemented => "functions/unimplemented",
            FunctionsErrorCode::Internal => "functions/internal",
            FunctionsErrorCode::Unavailable => "functions/unavailable",
            FunctionsErrorCode::DataLoss => "functions/data-loss",
            FunctionsErrorCode::Unauthenticated => "functions/unauthenticated",
        }
    }

    /// Parses the `status` string of a callable error body (`NOT_FOUND`, ...).
    pub fn from_status_name(status: &str) -> Option<Self> {
        let code = match status {
            "CANCELLED" => FunctionsErrorCode::Cancelled,
            "UNKNOWN" => FunctionsErrorCode::Unknown,
            "INVALID_ARGUMENT" => FunctionsErrorCode::InvalidArgument,
            "DEADLINE_EXCEEDED" => FunctionsErrorCode::DeadlineExceeded,
            "NOT_FOUND" => FunctionsErrorCode::NotFound,
            "ALREADY_EXISTS" => FunctionsErrorCode::AlreadyExists,
            "PERMISSION_DENIED" => FunctionsErrorCode::PermissionDenied,
            "RESOURCE_EXHAUSTED" => FunctionsErrorCode::ResourceExhausted,
            "FAILED_PRECONDITION" => FunctionsErrorCode::FailedPrecondition,
            "ABORTED" => FunctionsErrorCode::Aborted,
            "OUT_OF_RANGE" => FunctionsErrorCode::OutOfRange,
            "UNIMPLEMENTED" => FunctionsErrorCode::Unimplemented,
            "INTERNAL" => FunctionsErrorCode::Internal,
            "UNAVAILABLE" => FunctionsErrorCode::Unavailable,
            "DATA_LOSS" => FunctionsErrorCode::DataLoss,
            "UNAUTHENTICATED" => FunctionsErrorCode::Unauthenticated,
            _ => return None,
        };
        Some(code)
    }

    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => FunctionsErrorCode::InvalidArgument,
            401 => FunctionsErrorCode::Unauthenticated,
            403 => FunctionsErrorCode::PermissionDenied,
            404 => FunctionsErrorCode::NotFound,
            409 => FunctionsErrorCode::Aborted,
            429 => FunctionsErrorCode::ResourceExhausted,
            499 => FunctionsErrorCode::Cancelled,
            500 => FunctionsErrorCode::Internal,
            501 => FunctionsErrorCode::Unimplemented,
            503 => FunctionsErrorCode::Unavailable,
            504 => FunctionsErrorCode::DeadlineExceeded,
            _ => FunctionsErrorCode::Unknown,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FunctionsError {
    pub code: FunctionsErrorCode,
    message: String,
    details: Option<JsonValue>,
}

impl FunctionsError {
    pub fn new(code: FunctionsErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: JsonValue) -> Self {
        self.details = Some(details);
        self
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&JsonValue> {
        self.details.as_ref()
    }
}

impl Display for FunctionsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for FunctionsError {}

pub type FunctionsResult<T> = Result<T, FunctionsError>;

pub fn invalid_argument(message: impl Into<String>) -> FunctionsError {
    FunctionsError::new(FunctionsErrorCode::InvalidArgument, message)
}

pub fn internal_error(message: impl Into<String>) -> FunctionsError {
    FunctionsError::new(FunctionsErrorCode::Internal, message)
}

/// Returns the error described by a callable response, or `None` on success.
///
/// The body's `error.status` wins over the HTTP status when both are present.
pub fn error_for_http_response(status: u16, body: Option<&JsonValue>) -> Option<FunctionsError> {
    let mut code = if (200..300).contains(&status) {
        None
    } else {
        Some(FunctionsErrorCode::from_http_status(status))
    };
    let mut message = None;
    let mut details = None;

    if let Some(error) = body.and_then(|body| body.get("error")) {
        match error.get("status") {
            Some(JsonValue::String(name)) => match FunctionsErrorCode::from_status_name(name) {
                Some(parsed) => code = Some(parsed),
                None => code = Some(FunctionsErrorCode::Internal),
            },
            Some(_) => code = Some(FunctionsErrorCode::Internal),
            None => {}
        }
        message = error
            .get("message")
            .and_then(JsonValue::as_str)
            .map(str::to_string);
        details = error.get("details").cloned();
    }

    let code = code?;
    let message = message.unwrap_or_else(|| code.as_str().trim_start_matches("functions/").to_string());
    let error = FunctionsError::new(code, message);
    Some(match details {
        Some(details) => error.with_details(details),
        None => error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_has_no_error() {
        assert!(error_for_http_response(200, Some(&json!({ "result": 1 }))).is_none());
    }

    #[test]
    fn body_status_wins() {
        let body = json!({
            "error": { "status": "NOT_FOUND", "message": "Account not found", "details": { "id": "x" } }
        });
        let err = error_for_http_response(400, Some(&body)).unwrap();
        assert_eq!(err.code, FunctionsErrorCode::NotFound);
        assert_eq!(err.message(), "Account not found");
        assert_eq!(err.details(), Some(&json!({ "id": "x" })));
    }

    #[test]
    fn http_status_is_the_fallback() {
        let err = error_for_http_response(503, None).unwrap();
        assert_eq!(err.code, FunctionsErrorCode::Unavailable);
        assert_eq!(err.to_string(), "unavailable (functions/unavailable)");
    }

    #[test]
    fn unknown_status_name_is_internal() {
        let body = json!({ "error": { "status": "TEAPOT" } });
        let err = error_for_http_response(500, Some(&body)).unwrap();
        assert_eq!(err.code, FunctionsErrorCode::Internal);
    }
}
