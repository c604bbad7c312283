use reqwest::StatusCode;
use serde::Deserialize;

use crate::firestore::error::{FirestoreError, FirestoreErrorCode};

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: Option<GoogleError>,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Maps a failed documents API response, by HTTP status first and then by
/// the canonical `status` string of the error body.
pub fn map_http_error(status: StatusCode, body: &str) -> FirestoreError {
    let payload = serde_json::from_str::<GoogleErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error);
    let message = payload
        .as_ref()
        .and_then(|payload| payload.message.clone())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            format!(
                "Firestore emulator responded with HTTP {}",
                status.as_u16()
            )
        });
    let canonical = payload
        .and_then(|payload| payload.status)
        .and_then(|name| FirestoreErrorCode::from_status_name(&name));

    let code = code_for_http_status(status)
        .or(canonical)
        .unwrap_or(if status.is_client_error() {
            FirestoreErrorCode::InvalidArgument
        } else {
            FirestoreErrorCode::Internal
        });
    FirestoreError::new(code, message).with_status(status.as_u16())
}

fn code_for_http_status(status: StatusCode) -> Option<FirestoreErrorCode> {
    let code = match status {
        StatusCode::BAD_REQUEST => FirestoreErrorCode::InvalidArgument,
        StatusCode::UNAUTHORIZED => FirestoreErrorCode::Unauthenticated,
        StatusCode::FORBIDDEN => FirestoreErrorCode::PermissionDenied,
        StatusCode::NOT_FOUND => FirestoreErrorCode::NotFound,
        StatusCode::CONFLICT => FirestoreErrorCode::AlreadyExists,
        StatusCode::TOO_MANY_REQUESTS => FirestoreErrorCode::ResourceExhausted,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            FirestoreErrorCode::DeadlineExceeded
        }
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
            FirestoreErrorCode::Unavailable
        }
        StatusCode::INTERNAL_SERVER_ERROR => FirestoreErrorCode::Internal,
        _ => return None,
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_takes_precedence() {
        let body = r#"{"error":{"code":403,"message":"denied","status":"PERMISSION_DENIED"}}"#;
        let err = map_http_error(StatusCode::FORBIDDEN, body);
        assert_eq!(err.code, FirestoreErrorCode::PermissionDenied);
        assert_eq!(err.message(), "denied");
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn falls_back_to_canonical_status() {
        let body = r#"{"error":{"code":412,"message":"stale","status":"FAILED_PRECONDITION"}}"#;
        let err = map_http_error(StatusCode::PRECONDITION_FAILED, body);
        assert_eq!(err.code, FirestoreErrorCode::FailedPrecondition);
    }

    #[test]
    fn unknown_client_status_is_invalid_argument() {
        let err = map_http_error(StatusCode::IM_A_TEAPOT, "");
        assert_eq!(err.code, FirestoreErrorCode::InvalidArgument);
    }

    #[test]
    fn plain_text_body_uses_http_status() {
        let err = map_http_error(StatusCode::SERVICE_UNAVAILABLE, "starting up");
        assert_eq!(err.code, FirestoreErrorCode::Unavailable);
        assert!(err.message().contains("503"));
    }
}
