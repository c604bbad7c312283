use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value as JsonValue;

use crate::functions::error::{
    error_for_http_response, internal_error, invalid_argument, FunctionsError, FunctionsErrorCode,
    FunctionsResult,
};

#[derive(Clone, Debug)]
pub struct CallableRequest {
    pub url: String,
    pub payload: JsonValue,
    pub timeout: Option<Duration>,
    pub headers: HashMap<String, String>,
}

impl CallableRequest {
    pub fn new(url: impl Into<String>, payload: JsonValue) -> Self {
        Self {
            url: url.into(),
            payload,
            timeout: None,
            headers: HashMap::new(),
        }
    }
}

/// Body of a plain HTTP function request.
#[derive(Clone, Debug)]
pub enum HttpBody {
    Empty,
    Text(String),
    Json(JsonValue),
}

/// Raw answer of an HTTP-triggered function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpFunctionResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpFunctionResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> FunctionsResult<T> {
        serde_json::from_slice(&self.body)
            .map_err(|err| internal_error(format!("Function response is not valid JSON: {err}")))
    }
}

fn build_headers(headers: &HashMap<String, String>) -> FunctionsResult<HeaderMap> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|err| invalid_argument(format!("invalid header name `{key}`: {err}")))?;
        let header_value = HeaderValue::from_str(value).map_err(|err| {
            invalid_argument(format!("invalid header value for `{key}`: {err}"))
        })?;
        map.insert(name, header_value);
    }
    Ok(map)
}

fn map_reqwest_error(err: reqwest::Error) -> FunctionsError {
    if err.is_timeout() {
        return FunctionsError::new(
            FunctionsErrorCode::DeadlineExceeded,
            format!("function request timed out: {err}"),
        );
    }
    if err.is_connect() {
        return FunctionsError::new(
            FunctionsErrorCode::Unavailable,
            format!("failed to connect to function endpoint: {err}"),
        );
    }
    if err.is_request() {
        return FunctionsError::new(
            FunctionsErrorCode::InvalidArgument,
            format!("malformed function request: {err}"),
        );
    }
    FunctionsError::new(
        FunctionsErrorCode::Unknown,
        format!("function request failed: {err}"),
    )
}

/// Sends a request to an HTTP-triggered function. Any HTTP status is a
/// successful transport result; only connection-level failures are errors.
pub async fn send_http(
    client: &Client,
    method: Method,
    url: &str,
    body: HttpBody,
    timeout: Option<Duration>,
) -> FunctionsResult<HttpFunctionResponse> {
    log::debug!("functions emulator {method} {url}");
    let mut request = client.request(method, url);
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }
    request = match body {
        HttpBody::Empty => request,
        HttpBody::Text(text) => request.body(text),
        HttpBody::Json(json) => request.json(&json),
    };

    let response = request.send().await.map_err(map_reqwest_error)?;
    let status = response.status().as_u16();
    let body = response
        .bytes()
        .await
        .map_err(|err| internal_error(format!("failed to read function response body: {err}")))?;
    Ok(HttpFunctionResponse { status, body })
}

/// POSTs a callable envelope and returns the decoded JSON body.
pub async fn invoke_callable(client: &Client, request: CallableRequest) -> FunctionsResult<JsonValue> {
    let CallableRequest {
        url,
        payload,
        timeout,
        headers,
    } = request;

    log::debug!("functions emulator callable POST {url}");
    let header_map = build_headers(&headers)?;
    let mut builder = client.post(url).headers(header_map).json(&payload);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    let response = builder.send().await.map_err(map_reqwest_error)?;

    handle_response(response).await
}

async fn handle_response(response: Response) -> FunctionsResult<JsonValue> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|err| internal_error(format!("failed to read callable response body: {err}")))?;

    let (body, parse_error) = if bytes.is_empty() {
        (None, None)
    } else {
        match serde_json::from_slice::<JsonValue>(&bytes) {
            Ok(value) => (Some(value), None),
            Err(err) => (None, Some(err)),
        }
    };

    if let Some(error) = error_for_http_response(status.as_u16(), body.as_ref()) {
        return Err(error);
    }

    if let Some(err) = parse_error {
        return Err(internal_error(format!(
            "Response is not valid JSON object: {err}"
        )));
    }

    if status == StatusCode::NO_CONTENT {
        return Err(internal_error(
            "Callable response is missing data payload (HTTP 204)",
        ));
    }

    Ok(body.unwrap_or(JsonValue::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_header_names() {
        let mut headers = HashMap::new();
        headers.insert("bad header".to_string(), "x".to_string());
        assert!(build_headers(&headers).is_err());
    }

    #[test]
    fn response_helpers() {
        let response = HttpFunctionResponse {
            status: 200,
            body: Bytes::from_static(br#"{"status":"ok"}"#),
        };
        assert!(response.is_success());
        assert_eq!(response.text(), r#"{"status":"ok"}"#);
        let value: JsonValue = response.json().unwrap();
        assert_eq!(value["status"], "ok");

        let failed = HttpFunctionResponse {
            status: 500,
            body: Bytes::from_static(b"boom"),
        };
        assert!(!failed.is_success());
        assert!(failed.json::<JsonValue>().is_err());
    }
}
