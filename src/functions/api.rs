use std::marker::PhantomData;
use std::time::Duration;

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use crate::app::EmulatorApp;
use crate::emulator::EmulatorHost;
use crate::functions::error::{internal_error, invalid_argument, FunctionsResult};
use crate::functions::transport::{
    invoke_callable, send_http, CallableRequest, HttpBody, HttpFunctionResponse,
};

pub const DEFAULT_REGION: &str = "us-central1";

/// Client for functions served by the functions emulator at
/// `http://<host>/<project>/<region>/<name>`.
#[derive(Clone, Debug)]
pub struct Functions {
    app: EmulatorApp,
    host: EmulatorHost,
    region: String,
    timeout: Option<Duration>,
    client: Client,
}

impl Functions {
    pub fn new(app: &EmulatorApp, host: EmulatorHost) -> Self {
        Self {
            app: app.clone(),
            host,
            region: DEFAULT_REGION.to_string(),
            timeout: None,
            client: Client::new(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn app(&self) -> &EmulatorApp {
        &self.app
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn function_url(&self, name: &str) -> FunctionsResult<String> {
        let name = name.trim_matches('/');
        if name.is_empty() {
            return Err(invalid_argument("Function name must not be empty"));
        }
        Ok(format!(
            "{}/{}/{}/{name}",
            self.host.base_url(),
            self.app.project_id(),
            self.region
        ))
    }

    pub async fn get(&self, name: &str) -> FunctionsResult<HttpFunctionResponse> {
        let url = self.function_url(name)?;
        send_http(&self.client, Method::GET, &url, HttpBody::Empty, self.timeout).await
    }

    pub async fn post_text(
        &self,
        name: &str,
        body: impl Into<String>,
    ) -> FunctionsResult<HttpFunctionResponse> {
        let url = self.function_url(name)?;
        send_http(
            &self.client,
            Method::POST,
            &url,
            HttpBody::Text(body.into()),
            self.timeout,
        )
        .await
    }

    pub async fn post_json(
        &self,
        name: &str,
        body: &JsonValue,
    ) -> FunctionsResult<HttpFunctionResponse> {
        let url = self.function_url(name)?;
        send_http(
            &self.client,
            Method::POST,
            &url,
            HttpBody::Json(body.clone()),
            self.timeout,
        )
        .await
    }

    /// Returns a typed callable reference for the given function name.
    pub fn https_callable<Request, Response>(
        &self,
        name: &str,
    ) -> FunctionsResult<CallableFunction<Request, Response>>
    where
        Request: Serialize,
        Response: DeserializeOwned,
    {
        let url = self.function_url(name)?;
        Ok(CallableFunction {
            functions: self.clone(),
            name: name.to_string(),
            url,
            id_token: None,
            _request: PhantomData,
            _response: PhantomData,
        })
    }
}

/// Callable function handle; requests use the `{"data": ...}` envelope.
#[derive(Clone, Debug)]
pub struct CallableFunction<Request, Response> {
    functions: Functions,
    name: String,
    url: String,
    id_token: Option<String>,
    _request: PhantomData<Request>,
    _response: PhantomData<Response>,
}

impl<Request, Response> CallableFunction<Request, Response>
where
    Request: Serialize,
    Response: DeserializeOwned,
{
    /// Sends `Authorization: Bearer <id_token>` so the function sees an authenticated caller.
    pub fn with_id_token(mut self, id_token: impl Into<String>) -> Self {
        let token = id_token.into();
        self.id_token = Some(token).filter(|token| !token.is_empty());
        self
    }

    pub async fn call(&self, data: &Request) -> FunctionsResult<Response> {
        let payload = serde_json::to_value(data).map_err(|err| {
            internal_error(format!("Failed to serialize callable payload: {err}"))
        })?;
        let mut request = CallableRequest::new(self.url.clone(), json!({ "data": payload }));
        request.timeout = self.functions.timeout;
        request
            .headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        if let Some(token) = &self.id_token {
            request
                .headers
                .insert("Authorization".to_string(), format!("Bearer {token}"));
        }

        let response_body = invoke_callable(&self.functions.client, request).await?;
        extract_data(response_body)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn extract_data<Response>(body: JsonValue) -> FunctionsResult<Response>
where
    Response: DeserializeOwned,
{
    match body {
        JsonValue::Object(mut map) => {
            if let Some(data_value) = map.remove("result").or_else(|| map.remove("data")) {
                serde_json::from_value(data_value).map_err(|err| {
                    internal_error(format!(
                        "Failed to deserialize callable response payload: {err}"
                    ))
                })
            } else {
                Err(internal_error(
                    "Callable response JSON is missing a result field",
                ))
            }
        }
        JsonValue::Null => Err(internal_error(
            "Callable response did not contain a JSON payload",
        )),
        other => Err(internal_error(format!(
            "Unexpected callable response shape: expected object, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::error::FunctionsErrorCode;
    use crate::test_support::{mock_host, start_mock_server, test_app};
    use httpmock::prelude::*;

    #[test]
    fn builds_emulator_urls() {
        let app = test_app("functions-url", "demo-test");
        let functions = Functions::new(&app, EmulatorHost::local(15001));
        assert_eq!(
            functions.function_url("getAccountInfo").unwrap(),
            "http://127.0.0.1:15001/demo-test/us-central1/getAccountInfo"
        );
        let functions = functions.with_region("europe-west1");
        assert_eq!(
            functions.function_url("/hello_world/").unwrap(),
            "http://127.0.0.1:15001/demo-test/europe-west1/hello_world"
        );
        assert!(functions.function_url("").is_err());
    }

    #[test]
    fn extract_data_prefers_result() {
        let value: JsonValue =
            extract_data(json!({ "result": { "ok": true }, "data": 1 })).unwrap();
        assert_eq!(value, json!({ "ok": true }));
        let value: JsonValue = extract_data(json!({ "data": 2 })).unwrap();
        assert_eq!(value, json!(2));
        assert!(extract_data::<JsonValue>(json!({ "other": 1 })).is_err());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn http_get_returns_any_status() {
        let Some(server) = start_mock_server() else {
            eprintln!("Skipping http_get_returns_any_status: unable to bind mock server");
            return;
        };
        server.mock(|when, then| {
            when.method(GET).path("/demo-test/us-central1/helloWorld");
            then.status(500).body("crashed");
        });

        let app = test_app("functions-get", "demo-test");
        let functions = Functions::new(&app, mock_host(&server));
        let response = functions.get("helloWorld").await.unwrap();
        assert_eq!(response.status, 500);
        assert_eq!(response.text(), "crashed");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn post_text_sends_raw_body() {
        let Some(server) = start_mock_server() else {
            eprintln!("Skipping post_text_sends_raw_body: unable to bind mock server");
            return;
        };
        let echo = server.mock(|when, then| {
            when.method(POST)
                .path("/demo-python-functions/us-central1/echo")
                .body("Test message");
            then.status(200).body("Echo: Test message");
        });

        let app = test_app("functions-echo", "demo-python-functions");
        let functions = Functions::new(&app, mock_host(&server));
        let response = functions.post_text("echo", "Test message").await.unwrap();
        assert!(response.is_success());
        assert!(response.text().contains("Test message"));
        echo.assert();
    }

    #[tokio::test(flavor = "current_thread")]
    async fn callable_sends_envelope_and_token() {
        let Some(server) = start_mock_server() else {
            eprintln!("Skipping callable_sends_envelope_and_token: unable to bind mock server");
            return;
        };
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/demo-test/us-central1/getAccountInfo")
                .header("authorization", "Bearer id-token")
                .json_body(json!({ "data": { "accountId": "test-account-002" } }));
            then.status(200)
                .json_body(json!({ "result": { "account": { "tickets": 50 } } }));
        });

        let app = test_app("functions-callable", "demo-test");
        let functions = Functions::new(&app, mock_host(&server));
        let callable = functions
            .https_callable::<JsonValue, JsonValue>("getAccountInfo")
            .unwrap()
            .with_id_token("id-token");
        let result = callable
            .call(&json!({ "accountId": "test-account-002" }))
            .await
            .unwrap();
        assert_eq!(result["account"]["tickets"], json!(50));
        mock.assert();
    }

    #[tokio::test(flavor = "current_thread")]
    async fn callable_error_body_maps_code() {
        let Some(server) = start_mock_server() else {
            eprintln!("Skipping callable_error_body_maps_code: unable to bind mock server");
            return;
        };
        server.mock(|when, then| {
            when.method(POST).path("/demo-test/us-central1/getAccountInfo");
            then.status(404).json_body(json!({
                "error": { "status": "NOT_FOUND", "message": "Account not found" }
            }));
        });

        let app = test_app("functions-callable-error", "demo-test");
        let functions = Functions::new(&app, mock_host(&server));
        let err = functions
            .https_callable::<JsonValue, JsonValue>("getAccountInfo")
            .unwrap()
            .call(&json!({ "accountId": "nope" }))
            .await
            .unwrap_err();
        assert_eq!(err.code, FunctionsErrorCode::NotFound);
        assert_eq!(err.message(), "Account not found");
    }
}
