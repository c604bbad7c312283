use std::fmt::Display;
use std::future::Future;
use std::io::Write;

use reqwest::Client;
use serde_json::{json, Value as JsonValue};

use crate::app::EmulatorApp;
use crate::auth::{AuthAdmin, CreateUserRequest};
use crate::emulator::EmulatorService;
use crate::firestore::{DocumentReference, Firestore};
use crate::functions::{Functions, HttpFunctionResponse};
use crate::smoke::config::SmokeConfig;
use crate::smoke::error::{assertion, exhausted, SmokeResult};
use crate::smoke::report::Reporter;
use crate::storage::Storage;

/// Everything a check needs while it runs.
pub struct CheckContext<'a, W: Write> {
    pub config: &'a SmokeConfig,
    pub app: &'a EmulatorApp,
    pub http: &'a Client,
    pub reporter: &'a mut Reporter<W>,
}

impl<W: Write> CheckContext<'_, W> {
    pub fn auth(&self) -> SmokeResult<AuthAdmin> {
        let host = self.config.require_host(EmulatorService::Auth)?.clone();
        Ok(AuthAdmin::new(self.app, host).with_client(self.http.clone()))
    }

    pub fn firestore(&self) -> SmokeResult<Firestore> {
        let host = self.config.require_host(EmulatorService::Firestore)?.clone();
        Ok(Firestore::with_client(self.app, host, self.http.clone()))
    }

    pub fn storage(&self) -> SmokeResult<Storage> {
        let host = self.config.require_host(EmulatorService::Storage)?.clone();
        Ok(Storage::new(self.app, host)?.with_client(self.http.clone()))
    }

    pub fn functions(&self) -> SmokeResult<Functions> {
        let host = self.config.require_host(EmulatorService::Functions)?.clone();
        Ok(Functions::new(self.app, host)
            .with_region(self.config.region.clone())
            .with_timeout(self.config.timeout)
            .with_client(self.http.clone()))
    }
}

/// How a function is invoked by a probe.
#[derive(Clone, Debug, PartialEq)]
pub enum ProbeRequest {
    Get,
    PostText(String),
}

/// A plain HTTP function call that must answer 200, optionally echoing a marker.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionProbe {
    pub function: String,
    pub request: ProbeRequest,
    pub expect_contains: Option<String>,
}

impl FunctionProbe {
    pub fn get(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            request: ProbeRequest::Get,
            expect_contains: None,
        }
    }

    pub fn post_text(function: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            request: ProbeRequest::PostText(body.into()),
            expect_contains: None,
        }
    }

    pub fn expecting(mut self, marker: impl Into<String>) -> Self {
        self.expect_contains = Some(marker.into());
        self
    }

    async fn send(&self, functions: &Functions) -> SmokeResult<HttpFunctionResponse> {
        let response = match &self.request {
            ProbeRequest::Get => functions.get(&self.function).await?,
            ProbeRequest::PostText(body) => {
                functions.post_text(&self.function, body.clone()).await?
            }
        };
        Ok(response)
    }

    /// Sends the request and fails unless the response is a 200 carrying the marker.
    async fn verify(&self, functions: &Functions) -> SmokeResult<HttpFunctionResponse> {
        let response = self.send(functions).await?;
        if response.status != 200 {
            return Err(assertion(format!(
                "{} answered HTTP {}: {}",
                self.function,
                response.status,
                response.text()
            )));
        }
        if let Some(marker) = &self.expect_contains {
            let text = response.text();
            if !text.contains(marker.as_str()) {
                return Err(assertion(format!(
                    "{} response does not contain '{marker}': {text}",
                    self.function
                )));
            }
        }
        Ok(response)
    }
}

/// One feature-area procedure. `run` returns `Ok(false)` when the check
/// already reported its own failure, and `Err` for anything the runner
/// should report.
#[derive(Clone, Debug, PartialEq)]
pub enum Check {
    /// Create a user, optionally look it up by email, delete it.
    AuthLifecycle {
        email: String,
        password: String,
        lookup: bool,
    },
    /// Write a document, read it back, delete it.
    FirestoreRoundTrip {
        collection: String,
        document: String,
        data: JsonValue,
    },
    /// Upload an object, download it, delete it.
    StorageRoundTrip {
        object: String,
        content: Vec<u8>,
        content_type: String,
    },
    /// GET/POST a function once and report its status and body.
    FunctionHttp(FunctionProbe),
    /// POST an empty callable envelope to a function.
    FunctionConnection { function: String },
    /// Seed a document, ask a function to read it back, delete it.
    FunctionFirestoreIntegration {
        collection: String,
        document: String,
        data: JsonValue,
        function: String,
        expected_name: String,
    },
    /// The emulator root must answer 200.
    EmulatorProbe { service: EmulatorService },
    /// Create a user and a document keyed by its uid.
    UserWithDocument {
        email: String,
        password: String,
        collection: String,
        data: JsonValue,
        expected_field: String,
        expected_value: JsonValue,
    },
    /// Seed a document, sign in with a custom token and call a callable
    /// function as that user.
    CallableWithCustomToken {
        email: String,
        password: String,
        collection: String,
        account_id: String,
        data: JsonValue,
        function: String,
        expected_pointer: String,
        expected_value: JsonValue,
    },
    /// Run the probes in order, retrying the whole batch with the readiness policy.
    Retry {
        subject: String,
        probes: Vec<FunctionProbe>,
    },
}

impl Check {
    /// Emulators the check talks to.
    pub fn services(&self) -> Vec<EmulatorService> {
        match self {
            Check::AuthLifecycle { .. } => vec![EmulatorService::Auth],
            Check::FirestoreRoundTrip { .. } => vec![EmulatorService::Firestore],
            Check::StorageRoundTrip { .. } => vec![EmulatorService::Storage],
            Check::FunctionHttp(_) | Check::FunctionConnection { .. } | Check::Retry { .. } => {
                vec![EmulatorService::Functions]
            }
            Check::FunctionFirestoreIntegration { .. } => {
                vec![EmulatorService::Firestore, EmulatorService::Functions]
            }
            Check::EmulatorProbe { service } => vec![*service],
            Check::UserWithDocument { .. } => {
                vec![EmulatorService::Auth, EmulatorService::Firestore]
            }
            Check::CallableWithCustomToken { .. } => vec![
                EmulatorService::Auth,
                EmulatorService::Firestore,
                EmulatorService::Functions,
            ],
        }
    }

    pub async fn run<W: Write>(&self, ctx: &mut CheckContext<'_, W>) -> SmokeResult<bool> {
        match self {
            Check::AuthLifecycle {
                email,
                password,
                lookup,
            } => auth_lifecycle(ctx, email, password, *lookup).await,
            Check::FirestoreRoundTrip {
                collection,
                document,
                data,
            } => firestore_round_trip(ctx, collection, document, data).await,
            Check::StorageRoundTrip {
                object,
                content,
                content_type,
            } => storage_round_trip(ctx, object, content, content_type).await,
            Check::FunctionHttp(probe) => function_http(ctx, probe).await,
            Check::FunctionConnection { function } => function_connection(ctx, function).await,
            Check::FunctionFirestoreIntegration {
                collection,
                document,
                data,
                function,
                expected_name,
            } => {
                function_firestore_integration(
                    ctx,
                    collection,
                    document,
                    data,
                    function,
                    expected_name,
                )
                .await
            }
            Check::EmulatorProbe { service } => emulator_probe(ctx, *service).await,
            Check::UserWithDocument {
                email,
                password,
                collection,
                data,
                expected_field,
                expected_value,
            } => {
                user_with_document(
                    ctx,
                    email,
                    password,
                    collection,
                    data,
                    expected_field,
                    expected_value,
                )
                .await
            }
            Check::CallableWithCustomToken {
                email,
                password,
                collection,
                account_id,
                data,
                function,
                expected_pointer,
                expected_value,
            } => {
                let expectation = Expectation {
                    pointer: expected_pointer,
                    value: expected_value,
                };
                callable_with_custom_token(
                    ctx, email, password, collection, account_id, data, function, expectation,
                )
                .await
            }
            Check::Retry { subject, probes } => retry(ctx, subject, probes).await,
        }
    }
}

/// Awaits a cleanup step; a failure is logged and never fails the check.
async fn cleanup<F, T, E>(what: &str, step: F)
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    if let Err(err) = step.await {
        log::warn!("cleanup of {what} failed: {err}");
    }
}

async fn auth_lifecycle<W: Write>(
    ctx: &mut CheckContext<'_, W>,
    email: &str,
    password: &str,
    lookup: bool,
) -> SmokeResult<bool> {
    let auth = ctx.auth()?;
    let user = auth
        .create_user(&CreateUserRequest::with_email_password(email, password))
        .await?;
    ctx.reporter.ok(format!("Created user: {}", user.uid));

    if lookup {
        match auth.get_user_by_email(email).await {
            Ok(fetched) => ctx.reporter.ok(format!(
                "Retrieved user: {}",
                fetched.email.as_deref().unwrap_or_default()
            )),
            Err(err) => {
                cleanup(&format!("user {}", user.uid), auth.delete_user(&user.uid)).await;
                return Err(err.into());
            }
        }
    }

    auth.delete_user(&user.uid).await?;
    ctx.reporter.ok("Deleted user");
    Ok(true)
}

async fn firestore_round_trip<W: Write>(
    ctx: &mut CheckContext<'_, W>,
    collection: &str,
    document: &str,
    data: &JsonValue,
) -> SmokeResult<bool> {
    let doc = ctx.firestore()?.doc(collection, document)?;
    doc.set_json(data).await?;
    ctx.reporter.ok("Created document");

    let snapshot = match doc.get().await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            cleanup(doc.path(), doc.delete()).await;
            return Err(err.into());
        }
    };
    if !snapshot.exists() {
        return Err(assertion(format!(
            "Document {} was not found after it was written",
            doc.path()
        )));
    }
    let echoed = snapshot.to_json();
    ctx.reporter.ok(format!("Retrieved document: {echoed}"));
    if &echoed != data {
        cleanup(doc.path(), doc.delete()).await;
        return Err(assertion(format!(
            "Document {} reads back as {echoed}, expected {data}",
            doc.path()
        )));
    }

    doc.delete().await?;
    ctx.reporter.ok("Deleted document");
    Ok(true)
}

async fn storage_round_trip<W: Write>(
    ctx: &mut CheckContext<'_, W>,
    object: &str,
    content: &[u8],
    content_type: &str,
) -> SmokeResult<bool> {
    let storage = ctx.storage()?;
    storage.upload(object, content.to_vec(), content_type).await?;
    ctx.reporter.ok(format!("Uploaded file: {object}"));

    let downloaded = match storage.download(object).await {
        Ok(bytes) => bytes,
        Err(err) => {
            cleanup(object, storage.delete(object)).await;
            return Err(err.into());
        }
    };
    ctx.reporter.ok("Downloaded file");
    if downloaded.as_ref() != content {
        cleanup(object, storage.delete(object)).await;
        return Err(assertion(format!(
            "Downloaded {} bytes for {object}, expected {}",
            downloaded.len(),
            content.len()
        )));
    }

    storage.delete(object).await?;
    ctx.reporter.ok("Deleted file");
    Ok(true)
}

async fn function_http<W: Write>(
    ctx: &mut CheckContext<'_, W>,
    probe: &FunctionProbe,
) -> SmokeResult<bool> {
    let functions = ctx.functions()?;
    let response = probe.send(&functions).await?;
    ctx.reporter
        .ok(format!("Function response status: {}", response.status));
    ctx.reporter
        .ok(format!("Function response: {}", response.text()));

    if response.status != 200 {
        ctx.reporter
            .fail(format!("Unexpected status code: {}", response.status));
        return Ok(false);
    }
    if let Some(marker) = &probe.expect_contains {
        if !response.text().contains(marker.as_str()) {
            ctx.reporter
                .fail(format!("Response does not contain '{marker}'"));
            return Ok(false);
        }
    }
    Ok(true)
}

async fn function_connection<W: Write>(
    ctx: &mut CheckContext<'_, W>,
    function: &str,
) -> SmokeResult<bool> {
    let functions = ctx.functions()?;
    let response = functions
        .post_json(function, &json!({ "data": {} }))
        .await?;
    ctx.reporter.ok(format!(
        "{function} reachable, Status: {}",
        response.status
    ));
    if response.status != 200 {
        return Ok(false);
    }
    let body = response
        .json::<JsonValue>()
        .map(|value| value.to_string())
        .unwrap_or_else(|_| response.text());
    ctx.reporter.detail(format!("Response: {body}"));
    Ok(true)
}

/// True when `data` carries `name` at the top level or inside a callable `result`.
fn has_name(data: &JsonValue, expected: &str) -> bool {
    let direct = data.get("name").and_then(JsonValue::as_str);
    let wrapped = data
        .get("result")
        .and_then(|result| result.get("name"))
        .and_then(JsonValue::as_str);
    direct.or(wrapped) == Some(expected)
}

async fn function_firestore_integration<W: Write>(
    ctx: &mut CheckContext<'_, W>,
    collection: &str,
    document: &str,
    data: &JsonValue,
    function: &str,
    expected_name: &str,
) -> SmokeResult<bool> {
    let functions = ctx.functions()?;
    let doc = ctx.firestore()?.doc(collection, document)?;
    doc.set_json(data).await?;
    ctx.reporter.ok("Created test document in Firestore");

    let outcome = ask_function_for_document(ctx, &functions, function, document, expected_name).await;
    cleanup(doc.path(), doc.delete()).await;
    outcome
}

async fn ask_function_for_document<W: Write>(
    ctx: &mut CheckContext<'_, W>,
    functions: &Functions,
    function: &str,
    document: &str,
    expected_name: &str,
) -> SmokeResult<bool> {
    let response = functions
        .post_json(function, &json!({ "data": { "accountId": document } }))
        .await?;
    ctx.reporter
        .ok(format!("{function} called, Status: {}", response.status));

    if response.status != 200 {
        ctx.reporter
            .fail(format!("Function returned error: {}", response.text()));
        return Ok(false);
    }
    let body: JsonValue = response.json()?;
    ctx.reporter.detail(format!("Retrieved: {body}"));
    if has_name(&body, expected_name) {
        ctx.reporter.ok("Function successfully accessed Firestore data");
        Ok(true)
    } else {
        ctx.reporter.fail(format!("Unexpected data: {body}"));
        Ok(false)
    }
}

async fn emulator_probe<W: Write>(
    ctx: &mut CheckContext<'_, W>,
    service: EmulatorService,
) -> SmokeResult<bool> {
    if service == EmulatorService::Firestore {
        ctx.firestore()?.probe().await?;
    } else {
        let url = format!("{}/", ctx.config.require_host(service)?.base_url());
        let response = ctx
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| assertion(format!("{service} emulator not accessible: {err}")))?;
        if !response.status().is_success() {
            return Err(assertion(format!(
                "{service} emulator at {url} answered HTTP {}",
                response.status().as_u16()
            )));
        }
    }
    ctx.reporter
        .ok(format!("{} Emulator is responding", service.display_name()));
    Ok(true)
}

async fn user_with_document<W: Write>(
    ctx: &mut CheckContext<'_, W>,
    email: &str,
    password: &str,
    collection: &str,
    data: &JsonValue,
    expected_field: &str,
    expected_value: &JsonValue,
) -> SmokeResult<bool> {
    let auth = ctx.auth()?;
    let firestore = ctx.firestore()?;
    let user = auth
        .create_user(&CreateUserRequest::with_email_password(email, password))
        .await?;
    ctx.reporter.ok(format!("Created user with UID: {}", user.uid));

    let doc = match firestore.doc(collection, &user.uid) {
        Ok(doc) => doc,
        Err(err) => {
            cleanup(&format!("user {}", user.uid), auth.delete_user(&user.uid)).await;
            return Err(err.into());
        }
    };

    let outcome = seed_and_verify(ctx, &doc, &user.uid, data, expected_field, expected_value).await;
    cleanup(&format!("user {}", user.uid), auth.delete_user(&user.uid)).await;
    cleanup(doc.path(), doc.delete()).await;
    outcome
}

async fn seed_and_verify<W: Write>(
    ctx: &mut CheckContext<'_, W>,
    doc: &DocumentReference,
    uid: &str,
    data: &JsonValue,
    expected_field: &str,
    expected_value: &JsonValue,
) -> SmokeResult<bool> {
    doc.set_json(data).await?;
    ctx.reporter
        .ok(format!("Created Firestore document for account: {uid}"));

    let snapshot = doc.get().await?;
    if !snapshot.exists() {
        return Err(assertion(format!("Document {} does not exist", doc.path())));
    }
    let actual = snapshot.to_json_map().remove(expected_field);
    if actual.as_ref() != Some(expected_value) {
        return Err(assertion(format!(
            "Field {expected_field} of {} is {}, expected {expected_value}",
            doc.path(),
            actual.unwrap_or(JsonValue::Null)
        )));
    }
    ctx.reporter
        .ok(format!("Verified {expected_field} = {expected_value}"));
    Ok(true)
}

struct Expectation<'a> {
    pointer: &'a str,
    value: &'a JsonValue,
}

#[allow(clippy::too_many_arguments)]
async fn callable_with_custom_token<W: Write>(
    ctx: &mut CheckContext<'_, W>,
    email: &str,
    password: &str,
    collection: &str,
    account_id: &str,
    data: &JsonValue,
    function: &str,
    expectation: Expectation<'_>,
) -> SmokeResult<bool> {
    let auth = ctx.auth()?;
    let functions = ctx.functions()?;
    let doc = ctx.firestore()?.doc(collection, account_id)?;

    let user = auth
        .create_user(&CreateUserRequest::with_email_password(email, password))
        .await?;
    ctx.reporter.ok(format!("Created user with UID: {}", user.uid));

    let session = UserSession {
        auth: &auth,
        uid: &user.uid,
    };
    let outcome =
        call_as_user(ctx, session, &functions, &doc, account_id, data, function, expectation).await;
    cleanup(&format!("user {}", user.uid), auth.delete_user(&user.uid)).await;
    cleanup(doc.path(), doc.delete()).await;
    outcome
}

struct UserSession<'a> {
    auth: &'a AuthAdmin,
    uid: &'a str,
}

#[allow(clippy::too_many_arguments)]
async fn call_as_user<W: Write>(
    ctx: &mut CheckContext<'_, W>,
    session: UserSession<'_>,
    functions: &Functions,
    doc: &DocumentReference,
    account_id: &str,
    data: &JsonValue,
    function: &str,
    expectation: Expectation<'_>,
) -> SmokeResult<bool> {
    let mut seeded = data.clone();
    if let JsonValue::Object(fields) = &mut seeded {
        fields.insert("uid".to_string(), JsonValue::String(session.uid.to_string()));
    }
    doc.set_json(&seeded).await?;
    ctx.reporter
        .ok(format!("Created Firestore document for account: {account_id}"));

    let custom_token = session.auth.create_custom_token(session.uid, None)?;
    let signed_in = session.auth.sign_in_with_custom_token(&custom_token).await?;
    ctx.reporter.ok("Exchanged custom token for ID token");

    let result: JsonValue = functions
        .https_callable::<JsonValue, JsonValue>(function)?
        .with_id_token(signed_in.id_token)
        .call(&json!({ "accountId": account_id }))
        .await?;
    ctx.reporter.ok(format!("Function response: {result}"));

    match result.pointer(expectation.pointer) {
        Some(actual) if actual == expectation.value => Ok(true),
        actual => Err(assertion(format!(
            "{function} result {} is {}, expected {}",
            expectation.pointer,
            actual.cloned().unwrap_or(JsonValue::Null),
            expectation.value
        ))),
    }
}

async fn retry<W: Write>(
    ctx: &mut CheckContext<'_, W>,
    subject: &str,
    probes: &[FunctionProbe],
) -> SmokeResult<bool> {
    let functions = ctx.functions()?;
    let policy = ctx.config.readiness;

    let mut attempt = 1;
    loop {
        let mut failure = None;
        for probe in probes {
            match probe.verify(&functions).await {
                Ok(_) => ctx
                    .reporter
                    .ok(format!("{} function is responding", probe.function)),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        let Some(err) = failure else {
            return Ok(true);
        };
        if attempt >= policy.attempts {
            return Err(exhausted(format!(
                "{subject} not accessible after {} attempts: {err}",
                policy.attempts
            )));
        }
        log::debug!("{subject} attempt {attempt} failed: {err}");
        ctx.reporter.line(format!(
            "Attempt {attempt} failed, retrying in {}s...",
            policy.delay.as_secs()
        ));
        tokio::time::sleep(policy.delay).await;
        attempt += 1;
    }
}
