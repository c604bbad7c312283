use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use firebase_emulator_smoke::app::{
    delete_app, initialize_app, AppOptions, AppSettings, EmulatorApp,
};
use firebase_emulator_smoke::auth::AuthAdmin;
use firebase_emulator_smoke::credential::MockCredential;
use firebase_emulator_smoke::emulator::EmulatorHost;
use firebase_emulator_smoke::firestore::Firestore;
use firebase_emulator_smoke::functions::Functions;
use firebase_emulator_smoke::util::decode_jwt;
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use serde_json::{json, Value};

const PROJECT: &str = "demo-sta2ble-ports";

fn start_mock_server() -> Option<MockServer> {
    panic::catch_unwind(|| MockServer::start()).ok()
}

fn app(prefix: &str) -> EmulatorApp {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    initialize_app(
        AppOptions {
            project_id: PROJECT.to_string(),
            storage_bucket: None,
            api_key: Some("fake-api-key".to_string()),
        },
        Arc::new(MockCredential::new(PROJECT)),
        Some(AppSettings {
            name: Some(format!("{prefix}-{}", COUNTER.fetch_add(1, Ordering::SeqCst))),
        }),
    )
    .expect("initialize app")
}

fn host(server: &MockServer) -> EmulatorHost {
    EmulatorHost::new(server.host(), Some(server.port()))
}

#[tokio::test(flavor = "current_thread")]
async fn custom_token_session_reaches_callable_function() {
    let Some(server) = start_mock_server() else {
        eprintln!("Skipping custom_token_session test: unable to bind mock server");
        return;
    };
    let sign_in = server.mock(|when, then| {
        when.method(POST)
            .path("/identitytoolkit.googleapis.com/v1/accounts:signInWithCustomToken")
            .query_param("key", "fake-api-key");
        then.status(200).json_body(json!({
            "idToken": "id-token-1",
            "refreshToken": "refresh-1",
            "expiresIn": "3600"
        }));
    });
    let callable = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/{PROJECT}/us-central1/getAccountInfo"))
            .header("authorization", "Bearer id-token-1")
            .json_body(json!({ "data": { "accountId": "test-account-002" } }));
        then.status(200).json_body(json!({
            "result": { "account": { "name": "Functions Test", "tickets": 50 } }
        }));
    });

    let app = app("clients-callable");
    let auth = AuthAdmin::new(&app, host(&server));
    let token = auth.create_custom_token("uid-func", None).unwrap();
    let decoded = decode_jwt(&token);
    assert_eq!(decoded.claims["uid"], json!("uid-func"));
    assert_eq!(
        decoded.claims["iss"],
        json!(format!("mock-email@{PROJECT}.iam.gserviceaccount.com"))
    );

    let session = auth.sign_in_with_custom_token(&token).await.unwrap();
    let functions = Functions::new(&app, host(&server));
    let result: Value = functions
        .https_callable::<Value, Value>("getAccountInfo")
        .unwrap()
        .with_id_token(session.id_token)
        .call(&json!({ "accountId": "test-account-002" }))
        .await
        .unwrap();

    sign_in.assert();
    callable.assert();
    assert_eq!(result.pointer("/account/tickets"), Some(&json!(50)));
    delete_app(&app).unwrap();
}

#[tokio::test(flavor = "current_thread")]
async fn callable_error_body_maps_to_functions_code() {
    let Some(server) = start_mock_server() else {
        eprintln!("Skipping callable_error test: unable to bind mock server");
        return;
    };
    server.mock(|when, then| {
        when.method(POST)
            .path(format!("/{PROJECT}/us-central1/getAccountInfo"));
        then.status(404).json_body(json!({
            "error": { "status": "NOT_FOUND", "message": "Account not found" }
        }));
    });

    let app = app("clients-callable-error");
    let err = Functions::new(&app, host(&server))
        .https_callable::<Value, Value>("getAccountInfo")
        .unwrap()
        .call(&json!({ "accountId": "missing" }))
        .await
        .unwrap_err();

    assert_eq!(err.code_str(), "functions/not-found");
    assert_eq!(err.message(), "Account not found");
    delete_app(&app).unwrap();
}

#[tokio::test(flavor = "current_thread")]
async fn firestore_round_trip_through_public_api() {
    let Some(server) = start_mock_server() else {
        eprintln!("Skipping firestore_round_trip test: unable to bind mock server");
        return;
    };
    let docs = format!("/v1/projects/{PROJECT}/databases/(default)/documents");
    let document = json!({
        "name": format!("projects/{PROJECT}/databases/(default)/documents/users/u1"),
        "fields": {
            "email": { "stringValue": "sta2ble@example.com" },
            "active": { "booleanValue": true }
        }
    });
    let write = server.mock(|when, then| {
        when.method(PATCH)
            .path(format!("{docs}/users/u1"))
            .header("authorization", "Bearer owner");
        then.status(200).json_body(document.clone());
    });
    server.mock(|when, then| {
        when.method(GET).path(format!("{docs}/users/u1"));
        then.status(200).json_body(document.clone());
    });
    server.mock(|when, then| {
        when.method(GET).path(format!("{docs}/users/u2"));
        then.status(404).json_body(json!({
            "error": { "code": 404, "status": "NOT_FOUND", "message": "no entity" }
        }));
    });

    let app = app("clients-firestore");
    let firestore = Firestore::new(&app, host(&server));
    let doc = firestore.doc("users", "u1").unwrap();
    doc.set_json(&json!({ "email": "sta2ble@example.com", "active": true }))
        .await
        .unwrap();
    let snapshot = doc.get().await.unwrap();
    let missing = firestore.doc("users", "u2").unwrap().get().await.unwrap();

    write.assert();
    assert!(snapshot.exists());
    assert_eq!(snapshot.get("email").and_then(|v| v.as_str()), Some("sta2ble@example.com"));
    assert_eq!(snapshot.to_json()["active"], json!(true));
    assert!(!missing.exists());
    delete_app(&app).unwrap();
}
