use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::{Map, Value as JsonValue};

use crate::app::EmulatorApp;
use crate::credential::EMULATOR_OWNER_TOKEN;
use crate::emulator::EmulatorHost;
use crate::firestore::error::{
    deadline_exceeded, internal_error, unavailable, FirestoreError, FirestoreResult,
};
use crate::firestore::model::{encode_path, validate_collection_path, validate_document_id};
use crate::firestore::rpc_error::map_http_error;
use crate::firestore::serializer::{decode_document, encode_document};
use crate::firestore::value::{
    document_data_from_json, document_data_to_json, DocumentData, FirestoreValue,
};

const DEFAULT_DATABASE: &str = "(default)";
const AUTO_ID_LENGTH: usize = 20;

/// Client for the Firestore emulator's REST documents API.
#[derive(Clone, Debug)]
pub struct Firestore {
    inner: Arc<FirestoreInner>,
}

#[derive(Debug)]
struct FirestoreInner {
    app: EmulatorApp,
    host: EmulatorHost,
    client: Client,
}

impl Firestore {
    pub fn new(app: &EmulatorApp, host: EmulatorHost) -> Self {
        Self::with_client(app, host, Client::new())
    }

    pub fn with_client(app: &EmulatorApp, host: EmulatorHost, client: Client) -> Self {
        Self {
            inner: Arc::new(FirestoreInner {
                app: app.clone(),
                host,
                client,
            }),
        }
    }

    pub fn app(&self) -> &EmulatorApp {
        &self.inner.app
    }

    pub fn host(&self) -> &EmulatorHost {
        &self.inner.host
    }

    pub fn project_id(&self) -> &str {
        self.inner.app.project_id()
    }

    pub fn collection(&self, path: &str) -> FirestoreResult<CollectionReference> {
        Ok(CollectionReference {
            firestore: self.clone(),
            path: validate_collection_path(path)?,
        })
    }

    /// Shorthand for `collection(collection_path)?.doc(document_id)`.
    pub fn doc(&self, collection_path: &str, document_id: &str) -> FirestoreResult<DocumentReference> {
        self.collection(collection_path)?.doc(document_id)
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/{DEFAULT_DATABASE}/documents",
            self.inner.host.base_url(),
            self.project_id()
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        log::debug!("firestore emulator {method} {url}");
        self.inner
            .client
            .request(method, url)
            .bearer_auth(EMULATOR_OWNER_TOKEN)
    }

    /// Checks that the emulator answers `200 OK` on its root URL.
    pub async fn probe(&self) -> FirestoreResult<()> {
        let url = format!("{}/", self.inner.host.base_url());
        let response = self
            .inner
            .client
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;
        if response.status() == StatusCode::OK {
            Ok(())
        } else {
            Err(unavailable(format!(
                "Firestore emulator at {url} answered HTTP {}",
                response.status().as_u16()
            )))
        }
    }

    /// Drops every document of the project's default database.
    pub async fn clear_documents(&self) -> FirestoreResult<()> {
        let url = format!(
            "{}/emulator/v1/projects/{}/databases/{DEFAULT_DATABASE}/documents",
            self.inner.host.base_url(),
            self.project_id()
        );
        let response = self
            .request(Method::DELETE, &url)
            .send()
            .await
            .map_err(transport_error)?;
        ensure_success(response).await.map(|_| ())
    }
}

#[derive(Clone, Debug)]
pub struct CollectionReference {
    firestore: Firestore,
    path: String,
}

impl CollectionReference {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn doc(&self, document_id: &str) -> FirestoreResult<DocumentReference> {
        validate_document_id(document_id)?;
        Ok(DocumentReference {
            firestore: self.firestore.clone(),
            path: format!("{}/{document_id}", self.path),
        })
    }

    /// Stores `data` under a fresh 20-character auto id.
    pub async fn add(&self, data: &DocumentData) -> FirestoreResult<DocumentReference> {
        let reference = self.doc(&generate_auto_id())?;
        reference.set(data).await?;
        Ok(reference)
    }
}

#[derive(Clone, Debug)]
pub struct DocumentReference {
    firestore: Firestore,
    path: String,
}

impl DocumentReference {
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn url(&self) -> String {
        format!("{}/{}", self.firestore.documents_url(), encode_path(&self.path))
    }

    /// Overwrites the whole document.
    pub async fn set(&self, data: &DocumentData) -> FirestoreResult<()> {
        let url = self.url();
        let response = self
            .firestore
            .request(Method::PATCH, &url)
            .json(&encode_document(data))
            .send()
            .await
            .map_err(transport_error)?;
        ensure_success(response).await.map(|_| ())
    }

    pub async fn set_json(&self, data: &JsonValue) -> FirestoreResult<()> {
        self.set(&document_data_from_json(data)?).await
    }

    /// Reads the document. A missing document is a snapshot with
    /// `exists() == false`, not an error.
    pub async fn get(&self) -> FirestoreResult<DocumentSnapshot> {
        let url = self.url();
        let response = self
            .firestore
            .request(Method::GET, &url)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(DocumentSnapshot {
                path: self.path.clone(),
                data: None,
            });
        }

        let body = ensure_success(response).await?;
        let document: JsonValue = serde_json::from_str(&body)
            .map_err(|err| internal_error(format!("Invalid document JSON: {err}")))?;
        Ok(DocumentSnapshot {
            path: self.path.clone(),
            data: Some(decode_document(&document)?),
        })
    }

    pub async fn delete(&self) -> FirestoreResult<()> {
        let url = self.url();
        let response = self
            .firestore
            .request(Method::DELETE, &url)
            .send()
            .await
            .map_err(transport_error)?;
        ensure_success(response).await.map(|_| ())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DocumentSnapshot {
    path: String,
    data: Option<DocumentData>,
}

impl DocumentSnapshot {
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&DocumentData> {
        self.data.as_ref()
    }

    pub fn get(&self, field: &str) -> Option<&FirestoreValue> {
        self.data.as_ref().and_then(|data| data.get(field))
    }

    /// Plain-JSON view of the fields, `null` for a missing document.
    pub fn to_json(&self) -> JsonValue {
        match &self.data {
            Some(data) => JsonValue::Object(document_data_to_json(data)),
            None => JsonValue::Null,
        }
    }

    pub fn to_json_map(&self) -> Map<String, JsonValue> {
        self.data
            .as_ref()
            .map(document_data_to_json)
            .unwrap_or_default()
    }
}

async fn ensure_success(response: reqwest::Response) -> FirestoreResult<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| internal_error(format!("Failed to read Firestore response: {err}")))?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(map_http_error(status, &body))
    }
}

fn transport_error(err: reqwest::Error) -> FirestoreError {
    if err.is_timeout() {
        return deadline_exceeded(format!(
            "Firestore request timed out: {err}"
        ));
    }
    unavailable(format!("Firestore request failed: {err}"))
}

fn generate_auto_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .map(char::from)
        .take(AUTO_ID_LENGTH)
        .collect()
}
