use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Deserializer};

use crate::app::EmulatorApp;
use crate::credential::EMULATOR_OWNER_TOKEN;
use crate::emulator::EmulatorHost;
use crate::storage::error::{
    internal_error, network_error, no_default_bucket, unexpected_status, StorageResult,
};
use crate::storage::location::Location;

/// Object metadata as returned by the emulator's v0 API.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub name: String,
    pub bucket: String,
    #[serde(default, deserialize_with = "size_from_string_or_number")]
    pub size: Option<u64>,
    #[serde(rename = "contentType", default)]
    pub content_type: Option<String>,
    #[serde(rename = "md5Hash", default)]
    pub md5_hash: Option<String>,
    #[serde(default)]
    pub generation: Option<String>,
    #[serde(rename = "timeCreated", default)]
    pub time_created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(rename = "downloadTokens", default)]
    pub download_tokens: Option<String>,
}

fn size_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Number(u64),
        Text(String),
    }

    match Option::<Size>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Size::Number(size)) => Ok(Some(size)),
        Some(Size::Text(text)) => text
            .parse::<u64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Client for the Storage emulator, bound to one bucket.
#[derive(Clone, Debug)]
pub struct Storage {
    app: EmulatorApp,
    host: EmulatorHost,
    bucket: Location,
    client: Client,
}

impl Storage {
    /// Uses the app's `storage_bucket` option, which may be `gs://bucket` or a bare name.
    pub fn new(app: &EmulatorApp, host: EmulatorHost) -> StorageResult<Self> {
        let bucket_spec = app
            .options()
            .storage_bucket
            .as_deref()
            .ok_or_else(no_default_bucket)?;
        Ok(Self {
            app: app.clone(),
            host,
            bucket: Location::from_bucket_spec(bucket_spec)?,
            client: Client::new(),
        })
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn app(&self) -> &EmulatorApp {
        &self.app
    }

    pub fn bucket(&self) -> &str {
        self.bucket.bucket()
    }

    fn object_url(&self, location: &Location) -> String {
        format!("{}{}", self.host.base_url(), location.object_url_path())
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        log::debug!("storage emulator {method} {url}");
        self.client
            .request(method, url)
            .bearer_auth(EMULATOR_OWNER_TOKEN)
    }

    async fn send(&self, request: RequestBuilder, operation: &str) -> StorageResult<Response> {
        request
            .send()
            .await
            .map_err(|err| network_error(format!("{operation} request failed: {err}")))
    }

    /// Uploads `data` as one object. A 200 or 201 is a success even when
    /// the emulator's answer is not readable as metadata; the metadata is
    /// then `None`.
    pub async fn upload(
        &self,
        name: &str,
        data: impl Into<Bytes>,
        content_type: &str,
    ) -> StorageResult<Option<ObjectMetadata>> {
        let location = self.bucket.child(name)?;
        let url = self.object_url(&location);
        let request = self
            .request(Method::POST, &url)
            .header(CONTENT_TYPE, content_type)
            .body(data.into());
        let response = self.send(request, "Upload").await?;
        let status = response.status();
        let body = read_text(response).await?;
        if status != StatusCode::OK && status != StatusCode::CREATED {
            return Err(unexpected_status("Upload", location.path(), status.as_u16(), &body));
        }
        match parse_metadata(&body) {
            Ok(metadata) => Ok(Some(metadata)),
            Err(err) => {
                log::debug!("upload of '{}' returned no usable metadata: {err}", location.path());
                Ok(None)
            }
        }
    }

    pub async fn download(&self, name: &str) -> StorageResult<Bytes> {
        let location = self.bucket.child(name)?;
        let url = format!("{}?alt=media", self.object_url(&location));
        let response = self.send(self.request(Method::GET, &url), "Download").await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = read_text(response).await?;
            return Err(unexpected_status("Download", location.path(), status.as_u16(), &body));
        }
        response
            .bytes()
            .await
            .map_err(|err| network_error(format!("Failed to read object body: {err}")))
    }

    pub async fn metadata(&self, name: &str) -> StorageResult<ObjectMetadata> {
        let location = self.bucket.child(name)?;
        let url = self.object_url(&location);
        let response = self.send(self.request(Method::GET, &url), "Metadata").await?;
        let status = response.status();
        let body = read_text(response).await?;
        if !status.is_success() {
            return Err(unexpected_status("Metadata", location.path(), status.as_u16(), &body));
        }
        parse_metadata(&body)
    }

    pub async fn delete(&self, name: &str) -> StorageResult<()> {
        let location = self.bucket.child(name)?;
        let url = self.object_url(&location);
        let response = self.send(self.request(Method::DELETE, &url), "Delete").await?;
        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::NO_CONTENT {
            return Ok(());
        }
        let body = read_text(response).await?;
        Err(unexpected_status("Delete", location.path(), status.as_u16(), &body))
    }
}

async fn read_text(response: Response) -> StorageResult<String> {
    response
        .text()
        .await
        .map_err(|err| network_error(format!("Failed to read storage response: {err}")))
}

fn parse_metadata(body: &str) -> StorageResult<ObjectMetadata> {
    serde_json::from_str(body)
        .map_err(|err| internal_error(format!("Invalid object metadata: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::error::StorageErrorCode;
    use crate::test_support::{mock_host, start_mock_server, test_app};
    use httpmock::prelude::*;
    use serde_json::json;

    const PROJECT: &str = "demo-project";
    const OBJECT_PATH: &str = "/v0/b/demo%2Dproject%2Eappspot%2Ecom/o/test%2Etxt";

    #[test]
    fn metadata_size_accepts_strings() {
        let metadata: ObjectMetadata = serde_json::from_value(json!({
            "name": "test.txt",
            "bucket": "demo-project.appspot.com",
            "size": "12",
            "contentType": "text/plain"
        }))
        .unwrap();
        assert_eq!(metadata.size, Some(12));
        assert_eq!(metadata.content_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn upload_posts_raw_body() {
        let Some(server) = start_mock_server() else {
            eprintln!("Skipping upload_posts_raw_body: unable to bind mock server");
            return;
        };
        let upload = server.mock(|when, then| {
            when.method(POST)
                .path(OBJECT_PATH)
                .header("content-type", "text/plain")
                .header("authorization", "Bearer owner")
                .body("Test content");
            then.status(200).json_body(json!({
                "name": "test.txt",
                "bucket": "demo-project.appspot.com",
                "size": "12",
                "contentType": "text/plain"
            }));
        });

        let storage = Storage::new(&test_app("storage-upload", PROJECT), mock_host(&server)).unwrap();
        let metadata = storage
            .upload("test.txt", "Test content", "text/plain")
            .await
            .unwrap()
            .expect("metadata in upload response");
        assert_eq!(metadata.size, Some(12));
        upload.assert();
    }

    #[tokio::test(flavor = "current_thread")]
    async fn download_reads_media() {
        let Some(server) = start_mock_server() else {
            eprintln!("Skipping download_reads_media: unable to bind mock server");
            return;
        };
        server.mock(|when, then| {
            when.method(GET).path(OBJECT_PATH).query_param("alt", "media");
            then.status(200).body("Test content");
        });

        let storage = Storage::new(&test_app("storage-download", PROJECT), mock_host(&server)).unwrap();
        let bytes = storage.download("test.txt").await.unwrap();
        assert_eq!(&bytes[..], b"Test content");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn missing_object_maps_to_not_found() {
        let Some(server) = start_mock_server() else {
            eprintln!("Skipping missing_object_maps_to_not_found: unable to bind mock server");
            return;
        };
        server.mock(|when, then| {
            when.method(GET).path(OBJECT_PATH);
            then.status(404).body("Not Found");
        });

        let storage = Storage::new(&test_app("storage-missing", PROJECT), mock_host(&server)).unwrap();
        let err = storage.download("test.txt").await.unwrap_err();
        assert_eq!(err.code, StorageErrorCode::ObjectNotFound);
        assert_eq!(err.server_response.as_deref(), Some("Not Found"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn delete_accepts_no_content() {
        let Some(server) = start_mock_server() else {
            eprintln!("Skipping delete_accepts_no_content: unable to bind mock server");
            return;
        };
        let delete = server.mock(|when, then| {
            when.method(DELETE).path(OBJECT_PATH);
            then.status(204);
        });

        let storage = Storage::new(&test_app("storage-delete", PROJECT), mock_host(&server)).unwrap();
        storage.delete("test.txt").await.unwrap();
        delete.assert();
    }

    #[tokio::test(flavor = "current_thread")]
    async fn metadata_reads_object_json() {
        let Some(server) = start_mock_server() else {
            eprintln!("Skipping metadata_reads_object_json: unable to bind mock server");
            return;
        };
        server.mock(|when, then| {
            when.method(GET).path(OBJECT_PATH).header("authorization", "Bearer owner");
            then.status(200).json_body(json!({
                "name": "test.txt",
                "bucket": "demo-project.appspot.com",
                "size": 12,
                "contentType": "text/plain",
                "md5Hash": "jcSjyJr4qSQbSUUQKfPKyA=="
            }));
        });

        let storage = Storage::new(&test_app("storage-metadata", PROJECT), mock_host(&server)).unwrap();
        let metadata = storage.metadata("test.txt").await.unwrap();
        assert_eq!(metadata.bucket, "demo-project.appspot.com");
        assert_eq!(metadata.size, Some(12));
        assert_eq!(metadata.md5_hash.as_deref(), Some("jcSjyJr4qSQbSUUQKfPKyA=="));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn upload_accepts_created_with_empty_body() {
        let Some(server) = start_mock_server() else {
            eprintln!("Skipping upload_accepts_created_with_empty_body: unable to bind mock server");
            return;
        };
        let upload = server.mock(|when, then| {
            when.method(POST).path(OBJECT_PATH);
            then.status(201).body("");
        });

        let storage = Storage::new(&test_app("storage-upload-empty", PROJECT), mock_host(&server)).unwrap();
        let metadata = storage
            .upload("test.txt", "Test content", "text/plain")
            .await
            .unwrap();
        assert!(metadata.is_none());
        upload.assert();
    }
}
