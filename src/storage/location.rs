use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use url::Url;

use crate::storage::error::{invalid_argument, invalid_default_bucket, invalid_url, StorageResult};

/// Bucket plus object path, both unencoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    bucket: String,
    path: String,
}

impl Location {
    pub fn new(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            bucket: bucket.into(),
            path: path.trim_matches('/').to_string(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    pub fn child(&self, name: &str) -> StorageResult<Self> {
        let name = name.trim_matches('/');
        if name.is_empty() {
            return Err(invalid_argument("Object name must not be empty"));
        }
        let path = if self.is_root() {
            name.to_string()
        } else {
            format!("{}/{name}", self.path)
        };
        Ok(Self::new(self.bucket.clone(), path))
    }

    /// `/v0/b/<bucket>/o/<object>` with both parts percent-encoded.
    pub fn object_url_path(&self) -> String {
        format!(
            "{}/{}",
            self.bucket_url_path(),
            utf8_percent_encode(&self.path, NON_ALPHANUMERIC)
        )
    }

    pub fn bucket_url_path(&self) -> String {
        format!(
            "/v0/b/{}/o",
            utf8_percent_encode(&self.bucket, NON_ALPHANUMERIC)
        )
    }

    /// Accepts `gs://bucket` or a bare bucket name; anything with an object path is rejected.
    pub fn from_bucket_spec(bucket_spec: &str) -> StorageResult<Self> {
        let spec = bucket_spec.trim();
        if spec.is_empty() {
            return Err(invalid_default_bucket(bucket_spec));
        }
        match Self::from_url(spec) {
            Ok(location) if location.is_root() => Ok(location),
            Ok(_) => Err(invalid_default_bucket(bucket_spec)),
            Err(_) if !spec.contains('/') => Ok(Self::new(spec, "")),
            Err(_) => Err(invalid_default_bucket(bucket_spec)),
        }
    }

    /// Parses `gs://bucket/path` or an emulator object URL
    /// (`http://host/v0/b/<bucket>/o/<encoded path>`).
    pub fn from_url(url: &str) -> StorageResult<Self> {
        if let Some(rest) = url.strip_prefix("gs://") {
            return Self::from_gs_url(rest);
        }

        if url.starts_with("http://") || url.starts_with("https://") {
            return Self::from_http_url(url);
        }

        Err(invalid_url(url))
    }

    fn from_gs_url(rest: &str) -> StorageResult<Self> {
        let (bucket, path) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(invalid_url(rest));
        }
        Ok(Self::new(bucket, path))
    }

    fn from_http_url(url: &str) -> StorageResult<Self> {
        let parsed = Url::parse(url).map_err(|_| invalid_url(url))?;
        let mut segments = parsed
            .path_segments()
            .ok_or_else(|| invalid_url(url))?
            .map(str::to_string)
            .collect::<Vec<_>>();

        if segments.last().is_some_and(|s| s.is_empty()) {
            segments.pop();
        }

        // Expect /{version}/b/{bucket}/o/{path...}
        if segments.len() < 4 || segments[1] != "b" || segments[3] != "o" {
            return Err(invalid_url(url));
        }
        let bucket = percent_decode_str(&segments[2]).decode_utf8_lossy();
        let path = segments[4..]
            .iter()
            .map(|segment| percent_decode_str(segment).decode_utf8_lossy())
            .collect::<Vec<_>>()
            .join("/");
        Ok(Self::new(bucket, path))
    }
}
