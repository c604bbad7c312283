use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::firestore::error::{invalid_argument, FirestoreResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanos: i32) -> Self {
        let extra_seconds = nanos.div_euclid(1_000_000_000);
        Self {
            seconds: seconds + extra_seconds as i64,
            nanos: nanos.rem_euclid(1_000_000_000),
        }
    }

    pub fn now() -> Self {
        let now = Utc::now();
        Self::new(now.timestamp(), now.timestamp_subsec_nanos() as i32)
    }

    pub fn to_rfc3339(&self) -> String {
        Utc.timestamp_opt(self.seconds, self.nanos as u32)
            .single()
            .unwrap_or(DateTime::UNIX_EPOCH)
            .to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    pub fn parse_rfc3339(value: &str) -> FirestoreResult<Self> {
        let datetime = DateTime::parse_from_rfc3339(value)
            .map_err(|err| invalid_argument(format!("Invalid timestamp: {err}")))?
            .with_timezone(&Utc);
        Ok(Self::new(
            datetime.timestamp(),
            datetime.timestamp_subsec_nanos() as i32,
        ))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> FirestoreResult<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(invalid_argument("Latitude must be between -90 and 90 degrees."));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(invalid_argument(
                "Longitude must be between -180 and 180 degrees.",
            ));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Splits a slash-separated path, rejecting empty segments.
pub(crate) fn split_path(path: &str) -> FirestoreResult<Vec<String>> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(invalid_argument("Path must not be empty"));
    }
    let segments: Vec<String> = trimmed.split('/').map(str::to_string).collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(invalid_argument(format!(
            "Invalid path '{path}': segments must not be empty"
        )));
    }
    Ok(segments)
}

pub(crate) fn validate_collection_path(path: &str) -> FirestoreResult<String> {
    let segments = split_path(path)?;
    if segments.len() % 2 == 0 {
        return Err(invalid_argument(format!(
            "Invalid collection path '{path}': must have an odd number of segments"
        )));
    }
    Ok(segments.join("/"))
}

/// Everything but RFC 3986 unreserved characters is escaped in a segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encodes each segment of a slash-separated document path so ids
/// containing `?`, `#` or `%` stay inside the URL path.
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

pub(crate) fn validate_document_id(id: &str) -> FirestoreResult<()> {
    if id.is_empty() || id.contains('/') {
        return Err(invalid_argument(format!(
            "Invalid document id '{id}': must be a single non-empty segment"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_segments_are_percent_encoded() {
        assert_eq!(encode_path("test/doc1"), "test/doc1");
        assert_eq!(encode_path("test/a?b"), "test/a%3Fb");
        assert_eq!(encode_path("logs/50%#x y"), "logs/50%25%23x%20y");
        assert_eq!(encode_path("a-b/c_d.e~f"), "a-b/c_d.e~f");
    }

    #[test]
    fn timestamp_normalizes_nanos() {
        let ts = Timestamp::new(10, 1_500_000_000);
        assert_eq!(ts, Timestamp::new(11, 500_000_000));
        let negative = Timestamp::new(10, -1);
        assert_eq!(negative.seconds, 9);
        assert_eq!(negative.nanos, 999_999_999);
    }

    #[test]
    fn timestamp_rfc3339_round_trip() {
        let ts = Timestamp::parse_rfc3339("2024-01-02T03:04:05.123Z").unwrap();
        assert_eq!(ts.nanos, 123_000_000);
        assert_eq!(ts.to_rfc3339(), "2024-01-02T03:04:05.123Z");
    }

    #[test]
    fn invalid_latitude() {
        let err = GeoPoint::new(100.0, 0.0).unwrap_err();
        assert_eq!(err.code_str(), "firestore/invalid-argument");
    }

    #[test]
    fn collection_paths_need_odd_segments() {
        assert_eq!(validate_collection_path("/accounts/").unwrap(), "accounts");
        assert!(validate_collection_path("accounts/doc").is_err());
        assert!(validate_collection_path("a//b").is_err());
        assert!(validate_document_id("a/b").is_err());
    }
}
