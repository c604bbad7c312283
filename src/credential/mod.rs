//! Credentials handed to the admin clients.
//!
//! Emulators do not verify signatures, so none of the credentials here sign
//! anything. A service-account key is still parsed and validated because the
//! custom-token flow needs its `client_email`, and because the scenarios that
//! start from a certificate must fail early when the document is malformed.

mod error;
mod service_account;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

pub use error::{CredentialError, CredentialErrorCode, CredentialResult};
pub use service_account::{demo_service_account, ServiceAccountKey};

/// Bearer token every Firebase emulator accepts as an administrator.
pub const EMULATOR_OWNER_TOKEN: &str = "owner";

const MOCK_TOKEN: &str = "mock-token";

#[async_trait]
pub trait Credential: Send + Sync + std::fmt::Debug {
    /// Access token sent as `Authorization: Bearer <token>` on admin requests.
    async fn access_token(&self) -> CredentialResult<String>;

    fn service_account_email(&self) -> String;

    fn project_id(&self) -> Option<String>;
}

pub type CredentialArc = Arc<dyn Credential>;

/// Credential backed by a service-account key document.
#[derive(Clone, Debug)]
pub struct ServiceAccountCredential {
    key: ServiceAccountKey,
}

impl ServiceAccountCredential {
    pub fn new(key: ServiceAccountKey) -> CredentialResult<Self> {
        key.validate()?;
        Ok(Self { key })
    }

    pub fn key(&self) -> &ServiceAccountKey {
        &self.key
    }
}

#[async_trait]
impl Credential for ServiceAccountCredential {
    async fn access_token(&self) -> CredentialResult<String> {
        Ok(EMULATOR_OWNER_TOKEN.to_string())
    }

    fn service_account_email(&self) -> String {
        self.key.client_email.clone()
    }

    fn project_id(&self) -> Option<String> {
        Some(self.key.project_id.clone()).filter(|id| !id.is_empty())
    }
}

/// Always-valid credential that never talks to a token endpoint.
#[derive(Clone, Debug)]
pub struct MockCredential {
    project_id: String,
    token: Arc<Mutex<String>>,
}

impl MockCredential {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            token: Arc::new(Mutex::new(MOCK_TOKEN.to_string())),
        }
    }

    pub fn token(&self) -> String {
        self.token
            .lock()
            .map(|token| token.clone())
            .unwrap_or_else(|_| MOCK_TOKEN.to_string())
    }

    pub fn is_valid(&self) -> bool {
        true
    }

    /// Replaces the token with `mock-token-<unix seconds>`.
    pub fn refresh(&self) {
        let refreshed = format!("{MOCK_TOKEN}-{}", Utc::now().timestamp());
        if let Ok(mut token) = self.token.lock() {
            *token = refreshed;
        }
    }
}

#[async_trait]
impl Credential for MockCredential {
    async fn access_token(&self) -> CredentialResult<String> {
        Ok(self.token())
    }

    fn service_account_email(&self) -> String {
        format!("mock-email@{}.iam.gserviceaccount.com", self.project_id)
    }

    fn project_id(&self) -> Option<String> {
        Some(self.project_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "current_thread")]
    async fn mock_credential_starts_with_fixed_token() {
        let credential = MockCredential::new("demo-sta2ble-ports");
        assert!(credential.is_valid());
        assert_eq!(credential.access_token().await.unwrap(), "mock-token");
        assert_eq!(
            credential.service_account_email(),
            "mock-email@demo-sta2ble-ports.iam.gserviceaccount.com"
        );
    }

    #[test]
    fn mock_refresh_appends_timestamp() {
        let credential = MockCredential::new("demo");
        credential.refresh();
        let token = credential.token();
        let suffix = token.strip_prefix("mock-token-").expect("refreshed prefix");
        assert!(suffix.parse::<i64>().is_ok());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn service_account_uses_owner_token() {
        let credential = ServiceAccountCredential::new(demo_service_account("demo-project")).unwrap();
        assert_eq!(credential.access_token().await.unwrap(), EMULATOR_OWNER_TOKEN);
        assert_eq!(credential.project_id().as_deref(), Some("demo-project"));
        assert_eq!(
            credential.service_account_email(),
            "firebase-adminsdk@demo-project.iam.gserviceaccount.com"
        );
    }
}
