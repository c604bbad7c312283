use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::DEFAULT_API_KEY;
use crate::credential::{
    demo_service_account, CredentialArc, MockCredential, ServiceAccountCredential,
};
use crate::emulator::{
    EmulatorEnvironment, EmulatorHost, EmulatorService, FirebaseEmulatorConfig, ReadinessPolicy,
};
use crate::functions::DEFAULT_REGION;
use crate::smoke::error::{config_error, SmokeResult};

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// How the admin credential is built before the app is initialized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CredentialKind {
    /// A dummy service-account certificate for the project.
    #[default]
    ServiceAccount,
    /// A credential that hands out `mock-token` without any key material.
    Mock,
}

impl CredentialKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CredentialKind::ServiceAccount => "service-account",
            CredentialKind::Mock => "mock",
        }
    }

    pub fn build(self, project_id: &str) -> SmokeResult<CredentialArc> {
        let credential: CredentialArc = match self {
            CredentialKind::ServiceAccount => Arc::new(ServiceAccountCredential::new(
                demo_service_account(project_id),
            )?),
            CredentialKind::Mock => Arc::new(MockCredential::new(project_id)),
        };
        Ok(credential)
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "service-account" | "certificate" => Ok(CredentialKind::ServiceAccount),
            "mock" => Ok(CredentialKind::Mock),
            other => Err(format!(
                "unknown credential kind '{other}' (expected service-account or mock)"
            )),
        }
    }
}

/// Fully resolved settings for one smoke run.
#[derive(Clone, Debug, PartialEq)]
pub struct SmokeConfig {
    pub project_id: String,
    pub hosts: BTreeMap<EmulatorService, EmulatorHost>,
    /// `None` means `<project>.appspot.com`.
    pub storage_bucket: Option<String>,
    pub region: String,
    pub api_key: String,
    pub timeout: Duration,
    pub credential: CredentialKind,
    pub readiness: ReadinessPolicy,
    /// Poll every configured emulator before the first check.
    pub wait: bool,
    /// Registry name of the app; the default app when unset.
    pub app_name: Option<String>,
}

impl SmokeConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            hosts: BTreeMap::new(),
            storage_bucket: None,
            region: DEFAULT_REGION.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            credential: CredentialKind::default(),
            readiness: ReadinessPolicy::default(),
            wait: false,
            app_name: None,
        }
    }

    pub fn with_host(mut self, service: EmulatorService, host: EmulatorHost) -> Self {
        self.hosts.insert(service, host);
        self
    }

    pub fn with_credential(mut self, credential: CredentialKind) -> Self {
        self.credential = credential;
        self
    }

    pub fn host(&self, service: EmulatorService) -> Option<&EmulatorHost> {
        self.hosts.get(&service)
    }

    pub fn require_host(&self, service: EmulatorService) -> SmokeResult<&EmulatorHost> {
        self.host(service).ok_or_else(|| {
            config_error(format!(
                "No {service} emulator host configured; set {} or pass --{}-host",
                service.env_var(),
                service.config_key()
            ))
        })
    }

    /// Port of the service as shown in labels, or `?` when no host is set.
    pub fn port_of(&self, service: EmulatorService) -> String {
        self.host(service)
            .and_then(EmulatorHost::port)
            .map(|port| port.to_string())
            .unwrap_or_else(|| "?".to_string())
    }

    pub fn bucket(&self) -> String {
        self.storage_bucket
            .clone()
            .unwrap_or_else(|| format!("{}.appspot.com", self.project_id))
    }

    /// Layers every source over `base`, later sources winning:
    /// firebase.json, then the environment, then explicit overrides.
    pub fn resolve(
        base: SmokeConfig,
        firebase_json: Option<&FirebaseEmulatorConfig>,
        environment: Option<&EmulatorEnvironment>,
        overrides: &ConfigOverrides,
    ) -> SmokeResult<Self> {
        let mut config = base;

        if let Some(file) = firebase_json {
            for (service, host) in &file.hosts {
                config.hosts.insert(*service, host.clone());
            }
        }

        if let Some(env) = environment {
            for (service, host) in &env.hosts {
                config.hosts.insert(*service, host.clone());
            }
            if let Some(project_id) = &env.project_id {
                config.project_id = project_id.clone();
            }
        }

        overrides.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SmokeResult<()> {
        if self.project_id.trim().is_empty() {
            return Err(config_error("A project id is required"));
        }
        if self.timeout.is_zero() {
            return Err(config_error("Request timeout must be greater than zero"));
        }
        if self.readiness.attempts == 0 {
            return Err(config_error("Readiness attempts must be at least 1"));
        }
        if self.region.trim().is_empty() {
            return Err(config_error("Functions region must not be empty"));
        }
        Ok(())
    }
}

/// Explicit settings, typically from command-line flags. Unset fields leave
/// the resolved value alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigOverrides {
    pub project_id: Option<String>,
    pub hosts: BTreeMap<EmulatorService, EmulatorHost>,
    pub storage_bucket: Option<String>,
    pub region: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Option<Duration>,
    pub credential: Option<CredentialKind>,
    pub readiness_attempts: Option<u32>,
    pub readiness_delay: Option<Duration>,
    pub wait: Option<bool>,
    pub app_name: Option<String>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut SmokeConfig) {
        if let Some(project_id) = &self.project_id {
            config.project_id = project_id.clone();
        }
        for (service, host) in &self.hosts {
            config.hosts.insert(*service, host.clone());
        }
        if let Some(bucket) = &self.storage_bucket {
            config.storage_bucket = Some(bucket.clone());
        }
        if let Some(region) = &self.region {
            config.region = region.clone();
        }
        if let Some(api_key) = &self.api_key {
            config.api_key = api_key.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(credential) = self.credential {
            config.credential = credential;
        }
        if let Some(attempts) = self.readiness_attempts {
            config.readiness.attempts = attempts;
        }
        if let Some(delay) = self.readiness_delay {
            config.readiness.delay = delay;
        }
        if let Some(wait) = self.wait {
            config.wait = wait;
        }
        if let Some(name) = &self.app_name {
            config.app_name = Some(name.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SmokeConfig {
        SmokeConfig::new("demo-project")
            .with_host(EmulatorService::Auth, EmulatorHost::local(9099))
            .with_host(EmulatorService::Firestore, EmulatorHost::local(8080))
    }

    fn environment(vars: &[(&str, &str)]) -> EmulatorEnvironment {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EmulatorEnvironment::from_lookup(move |name| {
            vars.iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        })
        .unwrap()
    }

    #[test]
    fn defaults_are_filled_in() {
        let config = SmokeConfig::resolve(base(), None, None, &ConfigOverrides::default()).unwrap();
        assert_eq!(config.region, "us-central1");
        assert_eq!(config.api_key, "fake-api-key");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.bucket(), "demo-project.appspot.com");
        assert_eq!(config.readiness, ReadinessPolicy::default());
    }

    #[test]
    fn later_sources_win() {
        let file = FirebaseEmulatorConfig::from_str(
            r#"{"emulators": {"auth": {"port": 9199}, "firestore": {"port": 8888}}}"#,
        )
        .unwrap();
        let env = environment(&[
            ("FIRESTORE_EMULATOR_HOST", "localhost:18080"),
            ("GCLOUD_PROJECT", "demo-env"),
        ]);
        let overrides = ConfigOverrides {
            hosts: BTreeMap::from([(EmulatorService::Firestore, EmulatorHost::local(17644))]),
            ..Default::default()
        };

        let config = SmokeConfig::resolve(base(), Some(&file), Some(&env), &overrides).unwrap();
        assert_eq!(config.port_of(EmulatorService::Auth), "9199");
        assert_eq!(config.port_of(EmulatorService::Firestore), "17644");
        assert_eq!(config.project_id, "demo-env");
        assert_eq!(config.bucket(), "demo-env.appspot.com");
    }

    #[test]
    fn explicit_project_beats_environment() {
        let env = environment(&[("GCLOUD_PROJECT", "demo-env")]);
        let overrides = ConfigOverrides {
            project_id: Some("demo-flag".into()),
            storage_bucket: Some("custom-bucket".into()),
            ..Default::default()
        };
        let config = SmokeConfig::resolve(base(), None, Some(&env), &overrides).unwrap();
        assert_eq!(config.project_id, "demo-flag");
        assert_eq!(config.bucket(), "custom-bucket");
    }

    #[test]
    fn blank_project_is_rejected() {
        let overrides = ConfigOverrides {
            project_id: Some(" ".into()),
            ..Default::default()
        };
        let err = SmokeConfig::resolve(base(), None, None, &overrides).unwrap_err();
        assert_eq!(err.code_str(), "smoke/invalid-config");
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let overrides = ConfigOverrides {
            readiness_attempts: Some(0),
            ..Default::default()
        };
        assert!(SmokeConfig::resolve(base(), None, None, &overrides).is_err());
    }

    #[test]
    fn missing_host_names_the_variable() {
        let err = base().require_host(EmulatorService::Storage).unwrap_err();
        assert!(err.to_string().contains("FIREBASE_STORAGE_EMULATOR_HOST"));
        assert_eq!(base().port_of(EmulatorService::Functions), "?");
    }

    #[test]
    fn credential_kind_parses() {
        assert_eq!("mock".parse::<CredentialKind>(), Ok(CredentialKind::Mock));
        assert_eq!(
            "Service-Account".parse::<CredentialKind>(),
            Ok(CredentialKind::ServiceAccount)
        );
        assert!("oauth".parse::<CredentialKind>().is_err());
    }
}
