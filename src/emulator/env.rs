use std::collections::BTreeMap;

use crate::emulator::constants::{PROJECT_ID_FALLBACK_VAR, PROJECT_ID_VAR};
use crate::emulator::error::EmulatorResult;
use crate::emulator::host::{EmulatorHost, EmulatorService};

/// Emulator endpoints and project id as advertised through environment variables.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmulatorEnvironment {
    pub hosts: BTreeMap<EmulatorService, EmulatorHost>,
    pub project_id: Option<String>,
}

impl EmulatorEnvironment {
    pub fn from_env() -> EmulatorResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the environment from an arbitrary variable lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> EmulatorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut hosts = BTreeMap::new();
        for service in EmulatorService::ALL {
            if let Some(raw) = read(service.env_var()) {
                hosts.insert(service, EmulatorHost::parse(&raw)?);
            }
        }

        let project_id = read(PROJECT_ID_VAR).or_else(|| read(PROJECT_ID_FALLBACK_VAR));
        Ok(Self { hosts, project_id })
    }

    pub fn host(&self, service: EmulatorService) -> Option<&EmulatorHost> {
        self.hosts.get(&service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn reads_all_known_variables() {
        let env = EmulatorEnvironment::from_lookup(lookup(&[
            ("FIREBASE_AUTH_EMULATOR_HOST", "127.0.0.1:9099"),
            ("FIRESTORE_EMULATOR_HOST", "127.0.0.1:8080"),
            ("FIREBASE_STORAGE_EMULATOR_HOST", "127.0.0.1:9199"),
            ("GCLOUD_PROJECT", "demo-project"),
        ]))
        .unwrap();
        assert_eq!(
            env.host(EmulatorService::Auth),
            Some(&EmulatorHost::local(9099))
        );
        assert_eq!(
            env.host(EmulatorService::Storage),
            Some(&EmulatorHost::local(9199))
        );
        assert!(env.host(EmulatorService::Functions).is_none());
        assert_eq!(env.project_id.as_deref(), Some("demo-project"));
    }

    #[test]
    fn falls_back_to_google_cloud_project() {
        let env = EmulatorEnvironment::from_lookup(lookup(&[
            ("GCLOUD_PROJECT", "  "),
            ("GOOGLE_CLOUD_PROJECT", "demo-test"),
        ]))
        .unwrap();
        assert_eq!(env.project_id.as_deref(), Some("demo-test"));
    }

    #[test]
    fn malformed_host_is_an_error() {
        let result =
            EmulatorEnvironment::from_lookup(lookup(&[("FIRESTORE_EMULATOR_HOST", "localhost:x")]));
        assert!(result.is_err());
    }
}
