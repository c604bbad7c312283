use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::emulator::constants::DEFAULT_EMULATOR_HOST;
use crate::emulator::error::{invalid_config, EmulatorResult};
use crate::emulator::host::{EmulatorHost, EmulatorService};

#[derive(Debug, Default, Deserialize)]
struct FirebaseJson {
    #[serde(default)]
    emulators: Option<EmulatorsSection>,
}

#[derive(Debug, Default, Deserialize)]
struct EmulatorsSection {
    auth: Option<EmulatorEntry>,
    firestore: Option<EmulatorEntry>,
    storage: Option<EmulatorEntry>,
    functions: Option<EmulatorEntry>,
    #[serde(rename = "singleProjectMode")]
    single_project_mode: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct EmulatorEntry {
    host: Option<String>,
    port: Option<PortValue>,
}

/// firebase.json allows the port as a number or as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

/// Emulator endpoints declared in a firebase.json (under any file name).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FirebaseEmulatorConfig {
    pub hosts: BTreeMap<EmulatorService, EmulatorHost>,
    pub single_project_mode: Option<bool>,
}

impl FirebaseEmulatorConfig {
    pub fn from_file(path: impl AsRef<Path>) -> EmulatorResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            invalid_config(format!("Failed to read {}: {err}", path.display()))
        })?;
        Self::from_str(&raw)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(raw: &str) -> EmulatorResult<Self> {
        let parsed: FirebaseJson = serde_json::from_str(raw)
            .map_err(|err| invalid_config(format!("Invalid firebase config: {err}")))?;
        let section = parsed.emulators.unwrap_or_default();

        let mut hosts = BTreeMap::new();
        let entries = [
            (EmulatorService::Auth, section.auth),
            (EmulatorService::Firestore, section.firestore),
            (EmulatorService::Storage, section.storage),
            (EmulatorService::Functions, section.functions),
        ];
        for (service, entry) in entries {
            if let Some(entry) = entry {
                hosts.insert(service, entry_to_host(service, entry)?);
            }
        }

        Ok(Self {
            hosts,
            single_project_mode: section.single_project_mode,
        })
    }

    pub fn host(&self, service: EmulatorService) -> Option<&EmulatorHost> {
        self.hosts.get(&service)
    }
}

fn entry_to_host(service: EmulatorService, entry: EmulatorEntry) -> EmulatorResult<EmulatorHost> {
    let port = match entry.port {
        None => service.default_port(),
        Some(PortValue::Number(port)) => port,
        Some(PortValue::Text(text)) => text.trim().parse::<u16>().map_err(|_| {
            invalid_config(format!(
                "emulators.{}.port must be a number, got '{text}'",
                service.config_key()
            ))
        })?,
    };
    let host = entry
        .host
        .filter(|host| !host.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EMULATOR_HOST.to_string());
    Ok(EmulatorHost::new(host, Some(port)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_declared_emulators() {
        let raw = json!({
            "firestore": { "rules": "firestore.rules" },
            "emulators": {
                "auth": { "port": 9099 },
                "firestore": { "host": "0.0.0.0", "port": "8080" },
                "ui": { "enabled": true },
                "singleProjectMode": true
            }
        })
        .to_string();
        let config = FirebaseEmulatorConfig::from_str(&raw).unwrap();
        assert_eq!(
            config.host(EmulatorService::Auth),
            Some(&EmulatorHost::local(9099))
        );
        assert_eq!(
            config.host(EmulatorService::Firestore),
            Some(&EmulatorHost::new("0.0.0.0", Some(8080)))
        );
        assert!(config.host(EmulatorService::Storage).is_none());
        assert_eq!(config.single_project_mode, Some(true));
    }

    #[test]
    fn missing_port_uses_service_default() {
        let raw = json!({ "emulators": { "storage": {} } }).to_string();
        let config = FirebaseEmulatorConfig::from_str(&raw).unwrap();
        assert_eq!(
            config.host(EmulatorService::Storage),
            Some(&EmulatorHost::local(9199))
        );
    }

    #[test]
    fn no_emulators_section_is_empty() {
        let config = FirebaseEmulatorConfig::from_str("{}").unwrap();
        assert!(config.hosts.is_empty());
    }

    #[test]
    fn bad_port_string_is_rejected() {
        let raw = json!({ "emulators": { "auth": { "port": "ninety" } } }).to_string();
        assert!(FirebaseEmulatorConfig::from_str(&raw).is_err());
    }
}
