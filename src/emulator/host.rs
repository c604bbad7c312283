use std::fmt;
use std::str::FromStr;

use crate::emulator::constants::{
    AUTH_EMULATOR_HOST_VAR, DEFAULT_AUTH_PORT, DEFAULT_EMULATOR_HOST, DEFAULT_FIRESTORE_PORT,
    DEFAULT_FUNCTIONS_PORT, DEFAULT_STORAGE_PORT, FIRESTORE_EMULATOR_HOST_VAR,
    FUNCTIONS_EMULATOR_HOST_VAR, STORAGE_EMULATOR_HOST_VAR,
};
use crate::emulator::error::{invalid_host, EmulatorError, EmulatorResult};

/// Host/port/SSL tuple of a running emulator.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EmulatorHost {
    host: String,
    port: Option<u16>,
    ssl_enabled: bool,
}

impl EmulatorHost {
    pub fn new(host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            host: host.into(),
            port,
            ssl_enabled: false,
        }
    }

    pub fn local(port: u16) -> Self {
        Self::new(DEFAULT_EMULATOR_HOST, Some(port))
    }

    /// Accepts `host:port`, a bare `host`, or `http(s)://host[:port]`.
    pub fn parse(spec: &str) -> EmulatorResult<Self> {
        let spec = spec.trim().trim_end_matches('/');
        let (protocol, rest) = spec.split_once("://").unwrap_or(("http", spec));
        let ssl_enabled = match protocol {
            "http" => false,
            "https" => true,
            other => {
                return Err(invalid_host(format!(
                    "Unsupported protocol '{other}' in emulator host"
                )))
            }
        };

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    invalid_host(format!(
                        "Port must be a number in emulator host declaration '{spec}'"
                    ))
                })?;
                (host.to_string(), Some(port))
            }
            _ => (rest.to_string(), None),
        };

        if host.trim().is_empty() {
            return Err(invalid_host(format!(
                "Host is required in emulator host declaration '{spec}'"
            )));
        }

        Ok(Self {
            host,
            port,
            ssl_enabled,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// `host:port` as the environment variables spell it.
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{port}", self.host),
            None => self.host.clone(),
        }
    }

    pub fn base_url(&self) -> String {
        let scheme = if self.ssl_enabled { "https" } else { "http" };
        format!("{scheme}://{}", self.authority())
    }
}

impl fmt::Display for EmulatorHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.authority())
    }
}

impl FromStr for EmulatorHost {
    type Err = EmulatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The four emulators a smoke run can talk to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EmulatorService {
    Auth,
    Firestore,
    Storage,
    Functions,
}

impl EmulatorService {
    pub const ALL: [EmulatorService; 4] = [
        EmulatorService::Auth,
        EmulatorService::Firestore,
        EmulatorService::Storage,
        EmulatorService::Functions,
    ];

    pub fn env_var(self) -> &'static str {
        match self {
            EmulatorService::Auth => AUTH_EMULATOR_HOST_VAR,
            EmulatorService::Firestore => FIRESTORE_EMULATOR_HOST_VAR,
            EmulatorService::Storage => STORAGE_EMULATOR_HOST_VAR,
            EmulatorService::Functions => FUNCTIONS_EMULATOR_HOST_VAR,
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            EmulatorService::Auth => DEFAULT_AUTH_PORT,
            EmulatorService::Firestore => DEFAULT_FIRESTORE_PORT,
            EmulatorService::Storage => DEFAULT_STORAGE_PORT,
            EmulatorService::Functions => DEFAULT_FUNCTIONS_PORT,
        }
    }

    /// Key of the service inside the `emulators` section of firebase.json.
    pub fn config_key(self) -> &'static str {
        match self {
            EmulatorService::Auth => "auth",
            EmulatorService::Firestore => "firestore",
            EmulatorService::Storage => "storage",
            EmulatorService::Functions => "functions",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            EmulatorService::Auth => "Authentication",
            EmulatorService::Firestore => "Firestore",
            EmulatorService::Storage => "Storage",
            EmulatorService::Functions => "Functions",
        }
    }
}

impl fmt::Display for EmulatorService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::error::EmulatorErrorCode;

    #[test]
    fn parses_host_and_port() {
        let host = EmulatorHost::parse("127.0.0.1:9099").unwrap();
        assert_eq!(host.host(), "127.0.0.1");
        assert_eq!(host.port(), Some(9099));
        assert_eq!(host.base_url(), "http://127.0.0.1:9099");
    }

    #[test]
    fn parses_scheme_prefixed_host() {
        let host: EmulatorHost = "https://emulators.internal:8443/".parse().unwrap();
        assert_eq!(host.base_url(), "https://emulators.internal:8443");
    }

    #[test]
    fn bare_host_has_no_port() {
        let host = EmulatorHost::parse("localhost").unwrap();
        assert_eq!(host.port(), None);
        assert_eq!(host.authority(), "localhost");
    }

    #[test]
    fn rejects_non_numeric_port() {
        let err = EmulatorHost::parse("localhost:abc").unwrap_err();
        assert_eq!(err.code, EmulatorErrorCode::InvalidHost);
    }

    #[test]
    fn rejects_empty_host() {
        assert!(EmulatorHost::parse(":9099").is_err());
        assert!(EmulatorHost::parse("").is_err());
    }

    #[test]
    fn rejects_unknown_scheme() {
        assert!(EmulatorHost::parse("ftp://localhost:21").is_err());
    }
}
