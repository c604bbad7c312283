//! The named scenarios. Each profile reproduces one emulator layout: its
//! ports, project, credential and the ordered checks it runs.

use std::fmt;
use std::str::FromStr;

use serde_json::json;

use crate::emulator::{EmulatorHost, EmulatorService};
use crate::smoke::checks::{Check, FunctionProbe};
use crate::smoke::config::{CredentialKind, SmokeConfig};
use crate::smoke::report::Marks;

/// Where a check's output starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Heading {
    /// `=== Testing <area> ===`
    Section(String),
    /// Printed verbatim after an empty line.
    Plain(String),
    None,
}

/// Shape of the surrounding report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportStyle {
    /// Title banner, per-check summary table, closing message.
    Summary,
    /// Step lines only, then the closing message.
    Plain,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlannedCheck {
    /// Row in the summary table.
    pub label: String,
    /// Name used in `<feature> test failed: ...`.
    pub feature: String,
    pub heading: Heading,
    pub check: Check,
}

impl PlannedCheck {
    fn new(label: impl Into<String>, check: Check) -> Self {
        let label = label.into();
        Self {
            feature: label.clone(),
            heading: Heading::None,
            label,
            check,
        }
    }

    fn feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = feature.into();
        self
    }

    fn section(mut self, area: impl Into<String>) -> Self {
        self.heading = Heading::Section(area.into());
        self
    }

    fn plain(mut self, text: impl Into<String>) -> Self {
        self.heading = Heading::Plain(text.into());
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Profile {
    DefaultPorts,
    CustomPorts,
    AuthOnly,
    WithFunctions,
    WithPythonFunctions,
    Sta2bleCustomPorts,
    Quick,
    MultiFunctions,
    CustomConfigName,
}

impl Profile {
    pub const ALL: [Profile; 9] = [
        Profile::DefaultPorts,
        Profile::CustomPorts,
        Profile::AuthOnly,
        Profile::WithFunctions,
        Profile::WithPythonFunctions,
        Profile::Sta2bleCustomPorts,
        Profile::Quick,
        Profile::MultiFunctions,
        Profile::CustomConfigName,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Profile::DefaultPorts => "default-ports",
            Profile::CustomPorts => "custom-ports",
            Profile::AuthOnly => "auth-only",
            Profile::WithFunctions => "with-functions",
            Profile::WithPythonFunctions => "with-python-functions",
            Profile::Sta2bleCustomPorts => "sta2ble-custom-ports",
            Profile::Quick => "quick",
            Profile::MultiFunctions => "multi-functions",
            Profile::CustomConfigName => "custom-config-name",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Profile::DefaultPorts => "Auth, Firestore and Storage on the default ports",
            Profile::CustomPorts => "Auth on 9199 and Firestore on 8888",
            Profile::AuthOnly => "Create and delete a single Auth user",
            Profile::WithFunctions => "Auth, Firestore and an HTTP function on the default ports",
            Profile::WithPythonFunctions => {
                "Poll Python HTTP functions until they answer, then probe Firestore"
            }
            Profile::Sta2bleCustomPorts => {
                "Auth, Firestore and Functions on 17641/17644/17642 with a mock credential"
            }
            Profile::Quick => "Fast Auth and Firestore round trip on the sta2ble ports",
            Profile::MultiFunctions => {
                "User plus document, then a callable function invoked with a custom-token ID token"
            }
            Profile::CustomConfigName => {
                "Auth and Firestore with ports read from a custom-named firebase config"
            }
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Profile::DefaultPorts => "Firebase Emulator Tests - Default Ports",
            Profile::CustomPorts => "Firebase Emulator Tests - Custom Ports",
            Profile::WithFunctions => "Firebase Emulator Tests - With Functions",
            Profile::WithPythonFunctions => "Firebase Emulator Tests - Python Functions",
            Profile::Sta2bleCustomPorts => "Firebase Emulator Tests - StA2BLE Custom Ports",
            Profile::MultiFunctions => "Firebase Emulator Tests - Multiple Functions",
            Profile::AuthOnly => "Firebase Emulator Tests - Auth Only",
            Profile::Quick => "Firebase Emulator Tests - Quick",
            Profile::CustomConfigName => "Firebase Emulator Tests - Custom Config Name",
        }
    }

    pub fn banner_width(self) -> usize {
        match self {
            Profile::Sta2bleCustomPorts => 60,
            _ => 50,
        }
    }

    pub fn style(self) -> ReportStyle {
        match self {
            Profile::AuthOnly | Profile::Quick | Profile::CustomConfigName => ReportStyle::Plain,
            _ => ReportStyle::Summary,
        }
    }

    pub fn marks(self) -> Marks {
        match self {
            Profile::CustomConfigName => Marks::SYMBOLS,
            _ => Marks::BRACKETS,
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            Profile::CustomPorts => "All tests passed with custom ports!",
            Profile::WithFunctions => "All tests passed including Functions!",
            Profile::Sta2bleCustomPorts => "All tests passed with StA2BLE custom ports!",
            Profile::AuthOnly => "[OK] Auth-only test PASSED",
            Profile::Quick => "\n[SUCCESS] All tests passed!",
            Profile::CustomConfigName => "\n✅ All tests passed!",
            _ => "All tests passed!",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            Profile::AuthOnly => "[FAIL] Auth-only test FAILED",
            Profile::Quick => "\n[FAIL] Some tests failed!",
            Profile::CustomConfigName => "\n❌ Some tests failed!",
            _ => "Some tests failed!",
        }
    }

    /// Settings before firebase.json, environment and flags are layered on.
    pub fn defaults(self) -> SmokeConfig {
        let local = |service: EmulatorService, port: u16| (service, EmulatorHost::local(port));
        let localhost =
            |service: EmulatorService, port: u16| (service, EmulatorHost::new("localhost", Some(port)));

        let (project, credential, hosts) = match self {
            Profile::DefaultPorts => (
                "demo-project",
                CredentialKind::ServiceAccount,
                vec![
                    local(EmulatorService::Auth, 9099),
                    local(EmulatorService::Firestore, 8080),
                    local(EmulatorService::Storage, 9199),
                ],
            ),
            Profile::CustomPorts => (
                "demo-project",
                CredentialKind::ServiceAccount,
                vec![
                    local(EmulatorService::Auth, 9199),
                    local(EmulatorService::Firestore, 8888),
                ],
            ),
            Profile::AuthOnly => (
                "demo-project",
                CredentialKind::ServiceAccount,
                vec![local(EmulatorService::Auth, 9099)],
            ),
            Profile::WithFunctions => (
                "demo-project",
                CredentialKind::ServiceAccount,
                vec![
                    local(EmulatorService::Auth, 9099),
                    local(EmulatorService::Firestore, 8080),
                    local(EmulatorService::Functions, 5001),
                ],
            ),
            Profile::WithPythonFunctions => (
                "demo-python-functions",
                CredentialKind::ServiceAccount,
                vec![
                    local(EmulatorService::Firestore, 8080),
                    local(EmulatorService::Functions, 5001),
                ],
            ),
            Profile::Sta2bleCustomPorts | Profile::Quick => (
                "demo-sta2ble-ports",
                CredentialKind::Mock,
                vec![
                    local(EmulatorService::Auth, 17641),
                    local(EmulatorService::Firestore, 17644),
                    local(EmulatorService::Functions, 17642),
                ],
            ),
            Profile::MultiFunctions => (
                "demo-test",
                CredentialKind::ServiceAccount,
                vec![
                    localhost(EmulatorService::Auth, 19099),
                    localhost(EmulatorService::Firestore, 18080),
                    localhost(EmulatorService::Functions, 15001),
                ],
            ),
            Profile::CustomConfigName => (
                "demo-project",
                CredentialKind::ServiceAccount,
                vec![
                    local(EmulatorService::Auth, 9099),
                    local(EmulatorService::Firestore, 8080),
                ],
            ),
        };

        let mut config = SmokeConfig::new(project).with_credential(credential);
        for (service, host) in hosts {
            config = config.with_host(service, host);
        }
        config
    }

    /// Lines printed before the app is initialized.
    pub fn intro_lines(self) -> Vec<String> {
        match self {
            Profile::Quick => vec!["Initializing Firebase...".to_string()],
            _ => Vec::new(),
        }
    }

    /// Lines printed once the app is up, with the resolved ports.
    pub fn init_lines(self, config: &SmokeConfig, marks: Marks) -> Vec<String> {
        let ok = marks.ok;
        let auth = config.port_of(EmulatorService::Auth);
        let firestore = config.port_of(EmulatorService::Firestore);
        let functions = config.port_of(EmulatorService::Functions);
        match self {
            Profile::DefaultPorts | Profile::WithFunctions | Profile::MultiFunctions => {
                vec![format!("{ok} Firebase Admin SDK initialized")]
            }
            Profile::CustomPorts => vec![
                format!("{ok} Firebase Admin SDK initialized with custom ports"),
                format!("    Auth: {auth}, Firestore: {firestore}"),
            ],
            Profile::Sta2bleCustomPorts => vec![
                format!("{ok} Firebase Admin SDK initialized with StA2BLE custom ports"),
                format!("    Auth: {auth}, Firestore: {firestore}, Functions: {functions}"),
            ],
            Profile::Quick => vec![format!("{ok} Initialized")],
            Profile::AuthOnly | Profile::WithPythonFunctions | Profile::CustomConfigName => {
                Vec::new()
            }
        }
    }

    /// Ordered checks; labels carry the resolved ports where relevant.
    pub fn plan(self, config: &SmokeConfig) -> Vec<PlannedCheck> {
        let auth_port = config.port_of(EmulatorService::Auth);
        let firestore_port = config.port_of(EmulatorService::Firestore);
        let functions_port = config.port_of(EmulatorService::Functions);
        let firestore_port_value = config
            .host(EmulatorService::Firestore)
            .and_then(EmulatorHost::port)
            .map(|port| json!(port))
            .unwrap_or(json!(null));

        let auth = |email: &str, password: &str, lookup: bool| Check::AuthLifecycle {
            email: email.to_string(),
            password: password.to_string(),
            lookup,
        };
        let firestore = |collection: &str, document: &str, data| Check::FirestoreRoundTrip {
            collection: collection.to_string(),
            document: document.to_string(),
            data,
        };

        match self {
            Profile::DefaultPorts => vec![
                PlannedCheck::new("Authentication", auth("test@example.com", "testpass123", true))
                    .section("Authentication"),
                PlannedCheck::new(
                    "Firestore",
                    firestore("test", "doc1", json!({ "name": "Test", "value": 42 })),
                )
                .section("Firestore"),
                PlannedCheck::new(
                    "Storage",
                    Check::StorageRoundTrip {
                        object: "test.txt".to_string(),
                        content: b"Test content".to_vec(),
                        content_type: "text/plain".to_string(),
                    },
                )
                .section("Storage"),
            ],
            Profile::CustomPorts => vec![
                PlannedCheck::new(
                    format!("Authentication ({auth_port})"),
                    auth("test-custom@example.com", "testpass123", true),
                )
                .feature("Authentication")
                .section(format!("Authentication (Port {auth_port})")),
                PlannedCheck::new(
                    format!("Firestore ({firestore_port})"),
                    firestore(
                        "custom-test",
                        "doc1",
                        json!({ "name": "Custom Port Test", "port": firestore_port_value }),
                    ),
                )
                .feature("Firestore")
                .section(format!("Firestore (Port {firestore_port})")),
            ],
            Profile::AuthOnly => vec![PlannedCheck::new(
                "Authentication",
                auth("auth-only@example.com", "test123", false),
            )],
            Profile::WithFunctions => vec![
                PlannedCheck::new(
                    "Authentication",
                    auth("test-func@example.com", "testpass123", true),
                )
                .section("Authentication"),
                PlannedCheck::new(
                    "Firestore",
                    firestore(
                        "functions-test",
                        "doc1",
                        json!({ "name": "Functions Test", "value": 123 }),
                    ),
                )
                .section("Firestore"),
                PlannedCheck::new(
                    "Functions",
                    Check::FunctionHttp(FunctionProbe::get("helloWorld")),
                )
                .section("Functions"),
            ],
            Profile::WithPythonFunctions => vec![
                PlannedCheck::new(
                    "Python Functions",
                    Check::Retry {
                        subject: "Python Functions".to_string(),
                        probes: vec![
                            FunctionProbe::get("hello_world").expecting("Hello from Python"),
                            FunctionProbe::post_text("echo", "Test message")
                                .expecting("Test message"),
                            FunctionProbe::get("check_firestore"),
                        ],
                    },
                )
                .section("Python Functions"),
                PlannedCheck::new(
                    "Firestore Emulator",
                    Check::EmulatorProbe {
                        service: EmulatorService::Firestore,
                    },
                )
                .section("Firestore Emulator"),
            ],
            Profile::Sta2bleCustomPorts => vec![
                PlannedCheck::new(
                    format!("Authentication ({auth_port})"),
                    auth("test-sta2ble@example.com", "testpass123", true),
                )
                .feature("Authentication")
                .section(format!("Authentication (Port {auth_port})")),
                PlannedCheck::new(
                    format!("Firestore ({firestore_port})"),
                    firestore(
                        "accounts",
                        "test-account-001",
                        json!({
                            "name": "Test Account",
                            "port": firestore_port_value,
                            "balance": 100
                        }),
                    ),
                )
                .feature("Firestore")
                .section(format!("Firestore (Port {firestore_port})")),
                PlannedCheck::new(
                    format!("Functions Connection ({functions_port})"),
                    Check::FunctionConnection {
                        function: "testConnection".to_string(),
                    },
                )
                .feature("Functions connection")
                .section(format!("Functions (Port {functions_port})")),
                PlannedCheck::new(
                    "Functions + Firestore Integration",
                    Check::FunctionFirestoreIntegration {
                        collection: "accounts".to_string(),
                        document: "integration-test-001".to_string(),
                        data: json!({ "name": "Integration Test", "balance": 250 }),
                        function: "getAccountInfo".to_string(),
                        expected_name: "Integration Test".to_string(),
                    },
                )
                .feature("Integration")
                .section("Functions + Firestore Integration"),
            ],
            Profile::Quick => vec![
                PlannedCheck::new(
                    format!("Auth ({auth_port})"),
                    auth("quick-test@example.com", "test123", false),
                )
                .plain(format!("Testing Auth emulator ({auth_port})...")),
                PlannedCheck::new(
                    format!("Firestore ({firestore_port})"),
                    firestore("test", "doc1", json!({ "test": "data" })),
                )
                .plain(format!("Testing Firestore emulator ({firestore_port})...")),
            ],
            Profile::MultiFunctions => vec![
                PlannedCheck::new(
                    "Create user and Firestore document",
                    Check::UserWithDocument {
                        email: "test@example.com".to_string(),
                        password: "testpassword123".to_string(),
                        collection: "accounts".to_string(),
                        data: json!({
                            "tickets": 100,
                            "email": "test@example.com",
                            "accountId": "test-account-001"
                        }),
                        expected_field: "tickets".to_string(),
                        expected_value: json!(100),
                    },
                )
                .section("User and Firestore Document"),
                PlannedCheck::new(
                    "Call getAccountInfo function",
                    Check::CallableWithCustomToken {
                        email: "functest@example.com".to_string(),
                        password: "testpassword123".to_string(),
                        collection: "accounts".to_string(),
                        account_id: "test-account-002".to_string(),
                        data: json!({ "tickets": 50, "email": "functest@example.com" }),
                        function: "getAccountInfo".to_string(),
                        expected_pointer: "/account/tickets".to_string(),
                        expected_value: json!(50),
                    },
                )
                .section("getAccountInfo Callable"),
            ],
            Profile::CustomConfigName => vec![
                PlannedCheck::new("Auth", auth("test@example.com", "password123", false))
                    .plain("Testing Auth emulator..."),
                PlannedCheck::new(
                    "Firestore",
                    firestore(
                        "test",
                        "doc1",
                        json!({ "message": "Hello from custom config test!" }),
                    ),
                )
                .plain("Testing Firestore emulator..."),
            ],
        }
    }

    /// Emulators the plan talks to, in first-use order.
    pub fn services(self, config: &SmokeConfig) -> Vec<EmulatorService> {
        let mut services = Vec::new();
        for planned in self.plan(config) {
            for service in planned.check.services() {
                if !services.contains(&service) {
                    services.push(service);
                }
            }
        }
        services
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Profile::ALL
            .into_iter()
            .find(|profile| profile.name() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Profile::ALL.iter().map(|profile| profile.name()).collect();
                format!("unknown profile '{wanted}' (known: {})", known.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for profile in Profile::ALL {
            assert_eq!(profile.name().parse::<Profile>(), Ok(profile));
        }
        assert!("nightly".parse::<Profile>().is_err());
    }

    #[test]
    fn custom_port_labels_follow_resolved_hosts() {
        let mut config = Profile::CustomPorts.defaults();
        config = config.with_host(EmulatorService::Firestore, EmulatorHost::local(18888));
        let plan = Profile::CustomPorts.plan(&config);
        assert_eq!(plan[0].label, "Authentication (9199)");
        assert_eq!(plan[0].feature, "Authentication");
        assert_eq!(
            plan[0].heading,
            Heading::Section("Authentication (Port 9199)".into())
        );
        assert_eq!(plan[1].label, "Firestore (18888)");
        match &plan[1].check {
            Check::FirestoreRoundTrip { data, .. } => assert_eq!(data["port"], json!(18888)),
            other => panic!("unexpected check {other:?}"),
        }
    }

    #[test]
    fn sta2ble_profile_uses_mock_credential_and_wide_banner() {
        let config = Profile::Sta2bleCustomPorts.defaults();
        assert_eq!(config.credential, CredentialKind::Mock);
        assert_eq!(config.project_id, "demo-sta2ble-ports");
        assert_eq!(Profile::Sta2bleCustomPorts.banner_width(), 60);
        let lines = Profile::Sta2bleCustomPorts.init_lines(&config, Marks::BRACKETS);
        assert_eq!(lines[1], "    Auth: 17641, Firestore: 17644, Functions: 17642");
        assert_eq!(Profile::Sta2bleCustomPorts.plan(&config).len(), 4);
    }

    #[test]
    fn multi_functions_uses_localhost() {
        let config = Profile::MultiFunctions.defaults();
        assert_eq!(
            config.host(EmulatorService::Functions).map(EmulatorHost::authority),
            Some("localhost:15001".to_string())
        );
        assert_eq!(
            Profile::MultiFunctions.services(&config),
            vec![
                EmulatorService::Auth,
                EmulatorService::Firestore,
                EmulatorService::Functions
            ]
        );
    }

    #[test]
    fn default_ports_touch_three_emulators() {
        let config = Profile::DefaultPorts.defaults();
        assert_eq!(
            Profile::DefaultPorts.services(&config),
            vec![
                EmulatorService::Auth,
                EmulatorService::Firestore,
                EmulatorService::Storage
            ]
        );
        assert_eq!(config.bucket(), "demo-project.appspot.com");
    }

    #[test]
    fn every_profile_has_a_plan() {
        for profile in Profile::ALL {
            let config = profile.defaults();
            assert!(!profile.plan(&config).is_empty(), "{profile} has no checks");
            for service in profile.services(&config) {
                assert!(
                    config.host(service).is_some(),
                    "{profile} needs a default {service} host"
                );
            }
        }
    }
}
