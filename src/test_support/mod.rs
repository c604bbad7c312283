//! Test utilities shared across crate-level unit tests.

use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use httpmock::MockServer;

use crate::app::{initialize_app, AppOptions, AppSettings, EmulatorApp};
use crate::credential::MockCredential;
use crate::emulator::EmulatorHost;

/// Starts a mock server, or returns `None` where the sandbox forbids binding.
pub fn start_mock_server() -> Option<MockServer> {
    panic::catch_unwind(|| MockServer::start()).ok()
}

/// Registers an app under a unique name so tests never collide in the global registry.
pub fn test_app(prefix: &str, project_id: &str) -> EmulatorApp {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let settings = AppSettings {
        name: Some(format!(
            "{prefix}-{}",
            COUNTER.fetch_add(1, Ordering::SeqCst)
        )),
    };
    let options = AppOptions {
        project_id: project_id.to_string(),
        storage_bucket: Some(format!("{project_id}.appspot.com")),
        api_key: Some("fake-api-key".to_string()),
    };
    initialize_app(
        options,
        Arc::new(MockCredential::new(project_id)),
        Some(settings),
    )
    .expect("initialize test app")
}

/// Emulator host pointing at a mock server.
pub fn mock_host(server: &MockServer) -> EmulatorHost {
    EmulatorHost::new(server.host(), Some(server.port()))
}
