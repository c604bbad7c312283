//! Emulator endpoint discovery: host parsing, environment variables,
//! firebase.json emulator sections and readiness polling.

pub mod constants;
mod env;
pub mod error;
mod firebase_json;
mod host;
mod readiness;

pub use env::EmulatorEnvironment;
pub use error::{EmulatorError, EmulatorErrorCode, EmulatorResult};
pub use firebase_json::FirebaseEmulatorConfig;
pub use host::{EmulatorHost, EmulatorService};
pub use readiness::{wait_until_ready, ReadinessPolicy};
