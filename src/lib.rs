//! # firebase-emulator-smoke
//!
//! Smoke tests for the Firebase Local Emulator Suite. The crate talks to the
//! Auth, Firestore, Storage and Functions emulators over their REST surfaces,
//! runs short create/read/delete scenarios, and reports a pass/fail line per
//! feature area with an aggregate exit code.
//!
//! ```no_run
//! use firebase_emulator_smoke::smoke::{ConfigOverrides, Profile, Runner, SmokeConfig};
//!
//! # async fn run() -> firebase_emulator_smoke::smoke::SmokeResult<()> {
//! let profile = Profile::DefaultPorts;
//! let config = SmokeConfig::resolve(profile.defaults(), None, None, &ConfigOverrides::default())?;
//! let mut runner = Runner::new(profile, config, std::io::stdout());
//! let report = runner.run().await;
//! std::process::exit(report.exit_code());
//! # }
//! ```

pub mod app;
pub mod auth;
pub mod credential;
pub mod emulator;
pub mod firestore;
pub mod functions;
pub mod logger;
pub mod smoke;
pub mod storage;
pub mod util;

#[cfg(test)]
pub mod test_support;
