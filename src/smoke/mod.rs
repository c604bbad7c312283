//! Smoke scenarios against the emulator suite.
//!
//! A [`Profile`] names one emulator layout and its ordered [`Check`]s. The
//! [`Runner`] executes them strictly in sequence, prints `[OK]`/`[FAIL]`
//! lines through a [`Reporter`], and returns a [`SuiteReport`] whose
//! `exit_code()` is 0 only when every check passed.

mod checks;
mod config;
pub mod error;
mod profiles;
mod report;
mod runner;

pub use checks::{Check, CheckContext, FunctionProbe, ProbeRequest};
pub use config::{ConfigOverrides, CredentialKind, SmokeConfig, DEFAULT_TIMEOUT_SECS};
pub use error::{SmokeError, SmokeResult};
pub use profiles::{Heading, PlannedCheck, Profile, ReportStyle};
pub use report::{CheckResult, Marks, Reporter, SuiteReport};
pub use runner::{http_client, wait_for_emulators, Runner};
