use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::app::AppError;
use crate::auth::AuthError;
use crate::credential::CredentialError;
use crate::emulator::EmulatorError;
use crate::firestore::FirestoreError;
use crate::functions::FunctionsError;
use crate::storage::StorageError;

/// Any failure a smoke check can surface.
///
/// Service errors are wrapped as-is so their own code stays visible in the
/// report line. The remaining variants belong to the harness itself.
#[derive(Debug)]
pub enum SmokeError {
    App(AppError),
    Credential(CredentialError),
    Emulator(EmulatorError),
    Auth(AuthError),
    Firestore(FirestoreError),
    Storage(StorageError),
    Functions(FunctionsError),
    /// The emulator answered, but not with what was written.
    Assertion(String),
    Config(String),
    /// A retry loop ran out of attempts.
    Exhausted(String),
}

impl SmokeError {
    pub fn code_str(&self) -> &'static str {
        match self {
            SmokeError::App(err) => err.code_str(),
            SmokeError::Credential(err) => err.code_str(),
            SmokeError::Emulator(err) => err.code_str(),
            SmokeError::Auth(err) => err.code_str(),
            SmokeError::Firestore(err) => err.code_str(),
            SmokeError::Storage(err) => err.code_str(),
            SmokeError::Functions(err) => err.code_str(),
            SmokeError::Assertion(_) => "smoke/assertion-failed",
            SmokeError::Config(_) => "smoke/invalid-config",
            SmokeError::Exhausted(_) => "smoke/retries-exhausted",
        }
    }
}

impl Display for SmokeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SmokeError::App(err) => write!(f, "{err} ({})", err.code_str()),
            SmokeError::Credential(err) => Display::fmt(err, f),
            SmokeError::Emulator(err) => Display::fmt(err, f),
            SmokeError::Auth(err) => Display::fmt(err, f),
            SmokeError::Firestore(err) => Display::fmt(err, f),
            SmokeError::Storage(err) => Display::fmt(err, f),
            SmokeError::Functions(err) => Display::fmt(err, f),
            SmokeError::Assertion(message)
            | SmokeError::Config(message)
            | SmokeError::Exhausted(message) => write!(f, "{message} ({})", self.code_str()),
        }
    }
}

impl Error for SmokeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SmokeError::App(err) => Some(err),
            SmokeError::Credential(err) => Some(err),
            SmokeError::Emulator(err) => Some(err),
            SmokeError::Auth(err) => Some(err),
            SmokeError::Firestore(err) => Some(err),
            SmokeError::Storage(err) => Some(err),
            SmokeError::Functions(err) => Some(err),
            _ => None,
        }
    }
}

pub type SmokeResult<T> = Result<T, SmokeError>;

macro_rules! impl_from_service_error {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for SmokeError {
                fn from(error: $source) -> Self {
                    SmokeError::$variant(error)
                }
            }
        )*
    };
}

impl_from_service_error! {
    AppError => App,
    CredentialError => Credential,
    EmulatorError => Emulator,
    AuthError => Auth,
    FirestoreError => Firestore,
    StorageError => Storage,
    FunctionsError => Functions,
}

pub fn assertion(message: impl Into<String>) -> SmokeError {
    SmokeError::Assertion(message.into())
}

pub fn config_error(message: impl Into<String>) -> SmokeError {
    SmokeError::Config(message.into())
}

pub fn exhausted(message: impl Into<String>) -> SmokeError {
    SmokeError::Exhausted(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthErrorCode;
    use crate::emulator::error::not_ready;

    #[test]
    fn wrapped_errors_keep_their_code() {
        let err: SmokeError = AuthError::new(AuthErrorCode::UserNotFound, "no user").into();
        assert_eq!(err.code_str(), "auth/user-not-found");
        assert_eq!(err.to_string(), "no user (auth/user-not-found)");
        assert!(err.source().is_some());
    }

    #[test]
    fn harness_errors_render_with_their_code() {
        let err = assertion("expected 42, got 41");
        assert_eq!(
            err.to_string(),
            "expected 42, got 41 (smoke/assertion-failed)"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn app_errors_gain_a_code_suffix() {
        let err: SmokeError = AppError::NoProjectId.into();
        assert!(err.to_string().ends_with("(app/no-project-id)"));
    }

    #[test]
    fn readiness_failure_keeps_emulator_code() {
        let err: SmokeError = not_ready("down").into();
        assert_eq!(err.code_str(), "emulator/not-ready");
        assert_eq!(config_error("bad").code_str(), "smoke/invalid-config");
    }
}
