//! The single client handle shared by every service client in a run.
mod api;
mod errors;
mod types;

#[doc(inline)]
pub use api::{delete_app, get_app, get_apps, initialize_app, DEFAULT_ENTRY_NAME};

#[doc(inline)]
pub use errors::{AppError, AppResult};

#[doc(inline)]
pub use types::{AppOptions, AppSettings, EmulatorApp};
