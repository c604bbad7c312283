//! Storage emulator client for the Firebase v0 object API.

mod api;
pub mod error;
mod location;

pub use api::{ObjectMetadata, Storage};
pub use error::{StorageError, StorageErrorCode, StorageResult};
pub use location::Location;
