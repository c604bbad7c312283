//! Functions emulator client: plain HTTP functions and callable functions.

mod api;
pub mod error;
mod transport;

pub use api::{CallableFunction, Functions, DEFAULT_REGION};
pub use error::{FunctionsError, FunctionsErrorCode, FunctionsResult};
pub use transport::HttpFunctionResponse;
