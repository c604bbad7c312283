//! Authentication emulator: account administration and custom-token sign-in.

mod api;
pub mod error;
mod model;
pub mod token;

pub use api::{AuthAdmin, DEFAULT_API_KEY};
pub use error::{AuthError, AuthErrorCode, AuthResult};
pub use model::{CreateUserRequest, IdTokenResponse, ProviderUserInfo, UserRecord};
pub use token::{create_custom_token, CUSTOM_TOKEN_AUDIENCE};
