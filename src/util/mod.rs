//! Small helpers shared by the service clients.

pub mod jwt;

pub use jwt::{decode_jwt, encode_unsigned_jwt, DecodedToken};
