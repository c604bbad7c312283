use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::auth::error::{invalid_argument, AuthResult};
use crate::util::encode_unsigned_jwt;

pub const CUSTOM_TOKEN_AUDIENCE: &str =
    "https://identitytoolkit.googleapis.com/google.identity.identitytoolkit.v1.IdentityToolkit";

const TOKEN_LIFETIME_SECS: i64 = 3600;
const MAX_UID_LENGTH: usize = 128;

/// Claim names that the token itself owns and that callers may not override.
const RESERVED_CLAIMS: &[&str] = &[
    "acr",
    "amr",
    "at_hash",
    "aud",
    "auth_time",
    "azp",
    "cnf",
    "c_hash",
    "exp",
    "firebase",
    "iat",
    "iss",
    "jti",
    "nbf",
    "nonce",
    "sub",
];

/// Mints an unsigned custom token for `uid`, issued by `issuer`.
pub fn create_custom_token(
    issuer: &str,
    uid: &str,
    developer_claims: Option<&Map<String, Value>>,
) -> AuthResult<String> {
    create_custom_token_at(issuer, uid, developer_claims, Utc::now().timestamp())
}

pub(crate) fn create_custom_token_at(
    issuer: &str,
    uid: &str,
    developer_claims: Option<&Map<String, Value>>,
    issued_at: i64,
) -> AuthResult<String> {
    if uid.is_empty() || uid.chars().count() > MAX_UID_LENGTH {
        return Err(invalid_argument(format!(
            "uid must be a non-empty string with at most {MAX_UID_LENGTH} characters"
        )));
    }
    if issuer.is_empty() {
        return Err(invalid_argument(
            "A service account email is required to mint custom tokens",
        ));
    }

    let mut claims = Map::new();
    claims.insert("iss".into(), json!(issuer));
    claims.insert("sub".into(), json!(issuer));
    claims.insert("aud".into(), json!(CUSTOM_TOKEN_AUDIENCE));
    claims.insert("iat".into(), json!(issued_at));
    claims.insert("exp".into(), json!(issued_at + TOKEN_LIFETIME_SECS));
    claims.insert("uid".into(), json!(uid));

    if let Some(developer_claims) = developer_claims.filter(|claims| !claims.is_empty()) {
        if let Some(reserved) = developer_claims
            .keys()
            .find(|key| RESERVED_CLAIMS.contains(&key.as_str()))
        {
            return Err(invalid_argument(format!(
                "Developer claim \"{reserved}\" is reserved and cannot be specified"
            )));
        }
        claims.insert("claims".into(), Value::Object(developer_claims.clone()));
    }

    Ok(encode_unsigned_jwt(&claims))
}
