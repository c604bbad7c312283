use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::engine::Engine as _;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Default)]
pub struct DecodedToken {
    pub header: Value,
    pub claims: Value,
    pub signature: String,
}

/// Encodes `claims` as an `alg: none` JWT with an empty signature segment.
///
/// The Auth emulator accepts such tokens wherever a signed custom token is
/// expected.
pub fn encode_unsigned_jwt(claims: &Map<String, Value>) -> String {
    let header = json!({ "alg": "none", "typ": "JWT" });
    format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(Value::Object(claims.clone()).to_string())
    )
}

/// Splits a JWT into its parts without verifying anything. Unreadable
/// segments decode to empty objects.
pub fn decode_jwt(token: &str) -> DecodedToken {
    let mut parts = token.split('.');
    let header = decode_part(parts.next().unwrap_or_default());
    let claims = decode_part(parts.next().unwrap_or_default());
    let signature = parts.next().unwrap_or_default().to_string();

    DecodedToken {
        header,
        claims,
        signature,
    }
}

fn decode_part(part: &str) -> Value {
    if part.is_empty() {
        return Value::Object(Map::new());
    }

    // Accept padded input as well; some issuers keep the `=` suffix.
    match URL_SAFE_NO_PAD
        .decode(part.trim_end_matches('='))
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok())
    {
        Some(value) => value,
        None => Value::Object(Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_token_has_empty_signature() {
        let mut claims = Map::new();
        claims.insert("uid".into(), json!("alice"));
        claims.insert("iat".into(), json!(1_700_000_000));

        let token = encode_unsigned_jwt(&claims);
        assert!(token.ends_with('.'));
        assert_eq!(token.split('.').count(), 3);

        let decoded = decode_jwt(&token);
        assert_eq!(decoded.header["alg"], json!("none"));
        assert_eq!(decoded.claims["uid"], json!("alice"));
        assert!(decoded.signature.is_empty());
        assert_eq!(decoded.claims["iat"], json!(1_700_000_000));
    }

    #[test]
    fn garbage_segments_decode_to_empty_objects() {
        let decoded = decode_jwt("not-base64!.also-not");
        assert_eq!(decoded.header, json!({}));
        assert_eq!(decoded.claims, json!({}));
    }
}
