//! Compact token decoding
//!
//! Tokens are decoded for display only. Nothing here verifies a signature or
//! checks expiry, so a decoded claim set must never drive a trust decision.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::{Map, Value};

/// Claim mapping decoded from a token payload
pub type Claims = Map<String, Value>;

/// Decode the payload segment of a compact `header.payload.signature` token.
///
/// Fail-soft: anything that is not exactly three segments with a base64url
/// JSON object in the middle yields an empty mapping.
///
/// ```
/// use flowgate_core::codec::decode;
///
/// // {"sub":"u1"}
/// let claims = decode("eyJhbGciOiJub25lIn0.eyJzdWIiOiJ1MSJ9.");
/// assert_eq!(claims["sub"], "u1");
///
/// assert!(decode("not-a-token").is_empty());
/// ```
pub fn decode(token: &str) -> Claims {
    try_decode(token).unwrap_or_default()
}

/// Like [`decode`], for callers holding an optional token.
pub fn decode_opt(token: Option<&str>) -> Claims {
    token.map(decode).unwrap_or_default()
}

fn try_decode(token: &str) -> Option<Claims> {
    let mut segments = token.trim().split('.');
    let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() || payload.is_empty() {
        return None;
    }

    // Some issuers keep the `=` padding, most strip it
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| URL_SAFE.decode(payload))
        .ok()?;

    match serde_json::from_slice::<Value>(&bytes).ok()? {
        Value::Object(claims) => Some(claims),
        _ => None,
    }
}

/// Encode claims as an unsigned compact token.
///
/// Used to mint display tokens for simulated exchanges and tests.
pub fn encode_unsigned(header: &Value, claims: &Value, signature: &str) -> String {
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string()),
        signature
    )
}

/// Read a string claim
pub fn claim_str<'a>(claims: &'a Claims, name: &str) -> Option<&'a str> {
    claims.get(name).and_then(Value::as_str)
}

/// Read an integer claim (`exp`, `iat`, ...)
pub fn claim_i64(claims: &Claims, name: &str) -> Option<i64> {
    claims.get(name).and_then(Value::as_i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token_with_payload(payload: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_decode_well_formed() {
        let claims = decode(&token_with_payload(r#"{"sub":"u1"}"#));
        assert_eq!(claims.len(), 1);
        assert_eq!(claims["sub"], "u1");
    }

    #[test]
    fn test_decode_malformed_inputs_are_empty() {
        let cases = [
            String::new(),
            "   ".to_string(),
            "onesegment".to_string(),
            "two.segments".to_string(),
            "a.b.c.d".to_string(),
            "header.!!!not-base64!!!.sig".to_string(),
            token_with_payload("not json"),
            token_with_payload("[1,2,3]"),
            token_with_payload(r#""just a string""#),
            "header..sig".to_string(),
        ];

        for case in cases {
            assert!(decode(&case).is_empty(), "expected empty claims for {:?}", case);
        }
    }

    #[test]
    fn test_decode_opt_none_is_empty() {
        assert!(decode_opt(None).is_empty());
        assert_eq!(
            decode_opt(Some(&token_with_payload(r#"{"sub":"u2"}"#)))["sub"],
            "u2"
        );
    }

    #[test]
    fn test_decode_accepts_padded_payload() {
        let payload = URL_SAFE.encode(r#"{"sub":"u12"}"#);
        assert!(payload.ends_with('='));
        let claims = decode(&format!("h.{}.s", payload));
        assert_eq!(claims["sub"], "u12");
    }

    #[test]
    fn test_decode_trims_whitespace() {
        let token = format!("  {}\n", token_with_payload(r#"{"sub":"u1"}"#));
        assert_eq!(decode(&token)["sub"], "u1");
    }

    #[test]
    fn test_decode_ignores_signature_and_expiry() {
        let token = token_with_payload(r#"{"sub":"u1","exp":1}"#);
        let tampered = format!("{}tampered", token);
        let claims = decode(&tampered);
        assert_eq!(claim_i64(&claims, "exp"), Some(1));
    }

    #[test]
    fn test_encode_unsigned_decodes() {
        let token = encode_unsigned(
            &json!({"alg": "none"}),
            &json!({"sub": "agent", "scope": "mcp:read", "exp": 1700000000}),
            "simulated",
        );
        let claims = decode(&token);
        assert_eq!(claim_str(&claims, "sub"), Some("agent"));
        assert_eq!(claim_str(&claims, "scope"), Some("mcp:read"));
        assert_eq!(claim_i64(&claims, "exp"), Some(1_700_000_000));
        assert_eq!(claim_str(&claims, "missing"), None);
    }
}
