//! JWK thumbprint (RFC 7638) used as the DPoP key fingerprint (`jkt`).

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::services::dpop::error::ProofError;

/// Members that make up the canonical form of each supported key type.
pub(crate) fn required_members(kty: &str) -> Option<&'static [&'static str]> {
    match kty {
        "EC" => Some(&["crv", "kty", "x", "y"]),
        "RSA" => Some(&["e", "kty", "n"]),
        "OKP" => Some(&["crv", "kty", "x"]),
        _ => None,
    }
}

/// Compute `base64url(SHA-256(canonical JWK))` without padding.
///
/// The canonical JSON keeps only the required members of the key type, in
/// lexicographic order and without whitespace. Optional members (`kid`, `alg`,
/// `use`, ...) never influence the result.
pub fn jwk_thumbprint(jwk: &Map<String, Value>) -> Result<String, ProofError> {
    let kty = jwk
        .get("kty")
        .and_then(Value::as_str)
        .ok_or(ProofError::InvalidKey("missing kty"))?;
    let members = required_members(kty).ok_or(ProofError::InvalidKey("unsupported kty"))?;

    // BTreeMap serializes in key order.
    let mut canonical = BTreeMap::new();
    for &member in members {
        let value = jwk
            .get(member)
            .and_then(Value::as_str)
            .ok_or(ProofError::InvalidKey("missing required member"))?;
        canonical.insert(member, value);
    }

    let json = serde_json::to_string(&canonical)
        .map_err(|_| ProofError::InvalidKey("unserializable jwk"))?;

    Ok(sha256_b64url(json.as_bytes()))
}

/// `base64url(SHA-256(input))`, the same encoding used for `ath`.
pub fn sha256_b64url(input: &[u8]) -> String {
    let digest = Sha256::digest(input);
    URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    #[test]
    fn rsa_thumbprint_matches_rfc7638_example() {
        let jwk = object(json!({
            "kty": "RSA",
            "n": "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw",
            "e": "AQAB",
            "alg": "RS256",
            "kid": "2011-04-29"
        }));

        assert_eq!(
            jwk_thumbprint(&jwk).unwrap(),
            "NzbLsXh8uDCcd-6MNwXF4W_7noWXFZAfHkxZsRGC9Xs"
        );
    }

    #[test]
    fn okp_thumbprint_matches_rfc8037_example() {
        let jwk = object(json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "x": "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"
        }));

        assert_eq!(
            jwk_thumbprint(&jwk).unwrap(),
            "kPrK_qmxVWaYVA9wwBF6Iuo3vVzz7TxHCTwXBygrS4k"
        );
    }

    #[test]
    fn thumbprint_matches_hand_built_canonical_form() {
        let jwk = object(json!({
            "y": "y-coord",
            "x": "x-coord",
            "use": "sig",
            "kty": "EC",
            "crv": "P-256"
        }));
        let canonical = r#"{"crv":"P-256","kty":"EC","x":"x-coord","y":"y-coord"}"#;

        assert_eq!(
            jwk_thumbprint(&jwk).unwrap(),
            sha256_b64url(canonical.as_bytes())
        );
    }

    #[test]
    fn thumbprint_rejects_incomplete_or_unknown_keys() {
        let missing_y = object(json!({ "kty": "EC", "crv": "P-256", "x": "abc" }));
        assert!(matches!(
            jwk_thumbprint(&missing_y),
            Err(ProofError::InvalidKey(_))
        ));

        let symmetric = object(json!({ "kty": "oct", "k": "c2VjcmV0" }));
        assert!(matches!(
            jwk_thumbprint(&symmetric),
            Err(ProofError::InvalidKey(_))
        ));
    }
}
