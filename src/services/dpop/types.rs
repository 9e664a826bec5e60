use serde::{Deserialize, Serialize};

/// Expected `typ` header value of a DPoP proof JWT (RFC 9449).
pub const DPOP_PROOF_TYP: &str = "dpop+jwt";

/// Protected header of a DPoP proof.
///
/// `jwk` stays a raw JSON value so private members
/// (`d`, ...) are still visible when the key is validated.
#[derive(Debug, Clone, Deserialize)]
pub struct DpopHeader {
    #[serde(default)]
    pub typ: Option<String>, // must be "dpop+jwt"
    #[serde(default)]
    pub alg: Option<String>, // e.g., "ES256 / EdDSA"
    #[serde(default)]
    pub jwk: Option<serde_json::Value>, // embedded public key (JWK)
}

/// Validated content of a DPoP proof.
///
/// `key_fingerprint` is never read from the claim body. The verifier computes
/// it from the JWK in the protected header after the signature checks out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofClaims {
    // unique proof identifier (replay detection hook)
    #[serde(rename = "jti", default)]
    pub id: String,
    // HTTP method
    #[serde(rename = "htm", default)]
    pub http_method: String,
    // HTTP URI (absolute)
    #[serde(rename = "htu", default)]
    pub http_endpoint: String,
    // issued at (unix seconds)
    #[serde(rename = "iat")]
    pub issued_at: i64,
    // base64url(SHA-256(access_token)), not validated at the token endpoint
    #[serde(rename = "ath", default, skip_serializing_if = "Option::is_none")]
    pub access_token_hash: Option<String>,

    #[serde(skip)]
    pub key_fingerprint: String,
}
