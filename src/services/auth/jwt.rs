use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum IssuerError {
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
    #[error("failed to sign access token: {0}")]
    Signing(String),
}

/// Signs access tokens with the authorization server's Ed25519 key.
#[derive(Clone)]
pub struct JwtIssuer {
    issuer: String,
    audience: String,
    ttl_seconds: u64,
    encoding_key: EncodingKey,
}

impl std::fmt::Debug for JwtIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("JwtIssuer")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl JwtIssuer {
    /// `private_key_pem` must be an Ed25519 private key in PKCS#8 PEM format.
    pub fn new(
        private_key_pem: &str,
        issuer: String,
        audience: String,
        ttl_seconds: u64,
    ) -> Result<Self, IssuerError> {
        let encoding_key = EncodingKey::from_ed_pem(private_key_pem.as_bytes()).map_err(|e| {
            warn!(error = %e, "failed to parse access JWT private key PEM (expected Ed25519 PKCS#8 PEM)");
            IssuerError::InvalidKey(e.to_string())
        })?;

        Ok(Self {
            issuer,
            audience,
            ttl_seconds,
            encoding_key,
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    // JWT profile for OAuth 2.0 access tokens (RFC 9068): typ = at+jwt
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, IssuerError> {
        let mut header = Header::new(Algorithm::EdDSA);
        header.typ = Some("at+jwt".to_string());
        jsonwebtoken::encode(&header, claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign JWT");
            IssuerError::Signing(e.to_string())
        })
    }
}
