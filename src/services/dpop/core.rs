//! DPoP proof verification (RFC 9449) - core logic.
//!
//! This module knows nothing about HTTP or token requests. It turns a proof
//! string into validated claims plus the fingerprint of the key that signed it.
//! Replay protection (jti cache) and `ath` checks are not done here.

use std::str::FromStr;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, jwk::Jwk};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::services::dpop::clock::{Clock, SystemClock};
use crate::services::dpop::error::ProofError;
use crate::services::dpop::jws::{self, SignedProof};
use crate::services::dpop::thumbprint::{jwk_thumbprint, required_members};
use crate::services::dpop::types::{DPOP_PROOF_TYP, ProofClaims};

/// JWK members that only exist on private keys.
const PRIVATE_MEMBERS: [&str; 7] = ["d", "p", "q", "dp", "dq", "qi", "oth"];

/// Verifies a DPoP proof and derives the fingerprint of its key.
///
/// The token-endpoint handler only depends on this trait, so test doubles or
/// other proof formats can be plugged in.
pub trait ProofVerifier: Send + Sync {
    fn verify(&self, proof: &str) -> Result<ProofClaims, ProofError>;
}

/// Freshness knobs of the default verifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifierOptions {
    // Allowed clock skew for iat in the future, seconds.
    pub iat_leeway_seconds: i64,
    // Maximum acceptable age of the proof (now - iat), seconds. None = unbounded.
    pub max_age_seconds: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct DefaultProofVerifier<C = SystemClock> {
    clock: C,
    options: VerifierOptions,
}

impl DefaultProofVerifier<SystemClock> {
    pub fn new(options: VerifierOptions) -> Self {
        Self::with_clock(SystemClock, options)
    }
}

impl Default for DefaultProofVerifier<SystemClock> {
    fn default() -> Self {
        Self::new(VerifierOptions::default())
    }
}

impl<C: Clock> DefaultProofVerifier<C> {
    pub fn with_clock(clock: C, options: VerifierOptions) -> Self {
        Self { clock, options }
    }

    pub fn options(&self) -> VerifierOptions {
        self.options
    }

    fn check_freshness(&self, iat: i64) -> Result<(), ProofError> {
        let now = self.clock.now();
        let leeway = self.options.iat_leeway_seconds;

        // iat must not be in the future
        if iat > now.saturating_add(leeway) {
            return Err(ProofError::FutureIssuedAt { iat, now });
        }

        // iat must not be too old (only when configured); an age that does
        // not fit in i64 is stale by definition.
        if let Some(max_age) = self.options.max_age_seconds {
            let stale = match now.checked_sub(iat) {
                Some(age) => age > max_age.saturating_add(leeway),
                None => true,
            };
            if stale {
                return Err(ProofError::StaleIssuedAt { iat, now });
            }
        }

        Ok(())
    }
}

impl<C: Clock> ProofVerifier for DefaultProofVerifier<C> {
    fn verify(&self, proof: &str) -> Result<ProofClaims, ProofError> {
        // 1) + 2) Parse the JWS, exactly one signature layer.
        let signed = jws::parse_signed(proof)?;

        // 3) Embedded key.
        let jwk = embedded_jwk(&signed)?;

        // 4) Must be a usable public key.
        let decoding_key = public_decoding_key(jwk)?;

        // 5) Signature + claims.
        let mut claims = decode_claims(&signed, &decoding_key)?;

        // 6) iat window.
        self.check_freshness(claims.issued_at)?;

        // 7) typ
        match signed.header.typ.as_deref() {
            Some(DPOP_PROOF_TYP) => {}
            other => return Err(ProofError::WrongType(other.map(str::to_string))),
        }

        // 8) Fingerprint always comes from the verified header key.
        claims.key_fingerprint = jwk_thumbprint(jwk)?;

        debug!(
            jti = %claims.id,
            htm = %claims.http_method,
            jkt = %claims.key_fingerprint,
            "DPoP proof verified"
        );

        Ok(claims)
    }
}

fn embedded_jwk(signed: &SignedProof) -> Result<&Map<String, Value>, ProofError> {
    match signed.header.jwk.as_ref() {
        None | Some(Value::Null) => Err(ProofError::MissingKey),
        Some(Value::Object(jwk)) => Ok(jwk),
        Some(_) => Err(ProofError::InvalidKey("jwk is not an object")),
    }
}

fn public_decoding_key(jwk: &Map<String, Value>) -> Result<DecodingKey, ProofError> {
    let kty = jwk
        .get("kty")
        .and_then(Value::as_str)
        .ok_or(ProofError::InvalidKey("missing kty"))?;

    if kty == "oct" {
        return Err(ProofError::InvalidKey("symmetric keys are not allowed"));
    }

    if PRIVATE_MEMBERS.iter().any(|member| jwk.contains_key(*member)) {
        return Err(ProofError::InvalidKey("jwk must be a public key"));
    }

    let members = required_members(kty).ok_or(ProofError::InvalidKey("unsupported kty"))?;
    if members
        .iter()
        .any(|member| jwk.get(*member).and_then(Value::as_str).is_none())
    {
        return Err(ProofError::InvalidKey("missing required member"));
    }

    let parsed: Jwk = serde_json::from_value(Value::Object(jwk.clone())).map_err(|e| {
        warn!(error = %e, "unparseable DPoP jwk");
        ProofError::InvalidKey("unparseable jwk")
    })?;

    DecodingKey::from_jwk(&parsed).map_err(|e| {
        warn!(error = %e, "unusable DPoP jwk");
        ProofError::InvalidKey("unusable jwk")
    })
}

fn decode_claims(signed: &SignedProof, key: &DecodingKey) -> Result<ProofClaims, ProofError> {
    let alg = signed
        .header
        .alg
        .as_deref()
        .ok_or_else(|| ProofError::SignatureOrClaim("missing alg".to_string()))?;
    let alg = Algorithm::from_str(alg)
        .map_err(|_| ProofError::SignatureOrClaim(format!("unsupported alg {}", alg)))?;

    if matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
        return Err(ProofError::SignatureOrClaim(
            "symmetric alg is not allowed".to_string(),
        ));
    }

    // A DPoP proof is not an access token: no exp/aud/iss here, freshness is iat based.
    let mut validation = Validation::new(alg);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let token_data =
        jsonwebtoken::decode::<ProofClaims>(signed.compact.as_str(), key, &validation).map_err(
            |e| {
                warn!(error = %e, "invalid DPoP proof signature or claims");
                ProofError::SignatureOrClaim(e.to_string())
            },
        )?;

    Ok(token_data.claims)
}
