#![allow(dead_code)]

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::pkcs8::{EncodePrivateKey, spki::der::pem::LineEnding};
use p256::ecdsa::signature::Signer as _;
use p256::ecdsa::{Signature, SigningKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use dpop_binding::services::auth::{JwtIssuer, TokenIssuer};
use dpop_binding::services::dpop::{
    DefaultProofVerifier, DpopHandler, DpopPolicy, FixedClock, VerifierOptions,
};
use dpop_binding::state::AppState;

pub const NOW: i64 = 1_700_000_000;

/// EC P-256 client key used to sign proofs.
pub struct ClientKey(SigningKey);

impl ClientKey {
    pub fn generate() -> Self {
        Self(SigningKey::random(&mut rand::rngs::OsRng))
    }

    pub fn public_jwk(&self) -> Value {
        let point = self.0.verifying_key().as_affine().to_encoded_point(false);
        json!({
            "kty": "EC",
            "crv": "P-256",
            "x": URL_SAFE_NO_PAD.encode(point.x().unwrap()),
            "y": URL_SAFE_NO_PAD.encode(point.y().unwrap()),
        })
    }

    /// RFC 7638 thumbprint computed independently of the library.
    pub fn expected_thumbprint(&self) -> String {
        let jwk = self.public_jwk();
        let canonical = format!(
            r#"{{"crv":"P-256","kty":"EC","x":"{}","y":"{}"}}"#,
            jwk["x"].as_str().unwrap(),
            jwk["y"].as_str().unwrap()
        );
        URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes()))
    }

    pub fn proof(&self, htm: &str, htu: &str, iat: i64) -> String {
        self.proof_with(json!("dpop+jwt"), htm, htu, iat)
    }

    pub fn proof_with(&self, typ: Value, htm: &str, htu: &str, iat: i64) -> String {
        let header = json!({ "typ": typ, "alg": "ES256", "jwk": self.public_jwk() });
        let claims = json!({
            "jti": uuid::Uuid::new_v4().to_string(),
            "htm": htm,
            "htu": htu,
            "iat": iat,
        });

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(claims.to_string())
        );
        let signature: Signature = self.0.sign(signing_input.as_bytes());

        format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        )
    }
}

pub fn access_token_pem() -> String {
    ed25519_dalek::SigningKey::from_bytes(&[9u8; 32])
        .to_pkcs8_pem(LineEnding::LF)
        .unwrap()
        .to_string()
}

pub fn state(policy: DpopPolicy) -> AppState {
    let jwt = JwtIssuer::new(
        &access_token_pem(),
        "https://as.example".to_string(),
        "https://rs.example".to_string(),
        300,
    )
    .unwrap();
    let verifier = DefaultProofVerifier::with_clock(FixedClock(NOW), VerifierOptions::default());

    AppState::new(
        Arc::new(TokenIssuer::new(jwt)),
        Arc::new(DpopHandler::new(policy, Arc::new(verifier))),
    )
    .with_public_base_url(Some("https://as.example".to_string()))
    .with_expose_debug(true)
}

/// Decode a JWT payload without verifying it.
pub fn jwt_payload(token: &str) -> Value {
    let segment = token.split('.').nth(1).unwrap();
    serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segment).unwrap()).unwrap()
}
