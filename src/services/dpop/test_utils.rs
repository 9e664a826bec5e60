//! Proof minting helpers for unit tests.
//!
//! Proofs are assembled by hand (base64url header/payload + raw signature) so
//! tests can also produce broken and multi-signature variants.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::Signer as _;
use p256::ecdsa::signature::Signer as _;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use serde_json::{Map, Value, json};

use crate::services::dpop::thumbprint::jwk_thumbprint;

pub(crate) enum TestKey {
    Es256(p256::ecdsa::SigningKey),
    EdDsa(ed25519_dalek::SigningKey),
}

impl TestKey {
    pub fn es256() -> Self {
        Self::Es256(p256::ecdsa::SigningKey::random(&mut rand::rngs::OsRng))
    }

    pub fn ed25519() -> Self {
        Self::EdDsa(ed25519_dalek::SigningKey::from_bytes(&[7u8; 32]))
    }

    pub fn alg(&self) -> &'static str {
        match self {
            Self::Es256(_) => "ES256",
            Self::EdDsa(_) => "EdDSA",
        }
    }

    pub fn public_jwk(&self) -> Value {
        match self {
            Self::Es256(key) => {
                let point = key.verifying_key().as_affine().to_encoded_point(false);
                json!({
                    "kty": "EC",
                    "crv": "P-256",
                    "x": URL_SAFE_NO_PAD.encode(point.x().expect("uncompressed point")),
                    "y": URL_SAFE_NO_PAD.encode(point.y().expect("uncompressed point")),
                })
            }
            Self::EdDsa(key) => json!({
                "kty": "OKP",
                "crv": "Ed25519",
                "x": URL_SAFE_NO_PAD.encode(key.verifying_key().as_bytes()),
            }),
        }
    }

    pub fn private_jwk(&self) -> Value {
        let mut jwk = self.public_jwk();
        let d = match self {
            Self::Es256(key) => URL_SAFE_NO_PAD.encode(key.to_bytes()),
            Self::EdDsa(key) => URL_SAFE_NO_PAD.encode(key.to_bytes()),
        };
        jwk["d"] = Value::String(d);
        jwk
    }

    pub fn thumbprint(&self) -> String {
        match self.public_jwk() {
            Value::Object(jwk) => jwk_thumbprint(&jwk).expect("thumbprint"),
            _ => unreachable!(),
        }
    }

    pub fn sign(&self, input: &[u8]) -> Vec<u8> {
        match self {
            Self::Es256(key) => {
                let signature: p256::ecdsa::Signature = key.sign(input);
                signature.to_bytes().to_vec()
            }
            Self::EdDsa(key) => key.sign(input).to_bytes().to_vec(),
        }
    }
}

pub(crate) struct ProofBuilder<'a> {
    key: &'a TestKey,
    header: Map<String, Value>,
    claims: Map<String, Value>,
}

impl<'a> ProofBuilder<'a> {
    /// A valid proof for `POST https://as.example/token` issued at `iat`.
    pub fn new(key: &'a TestKey, iat: i64) -> Self {
        let mut header = Map::new();
        header.insert("typ".into(), json!("dpop+jwt"));
        header.insert("alg".into(), json!(key.alg()));
        header.insert("jwk".into(), key.public_jwk());

        let mut claims = Map::new();
        claims.insert("jti".into(), json!(uuid::Uuid::new_v4().to_string()));
        claims.insert("htm".into(), json!("POST"));
        claims.insert("htu".into(), json!("https://as.example/token"));
        claims.insert("iat".into(), json!(iat));

        Self {
            key,
            header,
            claims,
        }
    }

    pub fn header(mut self, name: &str, value: Value) -> Self {
        self.header.insert(name.to_string(), value);
        self
    }

    pub fn without_header(mut self, name: &str) -> Self {
        self.header.remove(name);
        self
    }

    pub fn claim(mut self, name: &str, value: Value) -> Self {
        self.claims.insert(name.to_string(), value);
        self
    }

    pub fn without_claim(mut self, name: &str) -> Self {
        self.claims.remove(name);
        self
    }

    fn encoded_header(&self) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&self.header).expect("header json"))
    }

    fn encoded_payload(&self) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&self.claims).expect("claims json"))
    }

    fn signature(&self, header: &str, payload: &str) -> String {
        let input = format!("{}.{}", header, payload);
        URL_SAFE_NO_PAD.encode(self.key.sign(input.as_bytes()))
    }

    pub fn compact(&self) -> String {
        let header = self.encoded_header();
        let payload = self.encoded_payload();
        let signature = self.signature(&header, &payload);
        format!("{}.{}.{}", header, payload, signature)
    }

    /// General JWS JSON serialization with `count` signature entries.
    pub fn general_json(&self, count: usize) -> String {
        let header = self.encoded_header();
        let payload = self.encoded_payload();
        let signatures: Vec<Value> = (0..count)
            .map(|_| {
                json!({
                    "protected": header,
                    "signature": self.signature(&header, &payload),
                })
            })
            .collect();

        json!({ "payload": payload, "signatures": signatures }).to_string()
    }
}
