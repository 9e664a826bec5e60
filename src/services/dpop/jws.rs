//! JWS envelope parsing for DPoP proofs.
//!
//! Accepts the compact serialization and both JSON serializations (general and
//! flattened) and normalizes a singly signed proof into compact form so the
//! signature can be checked by `jsonwebtoken`.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;

use crate::services::dpop::error::ProofError;
use crate::services::dpop::types::DpopHeader;

/// A parsed proof with exactly one signature layer.
#[derive(Debug, Clone)]
pub(crate) struct SignedProof {
    pub header: DpopHeader,
    pub compact: String,
}

pub(crate) fn parse_signed(proof: &str) -> Result<SignedProof, ProofError> {
    let proof = proof.trim();
    if proof.is_empty() {
        return Err(ProofError::MalformedProof("empty proof".to_string()));
    }

    let (protected, payload, signature) = if proof.starts_with('{') {
        parse_json_serialization(proof)?
    } else {
        parse_compact(proof)?
    };

    let header = decode_protected_header(&protected)?;

    Ok(SignedProof {
        header,
        compact: format!("{}.{}.{}", protected, payload, signature),
    })
}

fn parse_compact(proof: &str) -> Result<(String, String, String), ProofError> {
    let segments: Vec<&str> = proof.split('.').collect();
    match segments.as_slice() {
        [protected, payload, signature] if !protected.is_empty() && !signature.is_empty() => Ok((
            protected.to_string(),
            payload.to_string(),
            signature.to_string(),
        )),
        [_, _, _] => Err(ProofError::MalformedProof(
            "empty header or signature segment".to_string(),
        )),
        other => Err(ProofError::MalformedProof(format!(
            "expected 3 segments, found {}",
            other.len()
        ))),
    }
}

fn parse_json_serialization(proof: &str) -> Result<(String, String, String), ProofError> {
    let value: Value = serde_json::from_str(proof)
        .map_err(|e| ProofError::MalformedProof(format!("invalid JWS JSON: {}", e)))?;
    let object = value
        .as_object()
        .ok_or_else(|| ProofError::MalformedProof("JWS JSON is not an object".to_string()))?;

    let payload = string_member(object, "payload")?;

    // General serialization: one entry per signature.
    let layer = match object.get("signatures") {
        Some(Value::Array(signatures)) => {
            if signatures.len() != 1 {
                return Err(ProofError::MultiSignature(signatures.len()));
            }
            signatures[0].as_object().ok_or_else(|| {
                ProofError::MalformedProof("signature entry is not an object".to_string())
            })?
        }
        Some(_) => {
            return Err(ProofError::MalformedProof(
                "signatures is not an array".to_string(),
            ));
        }
        // Flattened serialization.
        None => object,
    };

    let protected = string_member(layer, "protected")?;
    let signature = string_member(layer, "signature")?;

    Ok((protected, payload, signature))
}

fn string_member(
    object: &serde_json::Map<String, Value>,
    name: &'static str,
) -> Result<String, ProofError> {
    object
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ProofError::MalformedProof(format!("missing {}", name)))
}

fn decode_protected_header(protected: &str) -> Result<DpopHeader, ProofError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(protected)
        .map_err(|_| ProofError::MalformedProof("header is not base64url".to_string()))?;

    serde_json::from_slice::<DpopHeader>(&bytes)
        .map_err(|_| ProofError::MalformedProof("header is not a JSON object".to_string()))
}
