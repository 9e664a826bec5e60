//! Token-endpoint DPoP policy.
//!
//! Decides whether a proof is required, runs the verifier when one is present
//! and binds the token request to the proof's key fingerprint.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::services::dpop::core::ProofVerifier;
use crate::services::dpop::error::{BindingError, ProofError};
use crate::services::dpop::htu::htu_matches;
use crate::services::dpop::types::ProofClaims;
use crate::services::oauth::{HttpTarget, TokenRequest};

pub const MISSING_PROOF_HINT: &str = "Clients must include a DPoP proof JWT when performing the token request, but it is missing.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DpopPolicy {
    // If true, a token request without a DPoP proof is rejected.
    pub mandatory: bool,
    // If true, htm/htu must match the request the proof was sent with.
    pub bind_http_target: bool,
}

#[derive(Clone)]
pub struct DpopHandler {
    policy: DpopPolicy,
    verifier: Arc<dyn ProofVerifier>,
}

impl fmt::Debug for DpopHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DpopHandler")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl DpopHandler {
    pub fn new(policy: DpopPolicy, verifier: Arc<dyn ProofVerifier>) -> Self {
        Self { policy, verifier }
    }

    pub fn policy(&self) -> DpopPolicy {
        self.policy
    }

    /// Verify the request's DPoP proof (if any) and bind the request to its key.
    ///
    /// Verifier failures are returned unchanged inside `BindingError::Proof`.
    pub fn handle_token_endpoint_request(
        &self,
        request: &mut TokenRequest,
    ) -> Result<(), BindingError> {
        if request.dpop_proof().is_empty() {
            if self.policy.mandatory {
                warn!(request_id = %request.id(), "DPoP proof required but missing");
                return Err(BindingError::PolicyViolation {
                    hint: MISSING_PROOF_HINT.to_string(),
                });
            }
            debug!(request_id = %request.id(), "no DPoP proof, request stays bearer");
            return Ok(());
        }

        let claims = self.verifier.verify(request.dpop_proof()).map_err(|e| {
            warn!(request_id = %request.id(), error = %e, "DPoP proof rejected");
            e
        })?;

        if self.policy.bind_http_target {
            // No recorded target means nothing to compare against: fail closed.
            let checked = match request.http_target() {
                Some(target) => check_http_target(&claims, target),
                None => Err(ProofError::HttpEndpointMismatch),
            };
            checked.map_err(|e| {
                warn!(
                    request_id = %request.id(),
                    htm = %claims.http_method,
                    htu = %claims.http_endpoint,
                    error = %e,
                    "DPoP proof bound to another request"
                );
                e
            })?;
        }

        request.bind_key(claims.key_fingerprint)?;
        debug!(
            request_id = %request.id(),
            jkt = %request.key_fingerprint(),
            "token request bound to DPoP key"
        );

        Ok(())
    }
}

fn check_http_target(claims: &ProofClaims, target: &HttpTarget) -> Result<(), ProofError> {
    if !claims.http_method.eq_ignore_ascii_case(&target.method) {
        return Err(ProofError::HttpMethodMismatch);
    }
    if !htu_matches(&claims.http_endpoint, &target.url) {
        return Err(ProofError::HttpEndpointMismatch);
    }
    Ok(())
}
