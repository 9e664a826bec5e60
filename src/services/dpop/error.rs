use thiserror::Error;

/// Reasons a DPoP proof is rejected.
///
/// Every variant is a client error scoped to a single request. None of them
/// are retryable: verification is a pure function of the proof and the clock.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofError {
    #[error("malformed DPoP proof: {0}")]
    MalformedProof(String),
    #[error("invalid DPoP proof: expected exactly 1 signature, found {0}")]
    MultiSignature(usize),
    #[error("missing jwk in DPoP header")]
    MissingKey,
    #[error("invalid jwk in DPoP header: {0}")]
    InvalidKey(&'static str),
    #[error("DPoP signature or claims rejected: {0}")]
    SignatureOrClaim(String),
    #[error("DPoP iat {iat} is in the future (now {now})")]
    FutureIssuedAt { iat: i64, now: i64 },
    #[error("DPoP iat {iat} is too old (now {now})")]
    StaleIssuedAt { iat: i64, now: i64 },
    #[error("invalid DPoP typ: {0:?}")]
    WrongType(Option<String>),
    #[error("htm mismatch")]
    HttpMethodMismatch,
    #[error("htu mismatch")]
    HttpEndpointMismatch,
}

/// Failures of the token-endpoint DPoP policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// Proof verification failed; the verifier's error is passed through as is.
    #[error(transparent)]
    Proof(#[from] ProofError),

    #[error("invalid request: {hint}")]
    PolicyViolation { hint: String },

    /// The request already carries a key fingerprint.
    #[error("token request is already bound to a key")]
    AlreadyBound,
}
