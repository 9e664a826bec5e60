//! DPoP (RFC 9449) sender-constrained token binding for the token endpoint.

pub mod clock;
pub mod core;
pub mod error;
pub mod handler;
pub mod htu;
mod jws;
pub mod thumbprint;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use clock::{Clock, FixedClock, SystemClock};
pub use self::core::{DefaultProofVerifier, ProofVerifier, VerifierOptions};
pub use error::{BindingError, ProofError};
pub use handler::{DpopHandler, DpopPolicy, MISSING_PROOF_HINT};
pub use thumbprint::jwk_thumbprint;
pub use types::{DPOP_PROOF_TYP, ProofClaims};

/// Name of the HTTP header carrying the proof (matched case-insensitively).
pub const DPOP_HEADER: &str = "dpop";
