//! Sender-constrained (DPoP, RFC 9449) token binding for an OAuth2 token endpoint.
//!
//! A token request may carry a DPoP proof. The proof is verified, the
//! thumbprint of its public key is attached to the request, and issuance mints
//! a `DPoP` token bound to that key instead of a bearer token.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
