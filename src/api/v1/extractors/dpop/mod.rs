/*!
 * DPoP request extractor
 *
 * Responsibility:
 * - read the (single) DPoP header of a token request
 * - rebuild the absolute request target the proof should be bound to
 * - types live in `types`, axum plumbing in `core`
 */

mod core;
mod types;

pub use self::core::DpopExtractor;
pub use types::DpopRequest;
