use crate::services::oauth::HttpTarget;

/// Transport-level DPoP data of one token request.
#[derive(Debug, Clone)]
pub struct DpopRequest {
    /// Raw proof from the `DPoP` header; `None` when absent or empty.
    pub proof: Option<String>,
    /// Method and absolute URL the request was received on.
    pub target: HttpTarget,
}
