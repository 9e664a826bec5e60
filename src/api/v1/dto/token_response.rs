use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// "DPoP" when the token is bound to the client's key, otherwise "Bearer".
    pub token_type: &'static str,
    /// Seconds until expiry.
    pub expires_in: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}
