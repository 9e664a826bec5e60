use serde::Deserialize;

/// Form body of `POST /token` (`application/x-www-form-urlencoded`).
///
/// Everything is optional at this level so missing parameters are reported as
/// `invalid_request` by the handler instead of a generic form rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequestForm {
    pub grant_type: Option<String>,

    /// Required for `client_credentials`. Client authentication itself happens upstream.
    pub client_id: Option<String>,

    /// Space-delimited scope list.
    pub scope: Option<String>,
}
