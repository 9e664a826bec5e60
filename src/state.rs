use std::sync::Arc;

use crate::services::auth::TokenIssuer;
use crate::services::dpop::DpopHandler;

#[derive(Clone, Debug)]
pub struct AppState {
    pub issuer: Arc<TokenIssuer>,
    pub dpop: Arc<DpopHandler>,
    // Used to rebuild the absolute request URL (htu) behind proxies.
    pub public_base_url: Option<String>,
    // Include error_debug in error responses (development only).
    pub expose_debug: bool,
}

impl AppState {
    pub fn new(issuer: Arc<TokenIssuer>, dpop: Arc<DpopHandler>) -> Self {
        Self {
            issuer,
            dpop,
            public_base_url: None,
            expose_debug: false,
        }
    }

    pub fn with_public_base_url(mut self, base: Option<String>) -> Self {
        self.public_base_url = base;
        self
    }

    pub fn with_expose_debug(mut self, expose: bool) -> Self {
        self.expose_debug = expose;
        self
    }
}
