use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::dpop::error::BindingError;
use crate::services::oauth::arguments::Arguments;

/// How an issued access token is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingMode {
    /// Sender-constrained by a DPoP key fingerprint.
    Dpop,
    Bearer,
}

impl BindingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dpop => "dpop",
            Self::Bearer => "bearer",
        }
    }

    /// `token_type` value of the token response (RFC 6750 / RFC 9449).
    pub fn token_type(&self) -> &'static str {
        match self {
            Self::Dpop => "DPoP",
            Self::Bearer => "Bearer",
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, Self::Dpop)
    }
}

impl fmt::Display for BindingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Method and absolute URL a token request was received on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTarget {
    pub method: String,
    pub url: String,
}

/// One call to the token endpoint.
///
/// Created per request, filled by the grant and DPoP handlers, read once by
/// token issuance. The key fingerprint is write-once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRequest {
    id: Uuid,
    #[serde(rename = "requestedAt")]
    requested_at: DateTime<Utc>,
    #[serde(rename = "clientId", default)]
    client_id: String,
    #[serde(rename = "requestedScope", default)]
    requested_scope: Arguments,

    #[serde(rename = "grantTypes", default)]
    grant_types: Arguments,
    #[serde(rename = "handledGrantType", default)]
    handled_grant_types: Arguments,
    #[serde(rename = "jkt", default)]
    key_fingerprint: String,
    #[serde(rename = "dpopProofJWT", default)]
    dpop_proof: String,

    // Transport detail, never persisted.
    #[serde(skip)]
    http_target: Option<HttpTarget>,
}

impl Default for TokenRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenRequest {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            requested_at: Utc::now(),
            client_id: String::new(),
            requested_scope: Arguments::new(),
            grant_types: Arguments::new(),
            handled_grant_types: Arguments::new(),
            key_fingerprint: String::new(),
            dpop_proof: String::new(),
            http_target: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn set_client_id(&mut self, client_id: impl Into<String>) {
        self.client_id = client_id.into();
    }

    pub fn requested_scope(&self) -> &Arguments {
        &self.requested_scope
    }

    pub fn set_requested_scope(&mut self, scope: Arguments) {
        self.requested_scope = scope;
    }

    pub fn grant_types(&self) -> &Arguments {
        &self.grant_types
    }

    pub fn append_grant_type(&mut self, grant_type: impl Into<String>) {
        self.grant_types.append(grant_type);
    }

    pub fn handled_grant_types(&self) -> &Arguments {
        &self.handled_grant_types
    }

    pub fn mark_grant_type_handled(&mut self, grant_type: impl Into<String>) {
        self.handled_grant_types.append(grant_type);
    }

    /// Raw DPoP proof as received; empty when none was sent.
    pub fn dpop_proof(&self) -> &str {
        &self.dpop_proof
    }

    pub fn set_dpop_proof(&mut self, proof: impl Into<String>) {
        self.dpop_proof = proof.into();
    }

    pub fn http_target(&self) -> Option<&HttpTarget> {
        self.http_target.as_ref()
    }

    pub fn set_http_target(&mut self, target: HttpTarget) {
        self.http_target = Some(target);
    }

    /// JWK thumbprint of the verified DPoP key; empty until a proof is verified.
    pub fn key_fingerprint(&self) -> &str {
        &self.key_fingerprint
    }

    /// The fingerprint, if the request is bound.
    pub fn binding(&self) -> Option<&str> {
        if self.key_fingerprint.is_empty() {
            None
        } else {
            Some(&self.key_fingerprint)
        }
    }

    /// Bind the request to a key. Fails if it is already bound.
    pub fn bind_key(&mut self, fingerprint: impl Into<String>) -> Result<(), BindingError> {
        if !self.key_fingerprint.is_empty() {
            return Err(BindingError::AlreadyBound);
        }
        self.key_fingerprint = fingerprint.into();
        Ok(())
    }

    pub fn binding_mode(&self) -> BindingMode {
        if self.key_fingerprint.is_empty() {
            BindingMode::Bearer
        } else {
            BindingMode::Dpop
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_request_is_unbound() {
        let req = TokenRequest::new();

        assert_eq!(req.key_fingerprint(), "");
        assert_eq!(req.dpop_proof(), "");
        assert_eq!(req.binding(), None);
        assert_eq!(req.binding_mode(), BindingMode::Bearer);
        assert!(req.grant_types().is_empty());
        assert!(req.handled_grant_types().is_empty());
    }

    #[test]
    fn fingerprint_is_write_once() {
        let mut req = TokenRequest::new();

        req.bind_key("jkt-1").unwrap();
        assert_eq!(req.bind_key("jkt-2"), Err(BindingError::AlreadyBound));

        assert_eq!(req.key_fingerprint(), "jkt-1");
        assert_eq!(req.binding(), Some("jkt-1"));
        assert_eq!(req.binding_mode(), BindingMode::Dpop);
        assert_eq!(req.binding_mode().token_type(), "DPoP");
    }

    #[test]
    fn requested_and_handled_grant_types_are_separate() {
        let mut req = TokenRequest::new();
        req.append_grant_type("client_credentials");
        req.append_grant_type("client_credentials");

        assert_eq!(req.grant_types().len(), 1);
        assert!(req.handled_grant_types().is_empty());

        req.mark_grant_type_handled("client_credentials");
        assert!(req.handled_grant_types().exact_one("client_credentials"));
    }

    #[test]
    fn serializes_with_stable_field_names() {
        let mut req = TokenRequest::new();
        req.append_grant_type("client_credentials");
        req.mark_grant_type_handled("client_credentials");
        req.set_dpop_proof("a.b.c");
        req.bind_key("jkt").unwrap();
        req.set_http_target(HttpTarget {
            method: "POST".into(),
            url: "https://as.example/token".into(),
        });

        let value = serde_json::to_value(&req).unwrap();

        assert_eq!(value["grantTypes"], serde_json::json!(["client_credentials"]));
        assert_eq!(
            value["handledGrantType"],
            serde_json::json!(["client_credentials"])
        );
        assert_eq!(value["jkt"], "jkt");
        assert_eq!(value["dpopProofJWT"], "a.b.c");
        assert!(value.get("http_target").is_none());

        let back: TokenRequest = serde_json::from_value(value).unwrap();
        assert_eq!(back.key_fingerprint(), "jkt");
        assert_eq!(back.binding_mode(), BindingMode::Dpop);
        assert_eq!(back.http_target(), None);
        assert_eq!(back.requested_at(), req.requested_at());
    }

    #[test]
    fn binding_mode_strings() {
        assert_eq!(BindingMode::Dpop.to_string(), "dpop");
        assert_eq!(BindingMode::Bearer.to_string(), "bearer");
        assert_eq!(BindingMode::Bearer.token_type(), "Bearer");
        assert!(!BindingMode::Bearer.is_bound());
    }
}
