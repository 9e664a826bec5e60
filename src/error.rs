/*
 * Responsibility
 * - HTTP-facing error type of the token endpoint
 * - IntoResponse: OAuth2 error body (RFC 6749 section 5.2) + status code
 * - Conversion from DPoP binding / issuance failures
 */
use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::services::auth::IssuerError;
use crate::services::dpop::BindingError;

pub const INVALID_PROOF_HINT: &str = "The DPoP proof JWT is invalid.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid_request: {hint}")]
    InvalidRequest {
        hint: String,
        debug: Option<String>,
    },

    #[error("unsupported_grant_type: {0}")]
    UnsupportedGrantType(String),

    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn invalid_request(hint: impl Into<String>) -> Self {
        Self::InvalidRequest {
            hint: hint.into(),
            debug: None,
        }
    }

    /// OAuth2 `error` code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest { .. } => "invalid_request",
            AppError::UnsupportedGrantType(_) => "unsupported_grant_type",
            AppError::Internal => "server_error",
        }
    }

    /// Drop debug detail (production responses).
    pub fn without_debug(self) -> Self {
        match self {
            AppError::InvalidRequest { hint, .. } => AppError::InvalidRequest { hint, debug: None },
            other => other,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
    error_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_debug: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, body) = match self {
            AppError::InvalidRequest { hint, debug } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: code,
                    error_description: format!(
                        "The request is missing a required parameter, includes an invalid parameter value, includes a parameter more than once, or is otherwise malformed. {}",
                        hint
                    ),
                    error_hint: Some(hint),
                    error_debug: debug,
                },
            ),
            AppError::UnsupportedGrantType(grant_type) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: code,
                    error_description: format!(
                        "The authorization grant type is not supported by the authorization server. Grant type '{}' is not supported.",
                        grant_type
                    ),
                    error_hint: None,
                    error_debug: None,
                },
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: code,
                    error_description: "The authorization server encountered an unexpected condition that prevented it from fulfilling the request.".to_string(),
                    error_hint: None,
                    error_debug: None,
                },
            ),
        };

        (
            status,
            [(header::CACHE_CONTROL, "no-store"), (header::PRAGMA, "no-cache")],
            Json(body),
        )
            .into_response()
    }
}

impl From<BindingError> for AppError {
    fn from(e: BindingError) -> Self {
        match e {
            BindingError::PolicyViolation { hint } => AppError::invalid_request(hint),
            // An invalid proof is a client error.
            BindingError::Proof(proof) => AppError::InvalidRequest {
                hint: INVALID_PROOF_HINT.to_string(),
                debug: Some(proof.to_string()),
            },
            BindingError::AlreadyBound => {
                error!("token request bound twice");
                AppError::Internal
            }
        }
    }
}

impl From<IssuerError> for AppError {
    fn from(_: IssuerError) -> Self {
        AppError::Internal
    }
}
