use axum::Json;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use tracing::{info, warn};

use crate::api::v1::dto::{token_request::TokenRequestForm, token_response::TokenResponse};
use crate::api::v1::extractors::DpopExtractor;
use crate::error::AppError;
use crate::services::oauth::{Arguments, TokenRequest};
use crate::state::AppState;

const CLIENT_CREDENTIALS: &str = "client_credentials";

pub async fn token(
    State(state): State<AppState>,
    DpopExtractor(dpop): DpopExtractor,
    form: Result<Form<TokenRequestForm>, FormRejection>,
) -> Result<impl IntoResponse, AppError> {
    let hide_debug = |e: AppError| {
        if state.expose_debug {
            e
        } else {
            e.without_debug()
        }
    };

    let Form(form) = form.map_err(|e| {
        warn!(error = %e, "unreadable token request body");
        AppError::invalid_request("The token request body could not be parsed.")
    })?;

    let mut request = TokenRequest::new();
    if let Some(proof) = dpop.proof {
        request.set_dpop_proof(proof);
    }
    request.set_http_target(dpop.target);
    request.set_requested_scope(Arguments::from_space_delimited(
        form.scope.as_deref().unwrap_or_default(),
    ));

    let grant_type = form
        .grant_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::invalid_request("The grant_type parameter is missing."))?;
    request.append_grant_type(grant_type);

    handle_grant(&mut request, grant_type, &form)?;

    // Proof check runs after the grant handler, before issuance.
    state
        .dpop
        .handle_token_endpoint_request(&mut request)
        .map_err(|e| hide_debug(e.into()))?;

    // Binding is handed to issuance explicitly.
    let issued = state.issuer.issue_access_token(
        request.client_id(),
        request.client_id(),
        request.requested_scope(),
        request.binding(),
    )?;

    info!(
        request_id = %request.id(),
        client_id = %request.client_id(),
        requested_at = %request.requested_at(),
        binding = %issued.binding,
        "access token issued"
    );

    let scope = request.requested_scope();
    let body = TokenResponse {
        access_token: issued.access_token,
        token_type: issued.binding.token_type(),
        expires_in: issued.expires_in,
        scope: (!scope.is_empty()).then(|| scope.to_space_delimited()),
    };

    Ok((
        StatusCode::OK,
        [(header::CACHE_CONTROL, "no-store"), (header::PRAGMA, "no-cache")],
        Json(body),
    ))
}

fn handle_grant(
    request: &mut TokenRequest,
    grant_type: &str,
    form: &TokenRequestForm,
) -> Result<(), AppError> {
    match grant_type {
        CLIENT_CREDENTIALS => {
            let client_id = form
                .client_id
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| AppError::invalid_request("The client_id parameter is missing."))?;
            request.set_client_id(client_id);
            request.mark_grant_type_handled(CLIENT_CREDENTIALS);
            Ok(())
        }
        other => {
            warn!(grant_type = %other, "unsupported grant type");
            Err(AppError::UnsupportedGrantType(other.to_string()))
        }
    }
}
