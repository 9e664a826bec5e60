use axum::{Router, routing::get};
use std::{panic, process, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::error::AppError;
use crate::middleware;
use crate::services::auth::{JwtIssuer, TokenIssuer};
use crate::services::dpop::{DefaultProofVerifier, DpopHandler};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,dpop_binding=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Surface panics via tracing so they don't get lost when stderr is hidden.
        tracing::error!(?info, "panic");

        // Development: crash the whole process so we notice immediately.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<(), AppError> {
    init_tracing();
    let config = Config::from_env().map_err(|e| {
        tracing::error!(error = %e, "failed to load configuration");
        AppError::from(e)
    })?;

    let abort_on_panic = !config.app_env.is_production();
    init_panic_hook(abort_on_panic);

    tracing::info!(
        dpop_required = config.dpop_policy.mandatory,
        dpop_bind_http_target = config.dpop_policy.bind_http_target,
        "starting token endpoint in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, addr = %config.addr, "failed to bind listener");
            AppError::Internal
        })?;
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!(error = %e, "server error");
        AppError::Internal
    })?;

    Ok(())
}

/// Build process-level services and inject them into the shared application state.
pub fn build_state(config: &Config) -> Result<AppState, AppError> {
    // JwtIssuer signs access tokens using the AS private key.
    let jwt = JwtIssuer::new(
        &config.access_jwt_private_key_pem,
        config.issuer.clone(),
        config.audience.clone(),
        config.access_token_ttl_seconds,
    )?;
    let issuer = Arc::new(TokenIssuer::new(jwt));

    let verifier = DefaultProofVerifier::new(config.dpop_verifier);
    let options = verifier.options();
    let dpop = Arc::new(DpopHandler::new(config.dpop_policy, Arc::new(verifier)));

    tracing::debug!(
        iat_leeway_seconds = options.iat_leeway_seconds,
        max_age_seconds = ?options.max_age_seconds,
        "DPoP verifier configured"
    );
    if dpop.policy().bind_http_target && config.public_base_url.is_none() {
        // Expected htu then comes from Host / X-Forwarded-* sent by the client.
        tracing::warn!(
            "DPOP_BIND_HTTP_TARGET is enabled without PUBLIC_BASE_URL; htu is derived from request headers"
        );
    }

    Ok(AppState::new(issuer, dpop)
        .with_public_base_url(config.public_base_url.clone())
        .with_expose_debug(!config.app_env.is_production()))
}

pub fn build_router(state: AppState) -> Router {
    async fn health() -> &'static str {
        "ok"
    }

    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state);

    middleware::http::apply(router)
}
