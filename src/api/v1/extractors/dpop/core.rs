use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::{HeaderMap, Uri, header, request::Parts};

use crate::error::AppError;
use crate::services::dpop::DPOP_HEADER;
use crate::services::oauth::HttpTarget;
use crate::state::AppState;

use super::DpopRequest;

/// Extracts the DPoP header and the request target for the token handler.
///
/// Rejects requests carrying the header more than once or with a value that is
/// not visible ASCII.
pub struct DpopExtractor(pub DpopRequest);

impl FromRequestParts<AppState> for DpopExtractor
where
    AppState: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let proof = proof_from_headers(&parts.headers)?;

        // Nested routers strip the prefix from `parts.uri`.
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|OriginalUri(uri)| uri.clone())
            .unwrap_or_else(|| parts.uri.clone());

        let target = HttpTarget {
            method: parts.method.as_str().to_string(),
            url: build_expected_htu(&parts.headers, &uri, state.public_base_url.as_deref()),
        };

        Ok(DpopExtractor(DpopRequest { proof, target }))
    }
}

pub(crate) fn proof_from_headers(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    let mut values = headers.get_all(DPOP_HEADER).iter();

    let Some(value) = values.next() else {
        return Ok(None);
    };
    if values.next().is_some() {
        return Err(AppError::invalid_request(
            "The request includes the DPoP header more than once.",
        ));
    }

    let proof = value.to_str().map_err(|_| {
        tracing::warn!("invalid DPoP header encoding");
        AppError::invalid_request("The DPoP header contains invalid characters.")
    })?;

    let proof = proof.trim();
    Ok((!proof.is_empty()).then(|| proof.to_string()))
}

fn build_expected_htu(headers: &HeaderMap, uri: &Uri, public_base_url: Option<&str>) -> String {
    if let Some(base) = public_base_url {
        if let Ok(url) = build_htu_from_base(base, uri) {
            return url;
        }
        // Misconfigured base URL; fall back to forwarded headers.
    }
    build_htu_from_forwarded(headers, uri)
}

fn build_htu_from_base(base: &str, uri: &Uri) -> Result<String, url::ParseError> {
    // `base` should be like: https://as.example.com
    let mut url = url::Url::parse(base)?;

    url.set_path(uri.path());
    url.set_query(uri.query());

    Ok(url.to_string())
}

fn build_htu_from_forwarded(headers: &HeaderMap, uri: &Uri) -> String {
    // Prefer proxy headers when present.
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");

    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(header::HOST))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    format!("{}://{}{}", scheme, host, path_and_query)
}
