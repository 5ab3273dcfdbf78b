//! The single proxy handler.
//!
//! Every method and path lands here; the policy decides what is accepted.

use axum::Json;
use axum::extract::{OriginalUri, State};
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use deltaproxy_core::policy::SOURCE_VERSION_HEADER;
use deltaproxy_core::{Error, ProxyRequest};

use crate::error::ApiError;
use crate::state::AppState;

/// Proxy one request and write out the reset or patch body.
pub async fn proxy_handler(
    State(state): State<AppState>, method: Method, OriginalUri(uri): OriginalUri, headers: HeaderMap,
) -> Result<Response, ApiError> {
    let resource = uri.path_and_query().map_or("/", |pq| pq.as_str());
    let request = ProxyRequest::from_parts(method, resource, &headers);

    let proxied = state.policy.handle(&request).await?;
    tracing::debug!(resource, outcome = ?proxied.outcome(), version_tag = %proxied.version_tag, "proxied");

    let version_tag = HeaderValue::from_str(&proxied.version_tag)
        .map_err(|e| Error::Internal(format!("version tag is not a valid header value: {e}")))?;

    let mut response = (proxied.status, Json(proxied.body)).into_response();
    let response_headers = response.headers_mut();
    response_headers.extend(proxied.forwarded);
    response_headers.insert(SOURCE_VERSION_HEADER, version_tag);

    Ok(response)
}
