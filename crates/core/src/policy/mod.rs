//! Request/response policy for the proxy.
//!
//! [`ProxyPolicy::handle`] drives one request through validation, prior
//! snapshot lookup, the upstream fetch, response validation, storing the new
//! snapshot, and choosing between a full reset and a patch list.
//!
//! Outcomes:
//! - `Reset`: no usable prior snapshot, the full document is returned.
//! - `Patched`: the diff from the prior snapshot, possibly empty.
//! - Rejected: an [`Error`]; nothing is stored for a response that failed validation.

pub mod upstream;

use std::sync::Arc;

use http::header::{self, HeaderName};
use http::{HeaderMap, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diff::{PatchOp, diff};
use crate::store::VersionStore;
use crate::Error;

pub use upstream::{Upstream, UpstreamResponse};

/// Request header naming the version tag the client already holds.
pub const KNOWN_VERSION_HEADER: &str = "changes-since-etag";

/// Response header carrying the upstream entity tag of the returned version.
pub const SOURCE_VERSION_HEADER: &str = "etag-from-source";

/// Upstream headers copied onto the outbound response.
///
/// Length and encoding headers are never forwarded; the body is rewritten.
pub const FORWARDED_HEADERS: [HeaderName; 6] = [
    header::AGE,
    header::CACHE_CONTROL,
    header::ACCESS_CONTROL_ALLOW_ORIGIN,
    header::DATE,
    header::EXPIRES,
    header::LAST_MODIFIED,
];

const JSON_MEDIA_TYPES: [&str; 2] = ["application/json", "text/json"];

/// An inbound request as seen by the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    pub method: Method,
    /// Path and query exactly as received.
    pub resource: String,
    pub known_version: Option<String>,
}

impl ProxyRequest {
    pub fn new(method: Method, resource: impl Into<String>) -> Self {
        Self { method, resource: resource.into(), known_version: None }
    }

    pub fn with_known_version(mut self, tag: impl Into<String>) -> Self {
        self.known_version = Some(tag.into()).filter(|t: &String| !t.is_empty());
        self
    }

    /// Build a request from its HTTP parts, reading the known version from
    /// the `changes-since-etag` header. Empty or non-ASCII values count as absent.
    pub fn from_parts(method: Method, resource: impl Into<String>, headers: &HeaderMap) -> Self {
        let known_version = headers
            .get(KNOWN_VERSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Self { method, resource: resource.into(), known_version }
    }
}

/// Outbound body: `{"responseType": "reset"|"patches", "response": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "responseType", content = "response", rename_all = "lowercase")]
pub enum ProxyBody {
    Reset(Value),
    Patches(Vec<PatchOp>),
}

/// Terminal state of a request that was not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Reset,
    Patched,
}

/// A successful proxy response, ready for the HTTP layer to write out.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    /// Mirrors the upstream status.
    pub status: StatusCode,
    pub body: ProxyBody,
    /// Upstream entity tag of the version in `body`.
    pub version_tag: String,
    /// Allow-listed upstream headers.
    pub forwarded: HeaderMap,
}

impl ProxyResponse {
    pub fn outcome(&self) -> Outcome {
        match self.body {
            ProxyBody::Reset(_) => Outcome::Reset,
            ProxyBody::Patches(_) => Outcome::Patched,
        }
    }
}

/// Orchestrates the version store, the upstream and the diff engine.
pub struct ProxyPolicy {
    store: Arc<VersionStore>,
    upstream: Arc<dyn Upstream>,
}

impl ProxyPolicy {
    pub fn new(store: Arc<VersionStore>, upstream: Arc<dyn Upstream>) -> Self {
        Self { store, upstream }
    }

    /// Handle one request end to end.
    ///
    /// # Errors
    ///
    /// - `InvalidMethod` for anything but GET, before any other step runs
    /// - `Transport` if the upstream fetch fails
    /// - `NotJson` / `MissingVersionTag` if the upstream response fails validation
    /// - `Internal` if a validated body does not parse as JSON
    pub async fn handle(&self, request: &ProxyRequest) -> Result<ProxyResponse, Error> {
        validate_request(request)?;

        let resource = request.resource.as_str();
        let prior = request
            .known_version
            .as_deref()
            .and_then(|tag| self.store.get(resource, tag));
        tracing::debug!(
            resource,
            known_version = request.known_version.as_deref(),
            prior_found = prior.is_some(),
            "resolved prior snapshot"
        );

        let upstream = self.upstream.fetch(resource).await?;
        let tag = validate_response(&upstream)?.to_string();
        let document: Value = serde_json::from_slice(&upstream.body)?;

        self.store.put(resource, &tag, document.clone());

        let body = match prior {
            None => ProxyBody::Reset(document),
            Some(prior) => ProxyBody::Patches(diff(&prior, &document)),
        };

        Ok(ProxyResponse { status: upstream.status, body, version_tag: tag, forwarded: forward_headers(&upstream.headers) })
    }
}

/// Only GET is accepted.
pub fn validate_request(request: &ProxyRequest) -> Result<(), Error> {
    if request.method != Method::GET {
        return Err(Error::invalid_method());
    }
    Ok(())
}

/// Check the media type and entity tag, returning the tag.
///
/// The upstream status is not inspected.
pub fn validate_response(response: &UpstreamResponse) -> Result<&str, Error> {
    let is_json = response
        .content_type()
        .is_some_and(|ct| JSON_MEDIA_TYPES.iter().any(|json| ct.contains(json)));
    if !is_json {
        return Err(Error::not_json());
    }

    response.etag().ok_or_else(Error::missing_version_tag)
}

/// Copy the allow-listed headers, keeping repeated values.
pub fn forward_headers(source: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::new();
    for name in &FORWARDED_HEADERS {
        for value in source.get_all(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}
