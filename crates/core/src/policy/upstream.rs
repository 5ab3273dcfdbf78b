//! Seam between the policy and whatever fetches documents from the origin.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, StatusCode, header};

use crate::Error;

/// Fetches the current representation of a resource from the origin.
///
/// Implementations report network, DNS, timeout and body-read failures as
/// [`Error::Transport`]. They do not validate status, media type or tags.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Issue a single GET for `resource` (path and query) against the origin.
    async fn fetch(&self, resource: &str) -> Result<UpstreamResponse, Error>;
}

/// Raw response from the origin.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamResponse {
    /// A 200 response with the given headers and body.
    pub fn ok(headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self { status: StatusCode::OK, headers, body: body.into() }
    }

    /// Header value as a string, `None` if absent or not visible ASCII.
    pub fn header_str(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE)
    }

    /// Entity tag, `None` if absent or empty.
    pub fn etag(&self) -> Option<&str> {
        self.header_str(header::ETAG).filter(|tag| !tag.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_header_accessors() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(header::ETAG, HeaderValue::from_static("\"v1\""));
        let response = UpstreamResponse::ok(headers, "{}");

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.etag(), Some("\"v1\""));
    }

    #[test]
    fn test_empty_etag_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ETAG, HeaderValue::from_static(""));
        let response = UpstreamResponse::ok(headers, "{}");
        assert_eq!(response.etag(), None);
    }

    #[test]
    fn test_missing_headers() {
        let response = UpstreamResponse::ok(HeaderMap::new(), "");
        assert_eq!(response.content_type(), None);
        assert_eq!(response.etag(), None);
    }
}
