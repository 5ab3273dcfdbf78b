//! Origin canonicalization and resource resolution.

use url::Url;

/// Error type for URL handling failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("resource {resource:?} resolves outside the origin ({resolved})")]
    CrossOrigin { resource: String, resolved: String },
}

/// Canonicalize an origin base address.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
pub fn canonicalize_origin(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let mut parsed = Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let host = host.to_lowercase();
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Resolve a request path (with query) against the origin.
///
/// Standard reference resolution applies, so an absolute path replaces the
/// origin's own path. A resource that would leave the origin's scheme, host
/// or port (e.g. `//other.host/x`) is refused.
pub fn resolve(origin: &Url, resource: &str) -> Result<Url, UrlError> {
    let resolved = origin.join(resource).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    if resolved.origin() != origin.origin() {
        return Err(UrlError::CrossOrigin { resource: resource.to_string(), resolved: resolved.to_string() });
    }

    Ok(resolved)
}
