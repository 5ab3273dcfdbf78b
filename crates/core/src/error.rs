//! Unified error types for deltaproxy.
//!
//! Three kinds are classified rejections that the client sees verbatim. The
//! remaining two are faults on the upstream or inside the proxy.

/// Unified error types for the deltaproxy server.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Inbound request used a method other than GET.
    #[error("INVALID_METHOD: {0}")]
    InvalidMethod(String),

    /// Upstream response did not declare a JSON media type.
    #[error("NOT_JSON: {0}")]
    NotJson(String),

    /// Upstream response carried no entity tag.
    #[error("MISSING_VERSION_TAG: {0}")]
    MissingVersionTag(String),

    /// Upstream fetch failed (network, DNS, timeout, oversized body).
    #[error("TRANSPORT_ERROR: {0}")]
    Transport(String),

    /// Any other fault while processing a request.
    #[error("INTERNAL_ERROR: {0}")]
    Internal(String),
}

/// Discriminant of an [`Error`], without its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidMethod,
    NotJson,
    MissingVersionTag,
    Transport,
    Internal,
}

impl ErrorKind {
    /// Stable code used as the display prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidMethod => "INVALID_METHOD",
            ErrorKind::NotJson => "NOT_JSON",
            ErrorKind::MissingVersionTag => "MISSING_VERSION_TAG",
            ErrorKind::Transport => "TRANSPORT_ERROR",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }
}

impl Error {
    pub fn invalid_method() -> Self {
        Error::InvalidMethod("Only GET requests are supported".into())
    }

    pub fn not_json() -> Self {
        Error::NotJson("Requested URL was not JSON".into())
    }

    pub fn missing_version_tag() -> Self {
        Error::MissingVersionTag("Underlying request does not provide an ETag header".into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidMethod(_) => ErrorKind::InvalidMethod,
            Error::NotJson(_) => ErrorKind::NotJson,
            Error::MissingVersionTag(_) => ErrorKind::MissingVersionTag,
            Error::Transport(_) => ErrorKind::Transport,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The message without its code prefix.
    pub fn message(&self) -> &str {
        match self {
            Error::InvalidMethod(msg)
            | Error::NotJson(msg)
            | Error::MissingVersionTag(msg)
            | Error::Transport(msg)
            | Error::Internal(msg) => msg,
        }
    }

    /// Whether this is a classified rejection reported to the client as-is.
    pub fn is_client_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidMethod | ErrorKind::NotJson | ErrorKind::MissingVersionTag)
    }

    /// HTTP status code this error is surfaced with.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidMethod | ErrorKind::NotJson | ErrorKind::MissingVersionTag => 400,
            ErrorKind::Transport => 502,
            ErrorKind::Internal => 500,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal(format!("upstream body is not valid JSON: {err}"))
    }
}
