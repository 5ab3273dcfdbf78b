//! Mapping from proxy errors to HTTP responses.
//!
//! Classified rejections go back as `400` with their message as plain text.
//! Transport and internal faults are logged and answered with a generic body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use deltaproxy_core::{Error, ErrorKind};

/// Error returned by request handlers.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match err.kind() {
            ErrorKind::InvalidMethod | ErrorKind::NotJson | ErrorKind::MissingVersionTag => {
                (status, err.message().to_string()).into_response()
            }
            ErrorKind::Transport => {
                tracing::warn!(error = %err, "upstream fetch failed");
                (status, "Bad Gateway").into_response()
            }
            ErrorKind::Internal => {
                tracing::error!(error = %err, "unhandled error while proxying");
                (status, "Internal Server Error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_client_error_carries_message() {
        let response = ApiError(Error::missing_version_tag()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Underlying request does not provide an ETag header");
    }

    #[tokio::test]
    async fn test_transport_error_is_bad_gateway() {
        let response = ApiError(Error::Transport("dns failure for internal-host".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(!body_text(response).await.contains("internal-host"));
    }

    #[tokio::test]
    async fn test_internal_error_is_masked() {
        let response = ApiError(Error::Internal("secret detail".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Internal Server Error");
    }
}
