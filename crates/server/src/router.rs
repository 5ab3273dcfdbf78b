use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router: every method and path goes to the proxy handler.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .fallback(handler::proxy_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{HeaderMap, HeaderValue, Request, StatusCode, header};
    use axum::response::Response;
    use deltaproxy_core::{Error, ProxyPolicy, Upstream, UpstreamResponse, VersionStore};
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tower::util::ServiceExt;

    /// Replays queued origin responses in order and records requested resources.
    #[derive(Default)]
    struct ScriptedOrigin {
        responses: Mutex<VecDeque<Result<UpstreamResponse, Error>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedOrigin {
        fn reply(&self, response: Result<UpstreamResponse, Error>) {
            self.responses.lock().unwrap().push_back(response);
        }

        fn reply_json(&self, body: Value, extra: &[(&'static str, &'static str)]) {
            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
            for (name, value) in extra {
                headers.insert(*name, HeaderValue::from_static(*value));
            }
            self.reply(Ok(UpstreamResponse::ok(headers, body.to_string())));
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Upstream for ScriptedOrigin {
        async fn fetch(&self, resource: &str) -> Result<UpstreamResponse, Error> {
            self.calls.lock().unwrap().push(resource.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Transport("no scripted response".into())))
        }
    }

    fn setup() -> (Router, Arc<ScriptedOrigin>) {
        let origin = Arc::new(ScriptedOrigin::default());
        let policy = ProxyPolicy::new(Arc::new(VersionStore::new()), origin.clone());
        let app = build_router(AppState { policy: Arc::new(policy) });
        (app, origin)
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn get_since(uri: &str, tag: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("changes-since-etag", tag)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn fails_without_etag() {
        let (app, origin) = setup();
        origin.reply_json(json!({}), &[]);

        let response = send(&app, get("/test")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Underlying request does not provide an ETag header");
    }

    #[tokio::test]
    async fn forwards_allow_listed_headers() {
        let (app, origin) = setup();
        origin.reply_json(
            json!({}),
            &[("cache-control", "HEADER_VALUE"), ("etag", "ETAG_VALUE"), ("x-internal", "secret")],
        );

        let response = send(&app, get("/test")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["cache-control"], "HEADER_VALUE");
        assert_eq!(response.headers()["etag-from-source"], "ETAG_VALUE");
        assert!(response.headers().get("x-internal").is_none());
        assert!(response.headers().get("etag").is_none());
    }

    #[tokio::test]
    async fn first_contact_resets_then_patches() {
        let (app, origin) = setup();
        origin.reply_json(json!({"one": "two"}), &[("etag", "a")]);
        origin.reply_json(json!({"one": "two", "three": "four"}), &[("etag", "b")]);

        let response = send(&app, get("/test")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["etag-from-source"], "a");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(body_json(response).await, json!({"responseType": "reset", "response": {"one": "two"}}));

        let response = send(&app, get_since("/test", "a")).await;
        assert_eq!(response.headers()["etag-from-source"], "b");
        assert_eq!(
            body_json(response).await,
            json!({"responseType": "patches", "response": [{"op": "add", "path": "/three", "value": "four"}]})
        );
        assert_eq!(origin.calls(), vec!["/test", "/test"]);
    }

    #[tokio::test]
    async fn unknown_known_version_resets() {
        let (app, origin) = setup();
        origin.reply_json(json!({"one": "two"}), &[("etag", "b")]);

        let response = send(&app, get_since("/test", "never-stored")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["responseType"], "reset");
    }

    #[tokio::test]
    async fn query_string_is_part_of_resource() {
        let (app, origin) = setup();
        origin.reply_json(json!([1]), &[("etag", "a")]);
        origin.reply_json(json!([1, 2]), &[("etag", "b")]);

        send(&app, get("/list?page=1")).await;
        let response = send(&app, get_since("/list?page=2", "a")).await;

        assert_eq!(body_json(response).await["responseType"], "reset");
        assert_eq!(origin.calls(), vec!["/list?page=1", "/list?page=2"]);
    }

    #[tokio::test]
    async fn rejects_non_get_without_fetching() {
        let (app, origin) = setup();
        let request = Request::builder()
            .method("POST")
            .uri("/test")
            .body(Body::from("{}"))
            .unwrap();

        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Only GET requests are supported");
        assert!(origin.calls().is_empty());
    }

    #[tokio::test]
    async fn rejects_non_json_origin() {
        let (app, origin) = setup();
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
        headers.insert(header::ETAG, HeaderValue::from_static("a"));
        origin.reply(Ok(UpstreamResponse::ok(headers, "<p>hi</p>")));

        let response = send(&app, get("/test")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Requested URL was not JSON");
    }

    #[tokio::test]
    async fn transport_failure_is_bad_gateway() {
        let (app, origin) = setup();
        origin.reply(Err(Error::Transport("connection reset".into())));

        let response = send(&app, get("/test")).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn malformed_origin_body_is_masked() {
        let (app, origin) = setup();
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(header::ETAG, HeaderValue::from_static("a"));
        origin.reply(Ok(UpstreamResponse::ok(headers, "{\"half\":")));

        let response = send(&app, get("/test")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Internal Server Error");
    }
}
