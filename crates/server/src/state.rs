use std::sync::Arc;

use deltaproxy_core::ProxyPolicy;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub policy: Arc<ProxyPolicy>,
}
