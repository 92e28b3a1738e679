use std::sync::Arc;

use {
    parley_providers::{ImageProvider, TextProvider},
    parley_sessions::SessionStore,
};

/// Shared handler state, built once in `start_gateway` and injected into
/// every handler via axum `State`. Lives until process exit.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub text: Arc<dyn TextProvider>,
    /// Optional: image passthrough degrades to a placeholder without it.
    pub image: Option<Arc<dyn ImageProvider>>,
}

impl AppState {
    pub fn new(
        sessions: Arc<SessionStore>,
        text: Arc<dyn TextProvider>,
        image: Option<Arc<dyn ImageProvider>>,
    ) -> Self {
        Self {
            sessions,
            text,
            image,
        }
    }
}
