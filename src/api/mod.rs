use std::sync::Arc;

use axum::{routing::post, Router};

use crate::gemini::GeminiService;

pub mod error;
pub mod handlers;
pub mod types;

use handlers::{method_not_allowed, proxy};

/// Shared, read-only per-process state. `gemini` is `None` when the API key
/// is missing from the environment; requests then fail individually instead
/// of taking the process down.
#[derive(Clone)]
pub struct AppState {
    pub gemini: Option<Arc<GeminiService>>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/proxy", post(proxy).fallback(method_not_allowed))
}
