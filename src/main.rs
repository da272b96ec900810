use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod gemini;
mod prompts;

use api::AppState;
use gemini::GeminiService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // -----------------------------
    // Logging
    // -----------------------------
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("🚀 Starting SWOT relay server...");

    // -----------------------------
    // Shared state / Dependencies
    // -----------------------------
    let gemini = GeminiService::from_env().map(Arc::new);
    if gemini.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; /api/proxy will answer 500 until it is");
    }

    let state = AppState { gemini };

    // -----------------------------
    // Router
    // -----------------------------
    let app = api::router()
        // CORS for the frontend
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state);

    let addr = "0.0.0.0:3000";

    println!("🌐 HTTP listening on http://{addr}");
    println!("🛠 Proxy endpoint at http://{addr}/api/proxy");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
