use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use chess_coach_core::{ApiClient, Config, Controller};

mod board;
mod error;
mod routes;

pub struct AppState {
    pub coach: Controller<ApiClient>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();

    let client = match ApiClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to create HTTP client: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Using backend at {}", client.base_url());

    let state = Arc::new(AppState {
        coach: Controller::new(client, &config),
    });
    state.coach.refresh_history().await;

    let app = Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .route("/export.pgn", get(routes::export_pgn))
        .route("/api/state", get(routes::api_state))
        .route("/api/move", post(routes::play::api_move))
        .route("/move", post(routes::play::form_move))
        .route("/new", post(routes::play::new_game))
        .route("/color", post(routes::play::set_color))
        .route("/resign", post(routes::play::resign))
        .route("/analyze", post(routes::coach::analyze))
        .route("/review/:step", post(routes::coach::review_step))
        .route("/review/goto/:index", post(routes::coach::review_goto))
        .route("/chat", post(routes::coach::chat))
        .route("/history/refresh", post(routes::coach::refresh_history))
        .route("/history/:id/load", post(routes::coach::load_record))
        .nest_service("/static", ServeDir::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static")))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", config.bind_addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server running at http://{}", config.bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
