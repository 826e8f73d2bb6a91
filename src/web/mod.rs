//! Web server module.

mod handlers;

pub use handlers::*;

use crate::config::ServerConfig;
use crate::db::Store;
use crate::error::Error;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

const API_KEY_HEADER: &str = "X-API-Key";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<Store>,
}

/// Require the shared-secret header on every request that passes through.
async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if presented != Some(state.config.api_key.as_str()) {
        return ApiError(Error::Unauthorized).into_response();
    }

    next.run(req).await
}

/// Build the router with all routes.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

    let authed = Router::new()
        .route("/status", post(handlers::handle_create_status))
        .route("/status/summary", get(handlers::handle_summary))
        .route("/status/at-risk", get(handlers::handle_at_risk))
        .route("/status/{device_id}", get(handlers::handle_latest_status))
        .route(
            "/status/{device_id}/history",
            get(handlers::handle_history),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .merge(authed)
        // Health and metrics stay reachable without a key
        .route("/health", get(handlers::handle_health))
        .route("/metrics", get(handlers::handle_metrics))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB
        .with_state(state)
}

/// Web server for FleetPulse.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a new server with the given dependencies.
    pub fn new(config: ServerConfig, store: Arc<Store>) -> Self {
        Self {
            state: AppState { config, store },
        }
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let app = router(self.state.clone());

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
