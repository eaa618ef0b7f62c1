pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::retention::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/retention/risk", post(handlers::handle_risk))
        .route("/api/v1/retention/bundle", post(handlers::handle_bundle))
        .route("/api/v1/retention/analyze", post(handlers::handle_analyze))
        .with_state(state)
}
