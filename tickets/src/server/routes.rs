//! Router configuration for the ticket-booking service.

use super::health::health_check;
use super::state::AppState;
use crate::api::tickets;
use axum::{
    Router,
    routing::{get, post},
};
use cinema_web::request_id_layer;
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// | Method | Path                 | Handler |
/// |--------|----------------------|---------|
/// | POST   | `/buy-ticket`        | [`tickets::buy_ticket`] |
/// | GET    | `/tickets`           | [`tickets::list_tickets`] |
/// | GET    | `/tickets/user/:id`  | [`tickets::list_user_tickets`] |
/// | GET    | `/health`            | [`health_check`] |
///
/// Every request passes through the request-id layer (outermost) and
/// `TraceLayer`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/buy-ticket", post(tickets::buy_ticket))
        .route("/tickets", get(tickets::list_tickets))
        .route("/tickets/user/:id", get(tickets::list_user_tickets))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
