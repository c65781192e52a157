//! Health check endpoint for the ticket-booking service.

use super::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use cinema_web::HealthReport;

/// Service name reported by `/health`
pub const SERVICE_NAME: &str = "tickets";

/// Health check endpoint.
///
/// Pings the seat ledger. Returns 200 when it answers within the ledger
/// timeout, 503 otherwise.
///
/// # Example
///
/// ```bash
/// curl http://localhost:5000/health
/// # {"status":"healthy","service":"tickets","database":"connected","timestamp":"..."}
/// ```
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let timeout = state.coordinator.ledger_timeout();
    let database_ok = match tokio::time::timeout(timeout, state.ledger.ping()).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Database ping failed");
            false
        }
        Err(_) => {
            tracing::warn!(?timeout, "Database ping timed out");
            false
        }
    };

    HealthReport::from_ping(SERVICE_NAME, database_ok, state.clock.now()).into_response_parts()
}
