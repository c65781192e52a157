//! Ticket API endpoints.
//!
//! - POST /buy-ticket - Book one seat for a showing
//! - GET /tickets - All tickets, newest first
//! - GET /tickets/user/:id - One user's tickets, newest first

use crate::server::state::AppState;
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use cinema_core::ledger::{LedgerError, LedgerFuture};
use cinema_core::types::{BookingRequest, Ticket, UserId};
use cinema_web::{AppError, RequestId, WebResult};
use serde::{Deserialize, Serialize};

/// Response after a successful purchase.
#[derive(Debug, Serialize, Deserialize)]
pub struct PurchaseResponse {
    /// Message for the user
    pub message: String,
    /// The reserved ticket
    pub ticket: Ticket,
}

/// Book a seat.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:5000/buy-ticket \
///   -H "Content-Type: application/json" \
///   -d '{"user_id": 1, "showtime_id": 10, "seat": "A1"}'
/// ```
///
/// Response (201 Created):
/// ```json
/// {
///   "message": "Ticket purchased",
///   "ticket": {
///     "id": 1,
///     "user_id": 1,
///     "showtime_id": 10,
///     "seat": "A1",
///     "status": "reserved",
///     "price": 12.5,
///     "created_at": "2025-01-01T00:00:00Z"
///   }
/// }
/// ```
///
/// # Errors
///
/// - 400 Bad Request: body is not valid JSON or a field is missing
/// - 404 Not Found: unknown user or showtime
/// - 409 Conflict: seat already reserved
/// - 503 Service Unavailable: a collaborator did not answer
/// - 500 Internal Server Error: storage failure
pub async fn buy_ticket(
    State(state): State<AppState>,
    request_id: RequestId,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> WebResult<(StatusCode, Json<PurchaseResponse>)> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(%request_id, error = %rejection.body_text(), "Malformed booking body");
        AppError::bad_request(rejection.body_text())
    })?;

    let ticket = state.coordinator.book_seat(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(PurchaseResponse {
            message: "Ticket purchased".to_string(),
            ticket,
        }),
    ))
}

/// List all tickets, newest first.
///
/// # Errors
///
/// - 503 Service Unavailable: the ledger did not answer in time
/// - 500 Internal Server Error: the ledger cannot be read
pub async fn list_tickets(State(state): State<AppState>) -> WebResult<Json<Vec<Ticket>>> {
    let tickets = read_tickets(&state, state.ledger.list_all()).await?;
    Ok(Json(tickets))
}

/// List one user's tickets, newest first.
///
/// # Errors
///
/// - 400 Bad Request: `id` is not an integer
/// - 503 Service Unavailable: the ledger did not answer in time
/// - 500 Internal Server Error: the ledger cannot be read
pub async fn list_user_tickets(
    State(state): State<AppState>,
    user_id: Result<Path<i64>, PathRejection>,
) -> WebResult<Json<Vec<Ticket>>> {
    let Path(user_id) = user_id.map_err(|_| AppError::bad_request("Invalid user ID"))?;
    let user_id = UserId::new(user_id);

    let tickets = read_tickets(&state, state.ledger.list_by_user(user_id)).await?;

    tracing::debug!(%user_id, count = tickets.len(), "Listed user tickets");
    Ok(Json(tickets))
}

/// Await a ledger read, bounded by the coordinator's ledger timeout.
async fn read_tickets(
    state: &AppState,
    read: LedgerFuture<'_, Vec<Ticket>>,
) -> WebResult<Vec<Ticket>> {
    let timeout = state.coordinator.ledger_timeout();
    let result = tokio::time::timeout(timeout, read).await.unwrap_or_else(|_| {
        Err(LedgerError::Timeout(format!("no answer within {timeout:?}")))
    });

    result.map_err(|e| match e {
        LedgerError::Timeout(_) => {
            tracing::warn!(error = %e, "Ticket listing timed out");
            AppError::unavailable("The database service is unavailable")
                .with_source(anyhow::Error::new(e))
        }
        _ => AppError::internal("Failed to fetch tickets").with_source(anyhow::Error::new(e)),
    })
}
