//! Seat ledger contract.
//!
//! The seat ledger is the single source of truth for seat occupancy. It stores
//! [`Ticket`] records and enforces, at the storage layer, that at most one
//! `reserved` ticket exists per (showtime, seat) pair.
//!
//! # Implementations
//!
//! - `PostgresSeatLedger` (in `cinema-postgres`): partial unique index on
//!   `(showtime_id, seat) WHERE status <> 'cancelled'`
//! - `InMemorySeatLedger` (in `cinema-testing`): single critical section per insert
//!
//! # Races
//!
//! Callers may run [`SeatLedger::find_active`] before inserting to fail fast,
//! but that check is advisory. Two writers can both observe a free seat; only
//! one of their inserts succeeds and the other receives
//! [`LedgerError::SeatTaken`].

use crate::types::{NewTicket, ShowtimeId, Ticket, TicketId, UserId};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by ledger operations.
pub type LedgerFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, LedgerError>> + Send + 'a>>;

/// Errors that can occur during ledger operations.
///
/// `SeatTaken` is kept separate from `Storage` so callers can map exactly the
/// constraint violation to a conflict outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The (showtime, seat) pair already has a reserved ticket.
    #[error("seat {seat} is already reserved for showtime {showtime_id}")]
    SeatTaken {
        /// Showing the seat belongs to
        showtime_id: ShowtimeId,
        /// Seat label
        seat: String,
    },

    /// No ticket with the given id.
    #[error("ticket {0} not found")]
    NotFound(TicketId),

    /// The store did not answer within its time bound.
    #[error("storage timed out: {0}")]
    Timeout(String),

    /// Any other storage failure (connection, query, decoding).
    #[error("storage error: {0}")]
    Storage(String),
}

/// Durable store of tickets.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; one handle is shared by every
/// request task.
///
/// # Dyn Compatibility
///
/// Methods return boxed futures so the ledger can be injected as
/// `Arc<dyn SeatLedger>`.
pub trait SeatLedger: Send + Sync {
    /// Insert a new ticket with status `reserved`.
    ///
    /// The ledger assigns the id and the creation timestamp.
    ///
    /// # Errors
    ///
    /// - `SeatTaken`: another reserved ticket holds the same (showtime, seat)
    /// - `Timeout`: the statement ran past its time bound
    /// - `Storage`: any other failure
    fn insert(&self, ticket: NewTicket) -> LedgerFuture<'_, Ticket>;

    /// Find the non-cancelled ticket for a (showtime, seat) pair, if any.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the lookup fails.
    fn find_active<'a>(
        &'a self,
        showtime_id: ShowtimeId,
        seat: &'a str,
    ) -> LedgerFuture<'a, Option<Ticket>>;

    /// List every ticket, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails.
    fn list_all(&self) -> LedgerFuture<'_, Vec<Ticket>>;

    /// List the tickets of one user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails.
    fn list_by_user(&self, user_id: UserId) -> LedgerFuture<'_, Vec<Ticket>>;

    /// Mark a ticket as cancelled, freeing its seat.
    ///
    /// Cancelling an already cancelled ticket returns it unchanged.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no ticket with this id
    /// - `Storage`: any other failure
    fn cancel(&self, ticket_id: TicketId) -> LedgerFuture<'_, Ticket>;

    /// Check that the backing store is reachable.
    ///
    /// # Errors
    ///
    /// Returns `Storage` when the store cannot be reached.
    fn ping(&self) -> LedgerFuture<'_, ()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LedgerError::SeatTaken {
            showtime_id: ShowtimeId::new(10),
            seat: "A1".to_string(),
        };
        assert_eq!(err.to_string(), "seat A1 is already reserved for showtime 10");

        let err = LedgerError::NotFound(TicketId::new(3));
        assert_eq!(err.to_string(), "ticket 3 not found");

        let err = LedgerError::Timeout("canceling statement".to_string());
        assert_eq!(err.to_string(), "storage timed out: canceling statement");
    }
}
