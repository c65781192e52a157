//! # Cinema Core
//!
//! Domain types and contracts for the cinema ticket-booking service.
//!
//! This crate has no I/O of its own. It defines:
//!
//! - **Types**: [`Ticket`](types::Ticket), identifiers, the raw and validated booking request
//! - **Seat ledger**: the storage contract that owns the one-reservation-per-seat invariant
//! - **Collaborators**: identity, showtime and notification service contracts
//! - **Environment**: injected time source
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            Booking Coordinator               │  (tickets crate)
//! └──────┬───────────────┬───────────────┬───────┘
//!        │               │               │
//!  IdentityDirectory  ShowtimeCatalog  SeatLedger ──► EventNotifier
//!   (HTTP client)     (HTTP client)    (Postgres)      (detached)
//! ```
//!
//! Implementations live in `cinema-postgres` (ledger), `cinema-testing`
//! (in-memory doubles) and the `tickets` application (HTTP clients).

pub mod collaborators;
pub mod ledger;
pub mod types;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use rust_decimal::Decimal;

pub use collaborators::{
    EventEnvelope, EventNotifier, IdentityDirectory, Lookup, NotifyError, ShowtimeCatalog,
    ShowtimeQuote, TICKET_PURCHASED,
};
pub use ledger::{LedgerError, LedgerFuture, SeatLedger};
pub use types::{
    BookingRequest, NewTicket, RequestError, SeatSelection, ShowtimeId, Ticket, TicketId,
    TicketStatus, UserId,
};

/// Environment module - injected dependencies that are not services
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
