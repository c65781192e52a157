//! # Cinema Testing
//!
//! Testing utilities for the cinema ticket-booking service.
//!
//! This crate provides:
//! - [`InMemorySeatLedger`]: a `SeatLedger` with the same uniqueness semantics as `PostgreSQL`
//! - Scripted collaborator doubles with call counters
//! - [`FixedClock`]: deterministic time
//! - proptest strategies for booking workloads
//!
//! ## Example
//!
//! ```ignore
//! use cinema_testing::{Collaborators, InMemorySeatLedger};
//!
//! #[tokio::test]
//! async fn test_booking() {
//!     let doubles = Collaborators::happy_path();
//!     let ledger = Arc::new(InMemorySeatLedger::new());
//!     let coordinator = BookingCoordinator::new(
//!         ledger,
//!         doubles.identity,
//!         doubles.showtimes,
//!         doubles.notifier,
//!         Decimal::new(1000, 2),
//!     );
//!
//!     let ticket = coordinator.book_seat(BookingRequest::new(1, 10, "A1")).await?;
//!     assert_eq!(ticket.status, TicketStatus::Reserved);
//! }
//! ```

pub mod ledger;
pub mod mocks;

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// One booking attempt: (user, showtime, seat)
    pub type Attempt = (i64, i64, String);

    /// Seat labels drawn from a small grid so collisions are frequent
    pub fn seat_label() -> impl Strategy<Value = String> {
        ("[A-C]", 1..=3u8).prop_map(|(row, number)| format!("{row}{number}"))
    }

    /// A sequence of booking attempts over a few showtimes and users
    pub fn booking_attempts(max_len: usize) -> impl Strategy<Value = Vec<Attempt>> {
        prop::collection::vec((1..=4i64, 1..=3i64, seat_label()), 1..max_len)
    }
}

// Re-export commonly used items
pub use ledger::InMemorySeatLedger;
pub use mocks::{
    Collaborators, FixedClock, RecordingNotifier, StubIdentityDirectory, StubShowtimeCatalog,
    test_clock,
};
