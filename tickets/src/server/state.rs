//! Application state for the ticket-booking HTTP server.

use crate::coordinator::BookingCoordinator;
use cinema_core::environment::Clock;
use cinema_core::ledger::SeatLedger;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every field is a shared handle.
#[derive(Clone)]
pub struct AppState {
    /// Runs bookings
    pub coordinator: BookingCoordinator,

    /// Read side for ticket listings and the health check
    pub ledger: Arc<dyn SeatLedger>,

    /// Time source for health reports
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        coordinator: BookingCoordinator,
        ledger: Arc<dyn SeatLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            coordinator,
            ledger,
            clock,
        }
    }
}
