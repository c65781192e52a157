//! Booking coordinator.
//!
//! One booking runs these steps in order, stopping at the first failure:
//!
//! ```text
//! validate ─► identity ─► showtime ─► pre-check ─► insert ─► publish (detached)
//! ```
//!
//! The seat ledger's uniqueness constraint decides races. The pre-check only
//! fails fast on seats that are visibly taken; a booking that passes it can
//! still lose at insert time, and that loss is reported exactly like a
//! pre-check hit.
//!
//! Every ledger call is bounded by the ledger timeout. A call that runs past
//! it is reported as the database being unavailable, like a collaborator
//! that did not answer.

use cinema_core::collaborators::{
    EventEnvelope, EventNotifier, IdentityDirectory, Lookup, ShowtimeCatalog, TICKET_PURCHASED,
};
use cinema_core::ledger::{LedgerError, LedgerFuture, SeatLedger};
use cinema_core::types::{BookingRequest, NewTicket, SeatSelection, ShowtimeId, Ticket, UserId};
use cinema_web::AppError;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Collaborator names used in [`BookingError::CollaboratorUnavailable`]
pub const USERS_SERVICE: &str = "users";
/// See [`USERS_SERVICE`]
pub const SHOWTIMES_SERVICE: &str = "showtimes";
/// See [`USERS_SERVICE`]; the seat ledger's backing store
pub const DATABASE_SERVICE: &str = "database";

/// Default upper bound on one ledger call
pub const DEFAULT_LEDGER_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a booking did not produce a ticket.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Missing or malformed request fields
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The identity service does not know the user
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// The showtime service does not know the showing
    #[error("showtime {0} not found")]
    ShowtimeNotFound(ShowtimeId),

    /// Another reserved ticket holds the seat
    #[error("seat {seat} is already reserved for showtime {showtime_id}")]
    SeatTaken {
        /// Showing
        showtime_id: ShowtimeId,
        /// Seat label
        seat: String,
    },

    /// A collaborator could not be reached in time
    #[error("{service} service unavailable: {reason}")]
    CollaboratorUnavailable {
        /// Which collaborator
        service: &'static str,
        /// Transport error text
        reason: String,
    },

    /// The ledger failed for a reason other than a seat conflict
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::InvalidRequest(message) => Self::bad_request(message),
            BookingError::UserNotFound(id) => Self::not_found("User", id),
            BookingError::ShowtimeNotFound(id) => Self::not_found("Showtime", id),
            BookingError::SeatTaken { .. } => Self::conflict(err.to_string()),
            BookingError::CollaboratorUnavailable { service, .. } => {
                Self::unavailable(format!("The {service} service is unavailable"))
                    .with_source(anyhow::Error::new(err))
            }
            BookingError::Storage(_) => {
                Self::internal("Failed to save ticket").with_source(anyhow::Error::new(err))
            }
        }
    }
}

/// Orchestrates validation, decision and persistence for one booking.
///
/// Cheap to clone; every dependency is shared.
#[derive(Clone)]
pub struct BookingCoordinator {
    ledger: Arc<dyn SeatLedger>,
    identity: Arc<dyn IdentityDirectory>,
    showtimes: Arc<dyn ShowtimeCatalog>,
    notifier: Arc<dyn EventNotifier>,
    default_price: Decimal,
    ledger_timeout: Duration,
}

impl BookingCoordinator {
    /// Create a coordinator over the given ledger and collaborators.
    #[must_use]
    pub fn new(
        ledger: Arc<dyn SeatLedger>,
        identity: Arc<dyn IdentityDirectory>,
        showtimes: Arc<dyn ShowtimeCatalog>,
        notifier: Arc<dyn EventNotifier>,
        default_price: Decimal,
    ) -> Self {
        Self {
            ledger,
            identity,
            showtimes,
            notifier,
            default_price,
            ledger_timeout: DEFAULT_LEDGER_TIMEOUT,
        }
    }

    /// Bound every ledger call by `timeout` instead of [`DEFAULT_LEDGER_TIMEOUT`].
    #[must_use]
    pub const fn with_ledger_timeout(mut self, timeout: Duration) -> Self {
        self.ledger_timeout = timeout;
        self
    }

    /// Upper bound on one ledger call
    #[must_use]
    pub const fn ledger_timeout(&self) -> Duration {
        self.ledger_timeout
    }

    /// Price charged when the showtime service does not quote one
    #[must_use]
    pub const fn default_price(&self) -> Decimal {
        self.default_price
    }

    /// Book one seat.
    ///
    /// On success the `ticket.purchased` event is handed to a detached task;
    /// its outcome never affects the returned ticket.
    ///
    /// # Errors
    ///
    /// Returns a [`BookingError`] naming the first step that failed.
    #[tracing::instrument(
        skip(self, request),
        fields(
            user_id = ?request.user_id,
            showtime_id = ?request.showtime_id,
            seat = ?request.seat,
        )
    )]
    pub async fn book_seat(&self, request: BookingRequest) -> Result<Ticket, BookingError> {
        let selection = request.validate().map_err(|e| {
            tracing::debug!(error = %e, "Booking request rejected");
            BookingError::InvalidRequest(e.to_string())
        })?;

        self.check_user(selection.user_id).await?;
        let price = self.quote(selection.showtime_id).await?;
        let ticket = self.reserve(selection, price).await?;

        tracing::info!(ticket_id = %ticket.id, price = %ticket.price, "Ticket reserved");
        self.announce(&ticket);

        Ok(ticket)
    }

    async fn check_user(&self, user_id: UserId) -> Result<(), BookingError> {
        match self.identity.lookup_user(user_id).await {
            Lookup::Found(()) => Ok(()),
            Lookup::NotFound => {
                tracing::info!(%user_id, "User not found");
                Err(BookingError::UserNotFound(user_id))
            }
            Lookup::Unavailable(reason) => {
                tracing::warn!(%user_id, %reason, "Users service unavailable");
                Err(BookingError::CollaboratorUnavailable {
                    service: USERS_SERVICE,
                    reason,
                })
            }
        }
    }

    async fn quote(&self, showtime_id: ShowtimeId) -> Result<Decimal, BookingError> {
        match self.showtimes.lookup_showtime(showtime_id).await {
            Lookup::Found(quote) => Ok(quote.price.unwrap_or_else(|| {
                tracing::debug!(
                    %showtime_id,
                    default = %self.default_price,
                    "No price quoted, using default"
                );
                self.default_price
            })),
            Lookup::NotFound => {
                tracing::info!(%showtime_id, "Showtime not found");
                Err(BookingError::ShowtimeNotFound(showtime_id))
            }
            Lookup::Unavailable(reason) => {
                tracing::warn!(%showtime_id, %reason, "Showtimes service unavailable");
                Err(BookingError::CollaboratorUnavailable {
                    service: SHOWTIMES_SERVICE,
                    reason,
                })
            }
        }
    }

    async fn reserve(
        &self,
        selection: SeatSelection,
        price: Decimal,
    ) -> Result<Ticket, BookingError> {
        let SeatSelection {
            user_id,
            showtime_id,
            seat,
        } = selection;

        let held = self
            .bounded(self.ledger.find_active(showtime_id, &seat))
            .await
            .map_err(|e| ledger_failure(&e))?;
        if held.is_some() {
            tracing::info!(%showtime_id, %seat, "Seat already reserved");
            return Err(BookingError::SeatTaken { showtime_id, seat });
        }

        let new_ticket = NewTicket {
            user_id,
            showtime_id,
            seat,
            price,
        };

        match self.bounded(self.ledger.insert(new_ticket)).await {
            Ok(ticket) => Ok(ticket),
            Err(LedgerError::SeatTaken { showtime_id, seat }) => {
                tracing::info!(%showtime_id, %seat, "Seat taken by a concurrent booking");
                Err(BookingError::SeatTaken { showtime_id, seat })
            }
            Err(e) => Err(ledger_failure(&e)),
        }
    }

    /// Await a ledger call for at most the ledger timeout.
    async fn bounded<T>(&self, call: LedgerFuture<'_, T>) -> Result<T, LedgerError> {
        tokio::time::timeout(self.ledger_timeout, call)
            .await
            .unwrap_or_else(|_| {
                Err(LedgerError::Timeout(format!(
                    "no answer within {:?}",
                    self.ledger_timeout
                )))
            })
    }

    /// Fire-and-forget `ticket.purchased`.
    fn announce(&self, ticket: &Ticket) {
        let envelope = match EventEnvelope::new(TICKET_PURCHASED, ticket) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(ticket_id = %ticket.id, error = %e, "Failed to build event");
                return;
            }
        };

        let notifier = Arc::clone(&self.notifier);
        let ticket_id = ticket.id;
        tokio::spawn(async move {
            if let Err(e) = notifier.publish(envelope).await {
                tracing::warn!(%ticket_id, error = %e, "Failed to publish ticket.purchased");
            }
        });
    }
}

fn ledger_failure(err: &LedgerError) -> BookingError {
    if let LedgerError::Timeout(reason) = err {
        tracing::warn!(%reason, "Seat ledger timed out");
        return BookingError::CollaboratorUnavailable {
            service: DATABASE_SERVICE,
            reason: reason.clone(),
        };
    }
    tracing::error!(error = %err, "Seat ledger failure");
    BookingError::Storage(err.to_string())
}
