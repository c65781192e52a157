//! Contracts for the external services the booking workflow calls.
//!
//! - [`IdentityDirectory`]: does a user exist?
//! - [`ShowtimeCatalog`]: does a showing exist, and what does it cost?
//! - [`EventNotifier`]: announce a domain event (best-effort)
//!
//! Lookups never fail with an error type. Every outcome, including an
//! unreachable service, is a [`Lookup`] variant the caller must map.

use crate::types::{ShowtimeId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Event published after a ticket is reserved
pub const TICKET_PURCHASED: &str = "ticket.purchased";

/// Outcome of an existence check against a collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The entity exists; carries any payload the service returned
    Found(T),
    /// The service answered, but not with success
    NotFound,
    /// Connection failure or timeout
    Unavailable(String),
}

/// Pricing data returned by the showtime service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShowtimeQuote {
    /// Ticket price, when the service provided a usable one
    pub price: Option<Decimal>,
}

/// Boxed future returned by lookups.
pub type LookupFuture<'a, T> = Pin<Box<dyn Future<Output = Lookup<T>> + Send + 'a>>;

/// Identity service contract.
pub trait IdentityDirectory: Send + Sync {
    /// Check whether a user exists.
    fn lookup_user(&self, user_id: UserId) -> LookupFuture<'_, ()>;
}

/// Showtime service contract.
pub trait ShowtimeCatalog: Send + Sync {
    /// Check whether a showing exists and fetch its price.
    fn lookup_showtime(&self, showtime_id: ShowtimeId) -> LookupFuture<'_, ShowtimeQuote>;
}

/// Wire body of a published event: `{"event": ..., "data": ...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Event name, e.g. [`TICKET_PURCHASED`]
    pub event: String,
    /// Event payload
    pub data: serde_json::Value,
}

impl EventEnvelope {
    /// Builds an envelope from any serializable payload.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Serialization`] if the payload cannot be
    /// converted to JSON.
    pub fn new(event: &str, data: &impl Serialize) -> Result<Self, NotifyError> {
        let data =
            serde_json::to_value(data).map_err(|e| NotifyError::Serialization(e.to_string()))?;
        Ok(Self {
            event: event.to_string(),
            data,
        })
    }
}

/// Errors from publishing an event. Never surfaced to booking callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The request could not be delivered
    #[error("notification request failed: {0}")]
    Transport(String),

    /// The notification service answered with a non-success status
    #[error("notification service answered with status {0}")]
    Rejected(u16),

    /// The payload could not be serialized
    #[error("failed to serialize event payload: {0}")]
    Serialization(String),
}

/// Notification service contract.
///
/// Delivery is at-most-once: implementations do not retry and callers do not
/// wait for confirmation.
pub trait EventNotifier: Send + Sync {
    /// Publish one event.
    ///
    /// # Errors
    ///
    /// Returns a [`NotifyError`] describing why delivery failed.
    fn publish(
        &self,
        envelope: EventEnvelope,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = EventEnvelope::new(TICKET_PURCHASED, &serde_json::json!({"id": 1})).unwrap();
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["event"], "ticket.purchased");
        assert_eq!(json["data"]["id"], 1);
    }
}
