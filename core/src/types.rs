//! Domain types for the ticket-booking service.
//!
//! Identifiers are integer newtypes: the identity and showtime services own
//! those ids and this service treats them as opaque. Ticket ids are assigned
//! by the seat ledger on insertion.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Identifiers
// ============================================================================

/// Identifier of a platform user (owned by the identity service)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wraps a raw user id
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw id
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a showing (owned by the showtime service)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShowtimeId(i64);

impl ShowtimeId {
    /// Wraps a raw showtime id
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw id
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ShowtimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ledger-assigned ticket identifier, increasing with insertion order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(i64);

impl TicketId {
    /// Wraps a raw ticket id
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw id
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Ticket
// ============================================================================

/// Ticket status.
///
/// Only `Reserved` tickets occupy a seat. A `Cancelled` ticket frees its
/// (showtime, seat) pair for re-booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    /// Seat is held by this ticket
    Reserved,
    /// Ticket was cancelled; seat is free
    Cancelled,
}

impl TicketStatus {
    /// Storage/wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reserved => "reserved",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether a ticket in this status occupies its seat
    #[must_use]
    pub const fn holds_seat(self) -> bool {
        matches!(self, Self::Reserved)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown ticket status
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown ticket status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for TicketStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reserved" => Ok(Self::Reserved),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A persisted seat reservation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ledger-assigned id
    pub id: TicketId,
    /// Requesting user
    pub user_id: UserId,
    /// Showing the seat belongs to
    pub showtime_id: ShowtimeId,
    /// Seat label, unique per showtime among reserved tickets
    pub seat: String,
    /// Current status
    pub status: TicketStatus,
    /// Price quoted by the showtime service at booking time
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Moment the ledger accepted the insert
    pub created_at: DateTime<Utc>,
}

/// A ticket about to be inserted; the ledger assigns id, status and timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTicket {
    /// Requesting user
    pub user_id: UserId,
    /// Showing
    pub showtime_id: ShowtimeId,
    /// Seat label
    pub seat: String,
    /// Price to charge
    pub price: Decimal,
}

// ============================================================================
// Booking request
// ============================================================================

/// Raw booking request as received from a client.
///
/// Every field is optional so that missing fields can be reported as a
/// validation failure instead of a deserialization failure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    /// Requesting user
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Showing to book
    #[serde(default)]
    pub showtime_id: Option<i64>,
    /// Seat label
    #[serde(default)]
    pub seat: Option<String>,
}

/// Reasons a booking request is rejected before any I/O.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    /// `user_id` missing or zero
    #[error("user_id is required")]
    MissingUser,
    /// `showtime_id` missing or zero
    #[error("showtime_id is required")]
    MissingShowtime,
    /// `seat` missing or blank
    #[error("seat is required")]
    MissingSeat,
}

/// A booking request that passed shape validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeatSelection {
    /// Requesting user
    pub user_id: UserId,
    /// Showing
    pub showtime_id: ShowtimeId,
    /// Seat label, trimmed
    pub seat: String,
}

impl BookingRequest {
    /// Creates a fully populated request
    #[must_use]
    pub fn new(user_id: i64, showtime_id: i64, seat: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            showtime_id: Some(showtime_id),
            seat: Some(seat.into()),
        }
    }

    /// Checks the request shape.
    ///
    /// Ids must be present and non-zero; the seat label must be non-blank and
    /// is trimmed of surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns the first [`RequestError`] found, checking user, showtime and
    /// seat in that order.
    pub fn validate(&self) -> Result<SeatSelection, RequestError> {
        let user_id = self
            .user_id
            .filter(|id| *id != 0)
            .ok_or(RequestError::MissingUser)?;
        let showtime_id = self
            .showtime_id
            .filter(|id| *id != 0)
            .ok_or(RequestError::MissingShowtime)?;
        let seat = self
            .seat
            .as_deref()
            .map(str::trim)
            .filter(|seat| !seat.is_empty())
            .ok_or(RequestError::MissingSeat)?;

        Ok(SeatSelection {
            user_id: UserId::new(user_id),
            showtime_id: ShowtimeId::new(showtime_id),
            seat: seat.to_string(),
        })
    }
}
