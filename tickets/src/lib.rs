//! # Tickets
//!
//! Cinema ticket-booking service.
//!
//! A booking checks the user with the identity service, prices the showing
//! with the showtime service, and reserves the seat in the seat ledger. The
//! ledger guarantees at most one reserved ticket per (showtime, seat), however
//! many requests race for it. A `ticket.purchased` event goes to the
//! notification service on success, best-effort.
//!
//! ## Modules
//!
//! - [`config`]: environment configuration
//! - [`clients`]: reqwest clients for the collaborator services
//! - [`coordinator`]: the booking workflow
//! - [`api`] / [`server`]: axum handlers, state and router

#![forbid(unsafe_code)]

pub mod api;
pub mod clients;
pub mod config;
pub mod coordinator;
pub mod server;

pub use config::Config;
pub use coordinator::{BookingCoordinator, BookingError};
pub use server::{AppState, build_router};
