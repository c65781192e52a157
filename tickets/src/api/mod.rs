//! HTTP API endpoints.

pub mod tickets;
