//! `PostgreSQL` seat ledger for the cinema ticket-booking service.
//!
//! This crate provides [`PostgresSeatLedger`], the production implementation of
//! the `SeatLedger` trait from `cinema-core`. It uses sqlx and supports:
//!
//! - Atomic seat reservation backed by a partial unique index
//! - Distinct reporting of constraint violations (`SeatTaken`) and other failures
//! - Embedded migrations
//! - Connection pooling
//!
//! # Example
//!
//! ```ignore
//! use cinema_postgres::PostgresSeatLedger;
//! use sqlx::PgPool;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = PgPool::connect("postgres://localhost/tickets").await?;
//!     let ledger = PostgresSeatLedger::from_pool(pool);
//!     ledger.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod ledger;

pub use ledger::PostgresSeatLedger;
