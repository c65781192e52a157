//! Axum integration shared by the cinema platform services.
//!
//! Handlers stay thin: they parse the request, call into the domain layer and
//! map the outcome to a response. This crate provides the pieces every
//! service needs for that last step.
//!
//! - [`AppError`]: domain failure → HTTP status + JSON error body
//! - [`request_id_layer`]: per-request id, tracing span and response header
//! - [`HealthReport`]: the `/health` body and its status code
//!
//! # Example
//!
//! ```ignore
//! use cinema_web::{RequestId, WebResult, request_id_layer};
//! use axum::{Router, routing::get, Json};
//!
//! async fn list(request_id: RequestId) -> WebResult<Json<Vec<Ticket>>> {
//!     tracing::debug!(%request_id, "Listing tickets");
//!     Ok(Json(vec![]))
//! }
//!
//! let app = Router::new()
//!     .route("/tickets", get(list))
//!     .layer(request_id_layer());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod health;
pub mod request_id;

// Re-export key types for convenience
pub use error::AppError;
pub use health::{DatabaseStatus, HealthReport, ServiceStatus};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
