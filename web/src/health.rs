//! Health report shared by the platform services.
//!
//! Load balancers and the API gateway poll `GET /health`. A service is
//! healthy when its database answers; the body names the service and the
//! database state either way:
//!
//! ```json
//! {
//!   "status": "healthy",
//!   "service": "tickets",
//!   "database": "connected",
//!   "timestamp": "2025-01-01T00:00:00Z"
//! }
//! ```

use axum::{Json, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall service status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// All dependencies reachable
    Healthy,
    /// At least one dependency unreachable
    Unhealthy,
}

/// Database connectivity as seen by the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
    /// Ping succeeded
    Connected,
    /// Ping failed
    Disconnected,
}

/// Health check response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Service status
    pub status: ServiceStatus,
    /// Service name
    pub service: String,
    /// Database connectivity
    pub database: DatabaseStatus,
    /// When the check ran
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    /// Build a report from the outcome of a database ping.
    #[must_use]
    pub fn from_ping(service: impl Into<String>, database_ok: bool, at: DateTime<Utc>) -> Self {
        let (status, database) = if database_ok {
            (ServiceStatus::Healthy, DatabaseStatus::Connected)
        } else {
            (ServiceStatus::Unhealthy, DatabaseStatus::Disconnected)
        };

        Self {
            status,
            service: service.into(),
            database,
            timestamp: at,
        }
    }

    /// HTTP status for this report: 200 when healthy, 503 otherwise
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self.status {
            ServiceStatus::Healthy => StatusCode::OK,
            ServiceStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Turn the report into a handler response.
    #[must_use]
    pub fn into_response_parts(self) -> (StatusCode, Json<Self>) {
        (self.status_code(), Json(self))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_healthy_report() {
        let (status, Json(report)) =
            HealthReport::from_ping("tickets", true, at()).into_response_parts();

        assert_eq!(status, StatusCode::OK);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "tickets");
        assert_eq!(json["database"], "connected");
        assert_eq!(json["timestamp"], "2025-01-01T00:00:00Z");
    }

    #[test]
    fn test_unhealthy_report() {
        let report = HealthReport::from_ping("tickets", false, at());

        assert_eq!(report.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.status, ServiceStatus::Unhealthy);
        assert_eq!(report.database, DatabaseStatus::Disconnected);
    }
}
