//! HTTP clients for the collaborator services.
//!
//! - [`HttpIdentityDirectory`]: `GET {users}/users/{id}`
//! - [`HttpShowtimeCatalog`]: `GET {showtimes}/showtimes/{id}`
//! - [`HttpEventNotifier`]: `POST {notifications}/events`
//!
//! Existence checks look only at the status code: `200` means the entity
//! exists, any other answer means it does not. A transport failure or timeout
//! means the service is unavailable. Nothing is retried.

use cinema_core::collaborators::{
    EventEnvelope, EventNotifier, IdentityDirectory, Lookup, LookupFuture, NotifyError,
    ShowtimeCatalog, ShowtimeQuote,
};
use cinema_core::types::{ShowtimeId, UserId};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Base URL with any trailing slash removed
fn trimmed(base_url: impl Into<String>) -> String {
    let mut url = base_url.into();
    while url.ends_with('/') {
        url.pop();
    }
    url
}

/// Identity service client.
#[derive(Clone, Debug)]
pub struct HttpIdentityDirectory {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpIdentityDirectory {
    /// Create a client for the identity service at `base_url`.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: trimmed(base_url),
            timeout,
        }
    }
}

impl IdentityDirectory for HttpIdentityDirectory {
    fn lookup_user(&self, user_id: UserId) -> LookupFuture<'_, ()> {
        Box::pin(async move {
            let response = self
                .client
                .get(format!("{}/users/{user_id}", self.base_url))
                .timeout(self.timeout)
                .send()
                .await;

            match response {
                Ok(response) if response.status() == StatusCode::OK => Lookup::Found(()),
                Ok(response) => {
                    tracing::debug!(%user_id, status = %response.status(), "User lookup rejected");
                    Lookup::NotFound
                }
                Err(e) => Lookup::Unavailable(e.to_string()),
            }
        })
    }
}

/// Showtime service client.
#[derive(Clone, Debug)]
pub struct HttpShowtimeCatalog {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpShowtimeCatalog {
    /// Create a client for the showtime service at `base_url`.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: trimmed(base_url),
            timeout,
        }
    }
}

/// Reads `price` as a JSON number; anything else is "no price".
fn quoted_price(body: &serde_json::Value) -> Option<Decimal> {
    body.get("price")
        .and_then(serde_json::Value::as_f64)
        .and_then(Decimal::from_f64)
}

impl ShowtimeCatalog for HttpShowtimeCatalog {
    fn lookup_showtime(&self, showtime_id: ShowtimeId) -> LookupFuture<'_, ShowtimeQuote> {
        Box::pin(async move {
            let response = self
                .client
                .get(format!("{}/showtimes/{showtime_id}", self.base_url))
                .timeout(self.timeout)
                .send()
                .await;

            let response = match response {
                Ok(response) if response.status() == StatusCode::OK => response,
                Ok(response) => {
                    tracing::debug!(
                        %showtime_id,
                        status = %response.status(),
                        "Showtime lookup rejected"
                    );
                    return Lookup::NotFound;
                }
                Err(e) => return Lookup::Unavailable(e.to_string()),
            };

            // A body that is not JSON still proves the showtime exists.
            let price = match response.json::<serde_json::Value>().await {
                Ok(body) => quoted_price(&body),
                Err(e) => {
                    tracing::debug!(%showtime_id, error = %e, "Showtime body unreadable");
                    None
                }
            };

            Lookup::Found(ShowtimeQuote { price })
        })
    }
}

/// Notification service client.
#[derive(Clone, Debug)]
pub struct HttpEventNotifier {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpEventNotifier {
    /// Create a client for the notification service at `base_url`.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: trimmed(base_url),
            timeout,
        }
    }
}

impl EventNotifier for HttpEventNotifier {
    fn publish(
        &self,
        envelope: EventEnvelope,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>> {
        Box::pin(async move {
            let response = self
                .client
                .post(format!("{}/events", self.base_url))
                .timeout(self.timeout)
                .json(&envelope)
                .send()
                .await
                .map_err(|e| NotifyError::Transport(e.to_string()))?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(NotifyError::Rejected(response.status().as_u16()))
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cinema_core::collaborators::TICKET_PURCHASED;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_millis(500);

    #[tokio::test]
    async fn test_user_found_only_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/2"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let directory =
            HttpIdentityDirectory::new(Client::new(), format!("{}/", server.uri()), TIMEOUT);

        assert_eq!(directory.lookup_user(UserId::new(1)).await, Lookup::Found(()));
        assert_eq!(directory.lookup_user(UserId::new(2)).await, Lookup::NotFound);
        // Unmatched requests get wiremock's 404
        assert_eq!(directory.lookup_user(UserId::new(3)).await, Lookup::NotFound);
    }

    #[tokio::test]
    async fn test_server_error_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/1"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let directory = HttpIdentityDirectory::new(Client::new(), server.uri(), TIMEOUT);
        assert_eq!(directory.lookup_user(UserId::new(1)).await, Lookup::NotFound);
    }

    #[tokio::test]
    async fn test_slow_service_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/showtimes/10"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let catalog =
            HttpShowtimeCatalog::new(Client::new(), server.uri(), Duration::from_millis(100));
        let lookup = catalog.lookup_showtime(ShowtimeId::new(10)).await;
        assert!(matches!(lookup, Lookup::Unavailable(_)), "got {lookup:?}");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() {
        // Nothing listens on port 9 (discard) in the test environment
        let directory = HttpIdentityDirectory::new(Client::new(), "http://127.0.0.1:9", TIMEOUT);
        let lookup = directory.lookup_user(UserId::new(1)).await;
        assert!(matches!(lookup, Lookup::Unavailable(_)), "got {lookup:?}");
    }

    #[tokio::test]
    async fn test_showtime_price_parsing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/showtimes/10"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 10, "price": 12.5})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/showtimes/20"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 20, "price": "twelve"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/showtimes/50"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": 50, "price": 12_345_678_901.25})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/showtimes/30"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let catalog = HttpShowtimeCatalog::new(Client::new(), server.uri(), TIMEOUT);

        assert_eq!(
            catalog.lookup_showtime(ShowtimeId::new(10)).await,
            Lookup::Found(ShowtimeQuote {
                price: Some(Decimal::new(125, 1))
            })
        );
        assert_eq!(
            catalog.lookup_showtime(ShowtimeId::new(20)).await,
            Lookup::Found(ShowtimeQuote { price: None })
        );
        assert_eq!(
            catalog.lookup_showtime(ShowtimeId::new(30)).await,
            Lookup::Found(ShowtimeQuote { price: None })
        );
        // Copied as quoted, no rounding or precision cap
        assert_eq!(
            catalog.lookup_showtime(ShowtimeId::new(50)).await,
            Lookup::Found(ShowtimeQuote {
                price: Some(Decimal::new(1_234_567_890_125, 2))
            })
        );
        assert_eq!(
            catalog.lookup_showtime(ShowtimeId::new(40)).await,
            Lookup::NotFound
        );
    }

    #[tokio::test]
    async fn test_publish_posts_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/events"))
            .and(body_json(json!({"event": "ticket.purchased", "data": {"id": 7}})))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = HttpEventNotifier::new(Client::new(), server.uri(), TIMEOUT);
        let envelope = EventEnvelope::new(TICKET_PURCHASED, &json!({"id": 7})).unwrap();

        assert_eq!(notifier.publish(envelope).await, Ok(()));
    }

    #[tokio::test]
    async fn test_publish_reports_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let notifier = HttpEventNotifier::new(Client::new(), server.uri(), TIMEOUT);
        let envelope = EventEnvelope::new(TICKET_PURCHASED, &json!({})).unwrap();

        assert_eq!(notifier.publish(envelope).await, Err(NotifyError::Rejected(503)));
    }
}
