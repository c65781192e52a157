//! Scripted collaborator doubles.
//!
//! Each double counts the calls it receives so tests can assert that invalid
//! requests never reach a collaborator.

use chrono::{DateTime, Duration, Utc};
use cinema_core::collaborators::{
    EventEnvelope, EventNotifier, IdentityDirectory, Lookup, LookupFuture, NotifyError,
    ShowtimeCatalog, ShowtimeQuote,
};
use cinema_core::environment::Clock;
use cinema_core::types::{ShowtimeId, UserId};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Clock that only moves when told to
///
/// # Example
///
/// ```
/// use cinema_testing::mocks::FixedClock;
/// use cinema_core::environment::Clock;
/// use chrono::{Duration, Utc};
///
/// let start = Utc::now();
/// let clock = FixedClock::new(start);
/// assert_eq!(clock.now(), clock.now());
///
/// clock.advance(Duration::seconds(1));
/// assert_eq!(clock.now(), start + Duration::seconds(1));
/// ```
#[derive(Debug)]
pub struct FixedClock {
    time: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Create a clock frozen at `time`
    #[must_use]
    pub const fn new(time: DateTime<Utc>) -> Self {
        Self {
            time: Mutex::new(time),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        if let Ok(mut time) = self.time.lock() {
            *time += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.time.lock().map_or_else(|e| *e.into_inner(), |time| *time)
    }
}

/// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
#[must_use]
pub fn test_clock() -> FixedClock {
    FixedClock::new(DateTime::from_timestamp(1_735_689_600, 0).unwrap_or_default())
}

// ============================================================================
// Identity
// ============================================================================

/// Identity directory answering from a fixed set of known users.
#[derive(Debug, Default)]
pub struct StubIdentityDirectory {
    known: Mutex<Vec<UserId>>,
    unavailable: Option<String>,
    calls: AtomicUsize,
}

impl StubIdentityDirectory {
    /// Directory that knows no users
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory that knows the given users
    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = i64>) -> Self {
        let directory = Self::new();
        if let Ok(mut known) = directory.known.lock() {
            known.extend(users.into_iter().map(UserId::new));
        }
        directory
    }

    /// Directory whose every lookup reports the service as unreachable
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Number of lookups received
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IdentityDirectory for StubIdentityDirectory {
    fn lookup_user(&self, user_id: UserId) -> LookupFuture<'_, ()> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(reason) = &self.unavailable {
                return Lookup::Unavailable(reason.clone());
            }
            let known = self
                .known
                .lock()
                .map(|known| known.contains(&user_id))
                .unwrap_or(false);
            if known { Lookup::Found(()) } else { Lookup::NotFound }
        })
    }
}

// ============================================================================
// Showtimes
// ============================================================================

/// Showtime catalog answering from a fixed price list.
#[derive(Debug, Default)]
pub struct StubShowtimeCatalog {
    showtimes: Mutex<HashMap<ShowtimeId, Option<Decimal>>>,
    unavailable: Option<String>,
    calls: AtomicUsize,
}

impl StubShowtimeCatalog {
    /// Catalog with no showtimes
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a showtime; `None` models a response without a usable price
    #[must_use]
    pub fn with_showtime(self, showtime_id: i64, price: Option<Decimal>) -> Self {
        if let Ok(mut showtimes) = self.showtimes.lock() {
            showtimes.insert(ShowtimeId::new(showtime_id), price);
        }
        self
    }

    /// Catalog whose every lookup reports the service as unreachable
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Number of lookups received
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ShowtimeCatalog for StubShowtimeCatalog {
    fn lookup_showtime(&self, showtime_id: ShowtimeId) -> LookupFuture<'_, ShowtimeQuote> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(reason) = &self.unavailable {
                return Lookup::Unavailable(reason.clone());
            }
            let price = self
                .showtimes
                .lock()
                .ok()
                .and_then(|showtimes| showtimes.get(&showtime_id).copied());
            match price {
                Some(price) => Lookup::Found(ShowtimeQuote { price }),
                None => Lookup::NotFound,
            }
        })
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// Notifier that records every published envelope.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<EventEnvelope>>,
    published: Notify,
    failing: bool,
}

impl RecordingNotifier {
    /// Notifier that accepts every event
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifier that records the attempt, then fails delivery
    #[must_use]
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Events published so far
    #[must_use]
    pub fn events(&self) -> Vec<EventEnvelope> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Wait until at least `count` events were published or `timeout` elapses.
    ///
    /// Publication is detached from the booking call, so tests poll for it.
    pub async fn wait_for(
        &self,
        count: usize,
        timeout: std::time::Duration,
    ) -> Vec<EventEnvelope> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.published.notified();
            let events = self.events();
            if events.len() >= count {
                return events;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.events();
            }
        }
    }
}

impl EventNotifier for RecordingNotifier {
    fn publish(
        &self,
        envelope: EventEnvelope,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>> {
        Box::pin(async move {
            if let Ok(mut events) = self.events.lock() {
                events.push(envelope);
            }
            self.published.notify_waiters();
            if self.failing {
                Err(NotifyError::Transport("connection refused".to_string()))
            } else {
                Ok(())
            }
        })
    }
}

/// Shared handles to a full set of collaborator doubles.
#[derive(Clone)]
pub struct Collaborators {
    /// Identity double
    pub identity: Arc<StubIdentityDirectory>,
    /// Showtime double
    pub showtimes: Arc<StubShowtimeCatalog>,
    /// Notification double
    pub notifier: Arc<RecordingNotifier>,
}

impl Collaborators {
    /// Users 1 and 2 exist; showtime 10 costs 12.5, showtime 20 has no price
    #[must_use]
    pub fn happy_path() -> Self {
        Self {
            identity: Arc::new(StubIdentityDirectory::with_users([1, 2])),
            showtimes: Arc::new(
                StubShowtimeCatalog::new()
                    .with_showtime(10, Some(Decimal::new(125, 1)))
                    .with_showtime(20, None),
            ),
            notifier: Arc::new(RecordingNotifier::new()),
        }
    }

    /// Total lookups received by both validation doubles
    #[must_use]
    pub fn validation_calls(&self) -> usize {
        self.identity.calls() + self.showtimes.calls()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
        assert_eq!(time1.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn test_identity_stub_counts_calls() {
        let identity = StubIdentityDirectory::with_users([1]);
        assert_eq!(identity.lookup_user(UserId::new(1)).await, Lookup::Found(()));
        assert_eq!(identity.lookup_user(UserId::new(9)).await, Lookup::NotFound);
        assert_eq!(identity.calls(), 2);
    }

    #[tokio::test]
    async fn test_showtime_stub_prices() {
        let catalog = StubShowtimeCatalog::new().with_showtime(10, Some(Decimal::new(8, 0)));
        assert_eq!(
            catalog.lookup_showtime(ShowtimeId::new(10)).await,
            Lookup::Found(ShowtimeQuote {
                price: Some(Decimal::new(8, 0))
            })
        );
        assert_eq!(catalog.lookup_showtime(ShowtimeId::new(11)).await, Lookup::NotFound);
    }

    #[tokio::test]
    async fn test_recording_notifier_wait_for() {
        let notifier = Arc::new(RecordingNotifier::new());
        let publisher = Arc::clone(&notifier);
        tokio::spawn(async move {
            let envelope = EventEnvelope::new("ticket.purchased", &1).unwrap();
            publisher.publish(envelope).await.unwrap();
        });

        let events = notifier.wait_for(1, std::time::Duration::from_secs(1)).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "ticket.purchased");
    }
}
