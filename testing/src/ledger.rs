//! In-memory seat ledger for fast, deterministic tests.
//!
//! All rows live behind one mutex. The uniqueness check and the append happen
//! inside the same critical section, which gives the same guarantee as the
//! partial unique index in `PostgreSQL`.

use cinema_core::environment::{Clock, SystemClock};
use cinema_core::ledger::{LedgerError, LedgerFuture, SeatLedger};
use cinema_core::types::{NewTicket, ShowtimeId, Ticket, TicketId, TicketStatus, UserId};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// In-memory [`SeatLedger`].
///
/// # Example
///
/// ```
/// use cinema_core::ledger::{LedgerError, SeatLedger};
/// use cinema_core::types::{NewTicket, ShowtimeId, UserId};
/// use cinema_core::Decimal;
/// use cinema_testing::InMemorySeatLedger;
///
/// # async fn example() -> Result<(), LedgerError> {
/// let ledger = InMemorySeatLedger::new();
/// let new_ticket = NewTicket {
///     user_id: UserId::new(1),
///     showtime_id: ShowtimeId::new(10),
///     seat: "A1".to_string(),
///     price: Decimal::new(125, 1),
/// };
///
/// ledger.insert(new_ticket.clone()).await?;
/// assert!(matches!(
///     ledger.insert(new_ticket).await,
///     Err(LedgerError::SeatTaken { .. })
/// ));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct InMemorySeatLedger {
    rows: Arc<Mutex<Vec<Ticket>>>,
    clock: Arc<dyn Clock>,
    offline: Arc<AtomicBool>,
    stale_precheck: Arc<AtomicBool>,
    stalled: Arc<AtomicBool>,
    precheck_delay_ms: Arc<AtomicU64>,
    insert_attempts: Arc<AtomicUsize>,
}

impl InMemorySeatLedger {
    /// Create an empty ledger stamping tickets with wall-clock time
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty ledger with an injected clock
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(Vec::new())),
            clock,
            offline: Arc::new(AtomicBool::new(false)),
            stale_precheck: Arc::new(AtomicBool::new(false)),
            stalled: Arc::new(AtomicBool::new(false)),
            precheck_delay_ms: Arc::new(AtomicU64::new(0)),
            insert_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every operation fail with [`LedgerError::Storage`].
    ///
    /// Useful for exercising 500/503 paths.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make [`SeatLedger::find_active`] always report a free seat.
    ///
    /// Simulates a pre-check that lost the race against a concurrent insert,
    /// so only the insert-time constraint can reject the booking.
    pub fn set_stale_precheck(&self, stale: bool) {
        self.stale_precheck.store(stale, Ordering::SeqCst);
    }

    /// Make every operation hang without ever completing.
    ///
    /// Stands in for a database that accepts the query and never answers.
    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    /// Pause between answering [`SeatLedger::find_active`] and returning.
    ///
    /// The answer is computed before the pause and the lock is released, so
    /// concurrent bookings can all pass the pre-check before any of them
    /// reaches `insert`.
    pub fn set_precheck_delay(&self, delay: Duration) {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.precheck_delay_ms.store(ms, Ordering::SeqCst);
    }

    /// Number of `insert` calls received, successful or not
    #[must_use]
    pub fn insert_attempts(&self) -> usize {
        self.insert_attempts.load(Ordering::SeqCst)
    }

    /// Snapshot of every stored ticket in insertion order
    #[must_use]
    pub fn tickets(&self) -> Vec<Ticket> {
        self.rows.lock().map(|rows| rows.clone()).unwrap_or_default()
    }

    /// Number of reserved tickets for a (showtime, seat) pair
    #[must_use]
    pub fn reserved_count(&self, showtime_id: ShowtimeId, seat: &str) -> usize {
        self.tickets()
            .iter()
            .filter(|t| t.showtime_id == showtime_id && t.seat == seat && t.status.holds_seat())
            .count()
    }

    async fn stall_if_set(&self) {
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }

    fn guard(&self) -> Result<MutexGuard<'_, Vec<Ticket>>, LedgerError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(LedgerError::Storage("ledger is offline".to_string()));
        }
        self.rows
            .lock()
            .map_err(|_| LedgerError::Storage("ledger lock poisoned".to_string()))
    }

    fn newest_first(mut tickets: Vec<Ticket>) -> Vec<Ticket> {
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        tickets
    }
}

impl Default for InMemorySeatLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl SeatLedger for InMemorySeatLedger {
    fn insert(&self, ticket: NewTicket) -> LedgerFuture<'_, Ticket> {
        Box::pin(async move {
            self.insert_attempts.fetch_add(1, Ordering::SeqCst);
            self.stall_if_set().await;
            let mut rows = self.guard()?;

            let taken = rows.iter().any(|t| {
                t.showtime_id == ticket.showtime_id
                    && t.seat == ticket.seat
                    && t.status.holds_seat()
            });
            if taken {
                return Err(LedgerError::SeatTaken {
                    showtime_id: ticket.showtime_id,
                    seat: ticket.seat,
                });
            }

            let id = rows.last().map_or(1, |t| t.id.get() + 1);
            let stored = Ticket {
                id: TicketId::new(id),
                user_id: ticket.user_id,
                showtime_id: ticket.showtime_id,
                seat: ticket.seat,
                status: TicketStatus::Reserved,
                price: ticket.price,
                created_at: self.clock.now(),
            };
            rows.push(stored.clone());
            Ok(stored)
        })
    }

    fn find_active<'a>(
        &'a self,
        showtime_id: ShowtimeId,
        seat: &'a str,
    ) -> LedgerFuture<'a, Option<Ticket>> {
        Box::pin(async move {
            self.stall_if_set().await;
            let found = {
                let rows = self.guard()?;
                if self.stale_precheck.load(Ordering::SeqCst) {
                    None
                } else {
                    rows.iter()
                        .find(|t| {
                            t.showtime_id == showtime_id && t.seat == seat && t.status.holds_seat()
                        })
                        .cloned()
                }
            };

            let delay = self.precheck_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            Ok(found)
        })
    }

    fn list_all(&self) -> LedgerFuture<'_, Vec<Ticket>> {
        Box::pin(async move {
            self.stall_if_set().await;
            let rows = self.guard()?.clone();
            Ok(Self::newest_first(rows))
        })
    }

    fn list_by_user(&self, user_id: UserId) -> LedgerFuture<'_, Vec<Ticket>> {
        Box::pin(async move {
            self.stall_if_set().await;
            let rows: Vec<Ticket> = self
                .guard()?
                .iter()
                .filter(|t| t.user_id == user_id)
                .cloned()
                .collect();
            Ok(Self::newest_first(rows))
        })
    }

    fn cancel(&self, ticket_id: TicketId) -> LedgerFuture<'_, Ticket> {
        Box::pin(async move {
            self.stall_if_set().await;
            let mut rows = self.guard()?;
            let ticket = rows
                .iter_mut()
                .find(|t| t.id == ticket_id)
                .ok_or(LedgerError::NotFound(ticket_id))?;
            ticket.status = TicketStatus::Cancelled;
            Ok(ticket.clone())
        })
    }

    fn ping(&self) -> LedgerFuture<'_, ()> {
        Box::pin(async move {
            self.stall_if_set().await;
            self.guard()?;
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::FixedClock;
    use chrono::{TimeZone, Utc};
    use cinema_core::Decimal;

    fn new_ticket(user: i64, showtime: i64, seat: &str) -> NewTicket {
        NewTicket {
            user_id: UserId::new(user),
            showtime_id: ShowtimeId::new(showtime),
            seat: seat.to_string(),
            price: Decimal::new(10, 0),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let ledger = InMemorySeatLedger::new();
        let first = ledger.insert(new_ticket(1, 10, "A1")).await.unwrap();
        let second = ledger.insert(new_ticket(1, 10, "A2")).await.unwrap();

        assert_eq!(first.status, TicketStatus::Reserved);
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_duplicate_seat_is_rejected_for_any_user() {
        let ledger = InMemorySeatLedger::new();
        ledger.insert(new_ticket(1, 10, "A1")).await.unwrap();

        let err = ledger.insert(new_ticket(2, 10, "A1")).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::SeatTaken {
                showtime_id: ShowtimeId::new(10),
                seat: "A1".to_string()
            }
        );

        // Same seat label, different showtime is a different seat
        assert!(ledger.insert(new_ticket(2, 11, "A1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_seat_can_be_rebooked() {
        let ledger = InMemorySeatLedger::new();
        let ticket = ledger.insert(new_ticket(1, 10, "A1")).await.unwrap();

        let cancelled = ledger.cancel(ticket.id).await.unwrap();
        assert_eq!(cancelled.status, TicketStatus::Cancelled);
        assert!(ledger.find_active(ShowtimeId::new(10), "A1").await.unwrap().is_none());

        let rebooked = ledger.insert(new_ticket(2, 10, "A1")).await.unwrap();
        assert_eq!(rebooked.user_id, UserId::new(2));
        assert_eq!(ledger.reserved_count(ShowtimeId::new(10), "A1"), 1);
        assert_eq!(ledger.tickets().len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_unknown_ticket() {
        let ledger = InMemorySeatLedger::new();
        let err = ledger.cancel(TicketId::new(42)).await.unwrap_err();
        assert_eq!(err, LedgerError::NotFound(TicketId::new(42)));
    }

    #[tokio::test]
    async fn test_lists_are_newest_first() {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(base));
        let ledger = InMemorySeatLedger::with_clock(clock.clone());

        ledger.insert(new_ticket(1, 10, "A1")).await.unwrap();
        clock.advance(chrono::Duration::seconds(5));
        ledger.insert(new_ticket(2, 10, "A2")).await.unwrap();
        clock.advance(chrono::Duration::seconds(5));
        ledger.insert(new_ticket(1, 10, "A3")).await.unwrap();

        let all: Vec<String> = ledger
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.seat)
            .collect();
        assert_eq!(all, vec!["A3", "A2", "A1"]);

        let mine: Vec<String> = ledger
            .list_by_user(UserId::new(1))
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.seat)
            .collect();
        assert_eq!(mine, vec!["A3", "A1"]);
    }

    #[tokio::test]
    async fn test_offline_ledger_reports_storage_errors() {
        let ledger = InMemorySeatLedger::new();
        ledger.set_offline(true);

        assert!(matches!(ledger.ping().await, Err(LedgerError::Storage(_))));
        assert!(matches!(
            ledger.insert(new_ticket(1, 10, "A1")).await,
            Err(LedgerError::Storage(_))
        ));

        ledger.set_offline(false);
        assert!(ledger.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_stale_precheck_still_enforces_constraint() {
        let ledger = InMemorySeatLedger::new();
        ledger.insert(new_ticket(1, 10, "A1")).await.unwrap();
        ledger.set_stale_precheck(true);

        assert!(ledger.find_active(ShowtimeId::new(10), "A1").await.unwrap().is_none());
        assert!(matches!(
            ledger.insert(new_ticket(2, 10, "A1")).await,
            Err(LedgerError::SeatTaken { .. })
        ));
        assert_eq!(ledger.insert_attempts(), 2);
    }

    #[tokio::test]
    async fn test_stalled_ledger_never_answers() {
        let ledger = InMemorySeatLedger::new();
        ledger.set_stalled(true);

        let wait = Duration::from_millis(50);
        assert!(tokio::time::timeout(wait, ledger.ping()).await.is_err());
        assert!(
            tokio::time::timeout(wait, ledger.insert(new_ticket(1, 10, "A1")))
                .await
                .is_err()
        );

        ledger.set_stalled(false);
        assert!(ledger.ping().await.is_ok());
        assert!(ledger.tickets().is_empty());
    }

    #[tokio::test]
    async fn test_precheck_delay_releases_lock() {
        let ledger = InMemorySeatLedger::new();
        ledger.set_precheck_delay(Duration::from_millis(100));

        let (found, inserted) = tokio::join!(
            ledger.find_active(ShowtimeId::new(10), "A1"),
            ledger.insert(new_ticket(1, 10, "A1")),
        );

        // The pre-check answered before the insert landed
        assert!(found.unwrap().is_none());
        assert!(inserted.is_ok());
        assert!(ledger.find_active(ShowtimeId::new(10), "A1").await.unwrap().is_some());
    }
}
