//! `PostgreSQL` implementation of [`SeatLedger`].

use chrono::{DateTime, Utc};
use cinema_core::ledger::{LedgerError, LedgerFuture, SeatLedger};
use cinema_core::types::{NewTicket, ShowtimeId, Ticket, TicketId, TicketStatus, UserId};
use rust_decimal::Decimal;
use sqlx::PgPool;

const TICKET_COLUMNS: &str = "id, user_id, showtime_id, seat, status, price, created_at";

/// Row as stored in the `tickets` table.
#[derive(sqlx::FromRow)]
struct TicketRow {
    id: i64,
    user_id: i64,
    showtime_id: i64,
    seat: String,
    status: String,
    price: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = LedgerError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let status: TicketStatus = row
            .status
            .parse()
            .map_err(|e| {
                LedgerError::Storage(format!("Failed to decode ticket {}: {e}", row.id))
            })?;

        Ok(Self {
            id: TicketId::new(row.id),
            user_id: UserId::new(row.user_id),
            showtime_id: ShowtimeId::new(row.showtime_id),
            seat: row.seat,
            status,
            price: row.price,
            created_at: row.created_at,
        })
    }
}

/// SQLSTATE raised when `statement_timeout` cancels a query
const QUERY_CANCELED: &str = "57014";

/// Map a sqlx error, separating time-bound expiry from other failures.
fn query_error(context: &str, err: &sqlx::Error) -> LedgerError {
    let timed_out = match err {
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(QUERY_CANCELED),
        _ => false,
    };

    if timed_out {
        tracing::warn!(error = %err, "{context}: timed out");
        LedgerError::Timeout(format!("{context}: {err}"))
    } else {
        LedgerError::Storage(format!("{context}: {err}"))
    }
}

fn decode_all(rows: Vec<TicketRow>) -> Result<Vec<Ticket>, LedgerError> {
    rows.into_iter().map(Ticket::try_from).collect()
}

/// PostgreSQL-backed seat ledger.
///
/// Uniqueness of reserved seats is enforced by the partial unique index
/// `tickets_active_seat_key`; an insert that violates it is reported as
/// [`LedgerError::SeatTaken`].
#[derive(Clone, Debug)]
pub struct PostgresSeatLedger {
    pool: PgPool,
}

impl PostgresSeatLedger {
    /// Create a ledger over an existing connection pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if a migration fails.
    pub async fn migrate(&self) -> Result<(), LedgerError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| LedgerError::Storage(format!("Migration failed: {e}")))
    }

    /// Access the underlying pool
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl SeatLedger for PostgresSeatLedger {
    fn insert(&self, ticket: NewTicket) -> LedgerFuture<'_, Ticket> {
        Box::pin(async move {
            let sql = format!(
                "INSERT INTO tickets (user_id, showtime_id, seat, status, price)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING {TICKET_COLUMNS}"
            );
            let row: TicketRow = sqlx::query_as(&sql)
                .bind(ticket.user_id.get())
                .bind(ticket.showtime_id.get())
                .bind(&ticket.seat)
                .bind(TicketStatus::Reserved.as_str())
                .bind(ticket.price)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    if let sqlx::Error::Database(db_err) = &e {
                        if db_err.is_unique_violation() {
                            tracing::debug!(
                                showtime_id = %ticket.showtime_id,
                                seat = %ticket.seat,
                                constraint = ?db_err.constraint(),
                                "Insert rejected by seat uniqueness constraint"
                            );
                            return LedgerError::SeatTaken {
                                showtime_id: ticket.showtime_id,
                                seat: ticket.seat.clone(),
                            };
                        }
                    }
                    query_error("Failed to insert ticket", &e)
                })?;

            Ticket::try_from(row)
        })
    }

    fn find_active<'a>(
        &'a self,
        showtime_id: ShowtimeId,
        seat: &'a str,
    ) -> LedgerFuture<'a, Option<Ticket>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {TICKET_COLUMNS} FROM tickets
                 WHERE showtime_id = $1 AND seat = $2 AND status <> $3"
            );
            let row: Option<TicketRow> = sqlx::query_as(&sql)
                .bind(showtime_id.get())
                .bind(seat)
                .bind(TicketStatus::Cancelled.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| query_error("Failed to query seat", &e))?;

            row.map(Ticket::try_from).transpose()
        })
    }

    fn list_all(&self) -> LedgerFuture<'_, Vec<Ticket>> {
        Box::pin(async move {
            let sql =
                format!("SELECT {TICKET_COLUMNS} FROM tickets ORDER BY created_at DESC, id DESC");
            let rows: Vec<TicketRow> = sqlx::query_as(&sql)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| query_error("Failed to query tickets", &e))?;

            decode_all(rows)
        })
    }

    fn list_by_user(&self, user_id: UserId) -> LedgerFuture<'_, Vec<Ticket>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {TICKET_COLUMNS} FROM tickets
                 WHERE user_id = $1
                 ORDER BY created_at DESC, id DESC"
            );
            let rows: Vec<TicketRow> = sqlx::query_as(&sql)
                .bind(user_id.get())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| query_error("Failed to query tickets", &e))?;

            decode_all(rows)
        })
    }

    fn cancel(&self, ticket_id: TicketId) -> LedgerFuture<'_, Ticket> {
        Box::pin(async move {
            let sql = format!(
                "UPDATE tickets SET status = $2
                 WHERE id = $1
                 RETURNING {TICKET_COLUMNS}"
            );
            let row: Option<TicketRow> = sqlx::query_as(&sql)
                .bind(ticket_id.get())
                .bind(TicketStatus::Cancelled.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| query_error("Failed to cancel ticket", &e))?;

            row.ok_or(LedgerError::NotFound(ticket_id))
                .and_then(Ticket::try_from)
        })
    }

    fn ping(&self) -> LedgerFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map(|_| ())
                .map_err(|e| query_error("Database unreachable", &e))
        })
    }
}
