//! Property tests for the in-memory seat ledger.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use cinema_core::ledger::{LedgerError, SeatLedger};
use cinema_core::types::{NewTicket, ShowtimeId, UserId};
use cinema_core::Decimal;
use cinema_testing::properties::booking_attempts;
use cinema_testing::InMemorySeatLedger;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("runtime")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Whatever the interleaving, each (showtime, seat) ends with at most one
    /// reserved ticket, and exactly the first-seen pairs succeed.
    #[test]
    fn reserved_tickets_per_seat_never_exceed_one(attempts in booking_attempts(40)) {
        let rt = runtime();
        let ledger = Arc::new(InMemorySeatLedger::new());

        let outcomes = rt.block_on(async {
            let handles: Vec<_> = attempts
                .iter()
                .cloned()
                .map(|(user, showtime, seat)| {
                    let ledger = Arc::clone(&ledger);
                    tokio::spawn(async move {
                        ledger
                            .insert(NewTicket {
                                user_id: UserId::new(user),
                                showtime_id: ShowtimeId::new(showtime),
                                seat,
                                price: Decimal::new(10, 0),
                            })
                            .await
                    })
                })
                .collect();
            futures::future::join_all(handles).await
        });

        let mut successes = 0;
        for outcome in outcomes {
            match outcome.unwrap() {
                Ok(_) => successes += 1,
                Err(LedgerError::SeatTaken { .. }) => {}
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
        }

        let distinct: HashSet<(i64, String)> = attempts
            .iter()
            .map(|(_, showtime, seat)| (*showtime, seat.clone()))
            .collect();
        prop_assert_eq!(successes, distinct.len());

        for (showtime, seat) in &distinct {
            prop_assert_eq!(ledger.reserved_count(ShowtimeId::new(*showtime), seat), 1);
        }
    }
}
