// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use coffer::engine::{Engine, Mutation};
use coffer::models::{BALANCE_WINDOW, BalanceEntry, BalanceKind};
use coffer::requests::MemoryRequestLedger;
use coffer::store::{FileStore, SqliteStore};
use rust_decimal::Decimal;
use std::sync::Arc;

fn sqlite_engine() -> Engine {
    let store = SqliteStore::open_in_memory().unwrap();
    let requests = store.request_ledger();
    Engine::new(Arc::new(store), Arc::new(requests))
}

fn manual(total: Decimal, previous: Decimal, n: usize) -> BalanceEntry {
    BalanceEntry {
        date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        kind: BalanceKind::Manual,
        amount: total - previous,
        total,
        ref_id: format!("adj-{}", n),
    }
}

#[test]
fn chain_holds_over_manual_adjustments() {
    let engine = sqlite_engine();
    let mut previous = Decimal::ZERO;
    for n in 0..20 {
        let total = Decimal::from((n * 7 % 13) as i64) - Decimal::from(n as i64);
        engine
            .apply_mutation(
                "alice",
                &format!("req-{}", n),
                Mutation::AppendBalance(manual(total, previous, n)),
            )
            .unwrap();
        previous = total;
    }

    let history = engine.balance_history("alice").unwrap();
    assert_eq!(history.len(), 20);
    // Entry n's total equals entry n+1's (older) total plus entry n's delta.
    for pair in history.windows(2) {
        assert_eq!(pair[0].total, pair[1].total + pair[0].amount);
    }
}

#[test]
fn window_caps_at_100_most_recent() {
    let engine = sqlite_engine();
    let mut previous = Decimal::ZERO;
    for n in 0..(BALANCE_WINDOW + 20) {
        let total = Decimal::from(n as i64);
        engine
            .apply_mutation(
                "alice",
                &format!("req-{}", n),
                Mutation::AppendBalance(manual(total, previous, n)),
            )
            .unwrap();
        previous = total;
    }

    let history = engine.balance_history("alice").unwrap();
    assert_eq!(history.len(), BALANCE_WINDOW);
    // Most recent first; the oldest 20 fell off.
    assert_eq!(history[0].total, Decimal::from((BALANCE_WINDOW + 19) as i64));
    assert_eq!(history[99].total, Decimal::from(20));
}

#[test]
fn file_backend_keeps_legacy_positional_rows() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let engine = Engine::new(Arc::new(store), Arc::new(MemoryRequestLedger::new()));

    engine
        .apply_mutation(
            "alice",
            "req-1",
            Mutation::AppendBalance(manual(Decimal::from(40), Decimal::ZERO, 1)),
        )
        .unwrap();

    // On disk the entry is the legacy tuple [date, kind, amount, total, id].
    let raw = std::fs::read_to_string(dir.path().join("alice").join("balance.json")).unwrap();
    let rows: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let row = &rows.as_array().unwrap()[0];
    let row = row.as_array().unwrap();
    assert_eq!(row.len(), 5);
    assert_eq!(row[0], "2025-01-01");
    assert_eq!(row[1], "manual");
    assert_eq!(row[4], "adj-1");

    // And it round-trips into the named struct.
    let history = engine.balance_history("alice").unwrap();
    assert_eq!(history[0].total, Decimal::from(40));
    assert_eq!(history[0].kind, BalanceKind::Manual);
}
