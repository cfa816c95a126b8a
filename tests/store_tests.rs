// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use coffer::error::Error;
use coffer::models::{Expense, IntervalUnit, Obligation, Recurrence};
use coffer::store::{FileStore, LedgerStore, SqliteStore};

fn backends() -> (Vec<Box<dyn LedgerStore>>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let stores: Vec<Box<dyn LedgerStore>> = vec![
        Box::new(FileStore::new(dir.path())),
        Box::new(SqliteStore::open_in_memory().unwrap()),
    ];
    (stores, dir)
}

fn expense(id: &str, category: &str, date: NaiveDate) -> Expense {
    Expense {
        id: id.to_string(),
        category: category.to_string(),
        amount: "10.00".parse().unwrap(),
        description: String::new(),
        date,
    }
}

#[test]
fn first_time_owner_reads_empty() {
    let (stores, _dir) = backends();
    for store in &stores {
        assert!(store.expenses("nobody").unwrap().is_empty());
        assert!(store.incomes("nobody").unwrap().is_empty());
        assert!(store.obligations("nobody").unwrap().is_empty());
        assert!(store.balance_history("nobody").unwrap().is_empty());
        assert!(store.categories("nobody").unwrap().is_empty());
    }
}

#[test]
fn expenses_come_back_date_ascending() {
    let (stores, _dir) = backends();
    let d = |day| NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
    for store in &stores {
        store
            .replace_expenses(
                "alice",
                &[expense("b", "Food", d(20)), expense("a", "Food", d(5)), expense("c", "Food", d(11))],
            )
            .unwrap();
        let dates: Vec<NaiveDate> = store
            .expenses("alice")
            .unwrap()
            .iter()
            .map(|e| e.date)
            .collect();
        assert_eq!(dates, vec![d(5), d(11), d(20)]);
    }
}

#[test]
fn protected_category_survives_deletion() {
    let (stores, _dir) = backends();
    for store in &stores {
        store.add_category("alice", "Other", "Other").unwrap();
        store.add_category("alice", "Food", "Food").unwrap();
        store
            .remove_categories("alice", &["Other".to_string(), "Food".to_string()])
            .unwrap();
        let keys: Vec<String> = store
            .categories("alice")
            .unwrap()
            .into_iter()
            .map(|c| c.key)
            .collect();
        assert_eq!(keys, vec!["Other".to_string()]);
    }
}

#[test]
fn duplicate_category_key_rejected() {
    let (stores, _dir) = backends();
    for store in &stores {
        store.add_category("alice", "Food", "Food").unwrap();
        match store.add_category("alice", "Food", "Meals") {
            Err(Error::Validation(_)) => {}
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}

#[test]
fn reassign_then_delete_leaves_no_orphan() {
    let (stores, _dir) = backends();
    let d = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    for store in &stores {
        store.add_category("alice", "Other", "Other").unwrap();
        store.add_category("alice", "Snacks", "Snacks").unwrap();
        store
            .replace_expenses("alice", &[expense("e1", "Snacks", d)])
            .unwrap();
        store
            .append_obligation(
                "alice",
                &Obligation {
                    id: "ob1".to_string(),
                    category: "Snacks".to_string(),
                    amount: "5".parse().unwrap(),
                    description: String::new(),
                    due_date: d,
                    recurrence: Recurrence::Repeating {
                        every: 2,
                        unit: IntervalUnit::Week,
                    },
                },
            )
            .unwrap();

        // Caller's contract: reassign first, then delete.
        store.reassign_category("alice", "Snacks", "Other").unwrap();
        store
            .remove_categories("alice", &["Snacks".to_string()])
            .unwrap();

        let keys: Vec<String> = store
            .categories("alice")
            .unwrap()
            .into_iter()
            .map(|c| c.key)
            .collect();
        assert!(!keys.contains(&"Snacks".to_string()));
        assert!(store.expenses("alice").unwrap().iter().all(|e| e.category == "Other"));
        assert!(
            store
                .obligations("alice")
                .unwrap()
                .iter()
                .all(|o| o.category == "Other")
        );
    }
}

#[test]
fn obligation_roundtrip_and_reschedule() {
    let (stores, _dir) = backends();
    let d = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    for store in &stores {
        store
            .append_obligation(
                "alice",
                &Obligation {
                    id: "ob1".to_string(),
                    category: "Rent".to_string(),
                    amount: "750.00".parse().unwrap(),
                    description: "rent".to_string(),
                    due_date: d,
                    recurrence: Recurrence::Repeating {
                        every: 1,
                        unit: IntervalUnit::Month,
                    },
                },
            )
            .unwrap();

        let next = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        store.reschedule_obligation("alice", "ob1", next).unwrap();
        let rows = store.obligations("alice").unwrap();
        assert_eq!(rows[0].due_date, next);
        assert_eq!(
            rows[0].recurrence,
            Recurrence::Repeating {
                every: 1,
                unit: IntervalUnit::Month
            }
        );

        match store.reschedule_obligation("alice", "missing", next) {
            Err(Error::NotFound(_)) => {}
            other => panic!("expected not found, got {:?}", other),
        }

        store.remove_obligation("alice", "ob1").unwrap();
        assert!(store.obligations("alice").unwrap().is_empty());
        assert!(matches!(
            store.remove_obligation("alice", "ob1"),
            Err(Error::NotFound(_))
        ));
    }
}

#[test]
fn file_replace_snapshots_before_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let d = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

    store
        .replace_expenses("alice", &[expense("e1", "Food", d)])
        .unwrap();
    // First write: nothing existed yet, no snapshot.
    let backups = dir.path().join("alice").join("backups");
    assert!(!backups.exists());

    store
        .replace_expenses("alice", &[expense("e2", "Food", d)])
        .unwrap();
    let snapshots: Vec<_> = std::fs::read_dir(&backups).unwrap().collect();
    assert_eq!(snapshots.len(), 1);

    // The snapshot holds the pre-overwrite state.
    let raw = std::fs::read_to_string(snapshots[0].as_ref().unwrap().path()).unwrap();
    assert!(raw.contains("e1"));
    assert!(!raw.contains("e2"));
}
