// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{Error, Result};
use crate::models::{
    BALANCE_WINDOW, BalanceEntry, BalanceKind, Category, Expense, Income, IntervalUnit, Obligation,
    PROTECTED_CATEGORY, Recurrence,
};
use crate::requests::SqliteRequestLedger;
use crate::store::LedgerStore;
use crate::utils;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Relational store. The connection is shared behind a mutex so the store (and
/// the request ledger riding on the same database) can be used from concurrent
/// callers; rusqlite connections are not Sync on their own.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::StorageUnavailable(format!("open db at {}: {}", path.display(), e)))?;
        Self::from_connection(conn)
    }

    pub fn open_default() -> Result<Self> {
        Self::open(&utils::data_dir()?.join("coffer.sqlite"))
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Request ledger sharing this store's database, so the `requests` table
    /// lives next to the data it guards.
    pub fn request_ledger(&self) -> SqliteRequestLedger {
        SqliteRequestLedger::new(Arc::clone(&self.conn))
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS expenses(
        user_id TEXT NOT NULL,
        id TEXT NOT NULL,
        category TEXT NOT NULL,
        amount TEXT NOT NULL,
        description TEXT NOT NULL,
        date TEXT NOT NULL,
        PRIMARY KEY(user_id, id)
    );
    CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(user_id, date);

    CREATE TABLE IF NOT EXISTS incomes(
        user_id TEXT NOT NULL,
        id TEXT NOT NULL,
        category TEXT NOT NULL,
        before_tax TEXT NOT NULL,
        after_tax TEXT NOT NULL,
        description TEXT NOT NULL,
        date TEXT NOT NULL,
        PRIMARY KEY(user_id, id)
    );
    CREATE INDEX IF NOT EXISTS idx_incomes_date ON incomes(user_id, date);

    CREATE TABLE IF NOT EXISTS obligations(
        user_id TEXT NOT NULL,
        id TEXT NOT NULL,
        category TEXT NOT NULL,
        amount TEXT NOT NULL,
        description TEXT NOT NULL,
        due_date TEXT NOT NULL,
        recurrence TEXT NOT NULL CHECK(recurrence IN ('one_time','repeating')),
        interval_count INTEGER,
        interval_unit TEXT,
        PRIMARY KEY(user_id, id)
    );

    CREATE TABLE IF NOT EXISTS balance_history(
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        date TEXT NOT NULL,
        kind TEXT NOT NULL CHECK(kind IN ('expense','income','manual')),
        amount TEXT NOT NULL,
        total TEXT NOT NULL,
        ref_id TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_balance_user ON balance_history(user_id, seq);

    CREATE TABLE IF NOT EXISTS categories(
        user_id TEXT NOT NULL,
        key TEXT NOT NULL,
        label TEXT NOT NULL,
        PRIMARY KEY(user_id, key)
    );

    CREATE TABLE IF NOT EXISTS requests(
        request_id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        applied_at TEXT NOT NULL
    );
    "#,
    )?;
    Ok(())
}

fn parse_stored_decimal(s: &str, what: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .map_err(|_| Error::StorageUnavailable(format!("invalid stored {} '{}'", what, s)))
}

impl LedgerStore for SqliteStore {
    fn expenses(&self, owner: &str) -> Result<Vec<Expense>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, category, amount, description, date
             FROM expenses WHERE user_id=?1 ORDER BY date, id",
        )?;
        let mut rows = stmt.query(params![owner])?;
        let mut out = Vec::new();
        while let Some(r) = rows.next()? {
            let amount: String = r.get(2)?;
            out.push(Expense {
                id: r.get(0)?,
                category: r.get(1)?,
                amount: parse_stored_decimal(&amount, "amount")?,
                description: r.get(3)?,
                date: r.get(4)?,
            });
        }
        Ok(out)
    }

    fn replace_expenses(&self, owner: &str, rows: &[Expense]) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM expenses WHERE user_id=?1", params![owner])?;
        for e in rows {
            tx.execute(
                "INSERT INTO expenses(user_id, id, category, amount, description, date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    owner,
                    e.id,
                    e.category,
                    e.amount.round_dp(2).to_string(),
                    e.description,
                    e.date
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn incomes(&self, owner: &str) -> Result<Vec<Income>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, category, before_tax, after_tax, description, date
             FROM incomes WHERE user_id=?1 ORDER BY date, id",
        )?;
        let mut rows = stmt.query(params![owner])?;
        let mut out = Vec::new();
        while let Some(r) = rows.next()? {
            let before: String = r.get(2)?;
            let after: String = r.get(3)?;
            out.push(Income {
                id: r.get(0)?,
                category: r.get(1)?,
                before_tax: parse_stored_decimal(&before, "before_tax")?,
                after_tax: parse_stored_decimal(&after, "after_tax")?,
                description: r.get(4)?,
                date: r.get(5)?,
            });
        }
        Ok(out)
    }

    fn replace_incomes(&self, owner: &str, rows: &[Income]) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM incomes WHERE user_id=?1", params![owner])?;
        for i in rows {
            tx.execute(
                "INSERT INTO incomes(user_id, id, category, before_tax, after_tax, description, date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    owner,
                    i.id,
                    i.category,
                    i.before_tax.round_dp(2).to_string(),
                    i.after_tax.round_dp(2).to_string(),
                    i.description,
                    i.date
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn obligations(&self, owner: &str) -> Result<Vec<Obligation>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, category, amount, description, due_date, recurrence, interval_count, interval_unit
             FROM obligations WHERE user_id=?1 ORDER BY due_date, id",
        )?;
        let mut rows = stmt.query(params![owner])?;
        let mut out = Vec::new();
        while let Some(r) = rows.next()? {
            let amount: String = r.get(2)?;
            let mode: String = r.get(5)?;
            let recurrence = if mode == "repeating" {
                let every: i64 = r.get::<_, Option<i64>>(6)?.unwrap_or(0);
                let unit: Option<String> = r.get(7)?;
                let unit = unit.ok_or_else(|| {
                    Error::StorageUnavailable("repeating obligation without interval unit".into())
                })?;
                Recurrence::Repeating {
                    every: u32::try_from(every).map_err(|_| {
                        Error::StorageUnavailable(format!("invalid interval count {}", every))
                    })?,
                    unit: IntervalUnit::parse(&unit)?,
                }
            } else {
                Recurrence::OneTime
            };
            out.push(Obligation {
                id: r.get(0)?,
                category: r.get(1)?,
                amount: parse_stored_decimal(&amount, "amount")?,
                description: r.get(3)?,
                due_date: r.get(4)?,
                recurrence,
            });
        }
        Ok(out)
    }

    fn append_obligation(&self, owner: &str, row: &Obligation) -> Result<()> {
        let (mode, every, unit) = match row.recurrence {
            Recurrence::OneTime => ("one_time", None, None),
            Recurrence::Repeating { every, unit } => {
                ("repeating", Some(i64::from(every)), Some(unit.as_str()))
            }
        };
        let conn = self.lock();
        conn.execute(
            "INSERT INTO obligations(user_id, id, category, amount, description, due_date,
                                     recurrence, interval_count, interval_unit)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                owner,
                row.id,
                row.category,
                row.amount.round_dp(2).to_string(),
                row.description,
                row.due_date,
                mode,
                every,
                unit
            ],
        )?;
        Ok(())
    }

    fn remove_obligation(&self, owner: &str, id: &str) -> Result<()> {
        let conn = self.lock();
        let n = conn.execute(
            "DELETE FROM obligations WHERE user_id=?1 AND id=?2",
            params![owner, id],
        )?;
        if n == 0 {
            return Err(Error::NotFound(format!("obligation '{}'", id)));
        }
        Ok(())
    }

    fn reschedule_obligation(&self, owner: &str, id: &str, due_date: NaiveDate) -> Result<()> {
        let conn = self.lock();
        let n = conn.execute(
            "UPDATE obligations SET due_date=?3 WHERE user_id=?1 AND id=?2",
            params![owner, id, due_date],
        )?;
        if n == 0 {
            return Err(Error::NotFound(format!("obligation '{}'", id)));
        }
        Ok(())
    }

    fn balance_history(&self, owner: &str) -> Result<Vec<BalanceEntry>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT date, kind, amount, total, ref_id FROM balance_history
             WHERE user_id=?1 ORDER BY seq DESC LIMIT ?2",
        )?;
        let mut rows = stmt.query(params![owner, BALANCE_WINDOW as i64])?;
        let mut out = Vec::new();
        while let Some(r) = rows.next()? {
            let kind: String = r.get(1)?;
            let amount: String = r.get(2)?;
            let total: String = r.get(3)?;
            out.push(BalanceEntry {
                date: r.get(0)?,
                kind: BalanceKind::parse(&kind)?,
                amount: parse_stored_decimal(&amount, "amount")?,
                total: parse_stored_decimal(&total, "total")?,
                ref_id: r.get(4)?,
            });
        }
        Ok(out)
    }

    fn append_balance(&self, owner: &str, entry: &BalanceEntry) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO balance_history(user_id, date, kind, amount, total, ref_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                owner,
                entry.date,
                entry.kind.as_str(),
                entry.amount.round_dp(2).to_string(),
                entry.total.round_dp(2).to_string(),
                entry.ref_id
            ],
        )?;
        // Prune the window past the cap.
        tx.execute(
            "DELETE FROM balance_history WHERE user_id=?1 AND seq NOT IN (
                 SELECT seq FROM balance_history WHERE user_id=?1
                 ORDER BY seq DESC LIMIT ?2
             )",
            params![owner, BALANCE_WINDOW as i64],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn categories(&self, owner: &str) -> Result<Vec<Category>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT key, label FROM categories WHERE user_id=?1 ORDER BY key")?;
        let rows = stmt.query_map(params![owner], |r| {
            Ok(Category {
                key: r.get(0)?,
                label: r.get(1)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn add_category(&self, owner: &str, key: &str, label: &str) -> Result<()> {
        let conn = self.lock();
        let existing: Option<String> = conn
            .query_row(
                "SELECT key FROM categories WHERE user_id=?1 AND key=?2",
                params![owner, key],
                |r| r.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(Error::Validation(format!("category '{}' already exists", key)));
        }
        conn.execute(
            "INSERT INTO categories(user_id, key, label) VALUES (?1, ?2, ?3)",
            params![owner, key, label],
        )?;
        Ok(())
    }

    fn remove_categories(&self, owner: &str, keys: &[String]) -> Result<()> {
        let conn = self.lock();
        for key in keys {
            if key == PROTECTED_CATEGORY {
                continue;
            }
            conn.execute(
                "DELETE FROM categories WHERE user_id=?1 AND key=?2",
                params![owner, key],
            )?;
        }
        Ok(())
    }

    fn reassign_category(&self, owner: &str, from: &str, to: &str) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        for table in ["expenses", "incomes", "obligations"] {
            tx.execute(
                &format!("UPDATE {} SET category=?3 WHERE user_id=?1 AND category=?2", table),
                params![owner, from, to],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
