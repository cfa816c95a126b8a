// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::Result;
use crate::models::{BalanceEntry, Category, Expense, Income, Obligation};
use chrono::NaiveDate;

pub mod file;
pub mod sqlite;

pub use file::FileStore;
pub use sqlite::SqliteStore;

/// One contract, two backends. Every operation is scoped by the owning user.
/// Reads for an owner that has never written return empty results, not
/// errors, so first-time users work without a provisioning step. All storage
/// failures surface as [`crate::error::Error::StorageUnavailable`]; a write is
/// durable before the call returns.
pub trait LedgerStore: Send + Sync {
    /// Expenses ordered by date ascending.
    fn expenses(&self, owner: &str) -> Result<Vec<Expense>>;

    /// Full-replace semantics: on failure the prior state stays intact, no
    /// partial write is ever visible to readers.
    fn replace_expenses(&self, owner: &str, rows: &[Expense]) -> Result<()>;

    /// Incomes ordered by date ascending.
    fn incomes(&self, owner: &str) -> Result<Vec<Income>>;

    fn replace_incomes(&self, owner: &str, rows: &[Income]) -> Result<()>;

    fn obligations(&self, owner: &str) -> Result<Vec<Obligation>>;

    fn append_obligation(&self, owner: &str, row: &Obligation) -> Result<()>;

    /// `NotFound` when the id is absent.
    fn remove_obligation(&self, owner: &str, id: &str) -> Result<()>;

    /// Moves the due date and changes nothing else. `NotFound` when absent.
    fn reschedule_obligation(&self, owner: &str, id: &str, due_date: NaiveDate) -> Result<()>;

    /// Most-recent-first, capped at [`crate::models::BALANCE_WINDOW`].
    fn balance_history(&self, owner: &str) -> Result<Vec<BalanceEntry>>;

    /// Appends at the head of the window and prunes the tail past the cap.
    fn append_balance(&self, owner: &str, entry: &BalanceEntry) -> Result<()>;

    fn categories(&self, owner: &str) -> Result<Vec<Category>>;

    /// `Validation` error when the key already exists.
    fn add_category(&self, owner: &str, key: &str, label: &str) -> Result<()>;

    /// Silently skips the protected key; unknown keys are ignored.
    fn remove_categories(&self, owner: &str, keys: &[String]) -> Result<()>;

    /// Rewrites the category of every expense, income, and obligation that
    /// points at `from`. Callers delete a category only after reassigning so
    /// no record is left referencing a deleted key.
    fn reassign_category(&self, owner: &str, from: &str, to: &str) -> Result<()>;
}
