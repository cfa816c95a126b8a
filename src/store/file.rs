// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::backup::BackupRotator;
use crate::error::{Error, Result};
use crate::models::{
    BALANCE_WINDOW, BalanceEntry, BalanceKind, Category, Collection, Expense, Income, Obligation,
    PROTECTED_CATEGORY,
};
use crate::store::LedgerStore;
use crate::utils;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File-backed store: one JSON document per collection per owner, rewritten in
/// full on every write. A snapshot is rotated into `backups/` before each
/// overwrite; the overwrite itself goes through a temp file and rename so a
/// failed write leaves the prior document intact.
pub struct FileStore {
    root: PathBuf,
    rotator: BackupRotator,
}

/// Legacy on-disk shape of a balance row: `[date, kind, amount, total, id]`.
/// Kept only at this boundary for byte-compatibility with existing documents;
/// everything above the store works with the named struct.
#[derive(Serialize, Deserialize)]
struct BalanceRow(NaiveDate, BalanceKind, Decimal, Decimal, String);

impl From<&BalanceEntry> for BalanceRow {
    fn from(e: &BalanceEntry) -> Self {
        BalanceRow(e.date, e.kind, e.amount, e.total, e.ref_id.clone())
    }
}

impl From<BalanceRow> for BalanceEntry {
    fn from(r: BalanceRow) -> Self {
        BalanceEntry {
            date: r.0,
            kind: r.1,
            amount: r.2,
            total: r.3,
            ref_id: r.4,
        }
    }
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            rotator: BackupRotator::default(),
        }
    }

    /// Store rooted in the platform data dir.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(utils::data_dir()?.join("ledger")))
    }

    fn collection_path(&self, owner: &str, collection: Collection) -> PathBuf {
        self.root
            .join(owner)
            .join(format!("{}.json", collection.as_str()))
    }

    fn read<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        let parsed = serde_json::from_str(&raw).map_err(|e| {
            Error::StorageUnavailable(format!("corrupt document {}: {}", path.display(), e))
        })?;
        Ok(Some(parsed))
    }

    /// Snapshot, then write through a temp file and rename into place.
    fn write<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        self.rotator.rotate(path)?;
        let parent = path
            .parent()
            .ok_or_else(|| Error::StorageUnavailable(format!("no parent for {}", path.display())))?;
        fs::create_dir_all(parent)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(value)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn list_sorted<T: DeserializeOwned>(
        &self,
        owner: &str,
        collection: Collection,
        date_of: impl Fn(&T) -> NaiveDate,
    ) -> Result<Vec<T>> {
        let mut rows: Vec<T> = self
            .read(&self.collection_path(owner, collection))?
            .unwrap_or_default();
        rows.sort_by_key(|r| date_of(r));
        Ok(rows)
    }

    fn category_map(&self, owner: &str) -> Result<BTreeMap<String, String>> {
        Ok(self
            .read(&self.collection_path(owner, Collection::Categories))?
            .unwrap_or_default())
    }
}

impl LedgerStore for FileStore {
    fn expenses(&self, owner: &str) -> Result<Vec<Expense>> {
        self.list_sorted(owner, Collection::Expenses, |e: &Expense| e.date)
    }

    fn replace_expenses(&self, owner: &str, rows: &[Expense]) -> Result<()> {
        self.write(&self.collection_path(owner, Collection::Expenses), &rows)
    }

    fn incomes(&self, owner: &str) -> Result<Vec<Income>> {
        self.list_sorted(owner, Collection::Incomes, |i: &Income| i.date)
    }

    fn replace_incomes(&self, owner: &str, rows: &[Income]) -> Result<()> {
        self.write(&self.collection_path(owner, Collection::Incomes), &rows)
    }

    fn obligations(&self, owner: &str) -> Result<Vec<Obligation>> {
        self.list_sorted(owner, Collection::Obligations, |o: &Obligation| o.due_date)
    }

    fn append_obligation(&self, owner: &str, row: &Obligation) -> Result<()> {
        let path = self.collection_path(owner, Collection::Obligations);
        let mut rows: Vec<Obligation> = self.read(&path)?.unwrap_or_default();
        rows.push(row.clone());
        self.write(&path, &rows)
    }

    fn remove_obligation(&self, owner: &str, id: &str) -> Result<()> {
        let path = self.collection_path(owner, Collection::Obligations);
        let mut rows: Vec<Obligation> = self.read(&path)?.unwrap_or_default();
        let before = rows.len();
        rows.retain(|o| o.id != id);
        if rows.len() == before {
            return Err(Error::NotFound(format!("obligation '{}'", id)));
        }
        self.write(&path, &rows)
    }

    fn reschedule_obligation(&self, owner: &str, id: &str, due_date: NaiveDate) -> Result<()> {
        let path = self.collection_path(owner, Collection::Obligations);
        let mut rows: Vec<Obligation> = self.read(&path)?.unwrap_or_default();
        let row = rows
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| Error::NotFound(format!("obligation '{}'", id)))?;
        row.due_date = due_date;
        self.write(&path, &rows)
    }

    fn balance_history(&self, owner: &str) -> Result<Vec<BalanceEntry>> {
        let path = self.collection_path(owner, Collection::BalanceHistory);
        let rows: Vec<BalanceRow> = self.read(&path)?.unwrap_or_default();
        Ok(rows
            .into_iter()
            .take(BALANCE_WINDOW)
            .map(BalanceEntry::from)
            .collect())
    }

    fn append_balance(&self, owner: &str, entry: &BalanceEntry) -> Result<()> {
        let path = self.collection_path(owner, Collection::BalanceHistory);
        let mut rows: Vec<BalanceRow> = self.read(&path)?.unwrap_or_default();
        rows.insert(0, BalanceRow::from(entry));
        rows.truncate(BALANCE_WINDOW);
        self.write(&path, &rows)
    }

    fn categories(&self, owner: &str) -> Result<Vec<Category>> {
        Ok(self
            .category_map(owner)?
            .into_iter()
            .map(|(key, label)| Category { key, label })
            .collect())
    }

    fn add_category(&self, owner: &str, key: &str, label: &str) -> Result<()> {
        let path = self.collection_path(owner, Collection::Categories);
        let mut map = self.category_map(owner)?;
        if map.contains_key(key) {
            return Err(Error::Validation(format!("category '{}' already exists", key)));
        }
        map.insert(key.to_string(), label.to_string());
        self.write(&path, &map)
    }

    fn remove_categories(&self, owner: &str, keys: &[String]) -> Result<()> {
        let path = self.collection_path(owner, Collection::Categories);
        let mut map = self.category_map(owner)?;
        for key in keys {
            if key == PROTECTED_CATEGORY {
                continue;
            }
            map.remove(key);
        }
        self.write(&path, &map)
    }

    fn reassign_category(&self, owner: &str, from: &str, to: &str) -> Result<()> {
        let mut expenses = self.expenses(owner)?;
        for e in expenses.iter_mut().filter(|e| e.category == from) {
            e.category = to.to_string();
        }
        self.replace_expenses(owner, &expenses)?;

        let mut incomes = self.incomes(owner)?;
        for i in incomes.iter_mut().filter(|i| i.category == from) {
            i.category = to.to_string();
        }
        self.replace_incomes(owner, &incomes)?;

        let path = self.collection_path(owner, Collection::Obligations);
        let mut obligations: Vec<Obligation> = self.read(&path)?.unwrap_or_default();
        for o in obligations.iter_mut().filter(|o| o.category == from) {
            o.category = to.to_string();
        }
        self.write(&path, &obligations)
    }
}
