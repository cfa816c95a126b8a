// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Single entry point for every ledger mutation and read. Mutations pass
//! through the request ledger first, so replaying a request id is a
//! successful no-op; writes for one (owner, collection) pair are serialized
//! through an arena-style lock table because replaces are read-modify-write
//! over the whole collection.

use crate::diff::{self, LedgerDiff};
use crate::error::{Error, Result};
use crate::models::{
    BalanceEntry, BalanceKind, Category, Collection, Expense, Income, Obligation, Recurrence,
};
use crate::requests::RequestLedger;
use crate::schedule::{self, ActivationReport, RECURRING_SUFFIX};
use crate::store::LedgerStore;
use chrono::{DateTime, Local, NaiveDate};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Result of an accepted mutation. A duplicate is success without side
/// effects, not an error: the caller already got what it asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Duplicate,
}

#[derive(Debug, Clone)]
pub enum Mutation {
    ReplaceExpenses(Vec<Expense>),
    ReplaceIncomes(Vec<Income>),
    AddObligation(Obligation),
    RemoveObligation { id: String },
    RescheduleObligation { id: String, due_date: NaiveDate },
    AppendBalance(BalanceEntry),
    AddCategory { key: String, label: String },
    RemoveCategories { keys: Vec<String> },
    ReassignCategory { from: String, to: String },
}

impl Mutation {
    fn collection(&self) -> Collection {
        match self {
            Mutation::ReplaceExpenses(_) => Collection::Expenses,
            Mutation::ReplaceIncomes(_) => Collection::Incomes,
            Mutation::AddObligation(_)
            | Mutation::RemoveObligation { .. }
            | Mutation::RescheduleObligation { .. } => Collection::Obligations,
            Mutation::AppendBalance(_) => Collection::BalanceHistory,
            Mutation::AddCategory { .. }
            | Mutation::RemoveCategories { .. }
            | Mutation::ReassignCategory { .. } => Collection::Categories,
        }
    }

    /// Rejected before any write, and before the request id is recorded.
    fn validate(&self) -> Result<()> {
        match self {
            Mutation::ReplaceExpenses(rows) => {
                for e in rows {
                    e.validate()?;
                }
                ensure_unique_ids(rows.iter().map(|e| e.id.as_str()))
            }
            Mutation::ReplaceIncomes(rows) => {
                for i in rows {
                    i.validate()?;
                }
                ensure_unique_ids(rows.iter().map(|i| i.id.as_str()))
            }
            Mutation::AddObligation(ob) => ob.validate(),
            Mutation::RemoveObligation { id } | Mutation::RescheduleObligation { id, .. } => {
                if id.trim().is_empty() {
                    return Err(Error::Validation("obligation id must not be empty".into()));
                }
                Ok(())
            }
            Mutation::AppendBalance(entry) => {
                if entry.ref_id.trim().is_empty() {
                    return Err(Error::Validation("balance ref id must not be empty".into()));
                }
                Ok(())
            }
            Mutation::AddCategory { key, .. } => {
                if key.trim().is_empty() {
                    return Err(Error::Validation("category key must not be empty".into()));
                }
                Ok(())
            }
            Mutation::RemoveCategories { .. } => Ok(()),
            Mutation::ReassignCategory { from, to } => {
                if from.trim().is_empty() || to.trim().is_empty() {
                    return Err(Error::Validation("category keys must not be empty".into()));
                }
                Ok(())
            }
        }
    }
}

fn activation_guard_key(obligation_id: &str, due: NaiveDate) -> String {
    format!("sched:{}:{}", obligation_id, due)
}

fn ensure_unique_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(Error::Validation(format!("duplicate record id '{}'", id)));
        }
    }
    Ok(())
}

pub struct Engine {
    store: Arc<dyn LedgerStore>,
    requests: Arc<dyn RequestLedger>,
    locks: Mutex<HashMap<(String, Collection), Arc<Mutex<()>>>>,
}

impl Engine {
    pub fn new(store: Arc<dyn LedgerStore>, requests: Arc<dyn RequestLedger>) -> Self {
        Self {
            store,
            requests,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &dyn LedgerStore {
        self.store.as_ref()
    }

    fn lock_for(&self, owner: &str, collection: Collection) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            locks
                .entry((owner.to_string(), collection))
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Apply a client mutation at most once per request id. Replays return
    /// [`Outcome::Duplicate`] without touching storage. If the mutation fails
    /// after the id was recorded, the id is released again so the client can
    /// retry with the same id.
    pub fn apply_mutation(
        &self,
        owner: &str,
        request_id: &str,
        mutation: Mutation,
    ) -> Result<Outcome> {
        if request_id.trim().is_empty() {
            return Err(Error::Validation("request id must not be empty".into()));
        }
        mutation.validate()?;
        if !self.requests.check_and_record(request_id, owner)? {
            tracing::debug!(request_id, owner, "duplicate request, skipping");
            return Ok(Outcome::Duplicate);
        }
        let lock = self.lock_for(owner, mutation.collection());
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        match self.apply(owner, mutation) {
            Ok(()) => Ok(Outcome::Applied),
            Err(e) => {
                if let Err(forget_err) = self.requests.forget(request_id) {
                    tracing::warn!(request_id, %forget_err, "could not release failed request id");
                }
                Err(e)
            }
        }
    }

    fn apply(&self, owner: &str, mutation: Mutation) -> Result<()> {
        match mutation {
            Mutation::ReplaceExpenses(rows) => self.store.replace_expenses(owner, &rows),
            Mutation::ReplaceIncomes(rows) => self.store.replace_incomes(owner, &rows),
            Mutation::AddObligation(ob) => {
                self.store.append_obligation(owner, &ob)?;
                self.release_activation_guard(&ob.id, ob.due_date);
                Ok(())
            }
            Mutation::RemoveObligation { id } => self.store.remove_obligation(owner, &id),
            Mutation::RescheduleObligation { id, due_date } => {
                self.store.reschedule_obligation(owner, &id, due_date)?;
                self.release_activation_guard(&id, due_date);
                Ok(())
            }
            Mutation::AppendBalance(entry) => self.store.append_balance(owner, &entry),
            Mutation::AddCategory { key, label } => self.store.add_category(owner, &key, &label),
            Mutation::RemoveCategories { keys } => self.store.remove_categories(owner, &keys),
            Mutation::ReassignCategory { from, to } => {
                self.store.reassign_category(owner, &from, &to)
            }
        }
    }

    pub fn expenses(&self, owner: &str) -> Result<Vec<Expense>> {
        self.store.expenses(owner)
    }

    pub fn incomes(&self, owner: &str) -> Result<Vec<Income>> {
        self.store.incomes(owner)
    }

    pub fn obligations(&self, owner: &str) -> Result<Vec<Obligation>> {
        self.store.obligations(owner)
    }

    pub fn balance_history(&self, owner: &str) -> Result<Vec<BalanceEntry>> {
        self.store.balance_history(owner)
    }

    pub fn categories(&self, owner: &str) -> Result<Vec<Category>> {
        self.store.categories(owner)
    }

    /// Running balance: the most recent entry's total, zero for a fresh owner.
    pub fn balance_total(&self, owner: &str) -> Result<Decimal> {
        Ok(self
            .store
            .balance_history(owner)?
            .first()
            .map(|e| e.total)
            .unwrap_or(Decimal::ZERO))
    }

    /// Read-only reconciliation of this engine's backend against another one.
    /// Never invoked automatically; an operator asks for it.
    pub fn compute_diff(&self, owner: &str, remote: &dyn LedgerStore) -> Result<LedgerDiff> {
        Ok(LedgerDiff {
            expenses: diff::diff_records(&self.store.expenses(owner)?, &remote.expenses(owner)?)?,
            incomes: diff::diff_records(&self.store.incomes(owner)?, &remote.incomes(owner)?)?,
            obligations: diff::diff_records(
                &self.store.obligations(owner)?,
                &remote.obligations(owner)?,
            )?,
            balance: diff::diff_records(
                &diff::project_balance(&self.store.balance_history(owner)?),
                &diff::project_balance(&remote.balance_history(owner)?),
            )?,
            categories: diff::diff_categories(
                &self.store.categories(owner)?,
                &remote.categories(owner)?,
            )?,
        })
    }

    /// Releases the single-flight claim on one (obligation, due date). Called
    /// whenever a due date is set, so an obligation rescheduled back onto a
    /// date it already activated on gets a fresh claim instead of being
    /// skipped forever. Failure to release is logged, never fatal; the
    /// obligation stays consistent either way.
    fn release_activation_guard(&self, obligation_id: &str, due: NaiveDate) {
        let key = activation_guard_key(obligation_id, due);
        if let Err(e) = self.requests.forget(&key) {
            tracing::warn!(obligation = %obligation_id, error = %e, "could not release activation guard");
        }
    }

    /// One activation pass: materialize every due obligation into an expense
    /// plus a balance entry, then advance (repeating) or remove (one-time)
    /// the obligation. Each obligation activates at most once per due date
    /// even when triggers fire concurrently; the guard is a request-ledger
    /// key derived from the obligation id and its due date, and setting a
    /// due date releases any stale claim on it.
    pub fn run_scheduled_activation(
        &self,
        owner: &str,
        now: DateTime<Local>,
    ) -> Result<ActivationReport> {
        let today = now.date_naive();
        let mut report = ActivationReport::default();

        for ob in self.store.obligations(owner)? {
            if ob.due_date > today {
                continue;
            }
            let guard_key = activation_guard_key(&ob.id, ob.due_date);
            if !self.requests.check_and_record(&guard_key, owner)? {
                tracing::debug!(obligation = %ob.id, "activation already claimed");
                continue;
            }
            match self.activate(owner, &ob, &now, &mut report) {
                Ok(()) => {}
                Err(e) => {
                    // The expense may already be written while the obligation
                    // is still due. Releasing the guard lets the next trigger
                    // re-activate, which can produce a duplicate expense; a
                    // stuck guard would instead leave the obligation due
                    // forever. Known re-entrancy hazard.
                    tracing::warn!(
                        obligation = %ob.id,
                        error = %e,
                        "activation failed mid-way; next trigger may duplicate the expense"
                    );
                    if let Err(forget_err) = self.requests.forget(&guard_key) {
                        tracing::warn!(%forget_err, "could not release activation guard");
                    }
                    return Err(e);
                }
            }
        }
        Ok(report)
    }

    fn activate(
        &self,
        owner: &str,
        ob: &Obligation,
        now: &DateTime<Local>,
        report: &mut ActivationReport,
    ) -> Result<()> {
        // Locks in Collection order; mutations take at most one of these.
        let expense_lock = self.lock_for(owner, Collection::Expenses);
        let _expenses = expense_lock.lock().unwrap_or_else(|e| e.into_inner());
        let obligation_lock = self.lock_for(owner, Collection::Obligations);
        let _obligations = obligation_lock.lock().unwrap_or_else(|e| e.into_inner());
        let balance_lock = self.lock_for(owner, Collection::BalanceHistory);
        let _balance = balance_lock.lock().unwrap_or_else(|e| e.into_inner());

        let record_id = Uuid::new_v4().to_string();
        let description = format!(
            "{}{}",
            schedule::resolve_tokens(&ob.description, now),
            RECURRING_SUFFIX
        );

        let mut rows = self.store.expenses(owner)?;
        rows.push(Expense {
            id: record_id.clone(),
            category: ob.category.clone(),
            amount: ob.amount,
            description,
            date: ob.due_date,
        });
        self.store.replace_expenses(owner, &rows)?;

        let previous = self.balance_total(owner)?;
        self.store.append_balance(
            owner,
            &BalanceEntry {
                date: ob.due_date,
                kind: BalanceKind::Expense,
                amount: -ob.amount,
                total: previous - ob.amount,
                ref_id: record_id,
            },
        )?;

        match ob.recurrence {
            Recurrence::Repeating { every, unit } => {
                let next = schedule::advance_due(ob.due_date, every, unit)?;
                self.store.reschedule_obligation(owner, &ob.id, next)?;
                self.release_activation_guard(&ob.id, next);
                report.next_due.insert(ob.id.clone(), next);
            }
            Recurrence::OneTime => {
                self.store.remove_obligation(owner, &ob.id)?;
            }
        }
        report.applied.push(ob.id.clone());
        Ok(())
    }
}
