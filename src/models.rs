// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category key that can never be deleted.
pub const PROTECTED_CATEGORY: &str = "Other";

/// Balance history is a most-recent-first window of at most this many entries.
pub const BALANCE_WINDOW: usize = 100;

/// The five record collections a ledger owner has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Expenses,
    Incomes,
    Obligations,
    BalanceHistory,
    Categories,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Expenses => "expenses",
            Collection::Incomes => "incomes",
            Collection::Obligations => "obligations",
            Collection::BalanceHistory => "balance",
            Collection::Categories => "categories",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub category: String,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
}

impl Expense {
    pub fn validate(&self) -> Result<()> {
        validate_record(&self.id, &self.category)?;
        validate_amount(self.amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Income {
    pub id: String,
    pub category: String,
    pub before_tax: Decimal,
    pub after_tax: Decimal,
    pub description: String,
    pub date: NaiveDate,
}

impl Income {
    /// The effective ledger amount is the after-tax figure.
    pub fn amount(&self) -> Decimal {
        self.after_tax
    }

    /// Derived, never stored. Zero when `before_tax` is zero.
    pub fn tax_percentage(&self) -> Decimal {
        if self.before_tax.is_zero() {
            return Decimal::ZERO;
        }
        (self.before_tax - self.after_tax) / self.before_tax * Decimal::from(100)
    }

    pub fn validate(&self) -> Result<()> {
        validate_record(&self.id, &self.category)?;
        validate_amount(self.before_tax)?;
        validate_amount(self.after_tax)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceKind {
    Expense,
    Income,
    Manual,
}

impl BalanceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceKind::Expense => "expense",
            BalanceKind::Income => "income",
            BalanceKind::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "expense" => Ok(BalanceKind::Expense),
            "income" => Ok(BalanceKind::Income),
            "manual" => Ok(BalanceKind::Manual),
            other => Err(Error::Validation(format!("unknown balance kind '{}'", other))),
        }
    }
}

/// One row of the running-balance history. `total` is the balance *after*
/// applying `amount`; `ref_id` correlates the entry with the ledger record
/// that produced it (or a fresh id for manual corrections).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub date: NaiveDate,
    pub kind: BalanceKind,
    pub amount: Decimal,
    pub total: Decimal,
    pub ref_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Day,
    Week,
    Month,
    Year,
}

impl IntervalUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalUnit::Day => "day",
            IntervalUnit::Week => "week",
            IntervalUnit::Month => "month",
            IntervalUnit::Year => "year",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "day" => Ok(IntervalUnit::Day),
            "week" => Ok(IntervalUnit::Week),
            "month" => Ok(IntervalUnit::Month),
            "year" => Ok(IntervalUnit::Year),
            other => Err(Error::Validation(format!(
                "unknown interval unit '{}' (use day|week|month|year)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Recurrence {
    OneTime,
    Repeating { every: u32, unit: IntervalUnit },
}

/// A scheduled future expense. Either present (active) or absent (terminated);
/// there is no paused state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obligation {
    pub id: String,
    pub category: String,
    pub amount: Decimal,
    pub description: String,
    pub due_date: NaiveDate,
    pub recurrence: Recurrence,
}

impl Obligation {
    pub fn validate(&self) -> Result<()> {
        validate_record(&self.id, &self.category)?;
        validate_amount(self.amount)?;
        if let Recurrence::Repeating { every: 0, .. } = self.recurrence {
            return Err(Error::Validation(
                "repeating obligation needs a positive interval".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub key: String,
    pub label: String,
}

fn validate_record(id: &str, category: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::Validation("record id must not be empty".into()));
    }
    if category.trim().is_empty() {
        return Err(Error::Validation("category must not be empty".into()));
    }
    Ok(())
}

fn validate_amount(amount: Decimal) -> Result<()> {
    if amount.is_sign_negative() {
        return Err(Error::Validation(format!(
            "amount must not be negative, got {}",
            amount
        )));
    }
    Ok(())
}
