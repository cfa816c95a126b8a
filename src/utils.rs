// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{Error, Result};
use crate::models::Expense;
use chrono::NaiveDate;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("dev.coffer", "Coffer", "coffer"));

/// Platform data dir for the default stores, created on first use.
pub fn data_dir() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2).ok_or_else(|| {
        Error::StorageUnavailable("could not determine platform-specific data dir".into())
    })?;
    let dir = proj.data_dir().to_path_buf();
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| Error::Validation(format!("invalid date '{}', expected YYYY-MM-DD", s)))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|_| Error::Validation(format!("invalid decimal '{}'", s)))
}

/// Monetary amounts are carried with 2-digit cents precision.
pub fn to_cents(d: Decimal) -> Result<i64> {
    (d.round_dp(2) * Decimal::from(100))
        .to_i64()
        .ok_or_else(|| Error::Validation(format!("amount {} out of range", d)))
}

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Per-category expense totals, summed in integer cents so repeated addition
/// cannot accumulate a floating error.
pub fn category_totals(expenses: &[Expense]) -> Result<BTreeMap<String, Decimal>> {
    let mut cents: BTreeMap<String, i64> = BTreeMap::new();
    for e in expenses {
        *cents.entry(e.category.clone()).or_insert(0) += to_cents(e.amount)?;
    }
    Ok(cents.into_iter().map(|(k, v)| (k, from_cents(v))).collect())
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // Arrays emit one line per element, anything else a single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
