// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-only three-way diff between two snapshots of the same logical ledger,
//! one per backend. Records are indexed by id, so the result is independent
//! of input ordering; field comparison goes through a normalized form where
//! `"12.50"`, `" 12.5"`, and the number `12.5` are all equal.

use crate::error::{Error, Result};
use crate::models::{BalanceEntry, Category};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct DiffReport {
    pub only_left: Vec<Value>,
    pub only_right: Vec<Value>,
    pub modified: Vec<ModifiedPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModifiedPair {
    pub id: String,
    pub left: Value,
    pub right: Value,
}

impl DiffReport {
    pub fn is_clean(&self) -> bool {
        self.only_left.is_empty() && self.only_right.is_empty() && self.modified.is_empty()
    }
}

/// Per-collection reports for one owner across both backends.
#[derive(Debug, Default, Serialize)]
pub struct LedgerDiff {
    pub expenses: DiffReport,
    pub incomes: DiffReport,
    pub obligations: DiffReport,
    pub balance: DiffReport,
    pub categories: DiffReport,
}

impl LedgerDiff {
    pub fn is_clean(&self) -> bool {
        self.expenses.is_clean()
            && self.incomes.is_clean()
            && self.obligations.is_clean()
            && self.balance.is_clean()
            && self.categories.is_clean()
    }
}

/// Diff two snapshots of one collection. Records are any serializable rows
/// carrying a string `id` field; the id is excluded from field comparison.
pub fn diff_records<T: Serialize>(left: &[T], right: &[T]) -> Result<DiffReport> {
    let left = index_by_id(left)?;
    let right = index_by_id(right)?;

    let mut report = DiffReport::default();
    for (id, l) in &left {
        match right.get(id) {
            None => report.only_left.push(l.clone()),
            Some(r) => {
                if normalize(&without_id(l)) != normalize(&without_id(r)) {
                    report.modified.push(ModifiedPair {
                        id: id.clone(),
                        left: l.clone(),
                        right: r.clone(),
                    });
                }
            }
        }
    }
    for (id, r) in &right {
        if !left.contains_key(id) {
            report.only_right.push(r.clone());
        }
    }
    Ok(report)
}

/// Categories diff by key set plus normalized label equality.
pub fn diff_categories(left: &[Category], right: &[Category]) -> Result<DiffReport> {
    let as_values: fn(&[Category]) -> Vec<Value> = |side| {
        side.iter()
            .map(|c| json!({ "id": c.key, "label": c.label }))
            .collect()
    };
    diff_records(&as_values(left), &as_values(right))
}

/// Balance entries are projected into the common record shape before diffing;
/// their native form is positional in the legacy file layout.
pub fn project_balance(entries: &[BalanceEntry]) -> Vec<Value> {
    entries
        .iter()
        .map(|e| {
            json!({
                "id": e.ref_id,
                "date": e.date,
                "type": e.kind,
                "amount": e.amount,
                "total": e.total,
            })
        })
        .collect()
}

fn index_by_id<T: Serialize>(rows: &[T]) -> Result<BTreeMap<String, Value>> {
    let mut index = BTreeMap::new();
    for row in rows {
        let value = serde_json::to_value(row)?;
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Validation("record has no string 'id' field".into()))?
            .to_string();
        index.insert(id, value);
    }
    Ok(index)
}

fn without_id(v: &Value) -> Value {
    let mut v = v.clone();
    if let Some(obj) = v.as_object_mut() {
        obj.remove("id");
    }
    v
}

/// Canonical form for comparison: strings are trimmed and, when they parse
/// fully as a decimal, collapsed to the decimal's normalized rendering;
/// numbers go through the same rendering so `12.5` meets `"12.50"`. Object
/// keys compare in lexicographic order (serde_json maps are ordered).
fn normalize(v: &Value) -> Value {
    match v {
        Value::String(s) => {
            let trimmed = s.trim();
            match trimmed.parse::<Decimal>() {
                Ok(d) => Value::String(d.normalize().to_string()),
                Err(_) => Value::String(trimmed.to_string()),
            }
        }
        Value::Number(n) => match n.to_string().parse::<Decimal>() {
            Ok(d) => Value::String(d.normalize().to_string()),
            Err(_) => v.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, item)| (k.clone(), normalize(item)))
                .collect(),
        ),
        _ => v.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_decimals_normalize_equal() {
        assert_eq!(normalize(&json!("12.50")), normalize(&json!(12.5)));
        assert_eq!(normalize(&json!("12.5 ")), normalize(&json!("12.50")));
        assert_ne!(normalize(&json!("12.50")), normalize(&json!("12.51")));
    }

    #[test]
    fn non_numeric_strings_only_trim() {
        assert_eq!(normalize(&json!(" rent ")), json!("rent"));
        assert_ne!(normalize(&json!("rent")), json!("Rent"));
    }
}
