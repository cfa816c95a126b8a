// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::{report_outcome, request_id};
use crate::engine::{Engine, Mutation};
use crate::error::Error;
use crate::models::{BalanceEntry, BalanceKind, Expense, Income};
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::Result;

pub fn handle_expense(engine: &Engine, owner: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add_expense(engine, owner, sub)?,
        Some(("list", sub)) => list_expenses(engine, owner, sub)?,
        Some(("rm", sub)) => rm_expense(engine, owner, sub)?,
        _ => {}
    }
    Ok(())
}

pub fn handle_income(engine: &Engine, owner: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add_income(engine, owner, sub)?,
        Some(("list", sub)) => list_incomes(engine, owner, sub)?,
        Some(("rm", sub)) => rm_income(engine, owner, sub)?,
        _ => {}
    }
    Ok(())
}

fn add_expense(engine: &Engine, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let rid = request_id(sub);
    // The record id doubles as the request id, so a retry rebuilds the
    // identical row instead of minting a second one.
    let row = Expense {
        id: rid.clone(),
        category: sub.get_one::<String>("category").unwrap().clone(),
        amount,
        description: sub.get_one::<String>("description").unwrap().clone(),
        date,
    };

    let mut rows = engine.expenses(owner)?;
    if rows.iter().all(|e| e.id != row.id) {
        rows.push(row.clone());
    }
    let outcome = engine.apply_mutation(owner, &rid, Mutation::ReplaceExpenses(rows))?;
    // The balance append runs unconditionally under its own derived id: a
    // retry whose first attempt wrote the expense but lost the balance entry
    // must still land it. A fully-applied pair degrades to two no-ops.
    let previous = engine.balance_total(owner)?;
    engine.apply_mutation(
        owner,
        &format!("{}:balance", rid),
        Mutation::AppendBalance(BalanceEntry {
            date,
            kind: BalanceKind::Expense,
            amount: -amount,
            total: previous - amount,
            ref_id: row.id.clone(),
        }),
    )?;
    report_outcome(
        outcome,
        &rid,
        &format!("Recorded expense {} / {} on {}", row.category, amount, date),
    );
    Ok(())
}

fn add_income(engine: &Engine, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let before_tax = parse_decimal(sub.get_one::<String>("before-tax").unwrap())?;
    let after_tax = parse_decimal(sub.get_one::<String>("after-tax").unwrap())?;
    let rid = request_id(sub);
    let row = Income {
        id: rid.clone(),
        category: sub.get_one::<String>("category").unwrap().clone(),
        before_tax,
        after_tax,
        description: sub.get_one::<String>("description").unwrap().clone(),
        date,
    };

    let mut rows = engine.incomes(owner)?;
    if rows.iter().all(|i| i.id != row.id) {
        rows.push(row.clone());
    }
    let outcome = engine.apply_mutation(owner, &rid, Mutation::ReplaceIncomes(rows))?;
    // Same as the expense path: the paired balance append must not be gated
    // on the ledger outcome, or a lost append can never be retried.
    let previous = engine.balance_total(owner)?;
    engine.apply_mutation(
        owner,
        &format!("{}:balance", rid),
        Mutation::AppendBalance(BalanceEntry {
            date,
            kind: BalanceKind::Income,
            amount: after_tax,
            total: previous + after_tax,
            ref_id: row.id.clone(),
        }),
    )?;
    report_outcome(
        outcome,
        &rid,
        &format!("Recorded income {} / {} on {}", row.category, after_tax, date),
    );
    Ok(())
}

fn rm_expense(engine: &Engine, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let id = sub.get_one::<String>("id").unwrap();
    let rid = request_id(sub);
    let mut rows = engine.expenses(owner)?;
    let before = rows.len();
    rows.retain(|e| &e.id != id);
    if rows.len() == before {
        return Err(Error::NotFound(format!("expense '{}'", id)).into());
    }
    let outcome = engine.apply_mutation(owner, &rid, Mutation::ReplaceExpenses(rows))?;
    report_outcome(outcome, &rid, &format!("Removed expense {}", id));
    Ok(())
}

fn rm_income(engine: &Engine, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let id = sub.get_one::<String>("id").unwrap();
    let rid = request_id(sub);
    let mut rows = engine.incomes(owner)?;
    let before = rows.len();
    rows.retain(|i| &i.id != id);
    if rows.len() == before {
        return Err(Error::NotFound(format!("income '{}'", id)).into());
    }
    let outcome = engine.apply_mutation(owner, &rid, Mutation::ReplaceIncomes(rows))?;
    report_outcome(outcome, &rid, &format!("Removed income {}", id));
    Ok(())
}

/// Optional list filters shared by expense and income listings.
fn keep(category: &str, date: chrono::NaiveDate, sub: &clap::ArgMatches) -> bool {
    if let Some(c) = sub.get_one::<String>("category") {
        if category != c {
            return false;
        }
    }
    if let Some(m) = sub.get_one::<String>("month") {
        if date.format("%Y-%m").to_string() != *m {
            return false;
        }
    }
    true
}

fn list_expenses(engine: &Engine, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let mut data = engine.expenses(owner)?;
    data.retain(|e| keep(&e.category, e.date, sub));
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|e| {
                vec![
                    e.date.to_string(),
                    e.category.clone(),
                    e.amount.round_dp(2).to_string(),
                    e.description.clone(),
                    e.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Category", "Amount", "Description", "Id"], rows)
        );
    }
    Ok(())
}

fn list_incomes(engine: &Engine, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let mut data = engine.incomes(owner)?;
    data.retain(|i| keep(&i.category, i.date, sub));
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|i| {
                vec![
                    i.date.to_string(),
                    i.category.clone(),
                    i.before_tax.round_dp(2).to_string(),
                    i.after_tax.round_dp(2).to_string(),
                    format!("{:.1}%", i.tax_percentage()),
                    i.description.clone(),
                    i.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Date", "Category", "Before tax", "After tax", "Tax", "Description", "Id"],
                rows,
            )
        );
    }
    Ok(())
}
