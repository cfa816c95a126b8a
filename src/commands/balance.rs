// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::{report_outcome, request_id};
use crate::engine::{Engine, Mutation};
use crate::models::{BalanceEntry, BalanceKind};
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::Result;
use uuid::Uuid;

pub fn handle(engine: &Engine, owner: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => list(engine, owner, sub)?,
        Some(("adjust", sub)) => adjust(engine, owner, sub)?,
        _ => {}
    }
    Ok(())
}

fn list(engine: &Engine, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let data = engine.balance_history(owner)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|e| {
                vec![
                    e.date.to_string(),
                    e.kind.as_str().to_string(),
                    e.amount.round_dp(2).to_string(),
                    e.total.round_dp(2).to_string(),
                    e.ref_id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Kind", "Delta", "Total", "Ref"], rows)
        );
    }
    Ok(())
}

/// Manual correction: records whatever delta is needed to land on the given
/// total. This is the one place the balance chain is allowed to break.
fn adjust(engine: &Engine, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let total = parse_decimal(sub.get_one::<String>("total").unwrap())?;
    let date = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s)?,
        None => chrono::Local::now().date_naive(),
    };
    let previous = engine.balance_total(owner)?;
    let rid = request_id(sub);
    let outcome = engine.apply_mutation(
        owner,
        &rid,
        Mutation::AppendBalance(BalanceEntry {
            date,
            kind: BalanceKind::Manual,
            amount: total - previous,
            total,
            ref_id: Uuid::new_v4().to_string(),
        }),
    )?;
    report_outcome(outcome, &rid, &format!("Balance set to {}", total));
    Ok(())
}
