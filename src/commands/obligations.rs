// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::{report_outcome, request_id};
use crate::engine::{Engine, Mutation};
use crate::models::{IntervalUnit, Obligation, Recurrence};
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::Result;
use uuid::Uuid;

pub fn handle(engine: &Engine, owner: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(engine, owner, sub)?,
        Some(("list", sub)) => list(engine, owner, sub)?,
        Some(("rm", sub)) => rm(engine, owner, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(engine: &Engine, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let due_date = parse_date(sub.get_one::<String>("due").unwrap())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let recurrence = match (sub.get_one::<u32>("every"), sub.get_one::<String>("unit")) {
        (Some(&every), Some(unit)) => Recurrence::Repeating {
            every,
            unit: IntervalUnit::parse(unit)?,
        },
        (None, None) => Recurrence::OneTime,
        _ => anyhow::bail!("--every and --unit must be given together"),
    };
    let row = Obligation {
        id: Uuid::new_v4().to_string(),
        category: sub.get_one::<String>("category").unwrap().clone(),
        amount,
        description: sub.get_one::<String>("description").unwrap().clone(),
        due_date,
        recurrence,
    };
    let rid = request_id(sub);
    let outcome = engine.apply_mutation(owner, &rid, Mutation::AddObligation(row.clone()))?;
    report_outcome(
        outcome,
        &rid,
        &format!("Scheduled {} / {} due {}", row.category, amount, due_date),
    );
    Ok(())
}

fn rm(engine: &Engine, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let id = sub.get_one::<String>("id").unwrap().clone();
    let rid = request_id(sub);
    let outcome = engine.apply_mutation(owner, &rid, Mutation::RemoveObligation { id: id.clone() })?;
    report_outcome(outcome, &rid, &format!("Removed obligation {}", id));
    Ok(())
}

fn list(engine: &Engine, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let data = engine.obligations(owner)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|o| {
                let schedule = match o.recurrence {
                    Recurrence::OneTime => "once".to_string(),
                    Recurrence::Repeating { every, unit } => {
                        format!("every {} {}(s)", every, unit.as_str())
                    }
                };
                vec![
                    o.due_date.to_string(),
                    o.category.clone(),
                    o.amount.round_dp(2).to_string(),
                    schedule,
                    o.description.clone(),
                    o.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Due", "Category", "Amount", "Schedule", "Description", "Id"],
                rows,
            )
        );
    }
    Ok(())
}

/// Materialize every due obligation. Invoked by the user or a session hook;
/// the core never runs this on its own.
pub fn activate(engine: &Engine, owner: &str) -> Result<()> {
    let report = engine.run_scheduled_activation(owner, chrono::Local::now())?;
    if report.applied.is_empty() {
        println!("No scheduled payments due");
        return Ok(());
    }
    for id in &report.applied {
        match report.next_due.get(id) {
            Some(next) => println!("Applied {} (next due {})", id, next),
            None => println!("Applied {} (one-time, removed)", id),
        }
    }
    Ok(())
}
