// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::diff::DiffReport;
use crate::engine::Engine;
use crate::store::{FileStore, LedgerStore, SqliteStore};
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;

/// Diff the selected backend against the other one. Left is the backend the
/// command runs on, right is its counterpart.
pub fn handle(engine: &Engine, owner: &str, backend: &str, sub: &clap::ArgMatches) -> Result<()> {
    let remote: Box<dyn LedgerStore> = if backend == "file" {
        Box::new(SqliteStore::open_default()?)
    } else {
        Box::new(FileStore::open_default()?)
    };
    let report = engine.compute_diff(owner, remote.as_ref())?;

    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        return Ok(());
    }
    if report.is_clean() {
        println!("Backends agree for owner '{}'", owner);
        return Ok(());
    }
    let row = |name: &str, r: &DiffReport| {
        vec![
            name.to_string(),
            r.only_left.len().to_string(),
            r.only_right.len().to_string(),
            r.modified.len().to_string(),
        ]
    };
    let rows = vec![
        row("expenses", &report.expenses),
        row("incomes", &report.incomes),
        row("obligations", &report.obligations),
        row("balance", &report.balance),
        row("categories", &report.categories),
    ];
    println!(
        "{}",
        pretty_table(&["Collection", "Only left", "Only right", "Modified"], rows)
    );
    println!("Run with --json for the full record-level report");
    Ok(())
}
