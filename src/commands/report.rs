// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::Engine;
use crate::utils::{category_totals, maybe_print_json, pretty_table};
use anyhow::Result;

/// Per-category expense totals, summed in integer cents.
pub fn handle(engine: &Engine, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let totals = category_totals(&engine.expenses(owner)?)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &totals)? {
        let rows = totals
            .iter()
            .map(|(cat, total)| vec![cat.clone(), total.round_dp(2).to_string()])
            .collect();
        println!("{}", pretty_table(&["Category", "Total"], rows));
    }
    Ok(())
}
