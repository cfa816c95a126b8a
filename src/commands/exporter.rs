// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::Engine;
use anyhow::Result;

pub fn handle(engine: &Engine, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let collection = sub.get_one::<String>("collection").unwrap();
    let fmt = sub.get_one::<String>("format").unwrap();
    let out = sub.get_one::<String>("out").unwrap();

    match (collection.as_str(), fmt.as_str()) {
        ("expenses", "csv") => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["date", "category", "amount", "description", "id"])?;
            for e in engine.expenses(owner)? {
                wtr.write_record([
                    e.date.to_string(),
                    e.category,
                    e.amount.round_dp(2).to_string(),
                    e.description,
                    e.id,
                ])?;
            }
            wtr.flush()?;
        }
        ("incomes", "csv") => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "date",
                "category",
                "before_tax",
                "after_tax",
                "tax_percentage",
                "description",
                "id",
            ])?;
            for i in engine.incomes(owner)? {
                wtr.write_record([
                    i.date.to_string(),
                    i.category.clone(),
                    i.before_tax.round_dp(2).to_string(),
                    i.after_tax.round_dp(2).to_string(),
                    i.tax_percentage().round_dp(2).to_string(),
                    i.description.clone(),
                    i.id.clone(),
                ])?;
            }
            wtr.flush()?;
        }
        ("expenses", _) => {
            std::fs::write(out, serde_json::to_string_pretty(&engine.expenses(owner)?)?)?;
        }
        _ => {
            std::fs::write(out, serde_json::to_string_pretty(&engine.incomes(owner)?)?)?;
        }
    }
    println!("Exported {} to {}", collection, out);
    Ok(())
}
