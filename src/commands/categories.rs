// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::{report_outcome, request_id};
use crate::engine::{Engine, Mutation};
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;

pub fn handle(engine: &Engine, owner: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().clone();
            let label = sub
                .get_one::<String>("label")
                .cloned()
                .unwrap_or_else(|| key.clone());
            let rid = request_id(sub);
            let outcome = engine.apply_mutation(
                owner,
                &rid,
                Mutation::AddCategory {
                    key: key.clone(),
                    label,
                },
            )?;
            report_outcome(outcome, &rid, &format!("Added category '{}'", key));
        }
        Some(("list", sub)) => {
            let data = engine.categories(owner)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|c| vec![c.key.clone(), c.label.clone()])
                    .collect();
                println!("{}", pretty_table(&["Key", "Label"], rows));
            }
        }
        Some(("rm", sub)) => {
            let keys: Vec<String> = sub
                .get_many::<String>("keys")
                .unwrap()
                .cloned()
                .collect();
            let rid = request_id(sub);
            let outcome =
                engine.apply_mutation(owner, &rid, Mutation::RemoveCategories { keys: keys.clone() })?;
            report_outcome(outcome, &rid, &format!("Removed categories {:?}", keys));
        }
        Some(("reassign", sub)) => {
            let from = sub.get_one::<String>("from").unwrap().clone();
            let to = sub.get_one::<String>("to").unwrap().clone();
            let rid = request_id(sub);
            let outcome = engine.apply_mutation(
                owner,
                &rid,
                Mutation::ReassignCategory {
                    from: from.clone(),
                    to: to.clone(),
                },
            )?;
            report_outcome(outcome, &rid, &format!("Reassigned '{}' -> '{}'", from, to));
        }
        _ => {}
    }
    Ok(())
}
