// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::sync::Arc;

use coffer::engine::Engine;
use coffer::requests::MemoryRequestLedger;
use coffer::store::{FileStore, SqliteStore};
use coffer::{cli, commands};

fn open_engine(backend: &str) -> Result<Engine> {
    Ok(match backend {
        "file" => {
            let store = FileStore::open_default()?;
            // File mode keeps only the process-lifetime idempotency tier.
            Engine::new(Arc::new(store), Arc::new(MemoryRequestLedger::new()))
        }
        _ => {
            let store = SqliteStore::open_default()?;
            let requests = store.request_ledger();
            Engine::new(Arc::new(store), Arc::new(requests))
        }
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let backend = matches.get_one::<String>("backend").cloned().unwrap_or_default();
    let owner = matches.get_one::<String>("owner").cloned().unwrap_or_default();
    let engine = open_engine(&backend)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Initialized {} backend for owner '{}'", backend, owner);
        }
        Some(("expense", sub)) => commands::ledger::handle_expense(&engine, &owner, sub)?,
        Some(("income", sub)) => commands::ledger::handle_income(&engine, &owner, sub)?,
        Some(("obligation", sub)) => commands::obligations::handle(&engine, &owner, sub)?,
        Some(("balance", sub)) => commands::balance::handle(&engine, &owner, sub)?,
        Some(("category", sub)) => commands::categories::handle(&engine, &owner, sub)?,
        Some(("activate", _)) => commands::obligations::activate(&engine, &owner)?,
        Some(("reconcile", sub)) => commands::reconcile::handle(&engine, &owner, &backend, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&engine, &owner, sub)?,
        Some(("report", sub)) => commands::report::handle(&engine, &owner, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
