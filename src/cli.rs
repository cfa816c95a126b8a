// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn list_filters(cmd: Command) -> Command {
    json_flags(cmd)
        .arg(Arg::new("category").long("category").help("Only this category"))
        .arg(Arg::new("month").long("month").help("Only this month (YYYY-MM)"))
}

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

fn request_id_arg() -> Arg {
    Arg::new("request-id")
        .long("request-id")
        .help("Client request id; reuse the same id when retrying a failed write")
}

pub fn build_cli() -> Command {
    Command::new("coffer")
        .about("Dual-backend personal finance ledger")
        .arg(
            Arg::new("owner")
                .long("owner")
                .global(true)
                .default_value("default")
                .help("Owner account all data is scoped to"),
        )
        .arg(
            Arg::new("backend")
                .long("backend")
                .global(true)
                .default_value("sqlite")
                .value_parser(["sqlite", "file"])
                .help("Which ledger backend to operate on"),
        )
        .subcommand(Command::new("init").about("Initialize the selected backend"))
        .subcommand(
            Command::new("expense")
                .about("Expense records")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("description").long("description").default_value(""))
                        .arg(request_id_arg()),
                )
                .subcommand(list_filters(Command::new("list")))
                .subcommand(
                    Command::new("rm")
                        .arg(Arg::new("id").required(true))
                        .arg(request_id_arg()),
                ),
        )
        .subcommand(
            Command::new("income")
                .about("Income records")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("before-tax").long("before-tax").required(true))
                        .arg(Arg::new("after-tax").long("after-tax").required(true))
                        .arg(Arg::new("description").long("description").default_value(""))
                        .arg(request_id_arg()),
                )
                .subcommand(list_filters(Command::new("list")))
                .subcommand(
                    Command::new("rm")
                        .arg(Arg::new("id").required(true))
                        .arg(request_id_arg()),
                ),
        )
        .subcommand(
            Command::new("obligation")
                .about("Scheduled payments")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("due").long("due").required(true))
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("description").long("description").default_value(""))
                        .arg(
                            Arg::new("every")
                                .long("every")
                                .value_parser(value_parser!(u32))
                                .help("Repeat interval count; omit for a one-time payment"),
                        )
                        .arg(
                            Arg::new("unit")
                                .long("unit")
                                .value_parser(["day", "week", "month", "year"])
                                .help("Repeat interval unit"),
                        )
                        .arg(request_id_arg()),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("rm")
                        .arg(Arg::new("id").required(true))
                        .arg(request_id_arg()),
                ),
        )
        .subcommand(
            Command::new("balance")
                .about("Running balance history")
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("adjust")
                        .about("Manual correction setting a new running total")
                        .arg(Arg::new("total").long("total").required(true))
                        .arg(Arg::new("date").long("date"))
                        .arg(request_id_arg()),
                ),
        )
        .subcommand(
            Command::new("category")
                .about("Category dictionary")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("label").required(false))
                        .arg(request_id_arg()),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("rm")
                        .arg(Arg::new("keys").num_args(1..).required(true))
                        .arg(request_id_arg()),
                )
                .subcommand(
                    Command::new("reassign")
                        .about("Point records at another category before deleting one")
                        .arg(Arg::new("from").required(true))
                        .arg(Arg::new("to").required(true))
                        .arg(request_id_arg()),
                ),
        )
        .subcommand(
            Command::new("activate").about("Materialize due scheduled payments into the ledger"),
        )
        .subcommand(json_flags(
            Command::new("reconcile")
                .about("Diff this backend against the other one, read-only"),
        ))
        .subcommand(
            Command::new("export")
                .about("Export a collection")
                .arg(
                    Arg::new("collection")
                        .long("collection")
                        .default_value("expenses")
                        .value_parser(["expenses", "incomes"]),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .default_value("csv")
                        .value_parser(["csv", "json"]),
                )
                .arg(Arg::new("out").long("out").required(true)),
        )
        .subcommand(json_flags(
            Command::new("report").about("Per-category expense totals"),
        ))
}
