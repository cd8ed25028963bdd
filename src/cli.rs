// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn deal_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("price")
            .long("price")
            .required(true)
            .help("Asset price"),
    )
    .arg(
        Arg::new("rate")
            .long("rate")
            .required(true)
            .allow_hyphen_values(true)
            .help("Annual profit rate: 0.05 or 5 both mean 5%"),
    )
    .arg(
        Arg::new("months")
            .long("months")
            .required(true)
            .help("Duration in months"),
    )
    .arg(
        Arg::new("down_pct")
            .long("down-pct")
            .default_value("0")
            .help("Down payment as a fraction of the price (0.2 = 20%)"),
    )
    .arg(
        Arg::new("deposit")
            .long("deposit")
            .default_value("0")
            .help("Security deposit (Hamish Jiddiyyah)"),
    )
}

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(value_parser!(i64))
        .help("Contract id")
}

fn export_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("format")
            .long("format")
            .default_value("csv")
            .help("csv|json"),
    )
    .arg(Arg::new("out").long("out").required(true).help("Output file"))
}

pub fn build_cli() -> Command {
    Command::new("mizan")
        .about("Murabaha deal management: amortization schedules, contracts and notarization")
        .version(clap::crate_version!())
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("More logging on stderr (-v info, -vv debug)"),
        )
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .help("SQLite database path (overrides MIZAN_DB)"),
        )
        .subcommand(Command::new("init").about("Create the database and print its path"))
        .subcommand(
            json_flags(deal_args(
                Command::new("calc").about("Compute a deal summary and installment schedule"),
            ))
            .arg(
                Arg::new("start")
                    .long("start")
                    .help("First due dates are counted from this date (YYYY-MM-DD, default today)"),
            )
            .arg(
                Arg::new("summary_only")
                    .long("summary-only")
                    .action(ArgAction::SetTrue)
                    .help("Skip the schedule table"),
            ),
        )
        .subcommand(
            Command::new("client")
                .about("Client registry")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .about("Register a client")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("email").long("email"))
                        .arg(
                            Arg::new("credit_score")
                                .long("credit-score")
                                .value_parser(value_parser!(i64)),
                        ),
                )
                .subcommand(json_flags(Command::new("list").about("List clients, newest first"))),
        )
        .subcommand(
            Command::new("contract")
                .about("Murabaha contracts")
                .subcommand_required(true)
                .subcommand(
                    deal_args(Command::new("create").about("Create a contract in DRAFT"))
                        .arg(
                            Arg::new("client")
                                .long("client")
                                .required(true)
                                .value_parser(value_parser!(i64))
                                .help("Client id"),
                        )
                        .arg(Arg::new("asset").long("asset").required(true).help("Asset name"))
                        .arg(
                            Arg::new("date")
                                .long("date")
                                .help("Contract date (YYYY-MM-DD, default today)"),
                        )
                        .arg(
                            Arg::new("json")
                                .long("json")
                                .action(ArgAction::SetTrue)
                                .help("Print the created contract as JSON"),
                        ),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List contracts, newest first")
                        .arg(Arg::new("status").long("status").help("Only this status"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(json_flags(
                    Command::new("show")
                        .about("Show a contract and its schedule")
                        .arg(id_arg()),
                ))
                .subcommand(
                    Command::new("status")
                        .about("Move a contract to another status")
                        .arg(id_arg())
                        .arg(
                            Arg::new("to")
                                .long("to")
                                .required(true)
                                .help("DRAFT|PROMISE|ASSET_OWNED|SALE_SIGNED"),
                        ),
                )
                .subcommand(
                    Command::new("anchor")
                        .about("Attach a Stellar transaction hash submitted elsewhere")
                        .arg(id_arg())
                        .arg(Arg::new("hash").long("hash").required(true))
                        .arg(
                            Arg::new("verify")
                                .long("verify")
                                .action(ArgAction::SetTrue)
                                .help("Check the transaction memo on Horizon first"),
                        ),
                ),
        )
        .subcommand(
            Command::new("doc")
                .about("Render contract documents as text")
                .subcommand_required(true)
                .subcommand(
                    Command::new("promise")
                        .about("Undertaking to purchase (Wa'd)")
                        .arg(id_arg())
                        .arg(Arg::new("out").long("out").help("Write to this file")),
                )
                .subcommand(
                    Command::new("sale")
                        .about("Murabaha sale agreement")
                        .arg(id_arg())
                        .arg(Arg::new("out").long("out").help("Write to this file")),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand_required(true)
                .subcommand(export_args(
                    Command::new("schedule")
                        .about("Installment schedule of one contract")
                        .arg(id_arg()),
                ))
                .subcommand(export_args(
                    Command::new("contracts").about("All contracts with their summaries"),
                )),
        )
        .subcommand(
            Command::new("chain")
                .about("Notary ledger and Stellar lookups")
                .subcommand_required(true)
                .subcommand(json_flags(
                    Command::new("ledger").about("List ledger entries").arg(
                        Arg::new("limit")
                            .long("limit")
                            .value_parser(value_parser!(usize)),
                    ),
                ))
                .subcommand(Command::new("verify").about("Verify the ledger hash chain"))
                .subcommand(json_flags(
                    Command::new("tx")
                        .about("Look up a transaction on Horizon")
                        .arg(Arg::new("hash").long("hash").required(true)),
                ))
                .subcommand(json_flags(
                    Command::new("audit")
                        .about("List an account's Murabaha memo transactions on Horizon")
                        .arg(Arg::new("account").long("account").required(true))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .default_value("20")
                                .value_parser(value_parser!(usize)),
                        ),
                )),
        )
        .subcommand(
            Command::new("report")
                .about("Reports")
                .subcommand_required(true)
                .subcommand(json_flags(
                    Command::new("dashboard").about("Portfolio KPIs and recent volume"),
                )),
        )
        .subcommand(
            Command::new("audit")
                .about("Audit log")
                .subcommand_required(true)
                .subcommand(json_flags(
                    Command::new("list").about("Recent audit entries").arg(
                        Arg::new("limit")
                            .long("limit")
                            .default_value("50")
                            .value_parser(value_parser!(usize)),
                    ),
                )),
        )
        .subcommand(
            Command::new("config")
                .about("Settings")
                .subcommand_required(true)
                .subcommand(json_flags(
                    Command::new("list").about("Effective settings"),
                ))
                .subcommand(
                    Command::new("get")
                        .about("Print one setting")
                        .arg(Arg::new("key").required(true)),
                )
                .subcommand(
                    Command::new("set")
                        .about("Store a setting")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                ),
        )
        .subcommand(json_flags(
            Command::new("doctor").about("Check stored contracts and the ledger for inconsistencies"),
        ))
        .subcommand(
            Command::new("serve")
                .about("Run the HTTP API")
                .arg(Arg::new("bind").long("bind").help("Address to listen on")),
        )
}
