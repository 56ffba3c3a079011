// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

fn json_flags() -> [Arg; 2] {
    [
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    ]
}

fn recurring_arg() -> Arg {
    Arg::new("recurring")
        .long("recurring")
        .value_name("none|weekly|monthly")
}

fn month_arg() -> Arg {
    Arg::new("month").long("month").value_name("YYYY-MM")
}

fn expense_filters() -> [Arg; 4] {
    [
        month_arg(),
        Arg::new("category").long("category"),
        recurring_arg(),
        Arg::new("limit")
            .long("limit")
            .value_parser(value_parser!(usize)),
    ]
}

fn entry_args() -> [Arg; 5] {
    [
        Arg::new("title").long("title").required(true),
        Arg::new("amount")
            .long("amount")
            .required(true)
            .allow_hyphen_values(true),
        Arg::new("currency")
            .long("currency")
            .help("Entry currency; defaults to the configured default"),
        Arg::new("date").long("date").value_name("YYYY-MM-DD"),
        recurring_arg(),
    ]
}

fn id_arg() -> Arg {
    Arg::new("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

pub fn build_cli() -> Command {
    Command::new("budgettogether")
        .version(clap::crate_version!())
        .about("Track expenses and income in many currencies against per-category budget limits")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("expense")
                .about("Record and browse expenses")
                .subcommand(
                    Command::new("add")
                        .args(entry_args())
                        .arg(Arg::new("category").long("category").required(true)),
                )
                .subcommand(
                    Command::new("list")
                        .args(expense_filters())
                        .args(json_flags()),
                )
                .subcommand(Command::new("rm").arg(id_arg()))
                .subcommand(
                    Command::new("total")
                        .about("Sum of matching expenses in the tracking currency")
                        .args(expense_filters()),
                ),
        )
        .subcommand(
            Command::new("income")
                .about("Record and browse income")
                .subcommand(
                    Command::new("add")
                        .args(entry_args())
                        .arg(Arg::new("source").long("source").required(true))
                        .arg(Arg::new("notes").long("notes")),
                )
                .subcommand(
                    Command::new("list")
                        .arg(month_arg())
                        .arg(Arg::new("source").long("source"))
                        .arg(recurring_arg())
                        .args(json_flags()),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("category")
                .about("Manage expense categories")
                .subcommand(Command::new("add").arg(Arg::new("name").required(true)))
                .subcommand(Command::new("list"))
                .subcommand(Command::new("rm").arg(Arg::new("name").required(true))),
        )
        .subcommand(
            Command::new("budget")
                .about("Per-category budget limits")
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .allow_hyphen_values(true),
                        )
                        .arg(Arg::new("currency").long("currency")),
                )
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("rm").arg(Arg::new("category").long("category").required(true)),
                )
                .subcommand(
                    Command::new("status")
                        .about("Spending against limits for a month")
                        .arg(month_arg())
                        .args(json_flags()),
                ),
        )
        .subcommand(
            Command::new("recurring")
                .about("Monthly recurring expenses")
                .subcommand(Command::new("run").about("Generate this month's copies if not done yet"))
                .subcommand(Command::new("list").args(json_flags())),
        )
        .subcommand(
            Command::new("report")
                .about("Analysis and calendar views")
                .subcommand(
                    Command::new("analysis")
                        .arg(Arg::new("category").long("category"))
                        .args(json_flags()),
                )
                .subcommand(
                    Command::new("calendar")
                        .arg(month_arg())
                        .arg(Arg::new("day").long("day").value_name("YYYY-MM-DD"))
                        .args(json_flags()),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export expenses and income")
                .arg(Arg::new("out").long("out").required(true))
                .arg(
                    Arg::new("format")
                        .long("format")
                        .default_value("csv")
                        .help("csv|json"),
                ),
        )
        .subcommand(
            Command::new("fx")
                .about("Exchange rates and currency preferences")
                .subcommand(
                    Command::new("fetch")
                        .about("Replace cached rates with the latest from the rate service")
                        .arg(Arg::new("url").long("url").help("Rate service base URL")),
                )
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("convert")
                        .arg(Arg::new("amount").long("amount").required(true).allow_hyphen_values(true))
                        .arg(Arg::new("from").long("from").required(true))
                        .arg(Arg::new("to").long("to")),
                )
                .subcommand(Command::new("status"))
                .subcommand(Command::new("currencies").about("Known currencies"))
                .subcommand(
                    Command::new("set-tracking").arg(Arg::new("currency").required(true)),
                )
                .subcommand(
                    Command::new("set-expenses").arg(Arg::new("currency").required(true)),
                )
                .subcommand(
                    Command::new("set-income").arg(Arg::new("currency").required(true)),
                ),
        )
        .subcommand(Command::new("doctor").about("Check data consistency"))
}
