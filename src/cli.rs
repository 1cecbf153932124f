// Copyright (c) 2025 Splitledger contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command};

fn req(name: &'static str) -> Arg {
    Arg::new(name).long(name).required(true)
}

fn opt(name: &'static str) -> Arg {
    Arg::new(name).long(name)
}

fn json_flags() -> [Arg; 2] {
    [
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    ]
}

pub fn build_cli() -> Command {
    Command::new("splitledger")
        .about("Group expense splitting, settlements, and balances")
        .version(clap::crate_version!())
        .subcommand(Command::new("init").about("Create or locate the database"))
        .subcommand(group_cmd())
        .subcommand(expense_cmd())
        .subcommand(settle_cmd())
        .subcommand(balance_cmd())
        .subcommand(import_cmd())
        .subcommand(export_cmd())
        .subcommand(Command::new("doctor").about("Check ledger integrity"))
}

fn group_cmd() -> Command {
    Command::new("group")
        .about("Manage groups and membership")
        .subcommand(
            Command::new("create")
                .about("Create a group; the creating user becomes its admin")
                .arg(req("name"))
                .arg(req("user").help("Creator's user id"))
                .arg(req("user-name"))
                .arg(req("email")),
        )
        .subcommand(
            Command::new("add-member")
                .arg(req("group"))
                .arg(req("user"))
                .arg(req("name"))
                .arg(req("email"))
                .arg(opt("role").default_value("member")),
        )
        .subcommand(
            Command::new("remove-member")
                .arg(req("group"))
                .arg(req("user")),
        )
        .subcommand(
            Command::new("set-role")
                .arg(req("group"))
                .arg(req("user"))
                .arg(req("role")),
        )
        .subcommand(Command::new("list").args(json_flags()))
        .subcommand(Command::new("members").arg(req("group")).args(json_flags()))
}

fn expense_cmd() -> Command {
    Command::new("expense")
        .about("Record and inspect shared expenses")
        .subcommand(
            Command::new("add")
                .about("Split an amount across participants and record it")
                .arg(req("group"))
                .arg(req("user").help("Acting user id (expense creator)"))
                .arg(req("date"))
                .arg(req("amount"))
                .arg(req("description"))
                .arg(req("paid-by"))
                .arg(opt("category"))
                .arg(
                    opt("split")
                        .default_value("equal")
                        .help("equal, percentage or custom"),
                )
                .arg(
                    opt("participants")
                        .help("Comma-separated user ids; defaults to all group members"),
                )
                .arg(opt("amounts").help("Custom amounts as user=amount,... (custom split)"))
                .arg(opt("percentages").help("Percentages as user=pct,... (percentage split)"))
                .arg(
                    opt("strategy")
                        .default_value("distribute")
                        .help("Rounding remainder strategy: distribute, largest or smallest"),
                ),
        )
        .subcommand(
            Command::new("list")
                .arg(req("group"))
                .arg(opt("from"))
                .arg(opt("to"))
                .arg(
                    opt("limit")
                        .value_parser(clap::value_parser!(usize)),
                )
                .args(json_flags()),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete an expense (creator or admin only)")
                .arg(req("group"))
                .arg(req("id").value_parser(clap::value_parser!(i64)))
                .arg(req("user").help("Acting user id")),
        )
}

fn settle_cmd() -> Command {
    Command::new("settle")
        .about("Record direct payments between members")
        .subcommand(
            Command::new("add")
                .arg(req("group"))
                .arg(req("from"))
                .arg(req("to"))
                .arg(req("amount"))
                .arg(req("date"))
                .arg(opt("notes"))
                .arg(opt("expenses").help("Comma-separated related expense ids")),
        )
        .subcommand(Command::new("list").arg(req("group")).args(json_flags()))
}

fn balance_cmd() -> Command {
    Command::new("balance")
        .about("Compute per-member balances for a group")
        .arg(req("group"))
        .arg(
            Arg::new("permissive")
                .long("permissive")
                .action(ArgAction::SetTrue)
                .help("Skip records referencing unknown members instead of failing"),
        )
        .args(json_flags())
}

fn import_cmd() -> Command {
    Command::new("import")
        .about("Import a hosted-store JSON export (group, members, expenses, settlements)")
        .arg(req("path"))
}

fn export_cmd() -> Command {
    Command::new("export")
        .about("Export group data")
        .subcommand(
            Command::new("expenses")
                .arg(req("group"))
                .arg(opt("format").default_value("csv"))
                .arg(req("out")),
        )
        .subcommand(
            Command::new("settlements")
                .arg(req("group"))
                .arg(opt("format").default_value("csv"))
                .arg(req("out")),
        )
}
