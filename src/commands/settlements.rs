// Copyright (c) 2025 Splitledger contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::{self, NewSettlement};
use crate::utils::{
    fmt_money, id_for_group, maybe_print_json, parse_date, parse_decimal, parse_id_list,
    pretty_table,
};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let group = sub.get_one::<String>("group").unwrap();
    let group_id = id_for_group(conn, group)?;
    let new = NewSettlement {
        from_user: sub.get_one::<String>("from").unwrap().trim().to_string(),
        to_user: sub.get_one::<String>("to").unwrap().trim().to_string(),
        amount: parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?,
        date: parse_date(sub.get_one::<String>("date").unwrap().trim())?,
        notes: sub.get_one::<String>("notes").map(|s| s.to_string()),
        related_expense_ids: sub
            .get_one::<String>("expenses")
            .map(|s| parse_id_list(s))
            .transpose()?
            .unwrap_or_default(),
    };
    let id = store::persist_settlement(conn, group_id, &new)?;
    println!(
        "Recorded settlement {}: {} paid {} to {} on {}",
        id,
        new.from_user,
        fmt_money(&new.amount),
        new.to_user,
        new.date
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let group = sub.get_one::<String>("group").unwrap();
    let group_id = id_for_group(conn, group)?;
    let settlements = store::fetch_all_group_settlements(conn, group_id)?;

    if !maybe_print_json(json_flag, jsonl_flag, &settlements)? {
        let rows: Vec<Vec<String>> = settlements
            .iter()
            .map(|s| {
                vec![
                    s.id.to_string(),
                    s.date.to_string(),
                    s.from_user.clone(),
                    s.to_user.clone(),
                    fmt_money(&s.amount),
                    s.notes.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Id", "Date", "From", "To", "Amount", "Notes"], rows)
        );
    }
    Ok(())
}
