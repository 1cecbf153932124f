// Copyright (c) 2025 Splitledger contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store;
use crate::utils::id_for_group;
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("expenses", sub)) => export_expenses(conn, sub),
        Some(("settlements", sub)) => export_settlements(conn, sub),
        _ => Ok(()),
    }
}

fn export_expenses(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();
    let group = sub.get_one::<String>("group").unwrap();
    let group_id = id_for_group(conn, group)?;
    let expenses = store::fetch_all_group_expenses(conn, group_id)?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "id", "date", "description", "amount", "paid_by", "category", "splits",
            ])?;
            for e in &expenses {
                let splits = e
                    .splits
                    .iter()
                    .map(|s| format!("{}:{}", s.user_id, s.amount))
                    .collect::<Vec<_>>()
                    .join(";");
                wtr.write_record([
                    e.id.to_string(),
                    e.date.to_string(),
                    e.description.clone(),
                    e.amount.to_string(),
                    e.paid_by.clone(),
                    e.category.clone().unwrap_or_default(),
                    splits,
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            std::fs::write(out, serde_json::to_string_pretty(&expenses)?)?;
        }
        _ => {
            eprintln!("Unknown format: {} (use csv|json)", fmt);
        }
    }
    println!("Exported expenses of '{}' to {}", group, out);
    Ok(())
}

fn export_settlements(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();
    let group = sub.get_one::<String>("group").unwrap();
    let group_id = id_for_group(conn, group)?;
    let settlements = store::fetch_all_group_settlements(conn, group_id)?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["id", "date", "from", "to", "amount", "notes"])?;
            for s in &settlements {
                wtr.write_record([
                    s.id.to_string(),
                    s.date.to_string(),
                    s.from_user.clone(),
                    s.to_user.clone(),
                    s.amount.to_string(),
                    s.notes.clone().unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            std::fs::write(out, serde_json::to_string_pretty(&settlements)?)?;
        }
        _ => {
            eprintln!("Unknown format: {} (use csv|json)", fmt);
        }
    }
    println!("Exported settlements of '{}' to {}", group, out);
    Ok(())
}
