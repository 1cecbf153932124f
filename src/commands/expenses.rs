// Copyright (c) 2025 Splitledger contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{ExpenseSplit, RoundingStrategy, SplitType};
use crate::split::{DEFAULT_PRECISION, calculate_splits};
use crate::store::{self, ExpenseFilter, NewExpense};
use crate::utils::{
    fmt_money, id_for_group, maybe_print_json, parse_assignments, parse_date, parse_decimal,
    parse_user_list, pretty_table,
};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let group = sub.get_one::<String>("group").unwrap();
    let group_id = id_for_group(conn, group)?;
    let date = parse_date(sub.get_one::<String>("date").unwrap().trim())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
    let description = sub.get_one::<String>("description").unwrap().to_string();
    let paid_by = sub.get_one::<String>("paid-by").unwrap().trim().to_string();
    let created_by = sub.get_one::<String>("user").unwrap().trim().to_string();
    let category = sub.get_one::<String>("category").map(|s| s.to_string());
    let split_type: SplitType = sub.get_one::<String>("split").unwrap().parse()?;
    let strategy: RoundingStrategy = sub.get_one::<String>("strategy").unwrap().parse()?;

    let participants = match sub.get_one::<String>("participants") {
        Some(s) => parse_user_list(s),
        None => store::fetch_group_members(conn, group_id)?
            .into_iter()
            .map(|m| m.user_id)
            .collect(),
    };
    let custom_amounts = sub
        .get_one::<String>("amounts")
        .map(|s| parse_assignments(s))
        .transpose()?;
    let custom_percentages = sub
        .get_one::<String>("percentages")
        .map(|s| parse_assignments(s))
        .transpose()?;

    let results = calculate_splits(
        amount,
        &participants,
        split_type,
        custom_amounts.as_ref(),
        custom_percentages.as_ref(),
        DEFAULT_PRECISION,
        strategy,
    );
    if results.is_empty() {
        return Err(anyhow!(
            "Nothing to split: amount must be positive and at least one participant is needed"
        ));
    }

    let splits: Vec<ExpenseSplit> = results
        .iter()
        .map(|r| ExpenseSplit {
            user_id: r.user_id.clone(),
            amount: r.amount,
            is_paid: false,
        })
        .collect();
    let expense_id = store::persist_expense(
        conn,
        group_id,
        &NewExpense {
            date,
            amount,
            description: description.clone(),
            paid_by,
            category,
            splits,
            created_by,
        },
    )?;

    println!(
        "Recorded expense {} '{}' of {} on {} ({} split):",
        expense_id,
        description,
        fmt_money(&amount),
        date,
        split_type.as_str()
    );
    for r in &results {
        let marker = if r.is_adjusted { " *" } else { "" };
        println!("  {} {} ({}%){}", r.user_id, fmt_money(&r.amount), r.percentage, marker);
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let group = sub.get_one::<String>("group").unwrap();
    let group_id = id_for_group(conn, group)?;

    let mut filter = ExpenseFilter::default();
    if let Some(from) = sub.get_one::<String>("from") {
        filter.from = Some(parse_date(from)?);
    }
    if let Some(to) = sub.get_one::<String>("to") {
        filter.to = Some(parse_date(to)?);
    }
    if let Some(limit) = sub.get_one::<usize>("limit") {
        filter.limit = *limit;
    }
    let page = store::fetch_group_expenses(conn, group_id, &filter)?;

    if !maybe_print_json(json_flag, jsonl_flag, &page.items)? {
        let rows: Vec<Vec<String>> = page
            .items
            .iter()
            .map(|e| {
                let splits = e
                    .splits
                    .iter()
                    .map(|s| format!("{}={}", s.user_id, fmt_money(&s.amount)))
                    .collect::<Vec<_>>()
                    .join(", ");
                vec![
                    e.id.to_string(),
                    e.date.to_string(),
                    e.description.clone(),
                    fmt_money(&e.amount),
                    e.paid_by.clone(),
                    e.category.clone().unwrap_or_default(),
                    splits,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Date", "Description", "Amount", "Paid by", "Category", "Splits"],
                rows,
            )
        );
        if page.has_more {
            println!("(more expenses available; raise --limit or page with --from/--to)");
        }
    }
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let group = sub.get_one::<String>("group").unwrap();
    let id = *sub.get_one::<i64>("id").unwrap();
    let user = sub.get_one::<String>("user").unwrap();
    let group_id = id_for_group(conn, group)?;
    store::delete_expense(conn, group_id, id, user)?;
    println!("Deleted expense {} from '{}'", id, group);
    Ok(())
}
