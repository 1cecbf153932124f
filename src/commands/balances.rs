// Copyright (c) 2025 Splitledger contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use crate::balance::compute_balances;
use crate::models::{MemberBalance, MissingMemberPolicy};
use crate::store;
use crate::utils::{fmt_money, id_for_group, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let group = sub.get_one::<String>("group").unwrap();
    let group_id = id_for_group(conn, group)?;
    let policy = if sub.get_flag("permissive") {
        MissingMemberPolicy::Permissive
    } else {
        MissingMemberPolicy::Strict
    };

    let balances = balances_for_group(conn, group_id, policy)?;

    if !maybe_print_json(json_flag, jsonl_flag, &balances)? {
        let mut user_ids: Vec<&String> = balances.keys().collect();
        user_ids.sort();
        let rows: Vec<Vec<String>> = user_ids
            .iter()
            .filter_map(|id| balances.get(*id).map(|b| (id, b)))
            .map(|(id, b)| {
                vec![
                    id.to_string(),
                    fmt_money(&b.total_paid),
                    fmt_money(&b.total_share),
                    fmt_money(&b.net_balance),
                    fmt_pairwise(&b.owes_to_others),
                    fmt_pairwise(&b.owed_by_others),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Member", "Paid", "Share", "Net", "Owes", "Owed"], rows)
        );
    }
    Ok(())
}

fn fmt_pairwise(map: &HashMap<String, Decimal>) -> String {
    let mut entries: Vec<(&String, &Decimal)> = map.iter().collect();
    entries.sort_by_key(|(id, _)| id.as_str());
    entries
        .iter()
        .map(|(id, amount)| format!("{}={}", id, fmt_money(amount)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fetch-all plus aggregation; the aggregator needs complete history.
pub fn balances_for_group(
    conn: &Connection,
    group_id: i64,
    policy: MissingMemberPolicy,
) -> Result<HashMap<String, MemberBalance>> {
    let members = store::fetch_group_members(conn, group_id)?;
    let expenses = store::fetch_all_group_expenses(conn, group_id)?;
    let settlements = store::fetch_all_group_settlements(conn, group_id)?;
    Ok(compute_balances(&members, &expenses, &settlements, policy)?)
}
