// Copyright (c) 2025 Splitledger contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::split::{default_tolerance, validate_splits};
use crate::store;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &Connection) -> Result<()> {
    let mut rows = Vec::new();

    // 1) Groups without an admin
    let mut stmt = conn.prepare(
        "SELECT g.name FROM groups g
         WHERE NOT EXISTS (SELECT 1 FROM members m WHERE m.group_id=g.id AND m.role='admin')",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let name: String = r.get(0)?;
        rows.push(vec!["group_without_admin".into(), name]);
    }

    // 2) Split sums vs expense totals, payer/split membership
    let mut groups_stmt = conn.prepare("SELECT id, name FROM groups ORDER BY name")?;
    let mut groups = groups_stmt.query([])?;
    while let Some(g) = groups.next()? {
        let group_id: i64 = g.get(0)?;
        let group_name: String = g.get(1)?;
        let expenses = store::fetch_all_group_expenses(conn, group_id)?;
        for e in &expenses {
            if !validate_splits(&e.splits, e.amount, default_tolerance()) {
                rows.push(vec![
                    "unbalanced_splits".into(),
                    format!("{} expense {} ({})", group_name, e.id, e.description),
                ]);
            }
            if !store::member_exists(conn, group_id, &e.paid_by)? {
                rows.push(vec![
                    "payer_not_member".into(),
                    format!("{} expense {} paid by {}", group_name, e.id, e.paid_by),
                ]);
            }
            for s in &e.splits {
                if !store::member_exists(conn, group_id, &s.user_id)? {
                    rows.push(vec![
                        "split_user_not_member".into(),
                        format!("{} expense {} split for {}", group_name, e.id, s.user_id),
                    ]);
                }
                if s.amount < Decimal::ZERO {
                    rows.push(vec![
                        "negative_split_amount".into(),
                        format!(
                            "{} expense {} split for {} is {}",
                            group_name, e.id, s.user_id, s.amount
                        ),
                    ]);
                }
            }
        }

        // 3) Settlement parties must be members
        let settlements = store::fetch_all_group_settlements(conn, group_id)?;
        for s in &settlements {
            for user in [&s.from_user, &s.to_user] {
                if !store::member_exists(conn, group_id, user)? {
                    rows.push(vec![
                        "settlement_party_not_member".into(),
                        format!("{} settlement {} references {}", group_name, s.id, user),
                    ]);
                }
            }
        }
    }

    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
