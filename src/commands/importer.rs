// Copyright (c) 2025 Splitledger contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Import of a hosted-store JSON export: one group with its members,
//! expenses, and settlements. Timestamps in these exports are duck-typed
//! (epoch numbers, `{seconds, nanoseconds}` objects, or RFC 3339 strings)
//! and are coerced once at this boundary.

use std::collections::HashSet;

use crate::models::MemberRole;
use crate::split::{default_tolerance, validate_splits};
use crate::utils::{parse_date, to_epoch_millis};
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Deserialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let path = m.get_one::<String>("path").unwrap().trim();
    let raw = std::fs::read_to_string(path).with_context(|| format!("Open export {}", path))?;
    let export: ExportFile =
        serde_json::from_str(&raw).with_context(|| format!("Parse export {}", path))?;
    let (expenses, settlements) = import_export(conn, &export)?;
    println!(
        "Imported group '{}': {} members, {} expenses, {} settlements",
        export.group.name,
        export.members.len(),
        expenses,
        settlements
    );
    Ok(())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    pub group: ExportGroup,
    #[serde(default)]
    pub members: Vec<ExportMember>,
    #[serde(default)]
    pub expenses: Vec<ExportExpense>,
    #[serde(default)]
    pub settlements: Vec<ExportSettlement>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportGroup {
    pub name: String,
    pub created_by: String,
    pub created_at: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMember {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub joined_at: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportExpense {
    pub date: String,
    pub amount: Decimal,
    pub description: String,
    pub paid_by: String,
    #[serde(default)]
    pub category: Option<String>,
    pub splits: Vec<ExportSplit>,
    pub created_by: String,
    pub created_at: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSplit {
    pub user_id: String,
    pub amount: Decimal,
    #[serde(default)]
    pub is_paid: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettlement {
    pub from: String,
    pub to: String,
    pub amount: Decimal,
    pub date: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub related_expense_ids: Vec<i64>,
}

/// Validate and insert an export in one transaction. Enforces the same
/// integrity rules as the store's write path: an admin member must exist,
/// splits must balance with non-negative amounts, and every payer, split
/// user, and settlement party must appear in the export's member list.
/// Returns the number of expenses and settlements written.
pub fn import_export(conn: &mut Connection, export: &ExportFile) -> Result<(usize, usize)> {
    if !export
        .members
        .iter()
        .any(|m| m.role == MemberRole::Admin.as_str())
    {
        return Err(anyhow!(
            "Export of group '{}' has no admin member",
            export.group.name
        ));
    }
    let member_ids: HashSet<&str> = export.members.iter().map(|m| m.user_id.as_str()).collect();

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO groups(name, created_by, created_at) VALUES (?1,?2,?3)",
        params![
            export.group.name,
            export.group.created_by,
            to_epoch_millis(&export.group.created_at)?,
        ],
    )?;
    let group_id = tx.last_insert_rowid();

    for m in &export.members {
        let role: MemberRole = m.role.parse()?;
        tx.execute(
            "INSERT INTO members(group_id, user_id, name, email, role, joined_at) VALUES (?1,?2,?3,?4,?5,?6)",
            params![
                group_id,
                m.user_id,
                m.name,
                m.email,
                role.as_str(),
                to_epoch_millis(&m.joined_at)?,
            ],
        )?;
    }

    for e in &export.expenses {
        if !member_ids.contains(e.paid_by.as_str()) {
            return Err(anyhow!(
                "Expense '{}' is paid by '{}', who is not in the export's member list",
                e.description,
                e.paid_by
            ));
        }
        let splits: Vec<crate::models::ExpenseSplit> = e
            .splits
            .iter()
            .map(|s| crate::models::ExpenseSplit {
                user_id: s.user_id.clone(),
                amount: s.amount,
                is_paid: s.is_paid,
            })
            .collect();
        for s in &splits {
            if !member_ids.contains(s.user_id.as_str()) {
                return Err(anyhow!(
                    "Expense '{}' carries a split for '{}', who is not in the export's member list",
                    e.description,
                    s.user_id
                ));
            }
            if s.amount < Decimal::ZERO {
                return Err(anyhow!(
                    "Expense '{}' has a negative split amount {} for '{}'",
                    e.description,
                    s.amount,
                    s.user_id
                ));
            }
        }
        if !validate_splits(&splits, e.amount, default_tolerance()) {
            return Err(anyhow!(
                "Expense '{}' has splits that do not balance against {}",
                e.description,
                e.amount
            ));
        }
        let date = parse_date(&e.date)?;
        tx.execute(
            "INSERT INTO expenses(group_id, date, amount, description, paid_by, category, created_by, created_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
            params![
                group_id,
                date.to_string(),
                e.amount.to_string(),
                e.description,
                e.paid_by,
                e.category,
                e.created_by,
                to_epoch_millis(&e.created_at)?,
            ],
        )?;
        let expense_id = tx.last_insert_rowid();
        for s in &splits {
            tx.execute(
                "INSERT INTO expense_splits(expense_id, user_id, amount, is_paid) VALUES (?1,?2,?3,?4)",
                params![expense_id, s.user_id, s.amount.to_string(), s.is_paid],
            )?;
        }
    }

    for s in &export.settlements {
        if s.from == s.to {
            return Err(anyhow!(
                "Settlement on {} pays '{}' back to themselves",
                s.date,
                s.from
            ));
        }
        for party in [&s.from, &s.to] {
            if !member_ids.contains(party.as_str()) {
                return Err(anyhow!(
                    "Settlement on {} references '{}', who is not in the export's member list",
                    s.date,
                    party
                ));
            }
        }
        let date = parse_date(&s.date)?;
        tx.execute(
            "INSERT INTO settlements(group_id, from_user, to_user, amount, date, notes, related_expense_ids)
             VALUES (?1,?2,?3,?4,?5,?6,?7)",
            params![
                group_id,
                s.from,
                s.to,
                s.amount.to_string(),
                date.to_string(),
                s.notes,
                serde_json::to_string(&s.related_expense_ids)?,
            ],
        )?;
    }

    tx.commit()?;
    Ok((export.expenses.len(), export.settlements.len()))
}
