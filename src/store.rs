// Copyright (c) 2025 Splitledger contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Narrow storage interfaces around the sqlite layer: paged fetches of a
//! group's members/expenses/settlements and write-side persistence with the
//! data-model invariants enforced before anything hits disk.

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

use crate::models::{ExpenseSplit, Member, MemberRole, Settlement, SharedExpense};
use crate::split::{default_tolerance, validate_splits};

pub const DEFAULT_PAGE_SIZE: usize = 50;

/// One page of a cursor-based fetch. The cursor is the last row id seen.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<i64>,
    pub has_more: bool,
}

#[derive(Debug, Clone)]
pub struct ExpenseFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub cursor: Option<i64>,
    pub limit: usize,
}

impl Default for ExpenseFilter {
    fn default() -> Self {
        ExpenseFilter {
            from: None,
            to: None,
            cursor: None,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettlementFilter {
    pub cursor: Option<i64>,
    pub limit: usize,
}

impl Default for SettlementFilter {
    fn default() -> Self {
        SettlementFilter {
            cursor: None,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// An expense as submitted for persistence; the id and creation timestamp
/// are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub description: String,
    pub paid_by: String,
    pub category: Option<String>,
    pub splits: Vec<ExpenseSplit>,
    pub created_by: String,
}

#[derive(Debug, Clone)]
pub struct NewSettlement {
    pub from_user: String,
    pub to_user: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub related_expense_ids: Vec<i64>,
}

pub fn fetch_group_members(conn: &Connection, group_id: i64) -> Result<Vec<Member>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, name, email, role, joined_at FROM members WHERE group_id=?1 ORDER BY user_id",
    )?;
    let mut rows = stmt.query(params![group_id])?;
    let mut members = Vec::new();
    while let Some(r) = rows.next()? {
        let role: String = r.get(3)?;
        members.push(Member {
            user_id: r.get(0)?,
            name: r.get(1)?,
            email: r.get(2)?,
            role: role.parse::<MemberRole>()?,
            joined_at: r.get(4)?,
        });
    }
    Ok(members)
}

pub fn fetch_group_expenses(
    conn: &Connection,
    group_id: i64,
    filter: &ExpenseFilter,
) -> Result<Page<SharedExpense>> {
    let mut sql = String::from(
        "SELECT id, date, amount, description, paid_by, category, created_by, created_at
         FROM expenses WHERE group_id=?",
    );
    let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(group_id)];
    if let Some(from) = filter.from {
        sql.push_str(" AND date>=?");
        args.push(Box::new(from.to_string()));
    }
    if let Some(to) = filter.to {
        sql.push_str(" AND date<=?");
        args.push(Box::new(to.to_string()));
    }
    if let Some(cursor) = filter.cursor {
        sql.push_str(" AND id>?");
        args.push(Box::new(cursor));
    }
    sql.push_str(" ORDER BY id LIMIT ?");
    args.push(Box::new((filter.limit + 1) as i64));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(args.iter().map(|a| &**a)))?;
    let mut items = Vec::new();
    while let Some(r) = rows.next()? {
        let date_s: String = r.get(1)?;
        let amount_s: String = r.get(2)?;
        items.push(SharedExpense {
            id: r.get(0)?,
            group_id,
            date: NaiveDate::parse_from_str(&date_s, "%Y-%m-%d")
                .with_context(|| format!("Invalid expense date '{}'", date_s))?,
            amount: amount_s
                .parse::<Decimal>()
                .with_context(|| format!("Invalid amount '{}' in expenses", amount_s))?,
            description: r.get(3)?,
            paid_by: r.get(4)?,
            category: r.get(5)?,
            splits: Vec::new(),
            created_by: r.get(6)?,
            created_at: r.get(7)?,
        });
    }

    let has_more = items.len() > filter.limit;
    if has_more {
        items.truncate(filter.limit);
    }
    for e in &mut items {
        e.splits = fetch_expense_splits(conn, e.id)?;
    }
    let next_cursor = if has_more {
        items.last().map(|e| e.id)
    } else {
        None
    };
    Ok(Page {
        items,
        next_cursor,
        has_more,
    })
}

/// Materialize the complete expense history, page by page. Balance
/// computation needs the full list.
pub fn fetch_all_group_expenses(conn: &Connection, group_id: i64) -> Result<Vec<SharedExpense>> {
    let mut filter = ExpenseFilter::default();
    let mut all = Vec::new();
    loop {
        let page = fetch_group_expenses(conn, group_id, &filter)?;
        all.extend(page.items);
        match page.next_cursor {
            Some(cursor) if page.has_more => filter.cursor = Some(cursor),
            _ => break,
        }
    }
    Ok(all)
}

fn fetch_expense_splits(conn: &Connection, expense_id: i64) -> Result<Vec<ExpenseSplit>> {
    let mut stmt = conn.prepare_cached(
        "SELECT user_id, amount, is_paid FROM expense_splits WHERE expense_id=?1 ORDER BY id",
    )?;
    let mut rows = stmt.query(params![expense_id])?;
    let mut splits = Vec::new();
    while let Some(r) = rows.next()? {
        let amount_s: String = r.get(1)?;
        splits.push(ExpenseSplit {
            user_id: r.get(0)?,
            amount: amount_s
                .parse::<Decimal>()
                .with_context(|| format!("Invalid amount '{}' in expense_splits", amount_s))?,
            is_paid: r.get(2)?,
        });
    }
    Ok(splits)
}

pub fn fetch_group_settlements(
    conn: &Connection,
    group_id: i64,
    filter: &SettlementFilter,
) -> Result<Page<Settlement>> {
    let mut sql = String::from(
        "SELECT id, from_user, to_user, amount, date, notes, related_expense_ids
         FROM settlements WHERE group_id=?",
    );
    let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(group_id)];
    if let Some(cursor) = filter.cursor {
        sql.push_str(" AND id>?");
        args.push(Box::new(cursor));
    }
    sql.push_str(" ORDER BY id LIMIT ?");
    args.push(Box::new((filter.limit + 1) as i64));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(args.iter().map(|a| &**a)))?;
    let mut items = Vec::new();
    while let Some(r) = rows.next()? {
        let amount_s: String = r.get(3)?;
        let date_s: String = r.get(4)?;
        let related_s: String = r.get(6)?;
        items.push(Settlement {
            id: r.get(0)?,
            group_id,
            from_user: r.get(1)?,
            to_user: r.get(2)?,
            amount: amount_s
                .parse::<Decimal>()
                .with_context(|| format!("Invalid amount '{}' in settlements", amount_s))?,
            date: NaiveDate::parse_from_str(&date_s, "%Y-%m-%d")
                .with_context(|| format!("Invalid settlement date '{}'", date_s))?,
            notes: r.get(5)?,
            related_expense_ids: serde_json::from_str(&related_s)
                .with_context(|| format!("Invalid related ids '{}' in settlements", related_s))?,
        });
    }

    let has_more = items.len() > filter.limit;
    if has_more {
        items.truncate(filter.limit);
    }
    let next_cursor = if has_more {
        items.last().map(|s| s.id)
    } else {
        None
    };
    Ok(Page {
        items,
        next_cursor,
        has_more,
    })
}

pub fn fetch_all_group_settlements(conn: &Connection, group_id: i64) -> Result<Vec<Settlement>> {
    let mut filter = SettlementFilter::default();
    let mut all = Vec::new();
    loop {
        let page = fetch_group_settlements(conn, group_id, &filter)?;
        all.extend(page.items);
        match page.next_cursor {
            Some(cursor) if page.has_more => filter.cursor = Some(cursor),
            _ => break,
        }
    }
    Ok(all)
}

/// Persist an expense and its splits transactionally. Rejects non-positive
/// totals, negative split amounts, splits that don't balance against the
/// total within 0.01, and payers or split users who are not group members.
pub fn persist_expense(conn: &mut Connection, group_id: i64, new: &NewExpense) -> Result<i64> {
    if new.amount <= Decimal::ZERO {
        return Err(anyhow!("Expense amount must be positive, got {}", new.amount));
    }
    if new.splits.is_empty() {
        return Err(anyhow!("Expense needs at least one split"));
    }
    for split in &new.splits {
        if split.amount < Decimal::ZERO {
            return Err(anyhow!(
                "Split amount for '{}' must be non-negative, got {}",
                split.user_id,
                split.amount
            ));
        }
    }
    if !validate_splits(&new.splits, new.amount, default_tolerance()) {
        let sum: Decimal = new.splits.iter().map(|s| s.amount).sum();
        return Err(anyhow!(
            "Splits sum to {} but the expense total is {}",
            sum,
            new.amount
        ));
    }
    if !member_exists(conn, group_id, &new.paid_by)? {
        return Err(anyhow!("Payer '{}' is not a member of the group", new.paid_by));
    }
    for split in &new.splits {
        if !member_exists(conn, group_id, &split.user_id)? {
            return Err(anyhow!(
                "Split user '{}' is not a member of the group",
                split.user_id
            ));
        }
    }

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO expenses(group_id, date, amount, description, paid_by, category, created_by, created_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
        params![
            group_id,
            new.date.to_string(),
            new.amount.to_string(),
            new.description,
            new.paid_by,
            new.category,
            new.created_by,
            crate::utils::now_epoch_millis(),
        ],
    )?;
    let expense_id = tx.last_insert_rowid();
    for split in &new.splits {
        tx.execute(
            "INSERT INTO expense_splits(expense_id, user_id, amount, is_paid) VALUES (?1,?2,?3,?4)",
            params![expense_id, split.user_id, split.amount.to_string(), split.is_paid],
        )?;
    }
    tx.commit()?;
    Ok(expense_id)
}

pub fn persist_settlement(conn: &Connection, group_id: i64, new: &NewSettlement) -> Result<i64> {
    if new.amount <= Decimal::ZERO {
        return Err(anyhow!(
            "Settlement amount must be positive, got {}",
            new.amount
        ));
    }
    if new.from_user == new.to_user {
        return Err(anyhow!("A settlement cannot pay '{}' back to themselves", new.from_user));
    }
    for user in [&new.from_user, &new.to_user] {
        if !member_exists(conn, group_id, user)? {
            return Err(anyhow!("'{}' is not a member of the group", user));
        }
    }
    conn.execute(
        "INSERT INTO settlements(group_id, from_user, to_user, amount, date, notes, related_expense_ids)
         VALUES (?1,?2,?3,?4,?5,?6,?7)",
        params![
            group_id,
            new.from_user,
            new.to_user,
            new.amount.to_string(),
            new.date.to_string(),
            new.notes,
            serde_json::to_string(&new.related_expense_ids)?,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Create a group; the creator joins as its first admin.
pub fn create_group(
    conn: &mut Connection,
    name: &str,
    creator: &Member,
) -> Result<i64> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO groups(name, created_by, created_at) VALUES (?1,?2,?3)",
        params![name, creator.user_id, crate::utils::now_epoch_millis()],
    )?;
    let group_id = tx.last_insert_rowid();
    tx.execute(
        "INSERT INTO members(group_id, user_id, name, email, role, joined_at) VALUES (?1,?2,?3,?4,?5,?6)",
        params![
            group_id,
            creator.user_id,
            creator.name,
            creator.email,
            MemberRole::Admin.as_str(),
            creator.joined_at,
        ],
    )?;
    tx.commit()?;
    Ok(group_id)
}

pub fn add_member(conn: &Connection, group_id: i64, member: &Member) -> Result<()> {
    if member_exists(conn, group_id, &member.user_id)? {
        return Err(anyhow!(
            "'{}' is already a member of the group",
            member.user_id
        ));
    }
    conn.execute(
        "INSERT INTO members(group_id, user_id, name, email, role, joined_at) VALUES (?1,?2,?3,?4,?5,?6)",
        params![
            group_id,
            member.user_id,
            member.name,
            member.email,
            member.role.as_str(),
            member.joined_at,
        ],
    )?;
    Ok(())
}

/// Remove a member, rejecting removal of the group's last admin.
pub fn remove_member(conn: &Connection, group_id: i64, user_id: &str) -> Result<()> {
    let role = member_role(conn, group_id, user_id)?
        .ok_or_else(|| anyhow!("'{}' is not a member of the group", user_id))?;
    if role == MemberRole::Admin && admin_count(conn, group_id)? <= 1 {
        return Err(anyhow!("Cannot remove '{}': a group must keep at least one admin", user_id));
    }
    conn.execute(
        "DELETE FROM members WHERE group_id=?1 AND user_id=?2",
        params![group_id, user_id],
    )?;
    Ok(())
}

/// Change a member's role, rejecting demotion of the last admin.
pub fn set_member_role(
    conn: &Connection,
    group_id: i64,
    user_id: &str,
    role: MemberRole,
) -> Result<()> {
    let current = member_role(conn, group_id, user_id)?
        .ok_or_else(|| anyhow!("'{}' is not a member of the group", user_id))?;
    if current == MemberRole::Admin
        && role == MemberRole::Member
        && admin_count(conn, group_id)? <= 1
    {
        return Err(anyhow!("Cannot demote '{}': a group must keep at least one admin", user_id));
    }
    conn.execute(
        "UPDATE members SET role=?1 WHERE group_id=?2 AND user_id=?3",
        params![role.as_str(), group_id, user_id],
    )?;
    Ok(())
}

/// Delete an expense; only its creator or a group admin may do so.
pub fn delete_expense(
    conn: &Connection,
    group_id: i64,
    expense_id: i64,
    requested_by: &str,
) -> Result<()> {
    let created_by: Option<String> = conn
        .query_row(
            "SELECT created_by FROM expenses WHERE id=?1 AND group_id=?2",
            params![expense_id, group_id],
            |r| r.get(0),
        )
        .optional()?;
    let created_by =
        created_by.ok_or_else(|| anyhow!("Expense {} not found in group", expense_id))?;
    let is_admin = member_role(conn, group_id, requested_by)? == Some(MemberRole::Admin);
    if created_by != requested_by && !is_admin {
        return Err(anyhow!(
            "'{}' may not delete expense {}: only its creator or an admin can",
            requested_by,
            expense_id
        ));
    }
    conn.execute("DELETE FROM expenses WHERE id=?1", params![expense_id])?;
    Ok(())
}

pub fn member_exists(conn: &Connection, group_id: i64, user_id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM members WHERE group_id=?1 AND user_id=?2",
            params![group_id, user_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn member_role(
    conn: &Connection,
    group_id: i64,
    user_id: &str,
) -> Result<Option<MemberRole>> {
    let role: Option<String> = conn
        .query_row(
            "SELECT role FROM members WHERE group_id=?1 AND user_id=?2",
            params![group_id, user_id],
            |r| r.get(0),
        )
        .optional()?;
    role.map(|s| s.parse::<MemberRole>()).transpose()
}

fn admin_count(conn: &Connection, group_id: i64) -> Result<i64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM members WHERE group_id=?1 AND role='admin'",
        params![group_id],
        |r| r.get(0),
    )?;
    Ok(n)
}
