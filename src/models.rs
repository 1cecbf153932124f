// Copyright (c) 2025 Splitledger contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SplitError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub created_by: String,
    pub created_at: i64, // epoch millis
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
        }
    }
}

impl FromStr for MemberRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(MemberRole::Admin),
            "member" => Ok(MemberRole::Member),
            other => Err(anyhow::anyhow!(
                "Invalid role '{}', expected admin or member",
                other
            )),
        }
    }
}

/// One user's membership in a group. There is exactly one record per
/// user per group; every group keeps at least one admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: MemberRole,
    pub joined_at: i64, // epoch millis
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedExpense {
    pub id: i64,
    pub group_id: i64,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub description: String,
    pub paid_by: String,
    pub category: Option<String>,
    pub splits: Vec<ExpenseSplit>,
    pub created_by: String,
    pub created_at: i64,
}

/// The portion of a shared expense attributed to one participant.
/// `is_paid` is advisory settlement tracking; the balance math never reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSplit {
    pub user_id: String,
    pub amount: Decimal,
    pub is_paid: bool,
}

/// A real-world payment from one member to another that reduces what
/// `from_user` owes `to_user`. `related_expense_ids` is advisory linkage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub id: i64,
    pub group_id: i64,
    pub from_user: String,
    pub to_user: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub related_expense_ids: Vec<i64>,
}

/// Split calculator output. Not persisted as-is; the amount becomes an
/// `ExpenseSplit` once the expense is committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitResult {
    pub user_id: String,
    pub amount: Decimal,
    /// Share of the total, informational only.
    pub percentage: Decimal,
    /// True when this participant absorbed at least one minimal unit of the
    /// rounding remainder.
    pub is_adjusted: bool,
}

/// Balance aggregator output, always recomputed and never persisted.
///
/// `net_balance = total_paid - total_share` reflects the expense ledger
/// alone; the directional maps additionally account for settlements.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemberBalance {
    pub total_paid: Decimal,
    pub total_share: Decimal,
    pub net_balance: Decimal,
    pub owed_by_others: HashMap<String, Decimal>,
    pub owes_to_others: HashMap<String, Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitType {
    Equal,
    Percentage,
    Custom,
}

impl SplitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitType::Equal => "equal",
            SplitType::Percentage => "percentage",
            SplitType::Custom => "custom",
        }
    }
}

impl FromStr for SplitType {
    type Err = SplitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equal" => Ok(SplitType::Equal),
            "percentage" => Ok(SplitType::Percentage),
            "custom" => Ok(SplitType::Custom),
            other => Err(SplitError::UnsupportedSplitType(other.to_string())),
        }
    }
}

/// How the rounding remainder of a split is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingStrategy {
    /// Spread the remainder one minimal unit at a time in a deterministic
    /// participant order, capping any single adjustment.
    #[default]
    Distribute,
    /// Entire remainder goes to the last participant in sorted order.
    Largest,
    /// Entire remainder goes to the first participant in sorted order.
    Smallest,
}

impl FromStr for RoundingStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "distribute" => Ok(RoundingStrategy::Distribute),
            "largest" => Ok(RoundingStrategy::Largest),
            "smallest" => Ok(RoundingStrategy::Smallest),
            other => Err(anyhow::anyhow!(
                "Invalid rounding strategy '{}', expected distribute, largest or smallest",
                other
            )),
        }
    }
}

/// What the balance aggregator does with records referencing users outside
/// the member list. Strict surfaces a `LedgerError`; permissive reproduces
/// the silent-drop behavior of older call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingMemberPolicy {
    #[default]
    Strict,
    Permissive,
}
