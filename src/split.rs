// Copyright (c) 2025 Splitledger contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Split calculator: divides an expense total across participants so that
//! the resulting shares sum back to the total exactly, distributing the
//! unavoidable rounding remainder deterministically.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::models::{ExpenseSplit, RoundingStrategy, SplitResult, SplitType};

pub const DEFAULT_PRECISION: u32 = 2;

/// Tolerance used when validating persisted splits against an expense total.
pub fn default_tolerance() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

/// Compute per-participant shares of `total_amount`.
///
/// Degenerate input (non-positive total or no participants) yields an empty
/// vector rather than an error, so callers can treat "nothing to split" as a
/// valid case. Participants are deduplicated and walked in lexicographic
/// user-id order wherever the outcome depends on ordering.
pub fn calculate_splits(
    total_amount: Decimal,
    participants: &[String],
    split_type: SplitType,
    custom_amounts: Option<&HashMap<String, Decimal>>,
    custom_percentages: Option<&HashMap<String, Decimal>>,
    precision: u32,
    strategy: RoundingStrategy,
) -> Vec<SplitResult> {
    if total_amount <= Decimal::ZERO {
        return Vec::new();
    }
    let ids = sorted_unique(participants);
    if ids.is_empty() {
        return Vec::new();
    }
    match split_type {
        SplitType::Equal => equal_splits(total_amount, &ids, precision, strategy),
        SplitType::Percentage => {
            percentage_splits(total_amount, &ids, custom_percentages, precision, strategy)
        }
        SplitType::Custom => custom_splits(total_amount, &ids, custom_amounts, precision, strategy),
    }
}

/// True iff the split amounts sum to `total_amount` within `tolerance`.
/// Callers must gate persistence on this.
pub fn validate_splits(splits: &[ExpenseSplit], total_amount: Decimal, tolerance: Decimal) -> bool {
    let sum: Decimal = splits.iter().map(|s| s.amount).sum();
    (sum - total_amount).abs() <= tolerance
}

fn sorted_unique(participants: &[String]) -> Vec<&str> {
    let mut ids: Vec<&str> = participants.iter().map(String::as_str).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn unit_at(precision: u32) -> Decimal {
    Decimal::new(1, precision)
}

fn equal_splits(
    total: Decimal,
    ids: &[&str],
    precision: u32,
    strategy: RoundingStrategy,
) -> Vec<SplitResult> {
    let count = Decimal::from(ids.len());
    let share = (total / count).round_dp(precision);
    let mut amounts = vec![share; ids.len()];
    let remainder = total - share * count;
    apply_remainder(
        &mut amounts,
        remainder,
        precision,
        strategy,
        &(0..ids.len()).collect::<Vec<_>>(),
    );
    let base = vec![share; ids.len()];
    build_results(ids, &amounts, &base, total, precision)
}

fn percentage_splits(
    total: Decimal,
    ids: &[&str],
    percentages: Option<&HashMap<String, Decimal>>,
    precision: u32,
    strategy: RoundingStrategy,
) -> Vec<SplitResult> {
    let mut exact = Vec::with_capacity(ids.len());
    let mut rounded = Vec::with_capacity(ids.len());
    for &id in ids {
        let pct = percentages
            .and_then(|m| m.get(id))
            .copied()
            .unwrap_or(Decimal::ZERO);
        let e = pct / Decimal::ONE_HUNDRED * total;
        exact.push(e);
        rounded.push(e.round_dp(precision));
    }
    // Percentages are taken at face value; the target is their exact sum,
    // which equals the total only when they add up to 100.
    let target: Decimal = exact.iter().sum();
    let assigned: Decimal = rounded.iter().sum();
    let remainder = target - assigned;

    let mut amounts = rounded.clone();
    let order: Vec<usize> = match strategy {
        RoundingStrategy::Distribute => {
            // Participants carrying the largest individual rounding error
            // absorb correction units first.
            let mut order: Vec<usize> = (0..ids.len()).collect();
            order.sort_by(|&a, &b| {
                let ea = (exact[a] - rounded[a]).abs();
                let eb = (exact[b] - rounded[b]).abs();
                eb.cmp(&ea).then_with(|| ids[a].cmp(ids[b]))
            });
            order
        }
        _ => (0..ids.len()).collect(),
    };
    apply_remainder(&mut amounts, remainder, precision, strategy, &order);
    build_results(ids, &amounts, &rounded, total, precision)
}

fn custom_splits(
    total: Decimal,
    ids: &[&str],
    custom_amounts: Option<&HashMap<String, Decimal>>,
    precision: u32,
    strategy: RoundingStrategy,
) -> Vec<SplitResult> {
    let supplied: Vec<Decimal> = ids
        .iter()
        .map(|&id| {
            custom_amounts
                .and_then(|m| m.get(id))
                .copied()
                .unwrap_or(Decimal::ZERO)
        })
        .collect();
    let supplied_total: Decimal = supplied.iter().sum();

    // No usable custom amounts at all: fall back to an equal split.
    if supplied_total.is_zero() {
        return equal_splits(total, ids, precision, strategy);
    }

    let diff = total - supplied_total;
    if diff.abs() <= Decimal::new(1, 3) {
        return build_results(ids, &supplied, &supplied, total, precision);
    }

    // Spread the shortfall/excess proportionally to each supplied amount;
    // zero-amount participants receive no adjustment.
    let mut amounts: Vec<Decimal> = supplied
        .iter()
        .map(|&c| {
            if c.is_zero() {
                c
            } else {
                (c + diff * c / supplied_total).round_dp(precision)
            }
        })
        .collect();
    let residual = total - amounts.iter().sum::<Decimal>();
    let order: Vec<usize> = (0..ids.len()).filter(|&i| !supplied[i].is_zero()).collect();
    distribute_units(&mut amounts, residual, precision, &order);
    build_results(ids, &amounts, &supplied, total, precision)
}

fn apply_remainder(
    amounts: &mut [Decimal],
    remainder: Decimal,
    precision: u32,
    strategy: RoundingStrategy,
    order: &[usize],
) {
    if remainder.is_zero() || amounts.is_empty() {
        return;
    }
    match strategy {
        RoundingStrategy::Distribute => distribute_units(amounts, remainder, precision, order),
        RoundingStrategy::Largest => {
            let last = amounts.len() - 1;
            amounts[last] += remainder;
        }
        RoundingStrategy::Smallest => amounts[0] += remainder,
    }
}

/// Nudge shares by one unit-at-precision each, cycling through `order`,
/// until the remainder is exhausted. Any residue finer than the unit (a
/// total carrying more decimals than the precision) lands on the first
/// share in order so the sum invariant still holds exactly.
fn distribute_units(amounts: &mut [Decimal], remainder: Decimal, precision: u32, order: &[usize]) {
    if remainder.is_zero() || order.is_empty() {
        return;
    }
    let unit = unit_at(precision);
    let step = if remainder.is_sign_negative() {
        -unit
    } else {
        unit
    };
    let mut left = remainder;
    let mut i = 0usize;
    while left.abs() >= unit {
        amounts[order[i % order.len()]] += step;
        left -= step;
        i += 1;
    }
    if !left.is_zero() {
        amounts[order[0]] += left;
    }
}

fn build_results(
    ids: &[&str],
    amounts: &[Decimal],
    base: &[Decimal],
    total: Decimal,
    precision: u32,
) -> Vec<SplitResult> {
    let unit = unit_at(precision);
    ids.iter()
        .zip(amounts.iter().zip(base))
        .map(|(&id, (&amount, &base))| SplitResult {
            user_id: id.to_string(),
            amount,
            percentage: (amount / total * Decimal::ONE_HUNDRED).round_dp(2),
            is_adjusted: (amount - base).abs() >= unit,
        })
        .collect()
}
