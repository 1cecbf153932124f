// Copyright (c) 2025 Splitledger contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Balance aggregator: folds a group's complete expense and settlement
//! history into per-member paid/share totals, net balances, and pairwise
//! who-owes-whom breakdowns.
//!
//! Pure and deterministic: for fixed inputs the output is identical
//! regardless of record order. Callers must pass complete, unpaginated
//! lists; there is no internal caching.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::error::LedgerError;
use crate::models::{Member, MemberBalance, MissingMemberPolicy, Settlement, SharedExpense};

/// Compute every member's balance from the full expense and settlement
/// history of a group.
///
/// A member's own split on an expense they paid is included in
/// `total_share`, so `net_balance = total_paid - total_share` holds
/// uniformly; it contributes nothing to the cross-member maps. Settlements
/// reduce the directional maps (floored at zero, overpay excess dropped)
/// but never change the paid/share totals: net balance reflects the
/// expense ledger alone.
pub fn compute_balances(
    members: &[Member],
    expenses: &[SharedExpense],
    settlements: &[Settlement],
    policy: MissingMemberPolicy,
) -> Result<HashMap<String, MemberBalance>, LedgerError> {
    let mut balances: HashMap<String, MemberBalance> = members
        .iter()
        .map(|m| (m.user_id.clone(), MemberBalance::default()))
        .collect();

    for expense in expenses {
        let payer_known = balances.contains_key(&expense.paid_by);
        if !payer_known && policy == MissingMemberPolicy::Strict {
            return Err(LedgerError::UnknownPayer {
                expense_id: expense.id,
                user_id: expense.paid_by.clone(),
            });
        }
        if let Some(b) = balances.get_mut(&expense.paid_by) {
            b.total_paid += expense.amount;
        }
        for split in &expense.splits {
            if !balances.contains_key(&split.user_id) {
                if policy == MissingMemberPolicy::Strict {
                    return Err(LedgerError::UnknownSplitMember {
                        expense_id: expense.id,
                        user_id: split.user_id.clone(),
                    });
                }
                continue;
            }
            if let Some(b) = balances.get_mut(&split.user_id) {
                b.total_share += split.amount;
            }
            if split.user_id != expense.paid_by && payer_known {
                if let Some(b) = balances.get_mut(&split.user_id) {
                    *b.owes_to_others
                        .entry(expense.paid_by.clone())
                        .or_insert(Decimal::ZERO) += split.amount;
                }
                if let Some(b) = balances.get_mut(&expense.paid_by) {
                    *b.owed_by_others
                        .entry(split.user_id.clone())
                        .or_insert(Decimal::ZERO) += split.amount;
                }
            }
        }
    }

    for settlement in settlements {
        let unknown = [&settlement.from_user, &settlement.to_user]
            .into_iter()
            .find(|party| !balances.contains_key(*party));
        if let Some(party) = unknown {
            if policy == MissingMemberPolicy::Strict {
                return Err(LedgerError::UnknownSettlementParty {
                    settlement_id: settlement.id,
                    user_id: party.clone(),
                });
            }
            continue;
        }
        if let Some(b) = balances.get_mut(&settlement.from_user) {
            reduce_debt(&mut b.owes_to_others, &settlement.to_user, settlement.amount);
        }
        if let Some(b) = balances.get_mut(&settlement.to_user) {
            reduce_debt(&mut b.owed_by_others, &settlement.from_user, settlement.amount);
        }
    }

    for b in balances.values_mut() {
        b.net_balance = b.total_paid - b.total_share;
    }
    Ok(balances)
}

/// Reduce a tracked debt, flooring at zero. A settlement can overpay
/// relative to the computed debt; the excess is dropped rather than
/// letting the entry go negative, so the clamp stays order-independent.
fn reduce_debt(map: &mut HashMap<String, Decimal>, other: &str, amount: Decimal) {
    if let Some(owed) = map.get_mut(other) {
        *owed -= amount;
        if *owed <= Decimal::ZERO {
            map.remove(other);
        }
    }
}
