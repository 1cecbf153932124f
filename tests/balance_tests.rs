// Copyright (c) 2025 Splitledger contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use splitledger::balance::compute_balances;
use splitledger::error::LedgerError;
use splitledger::models::{
    ExpenseSplit, Member, MemberRole, MissingMemberPolicy, Settlement, SharedExpense,
};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

fn member(user_id: &str) -> Member {
    Member {
        user_id: user_id.to_string(),
        name: user_id.to_string(),
        email: format!("{}@example.com", user_id),
        role: MemberRole::Member,
        joined_at: 0,
    }
}

fn expense(id: i64, paid_by: &str, amount: &str, splits: &[(&str, &str)]) -> SharedExpense {
    SharedExpense {
        id,
        group_id: 1,
        date: date(),
        amount: dec(amount),
        description: format!("expense {}", id),
        paid_by: paid_by.to_string(),
        category: None,
        splits: splits
            .iter()
            .map(|(user, amount)| ExpenseSplit {
                user_id: user.to_string(),
                amount: dec(amount),
                is_paid: false,
            })
            .collect(),
        created_by: paid_by.to_string(),
        created_at: 0,
    }
}

fn settlement(id: i64, from: &str, to: &str, amount: &str) -> Settlement {
    Settlement {
        id,
        group_id: 1,
        from_user: from.to_string(),
        to_user: to.to_string(),
        amount: dec(amount),
        date: date(),
        notes: None,
        related_expense_ids: Vec::new(),
    }
}

#[test]
fn dinner_for_two_produces_mirrored_balances() {
    let members = vec![member("alice"), member("bob")];
    let expenses = vec![expense(
        1,
        "alice",
        "100",
        &[("alice", "50"), ("bob", "50")],
    )];
    let balances =
        compute_balances(&members, &expenses, &[], MissingMemberPolicy::Strict).unwrap();

    let alice = &balances["alice"];
    assert_eq!(alice.total_paid, dec("100"));
    assert_eq!(alice.total_share, dec("50"));
    assert_eq!(alice.net_balance, dec("50"));
    assert_eq!(alice.owed_by_others["bob"], dec("50"));
    assert!(alice.owes_to_others.is_empty());

    let bob = &balances["bob"];
    assert_eq!(bob.total_paid, Decimal::ZERO);
    assert_eq!(bob.total_share, dec("50"));
    assert_eq!(bob.net_balance, dec("-50"));
    assert_eq!(bob.owes_to_others["alice"], dec("50"));
    assert!(bob.owed_by_others.is_empty());
}

#[test]
fn settlement_clears_pairwise_debt_but_not_net_balance() {
    let members = vec![member("alice"), member("bob")];
    let expenses = vec![expense(
        1,
        "alice",
        "100",
        &[("alice", "50"), ("bob", "50")],
    )];
    let settlements = vec![settlement(1, "bob", "alice", "50")];
    let balances = compute_balances(
        &members,
        &expenses,
        &settlements,
        MissingMemberPolicy::Strict,
    )
    .unwrap();

    let alice = &balances["alice"];
    let bob = &balances["bob"];
    assert_eq!(bob.owes_to_others.get("alice").copied().unwrap_or_default(), Decimal::ZERO);
    assert_eq!(alice.owed_by_others.get("bob").copied().unwrap_or_default(), Decimal::ZERO);
    // Net balance reflects the expense ledger only
    assert_eq!(alice.net_balance, dec("50"));
    assert_eq!(bob.net_balance, dec("-50"));
}

#[test]
fn partial_settlement_leaves_the_remainder() {
    let members = vec![member("alice"), member("bob")];
    let expenses = vec![expense(
        1,
        "alice",
        "100",
        &[("alice", "50"), ("bob", "50")],
    )];
    let settlements = vec![settlement(1, "bob", "alice", "20")];
    let balances = compute_balances(
        &members,
        &expenses,
        &settlements,
        MissingMemberPolicy::Strict,
    )
    .unwrap();
    assert_eq!(balances["bob"].owes_to_others["alice"], dec("30"));
    assert_eq!(balances["alice"].owed_by_others["bob"], dec("30"));
}

#[test]
fn settlement_overpay_floors_at_zero() {
    let members = vec![member("alice"), member("bob")];
    let expenses = vec![expense(
        1,
        "alice",
        "100",
        &[("alice", "50"), ("bob", "50")],
    )];
    let settlements = vec![settlement(1, "bob", "alice", "80")];
    let balances = compute_balances(
        &members,
        &expenses,
        &settlements,
        MissingMemberPolicy::Strict,
    )
    .unwrap();
    assert_eq!(
        balances["bob"].owes_to_others.get("alice").copied().unwrap_or_default(),
        Decimal::ZERO
    );
    assert_eq!(
        balances["alice"].owed_by_others.get("bob").copied().unwrap_or_default(),
        Decimal::ZERO
    );
}

#[test]
fn payer_own_split_counts_toward_share_without_pairwise_debt() {
    let members = vec![member("alice")];
    let expenses = vec![expense(1, "alice", "100", &[("alice", "100")])];
    let balances =
        compute_balances(&members, &expenses, &[], MissingMemberPolicy::Strict).unwrap();
    let alice = &balances["alice"];
    assert_eq!(alice.total_paid, dec("100"));
    assert_eq!(alice.total_share, dec("100"));
    assert_eq!(alice.net_balance, Decimal::ZERO);
    assert!(alice.owes_to_others.is_empty());
    assert!(alice.owed_by_others.is_empty());
}

#[test]
fn members_without_activity_get_zeroed_balances() {
    let members = vec![member("alice"), member("bob"), member("carol")];
    let expenses = vec![expense(1, "alice", "30", &[("alice", "15"), ("bob", "15")])];
    let balances =
        compute_balances(&members, &expenses, &[], MissingMemberPolicy::Strict).unwrap();
    let carol = &balances["carol"];
    assert_eq!(*carol, splitledger::models::MemberBalance::default());
}

#[test]
fn recomputation_is_idempotent() {
    let members = vec![member("alice"), member("bob"), member("carol")];
    let expenses = vec![
        expense(1, "alice", "90", &[("alice", "30"), ("bob", "30"), ("carol", "30")]),
        expense(2, "bob", "45", &[("bob", "15"), ("carol", "30")]),
    ];
    let settlements = vec![settlement(1, "carol", "alice", "10")];
    let first = compute_balances(
        &members,
        &expenses,
        &settlements,
        MissingMemberPolicy::Strict,
    )
    .unwrap();
    let second = compute_balances(
        &members,
        &expenses,
        &settlements,
        MissingMemberPolicy::Strict,
    )
    .unwrap();
    assert_eq!(first, second);
}

#[test]
fn record_order_does_not_change_the_output() {
    let members = vec![member("alice"), member("bob"), member("carol")];
    let mut expenses = vec![
        expense(1, "alice", "90", &[("alice", "30"), ("bob", "30"), ("carol", "30")]),
        expense(2, "bob", "45", &[("bob", "15"), ("carol", "30")]),
        expense(3, "carol", "12", &[("alice", "6"), ("bob", "6")]),
    ];
    let mut settlements = vec![
        settlement(1, "carol", "alice", "10"),
        settlement(2, "bob", "alice", "50"),
        settlement(3, "carol", "bob", "5"),
    ];
    let forward = compute_balances(
        &members,
        &expenses,
        &settlements,
        MissingMemberPolicy::Strict,
    )
    .unwrap();
    expenses.reverse();
    settlements.reverse();
    let backward = compute_balances(
        &members,
        &expenses,
        &settlements,
        MissingMemberPolicy::Strict,
    )
    .unwrap();
    assert_eq!(forward, backward);
}

#[test]
fn strict_policy_surfaces_unknown_references() {
    let members = vec![member("alice")];

    let bad_payer = vec![expense(7, "mallory", "10", &[("alice", "10")])];
    assert_eq!(
        compute_balances(&members, &bad_payer, &[], MissingMemberPolicy::Strict).unwrap_err(),
        LedgerError::UnknownPayer {
            expense_id: 7,
            user_id: "mallory".to_string()
        }
    );

    let bad_split = vec![expense(8, "alice", "10", &[("mallory", "10")])];
    assert_eq!(
        compute_balances(&members, &bad_split, &[], MissingMemberPolicy::Strict).unwrap_err(),
        LedgerError::UnknownSplitMember {
            expense_id: 8,
            user_id: "mallory".to_string()
        }
    );

    let bad_settlement = vec![settlement(9, "mallory", "alice", "10")];
    assert_eq!(
        compute_balances(&members, &[], &bad_settlement, MissingMemberPolicy::Strict).unwrap_err(),
        LedgerError::UnknownSettlementParty {
            settlement_id: 9,
            user_id: "mallory".to_string()
        }
    );
}

#[test]
fn permissive_policy_drops_unknown_references() {
    let members = vec![member("alice"), member("bob")];
    let expenses = vec![
        // mallory's split is dropped; bob's still counts against the payer
        expense(1, "alice", "100", &[("bob", "50"), ("mallory", "50")]),
        // unknown payer credits nobody, but known splits still accrue share
        expense(2, "mallory", "20", &[("bob", "20")]),
    ];
    let settlements = vec![settlement(1, "mallory", "alice", "10")];
    let balances = compute_balances(
        &members,
        &expenses,
        &settlements,
        MissingMemberPolicy::Permissive,
    )
    .unwrap();

    assert!(!balances.contains_key("mallory"));
    let alice = &balances["alice"];
    assert_eq!(alice.total_paid, dec("100"));
    assert_eq!(alice.owed_by_others["bob"], dec("50"));
    let bob = &balances["bob"];
    assert_eq!(bob.total_share, dec("70"));
    assert_eq!(bob.owes_to_others["alice"], dec("50"));
}
