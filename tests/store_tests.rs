// Copyright (c) 2025 Splitledger contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use splitledger::db;
use splitledger::models::{ExpenseSplit, Member, MemberRole};
use splitledger::store::{
    self, ExpenseFilter, NewExpense, NewSettlement,
};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn member(user_id: &str, role: MemberRole) -> Member {
    Member {
        user_id: user_id.to_string(),
        name: user_id.to_string(),
        email: format!("{}@example.com", user_id),
        role,
        joined_at: 1_700_000_000_000,
    }
}

fn setup() -> (Connection, i64) {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    let group_id = store::create_group(&mut conn, "trip", &member("alice", MemberRole::Admin)).unwrap();
    store::add_member(&conn, group_id, &member("bob", MemberRole::Member)).unwrap();
    (conn, group_id)
}

fn splits(parts: &[(&str, &str)]) -> Vec<ExpenseSplit> {
    parts
        .iter()
        .map(|(user, amount)| ExpenseSplit {
            user_id: user.to_string(),
            amount: dec(amount),
            is_paid: false,
        })
        .collect()
}

fn new_expense(paid_by: &str, amount: &str, parts: &[(&str, &str)]) -> NewExpense {
    NewExpense {
        date: date("2025-06-01"),
        amount: dec(amount),
        description: "dinner".into(),
        paid_by: paid_by.into(),
        category: Some("food".into()),
        splits: splits(parts),
        created_by: paid_by.into(),
    }
}

#[test]
fn create_group_makes_creator_admin() {
    let (conn, group_id) = setup();
    assert_eq!(
        store::member_role(&conn, group_id, "alice").unwrap(),
        Some(MemberRole::Admin)
    );
    let members = store::fetch_group_members(&conn, group_id).unwrap();
    assert_eq!(members.len(), 2);
}

#[test]
fn duplicate_member_is_rejected() {
    let (conn, group_id) = setup();
    let err = store::add_member(&conn, group_id, &member("bob", MemberRole::Member)).unwrap_err();
    assert!(err.to_string().contains("already a member"));
}

#[test]
fn last_admin_cannot_be_removed_or_demoted() {
    let (conn, group_id) = setup();
    let err = store::remove_member(&conn, group_id, "alice").unwrap_err();
    assert!(err.to_string().contains("at least one admin"));
    let err =
        store::set_member_role(&conn, group_id, "alice", MemberRole::Member).unwrap_err();
    assert!(err.to_string().contains("at least one admin"));

    // With a second admin both operations go through
    store::set_member_role(&conn, group_id, "bob", MemberRole::Admin).unwrap();
    store::set_member_role(&conn, group_id, "alice", MemberRole::Member).unwrap();
    store::remove_member(&conn, group_id, "alice").unwrap();
    assert!(!store::member_exists(&conn, group_id, "alice").unwrap());
}

#[test]
fn persist_expense_roundtrips_with_splits() {
    let (mut conn, group_id) = setup();
    let id = store::persist_expense(
        &mut conn,
        group_id,
        &new_expense("alice", "10.00", &[("alice", "5.00"), ("bob", "5.00")]),
    )
    .unwrap();
    let expenses = store::fetch_all_group_expenses(&conn, group_id).unwrap();
    assert_eq!(expenses.len(), 1);
    let e = &expenses[0];
    assert_eq!(e.id, id);
    assert_eq!(e.amount, dec("10.00"));
    assert_eq!(e.paid_by, "alice");
    assert_eq!(e.splits.len(), 2);
    assert_eq!(e.splits.iter().map(|s| s.amount).sum::<Decimal>(), dec("10.00"));
}

#[test]
fn persist_expense_rejects_unbalanced_splits() {
    let (mut conn, group_id) = setup();
    let err = store::persist_expense(
        &mut conn,
        group_id,
        &new_expense("alice", "10.00", &[("alice", "5.00"), ("bob", "4.00")]),
    )
    .unwrap_err();
    assert!(err.to_string().contains("Splits sum to"));
    // Nothing was written
    assert!(store::fetch_all_group_expenses(&conn, group_id).unwrap().is_empty());
}

#[test]
fn persist_expense_rejects_negative_split_amounts() {
    let (mut conn, group_id) = setup();
    // Sum still balances at 50.00, so only the sign check can reject this
    let err = store::persist_expense(
        &mut conn,
        group_id,
        &new_expense("alice", "50.00", &[("alice", "-5.00"), ("bob", "55.00")]),
    )
    .unwrap_err();
    assert!(err.to_string().contains("non-negative"));
    assert!(store::fetch_all_group_expenses(&conn, group_id).unwrap().is_empty());
}

#[test]
fn persist_expense_rejects_unknown_members() {
    let (mut conn, group_id) = setup();
    let err = store::persist_expense(
        &mut conn,
        group_id,
        &new_expense("mallory", "10.00", &[("alice", "5.00"), ("bob", "5.00")]),
    )
    .unwrap_err();
    assert!(err.to_string().contains("not a member"));

    let err = store::persist_expense(
        &mut conn,
        group_id,
        &new_expense("alice", "10.00", &[("alice", "5.00"), ("mallory", "5.00")]),
    )
    .unwrap_err();
    assert!(err.to_string().contains("not a member"));
}

#[test]
fn expense_pagination_walks_the_full_history() {
    let (mut conn, group_id) = setup();
    for i in 0..7 {
        store::persist_expense(
            &mut conn,
            group_id,
            &new_expense("alice", "10.00", &[("alice", "5.00"), ("bob", "5.00")]),
        )
        .unwrap_or_else(|_| panic!("insert {}", i));
    }

    let mut filter = ExpenseFilter {
        limit: 3,
        ..Default::default()
    };
    let first = store::fetch_group_expenses(&conn, group_id, &filter).unwrap();
    assert_eq!(first.items.len(), 3);
    assert!(first.has_more);
    filter.cursor = first.next_cursor;
    let second = store::fetch_group_expenses(&conn, group_id, &filter).unwrap();
    assert_eq!(second.items.len(), 3);
    assert!(second.has_more);
    filter.cursor = second.next_cursor;
    let third = store::fetch_group_expenses(&conn, group_id, &filter).unwrap();
    assert_eq!(third.items.len(), 1);
    assert!(!third.has_more);
    assert_eq!(third.next_cursor, None);

    assert_eq!(store::fetch_all_group_expenses(&conn, group_id).unwrap().len(), 7);
}

#[test]
fn expense_date_filter_limits_the_range() {
    let (mut conn, group_id) = setup();
    for day in ["2025-06-01", "2025-06-15", "2025-07-01"] {
        let mut e = new_expense("alice", "10.00", &[("alice", "5.00"), ("bob", "5.00")]);
        e.date = date(day);
        store::persist_expense(&mut conn, group_id, &e).unwrap();
    }
    let filter = ExpenseFilter {
        from: Some(date("2025-06-10")),
        to: Some(date("2025-06-30")),
        ..Default::default()
    };
    let page = store::fetch_group_expenses(&conn, group_id, &filter).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].date, date("2025-06-15"));
}

#[test]
fn settlement_validation_and_roundtrip() {
    let (conn, group_id) = setup();
    let err = store::persist_settlement(
        &conn,
        group_id,
        &NewSettlement {
            from_user: "bob".into(),
            to_user: "bob".into(),
            amount: dec("5"),
            date: date("2025-06-02"),
            notes: None,
            related_expense_ids: Vec::new(),
        },
    )
    .unwrap_err();
    assert!(err.to_string().contains("themselves"));

    let id = store::persist_settlement(
        &conn,
        group_id,
        &NewSettlement {
            from_user: "bob".into(),
            to_user: "alice".into(),
            amount: dec("5.50"),
            date: date("2025-06-02"),
            notes: Some("cash".into()),
            related_expense_ids: vec![1, 2],
        },
    )
    .unwrap();
    let settlements = store::fetch_all_group_settlements(&conn, group_id).unwrap();
    assert_eq!(settlements.len(), 1);
    assert_eq!(settlements[0].id, id);
    assert_eq!(settlements[0].amount, dec("5.50"));
    assert_eq!(settlements[0].related_expense_ids, vec![1, 2]);
}

#[test]
fn expense_deletion_requires_creator_or_admin() {
    let (mut conn, group_id) = setup();
    store::add_member(&conn, group_id, &member("carol", MemberRole::Member)).unwrap();
    let mut e = new_expense("bob", "10.00", &[("alice", "5.00"), ("bob", "5.00")]);
    e.created_by = "bob".into();
    let id = store::persist_expense(&mut conn, group_id, &e).unwrap();

    let err = store::delete_expense(&conn, group_id, id, "carol").unwrap_err();
    assert!(err.to_string().contains("only its creator or an admin"));

    // The creator may delete their own expense
    store::delete_expense(&conn, group_id, id, "bob").unwrap();
    assert!(store::fetch_all_group_expenses(&conn, group_id).unwrap().is_empty());

    // An admin may delete anyone's expense
    let id = store::persist_expense(&mut conn, group_id, &e).unwrap();
    store::delete_expense(&conn, group_id, id, "alice").unwrap();
    assert!(store::fetch_all_group_expenses(&conn, group_id).unwrap().is_empty());
}
