// Copyright (c) 2025 Splitledger contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Member, MemberRole};
use crate::store;
use crate::utils::{fmt_epoch_millis, id_for_group, maybe_print_json, now_epoch_millis, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("create", sub)) => create(conn, sub)?,
        Some(("add-member", sub)) => add_member(conn, sub)?,
        Some(("remove-member", sub)) => remove_member(conn, sub)?,
        Some(("set-role", sub)) => set_role(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("members", sub)) => members(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn create(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim();
    let creator = Member {
        user_id: sub.get_one::<String>("user").unwrap().trim().to_string(),
        name: sub.get_one::<String>("user-name").unwrap().trim().to_string(),
        email: sub.get_one::<String>("email").unwrap().trim().to_string(),
        role: MemberRole::Admin,
        joined_at: now_epoch_millis(),
    };
    let group_id = store::create_group(conn, name, &creator)?;
    println!(
        "Created group '{}' (id {}) with admin '{}'",
        name, group_id, creator.user_id
    );
    Ok(())
}

fn add_member(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let group = sub.get_one::<String>("group").unwrap();
    let group_id = id_for_group(conn, group)?;
    let member = Member {
        user_id: sub.get_one::<String>("user").unwrap().trim().to_string(),
        name: sub.get_one::<String>("name").unwrap().trim().to_string(),
        email: sub.get_one::<String>("email").unwrap().trim().to_string(),
        role: sub.get_one::<String>("role").unwrap().parse()?,
        joined_at: now_epoch_millis(),
    };
    store::add_member(conn, group_id, &member)?;
    println!(
        "Added '{}' to '{}' as {}",
        member.user_id,
        group,
        member.role.as_str()
    );
    Ok(())
}

fn remove_member(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let group = sub.get_one::<String>("group").unwrap();
    let user = sub.get_one::<String>("user").unwrap();
    let group_id = id_for_group(conn, group)?;
    store::remove_member(conn, group_id, user)?;
    println!("Removed '{}' from '{}'", user, group);
    Ok(())
}

fn set_role(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let group = sub.get_one::<String>("group").unwrap();
    let user = sub.get_one::<String>("user").unwrap();
    let role: MemberRole = sub.get_one::<String>("role").unwrap().parse()?;
    let group_id = id_for_group(conn, group)?;
    store::set_member_role(conn, group_id, user, role)?;
    println!("'{}' is now {} in '{}'", user, role.as_str(), group);
    Ok(())
}

#[derive(Serialize)]
struct GroupRow {
    name: String,
    created_by: String,
    created: String,
    members: i64,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let mut stmt = conn.prepare(
        "SELECT g.name, g.created_by, g.created_at,
                (SELECT COUNT(*) FROM members m WHERE m.group_id=g.id)
         FROM groups g ORDER BY g.name",
    )?;
    let mut rows = stmt.query([])?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let created_at: i64 = r.get(2)?;
        data.push(GroupRow {
            name: r.get(0)?,
            created_by: r.get(1)?,
            created: fmt_epoch_millis(created_at),
            members: r.get(3)?,
        });
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|g| {
                vec![
                    g.name.clone(),
                    g.created_by.clone(),
                    g.created.clone(),
                    g.members.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Group", "Created by", "Created", "Members"], rows)
        );
    }
    Ok(())
}

fn members(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let group = sub.get_one::<String>("group").unwrap();
    let group_id = id_for_group(conn, group)?;
    let members = store::fetch_group_members(conn, group_id)?;
    if !maybe_print_json(json_flag, jsonl_flag, &members)? {
        let rows: Vec<Vec<String>> = members
            .iter()
            .map(|m| {
                vec![
                    m.user_id.clone(),
                    m.name.clone(),
                    m.email.clone(),
                    m.role.as_str().to_string(),
                    fmt_epoch_millis(m.joined_at),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["User", "Name", "Email", "Role", "Joined"], rows)
        );
    }
    Ok(())
}
