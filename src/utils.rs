// Copyright (c) 2025 Splitledger contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn now_epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Coerce the duck-typed timestamps found in hosted-store exports into
/// epoch milliseconds: a raw epoch number, a `{seconds, nanoseconds}`
/// driver object, or an RFC 3339 string. Conversion happens once at this
/// boundary; everything past it works with plain integers.
pub fn to_epoch_millis(raw: &serde_json::Value) -> Result<i64> {
    match raw {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if let Some(f) = n.as_f64() {
                Ok(f.round() as i64)
            } else {
                Err(anyhow!("Timestamp {} out of range", n))
            }
        }
        serde_json::Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .and_then(serde_json::Value::as_i64)
                .ok_or_else(|| anyhow!("Timestamp object without integer 'seconds' field"))?;
            let nanos = map
                .get("nanoseconds")
                .and_then(serde_json::Value::as_i64)
                .unwrap_or(0);
            Ok(seconds * 1000 + nanos / 1_000_000)
        }
        serde_json::Value::String(s) => {
            let dt = chrono::DateTime::parse_from_rfc3339(s)
                .with_context(|| format!("Invalid RFC 3339 timestamp '{}'", s))?;
            Ok(dt.timestamp_millis())
        }
        other => Err(anyhow!("Unsupported timestamp value: {}", other)),
    }
}

pub fn fmt_epoch_millis(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Parse "a,b,c" into a list of ids.
pub fn parse_user_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse "alice=10,bob=20.50" into per-user decimals.
pub fn parse_assignments(s: &str) -> Result<HashMap<String, Decimal>> {
    let mut out = HashMap::new();
    for pair in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (user, amount) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid assignment '{}', expected user=amount", pair))?;
        out.insert(user.trim().to_string(), parse_decimal(amount.trim())?);
    }
    Ok(out)
}

pub fn parse_id_list(s: &str) -> Result<Vec<i64>> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<i64>()
                .with_context(|| format!("Invalid id '{}'", p))
        })
        .collect()
}

pub fn id_for_group(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM groups WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Group '{}' not found", name))?;
    Ok(id)
}
