// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::fx::{has_rates, last_update};
use crate::utils::{now_local, pretty_table};
use anyhow::Result;
use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;

/// Rates older than this are reported as stale.
pub const STALE_AFTER_HOURS: i64 = 24;

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = diagnose(conn, now_local())?;
    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

pub fn diagnose(conn: &Connection, now: NaiveDateTime) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    // 1) Rate cache state
    if !has_rates(conn)? {
        rows.push(vec![
            "no_rates".into(),
            "exchange rate table is empty; conversions fall back to 1:1".into(),
        ]);
    } else if let Some(last) = last_update(conn)? {
        if now - last > Duration::hours(STALE_AFTER_HOURS) {
            rows.push(vec!["stale_rates".into(), format!("last refresh {}", last)]);
        }
    }

    // 2) Entered currencies without a stored rate
    let mut stmt = conn.prepare(
        "SELECT DISTINCT original_currency FROM (
             SELECT original_currency FROM expenses
             UNION SELECT original_currency FROM income
             UNION SELECT currency_code FROM budget_limits
         )
         WHERE original_currency IS NOT NULL
           AND original_currency NOT IN (SELECT currency_code FROM exchange_rates)
         ORDER BY original_currency",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let c: String = r.get(0)?;
        if c != "USD" {
            rows.push(vec!["missing_rate".into(), c]);
        }
    }

    // 3) More than one MONTHLY copy of a (title, category) in the same month
    let mut stmt = conn.prepare(
        "SELECT substr(date,1,7) AS month, title, category, COUNT(*)
         FROM expenses WHERE recurring_type='MONTHLY'
         GROUP BY month, title, category HAVING COUNT(*) > 1
         ORDER BY month, title",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let month: String = r.get(0)?;
        let title: String = r.get(1)?;
        let category: String = r.get(2)?;
        let n: i64 = r.get(3)?;
        rows.push(vec![
            "duplicate_recurring".into(),
            format!("{} '{}' / {} x{}", month, title, category, n),
        ]);
    }

    Ok(rows)
}
