// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::expenses::original_label;
use crate::models::{Income, RecurringType};
use crate::utils::{
    add_recent_currency, checked_add, convert_entry, decimal_col, fmt_money,
    get_tracking_currency, load_preferences, maybe_print_json, month_bounds, now_local,
    opt_decimal_col, parse_currency, parse_date, parse_decimal, parse_month, pretty_table,
    running_totals,
};
use anyhow::{anyhow, Result};
use chrono::{NaiveDateTime, NaiveTime};
use rusqlite::{params, params_from_iter, Connection, Row, ToSql};
use rust_decimal::Decimal;

const INCOME_COLUMNS: &str =
    "id, title, amount, source, date, recurring_type, notes, original_amount, original_currency";

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let n = conn.execute("DELETE FROM income WHERE id=?1", params![id])?;
            if n == 0 {
                return Err(anyhow!("Income #{} not found", id));
            }
            println!("Removed income #{}", id);
        }
        _ => {}
    }
    Ok(())
}

fn income_from_row(r: &Row<'_>) -> rusqlite::Result<Income> {
    Ok(Income {
        id: r.get(0)?,
        title: r.get(1)?,
        amount: decimal_col(r, 2)?,
        source: r.get(3)?,
        date: r.get(4)?,
        recurring_type: r.get(5)?,
        notes: r.get(6)?,
        original_amount: opt_decimal_col(r, 7)?,
        original_currency: r.get(8)?,
    })
}

#[allow(clippy::too_many_arguments)]
pub fn record_income(
    conn: &Connection,
    title: &str,
    amount: Decimal,
    entry_ccy: &str,
    source: &str,
    date: NaiveDateTime,
    recurring_type: RecurringType,
    notes: &str,
) -> Result<Income> {
    let title = title.trim();
    if title.is_empty() {
        return Err(anyhow!("Income title must not be empty"));
    }
    if amount <= Decimal::ZERO {
        return Err(anyhow!("Income amount must be positive, got {}", amount));
    }
    let entry = convert_entry(conn, amount, entry_ccy)?;
    conn.execute(
        "INSERT INTO income(title, amount, source, date, recurring_type, notes, original_amount, original_currency)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            title,
            entry.amount.to_string(),
            source.trim(),
            date,
            recurring_type,
            notes,
            entry.original_amount.map(|d| d.to_string()),
            entry.original_currency,
        ],
    )?;
    let id = conn.last_insert_rowid();
    add_recent_currency(conn, entry_ccy)?;
    Ok(Income {
        id,
        title: title.to_string(),
        amount: entry.amount,
        source: source.trim().to_string(),
        date,
        recurring_type,
        notes: notes.to_string(),
        original_amount: entry.original_amount,
        original_currency: entry.original_currency,
    })
}

/// Every income entry, newest first.
pub fn all_income(conn: &Connection) -> Result<Vec<Income>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INCOME_COLUMNS} FROM income ORDER BY date DESC, id DESC"
    ))?;
    let rows = stmt.query_map([], income_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Total income dated inside the given calendar month.
pub fn month_total(conn: &Connection, year: i32, month: u32) -> Result<Decimal> {
    let (start, end) = month_bounds(year, month)?;
    let mut stmt = conn.prepare("SELECT amount FROM income WHERE date >= ?1 AND date < ?2")?;
    let rows = stmt.query_map(params![start, end], |r| decimal_col(r, 0))?;
    let mut total = Decimal::ZERO;
    for row in rows {
        total = checked_add(total, row?)?;
    }
    Ok(total)
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let title = sub.get_one::<String>("title").unwrap();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let source = sub.get_one::<String>("source").unwrap();
    let notes = sub.get_one::<String>("notes").map(|s| s.as_str()).unwrap_or("");
    let entry_ccy = match sub.get_one::<String>("currency") {
        Some(c) => parse_currency(c)?,
        None => load_preferences(conn)?.default_currency_income,
    };
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?.and_time(NaiveTime::MIN),
        None => now_local(),
    };
    let recurring = sub
        .get_one::<String>("recurring")
        .map(|s| s.parse::<RecurringType>())
        .transpose()?
        .unwrap_or_default();

    let inc = record_income(conn, title, amount, &entry_ccy, source, date, recurring, notes)?;
    println!(
        "Recorded income '{}' {} from {}",
        inc.title,
        fmt_money(&inc.amount, &get_tracking_currency(conn)?),
        inc.source
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let mut sql = format!("SELECT {INCOME_COLUMNS} FROM income WHERE 1=1");
    let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();
    if let Some(month) = sub.get_one::<String>("month") {
        let (y, m) = parse_month(month)?;
        let (start, end) = month_bounds(y, m)?;
        sql.push_str(" AND date >= ? AND date < ?");
        params_vec.push(Box::new(start));
        params_vec.push(Box::new(end));
    }
    if let Some(source) = sub.get_one::<String>("source") {
        sql.push_str(" AND source = ?");
        params_vec.push(Box::new(source.trim().to_string()));
    }
    if let Some(rt) = sub.get_one::<String>("recurring") {
        let rt: RecurringType = rt.parse()?;
        sql.push_str(" AND recurring_type = ?");
        params_vec.push(Box::new(rt));
    }
    sql.push_str(" ORDER BY date DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params_vec.iter()), income_from_row)?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    if maybe_print_json(json_flag, jsonl_flag, &data)? {
        return Ok(());
    }

    let tracking = get_tracking_currency(conn)?;
    let totals = running_totals(&data.iter().map(|i| i.amount).collect::<Vec<_>>())?;
    let rows: Vec<Vec<String>> = data
        .iter()
        .zip(totals)
        .map(|(i, running)| {
            vec![
                i.id.to_string(),
                i.date.format("%Y-%m-%d").to_string(),
                i.title.clone(),
                i.source.clone(),
                fmt_money(&i.amount, &tracking),
                original_label(i.original_amount.as_ref(), i.original_currency.as_deref()),
                i.recurring_type.to_string(),
                fmt_money(&running, &tracking),
                i.notes.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Date", "Title", "Source", "Amount", "Entered", "Recurring", "Running", "Notes"],
            rows,
        )
    );
    Ok(())
}
