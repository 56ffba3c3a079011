// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::categories::ensure_category;
use crate::models::{Expense, RecurringType};
use crate::utils::{
    add_recent_currency, checked_sum, convert_entry, decimal_col, fmt_money,
    get_tracking_currency, load_preferences, maybe_print_json, month_bounds, now_local,
    opt_decimal_col, parse_currency, parse_date, parse_decimal, parse_month, pretty_table,
    running_totals,
};
use anyhow::{anyhow, Result};
use chrono::{NaiveDateTime, NaiveTime};
use rusqlite::{params, params_from_iter, Connection, Row, ToSql};
use rust_decimal::Decimal;

pub const EXPENSE_COLUMNS: &str =
    "id, title, amount, category, date, recurring_type, original_amount, original_currency";

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            if delete_expense(conn, id)? {
                println!("Removed expense #{}", id);
            } else {
                return Err(anyhow!("Expense #{} not found", id));
            }
        }
        Some(("total", sub)) => {
            let rows = query_rows(conn, sub)?;
            let total = checked_sum(rows.iter().map(|e| e.amount))?;
            println!("{}", fmt_money(&total, &get_tracking_currency(conn)?));
        }
        _ => {}
    }
    Ok(())
}

pub fn expense_from_row(r: &Row<'_>) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: r.get(0)?,
        title: r.get(1)?,
        amount: decimal_col(r, 2)?,
        category: r.get(3)?,
        date: r.get(4)?,
        recurring_type: r.get(5)?,
        original_amount: opt_decimal_col(r, 6)?,
        original_currency: r.get(7)?,
    })
}

/// Insert a fully-formed expense (amount already in tracking currency).
pub fn insert_expense(conn: &Connection, e: &Expense) -> Result<i64> {
    conn.execute(
        "INSERT INTO expenses(title, amount, category, date, recurring_type, original_amount, original_currency)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            e.title,
            e.amount.to_string(),
            e.category,
            e.date,
            e.recurring_type,
            e.original_amount.map(|d| d.to_string()),
            e.original_currency,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Record an expense entered in `entry_ccy`, storing the amount in the
/// tracking currency and keeping the entered values when they differ.
pub fn record_expense(
    conn: &Connection,
    title: &str,
    amount: Decimal,
    entry_ccy: &str,
    category: &str,
    date: NaiveDateTime,
    recurring_type: RecurringType,
) -> Result<Expense> {
    let title = title.trim();
    if title.is_empty() {
        return Err(anyhow!("Expense title must not be empty"));
    }
    if amount <= Decimal::ZERO {
        return Err(anyhow!("Expense amount must be positive, got {}", amount));
    }
    ensure_category(conn, category)?;
    let entry = convert_entry(conn, amount, entry_ccy)?;
    let mut expense = Expense {
        id: 0,
        title: title.to_string(),
        amount: entry.amount,
        category: category.to_string(),
        date,
        recurring_type,
        original_amount: entry.original_amount,
        original_currency: entry.original_currency,
    };
    expense.id = insert_expense(conn, &expense)?;
    add_recent_currency(conn, entry_ccy)?;
    tracing::debug!(id = expense.id, title = %expense.title, "expense recorded");
    Ok(expense)
}

pub fn delete_expense(conn: &Connection, id: i64) -> Result<bool> {
    let n = conn.execute("DELETE FROM expenses WHERE id=?1", params![id])?;
    Ok(n > 0)
}

/// Every expense, newest first.
pub fn all_expenses(conn: &Connection) -> Result<Vec<Expense>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EXPENSE_COLUMNS} FROM expenses ORDER BY date DESC, id DESC"
    ))?;
    let rows = stmt.query_map([], expense_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let title = sub.get_one::<String>("title").unwrap();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let category = sub.get_one::<String>("category").unwrap().trim();
    let entry_ccy = match sub.get_one::<String>("currency") {
        Some(c) => parse_currency(c)?,
        None => load_preferences(conn)?.default_currency_expenses,
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

    let e = record_expense(conn, title, amount, &entry_ccy, category, date, recurring)?;
    let tracking = get_tracking_currency(conn)?;
    match (&e.original_amount, &e.original_currency) {
        (Some(oa), Some(oc)) => println!(
            "Recorded '{}' {} {} ({}) in {}",
            e.title,
            oa,
            oc,
            fmt_money(&e.amount, &tracking),
            e.category
        ),
        _ => println!(
            "Recorded '{}' {} in {}",
            e.title,
            fmt_money(&e.amount, &tracking),
            e.category
        ),
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if maybe_print_json(json_flag, jsonl_flag, &data)? {
        return Ok(());
    }
    let tracking = get_tracking_currency(conn)?;
    let totals = running_totals(&data.iter().map(|e| e.amount).collect::<Vec<_>>())?;
    let rows: Vec<Vec<String>> = data
        .iter()
        .zip(totals)
        .map(|(e, running)| {
            vec![
                e.id.to_string(),
                e.date.format("%Y-%m-%d").to_string(),
                e.title.clone(),
                e.category.clone(),
                fmt_money(&e.amount, &tracking),
                original_label(e.original_amount.as_ref(), e.original_currency.as_deref()),
                e.recurring_type.to_string(),
                fmt_money(&running, &tracking),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Date", "Title", "Category", "Amount", "Entered", "Recurring", "Running"],
            rows,
        )
    );
    Ok(())
}

pub(crate) fn original_label(amount: Option<&Decimal>, ccy: Option<&str>) -> String {
    match (amount, ccy) {
        (Some(a), Some(c)) => format!("{} {}", a, c),
        _ => String::new(),
    }
}

/// Expenses matching the `list`/`total` filters, newest first.
pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<Expense>> {
    let mut sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE 1=1");
    let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(month) = sub.get_one::<String>("month") {
        let (y, m) = parse_month(month)?;
        let (start, end) = month_bounds(y, m)?;
        sql.push_str(" AND date >= ? AND date < ?");
        params_vec.push(Box::new(start));
        params_vec.push(Box::new(end));
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        sql.push_str(" AND category = ?");
        params_vec.push(Box::new(cat.trim().to_string()));
    }
    if let Some(rt) = sub.get_one::<String>("recurring") {
        let rt: RecurringType = rt.parse()?;
        sql.push_str(" AND recurring_type = ?");
        params_vec.push(Box::new(rt));
    }
    sql.push_str(" ORDER BY date DESC, id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(Box::new(*limit as i64));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params_vec.iter()), expense_from_row)?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}
