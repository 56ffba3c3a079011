// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Monthly materialisation of recurring expenses.
//!
//! Every expense whose recurring type is MONTHLY acts as a template. Once per
//! calendar month the generator inserts one dated copy for each
//! (title, category) pair that has no MONTHLY expense in the month yet, then
//! records the month in preferences so later runs short-circuit. The stamp is
//! written after the loop; an error mid-loop leaves it unset and the next run
//! retries, skipping templates already materialised.

use crate::commands::expenses::{expense_from_row, insert_expense, EXPENSE_COLUMNS};
use crate::models::{Expense, RecurringType};
use crate::utils::{
    checked_add, fmt_money, get_tracking_currency, load_preferences, maybe_print_json,
    month_bounds, now_local, pretty_table,
};
use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDateTime};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("run", _)) => match generate_monthly_if_needed(conn, now_local())? {
            Some(report) => println!(
                "Generated {} recurring expense(s) for {}-{:02} from {} template(s)",
                report.inserted.len(),
                report.year,
                report.month,
                report.templates
            ),
            None => println!("Recurring expenses already generated for this month."),
        },
        Some(("list", sub)) => {
            let items = recurring_expenses(conn)?;
            if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &items)? {
                return Ok(());
            }
            let tracking = get_tracking_currency(conn)?;
            let data = items
                .iter()
                .map(|e| {
                    vec![
                        e.date.format("%Y-%m-%d").to_string(),
                        e.title.clone(),
                        e.category.clone(),
                        fmt_money(&e.amount, &tracking),
                        e.recurring_type.to_string(),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["Date", "Title", "Category", "Amount", "Recurring"], data)
            );
            println!("Monthly total: {}", fmt_money(&monthly_total(&items)?, &tracking));
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub year: i32,
    pub month: u32,
    /// Number of MONTHLY rows considered as templates.
    pub templates: usize,
    pub inserted: Vec<Expense>,
}

/// Materialise this month's copies of MONTHLY expenses unless that already
/// happened for the month of `now`. Returns `None` on the short-circuit.
pub fn generate_monthly_if_needed(
    conn: &Connection,
    now: NaiveDateTime,
) -> Result<Option<GenerationReport>> {
    let (year, month) = (now.year(), now.month());
    let prefs = load_preferences(conn)?;
    if prefs.last_recurring_generation == Some((year, month)) {
        tracing::debug!(year, month, "recurring expenses already generated");
        return Ok(None);
    }

    let templates = monthly_templates(conn)?;
    let (month_start, month_end) = month_bounds(year, month)?;

    let mut inserted = Vec::new();
    for template in &templates {
        let existing = count_matching_in_window(
            conn,
            &template.title,
            &template.category,
            month_start,
            month_end,
        )?;
        if existing > 0 {
            continue;
        }
        let mut copy = Expense {
            id: 0,
            title: template.title.clone(),
            amount: template.amount,
            category: template.category.clone(),
            date: now,
            recurring_type: RecurringType::Monthly,
            original_amount: template.original_amount,
            original_currency: template.original_currency.clone(),
        };
        copy.id = insert_expense(conn, &copy)?;
        tracing::info!(title = %copy.title, category = %copy.category, "recurring expense generated");
        inserted.push(copy);
    }

    set_generation_stamp(conn, year, month)?;
    Ok(Some(GenerationReport {
        year,
        month,
        templates: templates.len(),
        inserted,
    }))
}

/// All MONTHLY expenses, including copies generated in earlier months.
pub fn monthly_templates(conn: &Connection) -> Result<Vec<Expense>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE recurring_type = ?1"
    ))?;
    let rows = stmt.query_map(params![RecurringType::Monthly], expense_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Every expense that recurs (weekly or monthly), newest first.
pub fn recurring_expenses(conn: &Connection) -> Result<Vec<Expense>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE recurring_type != 'NONE' ORDER BY date DESC, id DESC"
    ))?;
    let rows = stmt.query_map([], expense_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn count_matching_in_window(
    conn: &Connection,
    title: &str,
    category: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<i64> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM expenses
         WHERE title=?1 AND category=?2 AND recurring_type=?3 AND date >= ?4 AND date < ?5",
        params![title, category, RecurringType::Monthly, start, end],
        |r| r.get(0),
    )?;
    Ok(n)
}

fn set_generation_stamp(conn: &Connection, year: i32, month: u32) -> Result<()> {
    let n = conn.execute(
        "UPDATE user_preferences SET last_recurring_month=?1, last_recurring_year=?2 WHERE id=1",
        params![month, year],
    )?;
    if n == 0 {
        let prefs = crate::models::UserPreferences {
            last_recurring_generation: Some((year, month)),
            ..Default::default()
        };
        crate::utils::save_preferences(conn, &prefs)?;
    }
    Ok(())
}

/// Monthly cost of recurring expenses: weekly items count four times.
pub fn monthly_total(expenses: &[Expense]) -> Result<Decimal> {
    let mut total = Decimal::ZERO;
    for e in expenses {
        let monthly = match e.recurring_type {
            RecurringType::Weekly => e
                .amount
                .checked_mul(Decimal::from(4))
                .ok_or_else(|| anyhow!("amount out of range: {}", e.amount))?,
            RecurringType::Monthly => e.amount,
            RecurringType::None => continue,
        };
        total = checked_add(total, monthly)?;
    }
    Ok(total)
}
