// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::expenses::all_expenses;
use crate::commands::recurring::{monthly_total, recurring_expenses};
use crate::models::Expense;
use crate::utils::{
    checked_add, checked_sum, fmt_money, fx_convert, get_tracking_currency, maybe_print_json,
    month_bounds, now_local, parse_date, parse_month, pretty_table,
};
use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("analysis", sub)) => print_analysis(conn, sub)?,
        Some(("calendar", sub)) => print_calendar(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub recurring: Vec<Expense>,
    pub recurring_monthly_total: Decimal,
    pub category: Option<String>,
    pub expenses: Vec<Expense>,
    pub total: Decimal,
}

/// Recurring overview plus expenses filtered to one category (or all).
pub fn analysis(conn: &Connection, category: Option<&str>) -> Result<Analysis> {
    let recurring = recurring_expenses(conn)?;
    let recurring_monthly_total = monthly_total(&recurring)?;
    let expenses: Vec<Expense> = all_expenses(conn)?
        .into_iter()
        .filter(|e| category.is_none_or(|c| e.category == c))
        .collect();
    let total = checked_sum(expenses.iter().map(|e| e.amount))?;
    Ok(Analysis {
        recurring,
        recurring_monthly_total,
        category: category.map(str::to_string),
        expenses,
        total,
    })
}

/// Amount shown in the current tracking currency. Entries that kept their
/// as-entered value are re-converted from it at today's rates; others were
/// stored in the tracking currency already.
pub fn amount_in_tracking(conn: &Connection, e: &Expense, tracking: &str) -> Result<Decimal> {
    match (&e.original_amount, &e.original_currency) {
        (Some(a), Some(c)) => fx_convert(conn, *a, c, tracking),
        _ => Ok(e.amount),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub count: usize,
    pub total: Decimal,
}

/// Per-day expense totals for a calendar month; days without expenses are omitted.
pub fn calendar_month(conn: &Connection, year: i32, month: u32) -> Result<Vec<DayTotal>> {
    let (start, end) = month_bounds(year, month)?;
    let tracking = get_tracking_currency(conn)?;
    let mut days: BTreeMap<NaiveDate, DayTotal> = BTreeMap::new();
    for e in all_expenses(conn)? {
        if e.date < start || e.date >= end {
            continue;
        }
        let amount = amount_in_tracking(conn, &e, &tracking)?;
        let d = e.date.date();
        let entry = days.entry(d).or_insert(DayTotal {
            date: d,
            count: 0,
            total: Decimal::ZERO,
        });
        entry.count += 1;
        entry.total = checked_add(entry.total, amount)?;
    }
    Ok(days.into_values().collect())
}

/// Expenses on one day, amounts in the current tracking currency.
pub fn expenses_on(conn: &Connection, day: NaiveDate) -> Result<Vec<Expense>> {
    let tracking = get_tracking_currency(conn)?;
    let mut out = Vec::new();
    for mut e in all_expenses(conn)? {
        if e.date.date() != day {
            continue;
        }
        e.amount = amount_in_tracking(conn, &e, &tracking)?;
        out.push(e);
    }
    Ok(out)
}

fn print_analysis(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let category = sub.get_one::<String>("category").map(|s| s.trim());
    let a = analysis(conn, category)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &a)? {
        return Ok(());
    }
    let ccy = get_tracking_currency(conn)?;

    println!("Recurring expenses");
    if a.recurring.is_empty() {
        println!("  none");
    } else {
        let data = a
            .recurring
            .iter()
            .map(|e| {
                vec![
                    e.title.clone(),
                    e.category.clone(),
                    fmt_money(&e.amount, &ccy),
                    e.recurring_type.to_string(),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Title", "Category", "Amount", "Recurring"], data));
    }
    println!("Monthly total: {}", fmt_money(&a.recurring_monthly_total, &ccy));
    println!();

    println!("Expenses ({})", a.category.as_deref().unwrap_or("All Categories"));
    if !a.expenses.is_empty() {
        let data = a
            .expenses
            .iter()
            .map(|e| {
                vec![
                    e.date.format("%Y-%m-%d").to_string(),
                    e.title.clone(),
                    e.category.clone(),
                    fmt_money(&e.amount, &ccy),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Date", "Title", "Category", "Amount"], data));
    }
    println!("Total: {}", fmt_money(&a.total, &ccy));
    Ok(())
}

fn print_calendar(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (year, month) = match sub.get_one::<String>("month") {
        Some(m) => parse_month(m)?,
        None => {
            let now = now_local();
            (now.year(), now.month())
        }
    };
    let ccy = get_tracking_currency(conn)?;
    let days = calendar_month(conn, year, month)?;
    let day = sub.get_one::<String>("day").map(|d| parse_date(d)).transpose()?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    if let Some(d) = day {
        let items = expenses_on(conn, d)?;
        if maybe_print_json(json_flag, jsonl_flag, &items)? {
            return Ok(());
        }
        if items.is_empty() {
            println!("No expenses on {}", d);
            return Ok(());
        }
        let total = checked_sum(items.iter().map(|e| e.amount))?;
        let data = items
            .iter()
            .map(|e| vec![e.title.clone(), e.category.clone(), fmt_money(&e.amount, &ccy)])
            .collect();
        println!("{}", pretty_table(&["Title", "Category", "Amount"], data));
        println!("Day total: {}", fmt_money(&total, &ccy));
        return Ok(());
    }

    if maybe_print_json(json_flag, jsonl_flag, &days)? {
        return Ok(());
    }
    let data = days
        .iter()
        .map(|d| vec![d.date.to_string(), d.count.to_string(), fmt_money(&d.total, &ccy)])
        .collect();
    println!("{}-{:02}", year, month);
    println!("{}", pretty_table(&["Day", "Expenses", "Total"], data));
    Ok(())
}
