// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::categories::ensure_category;
use crate::commands::income;
use crate::models::BudgetLimit;
use crate::utils::{
    checked_add, decimal_col, fmt_money, fx_convert, get_tracking_currency, maybe_print_json,
    month_bounds, now_local, parse_currency, parse_decimal, parse_month, pretty_table,
};
use anyhow::{anyhow, Result};
use chrono::Datelike;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, sub)?,
        Some(("list", _)) => list(conn)?,
        Some(("rm", sub)) => {
            let cat = sub.get_one::<String>("category").unwrap().trim();
            let n = conn.execute("DELETE FROM budget_limits WHERE category=?1", params![cat])?;
            if n == 0 {
                return Err(anyhow!("No budget limit set for '{}'", cat));
            }
            println!("Removed budget limit for {}", cat);
        }
        Some(("status", sub)) => report(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Upsert the limit for a category. Non-positive amounts clear it.
pub fn set_limit(conn: &Connection, category: &str, amount: Decimal, ccy: &str) -> Result<()> {
    ensure_category(conn, category)?;
    if amount <= Decimal::ZERO {
        conn.execute("DELETE FROM budget_limits WHERE category=?1", params![category])?;
        return Ok(());
    }
    conn.execute(
        "INSERT INTO budget_limits(category, limit_amount, currency_code) VALUES (?1,?2,?3)
         ON CONFLICT(category) DO UPDATE SET limit_amount=excluded.limit_amount,
             currency_code=excluded.currency_code",
        params![category, amount.to_string(), ccy],
    )?;
    Ok(())
}

pub fn all_limits(conn: &Connection) -> Result<Vec<BudgetLimit>> {
    let mut stmt = conn.prepare(
        "SELECT category, limit_amount, currency_code FROM budget_limits ORDER BY category ASC",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(BudgetLimit {
            category: r.get(0)?,
            limit_amount: decimal_col(r, 1)?,
            currency_code: r.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let cat = sub.get_one::<String>("category").unwrap().trim();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let ccy = match sub.get_one::<String>("currency") {
        Some(c) => parse_currency(c)?,
        None => get_tracking_currency(conn)?,
    };
    set_limit(conn, cat, amount, &ccy)?;
    if amount <= Decimal::ZERO {
        println!("Cleared budget limit for {}", cat);
    } else {
        println!("Budget limit for {} = {}", cat, fmt_money(&amount, &ccy));
    }
    Ok(())
}

fn list(conn: &Connection) -> Result<()> {
    let data = all_limits(conn)?
        .into_iter()
        .map(|l| vec![l.category, fmt_money(&l.limit_amount, &l.currency_code), l.currency_code])
        .collect();
    println!("{}", pretty_table(&["Category", "Limit", "CCY"], data));
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Ok,
    Warning,
    Over,
}

impl Level {
    pub fn from_percent(percent: i64) -> Self {
        match percent {
            p if p >= 100 => Level::Over,
            p if p >= 75 => Level::Warning,
            _ => Level::Ok,
        }
    }
}

/// Whole percent of `limit` used; saturates instead of overflowing.
pub fn percent_used(spent: Decimal, limit: Decimal) -> i64 {
    if limit.is_zero() {
        return 0;
    }
    spent
        .checked_div(limit)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|pct| pct.trunc().try_into().ok())
        .unwrap_or(i64::MAX)
}

fn used_label(p: &LimitProgress) -> String {
    match p.level {
        Level::Over => "over budget".to_string(),
        _ => format!("{}%", p.percent),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LimitProgress {
    pub category: String,
    pub spent: Decimal,
    pub limit: Decimal, // tracking currency
    pub percent: i64,
    pub capped_percent: i64,
    pub level: Level,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetStatus {
    pub month: String,
    pub tracking_currency: String,
    pub limits: Vec<LimitProgress>,
    pub total_limits: Decimal,
    pub total_expenses: Decimal,
    pub total_income: Decimal,
    pub limits_exceed_income: bool,
    pub spending_exceeds_income: bool,
}

/// Spending against each limit for one calendar month, with the two
/// income warnings. Limits set in another currency are converted to the
/// tracking currency first.
pub fn status(conn: &Connection, year: i32, month: u32) -> Result<BudgetStatus> {
    let tracking = get_tracking_currency(conn)?;
    let (start, end) = month_bounds(year, month)?;

    let mut spent_by_category: HashMap<String, Decimal> = HashMap::new();
    let mut stmt =
        conn.prepare("SELECT category, amount FROM expenses WHERE date >= ?1 AND date < ?2")?;
    let rows = stmt.query_map(params![start, end], |r| {
        Ok((r.get::<_, String>(0)?, decimal_col(r, 1)?))
    })?;
    let mut total_expenses = Decimal::ZERO;
    for row in rows {
        let (cat, amt) = row?;
        total_expenses = checked_add(total_expenses, amt)?;
        let spent = spent_by_category.entry(cat).or_default();
        *spent = checked_add(*spent, amt)?;
    }

    let mut limits = Vec::new();
    let mut total_limits = Decimal::ZERO;
    for l in all_limits(conn)? {
        let limit = fx_convert(conn, l.limit_amount, &l.currency_code, &tracking)?;
        total_limits = checked_add(total_limits, limit)?;
        let spent = spent_by_category.get(&l.category).copied().unwrap_or_default();
        let percent = percent_used(spent, limit);
        let level = Level::from_percent(percent);
        limits.push(LimitProgress {
            category: l.category,
            spent,
            limit,
            percent,
            capped_percent: percent.min(100),
            level,
        });
    }

    let total_income = income::month_total(conn, year, month)?;
    let has_income = total_income > Decimal::ZERO;
    Ok(BudgetStatus {
        month: format!("{}-{:02}", year, month),
        tracking_currency: tracking,
        limits,
        total_limits,
        total_expenses,
        total_income,
        limits_exceed_income: has_income && total_limits > total_income,
        spending_exceeds_income: has_income && total_expenses > total_income,
    })
}

fn report(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (year, month) = match sub.get_one::<String>("month") {
        Some(m) => parse_month(m)?,
        None => {
            let now = now_local();
            (now.year(), now.month())
        }
    };
    let st = status(conn, year, month)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &st)? {
        return Ok(());
    }

    let ccy = &st.tracking_currency;
    if st.limits.is_empty() {
        println!("No budget limits set for {}.", st.month);
    } else {
        let data = st
            .limits
            .iter()
            .map(|p| {
                vec![
                    p.category.clone(),
                    fmt_money(&p.spent, ccy),
                    fmt_money(&p.limit, ccy),
                    used_label(p),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Category", "Spent", "Limit", "Used"], data));
    }
    if st.limits_exceed_income {
        println!(
            "Warning: budget limits ({}) exceed this month's income ({})",
            fmt_money(&st.total_limits, ccy),
            fmt_money(&st.total_income, ccy)
        );
    }
    if st.spending_exceeds_income {
        println!(
            "Warning: spending ({}) exceeds this month's income ({})",
            fmt_money(&st.total_expenses, ccy),
            fmt_money(&st.total_income, ccy)
        );
    }
    Ok(())
}
