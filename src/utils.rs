// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::UserPreferences;
use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, SubsecRound};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

const UA: &str = concat!("budgettogether/", env!("CARGO_PKG_VERSION"));

/// Most-recently-used entry currencies kept in preferences.
pub const MAX_RECENT_CURRENCIES: usize = 3;

pub fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(30))
        .timeout(std::time::Duration::from_secs(30))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

/// Local wall-clock time truncated to whole seconds.
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Parses `YYYY-MM` into (year, month).
pub fn parse_month(s: &str) -> Result<(i32, u32)> {
    let d = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok((d.year(), d.month()))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn parse_currency(s: &str) -> Result<String> {
    let code = s.trim().to_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(anyhow!("Invalid currency code '{}', expected e.g. USD", s));
    }
    Ok(code)
}

/// `[start, end)` of a calendar month, local midnight to midnight.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| anyhow!("Invalid month {}-{:02}", year, month))?;
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let end = NaiveDate::from_ymd_opt(ny, nm, 1)
        .ok_or_else(|| anyhow!("Invalid month {}-{:02}", ny, nm))?;
    Ok((start.and_time(chrono::NaiveTime::MIN), end.and_time(chrono::NaiveTime::MIN)))
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{}{:.2}", crate::currency::symbol(ccy), d.round_dp(2))
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

// Decimal columns are stored as TEXT
pub fn decimal_col(r: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = r.get(idx)?;
    s.parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn opt_decimal_col(r: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let s: Option<String> = r.get(idx)?;
    s.map(|s| {
        s.parse::<Decimal>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

// Preferences

pub fn load_preferences(conn: &Connection) -> Result<UserPreferences> {
    let prefs = conn
        .query_row(
            "SELECT default_currency_expenses, default_currency_tracking, default_currency_income,
                    last_rates_update, last_recurring_month, last_recurring_year, recent_currencies
             FROM user_preferences WHERE id=1",
            [],
            |r| {
                let month: Option<u32> = r.get(4)?;
                let year: Option<i32> = r.get(5)?;
                let recent: String = r.get(6)?;
                Ok(UserPreferences {
                    default_currency_expenses: r.get(0)?,
                    default_currency_tracking: r.get(1)?,
                    default_currency_income: r.get(2)?,
                    last_rates_update: r.get(3)?,
                    last_recurring_generation: year.zip(month),
                    recent_currencies: recent
                        .split(',')
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect(),
                })
            },
        )
        .optional()?;
    Ok(prefs.unwrap_or_default())
}

pub fn save_preferences(conn: &Connection, prefs: &UserPreferences) -> Result<()> {
    let (year, month) = match prefs.last_recurring_generation {
        Some((y, m)) => (Some(y), Some(m)),
        None => (None, None),
    };
    conn.execute(
        "INSERT INTO user_preferences(id, default_currency_expenses, default_currency_tracking,
             default_currency_income, last_rates_update, last_recurring_month,
             last_recurring_year, recent_currencies)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
             default_currency_expenses=excluded.default_currency_expenses,
             default_currency_tracking=excluded.default_currency_tracking,
             default_currency_income=excluded.default_currency_income,
             last_rates_update=excluded.last_rates_update,
             last_recurring_month=excluded.last_recurring_month,
             last_recurring_year=excluded.last_recurring_year,
             recent_currencies=excluded.recent_currencies",
        params![
            prefs.default_currency_expenses,
            prefs.default_currency_tracking,
            prefs.default_currency_income,
            prefs.last_rates_update,
            month,
            year,
            prefs.recent_currencies.join(","),
        ],
    )?;
    Ok(())
}

/// Read-modify-write of the preferences row.
pub fn update_preferences<F>(conn: &Connection, f: F) -> Result<UserPreferences>
where
    F: FnOnce(&mut UserPreferences),
{
    let mut prefs = load_preferences(conn)?;
    f(&mut prefs);
    save_preferences(conn, &prefs)?;
    Ok(prefs)
}

pub fn get_tracking_currency(conn: &Connection) -> Result<String> {
    Ok(load_preferences(conn)?.default_currency_tracking)
}

pub fn set_tracking_currency(conn: &Connection, ccy: &str) -> Result<()> {
    update_preferences(conn, |p| p.default_currency_tracking = ccy.to_string())?;
    Ok(())
}

pub fn add_recent_currency(conn: &Connection, ccy: &str) -> Result<Vec<String>> {
    let prefs = update_preferences(conn, |p| {
        p.recent_currencies.retain(|c| c != ccy);
        p.recent_currencies.insert(0, ccy.to_string());
        p.recent_currencies.truncate(MAX_RECENT_CURRENCIES);
    })?;
    Ok(prefs.recent_currencies)
}

// Currency conversion

fn rate_to_usd(conn: &Connection, code: &str) -> Result<Option<Decimal>> {
    let r: Option<String> = conn
        .query_row(
            "SELECT rate_to_usd FROM exchange_rates WHERE currency_code=?1",
            params![code],
            |r| r.get(0),
        )
        .optional()?;
    match r {
        Some(s) => {
            let d = s
                .parse::<Decimal>()
                .with_context(|| format!("Invalid rate '{}' for {}", s, code))?;
            Ok(Some(d))
        }
        None => Ok(None),
    }
}

/// Convert `amount` from `from_ccy` to `to_ccy` through USD using the stored rates.
/// A missing (or non-positive) rate counts as 1, i.e. the currency is treated as USD.
pub fn fx_convert(conn: &Connection, amount: Decimal, from_ccy: &str, to_ccy: &str) -> Result<Decimal> {
    if from_ccy == to_ccy {
        return Ok(amount);
    }
    let lookup = |code: &str| -> Result<Decimal> {
        match rate_to_usd(conn, code)? {
            Some(r) if r > Decimal::ZERO => Ok(r),
            _ => {
                tracing::warn!(currency = code, "no exchange rate stored, assuming 1:1 with USD");
                Ok(Decimal::ONE)
            }
        }
    };
    let from_rate = lookup(from_ccy)?;
    let to_rate = lookup(to_ccy)?;
    amount
        .checked_div(from_rate)
        .and_then(|usd| usd.checked_mul(to_rate))
        .ok_or_else(|| out_of_range(amount))
}

fn out_of_range(amount: Decimal) -> anyhow::Error {
    anyhow!("amount out of range: {}", amount)
}

pub fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_add(b).ok_or_else(|| out_of_range(a))
}

/// Sum that reports overflow instead of panicking.
pub fn checked_sum<I>(amounts: I) -> Result<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().try_fold(Decimal::ZERO, checked_add)
}

/// Amount as stored (tracking currency) plus the as-entered values when the
/// entry currency differed.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryAmount {
    pub amount: Decimal,
    pub original_amount: Option<Decimal>,
    pub original_currency: Option<String>,
}

pub fn convert_entry(conn: &Connection, amount: Decimal, entry_ccy: &str) -> Result<EntryAmount> {
    let tracking = get_tracking_currency(conn)?;
    if entry_ccy == tracking {
        return Ok(EntryAmount {
            amount,
            original_amount: None,
            original_currency: None,
        });
    }
    Ok(EntryAmount {
        amount: fx_convert(conn, amount, entry_ccy, &tracking)?,
        original_amount: Some(amount),
        original_currency: Some(entry_ccy.to_string()),
    })
}

/// Cumulative totals for amounts ordered newest first: the first entry holds
/// the grand total, the last one only its own amount.
pub fn running_totals(amounts: &[Decimal]) -> Result<Vec<Decimal>> {
    let mut totals = vec![Decimal::ZERO; amounts.len()];
    let mut cumulative = Decimal::ZERO;
    for (i, a) in amounts.iter().enumerate().rev() {
        cumulative = checked_add(cumulative, *a)?;
        totals[i] = cumulative;
    }
    Ok(totals)
}
