// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::currency;
use crate::models::ExchangeRate;
use crate::utils::{
    decimal_col, fx_convert, http_client, load_preferences, now_local, parse_currency,
    parse_decimal, pretty_table, update_preferences,
};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

pub const DEFAULT_RATES_URL: &str = "https://open.er-api.com/";
pub const RATES_URL_ENV: &str = "BUDGETTOGETHER_RATES_URL";

#[derive(Debug, Error)]
pub enum RatesError {
    #[error("rate service returned '{result}'{}", fmt_detail(.detail))]
    Api {
        result: String,
        detail: Option<String>,
    },
    #[error("rate service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rate storage failed: {0}")]
    Store(#[from] rusqlite::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn fmt_detail(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(" ({})", d),
        None => String::new(),
    }
}

/// Body of `GET v6/latest/USD`.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestRates {
    pub result: String,
    #[serde(default)]
    pub base_code: String,
    #[serde(default)]
    pub time_last_update_utc: String,
    #[serde(default)]
    pub rates: HashMap<String, f64>,
    #[serde(rename = "error-type", default)]
    pub error_type: Option<String>,
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("fetch", sub)) => {
            let base_url = sub
                .get_one::<String>("url")
                .cloned()
                .unwrap_or_else(rates_base_url);
            let n = fetch_and_save_rates(conn, &base_url)
                .context("Could not refresh exchange rates; cached rates kept")?;
            println!("Stored {} exchange rates (1 USD = rate x currency).", n);
        }
        Some(("list", _)) => list_rates(conn)?,
        Some(("convert", sub)) => {
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            let from = parse_currency(sub.get_one::<String>("from").unwrap())?;
            let to = match sub.get_one::<String>("to") {
                Some(t) => parse_currency(t)?,
                None => load_preferences(conn)?.default_currency_tracking,
            };
            println!("{} {} {}", amount, from, conversion_preview(conn, amount, &from, &to)?);
        }
        Some(("status", _)) => status(conn)?,
        Some(("currencies", _)) => {
            let data = currency::known_codes()
                .into_iter()
                .map(|c| vec![currency::display_name(c), currency::symbol(c).to_string()])
                .collect();
            println!("{}", pretty_table(&["Currency", "Symbol"], data));
        }
        Some((which @ ("set-tracking" | "set-expenses" | "set-income"), sub)) => {
            let ccy = parse_currency(sub.get_one::<String>("currency").unwrap())?;
            update_preferences(conn, |p| match which {
                "set-tracking" => p.default_currency_tracking = ccy.clone(),
                "set-expenses" => p.default_currency_expenses = ccy.clone(),
                _ => p.default_currency_income = ccy.clone(),
            })?;
            println!("Default {} currency set to {}", &which[4..], currency::display_name(&ccy));
        }
        _ => {}
    }
    Ok(())
}

pub fn rates_base_url() -> String {
    std::env::var(RATES_URL_ENV)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_RATES_URL.to_string())
}

pub fn fetch_latest(
    client: &reqwest::blocking::Client,
    base_url: &str,
) -> Result<LatestRates, RatesError> {
    let url = format!("{}/v6/latest/USD", base_url.trim_end_matches('/'));
    tracing::debug!(%url, "requesting latest exchange rates");
    let body = client.get(url).send()?.error_for_status()?.text()?;
    parse_latest(&body)
}

pub fn parse_latest(body: &str) -> Result<LatestRates, RatesError> {
    let latest = serde_json::from_str(body).context("malformed rate payload")?;
    Ok(latest)
}

/// Replace the whole rate table with `latest` and stamp the refresh time.
///
/// A response whose `result` is not `"success"` is rejected before any write,
/// so the previously cached rates and timestamp survive. The delete and the
/// inserts share one transaction; a crash cannot leave the table empty.
pub fn save_rates(
    conn: &mut Connection,
    latest: &LatestRates,
    now: NaiveDateTime,
) -> Result<usize, RatesError> {
    if latest.result != "success" {
        return Err(RatesError::Api {
            result: latest.result.clone(),
            detail: latest.error_type.clone(),
        });
    }

    let mut rates: Vec<ExchangeRate> = Vec::new();
    for (code, rate) in &latest.rates {
        let Some(info) = currency::info(code) else {
            continue;
        };
        match Decimal::try_from(*rate) {
            Ok(r) if r > Decimal::ZERO => rates.push(ExchangeRate {
                currency_code: code.clone(),
                rate_to_usd: r,
                currency_name: info.name.to_string(),
                symbol: info.symbol.to_string(),
            }),
            _ => tracing::warn!(currency = %code, rate, "skipping unusable rate"),
        }
    }

    let tx = conn.transaction()?;
    tx.execute("DELETE FROM exchange_rates", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO exchange_rates(currency_code, rate_to_usd, currency_name, symbol)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for r in &rates {
            stmt.execute(params![
                r.currency_code,
                r.rate_to_usd.to_string(),
                r.currency_name,
                r.symbol
            ])?;
        }
    }
    update_preferences(&tx, |p| p.last_rates_update = Some(now))?;
    tx.commit()?;

    tracing::info!(
        stored = rates.len(),
        base = %latest.base_code,
        published = %latest.time_last_update_utc,
        "exchange rates replaced"
    );
    Ok(rates.len())
}

pub fn fetch_and_save_rates(conn: &mut Connection, base_url: &str) -> Result<usize, RatesError> {
    let client = http_client()?;
    let latest = fetch_latest(&client, base_url)?;
    save_rates(conn, &latest, now_local())
}

pub fn all_rates(conn: &Connection) -> Result<Vec<ExchangeRate>> {
    let mut stmt = conn.prepare(
        "SELECT currency_code, rate_to_usd, currency_name, symbol
         FROM exchange_rates ORDER BY currency_name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(ExchangeRate {
            currency_code: r.get(0)?,
            rate_to_usd: decimal_col(r, 1)?,
            currency_name: r.get(2)?,
            symbol: r.get(3)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn last_update(conn: &Connection) -> Result<Option<NaiveDateTime>> {
    Ok(load_preferences(conn)?.last_rates_update)
}

pub fn has_rates(conn: &Connection) -> Result<bool> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM exchange_rates", [], |r| r.get(0))?;
    Ok(n > 0)
}

pub fn conversion_preview(conn: &Connection, amount: Decimal, from: &str, to: &str) -> Result<String> {
    let converted = fx_convert(conn, amount, from, to)?;
    Ok(format!(
        "≈ {}{:.2} {}",
        currency::symbol(to),
        converted.round_dp(2),
        to
    ))
}

fn list_rates(conn: &Connection) -> Result<()> {
    let data: Vec<Vec<String>> = all_rates(conn)?
        .into_iter()
        .map(|r| vec![r.currency_code, r.currency_name, r.symbol, r.rate_to_usd.to_string()])
        .collect();
    if data.is_empty() {
        println!("No exchange rates stored; run `fx fetch`.");
        return Ok(());
    }
    println!("{}", pretty_table(&["Code", "Name", "Symbol", "Per 1 USD"], data));
    Ok(())
}

fn status(conn: &Connection) -> Result<()> {
    let prefs = load_preferences(conn)?;
    let count = all_rates(conn)?.len();
    let last = last_update(conn)?
        .map(|t| t.to_string())
        .unwrap_or_else(|| "never".into());
    let rows = vec![
        vec!["Tracking currency".into(), prefs.default_currency_tracking],
        vec!["Expense currency".into(), prefs.default_currency_expenses],
        vec!["Income currency".into(), prefs.default_currency_income],
        vec!["Stored rates".into(), count.to_string()],
        vec!["Last refresh".into(), last],
        vec!["Recent currencies".into(), prefs.recent_currencies.join(", ")],
    ];
    println!("{}", pretty_table(&["Setting", "Value"], rows));
    Ok(())
}
