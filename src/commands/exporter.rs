// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::{expenses::all_expenses, income::all_income};
use crate::models::{Expense, Income};
use anyhow::{anyhow, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde_json::json;

pub fn handle(conn: &rusqlite::Connection, m: &clap::ArgMatches) -> Result<()> {
    let fmt = m.get_one::<String>("format").unwrap().to_lowercase();
    let out = m.get_one::<String>("out").unwrap();

    let expenses = all_expenses(conn)?;
    let income = all_income(conn)?;
    let body = match fmt.as_str() {
        "csv" => export_csv(&expenses, &income)?,
        "json" => serde_json::to_string_pretty(&json!({
            "expenses": expenses,
            "income": income,
        }))?,
        _ => return Err(anyhow!("Unknown format: {} (use csv|json)", fmt)),
    };
    std::fs::write(out, body)?;
    println!(
        "Exported {} expenses and {} income entries to {}",
        expenses.len(),
        income.len(),
        out
    );
    Ok(())
}

fn section<R, I>(title: &str, header: [&str; 5], rows: I) -> Result<String>
where
    R: IntoIterator<Item = String>,
    I: IntoIterator<Item = R>,
{
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    wtr.write_record(header)?;
    for r in rows {
        wtr.write_record(r)?;
    }
    let bytes = wtr.into_inner().map_err(|e| anyhow!("CSV flush failed: {}", e.error()))?;
    Ok(format!("{}\n{}", title, String::from_utf8(bytes)?))
}

/// Two sections, EXPENSES then INCOME, each sorted by date ascending and
/// separated by a blank line.
pub fn export_csv(expenses: &[Expense], income: &[Income]) -> Result<String> {
    let mut expenses: Vec<&Expense> = expenses.iter().collect();
    expenses.sort_by_key(|e| e.date);
    let mut income: Vec<&Income> = income.iter().collect();
    income.sort_by_key(|i| i.date);

    let mut out = section(
        "EXPENSES",
        ["Date", "Title", "Amount", "Category", "Recurring"],
        expenses.iter().map(|e| {
            [
                e.date.format("%Y-%m-%d").to_string(),
                e.title.clone(),
                e.amount.to_string(),
                e.category.clone(),
                e.recurring_type.to_string(),
            ]
        }),
    )?;
    out.push('\n');
    out.push_str(&section(
        "INCOME",
        ["Date", "Title", "Amount", "Source", "Recurring"],
        income.iter().map(|i| {
            [
                i.date.format("%Y-%m-%d").to_string(),
                i.title.clone(),
                i.amount.to_string(),
                i.source.clone(),
                i.recurring_type.to_string(),
            ]
        }),
    )?);
    Ok(out)
}
