// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{params, Connection};
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.budgettogether", "BudgetTogether", "budgettogether"));

/// Overrides the database location, mostly for scripting and tests.
pub const DB_ENV: &str = "BUDGETTOGETHER_DB";

pub const DEFAULT_CATEGORIES: [&str; 7] = [
    "Food & Dining",
    "Transportation",
    "Shopping",
    "Entertainment",
    "Bills & Utilities",
    "Health",
    "Other",
];

pub fn db_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var(DB_ENV) {
        if !p.trim().is_empty() {
            return Ok(PathBuf::from(p));
        }
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("budgettogether.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    tracing::debug!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS user_preferences(
        id INTEGER PRIMARY KEY CHECK(id = 1),
        default_currency_expenses TEXT NOT NULL DEFAULT 'USD',
        default_currency_tracking TEXT NOT NULL DEFAULT 'USD',
        default_currency_income TEXT NOT NULL DEFAULT 'USD',
        last_rates_update TEXT,
        last_recurring_month INTEGER,
        last_recurring_year INTEGER,
        recent_currencies TEXT NOT NULL DEFAULT ''
    );

    -- 1 USD = rate_to_usd units of currency_code
    CREATE TABLE IF NOT EXISTS exchange_rates(
        currency_code TEXT PRIMARY KEY,
        rate_to_usd TEXT NOT NULL,
        currency_name TEXT NOT NULL,
        symbol TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS categories(
        name TEXT PRIMARY KEY,
        is_default INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS expenses(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        amount TEXT NOT NULL, -- stored in TRACKING currency
        category TEXT NOT NULL,
        date TEXT NOT NULL,
        recurring_type TEXT NOT NULL DEFAULT 'NONE'
            CHECK(recurring_type IN ('NONE','WEEKLY','MONTHLY')),
        original_amount TEXT,
        original_currency TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);
    CREATE INDEX IF NOT EXISTS idx_expenses_recurring ON expenses(recurring_type, title, category);

    CREATE TABLE IF NOT EXISTS income(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        amount TEXT NOT NULL, -- stored in TRACKING currency
        source TEXT NOT NULL,
        date TEXT NOT NULL,
        recurring_type TEXT NOT NULL DEFAULT 'NONE'
            CHECK(recurring_type IN ('NONE','WEEKLY','MONTHLY')),
        notes TEXT NOT NULL DEFAULT '',
        original_amount TEXT,
        original_currency TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_income_date ON income(date);

    CREATE TABLE IF NOT EXISTS budget_limits(
        category TEXT PRIMARY KEY,
        limit_amount TEXT NOT NULL,
        currency_code TEXT NOT NULL DEFAULT 'USD'
    );

    INSERT OR IGNORE INTO user_preferences(id) VALUES (1);
    "#,
    )?;

    let tx = conn.transaction()?;
    for name in DEFAULT_CATEGORIES {
        tx.execute(
            "INSERT OR IGNORE INTO categories(name, is_default) VALUES (?1, 1)",
            params![name],
        )?;
    }
    tx.commit()?;
    Ok(())
}
