// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::anyhow;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecurringType {
    #[default]
    None,
    Weekly,
    Monthly,
}

impl RecurringType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurringType::None => "NONE",
            RecurringType::Weekly => "WEEKLY",
            RecurringType::Monthly => "MONTHLY",
        }
    }
}

impl fmt::Display for RecurringType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurringType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NONE" | "" => Ok(RecurringType::None),
            "WEEKLY" => Ok(RecurringType::Weekly),
            "MONTHLY" => Ok(RecurringType::Monthly),
            other => Err(anyhow!(
                "Invalid recurring type '{}', expected none|weekly|monthly",
                other
            )),
        }
    }
}

impl rusqlite::types::ToSql for RecurringType {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl rusqlite::types::FromSql for RecurringType {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: anyhow::Error| rusqlite::types::FromSqlError::Other(e.into()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub title: String,
    pub amount: Decimal, // tracking currency
    pub category: String,
    pub date: NaiveDateTime,
    pub recurring_type: RecurringType,
    pub original_amount: Option<Decimal>,
    pub original_currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Income {
    pub id: i64,
    pub title: String,
    pub amount: Decimal, // tracking currency
    pub source: String,
    pub date: NaiveDateTime,
    pub recurring_type: RecurringType,
    pub notes: String,
    pub original_amount: Option<Decimal>,
    pub original_currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetLimit {
    pub category: String,
    pub limit_amount: Decimal,
    pub currency_code: String,
}

/// 1 USD = `rate_to_usd` units of `currency_code`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub currency_code: String,
    pub rate_to_usd: Decimal,
    pub currency_name: String,
    pub symbol: String,
}

/// Singleton settings row (id = 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub default_currency_expenses: String,
    pub default_currency_tracking: String,
    pub default_currency_income: String,
    pub last_rates_update: Option<NaiveDateTime>,
    /// (year, month 1-12) of the last recurring generation pass.
    pub last_recurring_generation: Option<(i32, u32)>,
    pub recent_currencies: Vec<String>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            default_currency_expenses: "USD".into(),
            default_currency_tracking: "USD".into(),
            default_currency_income: "USD".into(),
            last_rates_update: None,
            last_recurring_generation: None,
            recent_currencies: Vec::new(),
        }
    }
}
