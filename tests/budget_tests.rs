// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use budgettogether::commands::budgets::{self, Level};
use budgettogether::commands::{categories, expenses, fx, income};
use budgettogether::db;
use budgettogether::models::RecurringType;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    fx::save_rates(
        &mut conn,
        &serde_json::from_str(r#"{"result":"success","rates":{"USD":1,"EUR":0.90}}"#).unwrap(),
        at(2025, 8, 1),
    )
    .unwrap();
    conn
}

fn spend(conn: &Connection, title: &str, category: &str, amount: i64, ccy: &str, date: NaiveDateTime) {
    expenses::record_expense(
        conn,
        title,
        Decimal::from(amount),
        ccy,
        category,
        date,
        RecurringType::None,
    )
    .unwrap();
}

#[test]
fn status_compares_month_spending_with_limits() {
    let conn = setup();
    budgets::set_limit(&conn, "Food & Dining", Decimal::from(50), "USD").unwrap();
    budgets::set_limit(&conn, "Shopping", Decimal::from(200), "USD").unwrap();

    spend(&conn, "Dinner", "Food & Dining", 30, "USD", at(2025, 8, 3));
    // 9 EUR => 10 USD
    spend(&conn, "Cafe", "Food & Dining", 9, "EUR", at(2025, 8, 10));
    // outside the month
    spend(&conn, "Old", "Food & Dining", 500, "USD", at(2025, 7, 31));
    spend(&conn, "Shoes", "Shopping", 20, "USD", at(2025, 8, 12));

    let st = budgets::status(&conn, 2025, 8).unwrap();
    assert_eq!(st.month, "2025-08");
    assert_eq!(st.limits.len(), 2);

    let food = &st.limits[0];
    assert_eq!(food.category, "Food & Dining");
    assert_eq!(format!("{:.2}", food.spent.round_dp(2)), "40.00");
    assert_eq!(food.percent, 80);
    assert_eq!(food.level, Level::Warning);

    let shop = &st.limits[1];
    assert_eq!(shop.percent, 10);
    assert_eq!(shop.level, Level::Ok);

    // no income this month: warnings stay off
    assert!(!st.limits_exceed_income);
    assert!(!st.spending_exceeds_income);
}

#[test]
fn foreign_limits_and_income_warnings() {
    let conn = setup();
    // 90 EUR => 100 USD
    budgets::set_limit(&conn, "Health", Decimal::from(90), "EUR").unwrap();
    spend(&conn, "Dentist", "Health", 150, "USD", at(2025, 8, 5));
    income::record_income(
        &conn,
        "Side gig",
        Decimal::from(80),
        "USD",
        "Client",
        at(2025, 8, 6),
        RecurringType::None,
        "",
    )
    .unwrap();

    let st = budgets::status(&conn, 2025, 8).unwrap();
    let health = &st.limits[0];
    assert_eq!(format!("{:.2}", health.limit.round_dp(2)), "100.00");
    assert_eq!(health.percent, 150);
    assert_eq!(health.capped_percent, 100);
    assert_eq!(health.level, Level::Over);
    assert!(st.limits_exceed_income);
    assert!(st.spending_exceeds_income);
}

#[test]
fn huge_spending_saturates_percent() {
    let conn = setup();
    budgets::set_limit(&conn, "Other", Decimal::new(1, 2), "USD").unwrap();
    expenses::record_expense(
        &conn,
        "Island",
        "50000000000000000000000000000".parse().unwrap(),
        "USD",
        "Other",
        at(2025, 8, 4),
        RecurringType::None,
    )
    .unwrap();

    let st = budgets::status(&conn, 2025, 8).unwrap();
    let other = &st.limits[0];
    assert_eq!(other.percent, i64::MAX);
    assert_eq!(other.capped_percent, 100);
    assert_eq!(other.level, Level::Over);

    // a second one no longer fits in the month total
    spend(&conn, "Boat", "Other", 1, "USD", at(2025, 8, 5));
    expenses::record_expense(
        &conn,
        "Island 2",
        "50000000000000000000000000000".parse().unwrap(),
        "USD",
        "Other",
        at(2025, 8, 6),
        RecurringType::None,
    )
    .unwrap();
    assert!(budgets::status(&conn, 2025, 8).is_err());
}

#[test]
fn non_positive_limit_clears_it() {
    let conn = setup();
    budgets::set_limit(&conn, "Other", Decimal::from(10), "USD").unwrap();
    assert_eq!(budgets::all_limits(&conn).unwrap().len(), 1);
    budgets::set_limit(&conn, "Other", Decimal::ZERO, "USD").unwrap();
    assert!(budgets::all_limits(&conn).unwrap().is_empty());
    assert!(budgets::set_limit(&conn, "Missing", Decimal::from(10), "USD").is_err());
}

#[test]
fn default_categories_are_protected() {
    let conn = setup();
    assert!(categories::add_category(&conn, "Pets").unwrap());
    assert!(!categories::add_category(&conn, "Pets").unwrap());

    let names: Vec<String> = categories::list_categories(&conn)
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    // defaults first, user categories after
    assert_eq!(names.last().map(String::as_str), Some("Pets"));
    assert_eq!(names[0], "Bills & Utilities");

    assert!(categories::remove_category(&conn, "Health").is_err());
    categories::remove_category(&conn, "Pets").unwrap();
    assert!(categories::remove_category(&conn, "Pets").is_err());
}
