// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use budgettogether::commands::expenses::{all_expenses, record_expense};
use budgettogether::commands::recurring::{count_matching_in_window, generate_monthly_if_needed};
use budgettogether::models::RecurringType;
use budgettogether::{db, utils};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn monthly(conn: &Connection, title: &str, category: &str, amount: i64, date: NaiveDateTime) {
    record_expense(
        conn,
        title,
        Decimal::from(amount),
        "USD",
        category,
        date,
        RecurringType::Monthly,
    )
    .unwrap();
}

fn clear_stamp(conn: &Connection) {
    utils::update_preferences(conn, |p| p.last_recurring_generation = None).unwrap();
}

#[test]
fn generates_one_copy_per_template_and_stamps_month() {
    let conn = setup();
    monthly(&conn, "Rent", "Bills & Utilities", 1200, at(2025, 2, 1));
    monthly(&conn, "Gym", "Health", 40, at(2025, 2, 3));
    record_expense(
        &conn,
        "Lunch",
        Decimal::from(12),
        "USD",
        "Food & Dining",
        at(2025, 2, 4),
        RecurringType::None,
    )
    .unwrap();

    let now = at(2025, 3, 10);
    let report = generate_monthly_if_needed(&conn, now).unwrap().unwrap();
    assert_eq!((report.year, report.month), (2025, 3));
    assert_eq!(report.templates, 2);
    assert_eq!(report.inserted.len(), 2);
    for e in &report.inserted {
        assert_eq!(e.date, now);
        assert_eq!(e.recurring_type, RecurringType::Monthly);
    }

    let prefs = utils::load_preferences(&conn).unwrap();
    assert_eq!(prefs.last_recurring_generation, Some((2025, 3)));
    assert_eq!(all_expenses(&conn).unwrap().len(), 5);
}

#[test]
fn second_run_in_same_month_is_a_no_op() {
    let conn = setup();
    monthly(&conn, "Rent", "Bills & Utilities", 1200, at(2025, 2, 1));

    assert!(generate_monthly_if_needed(&conn, at(2025, 3, 1)).unwrap().is_some());
    assert!(generate_monthly_if_needed(&conn, at(2025, 3, 28)).unwrap().is_none());
    assert_eq!(all_expenses(&conn).unwrap().len(), 2);
}

#[test]
fn existing_copy_prevents_duplicate_even_without_stamp() {
    let conn = setup();
    monthly(&conn, "Rent", "Bills & Utilities", 1200, at(2025, 2, 1));
    monthly(&conn, "Gym", "Health", 40, at(2025, 2, 3));

    let first = generate_monthly_if_needed(&conn, at(2025, 3, 5)).unwrap().unwrap();
    assert_eq!(first.inserted.len(), 2);

    clear_stamp(&conn);
    let second = generate_monthly_if_needed(&conn, at(2025, 3, 6)).unwrap().unwrap();
    assert_eq!(second.templates, 4);
    assert!(second.inserted.is_empty());
    assert_eq!(
        utils::load_preferences(&conn).unwrap().last_recurring_generation,
        Some((2025, 3))
    );
}

#[test]
fn accumulated_copies_still_yield_one_per_month() {
    let conn = setup();
    monthly(&conn, "Rent", "Bills & Utilities", 1200, at(2025, 1, 1));
    generate_monthly_if_needed(&conn, at(2025, 2, 2)).unwrap();
    generate_monthly_if_needed(&conn, at(2025, 3, 2)).unwrap();

    let report = generate_monthly_if_needed(&conn, at(2025, 4, 2)).unwrap().unwrap();
    // January original plus the February and March copies all act as templates
    assert_eq!(report.templates, 3);
    assert_eq!(report.inserted.len(), 1);

    let (start, end) = utils::month_bounds(2025, 4).unwrap();
    assert_eq!(
        count_matching_in_window(&conn, "Rent", "Bills & Utilities", start, end).unwrap(),
        1
    );
}

#[test]
fn template_entered_this_month_is_not_copied() {
    let conn = setup();
    monthly(&conn, "Netflix", "Entertainment", 15, at(2025, 5, 2));

    let report = generate_monthly_if_needed(&conn, at(2025, 5, 20)).unwrap().unwrap();
    assert!(report.inserted.is_empty());
    assert_eq!(all_expenses(&conn).unwrap().len(), 1);
}

#[test]
fn copies_keep_amounts_and_entered_currency() {
    let mut conn = setup();
    budgettogether::commands::fx::save_rates(
        &mut conn,
        &serde_json::from_str(r#"{"result":"success","rates":{"USD":1,"EUR":0.5}}"#).unwrap(),
        at(2025, 1, 1),
    )
    .unwrap();
    record_expense(
        &conn,
        "Phone",
        Decimal::from(20),
        "EUR",
        "Bills & Utilities",
        at(2025, 1, 15),
        RecurringType::Monthly,
    )
    .unwrap();

    let report = generate_monthly_if_needed(&conn, at(2025, 2, 1)).unwrap().unwrap();
    let copy = &report.inserted[0];
    assert_eq!(copy.amount, Decimal::from(40));
    assert_eq!(copy.original_amount, Some(Decimal::from(20)));
    assert_eq!(copy.original_currency.as_deref(), Some("EUR"));
    assert_eq!(copy.category, "Bills & Utilities");
}

#[test]
fn weekly_expenses_are_not_templates() {
    let conn = setup();
    record_expense(
        &conn,
        "Groceries",
        Decimal::from(80),
        "USD",
        "Food & Dining",
        at(2025, 6, 1),
        RecurringType::Weekly,
    )
    .unwrap();

    let report = generate_monthly_if_needed(&conn, at(2025, 7, 1)).unwrap().unwrap();
    assert_eq!(report.templates, 0);
    assert!(report.inserted.is_empty());
}
