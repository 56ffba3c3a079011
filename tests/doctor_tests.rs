// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use budgettogether::commands::expenses::{insert_expense, record_expense};
use budgettogether::commands::{doctor, fx};
use budgettogether::db;
use budgettogether::models::{Expense, RecurringType};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn seed_rates(conn: &mut Connection, when: NaiveDateTime) {
    fx::save_rates(
        conn,
        &serde_json::from_str(r#"{"result":"success","rates":{"USD":1,"EUR":0.9}}"#).unwrap(),
        when,
    )
    .unwrap();
}

fn issues(conn: &Connection, now: NaiveDateTime) -> Vec<String> {
    doctor::diagnose(conn, now)
        .unwrap()
        .into_iter()
        .map(|row| row[0].clone())
        .collect()
}

#[test]
fn empty_rate_table_is_reported() {
    let conn = setup();
    assert_eq!(issues(&conn, at(2025, 8, 1, 0)), vec!["no_rates"]);
}

#[test]
fn fresh_rates_are_clean_and_old_rates_are_stale() {
    let mut conn = setup();
    seed_rates(&mut conn, at(2025, 8, 1, 9));
    assert!(issues(&conn, at(2025, 8, 2, 8)).is_empty());
    assert_eq!(issues(&conn, at(2025, 8, 2, 10)), vec!["stale_rates"]);
}

#[test]
fn entered_currency_without_rate_is_reported() {
    let mut conn = setup();
    let now = at(2025, 8, 1, 9);
    seed_rates(&mut conn, now);
    record_expense(
        &conn,
        "Taxi",
        Decimal::from(30),
        "CHF",
        "Transportation",
        now,
        RecurringType::None,
    )
    .unwrap();
    record_expense(&conn, "Cafe", Decimal::from(4), "EUR", "Food & Dining", now, RecurringType::None)
        .unwrap();

    let rows = doctor::diagnose(&conn, now).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], vec!["missing_rate".to_string(), "CHF".to_string()]);
}

#[test]
fn duplicate_monthly_copies_are_reported() {
    let mut conn = setup();
    let now = at(2025, 8, 1, 9);
    seed_rates(&mut conn, now);
    for day in [2, 15] {
        insert_expense(
            &conn,
            &Expense {
                id: 0,
                title: "Rent".into(),
                amount: Decimal::from(900),
                category: "Bills & Utilities".into(),
                date: at(2025, 8, day, 9),
                recurring_type: RecurringType::Monthly,
                original_amount: None,
                original_currency: None,
            },
        )
        .unwrap();
    }

    let rows = doctor::diagnose(&conn, now).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "duplicate_recurring");
    assert_eq!(rows[0][1], "2025-08 'Rent' / Bills & Utilities x2");
}
