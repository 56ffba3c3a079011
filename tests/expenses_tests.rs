// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use budgettogether::commands::{expenses, fx, income};
use budgettogether::models::RecurringType;
use budgettogether::{cli, db, utils};
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    for i in 1..=3 {
        expenses::record_expense(
            &conn,
            &format!("Item {}", i),
            Decimal::from(10),
            "USD",
            "Shopping",
            NaiveDate::from_ymd_opt(2025, 1, i).unwrap().and_hms_opt(8, 0, 0).unwrap(),
            RecurringType::None,
        )
        .unwrap();
    }
    conn
}

fn list_matches(args: &[&str]) -> clap::ArgMatches {
    let mut argv = vec!["budgettogether", "expense", "list"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let Some(("expense", exp_m)) = matches.subcommand() else {
        panic!("no expense subcommand");
    };
    let Some(("list", list_m)) = exp_m.subcommand() else {
        panic!("no list subcommand");
    };
    list_m.clone()
}

#[test]
fn list_limit_respected_newest_first() {
    let conn = setup();
    let rows = expenses::query_rows(&conn, &list_matches(&["--limit", "2"])).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].title, "Item 3");
}

#[test]
fn list_filters_by_month_and_category() {
    let conn = setup();
    expenses::record_expense(
        &conn,
        "Bus pass",
        Decimal::from(60),
        "USD",
        "Transportation",
        NaiveDate::from_ymd_opt(2025, 2, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        RecurringType::Monthly,
    )
    .unwrap();

    let jan = expenses::query_rows(&conn, &list_matches(&["--month", "2025-01"])).unwrap();
    assert_eq!(jan.len(), 3);
    let feb = expenses::query_rows(&conn, &list_matches(&["--month", "2025-02"])).unwrap();
    assert_eq!(feb.len(), 1);
    assert_eq!(feb[0].title, "Bus pass");
    let transport =
        expenses::query_rows(&conn, &list_matches(&["--category", "Transportation"])).unwrap();
    assert_eq!(transport.len(), 1);
    let monthly =
        expenses::query_rows(&conn, &list_matches(&["--recurring", "monthly"])).unwrap();
    assert_eq!(monthly.len(), 1);
}

#[test]
fn foreign_entry_is_stored_in_tracking_currency() {
    let mut conn = setup();
    fx::save_rates(
        &mut conn,
        &serde_json::from_str(r#"{"result":"success","rates":{"USD":1,"EUR":0.8}}"#).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
    )
    .unwrap();

    let e = expenses::record_expense(
        &conn,
        "Museum",
        Decimal::from(20),
        "EUR",
        "Entertainment",
        NaiveDate::from_ymd_opt(2025, 1, 9).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        RecurringType::None,
    )
    .unwrap();
    assert_eq!(e.amount, Decimal::from(25));
    assert_eq!(e.original_amount, Some(Decimal::from(20)));
    assert_eq!(e.original_currency.as_deref(), Some("EUR"));

    let same = expenses::record_expense(
        &conn,
        "Snack",
        Decimal::new(350, 2),
        "USD",
        "Food & Dining",
        NaiveDate::from_ymd_opt(2025, 1, 9).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        RecurringType::None,
    )
    .unwrap();
    assert_eq!(same.amount, Decimal::new(350, 2));
    assert!(same.original_amount.is_none());
    assert!(same.original_currency.is_none());

    let stored = expenses::all_expenses(&conn).unwrap();
    let museum = stored.iter().find(|x| x.title == "Museum").unwrap();
    assert_eq!(museum.amount, Decimal::from(25));

    // entry currencies become recent, newest first
    let prefs = utils::load_preferences(&conn).unwrap();
    assert_eq!(prefs.recent_currencies, vec!["USD", "EUR"]);
}

#[test]
fn rejects_unknown_category_and_bad_amounts() {
    let conn = setup();
    let when = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    assert!(expenses::record_expense(
        &conn,
        "Thing",
        Decimal::from(1),
        "USD",
        "Nope",
        when,
        RecurringType::None
    )
    .is_err());
    assert!(expenses::record_expense(
        &conn,
        "Thing",
        Decimal::ZERO,
        "USD",
        "Other",
        when,
        RecurringType::None
    )
    .is_err());
    assert!(expenses::record_expense(
        &conn,
        "  ",
        Decimal::from(1),
        "USD",
        "Other",
        when,
        RecurringType::None
    )
    .is_err());
}

#[test]
fn failed_entry_leaves_recent_currencies_alone() {
    let mut conn = setup();
    fx::save_rates(
        &mut conn,
        &serde_json::from_str(r#"{"result":"success","rates":{"USD":1,"VND":25000}}"#).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
    )
    .unwrap();
    utils::set_tracking_currency(&conn, "VND").unwrap();
    let before = utils::load_preferences(&conn).unwrap().recent_currencies;
    let when = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap().and_hms_opt(0, 0, 0).unwrap();

    let err = expenses::record_expense(
        &conn,
        "Yacht",
        "10000000000000000000000000".parse().unwrap(),
        "USD",
        "Shopping",
        when,
        RecurringType::None,
    )
    .unwrap_err();
    assert!(err.to_string().contains("out of range"));
    assert!(income::record_income(
        &conn,
        "Lottery",
        "10000000000000000000000000".parse().unwrap(),
        "USD",
        "Luck",
        when,
        RecurringType::None,
        "",
    )
    .is_err());
    assert!(expenses::record_expense(
        &conn,
        "Thing",
        Decimal::from(1),
        "EUR",
        "Nope",
        when,
        RecurringType::None
    )
    .is_err());

    assert_eq!(utils::load_preferences(&conn).unwrap().recent_currencies, before);
    assert_eq!(expenses::all_expenses(&conn).unwrap().len(), 3);
    assert!(income::all_income(&conn).unwrap().is_empty());
}

#[test]
fn delete_reports_missing_rows() {
    let conn = setup();
    let id = expenses::all_expenses(&conn).unwrap()[0].id;
    assert!(expenses::delete_expense(&conn, id).unwrap());
    assert!(!expenses::delete_expense(&conn, id).unwrap());
    assert_eq!(expenses::all_expenses(&conn).unwrap().len(), 2);
}

#[test]
fn income_month_total_uses_window() {
    let conn = setup();
    for (d, amt) in [(1, 1000), (31, 500)] {
        income::record_income(
            &conn,
            "Pay",
            Decimal::from(amt),
            "USD",
            "Employer",
            NaiveDate::from_ymd_opt(2025, 1, d).unwrap().and_hms_opt(23, 0, 0).unwrap(),
            RecurringType::Monthly,
            "",
        )
        .unwrap();
    }
    income::record_income(
        &conn,
        "Gift",
        Decimal::from(50),
        "USD",
        "Family",
        NaiveDate::from_ymd_opt(2025, 2, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        RecurringType::None,
        "birthday",
    )
    .unwrap();

    assert_eq!(income::month_total(&conn, 2025, 1).unwrap(), Decimal::from(1500));
    assert_eq!(income::month_total(&conn, 2025, 2).unwrap(), Decimal::from(50));
    let all = income::all_income(&conn).unwrap();
    assert_eq!(all[0].title, "Gift");
    assert_eq!(all[0].notes, "birthday");
}
