// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use budgettogether::{cli, commands, db, log, utils};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();
    log::init_logging(matches.get_flag("verbose"));

    let mut conn = db::open_or_init()?;

    // Each run counts as a fresh start of the app.
    if let Some(report) =
        commands::recurring::generate_monthly_if_needed(&conn, utils::now_local())?
    {
        if !report.inserted.is_empty() {
            println!(
                "Added {} recurring expense(s) for {}-{:02}",
                report.inserted.len(),
                report.year,
                report.month
            );
        }
    }

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("expense", sub)) => commands::expenses::handle(&conn, sub)?,
        Some(("income", sub)) => commands::income::handle(&conn, sub)?,
        Some(("category", sub)) => commands::categories::handle(&conn, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&conn, sub)?,
        Some(("recurring", sub)) => commands::recurring::handle(&conn, sub)?,
        Some(("report", sub)) => commands::reports::handle(&conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("fx", sub)) => commands::fx::handle(&mut conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
