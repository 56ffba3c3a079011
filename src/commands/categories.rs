// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Category;
use crate::utils::pretty_table;
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            if add_category(conn, name)? {
                println!("Added category '{}'", name);
            } else {
                println!("Category '{}' already exists", name);
            }
        }
        Some(("list", _)) => {
            let data = list_categories(conn)?
                .into_iter()
                .map(|c| vec![c.name, if c.is_default { "yes".into() } else { String::new() }])
                .collect();
            println!("{}", pretty_table(&["Category", "Default"], data));
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            remove_category(conn, name)?;
            println!("Removed category '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

/// Returns false when the name already exists.
pub fn add_category(conn: &Connection, name: &str) -> Result<bool> {
    if name.is_empty() {
        return Err(anyhow!("Category name must not be empty"));
    }
    let n = conn.execute(
        "INSERT OR IGNORE INTO categories(name, is_default) VALUES (?1, 0)",
        params![name],
    )?;
    Ok(n > 0)
}

/// Defaults first, then alphabetical.
pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt =
        conn.prepare("SELECT name, is_default FROM categories ORDER BY is_default DESC, name ASC")?;
    let rows = stmt.query_map([], |r| {
        Ok(Category {
            name: r.get(0)?,
            is_default: r.get(1)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn remove_category(conn: &Connection, name: &str) -> Result<()> {
    let is_default: Option<bool> = conn
        .query_row(
            "SELECT is_default FROM categories WHERE name=?1",
            params![name],
            |r| r.get(0),
        )
        .optional()?;
    match is_default {
        None => Err(anyhow!("Category '{}' not found", name)),
        Some(true) => Err(anyhow!("Category '{}' is a default and cannot be removed", name)),
        Some(false) => {
            conn.execute(
                "DELETE FROM categories WHERE name=?1 AND is_default=0",
                params![name],
            )?;
            Ok(())
        }
    }
}

pub fn ensure_category(conn: &Connection, name: &str) -> Result<()> {
    conn.query_row(
        "SELECT 1 FROM categories WHERE name=?1",
        params![name],
        |r| r.get::<_, i64>(0),
    )
    .with_context(|| format!("Category '{}' not found", name))?;
    Ok(())
}
