//! Copy-and-swap table rebuild for SQLite, which cannot drop a column or a
//! named constraint in place.
//!
//! The live table's unique constraints are reflected from the engine catalog
//! before the swap and merged into the target shape. Skipping that reflection
//! silently loses every pre-existing constraint the current step does not
//! mention, so a rebuild that cannot carry a surviving constraint over
//! refuses instead of proceeding.
//!
//! On failure the renamed original is left behind as `migration_tmp` for
//! manual recovery; the adapter never attempts a multi-step rollback.

use std::sync::LazyLock;

use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};
use storyline_common::{Error, Result};
use storyline_schema::{TableDef, UniqueConstraint};
use tracing::{debug, info};

/// Name the live table is parked under while the replacement is built.
pub const TMP_TABLE: &str = "migration_tmp";

static UNIQUE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"CONSTRAINT\s+(\w+)\s+UNIQUE\s*\(([^)]+)\)"#).expect("valid regex")
});

/// Reflect the named unique constraints of a live table out of the DDL
/// recorded in `sqlite_master`. The in-memory catalog only describes the
/// target shape, so this is the sole source of truth for what the table
/// carries right now.
pub fn live_unique_constraints(conn: &Connection, table: &str) -> Result<Vec<UniqueConstraint>> {
    let sql: Option<String> = conn
        .query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| Error::Database(format!("failed to read DDL for {table}: {e}")))?;

    let Some(sql) = sql else {
        return Err(Error::Database(format!("no such table: {table}")));
    };

    Ok(UNIQUE_PATTERN
        .captures_iter(&sql)
        .map(|cap| {
            let columns = cap[2]
                .split(',')
                .map(|c| c.trim().trim_matches('"').to_string());
            UniqueConstraint::new(cap[1].to_string(), columns)
        })
        .collect())
}

/// Column names of a live table, in declaration order.
pub fn live_column_names(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .map_err(|e| Error::Database(format!("failed to inspect {table}: {e}")))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|e| Error::Database(format!("failed to inspect {table}: {e}")))?;

    let mut names = Vec::new();
    for row in rows {
        names.push(row.map_err(|e| Error::Database(format!("failed to read column row: {e}")))?);
    }
    Ok(names)
}

/// Names of indexes created with explicit CREATE INDEX statements. Implicit
/// autoindexes backing UNIQUE and PRIMARY KEY clauses cannot be dropped.
fn explicit_index_names(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA index_list({table})"))
        .map_err(|e| Error::Database(format!("failed to list indexes of {table}: {e}")))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(1)?, row.get::<_, String>(3)?))
        })
        .map_err(|e| Error::Database(format!("failed to list indexes of {table}: {e}")))?;

    let mut names = Vec::new();
    for row in rows {
        let (name, origin) =
            row.map_err(|e| Error::Database(format!("failed to read index row: {e}")))?;
        if origin == "c" {
            names.push(name);
        }
    }
    Ok(names)
}

/// Rebuild a table to the given target shape.
///
/// `target` is the desired final definition; `omit_uniques` names the
/// constraints the current step intends to drop. Every other live unique
/// constraint survives the swap. Rows are copied over the columns the old
/// and new shapes share.
///
/// Callers must have foreign key enforcement disabled for the duration:
/// with it enabled the rename would rewrite REFERENCES clauses in child
/// tables to point at the temporary name.
pub fn recreate_table(
    conn: &Connection,
    target: &TableDef,
    omit_uniques: &[String],
) -> Result<()> {
    info!(table = %target.name, "rebuilding table");

    // Merge surviving live constraints into the target shape. Refusal must
    // come before anything is dropped or renamed.
    let mut merged = target.clone();
    for constraint in live_unique_constraints(conn, &target.name)? {
        if omit_uniques.contains(&constraint.name) {
            continue;
        }
        for column in &constraint.columns {
            if merged.column_named(column).is_none() {
                return Err(Error::RebuildIntegrity {
                    table: target.name.clone(),
                    constraint: constraint.name.clone(),
                });
            }
        }
        if merged.unique_named(&constraint.name).is_none() {
            merged.uniques.push(constraint);
        }
    }

    // Indexes are recreated from the target definition after the swap.
    for index in explicit_index_names(conn, &target.name)? {
        debug!(index = %index, "dropping index before rebuild");
        conn.execute(&format!("DROP INDEX {index}"), [])
            .map_err(|e| Error::Database(format!("failed to drop index {index}: {e}")))?;
    }

    conn.execute(
        &format!("ALTER TABLE {} RENAME TO {TMP_TABLE}", target.name),
        [],
    )
    .map_err(|e| Error::Database(format!("failed to rename {}: {e}", target.name)))?;

    conn.execute(&merged.create_sql(), []).map_err(|e| {
        Error::Database(format!("failed to recreate {}: {e}", merged.name))
    })?;

    let old_columns = live_column_names(conn, TMP_TABLE)?;
    let shared: Vec<&str> = merged
        .column_names()
        .into_iter()
        .filter(|name| old_columns.iter().any(|old| old == name))
        .collect();
    let column_list = shared.join(", ");
    conn.execute(
        &format!(
            "INSERT INTO {} ({column_list}) SELECT {column_list} FROM {TMP_TABLE}",
            merged.name
        ),
        [],
    )
    .map_err(|e| Error::Database(format!("failed to copy rows into {}: {e}", merged.name)))?;

    conn.execute(&format!("DROP TABLE {TMP_TABLE}"), [])
        .map_err(|e| Error::Database(format!("failed to drop {TMP_TABLE}: {e}")))?;

    for index in &merged.indexes {
        conn.execute(&index.create_sql(&merged.name), [])
            .map_err(|e| {
                Error::Database(format!("failed to recreate index {}: {e}", index.name))
            })?;
    }

    debug!(table = %merged.name, constraints = merged.uniques.len(), "rebuild complete");
    Ok(())
}
