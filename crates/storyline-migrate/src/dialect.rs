//! Per-engine strategy for executing schema operations. An engine that can
//! alter tables in place runs every operation directly; SQLite routes the
//! struct-altering ones through the rebuild adapter.

use rusqlite::Connection;
use storyline_common::{Error, Result};
use tracing::debug;

use crate::op::SchemaOp;
use crate::rebuild;

pub trait Dialect {
    /// Whether the engine can run this operation without rebuilding the
    /// table.
    fn can_alter_in_place(&self, op: &SchemaOp) -> bool;

    /// Execute one schema operation against a live connection.
    fn apply(&self, conn: &Connection, op: &SchemaOp) -> Result<()>;
}

/// SQLite: no in-place DROP COLUMN or constraint changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn can_alter_in_place(&self, op: &SchemaOp) -> bool {
        matches!(
            op,
            SchemaOp::CreateTable(_)
                | SchemaOp::DropTable(_)
                | SchemaOp::AddColumn { .. }
                | SchemaOp::CreateIndex { .. }
                | SchemaOp::DropIndex { .. }
        )
    }

    fn apply(&self, conn: &Connection, op: &SchemaOp) -> Result<()> {
        debug!(op = %op.describe(), "applying schema operation");
        match op {
            SchemaOp::CreateTable(table) => {
                execute(conn, &table.create_sql(), op)?;
                for index in &table.indexes {
                    execute(conn, &index.create_sql(&table.name), op)?;
                }
                Ok(())
            }
            SchemaOp::DropTable(name) => execute(conn, &format!("DROP TABLE {name}"), op),
            SchemaOp::AddColumn { table, column } => execute(
                conn,
                &format!("ALTER TABLE {table} ADD COLUMN {}", column.sql()),
                op,
            ),
            SchemaOp::DropColumn { table, .. } => rebuild::recreate_table(conn, table, &[]),
            SchemaOp::AddUnique { table, .. } => rebuild::recreate_table(conn, table, &[]),
            SchemaOp::DropUnique { table, name } => {
                rebuild::recreate_table(conn, table, std::slice::from_ref(name))
            }
            SchemaOp::CreateIndex { table, index } => {
                execute(conn, &index.create_sql(table), op)
            }
            SchemaOp::DropIndex { name } => execute(conn, &format!("DROP INDEX {name}"), op),
        }
    }
}

fn execute(conn: &Connection, sql: &str, op: &SchemaOp) -> Result<()> {
    conn.execute(sql, [])
        .map_err(|e| Error::Database(format!("{} failed: {e}", op.describe())))?;
    Ok(())
}
