//! Schema operations and the transformations that group them.

use std::fmt;

use storyline_schema::{Column, IndexDef, TableDef, UniqueConstraint};

/// Which way a step is being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "upgrade",
            Direction::Down => "downgrade",
        }
    }

    pub fn flipped(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One schema change. Struct-altering variants carry the table's full target
/// shape so a rebuilding dialect can synthesize the replacement table without
/// reflecting over anything but the live constraint set.
#[derive(Debug, Clone)]
pub enum SchemaOp {
    CreateTable(TableDef),
    DropTable(String),
    AddColumn {
        table: String,
        column: Column,
    },
    /// `table` is the shape with the column already absent.
    DropColumn {
        table: TableDef,
        column: String,
    },
    /// `table` is the shape with the constraint already present.
    AddUnique {
        table: TableDef,
        constraint: UniqueConstraint,
    },
    /// `table` is the shape with the constraint already absent.
    DropUnique {
        table: TableDef,
        name: String,
    },
    CreateIndex {
        table: String,
        index: IndexDef,
    },
    DropIndex {
        name: String,
    },
}

impl SchemaOp {
    /// Table the operation touches, for logging and diagnostics.
    pub fn table_name(&self) -> &str {
        match self {
            SchemaOp::CreateTable(table) => &table.name,
            SchemaOp::DropTable(name) => name,
            SchemaOp::AddColumn { table, .. } => table,
            SchemaOp::DropColumn { table, .. } => &table.name,
            SchemaOp::AddUnique { table, .. } => &table.name,
            SchemaOp::DropUnique { table, .. } => &table.name,
            SchemaOp::CreateIndex { table, .. } => table,
            SchemaOp::DropIndex { name } => name,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SchemaOp::CreateTable(table) => format!("create table {}", table.name),
            SchemaOp::DropTable(name) => format!("drop table {name}"),
            SchemaOp::AddColumn { table, column } => {
                format!("add column {}.{}", table, column.name)
            }
            SchemaOp::DropColumn { table, column } => {
                format!("drop column {}.{}", table.name, column)
            }
            SchemaOp::AddUnique { table, constraint } => {
                format!("add constraint {} on {}", constraint.name, table.name)
            }
            SchemaOp::DropUnique { table, name } => {
                format!("drop constraint {} on {}", name, table.name)
            }
            SchemaOp::CreateIndex { table, index } => {
                format!("create index {} on {}", index.name, table)
            }
            SchemaOp::DropIndex { name } => format!("drop index {name}"),
        }
    }
}

/// An ordered set of schema operations applied atomically as one unit.
#[derive(Debug, Clone)]
pub struct Transformation {
    pub ops: Vec<SchemaOp>,
}

impl Transformation {
    pub fn new(ops: Vec<SchemaOp>) -> Self {
        Self { ops }
    }
}

impl FromIterator<SchemaOp> for Transformation {
    fn from_iter<I: IntoIterator<Item = SchemaOp>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_flips() {
        assert_eq!(Direction::Up.flipped(), Direction::Down);
        assert_eq!(Direction::Down.flipped(), Direction::Up);
        assert_eq!(Direction::Up.as_str(), "upgrade");
        assert_eq!(Direction::Down.as_str(), "downgrade");
    }

    #[test]
    fn describe_names_target() {
        let op = SchemaOp::DropTable("tasks".into());
        assert_eq!(op.describe(), "drop table tasks");
        assert_eq!(op.table_name(), "tasks");
    }
}
