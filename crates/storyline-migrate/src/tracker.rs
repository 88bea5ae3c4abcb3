//! Version tracking and step application.
//!
//! The applied schema version lives inside the target database in a
//! single-row tracking table. A database with no tables at all can be taken
//! under version control automatically; a database that has tables but no
//! version record is a legacy schema we refuse to guess at.
//!
//! Migration runs are single-threaded and blocking. Concurrent runs against
//! the same database must be serialized externally; the version write is a
//! compare-and-set so an overlapping run fails loudly rather than silently
//! double-applying.

use rusqlite::{Connection, params};
use storyline_common::{Error, Result};
use tracing::{debug, info};

use crate::dialect::{Dialect, SqliteDialect};
use crate::op::Direction;
use crate::repository::{Repository, Step};

/// Name of the tracking table.
pub const TRACKING_TABLE: &str = "migration_version";

/// Version recorded when an empty database is first taken under control.
pub const DEFAULT_INITIAL_VERSION: u32 = 0;

/// Whether a database is under version control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    /// No tables at all (ignoring SQLite internals).
    UncontrolledEmpty,
    /// Tables exist but no tracking table: a legacy unmanaged schema.
    UncontrolledPopulated { table_count: usize },
    /// Tracking table present and recording this version.
    Controlled(u32),
}

/// Drives a database through the repository's step sequence.
pub struct Migrator<D = SqliteDialect> {
    repository: Repository,
    dialect: D,
    initial_version: u32,
}

impl Migrator<SqliteDialect> {
    pub fn new(repository: Repository) -> Self {
        Self::with_dialect(repository, SqliteDialect)
    }
}

impl<D: Dialect> Migrator<D> {
    pub fn with_dialect(repository: Repository, dialect: D) -> Self {
        Self {
            repository,
            dialect,
            initial_version: DEFAULT_INITIAL_VERSION,
        }
    }

    /// Override the version recorded when bootstrapping an empty database.
    pub fn initial_version(mut self, version: u32) -> Self {
        self.initial_version = version;
        self
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Classify the database's control status without mutating anything.
    pub fn control_state(&self, conn: &Connection) -> Result<ControlState> {
        let tables = user_tables(conn)?;
        if tables.iter().any(|t| t == TRACKING_TABLE) {
            return Ok(ControlState::Controlled(read_version(conn)?));
        }
        if tables.is_empty() {
            Ok(ControlState::UncontrolledEmpty)
        } else {
            Ok(ControlState::UncontrolledPopulated {
                table_count: tables.len(),
            })
        }
    }

    /// Take an empty database under version control at the given version.
    /// Refused when other tables already exist.
    pub fn bootstrap(&self, conn: &Connection, initial_version: u32) -> Result<()> {
        match self.control_state(conn)? {
            ControlState::UncontrolledEmpty => {
                let tx = conn
                    .unchecked_transaction()
                    .map_err(|e| Error::Database(format!("failed to begin transaction: {e}")))?;
                tx.execute(
                    &format!("CREATE TABLE {TRACKING_TABLE} (version INTEGER NOT NULL)"),
                    [],
                )
                .map_err(|e| Error::Database(format!("failed to create tracking table: {e}")))?;
                tx.execute(
                    &format!("INSERT INTO {TRACKING_TABLE} (version) VALUES (?1)"),
                    params![initial_version],
                )
                .map_err(|e| Error::Database(format!("failed to record initial version: {e}")))?;
                tx.commit()
                    .map_err(|e| Error::Database(format!("failed to commit bootstrap: {e}")))?;
                info!(version = initial_version, "database taken under version control");
                Ok(())
            }
            // an immediate second call on a database that holds nothing but
            // the tracking table is harmless
            ControlState::Controlled(version) => {
                if user_tables(conn)?.len() == 1 {
                    Ok(())
                } else {
                    Err(Error::Database(format!(
                        "database is already version controlled at version {version}"
                    )))
                }
            }
            ControlState::UncontrolledPopulated { table_count } => {
                Err(Error::UntrackedSchema { table_count })
            }
        }
    }

    /// The currently applied version. Bootstraps an entirely empty database
    /// at the configured initial version; refuses a populated database with
    /// no version record.
    pub fn current_version(&self, conn: &Connection) -> Result<u32> {
        match self.control_state(conn)? {
            ControlState::Controlled(version) => Ok(version),
            ControlState::UncontrolledEmpty => {
                info!(
                    version = self.initial_version,
                    "empty database, bootstrapping version control"
                );
                self.bootstrap(conn, self.initial_version)?;
                Ok(self.initial_version)
            }
            ControlState::UncontrolledPopulated { table_count } => {
                Err(Error::UntrackedSchema { table_count })
            }
        }
    }

    /// Execute one step in the given direction. The transformation and the
    /// version compare-and-set commit in a single transaction: either both
    /// land or the tracking table keeps reading the last good version.
    pub fn apply(&self, conn: &Connection, step: &Step, direction: Direction) -> Result<()> {
        let (last_good, next) = match direction {
            Direction::Up => (step.version - 1, step.version),
            Direction::Down => (step.version, step.version - 1),
        };
        let ops = match direction {
            Direction::Up => &step.upgrade.ops,
            Direction::Down => &step.downgrade.ops,
        };

        info!(
            step = step.version,
            name = step.name,
            direction = direction.as_str(),
            "applying migration step"
        );

        // Rebuilds rename tables; with enforcement on, the rename would
        // rewrite REFERENCES clauses in child tables to the temporary name.
        conn.pragma_update(None, "foreign_keys", false)
            .map_err(|e| Error::Database(format!("failed to disable foreign keys: {e}")))?;

        let outcome = (|| -> Result<()> {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| Error::Database(format!("failed to begin transaction: {e}")))?;
            for op in ops {
                self.dialect.apply(&tx, op)?;
            }
            let changed = tx
                .execute(
                    &format!("UPDATE {TRACKING_TABLE} SET version = ?1 WHERE version = ?2"),
                    params![next, last_good],
                )
                .map_err(|e| Error::Database(format!("failed to record version {next}: {e}")))?;
            if changed != 1 {
                return Err(Error::Database(format!(
                    "version record no longer reads {last_good}; concurrent migration run?"
                )));
            }
            tx.commit()
                .map_err(|e| Error::Database(format!("failed to commit step: {e}")))?;
            Ok(())
        })();

        let _ = conn.pragma_update(None, "foreign_keys", true);

        outcome.map_err(|e| match e {
            refusal @ Error::RebuildIntegrity { .. } => refusal,
            other => Error::StepApplication {
                step: step.version,
                direction: direction.as_str(),
                last_good,
                message: other.to_string(),
            },
        })?;

        debug!(version = next, "version recorded");
        Ok(())
    }

    /// Bring the database to `target` (None = latest). Applies the path one
    /// step at a time and halts at the first failure; each step is its own
    /// unit of atomicity, there is no rollback across steps.
    pub fn sync(&self, conn: &Connection, target: Option<u32>) -> Result<u32> {
        let current = self.current_version(conn)?;
        let target = target.unwrap_or_else(|| self.repository.latest());
        if current == target {
            info!(version = current, "database already at requested version");
            return Ok(current);
        }

        info!(from = current, to = target, "syncing database schema");
        for (step, direction) in self.repository.path(current, target)? {
            self.apply(conn, step, direction)?;
        }
        info!(version = target, "sync complete");
        Ok(target)
    }
}

fn user_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )
        .map_err(|e| Error::Database(format!("failed to list tables: {e}")))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| Error::Database(format!("failed to list tables: {e}")))?;

    let mut tables = Vec::new();
    for row in rows {
        tables.push(row.map_err(|e| Error::Database(format!("failed to read table row: {e}")))?);
    }
    Ok(tables)
}

fn read_version(conn: &Connection) -> Result<u32> {
    let version: i64 = conn
        .query_row(&format!("SELECT version FROM {TRACKING_TABLE}"), [], |row| {
            row.get(0)
        })
        .map_err(|e| Error::Database(format!("failed to read tracked version: {e}")))?;
    u32::try_from(version)
        .map_err(|_| Error::Database(format!("tracked version {version} is not a valid version")))
}
