use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid version {requested}: known steps span 0..={latest}")]
    InvalidVersion { requested: i64, latest: u32 },

    #[error(
        "database has {table_count} table(s) but no version record; \
         refusing to guess the schema version"
    )]
    UntrackedSchema { table_count: usize },

    #[error("migration repository not found: {0}")]
    PathNotFound(String),

    #[error(
        "step {step} ({direction}) failed, last good version is {last_good}: {message}"
    )]
    StepApplication {
        step: u32,
        direction: &'static str,
        last_good: u32,
        message: String,
    },

    #[error(
        "rebuild of table {table} would drop constraint {constraint} \
         which the current step does not target"
    )]
    RebuildIntegrity { table: String, constraint: String },

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn error_display_includes_context() {
        let e = Error::InvalidVersion {
            requested: 9,
            latest: 2,
        };
        assert_eq!(e.to_string(), "invalid version 9: known steps span 0..=2");

        let e = Error::StepApplication {
            step: 2,
            direction: "upgrade",
            last_good: 1,
            message: "no such table: tasks".into(),
        };
        assert_eq!(
            e.to_string(),
            "step 2 (upgrade) failed, last good version is 1: no such table: tasks"
        );

        let e = Error::RebuildIntegrity {
            table: "users".into(),
            constraint: "uniq_user0email".into(),
        };
        assert!(e.to_string().contains("uniq_user0email"));
    }

    #[test]
    fn untracked_schema_names_table_count() {
        let e = Error::UntrackedSchema { table_count: 4 };
        assert!(e.to_string().contains("4 table(s)"));
    }
}
