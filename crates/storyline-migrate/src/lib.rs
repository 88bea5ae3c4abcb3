pub mod dialect;
pub mod op;
pub mod rebuild;
pub mod repository;
pub mod steps;
pub mod tracker;

pub use dialect::{Dialect, SqliteDialect};
pub use op::{Direction, SchemaOp, Transformation};
pub use repository::{Repository, Step};
pub use steps::builtin;
pub use tracker::{ControlState, DEFAULT_INITIAL_VERSION, Migrator, TRACKING_TABLE};
