//! The shipped migration history for the story-tracking schema.
//!
//! Steps embed the table shapes as they stood at their version, so a shipped
//! step never changes meaning when the catalog moves on. New schema changes
//! are added as new steps, never by editing these.

use storyline_common::Result;
use storyline_schema::{TableDef, UniqueConstraint, tables};

use crate::op::{SchemaOp, Transformation};
use crate::repository::{Repository, Step};

const TEAM_MEMBERSHIP_PAIR: &str = "uniq_team_membership0user0team";
const PROJECT_GROUPS_PAIR: &str = "uniq_project_groups0project0group";

/// The step set this build ships with.
pub fn builtin() -> Result<Repository> {
    Repository::new(vec![initial_schema(), join_pair_uniqueness()])
}

/// A table's shape as of version 1: the join-pair constraints arrive in
/// step 2.
fn version_1_shape(table: TableDef) -> TableDef {
    table
        .without_unique(TEAM_MEMBERSHIP_PAIR)
        .without_unique(PROJECT_GROUPS_PAIR)
}

/// Step 1: create all twelve tables in dependency order; drop them in exact
/// reverse order on downgrade.
fn initial_schema() -> Step {
    let upgrade = tables::catalog()
        .into_iter()
        .map(|table| SchemaOp::CreateTable(version_1_shape(table)))
        .collect();
    let downgrade = tables::drop_order()
        .into_iter()
        .map(SchemaOp::DropTable)
        .collect();
    Step::new(1, "initial schema", upgrade, downgrade)
}

/// Step 2: the original schema declared no uniqueness on the join-table
/// pairs, so the same membership could be inserted twice. Added here as its
/// own step rather than edited into step 1.
fn join_pair_uniqueness() -> Step {
    let team_membership = tables::team_membership();
    let project_groups = tables::project_groups();

    let upgrade = Transformation::new(vec![
        SchemaOp::AddUnique {
            table: team_membership.clone(),
            constraint: UniqueConstraint::new(TEAM_MEMBERSHIP_PAIR, ["user_id", "team_id"]),
        },
        SchemaOp::AddUnique {
            table: project_groups.clone(),
            constraint: UniqueConstraint::new(PROJECT_GROUPS_PAIR, ["project_id", "group_id"]),
        },
    ]);
    let downgrade = Transformation::new(vec![
        SchemaOp::DropUnique {
            table: project_groups.without_unique(PROJECT_GROUPS_PAIR),
            name: PROJECT_GROUPS_PAIR.to_string(),
        },
        SchemaOp::DropUnique {
            table: team_membership.without_unique(TEAM_MEMBERSHIP_PAIR),
            name: TEAM_MEMBERSHIP_PAIR.to_string(),
        },
    ]);
    Step::new(2, "join table pair uniqueness", upgrade, downgrade)
}
