//! The fixed story-tracking table set, in dependency order: a referenced
//! table is always defined before every table that points at it, so the
//! creation plan is the list as-is and the drop plan is its exact reverse.

use crate::catalog::{Column, ColumnType, ForeignKey, TableDef, UniqueConstraint};

/// id + created_at/updated_at, shared by every entity table. The join tables
/// (`team_membership`, `project_groups`) carry neither.
fn entity_table(name: &str) -> TableDef {
    TableDef::new(name)
        .column(Column::new("id", ColumnType::Integer).primary_key())
        .column(Column::new("created_at", ColumnType::DateTime))
        .column(Column::new("updated_at", ColumnType::DateTime))
}

pub fn branches() -> TableDef {
    entity_table("branches")
        .column(Column::new("name", ColumnType::VarChar(50)))
        .column(Column::new(
            "status",
            ColumnType::enumeration(
                "branch_status",
                ["master", "release", "stable", "unsupported"],
            ),
        ))
        .column(Column::new("release_date", ColumnType::DateTime))
        .unique(UniqueConstraint::new("uniq_branch0name", ["name"]))
}

pub fn groups() -> TableDef {
    entity_table("groups")
        .column(Column::new("name", ColumnType::VarChar(50)))
        .column(Column::new("title", ColumnType::VarChar(100)))
        .unique(UniqueConstraint::new("uniq_group0name", ["name"]))
}

pub fn users() -> TableDef {
    entity_table("users")
        .column(Column::new("name", ColumnType::VarChar(255)))
        .column(Column::new("email", ColumnType::VarChar(255)))
        .unique(UniqueConstraint::new("uniq_user0name", ["name"]))
        .unique(UniqueConstraint::new("uniq_user0email", ["email"]))
}

pub fn teams() -> TableDef {
    entity_table("teams")
        .column(Column::new("name", ColumnType::VarChar(255)))
        .unique(UniqueConstraint::new("uniq_team0name", ["name"]))
}

pub fn team_membership() -> TableDef {
    TableDef::new("team_membership")
        .column(Column::new("user_id", ColumnType::Integer))
        .column(Column::new("team_id", ColumnType::Integer))
        // pair uniqueness arrives in migration step 2; the catalog always
        // describes the latest shape
        .unique(UniqueConstraint::new(
            "uniq_team_membership0user0team",
            ["user_id", "team_id"],
        ))
        .foreign_key(ForeignKey::new("user_id", "users"))
        .foreign_key(ForeignKey::new("team_id", "teams"))
}

pub fn stories() -> TableDef {
    entity_table("stories")
        .column(Column::new("creator_id", ColumnType::Integer))
        .column(Column::new("title", ColumnType::VarChar(100)))
        .column(Column::new("description", ColumnType::Text))
        .column(Column::new("is_bug", ColumnType::Boolean))
        .column(Column::new(
            "priority",
            ColumnType::enumeration(
                "priority",
                ["Undefined", "Low", "Medium", "High", "Critical"],
            ),
        ))
        .foreign_key(ForeignKey::new("creator_id", "users"))
}

pub fn milestones() -> TableDef {
    entity_table("milestones")
        .column(Column::new("name", ColumnType::VarChar(50)))
        .column(Column::new("branch_id", ColumnType::Integer))
        .column(Column::new("released", ColumnType::Boolean))
        .column(Column::new("undefined", ColumnType::Boolean))
        .unique(UniqueConstraint::new("uniq_milestone0name", ["name"]))
        .foreign_key(ForeignKey::new("branch_id", "branches"))
}

pub fn projects() -> TableDef {
    entity_table("projects")
        .column(Column::new("name", ColumnType::VarChar(50)))
        .column(Column::new("description", ColumnType::VarChar(100)))
        .column(Column::new("team_id", ColumnType::Integer))
        .unique(UniqueConstraint::new("uniq_project0name", ["name"]))
        .foreign_key(ForeignKey::new("team_id", "teams"))
}

pub fn project_groups() -> TableDef {
    TableDef::new("project_groups")
        .column(Column::new("project_id", ColumnType::Integer))
        .column(Column::new("group_id", ColumnType::Integer))
        .unique(UniqueConstraint::new(
            "uniq_project_groups0project0group",
            ["project_id", "group_id"],
        ))
        .foreign_key(ForeignKey::new("project_id", "projects"))
        .foreign_key(ForeignKey::new("group_id", "groups"))
}

pub fn tasks() -> TableDef {
    entity_table("tasks")
        .column(Column::new("title", ColumnType::VarChar(100)))
        .column(Column::new(
            "status",
            ColumnType::enumeration("task_status", ["Todo", "In review", "Landed"]),
        ))
        .column(Column::new("story_id", ColumnType::Integer))
        .column(Column::new("project_id", ColumnType::Integer))
        .column(Column::new("assignee_id", ColumnType::Integer))
        .column(Column::new("milestone_id", ColumnType::Integer))
        .foreign_key(ForeignKey::new("story_id", "stories"))
        .foreign_key(ForeignKey::new("project_id", "projects"))
        .foreign_key(ForeignKey::new("assignee_id", "users"))
        .foreign_key(ForeignKey::new("milestone_id", "milestones"))
}

pub fn comments() -> TableDef {
    entity_table("comments")
        .column(Column::new("action", ColumnType::VarChar(150)))
        .column(Column::new("comment_type", ColumnType::VarChar(20)))
        .column(Column::new("content", ColumnType::Text))
        .column(Column::new("story_id", ColumnType::Integer))
        .column(Column::new("author_id", ColumnType::Integer))
        .foreign_key(ForeignKey::new("story_id", "stories"))
        .foreign_key(ForeignKey::new("author_id", "users"))
}

pub fn storytags() -> TableDef {
    entity_table("storytags")
        .column(Column::new("name", ColumnType::VarChar(20)))
        .column(Column::new("story_id", ColumnType::Integer))
        .unique(UniqueConstraint::new("uniq_story_tags0name", ["name"]))
        .foreign_key(ForeignKey::new("story_id", "stories"))
}

/// All tables, referenced-before-referencing.
pub fn catalog() -> Vec<TableDef> {
    vec![
        branches(),
        groups(),
        users(),
        teams(),
        team_membership(),
        stories(),
        milestones(),
        projects(),
        project_groups(),
        tasks(),
        comments(),
        storytags(),
    ]
}

/// Table names in creation order.
pub fn creation_order() -> Vec<String> {
    catalog().into_iter().map(|t| t.name).collect()
}

/// Table names in drop order: referencing tables first.
pub fn drop_order() -> Vec<String> {
    let mut order = creation_order();
    order.reverse();
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_twelve_tables() {
        assert_eq!(catalog().len(), 12);
    }

    #[test]
    fn every_foreign_key_parent_precedes_its_child() {
        let tables = catalog();
        for (idx, table) in tables.iter().enumerate() {
            for fk in &table.foreign_keys {
                let parent_idx = tables
                    .iter()
                    .position(|t| t.name == fk.parent_table)
                    .unwrap_or_else(|| panic!("{} references unknown table", table.name));
                assert!(
                    parent_idx < idx,
                    "{} must be created before {}",
                    fk.parent_table,
                    table.name
                );
            }
        }
    }

    #[test]
    fn foreign_keys_reference_declared_columns() {
        let tables = catalog();
        for table in &tables {
            for fk in &table.foreign_keys {
                assert!(
                    table.column_named(&fk.column).is_some(),
                    "{}.{} missing",
                    table.name,
                    fk.column
                );
                let parent = tables.iter().find(|t| t.name == fk.parent_table).unwrap();
                assert!(parent.column_named(&fk.parent_column).is_some());
            }
        }
    }

    #[test]
    fn unique_constraints_cover_declared_columns() {
        for table in catalog() {
            for unique in &table.uniques {
                for column in &unique.columns {
                    assert!(
                        table.column_named(column).is_some(),
                        "{} unique {} names unknown column {}",
                        table.name,
                        unique.name,
                        column
                    );
                }
            }
        }
    }

    #[test]
    fn drop_order_is_reverse_of_creation_order() {
        let mut reversed = creation_order();
        reversed.reverse();
        assert_eq!(drop_order(), reversed);
    }

    #[test]
    fn join_tables_have_no_surrogate_id() {
        for name in ["team_membership", "project_groups"] {
            let table = catalog().into_iter().find(|t| t.name == name).unwrap();
            assert!(table.column_named("id").is_none());
            assert!(table.column_named("created_at").is_none());
            // the pair itself is the identity
            assert_eq!(table.uniques.len(), 1);
            assert_eq!(table.uniques[0].columns.len(), 2);
        }
    }

    #[test]
    fn users_carry_both_unique_constraints() {
        let users = users();
        assert!(users.unique_named("uniq_user0name").is_some());
        assert!(users.unique_named("uniq_user0email").is_some());
    }
}
