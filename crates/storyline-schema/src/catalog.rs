//! Explicit schema catalog: tables, columns, constraints and foreign keys as
//! plain data the migration planner and the rebuild adapter can both walk.
//!
//! Schema changes are never made by editing a definition here after it has
//! shipped — they arrive as new migration steps that transform the live
//! database towards the current catalog.

/// SQL type of a column. Enum-valued columns are rendered as TEXT with a
/// CHECK constraint restricting them to their declared literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Boolean,
    DateTime,
    VarChar(u16),
    Text,
    Enum {
        name: String,
        variants: Vec<String>,
    },
}

impl ColumnType {
    pub fn enumeration(
        name: impl Into<String>,
        variants: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        ColumnType::Enum {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }
}

/// A single column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: true,
            primary_key: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Render the column clause of a CREATE TABLE or ADD COLUMN statement.
    pub fn sql(&self) -> String {
        let type_sql = match &self.ty {
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::DateTime => "DATETIME".to_string(),
            ColumnType::VarChar(len) => format!("VARCHAR({len})"),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Enum { variants, .. } => {
                let literals: Vec<String> = variants
                    .iter()
                    .map(|v| format!("'{}'", v.replace('\'', "''")))
                    .collect();
                format!("TEXT CHECK ({} IN ({}))", self.name, literals.join(", "))
            }
        };

        let mut sql = format!("{} {}", self.name, type_sql);
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        } else if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        sql
    }
}

/// A named table-level uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueConstraint {
    pub name: String,
    pub columns: Vec<String>,
}

impl UniqueConstraint {
    pub fn new(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn sql(&self) -> String {
        format!("CONSTRAINT {} UNIQUE ({})", self.name, self.columns.join(", "))
    }
}

/// A single-column foreign key. Deletes are restricted project-wide: a
/// referenced row must have its dependents removed deliberately first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: String,
    pub parent_table: String,
    pub parent_column: String,
}

impl ForeignKey {
    pub fn new(column: impl Into<String>, parent_table: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            parent_table: parent_table.into(),
            parent_column: "id".to_string(),
        }
    }

    pub fn sql(&self) -> String {
        format!(
            "FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE RESTRICT",
            self.column, self.parent_table, self.parent_column
        )
    }
}

/// A secondary index, created as a separate statement after its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl IndexDef {
    pub fn new(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn create_sql(&self, table: &str) -> String {
        let unique = if self.unique { "UNIQUE " } else { "" };
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            unique,
            self.name,
            table,
            self.columns.join(", ")
        )
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP INDEX {}", self.name)
    }
}

/// A complete table definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<Column>,
    pub uniques: Vec<UniqueConstraint>,
    pub foreign_keys: Vec<ForeignKey>,
    pub indexes: Vec<IndexDef>,
}

impl TableDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            uniques: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn unique(mut self, constraint: UniqueConstraint) -> Self {
        self.uniques.push(constraint);
        self
    }

    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub fn index(mut self, index: IndexDef) -> Self {
        self.indexes.push(index);
        self
    }

    /// A copy of this definition with one named unique constraint removed.
    /// Used by migration steps that need a table's shape as it was before a
    /// later step introduced the constraint.
    pub fn without_unique(&self, name: &str) -> TableDef {
        let mut table = self.clone();
        table.uniques.retain(|u| u.name != name);
        table
    }

    pub fn column_named(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn unique_named(&self, name: &str) -> Option<&UniqueConstraint> {
        self.uniques.iter().find(|u| u.name == name)
    }

    /// Render the full CREATE TABLE statement.
    pub fn create_sql(&self) -> String {
        let mut clauses: Vec<String> = self.columns.iter().map(Column::sql).collect();
        clauses.extend(self.uniques.iter().map(UniqueConstraint::sql));
        clauses.extend(self.foreign_keys.iter().map(ForeignKey::sql));

        format!(
            "CREATE TABLE {} (\n    {}\n)",
            self.name,
            clauses.join(",\n    ")
        )
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE {}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> TableDef {
        TableDef::new("branches")
            .column(Column::new("id", ColumnType::Integer).primary_key())
            .column(Column::new("name", ColumnType::VarChar(50)))
            .column(Column::new(
                "status",
                ColumnType::enumeration(
                    "branch_status",
                    ["master", "release", "stable", "unsupported"],
                ),
            ))
            .unique(UniqueConstraint::new("uniq_branch0name", ["name"]))
    }

    #[test]
    fn create_sql_renders_columns_and_constraints() {
        let sql = sample_table().create_sql();
        assert!(sql.starts_with("CREATE TABLE branches"));
        assert!(sql.contains("id INTEGER PRIMARY KEY"));
        assert!(sql.contains("name VARCHAR(50)"));
        assert!(sql.contains("status TEXT CHECK (status IN ('master', 'release', 'stable', 'unsupported'))"));
        assert!(sql.contains("CONSTRAINT uniq_branch0name UNIQUE (name)"));
    }

    #[test]
    fn foreign_key_renders_restrict() {
        let fk = ForeignKey::new("team_id", "teams");
        assert_eq!(
            fk.sql(),
            "FOREIGN KEY (team_id) REFERENCES teams(id) ON DELETE RESTRICT"
        );
    }

    #[test]
    fn enum_literals_are_escaped() {
        let col = Column::new(
            "status",
            ColumnType::enumeration("task_status", ["Todo", "In review", "Land'ed"]),
        );
        assert!(col.sql().contains("'In review'"));
        assert!(col.sql().contains("'Land''ed'"));
    }

    #[test]
    fn not_null_renders_after_type() {
        let col = Column::new("content", ColumnType::Text).not_null();
        assert_eq!(col.sql(), "content TEXT NOT NULL");
    }

    #[test]
    fn column_lookup() {
        let table = sample_table();
        assert!(table.column_named("status").is_some());
        assert!(table.column_named("missing").is_none());
        assert!(table.unique_named("uniq_branch0name").is_some());
    }

    #[test]
    fn without_unique_removes_only_the_named_constraint() {
        let table = sample_table()
            .unique(UniqueConstraint::new("uniq_branch0status", ["status"]));
        let stripped = table.without_unique("uniq_branch0status");
        assert!(stripped.unique_named("uniq_branch0status").is_none());
        assert!(stripped.unique_named("uniq_branch0name").is_some());
        // the source definition is untouched
        assert!(table.unique_named("uniq_branch0status").is_some());
    }

    #[test]
    fn index_sql() {
        let idx = IndexDef::new("idx_tasks_story", ["story_id"]);
        assert_eq!(
            idx.create_sql("tasks"),
            "CREATE INDEX idx_tasks_story ON tasks (story_id)"
        );
        let idx = IndexDef::new("idx_users_email", ["email"]).unique();
        assert_eq!(
            idx.create_sql("users"),
            "CREATE UNIQUE INDEX idx_users_email ON users (email)"
        );
        assert_eq!(idx.drop_sql(), "DROP INDEX idx_users_email");
    }
}
