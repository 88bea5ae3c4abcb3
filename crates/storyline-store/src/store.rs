//! Typed record access over the migrated story-tracking schema.
//!
//! Every mutating write refreshes the row's `updated_at`; deletes are
//! physical and restricted by foreign keys, so dependents must be removed
//! first.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use storyline_common::{Error, Result};
use storyline_migrate::{Migrator, builtin};
use storyline_schema::{
    Branch, BranchStatus, Comment, Group, Milestone, Project, Story, StoryPriority, StoryTag,
    Task, TaskStatus, Team, User,
};
use tracing::info;

use crate::config::StoreConfig;

/// Persistent storage for the story-tracking domain.
pub struct TrackerStore {
    conn: Mutex<Connection>,
}

impl TrackerStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        Self::open_with(db_path, 0, None)
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::open_with(
            &config.database_path,
            config.initial_version,
            config.target_version,
        )
    }

    fn open_with(db_path: &Path, initial_version: u32, target: Option<u32>) -> Result<Self> {
        info!("opening tracker store at {}", db_path.display());
        let conn = Connection::open(db_path)
            .map_err(|e| Error::Database(format!("failed to open database: {e}")))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        migrate(&conn, initial_version, target)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("failed to open in-memory database: {e}")))?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        migrate(&conn, 0, None)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Schema version currently recorded in the database.
    pub fn schema_version(&self) -> Result<u32> {
        let conn = self.connection()?;
        Migrator::new(builtin()?).current_version(&conn)
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Database("tracker store lock poisoned".into()))
    }

    // --- users and teams ---

    pub fn create_user(&self, name: &str, email: &str) -> Result<User> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO users (name, email, created_at, updated_at)
             VALUES (?1, ?2, datetime('now'), datetime('now'))",
            params![name, email],
        )
        .map_err(|e| Error::Database(format!("failed to create user {name}: {e}")))?;
        fetch_user(&conn, conn.last_insert_rowid())?
            .ok_or_else(|| Error::Database("user vanished after insert".into()))
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.connection()?;
        fetch_user(&conn, id)
    }

    pub fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.connection()?;
        conn.query_row(
            "SELECT id, name, email, created_at, updated_at FROM users WHERE email = ?1",
            params![email],
            user_from_row,
        )
        .optional()
        .map_err(|e| Error::Database(format!("failed to look up user by email: {e}")))
    }

    pub fn rename_user(&self, id: i64, name: &str) -> Result<()> {
        let conn = self.connection()?;
        let changed = conn
            .execute(
                "UPDATE users SET name = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![name, id],
            )
            .map_err(|e| Error::Database(format!("failed to rename user {id}: {e}")))?;
        require_row(changed, "user", id)
    }

    pub fn delete_user(&self, id: i64) -> Result<()> {
        let conn = self.connection()?;
        let changed = conn
            .execute("DELETE FROM users WHERE id = ?1", params![id])
            .map_err(|e| Error::Database(format!("failed to delete user {id}: {e}")))?;
        require_row(changed, "user", id)
    }

    pub fn create_team(&self, name: &str) -> Result<Team> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO teams (name, created_at, updated_at)
             VALUES (?1, datetime('now'), datetime('now'))",
            params![name],
        )
        .map_err(|e| Error::Database(format!("failed to create team {name}: {e}")))?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            "SELECT id, name, created_at, updated_at FROM teams WHERE id = ?1",
            params![id],
            |row| {
                Ok(Team {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: parse_datetime(row.get(2)?),
                    updated_at: parse_datetime(row.get(3)?),
                })
            },
        )
        .map_err(|e| Error::Database(format!("failed to read team back: {e}")))
    }

    /// Add a user to a team. Returns false when the membership already
    /// exists; the pair is unique at the storage layer.
    pub fn add_team_member(&self, user_id: i64, team_id: i64) -> Result<bool> {
        let conn = self.connection()?;
        let changed = conn
            .execute(
                "INSERT OR IGNORE INTO team_membership (user_id, team_id) VALUES (?1, ?2)",
                params![user_id, team_id],
            )
            .map_err(|e| Error::Database(format!("failed to add team member: {e}")))?;
        Ok(changed == 1)
    }

    pub fn team_members(&self, team_id: i64) -> Result<Vec<User>> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT u.id, u.name, u.email, u.created_at, u.updated_at
                 FROM users u
                 JOIN team_membership tm ON tm.user_id = u.id
                 WHERE tm.team_id = ?1
                 ORDER BY u.id",
            )
            .map_err(|e| Error::Database(format!("failed to prepare query: {e}")))?;
        let rows = stmt
            .query_map(params![team_id], user_from_row)
            .map_err(|e| Error::Database(format!("failed to query team members: {e}")))?;
        collect_rows(rows)
    }

    // --- groups and projects ---

    pub fn create_group(&self, name: &str, title: &str) -> Result<Group> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO groups (name, title, created_at, updated_at)
             VALUES (?1, ?2, datetime('now'), datetime('now'))",
            params![name, title],
        )
        .map_err(|e| Error::Database(format!("failed to create group {name}: {e}")))?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            "SELECT id, name, title, created_at, updated_at FROM groups WHERE id = ?1",
            params![id],
            |row| {
                Ok(Group {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    title: row.get(2)?,
                    created_at: parse_datetime(row.get(3)?),
                    updated_at: parse_datetime(row.get(4)?),
                })
            },
        )
        .map_err(|e| Error::Database(format!("failed to read group back: {e}")))
    }

    pub fn create_project(
        &self,
        name: &str,
        description: &str,
        team_id: Option<i64>,
    ) -> Result<Project> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO projects (name, description, team_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'), datetime('now'))",
            params![name, description, team_id],
        )
        .map_err(|e| Error::Database(format!("failed to create project {name}: {e}")))?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            "SELECT id, name, description, team_id, created_at, updated_at
             FROM projects WHERE id = ?1",
            params![id],
            |row| {
                Ok(Project {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    team_id: row.get(3)?,
                    created_at: parse_datetime(row.get(4)?),
                    updated_at: parse_datetime(row.get(5)?),
                })
            },
        )
        .map_err(|e| Error::Database(format!("failed to read project back: {e}")))
    }

    /// Attach a project to a group. Returns false when already attached.
    pub fn add_project_group(&self, project_id: i64, group_id: i64) -> Result<bool> {
        let conn = self.connection()?;
        let changed = conn
            .execute(
                "INSERT OR IGNORE INTO project_groups (project_id, group_id) VALUES (?1, ?2)",
                params![project_id, group_id],
            )
            .map_err(|e| Error::Database(format!("failed to add project group: {e}")))?;
        Ok(changed == 1)
    }

    // --- branches and milestones ---

    pub fn create_branch(
        &self,
        name: &str,
        status: BranchStatus,
        release_date: Option<DateTime<Utc>>,
    ) -> Result<Branch> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO branches (name, status, release_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'), datetime('now'))",
            params![name, status.as_str(), release_date.map(format_datetime)],
        )
        .map_err(|e| Error::Database(format!("failed to create branch {name}: {e}")))?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            "SELECT id, name, status, release_date, created_at, updated_at
             FROM branches WHERE id = ?1",
            params![id],
            branch_from_row,
        )
        .map_err(|e| Error::Database(format!("failed to read branch back: {e}")))
    }

    pub fn get_branch(&self, id: i64) -> Result<Option<Branch>> {
        let conn = self.connection()?;
        conn.query_row(
            "SELECT id, name, status, release_date, created_at, updated_at
             FROM branches WHERE id = ?1",
            params![id],
            branch_from_row,
        )
        .optional()
        .map_err(|e| Error::Database(format!("failed to look up branch {id}: {e}")))
    }

    pub fn create_milestone(&self, name: &str, branch_id: Option<i64>) -> Result<Milestone> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO milestones (name, branch_id, released, undefined, created_at, updated_at)
             VALUES (?1, ?2, 0, 0, datetime('now'), datetime('now'))",
            params![name, branch_id],
        )
        .map_err(|e| Error::Database(format!("failed to create milestone {name}: {e}")))?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            "SELECT id, name, branch_id, released, undefined, created_at, updated_at
             FROM milestones WHERE id = ?1",
            params![id],
            milestone_from_row,
        )
        .map_err(|e| Error::Database(format!("failed to read milestone back: {e}")))
    }

    pub fn mark_milestone_released(&self, id: i64) -> Result<()> {
        let conn = self.connection()?;
        let changed = conn
            .execute(
                "UPDATE milestones SET released = 1, updated_at = datetime('now') WHERE id = ?1",
                params![id],
            )
            .map_err(|e| Error::Database(format!("failed to update milestone {id}: {e}")))?;
        require_row(changed, "milestone", id)
    }

    // --- stories, tasks, comments, tags ---

    pub fn create_story(
        &self,
        creator_id: Option<i64>,
        title: &str,
        description: &str,
        is_bug: bool,
        priority: StoryPriority,
    ) -> Result<Story> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO stories
                 (creator_id, title, description, is_bug, priority, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'), datetime('now'))",
            params![creator_id, title, description, is_bug, priority.as_str()],
        )
        .map_err(|e| Error::Database(format!("failed to create story: {e}")))?;
        let id = conn.last_insert_rowid();
        fetch_story(&conn, id)?.ok_or_else(|| Error::Database("story vanished after insert".into()))
    }

    pub fn get_story(&self, id: i64) -> Result<Option<Story>> {
        let conn = self.connection()?;
        fetch_story(&conn, id)
    }

    pub fn set_story_priority(&self, id: i64, priority: StoryPriority) -> Result<()> {
        let conn = self.connection()?;
        let changed = conn
            .execute(
                "UPDATE stories SET priority = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![priority.as_str(), id],
            )
            .map_err(|e| Error::Database(format!("failed to update story {id}: {e}")))?;
        require_row(changed, "story", id)
    }

    pub fn delete_story(&self, id: i64) -> Result<()> {
        let conn = self.connection()?;
        let changed = conn
            .execute("DELETE FROM stories WHERE id = ?1", params![id])
            .map_err(|e| Error::Database(format!("failed to delete story {id}: {e}")))?;
        require_row(changed, "story", id)
    }

    pub fn create_task(&self, title: &str, story_id: i64, project_id: i64) -> Result<Task> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO tasks
                 (title, status, story_id, project_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, datetime('now'), datetime('now'))",
            params![title, TaskStatus::default().as_str(), story_id, project_id],
        )
        .map_err(|e| Error::Database(format!("failed to create task: {e}")))?;
        let id = conn.last_insert_rowid();
        fetch_task(&conn, id)?.ok_or_else(|| Error::Database("task vanished after insert".into()))
    }

    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let conn = self.connection()?;
        fetch_task(&conn, id)
    }

    pub fn set_task_status(&self, id: i64, status: TaskStatus) -> Result<()> {
        let conn = self.connection()?;
        let changed = conn
            .execute(
                "UPDATE tasks SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![status.as_str(), id],
            )
            .map_err(|e| Error::Database(format!("failed to update task {id}: {e}")))?;
        require_row(changed, "task", id)
    }

    pub fn assign_task(
        &self,
        id: i64,
        assignee_id: Option<i64>,
        milestone_id: Option<i64>,
    ) -> Result<()> {
        let conn = self.connection()?;
        let changed = conn
            .execute(
                "UPDATE tasks SET assignee_id = ?1, milestone_id = ?2,
                     updated_at = datetime('now')
                 WHERE id = ?3",
                params![assignee_id, milestone_id, id],
            )
            .map_err(|e| Error::Database(format!("failed to assign task {id}: {e}")))?;
        require_row(changed, "task", id)
    }

    pub fn tasks_for_story(&self, story_id: i64) -> Result<Vec<Task>> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, title, status, story_id, project_id, assignee_id, milestone_id,
                        created_at, updated_at
                 FROM tasks WHERE story_id = ?1 ORDER BY id",
            )
            .map_err(|e| Error::Database(format!("failed to prepare query: {e}")))?;
        let rows = stmt
            .query_map(params![story_id], task_from_row)
            .map_err(|e| Error::Database(format!("failed to query tasks: {e}")))?;
        collect_rows(rows)
    }

    pub fn delete_task(&self, id: i64) -> Result<()> {
        let conn = self.connection()?;
        let changed = conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])
            .map_err(|e| Error::Database(format!("failed to delete task {id}: {e}")))?;
        require_row(changed, "task", id)
    }

    pub fn add_comment(
        &self,
        story_id: i64,
        author_id: Option<i64>,
        comment_type: &str,
        content: &str,
        action: Option<&str>,
    ) -> Result<Comment> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO comments
                 (action, comment_type, content, story_id, author_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'), datetime('now'))",
            params![action, comment_type, content, story_id, author_id],
        )
        .map_err(|e| Error::Database(format!("failed to add comment: {e}")))?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            "SELECT id, action, comment_type, content, story_id, author_id,
                    created_at, updated_at
             FROM comments WHERE id = ?1",
            params![id],
            comment_from_row,
        )
        .map_err(|e| Error::Database(format!("failed to read comment back: {e}")))
    }

    pub fn comments_for_story(&self, story_id: i64) -> Result<Vec<Comment>> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, action, comment_type, content, story_id, author_id,
                        created_at, updated_at
                 FROM comments WHERE story_id = ?1 ORDER BY id",
            )
            .map_err(|e| Error::Database(format!("failed to prepare query: {e}")))?;
        let rows = stmt
            .query_map(params![story_id], comment_from_row)
            .map_err(|e| Error::Database(format!("failed to query comments: {e}")))?;
        collect_rows(rows)
    }

    /// Tag names are unique across all stories, not per story.
    pub fn tag_story(&self, story_id: i64, name: &str) -> Result<StoryTag> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO storytags (name, story_id, created_at, updated_at)
             VALUES (?1, ?2, datetime('now'), datetime('now'))",
            params![name, story_id],
        )
        .map_err(|e| Error::Database(format!("failed to tag story {story_id}: {e}")))?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            "SELECT id, name, story_id, created_at, updated_at FROM storytags WHERE id = ?1",
            params![id],
            |row| {
                Ok(StoryTag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    story_id: row.get(2)?,
                    created_at: parse_datetime(row.get(3)?),
                    updated_at: parse_datetime(row.get(4)?),
                })
            },
        )
        .map_err(|e| Error::Database(format!("failed to read tag back: {e}")))
    }
}

fn migrate(conn: &Connection, initial_version: u32, target: Option<u32>) -> Result<()> {
    let migrator = Migrator::new(builtin()?).initial_version(initial_version);
    migrator.sync(conn, target)?;
    Ok(())
}

fn require_row(changed: usize, entity: &str, id: i64) -> Result<()> {
    if changed == 1 {
        Ok(())
    } else {
        Err(Error::Database(format!("{entity} {id} not found")))
    }
}

fn collect_rows<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> Result<Vec<T>> {
    let mut items = Vec::new();
    for row in rows {
        items.push(row.map_err(|e| Error::Database(format!("failed to read row: {e}")))?);
    }
    Ok(items)
}

fn fetch_user(conn: &Connection, id: i64) -> Result<Option<User>> {
    conn.query_row(
        "SELECT id, name, email, created_at, updated_at FROM users WHERE id = ?1",
        params![id],
        user_from_row,
    )
    .optional()
    .map_err(|e| Error::Database(format!("failed to look up user {id}: {e}")))
}

fn fetch_story(conn: &Connection, id: i64) -> Result<Option<Story>> {
    conn.query_row(
        "SELECT id, creator_id, title, description, is_bug, priority, created_at, updated_at
         FROM stories WHERE id = ?1",
        params![id],
        story_from_row,
    )
    .optional()
    .map_err(|e| Error::Database(format!("failed to look up story {id}: {e}")))
}

fn fetch_task(conn: &Connection, id: i64) -> Result<Option<Task>> {
    conn.query_row(
        "SELECT id, title, status, story_id, project_id, assignee_id, milestone_id,
                created_at, updated_at
         FROM tasks WHERE id = ?1",
        params![id],
        task_from_row,
    )
    .optional()
    .map_err(|e| Error::Database(format!("failed to look up task {id}: {e}")))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        created_at: parse_datetime(row.get(3)?),
        updated_at: parse_datetime(row.get(4)?),
    })
}

fn branch_from_row(row: &Row<'_>) -> rusqlite::Result<Branch> {
    Ok(Branch {
        id: row.get(0)?,
        name: row.get(1)?,
        status: parse_stored(2, row.get(2)?)?,
        release_date: row.get::<_, Option<String>>(3)?.map(parse_datetime),
        created_at: parse_datetime(row.get(4)?),
        updated_at: parse_datetime(row.get(5)?),
    })
}

fn milestone_from_row(row: &Row<'_>) -> rusqlite::Result<Milestone> {
    Ok(Milestone {
        id: row.get(0)?,
        name: row.get(1)?,
        branch_id: row.get(2)?,
        released: row.get(3)?,
        undefined: row.get(4)?,
        created_at: parse_datetime(row.get(5)?),
        updated_at: parse_datetime(row.get(6)?),
    })
}

fn story_from_row(row: &Row<'_>) -> rusqlite::Result<Story> {
    Ok(Story {
        id: row.get(0)?,
        creator_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        is_bug: row.get(4)?,
        priority: parse_stored(5, row.get(5)?)?,
        created_at: parse_datetime(row.get(6)?),
        updated_at: parse_datetime(row.get(7)?),
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        status: parse_stored(2, row.get(2)?)?,
        story_id: row.get(3)?,
        project_id: row.get(4)?,
        assignee_id: row.get(5)?,
        milestone_id: row.get(6)?,
        created_at: parse_datetime(row.get(7)?),
        updated_at: parse_datetime(row.get(8)?),
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        action: row.get(1)?,
        comment_type: row.get(2)?,
        content: row.get(3)?,
        story_id: row.get(4)?,
        author_id: row.get(5)?,
        created_at: parse_datetime(row.get(6)?),
        updated_at: parse_datetime(row.get(7)?),
    })
}

/// Map a stored enum literal to its typed value, surfacing unknown literals
/// as conversion failures rather than panicking.
fn parse_stored<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = Error>,
{
    value.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| {
            // SQLite datetime('now') produces "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
                .map(|naive| naive.and_utc())
                .unwrap_or_else(|_| Utc::now())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TrackerStore {
        TrackerStore::in_memory().unwrap()
    }

    #[test]
    fn open_runs_migrations_to_latest() {
        let store = store();
        assert_eq!(store.schema_version().unwrap(), 2);
    }

    #[test]
    fn create_and_get_user_round_trip() {
        let store = store();
        let user = store.create_user("ada", "ada@example.org").unwrap();
        let fetched = store.get_user(user.id).unwrap().unwrap();
        assert_eq!(fetched.name, "ada");
        assert_eq!(fetched.email, "ada@example.org");

        let by_email = store.user_by_email("ada@example.org").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert!(store.get_user(999).unwrap().is_none());
    }

    #[test]
    fn duplicate_user_name_or_email_fails() {
        let store = store();
        store.create_user("ada", "ada@example.org").unwrap();
        assert!(store.create_user("ada", "other@example.org").is_err());
        assert!(store.create_user("grace", "ada@example.org").is_err());
    }

    #[test]
    fn team_membership_deduplicates_pairs() {
        let store = store();
        let user = store.create_user("ada", "ada@example.org").unwrap();
        let team = store.create_team("infra").unwrap();

        assert!(store.add_team_member(user.id, team.id).unwrap());
        assert!(!store.add_team_member(user.id, team.id).unwrap());

        let members = store.team_members(team.id).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "ada");

        // referencing a missing user is still an error, not an ignore
        assert!(store.add_team_member(999, team.id).is_err());
    }

    #[test]
    fn project_group_attachment_deduplicates() {
        let store = store();
        let group = store.create_group("clients", "Client work").unwrap();
        let project = store.create_project("api", "public api", None).unwrap();

        assert!(store.add_project_group(project.id, group.id).unwrap());
        assert!(!store.add_project_group(project.id, group.id).unwrap());
    }

    #[test]
    fn branch_status_round_trips() {
        let store = store();
        let branch = store
            .create_branch("stable/2.0", BranchStatus::Stable, None)
            .unwrap();
        let fetched = store.get_branch(branch.id).unwrap().unwrap();
        assert_eq!(fetched.status, BranchStatus::Stable);
        assert!(fetched.release_date.is_none());
    }

    #[test]
    fn milestone_release_flag() {
        let store = store();
        let milestone = store.create_milestone("2.0", None).unwrap();
        assert!(!milestone.released);
        store.mark_milestone_released(milestone.id).unwrap();
        assert!(store.mark_milestone_released(999).is_err());
    }

    #[test]
    fn story_task_comment_flow() {
        let store = store();
        let user = store.create_user("ada", "ada@example.org").unwrap();
        let project = store.create_project("api", "public api", None).unwrap();
        let story = store
            .create_story(Some(user.id), "crash on save", "stack trace", true, StoryPriority::High)
            .unwrap();

        let task = store.create_task("fix save path", story.id, project.id).unwrap();
        assert_eq!(task.status, TaskStatus::Todo);

        store.set_task_status(task.id, TaskStatus::InReview).unwrap();
        store.assign_task(task.id, Some(user.id), None).unwrap();
        let task = store.get_task(task.id).unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::InReview);
        assert_eq!(task.assignee_id, Some(user.id));

        store
            .add_comment(story.id, Some(user.id), "note", "looking into it", None)
            .unwrap();
        let comments = store.comments_for_story(story.id).unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].content, "looking into it");

        let tasks = store.tasks_for_story(story.id).unwrap();
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn mutating_writes_refresh_updated_at() {
        let store = store();
        let user = store.create_user("ada", "ada@example.org").unwrap();
        let project = store.create_project("api", "public api", None).unwrap();
        let story = store
            .create_story(Some(user.id), "s", "d", false, StoryPriority::Low)
            .unwrap();
        let task = store.create_task("t", story.id, project.id).unwrap();

        // backdate the row, then mutate it
        {
            let conn = store.connection().unwrap();
            conn.execute(
                "UPDATE tasks SET updated_at = '2000-01-01 00:00:00' WHERE id = ?1",
                params![task.id],
            )
            .unwrap();
        }
        store.set_task_status(task.id, TaskStatus::Landed).unwrap();

        let task = store.get_task(task.id).unwrap().unwrap();
        assert!(task.updated_at > parse_datetime("2000-01-01 00:00:00".to_string()));
    }

    #[test]
    fn deletes_are_restricted_while_dependents_exist() {
        let store = store();
        let user = store.create_user("ada", "ada@example.org").unwrap();
        let project = store.create_project("api", "public api", None).unwrap();
        let story = store
            .create_story(Some(user.id), "s", "d", false, StoryPriority::Medium)
            .unwrap();
        let task = store.create_task("t", story.id, project.id).unwrap();

        assert!(store.delete_story(story.id).is_err());
        assert!(store.delete_user(user.id).is_err());

        store.delete_task(task.id).unwrap();
        store.delete_story(story.id).unwrap();
        store.delete_user(user.id).unwrap();
        assert!(store.get_story(story.id).unwrap().is_none());
    }

    #[test]
    fn tag_names_are_globally_unique() {
        let store = store();
        let story_a = store
            .create_story(None, "a", "d", false, StoryPriority::Undefined)
            .unwrap();
        let story_b = store
            .create_story(None, "b", "d", false, StoryPriority::Undefined)
            .unwrap();

        store.tag_story(story_a.id, "regression").unwrap();
        assert!(store.tag_story(story_b.id, "regression").is_err());
    }

    #[test]
    fn tasks_require_an_existing_story_and_project() {
        let store = store();
        assert!(store.create_task("orphan", 1, 1).is_err());
    }

    #[test]
    fn unknown_stored_enum_surfaces_as_an_error() {
        let store = store();
        let user = store.create_user("ada", "ada@example.org").unwrap();
        let project = store.create_project("api", "public api", None).unwrap();
        let story = store
            .create_story(Some(user.id), "s", "d", false, StoryPriority::Low)
            .unwrap();
        let task = store.create_task("t", story.id, project.id).unwrap();

        // corrupt the stored literal behind the CHECK's back
        {
            let conn = store.connection().unwrap();
            conn.pragma_update(None, "ignore_check_constraints", true).unwrap();
            conn.execute(
                "UPDATE tasks SET status = 'Unknown' WHERE id = ?1",
                params![task.id],
            )
            .unwrap();
            conn.pragma_update(None, "ignore_check_constraints", false).unwrap();
        }

        assert!(store.get_task(task.id).is_err());
    }
}
