//! Typed records for the story-tracking domain. These mirror the catalog's
//! column sets; enum-valued columns only ever hold one of the declared
//! literal spellings.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storyline_common::Error;

/// Lifecycle status of a development branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BranchStatus {
    #[default]
    Master,
    Release,
    Stable,
    Unsupported,
}

impl BranchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchStatus::Master => "master",
            BranchStatus::Release => "release",
            BranchStatus::Stable => "stable",
            BranchStatus::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for BranchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BranchStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "master" => Ok(BranchStatus::Master),
            "release" => Ok(BranchStatus::Release),
            "stable" => Ok(BranchStatus::Stable),
            "unsupported" => Ok(BranchStatus::Unsupported),
            other => Err(Error::Database(format!("unknown branch status: {other}"))),
        }
    }
}

/// Priority of a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StoryPriority {
    #[default]
    Undefined,
    Low,
    Medium,
    High,
    Critical,
}

impl StoryPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryPriority::Undefined => "Undefined",
            StoryPriority::Low => "Low",
            StoryPriority::Medium => "Medium",
            StoryPriority::High => "High",
            StoryPriority::Critical => "Critical",
        }
    }
}

impl fmt::Display for StoryPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoryPriority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Undefined" => Ok(StoryPriority::Undefined),
            "Low" => Ok(StoryPriority::Low),
            "Medium" => Ok(StoryPriority::Medium),
            "High" => Ok(StoryPriority::High),
            "Critical" => Ok(StoryPriority::Critical),
            other => Err(Error::Database(format!("unknown story priority: {other}"))),
        }
    }
}

/// Workflow status of a task. Note the literal spelling "In review".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    #[default]
    Todo,
    InReview,
    Landed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "Todo",
            TaskStatus::InReview => "In review",
            TaskStatus::Landed => "Landed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Todo" => Ok(TaskStatus::Todo),
            "In review" => Ok(TaskStatus::InReview),
            "Landed" => Ok(TaskStatus::Landed),
            other => Err(Error::Database(format!("unknown task status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub team_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub id: i64,
    pub name: String,
    pub status: BranchStatus,
    pub release_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub id: i64,
    pub name: String,
    pub branch_id: Option<i64>,
    pub released: bool,
    pub undefined: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: i64,
    pub creator_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub is_bug: bool,
    pub priority: StoryPriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub status: TaskStatus,
    pub story_id: i64,
    pub project_id: i64,
    pub assignee_id: Option<i64>,
    pub milestone_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub action: Option<String>,
    pub comment_type: String,
    pub content: String,
    pub story_id: i64,
    pub author_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryTag {
    pub id: i64,
    pub name: String,
    pub story_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
