pub mod catalog;
pub mod model;
pub mod tables;

pub use catalog::{Column, ColumnType, ForeignKey, IndexDef, TableDef, UniqueConstraint};
pub use model::{
    Branch, BranchStatus, Comment, Group, Milestone, Project, Story, StoryPriority, StoryTag,
    Task, TaskStatus, Team, User,
};
pub use tables::{catalog, creation_order, drop_order};
