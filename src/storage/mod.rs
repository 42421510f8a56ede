//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - task_lists(id, name, color)
//! - tasks(id, title, isCompleted, listId -> task_lists ON DELETE CASCADE)

pub mod schema;
pub mod sqlite;

pub use sqlite::{SqliteStore, DbStats};
