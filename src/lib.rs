//! # Todolist - task lists with live queries and share links
//!
//! Todolist provides:
//! - SQLite-backed storage for named, colored lists and their tasks
//! - A repository that runs every store access on a background worker
//! - Live queries that re-deliver fresh snapshots after each write
//! - A lists-with-task-count feed for list overview screens
//! - Share links that carry a whole list to another device

pub mod model;
pub mod storage;
pub mod repository;
pub mod view_state;
pub mod share;
pub mod config;
pub mod ui;


// Re-exports for convenient access
pub use model::{ListId, Task, TaskId, TaskList, TaskListWithCount};
pub use repository::{LiveQuery, Repository, Table, TableChange};
pub use share::{SharedTask, SharedTaskList};
pub use storage::SqliteStore;
pub use view_state::ListsWithCount;

/// Result type alias for Todolist operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Todolist operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid share payload encoding: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Invalid share payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid share link: {0}")]
    InvalidLink(String),

    #[error("List not found: {0}")]
    ListNotFound(ListId),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("List {0} has no tasks to share")]
    NothingToShare(ListId),

    #[error("Background worker has stopped")]
    WorkerStopped,

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// True for errors raised while decoding a share link.
    ///
    /// These are reported to the user as a failed import; none of them can
    /// occur after the store has been touched.
    pub fn is_import_failure(&self) -> bool {
        matches!(self, Error::Decode(_) | Error::Parse(_) | Error::InvalidLink(_))
    }
}
