//! Database schema definitions

/// SQL to create the task_lists table
///
/// AUTOINCREMENT keeps ids from being handed out again after a delete.
pub const CREATE_TASK_LISTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS task_lists (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    color INTEGER NOT NULL
)
"#;

/// SQL to create the tasks table
pub const CREATE_TASKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    isCompleted INTEGER NOT NULL DEFAULT 0,
    listId INTEGER NOT NULL REFERENCES task_lists(id) ON DELETE CASCADE
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_tasks_list ON tasks(listId)",
];

/// Connection settings applied before the schema.
///
/// SQLite leaves foreign key enforcement off per connection, and the cascade
/// from lists to tasks depends on it.
pub const CONNECTION_PRAGMAS: &[&str] = &[
    "PRAGMA foreign_keys = ON",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_TASK_LISTS_TABLE,
        CREATE_TASKS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
