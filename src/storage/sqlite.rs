//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, params, OptionalExtension};
use serde::Serialize;
use crate::Result;
use crate::model::{ListId, Task, TaskId, TaskList};
use super::schema;

const LIST_COLUMNS: &str = "id, name, color";
const TASK_COLUMNS: &str = "id, title, isCompleted, listId";

/// SQLite-backed storage for lists and tasks
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for pragma in schema::CONNECTION_PRAGMAS {
            self.conn.execute_batch(pragma)?;
        }
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== List Operations ==========

    /// Insert a list, replacing any row with the same id.
    ///
    /// An unassigned id lets SQLite allocate one. Replacing an existing list
    /// deletes the old row first, which cascades to its tasks.
    pub fn insert_list(&self, list: &TaskList) -> Result<ListId> {
        self.conn.execute(
            "INSERT OR REPLACE INTO task_lists (id, name, color) VALUES (?1, ?2, ?3)",
            params![list.id.as_column(), list.name, list.color],
        )?;
        Ok(ListId(self.conn.last_insert_rowid()))
    }

    /// Replace the stored row of an existing list. Returns false if there is none.
    pub fn update_list(&self, list: &TaskList) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE task_lists SET name = ?1, color = ?2 WHERE id = ?3",
            params![list.name, list.color, list.id.0],
        )?;
        Ok(changed > 0)
    }

    /// Delete a list and, through the foreign key, all of its tasks
    pub fn delete_list(&self, id: ListId) -> Result<bool> {
        let changed = self.conn.execute("DELETE FROM task_lists WHERE id = ?1", [id.0])?;
        Ok(changed > 0)
    }

    /// Get a list by id
    pub fn get_list(&self, id: ListId) -> Result<Option<TaskList>> {
        self.conn
            .query_row(
                &format!("SELECT {LIST_COLUMNS} FROM task_lists WHERE id = ?1"),
                [id.0],
                row_to_list,
            )
            .optional()
            .map_err(Into::into)
    }

    /// All lists, newest first
    pub fn all_lists(&self) -> Result<Vec<TaskList>> {
        let mut stmt = self.conn.prepare(
            &format!("SELECT {LIST_COLUMNS} FROM task_lists ORDER BY id DESC"),
        )?;

        let lists = stmt
            .query_map([], row_to_list)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(lists)
    }

    /// Count all lists
    pub fn count_lists(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM task_lists", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ========== Task Operations ==========

    /// Insert a task, replacing any row with the same id.
    ///
    /// Fails with a constraint error if the owning list does not exist.
    pub fn insert_task(&self, task: &Task) -> Result<TaskId> {
        self.conn.execute(
            "INSERT OR REPLACE INTO tasks (id, title, isCompleted, listId) VALUES (?1, ?2, ?3, ?4)",
            params![task.id.as_column(), task.title, task.is_completed, task.list_id.0],
        )?;
        Ok(TaskId(self.conn.last_insert_rowid()))
    }

    /// Replace the stored row of an existing task. Returns false if there is none.
    pub fn update_task(&self, task: &Task) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE tasks SET title = ?1, isCompleted = ?2, listId = ?3 WHERE id = ?4",
            params![task.title, task.is_completed, task.list_id.0, task.id.0],
        )?;
        Ok(changed > 0)
    }

    /// Delete a single task
    pub fn delete_task(&self, id: TaskId) -> Result<bool> {
        let changed = self.conn.execute("DELETE FROM tasks WHERE id = ?1", [id.0])?;
        Ok(changed > 0)
    }

    /// Get a task by id
    pub fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        self.conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                [id.0],
                row_to_task,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Tasks of one list, newest first
    pub fn tasks_for_list(&self, list_id: ListId) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE listId = ?1 ORDER BY id DESC"),
        )?;

        let tasks = stmt
            .query_map([list_id.0], row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(tasks)
    }

    /// Number of tasks currently in a list
    pub fn count_tasks_for_list(&self, list_id: ListId) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE listId = ?1",
            [list_id.0],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Delete every completed task of a list, returning the removed rows
    pub fn delete_completed(&mut self, list_id: ListId) -> Result<Vec<Task>> {
        let tx = self.conn.transaction()?;
        let removed = {
            let mut stmt = tx.prepare(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE listId = ?1 AND isCompleted = 1 ORDER BY id DESC"),
            )?;
            let rows = stmt
                .query_map([list_id.0], row_to_task)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };
        tx.execute("DELETE FROM tasks WHERE listId = ?1 AND isCompleted = 1", [list_id.0])?;
        tx.commit()?;
        Ok(removed)
    }

    /// Count all tasks
    pub fn count_tasks(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ========== Bulk Operations ==========

    /// Create a list and its tasks in one transaction.
    ///
    /// `tasks` are `(title, is_completed)` pairs, inserted in order against the
    /// new list's id. Either everything is stored or nothing is.
    pub fn insert_list_with_tasks(
        &mut self,
        list: &TaskList,
        tasks: &[(String, bool)],
    ) -> Result<(ListId, Vec<TaskId>)> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO task_lists (id, name, color) VALUES (?1, ?2, ?3)",
            params![list.id.as_column(), list.name, list.color],
        )?;
        let list_id = ListId(tx.last_insert_rowid());

        let mut task_ids = Vec::with_capacity(tasks.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO tasks (title, isCompleted, listId) VALUES (?1, ?2, ?3)",
            )?;
            for (title, is_completed) in tasks {
                stmt.execute(params![title, is_completed, list_id.0])?;
                task_ids.push(TaskId(tx.last_insert_rowid()));
            }
        }

        tx.commit()?;
        Ok((list_id, task_ids))
    }

    /// Populate an empty database with a few example lists.
    ///
    /// Returns false without writing anything if any list already exists.
    pub fn seed_sample_data(&mut self) -> Result<bool> {
        if self.count_lists()? > 0 {
            return Ok(false);
        }

        let samples: [(&str, u32, [(&str, bool); 3]); 3] = [
            ("Shopping", 0xFF4CAF50, [("Buy milk", false), ("Wholegrain bread", false), ("Fruit and vegetables", false)]),
            ("Work", 0xFF2196F3, [("Check email", true), ("Team meeting", false), ("Hand in report", false)]),
            ("Personal", 0xFFE91E63, [("Call the doctor", false), ("Exercise", true), ("Read for 30 minutes", false)]),
        ];

        for (name, color, tasks) in samples {
            let tasks: Vec<(String, bool)> = tasks.iter().map(|(t, done)| (t.to_string(), *done)).collect();
            self.insert_list_with_tasks(&TaskList::with_color(name, color as i32), &tasks)?;
        }
        Ok(true)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        let completed: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE isCompleted = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(DbStats {
            lists: self.count_lists()?,
            tasks: self.count_tasks()?,
            completed: completed as usize,
        })
    }
}

/// Helper to convert a row to a TaskList
fn row_to_list(row: &rusqlite::Row) -> rusqlite::Result<TaskList> {
    Ok(TaskList {
        id: ListId(row.get(0)?),
        name: row.get(1)?,
        color: row.get(2)?,
    })
}

/// Helper to convert a row to a Task
fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: TaskId(row.get(0)?),
        title: row.get(1)?,
        is_completed: row.get(2)?,
        list_id: ListId(row.get(3)?),
    })
}

/// Database statistics
#[derive(Debug, Clone, Serialize)]
pub struct DbStats {
    pub lists: usize,
    pub tasks: usize,
    pub completed: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Lists: {}", self.lists)?;
        writeln!(f, "  Tasks: {}", self.tasks)?;
        writeln!(f, "  Completed: {}", self.completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_list(name: &str) -> (SqliteStore, ListId) {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.insert_list(&TaskList::new(name)).unwrap();
        (store, id)
    }

    #[test]
    fn test_list_crud() {
        let (store, id) = store_with_list("Shopping");
        assert!(id.is_valid());

        let list = store.get_list(id).unwrap().unwrap();
        assert_eq!(list.name, "Shopping");

        assert!(store.update_list(&list.renamed("Groceries")).unwrap());
        assert_eq!(store.get_list(id).unwrap().unwrap().name, "Groceries");

        assert!(store.delete_list(id).unwrap());
        assert!(store.get_list(id).unwrap().is_none());
        assert!(!store.delete_list(id).unwrap());
    }

    #[test]
    fn test_update_missing_row_is_noop() {
        let store = SqliteStore::open_in_memory().unwrap();
        let ghost = TaskList { id: ListId(99), ..TaskList::new("Ghost") };
        assert!(!store.update_list(&ghost).unwrap());
        assert_eq!(store.count_lists().unwrap(), 0);
    }

    #[test]
    fn test_lists_are_newest_first() {
        let store = SqliteStore::open_in_memory().unwrap();
        let a = store.insert_list(&TaskList::new("A")).unwrap();
        let b = store.insert_list(&TaskList::new("B")).unwrap();
        let c = store.insert_list(&TaskList::new("C")).unwrap();

        let ids: Vec<ListId> = store.all_lists().unwrap().into_iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![c, b, a]);
    }

    #[test]
    fn test_delete_list_cascades_to_tasks() {
        let (store, id) = store_with_list("Work");
        let home = store.insert_list(&TaskList::new("Home")).unwrap();
        store.insert_task(&Task::new("Email", id)).unwrap();
        store.insert_task(&Task::new("Report", id)).unwrap();
        store.insert_task(&Task::new("Dishes", home)).unwrap();

        store.delete_list(id).unwrap();

        assert_eq!(store.count_tasks_for_list(id).unwrap(), 0);
        assert_eq!(store.count_tasks().unwrap(), 1);
    }

    #[test]
    fn test_task_for_missing_list_is_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result = store.insert_task(&Task::new("Orphan", ListId(42)));
        assert!(matches!(result, Err(crate::Error::Storage(_))));
    }

    #[test]
    fn test_ids_are_not_reused() {
        let (store, id) = store_with_list("First");
        store.delete_list(id).unwrap();
        let next = store.insert_list(&TaskList::new("Second")).unwrap();
        assert!(next.0 > id.0);
    }

    #[test]
    fn test_insert_with_id_restores_row() {
        let (store, id) = store_with_list("Undo me");
        let list = store.get_list(id).unwrap().unwrap();
        store.delete_list(id).unwrap();

        let restored = store.insert_list(&list).unwrap();
        assert_eq!(restored, id);
        assert_eq!(store.get_list(id).unwrap().unwrap(), list);
    }

    #[test]
    fn test_count_tracks_inserts_and_deletes() {
        let (store, id) = store_with_list("Count");
        let t1 = store.insert_task(&Task::new("one", id)).unwrap();
        store.insert_task(&Task::new("two", id)).unwrap();
        assert_eq!(store.count_tasks_for_list(id).unwrap(), 2);

        store.delete_task(t1).unwrap();
        assert_eq!(store.count_tasks_for_list(id).unwrap(), 1);
    }

    #[test]
    fn test_delete_completed_returns_removed() {
        let (mut store, id) = store_with_list("Chores");
        store.insert_task(&Task::new("done", id).completed(true)).unwrap();
        let open = store.insert_task(&Task::new("open", id)).unwrap();

        let removed = store.delete_completed(id).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].title, "done");

        let left = store.tasks_for_list(id).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, open);
    }

    #[test]
    fn test_insert_list_with_tasks_is_atomic() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .conn
            .execute_batch(
                "CREATE TEMP TRIGGER reject_boom BEFORE INSERT ON tasks WHEN NEW.title = 'boom'
                 BEGIN SELECT RAISE(ABORT, 'boom'); END",
            )
            .unwrap();

        let tasks = [("a".to_string(), false), ("boom".to_string(), false)];
        let result = store.insert_list_with_tasks(&TaskList::new("Half"), &tasks);
        assert!(result.is_err());
        assert_eq!(store.count_lists().unwrap(), 0);
        assert_eq!(store.count_tasks().unwrap(), 0);

        let (id, task_ids) = store
            .insert_list_with_tasks(&TaskList::new("Fresh"), &[("a".to_string(), true), ("b".to_string(), false)])
            .unwrap();
        assert_eq!(task_ids.len(), 2);
        assert_eq!(store.count_tasks_for_list(id).unwrap(), 2);
    }

    #[test]
    fn test_seed_only_once() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert!(store.seed_sample_data().unwrap());
        assert!(!store.seed_sample_data().unwrap());

        let stats = store.stats().unwrap();
        assert_eq!(stats.lists, 3);
        assert_eq!(stats.tasks, 9);
        assert_eq!(stats.completed, 2);
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todo.db");

        let id = {
            let store = SqliteStore::open(&path).unwrap();
            let id = store.insert_list(&TaskList::new("Durable")).unwrap();
            store.insert_task(&Task::new("survive restart", id)).unwrap();
            id
        };

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get_list(id).unwrap().unwrap().name, "Durable");
        assert_eq!(store.count_tasks_for_list(id).unwrap(), 1);
    }
}
