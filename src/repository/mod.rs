//! Repository Layer - asynchronous access to the store
//!
//! Every operation runs on the store worker thread, never on the caller's.
//! Mutations come in two flavours:
//! - awaited (`async fn`), resolving with the result once the write landed
//! - detached (`*_detached`), fire-and-forget; failures are logged
//!
//! Jobs run in submission order, so a detached write followed by an awaited
//! read always observes the write.

mod live;
mod worker;

pub use live::LiveQuery;
pub use worker::{ChangeNotifier, Table, TableChange};

use std::sync::Arc;
use crossbeam::channel::Sender;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};
use crate::model::{ListId, Task, TaskId, TaskList};
use crate::storage::{DbStats, SqliteStore};
use crate::{Error, Result};
use worker::Job;

/// Handle to the store worker. Cheap to clone; all clones share one worker.
#[derive(Clone)]
pub struct Repository {
    jobs: Sender<Job>,
    notifier: ChangeNotifier,
}

impl Repository {
    /// Move `store` onto a fresh worker thread.
    pub fn new(store: SqliteStore) -> Result<Self> {
        let notifier = ChangeNotifier::new();
        let jobs = worker::spawn(store, notifier.clone())?;
        Ok(Self { jobs, notifier })
    }

    /// Number of live queries currently subscribed
    pub fn subscriber_count(&self) -> usize {
        self.notifier.subscriber_count()
    }

    // ========== Plumbing ==========

    fn submit<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce(&mut SqliteStore, &ChangeNotifier) + Send + 'static,
    {
        self.jobs.send(Box::new(job)).map_err(|_| Error::WorkerStopped)
    }

    /// Run `f` on the worker and wait for its result.
    pub(crate) async fn call<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteStore, &ChangeNotifier) -> Result<T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.submit(move |store, notifier| {
            // The caller may have stopped waiting; the work is done either way.
            let _ = tx.send(f(store, notifier));
        })?;
        rx.await.map_err(|_| Error::WorkerStopped)?
    }

    /// Run `f` on the worker without waiting. Errors are logged.
    fn detach<F>(&self, op: &'static str, f: F)
    where
        F: FnOnce(&mut SqliteStore, &ChangeNotifier) -> Result<()> + Send + 'static,
    {
        let submitted = self.submit(move |store, notifier| {
            if let Err(e) = f(store, notifier) {
                error!(op, error = %e, "Detached store operation failed");
            }
        });
        if let Err(e) = submitted {
            error!(op, error = %e, "Could not queue store operation");
        }
    }

    /// Wait until every job queued before this call has run.
    pub async fn flush(&self) -> Result<()> {
        self.call(|_, _| Ok(())).await
    }

    // ========== Lists ==========

    /// Insert (or replace) a list and return its id
    pub async fn insert_list(&self, list: TaskList) -> Result<ListId> {
        self.call(move |store, notifier| write_list(store, notifier, &list)).await
    }

    pub fn insert_list_detached(&self, list: TaskList) {
        self.detach("insert_list", move |store, notifier| {
            write_list(store, notifier, &list).map(|_| ())
        });
    }

    /// Insert a list and hand the outcome to `callback` on the worker thread.
    ///
    /// The callback runs before any job submitted after this call, so work it
    /// queues against the new id is ordered after the insert.
    pub fn insert_list_with_callback<F>(&self, list: TaskList, callback: F) -> Result<()>
    where
        F: FnOnce(Result<ListId>) + Send + 'static,
    {
        self.submit(move |store, notifier| callback(write_list(store, notifier, &list)))
    }

    /// Replace a stored list. Fails with [`Error::ListNotFound`] if it is gone.
    pub async fn update_list(&self, list: TaskList) -> Result<()> {
        self.call(move |store, notifier| {
            if store.update_list(&list)? {
                debug!(id = %list.id, "List updated");
                notifier.notify(&[Table::TaskLists]);
                Ok(())
            } else {
                Err(Error::ListNotFound(list.id))
            }
        })
        .await
    }

    pub fn update_list_detached(&self, list: TaskList) {
        self.detach("update_list", move |store, notifier| {
            if store.update_list(&list)? {
                notifier.notify(&[Table::TaskLists]);
            } else {
                warn!(id = %list.id, "Update of missing list ignored");
            }
            Ok(())
        });
    }

    /// Delete a list together with its tasks
    pub async fn delete_list(&self, id: ListId) -> Result<()> {
        self.call(move |store, notifier| {
            if remove_list(store, notifier, id)? {
                Ok(())
            } else {
                Err(Error::ListNotFound(id))
            }
        })
        .await
    }

    pub fn delete_list_detached(&self, id: ListId) {
        self.detach("delete_list", move |store, notifier| {
            remove_list(store, notifier, id).map(|_| ())
        });
    }

    pub async fn get_list(&self, id: ListId) -> Result<Option<TaskList>> {
        if !id.is_valid() {
            return Ok(None);
        }
        self.call(move |store, _| store.get_list(id)).await
    }

    /// All lists, newest first
    pub async fn all_lists(&self) -> Result<Vec<TaskList>> {
        self.call(|store, _| store.all_lists()).await
    }

    /// Live feed of all lists, newest first
    pub fn watch_lists(&self) -> LiveQuery<Vec<TaskList>> {
        LiveQuery::new(self.clone(), vec![Table::TaskLists], Arc::new(|store: &SqliteStore| store.all_lists()))
    }

    // ========== Tasks ==========

    /// Insert (or replace) a task and return its id
    pub async fn insert_task(&self, task: Task) -> Result<TaskId> {
        self.call(move |store, notifier| write_task(store, notifier, &task)).await
    }

    pub fn insert_task_detached(&self, task: Task) {
        self.detach("insert_task", move |store, notifier| {
            write_task(store, notifier, &task).map(|_| ())
        });
    }

    /// Replace a stored task. Fails with [`Error::TaskNotFound`] if it is gone.
    pub async fn update_task(&self, task: Task) -> Result<()> {
        self.call(move |store, notifier| {
            if store.update_task(&task)? {
                debug!(id = %task.id, completed = task.is_completed, "Task updated");
                notifier.notify(&[Table::Tasks]);
                Ok(())
            } else {
                Err(Error::TaskNotFound(task.id))
            }
        })
        .await
    }

    pub fn update_task_detached(&self, task: Task) {
        self.detach("update_task", move |store, notifier| {
            if store.update_task(&task)? {
                notifier.notify(&[Table::Tasks]);
            } else {
                warn!(id = %task.id, "Update of missing task ignored");
            }
            Ok(())
        });
    }

    pub async fn delete_task(&self, id: TaskId) -> Result<()> {
        self.call(move |store, notifier| {
            if store.delete_task(id)? {
                debug!(%id, "Task deleted");
                notifier.notify(&[Table::Tasks]);
                Ok(())
            } else {
                Err(Error::TaskNotFound(id))
            }
        })
        .await
    }

    pub fn delete_task_detached(&self, id: TaskId) {
        self.detach("delete_task", move |store, notifier| {
            if store.delete_task(id)? {
                notifier.notify(&[Table::Tasks]);
            }
            Ok(())
        });
    }

    pub async fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        if !id.is_valid() {
            return Ok(None);
        }
        self.call(move |store, _| store.get_task(id)).await
    }

    /// Tasks of a list, newest first. An invalid id yields no tasks.
    pub async fn tasks_for_list(&self, list_id: ListId) -> Result<Vec<Task>> {
        if !list_id.is_valid() {
            debug!(%list_id, "Skipping task query for unresolved list");
            return Ok(Vec::new());
        }
        self.call(move |store, _| store.tasks_for_list(list_id)).await
    }

    /// Live feed of one list's tasks, newest first.
    ///
    /// An invalid id yields empty snapshots without querying the store.
    pub fn watch_tasks(&self, list_id: ListId) -> LiveQuery<Vec<Task>> {
        let query: live::QueryFn<Vec<Task>> = if list_id.is_valid() {
            Arc::new(move |store: &SqliteStore| store.tasks_for_list(list_id))
        } else {
            Arc::new(|_: &SqliteStore| Ok(Vec::new()))
        };
        LiveQuery::new(self.clone(), vec![Table::Tasks], query)
    }

    /// Point-in-time task count of a list
    pub async fn count_tasks_for_list(&self, list_id: ListId) -> Result<usize> {
        if !list_id.is_valid() {
            return Ok(0);
        }
        self.call(move |store, _| store.count_tasks_for_list(list_id)).await
    }

    /// Delete every completed task of a list, returning the removed rows
    pub async fn delete_completed(&self, list_id: ListId) -> Result<Vec<Task>> {
        if !list_id.is_valid() {
            return Ok(Vec::new());
        }
        self.call(move |store, notifier| {
            let removed = store.delete_completed(list_id)?;
            if !removed.is_empty() {
                debug!(%list_id, count = removed.len(), "Completed tasks deleted");
                notifier.notify(&[Table::Tasks]);
            }
            Ok(removed)
        })
        .await
    }

    /// Put previously deleted tasks back under their original ids
    pub fn restore_tasks_detached(&self, tasks: Vec<Task>) {
        for task in tasks {
            self.insert_task_detached(task);
        }
    }

    // ========== Bulk ==========

    /// Create a list and its tasks atomically, in order.
    pub async fn insert_list_with_tasks(
        &self,
        list: TaskList,
        tasks: Vec<(String, bool)>,
    ) -> Result<(ListId, Vec<TaskId>)> {
        self.call(move |store, notifier| {
            let created = store.insert_list_with_tasks(&list, &tasks)?;
            info!(id = %created.0, name = %list.name, tasks = tasks.len(), "List created with tasks");
            notifier.notify(&[Table::TaskLists, Table::Tasks]);
            Ok(created)
        })
        .await
    }

    /// Fill an empty store with example lists. Returns whether anything was written.
    pub async fn seed_sample_data(&self) -> Result<bool> {
        self.call(|store, notifier| {
            let seeded = store.seed_sample_data()?;
            if seeded {
                info!("Sample data seeded");
                notifier.notify(&[Table::TaskLists, Table::Tasks]);
            }
            Ok(seeded)
        })
        .await
    }

    pub async fn stats(&self) -> Result<DbStats> {
        self.call(|store, _| store.stats()).await
    }
}

fn write_list(store: &mut SqliteStore, notifier: &ChangeNotifier, list: &TaskList) -> Result<ListId> {
    let id = store.insert_list(list)?;
    debug!(%id, name = %list.name, "List stored");
    if list.id.is_valid() {
        // A replace may have cascaded into the old row's tasks.
        notifier.notify(&[Table::TaskLists, Table::Tasks]);
    } else {
        notifier.notify(&[Table::TaskLists]);
    }
    Ok(id)
}

fn remove_list(store: &mut SqliteStore, notifier: &ChangeNotifier, id: ListId) -> Result<bool> {
    let removed = store.delete_list(id)?;
    if removed {
        debug!(%id, "List deleted");
        notifier.notify(&[Table::TaskLists, Table::Tasks]);
    }
    Ok(removed)
}

fn write_task(store: &mut SqliteStore, notifier: &ChangeNotifier, task: &Task) -> Result<TaskId> {
    let id = store.insert_task(task)?;
    debug!(%id, list_id = %task.list_id, "Task stored");
    notifier.notify(&[Table::Tasks]);
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn repo() -> Repository {
        Repository::new(SqliteStore::open_in_memory().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_detached_writes_apply_in_order() {
        let repo = repo();
        let id = repo.insert_list(TaskList::new("Errands")).await.unwrap();

        repo.insert_task_detached(Task::new("post office", id));
        repo.insert_task_detached(Task::new("bank", id));
        repo.flush().await.unwrap();

        let titles: Vec<String> = repo.tasks_for_list(id).await.unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["bank", "post office"]);
    }

    #[tokio::test]
    async fn test_invalid_list_id_yields_nothing() {
        let repo = repo();
        assert!(repo.tasks_for_list(ListId::NOT_FOUND).await.unwrap().is_empty());
        assert_eq!(repo.count_tasks_for_list(ListId::NOT_FOUND).await.unwrap(), 0);
        assert!(repo.get_list(ListId::NOT_FOUND).await.unwrap().is_none());

        let mut live = repo.watch_tasks(ListId::NOT_FOUND);
        assert!(live.next().await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_callback_receives_id_before_later_jobs() {
        let repo = repo();
        let (tx, rx) = oneshot::channel();
        let inner = repo.clone();

        repo.insert_list_with_callback(TaskList::new("Imported"), move |result| {
            let id = result.unwrap();
            inner.insert_task_detached(Task::new("first", id));
            let _ = tx.send(id);
        })
        .unwrap();

        let id = rx.await.unwrap();
        repo.flush().await.unwrap();
        assert_eq!(repo.count_tasks_for_list(id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_rows_fail() {
        let repo = repo();
        let ghost = TaskList { id: ListId(404), ..TaskList::new("Ghost") };
        assert!(matches!(repo.update_list(ghost).await, Err(Error::ListNotFound(ListId(404)))));
        assert!(matches!(repo.delete_task(TaskId(9)).await, Err(Error::TaskNotFound(TaskId(9)))));
    }

    #[tokio::test]
    async fn test_live_tasks_follow_writes() {
        let repo = repo();
        let id = repo.insert_list(TaskList::new("Live")).await.unwrap();
        let mut live = repo.watch_tasks(id);

        assert!(live.next().await.unwrap().unwrap().is_empty());

        let task_id = repo.insert_task(Task::new("Milk", id)).await.unwrap();
        let snapshot = live.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, task_id);

        let task = snapshot[0].toggled();
        repo.update_task(task).await.unwrap();
        let snapshot = live.next().await.unwrap().unwrap();
        assert!(snapshot[0].is_completed);
    }

    #[tokio::test]
    async fn test_live_lists_ignore_unrelated_tables() {
        let repo = repo();
        let id = repo.insert_list(TaskList::new("Quiet")).await.unwrap();
        let mut live = repo.watch_lists();
        assert_eq!(live.next().await.unwrap().unwrap().len(), 1);

        repo.insert_task(Task::new("noise", id)).await.unwrap();
        let waited = tokio::time::timeout(Duration::from_millis(100), live.next()).await;
        assert!(waited.is_err(), "task writes must not refresh the lists feed");
    }

    #[tokio::test]
    async fn test_dropping_live_query_unsubscribes() {
        let repo = repo();
        let live = repo.watch_lists();
        let other = repo.watch_tasks(ListId(1));
        assert_eq!(repo.subscriber_count(), 2);

        drop(live);
        assert_eq!(repo.subscriber_count(), 1);
        drop(other);
        assert_eq!(repo.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_detached_list_and_task_updates() {
        let repo = repo();
        repo.insert_list_detached(TaskList::new("Draft"));
        repo.flush().await.unwrap();

        let list = repo.all_lists().await.unwrap().remove(0);
        let task_id = repo.insert_task(Task::new("sketch", list.id)).await.unwrap();
        let task = repo.get_task(task_id).await.unwrap().unwrap();

        repo.update_list_detached(list.renamed("Final"));
        repo.update_task_detached(task.toggled());
        repo.flush().await.unwrap();

        assert_eq!(repo.get_list(list.id).await.unwrap().unwrap().name, "Final");
        assert!(repo.get_task(task_id).await.unwrap().unwrap().is_completed);
    }

    #[tokio::test]
    async fn test_detached_update_of_missing_rows_is_ignored() {
        let repo = repo();
        let id = repo.insert_list(TaskList::new("Real")).await.unwrap();
        let mut live = repo.watch_lists();
        live.next().await.unwrap().unwrap();

        let ghost_list = TaskList { id: ListId(404), ..TaskList::new("Ghost") };
        let ghost_task = Task { id: TaskId(77), ..Task::new("ghost", id) };
        repo.update_list_detached(ghost_list);
        repo.update_task_detached(ghost_task);
        repo.flush().await.unwrap();

        let stats = repo.stats().await.unwrap();
        assert_eq!((stats.lists, stats.tasks), (1, 0));
        let waited = tokio::time::timeout(Duration::from_millis(100), live.next()).await;
        assert!(waited.is_err(), "ignored updates must not publish changes");
    }

    #[tokio::test]
    async fn test_panicking_job_leaves_worker_running() {
        let repo = repo();
        repo.insert_list_with_callback(TaskList::new("Before"), |_| panic!("callback failed"))
            .unwrap();

        let lists = repo.all_lists().await.unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].name, "Before");

        repo.insert_list(TaskList::new("After")).await.unwrap();
        assert_eq!(repo.stats().await.unwrap().lists, 2);
    }

    #[tokio::test]
    async fn test_lagging_live_query_rereads_everything() {
        let repo = repo();
        let id = repo.insert_list(TaskList::new("Flood")).await.unwrap();
        let mut live = repo.watch_tasks(id);
        assert!(live.next().await.unwrap().unwrap().is_empty());

        let flood = worker::CHANGE_CAPACITY + 144;
        for i in 0..flood {
            repo.insert_task_detached(Task::new(format!("task {i}"), id));
        }
        repo.flush().await.unwrap();

        let snapshot = live.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), flood);
        assert_eq!(snapshot[0].title, format!("task {}", flood - 1));
    }

    #[tokio::test]
    async fn test_delete_completed_and_restore() {
        let repo = repo();
        let id = repo.insert_list(TaskList::new("Chores")).await.unwrap();
        repo.insert_task(Task::new("dishes", id).completed(true)).await.unwrap();
        repo.insert_task(Task::new("laundry", id)).await.unwrap();

        let removed = repo.delete_completed(id).await.unwrap();
        assert_eq!(repo.count_tasks_for_list(id).await.unwrap(), 1);

        let restored_id = removed[0].id;
        repo.restore_tasks_detached(removed);
        repo.flush().await.unwrap();
        assert_eq!(repo.count_tasks_for_list(id).await.unwrap(), 2);
        assert!(repo.get_task(restored_id).await.unwrap().unwrap().is_completed);
    }
}
