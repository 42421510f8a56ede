//! Lists-with-count feed for list overview screens
//!
//! Each snapshot is the all-lists query (newest first) with one point count
//! lookup per list zipped in. That is O(lists) lookups per refresh, fine for a
//! personal to-do store.
//!
//! The feed refreshes on task writes as well as list writes, so counts never
//! go stale after tasks are added or removed.

use std::sync::Arc;
use crate::model::TaskListWithCount;
use crate::repository::{LiveQuery, Repository, Table};
use crate::storage::SqliteStore;
use crate::Result;

/// Zip every list with its current task count, keeping the list order.
pub fn lists_with_count(store: &SqliteStore) -> Result<Vec<TaskListWithCount>> {
    store
        .all_lists()?
        .into_iter()
        .map(|task_list| {
            let task_count = store.count_tasks_for_list(task_list.id)?;
            Ok(TaskListWithCount { task_list, task_count })
        })
        .collect()
}

/// Live feed of [`TaskListWithCount`] rows
pub struct ListsWithCount {
    query: LiveQuery<Vec<TaskListWithCount>>,
}

impl ListsWithCount {
    /// Subscribe to the feed. Drop the value to unsubscribe.
    pub fn subscribe(repo: &Repository) -> Self {
        let query = LiveQuery::new(
            repo.clone(),
            vec![Table::TaskLists, Table::Tasks],
            Arc::new(lists_with_count),
        );
        Self { query }
    }

    /// The next snapshot; the first call returns the current state at once.
    pub async fn next(&mut self) -> Option<Result<Vec<TaskListWithCount>>> {
        self.query.next().await
    }

    /// Current state without waiting for a change.
    pub async fn snapshot(&self) -> Result<Vec<TaskListWithCount>> {
        self.query.snapshot().await
    }
}

impl Repository {
    /// Live feed of all lists with their task counts
    pub fn watch_lists_with_count(&self) -> ListsWithCount {
        ListsWithCount::subscribe(self)
    }
}
