//! Live queries
//!
//! A [`LiveQuery`] yields the current result of its query, then a fresh
//! snapshot after every change to one of the tables it watches. Dropping it
//! unsubscribes.

use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};
use crate::storage::SqliteStore;
use crate::Result;
use super::{Repository, Table, TableChange};

pub(crate) type QueryFn<T> = Arc<dyn Fn(&SqliteStore) -> Result<T> + Send + Sync + 'static>;

/// A subscription that re-runs a query whenever its tables change
pub struct LiveQuery<T> {
    repo: Repository,
    changes: broadcast::Receiver<TableChange>,
    tables: Vec<Table>,
    query: QueryFn<T>,
    primed: bool,
}

impl<T: Send + 'static> LiveQuery<T> {
    pub(crate) fn new(repo: Repository, tables: Vec<Table>, query: QueryFn<T>) -> Self {
        let changes = repo.notifier.subscribe();
        debug!(?tables, subscribers = repo.subscriber_count(), "Live query subscribed");
        Self {
            repo,
            changes,
            tables,
            query,
            primed: false,
        }
    }

    /// Wait for the next snapshot.
    ///
    /// The first call returns immediately with the current result. Later calls
    /// wait for a change to a watched table. Returns `None` if the change
    /// channel closes.
    pub async fn next(&mut self) -> Option<Result<T>> {
        if !self.primed {
            self.primed = true;
            return Some(self.snapshot().await);
        }

        loop {
            match self.changes.recv().await {
                Ok(change) if self.tables.contains(&change.table) => {
                    debug!(table = %change.table, "Live query refreshing");
                    return Some(self.snapshot().await);
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    // Missed events are unknowable; a re-read catches up on all of them.
                    warn!(skipped, "Live query lagged, re-reading");
                    return Some(self.snapshot().await);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Run the query now, without waiting for a change.
    pub async fn snapshot(&self) -> Result<T> {
        let query = Arc::clone(&self.query);
        self.repo.call(move |store, _| query(&*store)).await
    }
}

impl<T> Drop for LiveQuery<T> {
    fn drop(&mut self) {
        debug!(tables = ?self.tables, "Live query unsubscribed");
    }
}
