//! Background store worker
//!
//! One thread owns the [`SqliteStore`] and runs jobs from an unbounded queue
//! strictly in submission order. Jobs that write announce the tables they
//! touched through the [`ChangeNotifier`] once the write has landed.

use std::panic::{self, AssertUnwindSafe};
use std::thread;
use crossbeam::channel::{self, Sender};
use tokio::sync::broadcast;
use tracing::{debug, error, trace};
use crate::storage::SqliteStore;
use crate::Result;

/// A unit of work executed on the store thread
pub(crate) type Job = Box<dyn FnOnce(&mut SqliteStore, &ChangeNotifier) + Send + 'static>;

/// Capacity of the change channel before slow subscribers start lagging
pub(crate) const CHANGE_CAPACITY: usize = 256;

/// A watched table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    TaskLists,
    Tasks,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::TaskLists => "task_lists",
            Table::Tasks => "tasks",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Published after every write that changed a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableChange {
    pub table: Table,
}

/// Publishes [`TableChange`] events to live queries
#[derive(Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<TableChange>,
}

impl ChangeNotifier {
    pub(crate) fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANGE_CAPACITY);
        Self { sender }
    }

    /// Announce that `tables` changed.
    pub fn notify(&self, tables: &[Table]) {
        for &table in tables {
            // An error only means nobody is watching right now.
            match self.sender.send(TableChange { table }) {
                Ok(receivers) => trace!(%table, receivers, "Change published"),
                Err(_) => trace!(%table, "Change published with no subscribers"),
            }
        }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<TableChange> {
        self.sender.subscribe()
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Start the store thread and return the queue feeding it.
///
/// The thread exits once every sender has been dropped and the queue is drained.
/// A panicking job is logged and skipped; the jobs behind it still run.
pub(crate) fn spawn(mut store: SqliteStore, notifier: ChangeNotifier) -> Result<Sender<Job>> {
    let (tx, rx) = channel::unbounded::<Job>();

    thread::Builder::new()
        .name("todolist-store".to_string())
        .spawn(move || {
            debug!("Store worker started");
            for job in rx {
                // An awaited caller sees its oneshot dropped and gets `WorkerStopped`.
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| job(&mut store, &notifier))) {
                    error!(reason = panic_reason(payload.as_ref()), "Store job panicked");
                }
            }
            debug!("Store worker stopped");
        })?;

    Ok(tx)
}

fn panic_reason(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
