//! Share links - carry a list and its tasks to another device
//!
//! Link format: `<base>?data=<payload>` where payload is
//! `base64url-no-padding(JSON {listName, listColor, tasks: [{title, isCompleted}]})`.
//!
//! Ids never travel. The receiving side allocates fresh ones and writes the
//! list and all of its tasks in a single transaction, after the whole payload
//! has parsed and the user has confirmed.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;
use crate::model::{ListId, Task, TaskId, TaskList};
use crate::repository::Repository;
use crate::{Error, Result};

/// Host page that receives share links
pub const DEFAULT_SHARE_BASE_URL: &str = "https://manucho89.github.io/todolist/";

/// Query parameter holding the encoded payload
pub const DATA_PARAM: &str = "data";

/// Wire shape of a shared list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedTaskList {
    pub list_name: String,
    pub list_color: i32,
    pub tasks: Vec<SharedTask>,
}

/// Wire shape of a shared task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedTask {
    pub title: String,
    pub is_completed: bool,
}

impl SharedTaskList {
    /// Project a list and its tasks onto the wire shape, dropping ids.
    ///
    /// `tasks` keep the order they are given in.
    pub fn from_list(list: &TaskList, tasks: &[Task]) -> Self {
        Self {
            list_name: list.name.clone(),
            list_color: list.color,
            tasks: tasks
                .iter()
                .map(|t| SharedTask {
                    title: t.title.clone(),
                    is_completed: t.is_completed,
                })
                .collect(),
        }
    }

    /// A new, unsaved list carrying the shared name and color
    pub fn to_task_list(&self) -> TaskList {
        TaskList::with_color(self.list_name.clone(), self.list_color)
    }

    /// `(title, is_completed)` pairs in payload order
    pub fn task_rows(&self) -> Vec<(String, bool)> {
        self.tasks.iter().map(|t| (t.title.clone(), t.is_completed)).collect()
    }
}

/// Serialize and encode a shared list into the link payload
pub fn encode_payload(shared: &SharedTaskList) -> Result<String> {
    let json = serde_json::to_vec(shared)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Reverse [`encode_payload`].
///
/// Trailing `=` padding is tolerated so links from padded encoders still import.
pub fn decode_payload(payload: &str) -> Result<SharedTaskList> {
    let trimmed = payload.trim().trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD.decode(trimmed)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Build the full share link under `base_url`
pub fn share_link(base_url: &str, shared: &SharedTaskList) -> Result<String> {
    let mut url = Url::parse(base_url)
        .map_err(|e| Error::InvalidLink(format!("bad base URL {base_url}: {e}")))?;
    url.query_pairs_mut().append_pair(DATA_PARAM, &encode_payload(shared)?);
    Ok(url.into())
}

/// Pull the shared list out of a link carrying a `data` parameter
pub fn parse_link(link: &str) -> Result<SharedTaskList> {
    let url = Url::parse(link.trim()).map_err(|e| Error::InvalidLink(e.to_string()))?;
    let payload = url
        .query_pairs()
        .find(|(key, _)| key == DATA_PARAM)
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| Error::InvalidLink(format!("missing '{DATA_PARAM}' parameter")))?;
    decode_payload(&payload)
}

/// Human-readable message to send along with a link
pub fn share_message(list_name: &str, task_count: usize, link: &str) -> String {
    format!(
        "📋 *{list_name}*\n\nI'm sharing my task list ({task_count} tasks)\n\nOpen this link to import it into your app:\n{link}"
    )
}

/// A ready-to-send share of one list
#[derive(Debug, Clone)]
pub struct ShareLink {
    pub shared: SharedTaskList,
    pub link: String,
    pub message: String,
}

/// Export a stored list as a share link.
///
/// Tasks are sent in creation order. Fails with [`Error::NothingToShare`] for a
/// list without tasks.
pub async fn export_list(repo: &Repository, list_id: ListId, base_url: &str) -> Result<ShareLink> {
    let list = repo.get_list(list_id).await?.ok_or(Error::ListNotFound(list_id))?;
    let mut tasks = repo.tasks_for_list(list_id).await?;
    if tasks.is_empty() {
        return Err(Error::NothingToShare(list_id));
    }
    // The store hands them back newest first.
    tasks.reverse();

    let shared = SharedTaskList::from_list(&list, &tasks);
    let link = share_link(base_url, &shared)?;
    let message = share_message(&list.name, tasks.len(), &link);
    info!(%list_id, tasks = tasks.len(), "List exported");
    Ok(ShareLink { shared, link, message })
}

/// Result of an import attempt that decoded cleanly
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported { list_id: ListId, task_ids: Vec<TaskId> },
    Declined,
}

/// Decode `link`, ask `confirm`, and on approval store the list and its tasks.
///
/// Decode failures come back as errors for which
/// [`Error::is_import_failure`] holds; the store is untouched in that case and
/// when `confirm` declines.
pub async fn import_link<F>(repo: &Repository, link: &str, confirm: F) -> Result<ImportOutcome>
where
    F: FnOnce(&SharedTaskList) -> bool,
{
    let shared = parse_link(link).inspect_err(|e| warn!(error = %e, "Import failed"))?;
    import_shared(repo, shared, confirm).await
}

/// Same as [`import_link`] for an already decoded list
pub async fn import_shared<F>(repo: &Repository, shared: SharedTaskList, confirm: F) -> Result<ImportOutcome>
where
    F: FnOnce(&SharedTaskList) -> bool,
{
    if !confirm(&shared) {
        info!(name = %shared.list_name, "Import declined");
        return Ok(ImportOutcome::Declined);
    }

    let (list_id, task_ids) = repo
        .insert_list_with_tasks(shared.to_task_list(), shared.task_rows())
        .await?;
    info!(%list_id, tasks = task_ids.len(), "List imported");
    Ok(ImportOutcome::Imported { list_id, task_ids })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStore;

    fn groceries() -> SharedTaskList {
        SharedTaskList {
            list_name: "Shopping".to_string(),
            list_color: 0xFF4CAF50_u32 as i32,
            tasks: vec![
                SharedTask { title: "Milk".to_string(), is_completed: true },
                SharedTask { title: "Bread".to_string(), is_completed: false },
            ],
        }
    }

    #[test]
    fn test_payload_json_shape() {
        let json = serde_json::to_value(groceries()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "listName": "Shopping",
                "listColor": -11751600,
                "tasks": [
                    {"title": "Milk", "isCompleted": true},
                    {"title": "Bread", "isCompleted": false},
                ]
            })
        );
    }

    #[test]
    fn test_payload_is_url_safe_without_padding() {
        let payload = encode_payload(&groceries()).unwrap();
        assert!(payload.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(decode_payload(&payload).unwrap(), groceries());
    }

    #[test]
    fn test_padded_payload_still_decodes() {
        let padded = base64::engine::general_purpose::URL_SAFE
            .encode(serde_json::to_vec(&groceries()).unwrap());
        assert_eq!(decode_payload(&padded).unwrap(), groceries());
    }

    #[test]
    fn test_link_layout() {
        let link = share_link(DEFAULT_SHARE_BASE_URL, &groceries()).unwrap();
        let prefix = format!("{DEFAULT_SHARE_BASE_URL}?data=");
        assert!(link.starts_with(&prefix));
        assert_eq!(&link[prefix.len()..], encode_payload(&groceries()).unwrap());
        assert_eq!(parse_link(&link).unwrap(), groceries());
    }

    #[test]
    fn test_bad_links_are_import_failures() {
        let truncated = {
            let link = share_link(DEFAULT_SHARE_BASE_URL, &groceries()).unwrap();
            link[..link.len() - 7].to_string()
        };
        let cases = [
            "not a url".to_string(),
            format!("{DEFAULT_SHARE_BASE_URL}?other=1"),
            format!("{DEFAULT_SHARE_BASE_URL}?data=***"),
            format!("{DEFAULT_SHARE_BASE_URL}?data={}", URL_SAFE_NO_PAD.encode("{\"listName\":\"x\"}")),
            truncated,
        ];
        for case in cases {
            let err = parse_link(&case).unwrap_err();
            assert!(err.is_import_failure(), "{case}: {err}");
        }
    }

    #[test]
    fn test_message_mentions_count_and_link() {
        let msg = share_message("Shopping", 2, "https://x/?data=abc");
        assert!(msg.contains("*Shopping*"));
        assert!(msg.contains("(2 tasks)"));
        assert!(msg.ends_with("https://x/?data=abc"));
    }

    #[tokio::test]
    async fn test_declined_import_writes_nothing() {
        let repo = Repository::new(SqliteStore::open_in_memory().unwrap()).unwrap();
        let link = share_link(DEFAULT_SHARE_BASE_URL, &groceries()).unwrap();

        let outcome = import_link(&repo, &link, |_| false).await.unwrap();
        assert_eq!(outcome, ImportOutcome::Declined);
        assert_eq!(repo.stats().await.unwrap().lists, 0);
    }

    #[tokio::test]
    async fn test_corrupt_link_never_asks_or_writes() {
        let repo = Repository::new(SqliteStore::open_in_memory().unwrap()).unwrap();
        let link = format!("{DEFAULT_SHARE_BASE_URL}?data=eyJsaXN0TmFtZSI6");

        let result = import_link(&repo, &link, |_| panic!("must not ask")).await;
        assert!(result.unwrap_err().is_import_failure());
        let stats = repo.stats().await.unwrap();
        assert_eq!((stats.lists, stats.tasks), (0, 0));
    }

    #[tokio::test]
    async fn test_export_empty_list_is_refused() {
        let repo = Repository::new(SqliteStore::open_in_memory().unwrap()).unwrap();
        let id = repo.insert_list(TaskList::new("Empty")).await.unwrap();

        let result = export_list(&repo, id, DEFAULT_SHARE_BASE_URL).await;
        assert!(matches!(result, Err(Error::NothingToShare(_))));
        let missing = export_list(&repo, ListId(999), DEFAULT_SHARE_BASE_URL).await;
        assert!(matches!(missing, Err(Error::ListNotFound(ListId(999)))));
    }
}
