//! The ingestion collaborator: fetches a channel's feed and appends its
//! entries as content items. It only ever writes to the items table — it
//! never creates or mutates channels or subscriptions.

pub mod parse;

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use feedbox_db::Database;

pub use parse::FeedEntry;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("HTTP {0} when fetching feed")]
    Status(reqwest::StatusCode),

    #[error("feed parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Store(#[from] feedbox_db::StoreError),

    #[error("ingest task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;

/// Feed fetcher. Holds one reqwest client, cloned per fetch.
pub struct FeedClient {
    client: reqwest::Client,
}

impl FeedClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the channel's feed once and append its entries. Entries the
    /// channel already holds (same guid) are skipped. Returns the number
    /// of newly stored items.
    pub async fn fetch_and_store(
        &self,
        db: Arc<Database>,
        channel_id: &str,
        url: &str,
    ) -> Result<usize> {
        debug!("Fetching feed from: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Status(status));
        }

        let bytes = response.bytes().await?;
        let entries = parse::parse_feed(&bytes)?;
        debug!("Parsed {} entries from {}", entries.len(), url);

        let cid = channel_id.to_string();
        let stored = tokio::task::spawn_blocking(move || {
            let mut stored = 0;
            for entry in entries {
                let guid = entry.guid.as_deref().unwrap_or(&entry.link);
                let inserted = db.insert_item(
                    &uuid::Uuid::new_v4().to_string(),
                    &cid,
                    guid,
                    &entry.title,
                    &entry.link,
                    entry.published_at.as_deref(),
                )?;
                if inserted {
                    stored += 1;
                }
            }
            Ok::<usize, IngestError>(stored)
        })
        .await
        .map_err(|e| IngestError::Task(e.to_string()))??;

        debug!("Stored {} new items for channel {}", stored, channel_id);
        Ok(stored)
    }
}

impl Default for FeedClient {
    fn default() -> Self {
        Self::new()
    }
}
