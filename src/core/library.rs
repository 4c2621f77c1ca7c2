//! Library Sink
//!
//! Persistence boundary for generated results. The pipeline hands over a copy
//! of the validated output and gets back an item id; what happens next belongs
//! to the persistence side.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LibraryError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Item rejected: {0}")]
    Rejected(String),
}

impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        LibraryError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LibraryError {
    fn from(err: serde_json::Error) -> Self {
        LibraryError::Serialization(err.to_string())
    }
}

/// A saved generation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryItem {
    pub id: String,
    /// `None` when the item is not attached to a campaign
    pub campaign_id: Option<String>,
    pub flow_id: String,
    pub content: Value,
    pub created_at: DateTime<Utc>,
}

impl LibraryItem {
    pub fn new(campaign_id: Option<String>, flow_id: String, content: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            campaign_id,
            flow_id,
            content,
            created_at: Utc::now(),
        }
    }
}

/// Destination for saved results
#[async_trait]
pub trait LibrarySink: Send + Sync {
    /// Persist `raw` and return the new item id
    async fn save(
        &self,
        campaign_id: Option<String>,
        flow_id: String,
        raw: Value,
    ) -> Result<String, LibraryError>;
}

// ============================================================================
// In-memory sink
// ============================================================================

#[derive(Default)]
pub struct InMemoryLibrary {
    items: RwLock<Vec<LibraryItem>>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn items(&self) -> Vec<LibraryItem> {
        self.items.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }
}

#[async_trait]
impl LibrarySink for InMemoryLibrary {
    async fn save(
        &self,
        campaign_id: Option<String>,
        flow_id: String,
        raw: Value,
    ) -> Result<String, LibraryError> {
        let item = LibraryItem::new(campaign_id, flow_id, raw);
        let id = item.id.clone();
        self.items.write().await.push(item);
        Ok(id)
    }
}

// ============================================================================
// JSON-lines sink
// ============================================================================

/// Append-only file with one [`LibraryItem`] per line
pub struct JsonlLibrary {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlLibrary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every saved item; a missing file is an empty library
    pub async fn load(&self) -> Result<Vec<LibraryItem>, LibraryError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(LibraryError::from))
            .collect()
    }
}

#[async_trait]
impl LibrarySink for JsonlLibrary {
    async fn save(
        &self,
        campaign_id: Option<String>,
        flow_id: String,
        raw: Value,
    ) -> Result<String, LibraryError> {
        let item = LibraryItem::new(campaign_id, flow_id, raw);
        let mut line = serde_json::to_string(&item)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        log::info!("Saved {} item {} to {}", item.flow_id, item.id, self.path.display());
        Ok(item.id)
    }
}
