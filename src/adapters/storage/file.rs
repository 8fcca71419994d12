//! JSON File Store
//!
//! Durable single-file store. Staged writes live in an inner
//! [`MemoryStore`] session; every commit writes the merged snapshot to disk
//! before it is published, so a failed write leaves the previous commit in
//! place. Sessions opened with [`SessionStore::begin`] share the file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::connector::{Connector, ConnectorId, ConnectorKind};
use crate::domain::document::StoredDocument;
use crate::domain::token::ConnectorConfig;
use crate::ports::storage::{
    ConnectorStore, DocumentStore, IndexStore, SessionStore, StorageError,
};

use super::memory::{MemoryStore, StoreSnapshot};

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing or empty file is an empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let snapshot = load_snapshot(&path)?.unwrap_or_default();

        tracing::debug!(
            path = %path.display(),
            connectors = snapshot.connectors.len(),
            documents = snapshot.documents.len(),
            "Opened store"
        );

        Ok(Self {
            inner: MemoryStore::from_snapshot(snapshot)?,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Committed documents
    pub async fn documents(&self) -> Vec<StoredDocument> {
        self.inner.documents().await
    }
}

fn load_snapshot(path: &Path) -> Result<Option<StoreSnapshot>, StorageError> {
    if !path.exists() {
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .map_err(|e| StorageError::ReadError(format!("{}: {}", path.display(), e)))?;

    if json.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| StorageError::Corrupted(format!("{}: {}", path.display(), e)))
}

async fn write_snapshot(path: &Path, snapshot: &StoreSnapshot) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::WriteError(format!("create {}: {}", parent.display(), e)))?;
    }

    let json = serde_json::to_string_pretty(snapshot)
        .map_err(|e| StorageError::WriteError(e.to_string()))?;

    // Write-then-rename so readers never see a half-written file
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json)
        .await
        .map_err(|e| StorageError::WriteError(format!("{}: {}", tmp.display(), e)))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| StorageError::WriteError(format!("{}: {}", path.display(), e)))?;

    Ok(())
}

#[async_trait]
impl SessionStore for JsonFileStore {
    async fn begin(&self) -> Result<Box<dyn IndexStore>, StorageError> {
        Ok(Box::new(Self {
            path: self.path.clone(),
            inner: self.inner.session(),
        }))
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn find_by_identifier(
        &self,
        search_space_id: i64,
        unique_identifier_hash: &str,
    ) -> Result<Option<StoredDocument>, StorageError> {
        self.inner
            .find_by_identifier(search_space_id, unique_identifier_hash)
            .await
    }

    async fn insert(&self, document: StoredDocument) -> Result<(), StorageError> {
        self.inner.insert(document).await
    }

    async fn update(&self, document: StoredDocument) -> Result<(), StorageError> {
        self.inner.update(document).await
    }

    async fn commit(&self) -> Result<(), StorageError> {
        let path = self.path.clone();
        let snapshot = self
            .inner
            .commit_with(move |snapshot| async move {
                write_snapshot(&path, &snapshot).await?;
                Ok::<_, StorageError>(snapshot)
            })
            .await?;

        tracing::debug!(
            path = %self.path.display(),
            documents = snapshot.documents.len(),
            "Store committed"
        );
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StorageError> {
        self.inner.rollback().await
    }
}

#[async_trait]
impl ConnectorStore for JsonFileStore {
    async fn get_connector(
        &self,
        id: ConnectorId,
        kind: ConnectorKind,
    ) -> Result<Option<Connector>, StorageError> {
        self.inner.get_connector(id, kind).await
    }

    async fn set_last_indexed(
        &self,
        id: ConnectorId,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.inner.set_last_indexed(id, at).await
    }

    async fn upsert_connector(
        &self,
        search_space_id: i64,
        user_id: &str,
        kind: ConnectorKind,
        config: ConnectorConfig,
    ) -> Result<Connector, StorageError> {
        self.inner
            .upsert_connector(search_space_id, user_id, kind, config)
            .await
    }

    async fn delete_connector(
        &self,
        search_space_id: i64,
        user_id: &str,
        kind: ConnectorKind,
    ) -> Result<bool, StorageError> {
        self.inner
            .delete_connector(search_space_id, user_id, kind)
            .await
    }

    async fn list_connectors(&self) -> Result<Vec<Connector>, StorageError> {
        self.inner.list_connectors().await
    }
}
