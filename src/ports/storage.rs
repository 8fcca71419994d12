//! Storage Ports
//!
//! The document store and connector registry are used through a session:
//! writes are staged until [`DocumentStore::commit`] and discarded by
//! [`DocumentStore::rollback`]. Lookups see the session's own staged writes,
//! never another session's. [`SessionStore::begin`] opens a fresh session.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::connector::{Connector, ConnectorId, ConnectorKind};
use crate::domain::document::StoredDocument;
use crate::domain::token::ConnectorConfig;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    #[error("Duplicate document {unique_identifier_hash} in search space {search_space_id}")]
    DuplicateDocument {
        search_space_id: i64,
        unique_identifier_hash: String,
    },

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Connector not found: {0}")]
    ConnectorNotFound(ConnectorId),

    #[error("Failed to persist store: {0}")]
    WriteError(String),

    #[error("Failed to load store: {0}")]
    ReadError(String),

    #[error("Store is corrupted: {0}")]
    Corrupted(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Find a document by identity hash within a search space
    async fn find_by_identifier(
        &self,
        search_space_id: i64,
        unique_identifier_hash: &str,
    ) -> Result<Option<StoredDocument>, StorageError>;

    /// Stage a new document; fails if the identity already exists
    async fn insert(&self, document: StoredDocument) -> Result<(), StorageError>;

    /// Stage a replacement of an existing document (same identity)
    async fn update(&self, document: StoredDocument) -> Result<(), StorageError>;

    /// Make all staged writes durable
    async fn commit(&self) -> Result<(), StorageError>;

    /// Discard all staged writes
    async fn rollback(&self) -> Result<(), StorageError>;
}

#[async_trait]
pub trait ConnectorStore: Send + Sync {
    /// Fetch a connector by id, only if it is of the given kind
    async fn get_connector(
        &self,
        id: ConnectorId,
        kind: ConnectorKind,
    ) -> Result<Option<Connector>, StorageError>;

    /// Stage the last successful sync time
    async fn set_last_indexed(
        &self,
        id: ConnectorId,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Create the connector for `(search_space_id, user_id, kind)`, or replace
    /// the config of the existing one. Staged; returns the connector.
    async fn upsert_connector(
        &self,
        search_space_id: i64,
        user_id: &str,
        kind: ConnectorKind,
        config: ConnectorConfig,
    ) -> Result<Connector, StorageError>;

    /// Stage deletion of the connector for `(search_space_id, user_id, kind)`.
    /// Returns false when there was nothing to delete.
    async fn delete_connector(
        &self,
        search_space_id: i64,
        user_id: &str,
        kind: ConnectorKind,
    ) -> Result<bool, StorageError>;

    async fn list_connectors(&self) -> Result<Vec<Connector>, StorageError>;
}

/// One session over documents and connectors
pub trait IndexStore: DocumentStore + ConnectorStore {}

impl<T: DocumentStore + ConnectorStore> IndexStore for T {}

/// A store shared by concurrent indexing runs, each with its own session
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Open a session with nothing staged. Dropping it discards its staged
    /// writes; committing it publishes them to every later session.
    async fn begin(&self) -> Result<Box<dyn IndexStore>, StorageError>;
}
