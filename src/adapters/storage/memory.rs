//! In-Memory Store
//!
//! Transactional store kept entirely in memory. Every [`MemoryStore`] handle
//! is a session over one shared committed state: writes are staged in the
//! handle, `commit` merges them into the shared state, `rollback` discards
//! them. [`SessionStore::begin`] hands out sibling sessions, so concurrent
//! runs never see or discard each other's staged writes. Also the engine
//! behind [`super::JsonFileStore`].

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::connector::{Connector, ConnectorId, ConnectorKind};
use crate::domain::document::StoredDocument;
use crate::domain::token::ConnectorConfig;
use crate::ports::storage::{
    ConnectorStore, DocumentStore, IndexStore, SessionStore, StorageError,
};

/// Serializable image of the whole store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub connectors: Vec<Connector>,
    #[serde(default)]
    pub documents: Vec<StoredDocument>,
}

type DocumentKey = (i64, String);

fn document_key(document: &StoredDocument) -> DocumentKey {
    (document.search_space_id, document.unique_identifier_hash.clone())
}

#[derive(Debug, Clone, Default)]
struct State {
    connectors: BTreeMap<ConnectorId, Connector>,
    documents: BTreeMap<DocumentKey, StoredDocument>,
}

impl State {
    fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, StorageError> {
        let mut state = State::default();
        for connector in snapshot.connectors {
            state.connectors.insert(connector.id, connector);
        }
        for document in snapshot.documents {
            if state.documents.insert(document_key(&document), document).is_some() {
                return Err(StorageError::Corrupted(
                    "duplicate document identity in snapshot".into(),
                ));
            }
        }
        Ok(state)
    }

    fn to_snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            connectors: self.connectors.values().cloned().collect(),
            documents: self.documents.values().cloned().collect(),
        }
    }

    fn find_connector(
        &self,
        search_space_id: i64,
        user_id: &str,
        kind: ConnectorKind,
    ) -> Option<&Connector> {
        self.connectors.values().find(|c| {
            c.search_space_id == search_space_id && c.user_id == user_id && c.kind == kind
        })
    }

    fn next_connector_id(&self) -> ConnectorId {
        self.connectors.keys().next_back().map_or(1, |id| id + 1)
    }

    fn apply_connector_change(&mut self, change: &ConnectorChange) {
        match change {
            ConnectorChange::Upsert(connector) => {
                let existing = self
                    .find_connector(connector.search_space_id, &connector.user_id, connector.kind)
                    .map(|c| c.id);
                match existing.and_then(|id| self.connectors.get_mut(&id)) {
                    Some(existing) => {
                        existing.config = connector.config.clone();
                        existing.is_indexable = connector.is_indexable;
                    }
                    None => {
                        let mut connector = connector.clone();
                        // Another session took the id first
                        if self.connectors.contains_key(&connector.id) {
                            connector.id = self.next_connector_id();
                        }
                        self.connectors.insert(connector.id, connector);
                    }
                }
            }
            ConnectorChange::Delete(id) => {
                self.connectors.remove(id);
            }
            ConnectorChange::LastIndexed(id, at) => {
                if let Some(connector) = self.connectors.get_mut(id) {
                    connector.last_indexed_at = Some(*at);
                }
            }
        }
    }
}

/// Staged connector operation, replayed on commit
#[derive(Debug, Clone)]
enum ConnectorChange {
    Upsert(Connector),
    Delete(ConnectorId),
    LastIndexed(ConnectorId, DateTime<Utc>),
}

/// Writes staged by one session
#[derive(Debug, Default)]
struct Changes {
    documents: BTreeMap<DocumentKey, StoredDocument>,
    connectors: Vec<ConnectorChange>,
}

impl Changes {
    fn apply_to(&self, state: &mut State) {
        for (key, document) in &self.documents {
            state.documents.insert(key.clone(), document.clone());
        }
        for change in &self.connectors {
            state.apply_connector_change(change);
        }
    }

    /// Committed connectors as this session sees them
    fn connector_view(&self, committed: &State) -> State {
        let mut view = State {
            connectors: committed.connectors.clone(),
            documents: BTreeMap::new(),
        };
        for change in &self.connectors {
            view.apply_connector_change(change);
        }
        view
    }

    fn find_document<'a>(
        &'a self,
        committed: &'a State,
        key: &DocumentKey,
    ) -> Option<&'a StoredDocument> {
        self.documents.get(key).or_else(|| committed.documents.get(key))
    }
}

#[derive(Debug, Default)]
struct Shared {
    committed: Mutex<State>,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

/// A session over a shared in-memory store.
///
/// Lock order is always `changes` then `shared.committed`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
    changes: Mutex<Changes>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously persisted snapshot
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, StorageError> {
        let state = State::from_snapshot(snapshot)?;
        Ok(Self {
            shared: Arc::new(Shared {
                committed: Mutex::new(state),
                ..Default::default()
            }),
            changes: Mutex::default(),
        })
    }

    /// New session over the same committed state, with nothing staged
    pub fn session(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            changes: Mutex::default(),
        }
    }

    /// Committed state only
    pub async fn committed_snapshot(&self) -> StoreSnapshot {
        self.shared.committed.lock().await.to_snapshot()
    }

    /// Committed state plus this session's staged writes
    pub async fn working_snapshot(&self) -> StoreSnapshot {
        let changes = self.changes.lock().await;
        let mut state = self.shared.committed.lock().await.clone();
        changes.apply_to(&mut state);
        state.to_snapshot()
    }

    /// Committed documents
    pub async fn documents(&self) -> Vec<StoredDocument> {
        self.committed_snapshot().await.documents
    }

    /// Commits across all sessions of this store
    pub fn commit_count(&self) -> usize {
        self.shared.commits.load(Ordering::SeqCst)
    }

    /// Rollbacks across all sessions of this store
    pub fn rollback_count(&self) -> usize {
        self.shared.rollbacks.load(Ordering::SeqCst)
    }

    /// Merge staged writes into the committed state. `persist` receives the
    /// merged image first; if it fails nothing is published and the staged
    /// writes are kept.
    pub(super) async fn commit_with<F, Fut>(&self, persist: F) -> Result<StoreSnapshot, StorageError>
    where
        F: FnOnce(StoreSnapshot) -> Fut + Send,
        Fut: Future<Output = Result<StoreSnapshot, StorageError>> + Send,
    {
        let mut changes = self.changes.lock().await;
        let mut committed = self.shared.committed.lock().await;

        let mut merged = committed.clone();
        changes.apply_to(&mut merged);
        let snapshot = persist(merged.to_snapshot()).await?;

        *committed = merged;
        *changes = Changes::default();
        self.shared.commits.fetch_add(1, Ordering::SeqCst);
        Ok(snapshot)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn IndexStore>, StorageError> {
        Ok(Box::new(self.session()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_by_identifier(
        &self,
        search_space_id: i64,
        unique_identifier_hash: &str,
    ) -> Result<Option<StoredDocument>, StorageError> {
        let changes = self.changes.lock().await;
        let committed = self.shared.committed.lock().await;
        let key = (search_space_id, unique_identifier_hash.to_string());
        Ok(changes.find_document(&committed, &key).cloned())
    }

    async fn insert(&self, document: StoredDocument) -> Result<(), StorageError> {
        let mut changes = self.changes.lock().await;
        let committed = self.shared.committed.lock().await;
        let key = document_key(&document);
        if changes.find_document(&committed, &key).is_some() {
            return Err(StorageError::DuplicateDocument {
                search_space_id: key.0,
                unique_identifier_hash: key.1,
            });
        }
        changes.documents.insert(key, document);
        Ok(())
    }

    async fn update(&self, document: StoredDocument) -> Result<(), StorageError> {
        let mut changes = self.changes.lock().await;
        let committed = self.shared.committed.lock().await;
        let key = document_key(&document);
        if changes.find_document(&committed, &key).is_none() {
            return Err(StorageError::DocumentNotFound(key.1));
        }
        changes.documents.insert(key, document);
        Ok(())
    }

    async fn commit(&self) -> Result<(), StorageError> {
        self.commit_with(|snapshot| async move { Ok::<_, StorageError>(snapshot) })
            .await
            .map(|_| ())
    }

    async fn rollback(&self) -> Result<(), StorageError> {
        *self.changes.lock().await = Changes::default();
        self.shared.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ConnectorStore for MemoryStore {
    async fn get_connector(
        &self,
        id: ConnectorId,
        kind: ConnectorKind,
    ) -> Result<Option<Connector>, StorageError> {
        let changes = self.changes.lock().await;
        let committed = self.shared.committed.lock().await;
        Ok(changes
            .connector_view(&committed)
            .connectors
            .remove(&id)
            .filter(|c| c.kind == kind))
    }

    async fn set_last_indexed(
        &self,
        id: ConnectorId,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut changes = self.changes.lock().await;
        let committed = self.shared.committed.lock().await;
        if !changes.connector_view(&committed).connectors.contains_key(&id) {
            return Err(StorageError::ConnectorNotFound(id));
        }
        changes.connectors.push(ConnectorChange::LastIndexed(id, at));
        Ok(())
    }

    async fn upsert_connector(
        &self,
        search_space_id: i64,
        user_id: &str,
        kind: ConnectorKind,
        config: ConnectorConfig,
    ) -> Result<Connector, StorageError> {
        let mut changes = self.changes.lock().await;
        let committed = self.shared.committed.lock().await;
        let view = changes.connector_view(&committed);

        let connector = match view.find_connector(search_space_id, user_id, kind) {
            Some(existing) => {
                let mut connector = existing.clone();
                connector.config = config;
                connector.is_indexable = true;
                connector
            }
            None => {
                let mut connector = Connector::new_dexscreener(
                    view.next_connector_id(),
                    search_space_id,
                    user_id,
                    config,
                );
                connector.kind = kind;
                connector
            }
        };

        changes.connectors.push(ConnectorChange::Upsert(connector.clone()));
        Ok(connector)
    }

    async fn delete_connector(
        &self,
        search_space_id: i64,
        user_id: &str,
        kind: ConnectorKind,
    ) -> Result<bool, StorageError> {
        let mut changes = self.changes.lock().await;
        let committed = self.shared.committed.lock().await;
        let id = changes
            .connector_view(&committed)
            .find_connector(search_space_id, user_id, kind)
            .map(|c| c.id);

        Ok(match id {
            Some(id) => {
                changes.connectors.push(ConnectorChange::Delete(id));
                true
            }
            None => false,
        })
    }

    async fn list_connectors(&self) -> Result<Vec<Connector>, StorageError> {
        let changes = self.changes.lock().await;
        let committed = self.shared.committed.lock().await;
        Ok(changes
            .connector_view(&committed)
            .connectors
            .into_values()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::{DocumentKind, DocumentPatch};
    use crate::domain::token::TokenConfig;
    use serde_json::Map;

    fn document(space: i64, uid: &str, content_hash: &str) -> StoredDocument {
        StoredDocument::create(
            space,
            DocumentKind::DexscreenerConnector,
            uid.to_string(),
            DocumentPatch {
                title: "t".into(),
                content: "c".into(),
                content_hash: content_hash.into(),
                embedding: vec![],
                metadata: Map::new(),
                chunks: vec![],
            },
            Utc::now(),
        )
    }

    fn tokens() -> ConnectorConfig {
        ConnectorConfig::new(vec![TokenConfig::new(
            "solana",
            "So11111111111111111111111111111111111111112",
        )])
    }

    #[tokio::test]
    async fn test_staged_insert_visible_before_commit() {
        let store = MemoryStore::new();
        store.insert(document(1, "a", "h")).await.unwrap();

        assert!(store.find_by_identifier(1, "a").await.unwrap().is_some());
        assert!(store.find_by_identifier(2, "a").await.unwrap().is_none());
        assert!(store.documents().await.is_empty());

        store.commit().await.unwrap();
        assert_eq!(store.documents().await.len(), 1);
        assert_eq!(store.commit_count(), 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_staged_only() {
        let store = MemoryStore::new();
        store.insert(document(1, "a", "h")).await.unwrap();
        store.commit().await.unwrap();

        store.insert(document(1, "b", "h")).await.unwrap();
        store.rollback().await.unwrap();

        assert!(store.find_by_identifier(1, "a").await.unwrap().is_some());
        assert!(store.find_by_identifier(1, "b").await.unwrap().is_none());
        assert_eq!(store.rollback_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_identity_rejected() {
        let store = MemoryStore::new();
        store.insert(document(1, "a", "h")).await.unwrap();

        let err = store.insert(document(1, "a", "other")).await.unwrap_err();
        assert!(matches!(err, StorageError::DuplicateDocument { .. }));

        // Same hash in another search space is a different document
        assert!(store.insert(document(2, "a", "h")).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_requires_existing() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.update(document(1, "a", "h")).await,
            Err(StorageError::DocumentNotFound(_))
        ));

        store.insert(document(1, "a", "h1")).await.unwrap();
        store.update(document(1, "a", "h2")).await.unwrap();
        let found = store.find_by_identifier(1, "a").await.unwrap().unwrap();
        assert_eq!(found.content_hash, "h2");
    }

    #[tokio::test]
    async fn test_connector_upsert_and_kind_filter() {
        let store = MemoryStore::new();
        let created = store
            .upsert_connector(1, "user", ConnectorKind::DexscreenerConnector, tokens())
            .await
            .unwrap();
        assert_eq!(created.id, 1);

        let updated = store
            .upsert_connector(1, "user", ConnectorKind::DexscreenerConnector, ConnectorConfig::default())
            .await
            .unwrap();
        assert_eq!(updated.id, 1);
        assert!(updated.config.tokens.is_empty());

        let other = store
            .upsert_connector(2, "user", ConnectorKind::DexscreenerConnector, tokens())
            .await
            .unwrap();
        assert_eq!(other.id, 2);

        assert!(store
            .get_connector(1, ConnectorKind::DexscreenerConnector)
            .await
            .unwrap()
            .is_some());
        assert!(store
            .get_connector(99, ConnectorKind::DexscreenerConnector)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_last_indexed_and_delete() {
        let store = MemoryStore::new();
        store
            .upsert_connector(1, "user", ConnectorKind::DexscreenerConnector, tokens())
            .await
            .unwrap();

        let now = Utc::now();
        store.set_last_indexed(1, now).await.unwrap();
        let connector = store
            .get_connector(1, ConnectorKind::DexscreenerConnector)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(connector.last_indexed_at, Some(now));

        assert!(matches!(
            store.set_last_indexed(5, now).await,
            Err(StorageError::ConnectorNotFound(5))
        ));

        assert!(store
            .delete_connector(1, "user", ConnectorKind::DexscreenerConnector)
            .await
            .unwrap());
        assert!(!store
            .delete_connector(1, "user", ConnectorKind::DexscreenerConnector)
            .await
            .unwrap());
        assert!(store.list_connectors().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = MemoryStore::new();
        let a = store.begin().await.unwrap();
        let b = store.begin().await.unwrap();

        a.insert(document(1, "a", "h")).await.unwrap();
        assert!(b.find_by_identifier(1, "a").await.unwrap().is_none());

        // Rolling back one session leaves the other's staged writes alone
        b.insert(document(2, "b", "h")).await.unwrap();
        b.rollback().await.unwrap();
        assert!(a.find_by_identifier(1, "a").await.unwrap().is_some());

        a.commit().await.unwrap();
        assert_eq!(store.documents().await.len(), 1);
        assert!(b.find_by_identifier(1, "a").await.unwrap().is_some());
        assert_eq!(store.commit_count(), 1);
        assert_eq!(store.rollback_count(), 1);
    }

    #[tokio::test]
    async fn test_dropped_session_discards_staged_writes() {
        let store = MemoryStore::new();
        {
            let session = store.begin().await.unwrap();
            session.insert(document(1, "a", "h")).await.unwrap();
        }
        assert!(store.find_by_identifier(1, "a").await.unwrap().is_none());
        assert!(store.committed_snapshot().await.documents.is_empty());
    }

    #[tokio::test]
    async fn test_commit_replays_connector_changes_onto_latest_state() {
        let store = MemoryStore::new();
        store
            .upsert_connector(1, "user", ConnectorKind::DexscreenerConnector, tokens())
            .await
            .unwrap();
        store.commit().await.unwrap();

        let run = store.begin().await.unwrap();
        let now = Utc::now();
        run.set_last_indexed(1, now).await.unwrap();

        // Config replaced by another session while the run is open
        let admin = store.session();
        admin
            .upsert_connector(1, "user", ConnectorKind::DexscreenerConnector, ConnectorConfig::default())
            .await
            .unwrap();
        admin.commit().await.unwrap();

        run.commit().await.unwrap();
        let connector = store
            .get_connector(1, ConnectorKind::DexscreenerConnector)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(connector.last_indexed_at, Some(now));
        assert!(connector.config.tokens.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_distinct_ids() {
        let store = MemoryStore::new();
        let a = store.session();
        let b = store.session();

        let first = a
            .upsert_connector(1, "alice", ConnectorKind::DexscreenerConnector, tokens())
            .await
            .unwrap();
        let second = b
            .upsert_connector(2, "bob", ConnectorKind::DexscreenerConnector, tokens())
            .await
            .unwrap();
        assert_eq!((first.id, second.id), (1, 1));

        a.commit().await.unwrap();
        b.commit().await.unwrap();

        let mut ids: Vec<_> = store
            .list_connectors()
            .await
            .unwrap()
            .into_iter()
            .map(|c| (c.id, c.user_id))
            .collect();
        ids.sort();
        assert_eq!(ids, vec![(1, "alice".to_string()), (2, "bob".to_string())]);
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip_rejects_duplicates() {
        let doc = document(1, "a", "h");
        let snapshot = StoreSnapshot {
            connectors: vec![],
            documents: vec![doc.clone(), doc],
        };
        assert!(matches!(
            MemoryStore::from_snapshot(snapshot),
            Err(StorageError::Corrupted(_))
        ));
    }
}
