//! Per-connector single-flight guard
//!
//! At most one indexing run per connector at a time. Runs for different
//! connectors do not contend.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::connector::ConnectorId;

#[derive(Debug, Clone, Default)]
pub struct RunGuard {
    active: Arc<Mutex<HashSet<ConnectorId>>>,
}

/// Held for the duration of a run; releases the connector on drop
#[derive(Debug)]
pub struct RunPermit {
    connector_id: ConnectorId,
    active: Arc<Mutex<HashSet<ConnectorId>>>,
}

fn lock(active: &Mutex<HashSet<ConnectorId>>) -> MutexGuard<'_, HashSet<ConnectorId>> {
    // The set stays consistent even if a holder panicked
    active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` if a run for this connector is already in progress
    pub fn try_acquire(&self, connector_id: ConnectorId) -> Option<RunPermit> {
        if !lock(&self.active).insert(connector_id) {
            return None;
        }
        Some(RunPermit {
            connector_id,
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_running(&self, connector_id: ConnectorId) -> bool {
        lock(&self.active).contains(&connector_id)
    }
}

impl RunPermit {
    pub fn connector_id(&self) -> ConnectorId {
        self.connector_id
    }
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.connector_id);
    }
}
