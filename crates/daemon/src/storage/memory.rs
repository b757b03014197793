// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::WorkspaceStore;
use parking_lot::Mutex;
use rdev_core::{Workspace, WorkspaceId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Process-local store, ordered by workspace id.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<BTreeMap<WorkspaceId, Workspace>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, workspace: Workspace) {
        self.inner.lock().insert(workspace.id, workspace);
    }

    pub fn remove(&self, id: WorkspaceId) -> Option<Workspace> {
        self.inner.lock().remove(&id)
    }

    pub fn list(&self) -> Vec<Workspace> {
        self.inner.lock().values().cloned().collect()
    }
}

impl WorkspaceStore for MemoryStore {
    fn pending(&self) -> Vec<WorkspaceId> {
        self.inner.lock().values().filter(|ws| ws.needs_reconcile()).map(|ws| ws.id).collect()
    }

    fn get(&self, id: WorkspaceId) -> Option<Workspace> {
        self.inner.lock().get(&id).cloned()
    }

    fn update<R>(&self, id: WorkspaceId, f: impl FnOnce(&mut Workspace) -> R) -> Option<R> {
        self.inner.lock().get_mut(&id).map(f)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
