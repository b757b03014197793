// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace record storage.
//!
//! The records are owned by the backend; the reconciler only reads them and
//! writes back what it learned.

mod memory;

pub use memory::MemoryStore;

use rdev_core::{Workspace, WorkspaceId};

pub trait WorkspaceStore: Clone + Send + Sync + 'static {
    /// Ids of workspaces with reconciliation work outstanding.
    fn pending(&self) -> Vec<WorkspaceId>;

    fn get(&self, id: WorkspaceId) -> Option<Workspace>;

    /// Mutate the current record in place. `None` if it no longer exists.
    fn update<R>(&self, id: WorkspaceId, f: impl FnOnce(&mut Workspace) -> R) -> Option<R>;
}
