// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rdev_core::WorkspaceState;

fn settled(id: u64) -> Workspace {
    Workspace::builder()
        .id(WorkspaceId(id))
        .name(format!("ws{id}"))
        .actual_state(WorkspaceState::Running)
        .responded_to_agent_at_ms(Some(10))
        .build()
}

#[test]
fn pending_lists_only_workspaces_with_work() {
    let store = MemoryStore::new();
    store.insert(settled(1));
    store.insert(Workspace::builder().id(WorkspaceId(2)).name("ws2").build());
    store.insert(
        Workspace::builder()
            .id(WorkspaceId(3))
            .name("ws3")
            .desired_state(WorkspaceState::Terminated)
            .actual_state(WorkspaceState::Terminated)
            .build(),
    );
    assert_eq!(store.pending(), vec![WorkspaceId(2)]);
}

#[test]
fn update_mutates_in_place() {
    let store = MemoryStore::new();
    store.insert(settled(1));
    let changed = store.update(WorkspaceId(1), |ws| {
        ws.set_desired_state(WorkspaceState::Stopped, 20).is_ok()
    });
    assert_eq!(changed, Some(true));
    assert_eq!(store.get(WorkspaceId(1)).unwrap().desired_state(), WorkspaceState::Stopped);
    assert_eq!(store.pending(), vec![WorkspaceId(1)]);
}

#[test]
fn missing_records() {
    let store = MemoryStore::new();
    assert!(store.get(WorkspaceId(9)).is_none());
    assert!(store.update(WorkspaceId(9), |_| ()).is_none());
    store.insert(settled(9));
    assert!(store.remove(WorkspaceId(9)).is_some());
    assert!(store.list().is_empty());
}
