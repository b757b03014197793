// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the specs.

pub use rdev_core::{
    AgentId, AgentInfo, Clock, FakeClock, ProjectSource, TerminationProgress, UpdateType, UserIdentity,
    Workspace, WorkspaceId, WorkspaceState, WorkspaceVariable,
};
pub use rdev_daemon::{FakeAgentTransport, MemoryStore, ReconcilerConfig, WorkspaceStore};
pub use rdev_manifest::{build, parse_yaml_stream, ManifestParams, ResourceGroups};
pub use serde_json::{json, Value};
pub use similar_asserts::assert_eq;
pub use WorkspaceState::*;

/// `ws1` in `ns1` for agent 42, no variables, zone `workspaces.localdev.me`.
pub fn scenario_workspace() -> Workspace {
    Workspace::builder().build()
}

pub fn scenario_params() -> ManifestParams {
    ManifestParams::new(
        WorkspaceId(1),
        "ws1",
        "ns1",
        AgentId(42),
        "workspaces.localdev.me",
        ProjectSource {
            clone_url: "http://localhost/test-group/test-project.git".to_string(),
            directory: "test-project".to_string(),
            git_ref: "master".to_string(),
        },
    )
}

/// The document of the given kind in a rendered stream.
pub fn doc_of<'a>(docs: &'a [Value], kind: &str) -> &'a Value {
    docs.iter().find(|d| d["kind"] == kind).unwrap_or_else(|| panic!("no {kind} in stream"))
}

pub fn condition<'a>(status: &'a Value, kind: &str) -> &'a Value {
    status["conditions"]
        .as_array()
        .and_then(|conditions| conditions.iter().find(|c| c["type"] == kind))
        .unwrap_or_else(|| panic!("no {kind} condition"))
}
