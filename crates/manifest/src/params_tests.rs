// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rdev_core::variable::WorkspaceVariable;
use rdev_core::WorkspaceState;

fn params() -> ManifestParams {
    ManifestParams::new(
        WorkspaceId(1),
        "ws1",
        "ns1",
        AgentId(42),
        "workspaces.localdev.me",
        ProjectSource {
            clone_url: "http://localhost/g/p.git".to_string(),
            directory: "p".to_string(),
            git_ref: "main".to_string(),
        },
    )
}

fn file(key: &str, path: &str) -> FileVariable {
    FileVariable { key: key.to_string(), value: "v".to_string(), path: path.to_string() }
}

#[yare::parameterized(
    zero = { 0 },
    one  = { 1 },
)]
fn valid_replicas(replicas: i32) {
    assert!(params().replicas(replicas).validate().is_ok());
}

#[yare::parameterized(
    negative = { -1 },
    two      = { 2 },
)]
fn invalid_replicas(replicas: i32) {
    assert!(matches!(
        params().replicas(replicas).validate(),
        Err(ManifestError::InvalidReplicas(r)) if r == replicas
    ));
}

#[yare::parameterized(
    variables_dir      = { "/.workspace-data/variables/file" },
    variables_dir_trailing = { "/.workspace-data/variables/file/" },
    projects_root      = { "/projects" },
    editor_dir         = { "/projects/.gl-editor" },
    inside_projects    = { "/projects/test-project/.env" },
)]
fn reserved_mount_paths_fail(path: &str) {
    let result = params().file_vars(vec![file("k", path)]).validate();
    assert!(matches!(result, Err(ManifestError::ReservedMountPath { .. })), "{result:?}");
}

#[yare::parameterized(
    etc         = { "/etc/passwd" },
    relative    = { "netrc" },
    traversal   = { "/.workspace-data/variables/file/../escape" },
    sibling_dir = { "/.workspace-data/variables/filex" },
)]
fn paths_outside_variables_dir_fail(path: &str) {
    let result = params().file_vars(vec![file("k", path)]).validate();
    assert!(matches!(result, Err(ManifestError::MountPathOutsideVariablesDir { .. })), "{result:?}");
}

#[test]
fn duplicate_mount_paths_fail() {
    let path = "/.workspace-data/variables/file/netrc";
    let result = params().file_vars(vec![file("a", path), file("b", path)]).validate();
    match result {
        Err(ManifestError::DuplicateMountPath { first, second, .. }) => {
            assert_eq!((first.as_str(), second.as_str()), ("a", "b"));
        }
        other => panic!("expected duplicate mount path, got {other:?}"),
    }
}

#[test]
fn nested_paths_are_relative_to_volume() {
    let var = file("kubeconfig", "/.workspace-data/variables/file/kube/config");
    assert_eq!(var.relative_path(), "kube/config");
}

#[test]
fn for_workspace_uses_desired_replicas_and_splits_variables() {
    let ws = Workspace::builder()
        .desired_state(WorkspaceState::Stopped)
        .variables(vec![WorkspaceVariable::env("A", "1"), WorkspaceVariable::file("netrc", "x")])
        .build();
    let params = ManifestParams::for_workspace(&ws, ResourceGroups::ALL);
    assert_eq!(params.replicas, 0);
    assert_eq!(params.env_vars.len(), 1);
    assert_eq!(params.file_vars, vec![FileVariable {
        key: "netrc".to_string(),
        value: "x".to_string(),
        path: "/.workspace-data/variables/file/netrc".to_string(),
    }]);
    assert_eq!(params.groups, ResourceGroups::ALL);
}

#[test]
fn resource_names() {
    let p = params();
    assert_eq!(p.inventory_name(), "ws1-workspace-inventory");
    assert_eq!(p.secrets_inventory_name(), "ws1-secret-inventory");
    assert_eq!(p.env_secret_name(), "ws1-env-var");
    assert_eq!(p.file_secret_name(), "ws1-file");
    assert_eq!(p.claim_name(), "ws1-gl-workspace-data");
}

#[test]
fn default_groups_leave_out_secrets() {
    let groups = ResourceGroups::default();
    assert!(groups.inventory && groups.workload && groups.network_policy);
    assert!(!groups.secrets);
}
