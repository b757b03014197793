// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inputs to manifest generation.

use crate::error::ManifestError;
use rdev_core::variable::{env_vars, file_vars, VARIABLES_FILE_DIR};
use rdev_core::{AgentId, ProjectSource, Workspace, WorkspaceId};
use std::collections::BTreeMap;

pub const PROJECTS_ROOT: &str = "/projects";
pub const EDITOR_VOLUME_DIR: &str = "/projects/.gl-editor";
pub const EDITOR_PORT: i32 = 60001;
pub const SSH_PORT: i32 = 60022;

/// Volume backed by the workspace PVC, mounted at [`PROJECTS_ROOT`].
pub const DATA_VOLUME: &str = "gl-workspace-data";
/// Projected volume of the file Secret, mounted at `VARIABLES_FILE_DIR`.
pub const VARIABLES_VOLUME: &str = "gl-workspace-variables";

/// Which optional resource groups a generation includes.
///
/// Different reconciliation phases apply different subsets; see the engine's
/// desired-config selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceGroups {
    /// Workspace inventory ConfigMap (and the secrets inventory with `secrets`).
    pub inventory: bool,
    /// Deployment, Service and PVC.
    pub workload: bool,
    pub network_policy: bool,
    /// Secrets inventory, env-var Secret and file Secret.
    pub secrets: bool,
}

impl ResourceGroups {
    pub const ALL: ResourceGroups =
        ResourceGroups { inventory: true, workload: true, network_policy: true, secrets: true };

    /// Empty inventories only: the agent prunes everything they owned.
    ///
    /// Without `workload`, `secrets` selects the secrets inventory alone.
    pub const TERMINATION: ResourceGroups =
        ResourceGroups { inventory: true, workload: false, network_policy: false, secrets: true };

    /// Workload plus network policy, without inventories or Secrets.
    pub const UPDATE: ResourceGroups =
        ResourceGroups { inventory: false, workload: true, network_policy: true, secrets: false };

    /// Update that also regenerates the Secrets.
    pub const ROTATION: ResourceGroups =
        ResourceGroups { inventory: false, workload: true, network_policy: true, secrets: true };
}

impl Default for ResourceGroups {
    fn default() -> Self {
        ResourceGroups { inventory: true, workload: true, network_policy: true, secrets: false }
    }
}

/// A file variable resolved to its absolute target path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileVariable {
    pub key: String,
    pub value: String,
    pub path: String,
}

impl FileVariable {
    /// Path relative to the projected volume root.
    pub(crate) fn relative_path(&self) -> &str {
        self.path
            .strip_prefix(VARIABLES_FILE_DIR)
            .map(|p| p.trim_start_matches('/'))
            .unwrap_or(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestParams {
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub namespace: String,
    pub agent_id: AgentId,
    pub replicas: i32,
    pub dns_zone: String,
    pub project: ProjectSource,
    pub env_vars: BTreeMap<String, String>,
    pub file_vars: Vec<FileVariable>,
    pub groups: ResourceGroups,
}

impl ManifestParams {
    pub fn new(
        workspace_id: WorkspaceId,
        name: impl Into<String>,
        namespace: impl Into<String>,
        agent_id: AgentId,
        dns_zone: impl Into<String>,
        project: ProjectSource,
    ) -> Self {
        Self {
            workspace_id,
            name: name.into(),
            namespace: namespace.into(),
            agent_id,
            replicas: 1,
            dns_zone: dns_zone.into(),
            project,
            env_vars: BTreeMap::new(),
            file_vars: Vec::new(),
            groups: ResourceGroups::default(),
        }
    }

    /// Params for a workspace at its desired state.
    pub fn for_workspace(workspace: &Workspace, groups: ResourceGroups) -> Self {
        let mut params = Self::new(
            workspace.id,
            workspace.name.clone(),
            workspace.namespace.clone(),
            workspace.agent_id,
            workspace.dns_zone.clone(),
            workspace.project.clone(),
        );
        params.replicas = workspace.desired_state().replicas();
        params.env_vars = env_vars(workspace.variables());
        params.file_vars = file_vars(workspace.variables())
            .into_iter()
            .map(|v| FileVariable { key: v.key.clone(), value: v.value.clone(), path: v.target_path() })
            .collect();
        params.groups = groups;
        params
    }

    rdev_core::setters! {
        set {
            replicas: i32,
            groups: ResourceGroups,
            env_vars: BTreeMap<String, String>,
            file_vars: Vec<FileVariable>,
        }
    }

    pub fn inventory_name(&self) -> String {
        format!("{}-workspace-inventory", self.name)
    }

    pub fn secrets_inventory_name(&self) -> String {
        format!("{}-secret-inventory", self.name)
    }

    pub fn env_secret_name(&self) -> String {
        format!("{}-env-var", self.name)
    }

    pub fn file_secret_name(&self) -> String {
        format!("{}-file", self.name)
    }

    pub fn claim_name(&self) -> String {
        format!("{}-{}", self.name, DATA_VOLUME)
    }

    /// Reject inputs the builder must not silently fix up.
    pub(crate) fn validate(&self) -> Result<(), ManifestError> {
        if !(0..=1).contains(&self.replicas) {
            return Err(ManifestError::InvalidReplicas(self.replicas));
        }

        let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
        for var in &self.file_vars {
            let path = var.path.as_str();
            if is_reserved(path) {
                return Err(ManifestError::ReservedMountPath {
                    key: var.key.clone(),
                    path: var.path.clone(),
                });
            }
            if !is_under_variables_dir(path) {
                return Err(ManifestError::MountPathOutsideVariablesDir {
                    key: var.key.clone(),
                    path: var.path.clone(),
                    dir: VARIABLES_FILE_DIR,
                });
            }
            if let Some(first) = seen.insert(path, var.key.as_str()) {
                return Err(ManifestError::DuplicateMountPath {
                    first: first.to_string(),
                    second: var.key.clone(),
                    path: var.path.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Mount points owned by the pod itself.
fn is_reserved(path: &str) -> bool {
    let path = path.trim_end_matches('/');
    path == VARIABLES_FILE_DIR
        || path == PROJECTS_ROOT
        || path.starts_with(&format!("{}/", PROJECTS_ROOT))
}

fn is_under_variables_dir(path: &str) -> bool {
    match path.strip_prefix(VARIABLES_FILE_DIR).and_then(|rest| rest.strip_prefix('/')) {
        Some(rest) => !rest.split('/').any(|c| c.is_empty() || c == "." || c == ".."),
        None => false,
    }
}

#[cfg(test)]
#[path = "params_tests.rs"]
mod tests;
