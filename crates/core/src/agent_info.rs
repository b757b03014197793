// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire types exchanged with the cluster agent and the backend.
//!
//! [`AgentInfo`] is what the agent reports per workspace; [`RailsInfo`] is what
//! the backend answers with. Both are plain serde structs whose JSON shape is
//! the contract; optional members are omitted rather than sent as `null`.

use crate::state::WorkspaceState;
use serde::{Deserialize, Serialize};

/// Reported progress of a workspace teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminationProgress {
    Terminating,
    Terminated,
}

crate::simple_display! {
    TerminationProgress {
        Terminating => "Terminating",
        Terminated => "Terminated",
    }
}

impl TerminationProgress {
    pub fn state(self) -> WorkspaceState {
        match self {
            TerminationProgress::Terminating => WorkspaceState::Terminating,
            TerminationProgress::Terminated => WorkspaceState::Terminated,
        }
    }
}

/// Error the agent hit while applying or observing a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub error_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// One workspace as observed by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub name: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_progress: Option<TerminationProgress>,
    /// The Deployment document as the cluster returned it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_k8s_deployment_info: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<ErrorDetails>,
}

impl AgentInfo {
    /// Report for a workspace that is being torn down or is gone.
    pub fn terminating(
        name: impl Into<String>,
        namespace: impl Into<String>,
        progress: TerminationProgress,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            termination_progress: Some(progress),
            latest_k8s_deployment_info: None,
            error_details: None,
        }
    }

    /// `metadata.resourceVersion` of the reported Deployment.
    pub fn deployment_resource_version(&self) -> Option<String> {
        self.latest_k8s_deployment_info
            .as_ref()?
            .pointer("/metadata/resourceVersion")?
            .as_str()
            .map(str::to_string)
    }
}

/// How much the backend sends back in one reconcile response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateType {
    /// Every workspace of the agent, with its complete config.
    Full,
    /// Only workspaces with something new to say.
    Partial,
}

crate::simple_display! {
    UpdateType {
        Full => "full",
        Partial => "partial",
    }
}

/// Backend answer for one workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RailsInfo {
    pub name: String,
    pub namespace: String,
    pub desired_state: WorkspaceState,
    pub actual_state: WorkspaceState,
    pub deployment_resource_version: Option<String>,
    /// `---`-separated YAML stream for the agent to apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_to_apply: Option<String>,
}

#[cfg(test)]
#[path = "agent_info_tests.rs"]
mod tests;
