// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace lifecycle states.
//!
//! A single enum covers both sides of the reconciliation: the desired state
//! written by the controlling client and the actual state derived from agent
//! reports. The two domains overlap but are not symmetric; see
//! [`WorkspaceState::is_client_settable`] and [`WorkspaceState::is_desired_only`].

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle state of a remote development workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WorkspaceState {
    CreationRequested,
    Starting,
    Running,
    Stopping,
    Stopped,
    Terminating,
    Terminated,
    Failed,
    Unknown,
    /// Desired-only: stop, then start again once the workspace reports Stopped.
    RestartRequested,
}

/// Errors for state parsing and client writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("unknown workspace state: {0}")]
    UnknownState(String),
    #[error("desired state cannot be set to {0}")]
    NotClientSettable(WorkspaceState),
    #[error("workspace {0} is terminated")]
    Terminated(String),
}

impl WorkspaceState {
    /// Every state, in declaration order.
    pub const ALL: [WorkspaceState; 10] = [
        WorkspaceState::CreationRequested,
        WorkspaceState::Starting,
        WorkspaceState::Running,
        WorkspaceState::Stopping,
        WorkspaceState::Stopped,
        WorkspaceState::Terminating,
        WorkspaceState::Terminated,
        WorkspaceState::Failed,
        WorkspaceState::Unknown,
        WorkspaceState::RestartRequested,
    ];

    /// States an agent report can resolve to.
    pub const ACTUAL: [WorkspaceState; 9] = [
        WorkspaceState::CreationRequested,
        WorkspaceState::Starting,
        WorkspaceState::Running,
        WorkspaceState::Stopping,
        WorkspaceState::Stopped,
        WorkspaceState::Terminating,
        WorkspaceState::Terminated,
        WorkspaceState::Failed,
        WorkspaceState::Unknown,
    ];

    /// Whether the controlling client may write this as a desired state.
    pub fn is_client_settable(self) -> bool {
        matches!(
            self,
            WorkspaceState::Running
                | WorkspaceState::Stopped
                | WorkspaceState::Terminated
                | WorkspaceState::RestartRequested
        )
    }

    /// States that never describe the cluster.
    pub fn is_desired_only(self) -> bool {
        matches!(self, WorkspaceState::RestartRequested)
    }

    /// Whether the workspace is expected to have a running pod in this state.
    ///
    /// This is the only place the state-to-replica coupling lives: manifest
    /// generation consults it with the desired state, agent-info
    /// interpretation with the target actual state.
    pub fn is_started(self) -> bool {
        matches!(
            self,
            WorkspaceState::CreationRequested | WorkspaceState::Starting | WorkspaceState::Running
        )
    }

    /// Deployment replica count implied by this state.
    pub fn replicas(self) -> i32 {
        if self.is_started() {
            1
        } else {
            0
        }
    }

    /// States that carry no Deployment status payload in an agent report.
    pub fn carries_deployment_status(self) -> bool {
        !matches!(
            self,
            WorkspaceState::Terminating | WorkspaceState::Terminated | WorkspaceState::Unknown
        )
    }

    /// Whether `actual` satisfies this desired state.
    pub fn is_satisfied_by(self, actual: WorkspaceState) -> bool {
        match self {
            WorkspaceState::RestartRequested => false,
            desired => desired == actual,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkspaceState::CreationRequested => "CreationRequested",
            WorkspaceState::Starting => "Starting",
            WorkspaceState::Running => "Running",
            WorkspaceState::Stopping => "Stopping",
            WorkspaceState::Stopped => "Stopped",
            WorkspaceState::Terminating => "Terminating",
            WorkspaceState::Terminated => "Terminated",
            WorkspaceState::Failed => "Failed",
            WorkspaceState::Unknown => "Unknown",
            WorkspaceState::RestartRequested => "RestartRequested",
        }
    }
}

impl std::fmt::Display for WorkspaceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkspaceState {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkspaceState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| StateError::UnknownState(s.to_string()))
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
