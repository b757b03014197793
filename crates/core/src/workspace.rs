// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace record.
//!
//! The record is owned by the backend; this crate only enforces who may write
//! which field. Desired state changes come from the controlling client through
//! [`Workspace::set_desired_state`]. Actual state changes only through
//! [`Workspace::apply_observation`], and an [`Observation`] can only be
//! produced by interpreting an agent report or by the agent timeout path.

use crate::actual_state::Observation;
use crate::state::{StateError, WorkspaceState};
use crate::variable::{default_variables, merge_variables, UserIdentity, WorkspaceVariable};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_MAX_HOURS_BEFORE_TERMINATION: u32 = 120;

const MS_PER_HOUR: u64 = 60 * 60 * 1000;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

numeric_id! {
    /// Backend identifier of a workspace record.
    WorkspaceId
}

numeric_id! {
    /// Identifier of the cluster agent that owns a workspace.
    AgentId
}

/// Repository cloned into the workspace on first start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSource {
    pub clone_url: String,
    /// Directory name under the projects root.
    pub directory: String,
    pub git_ref: String,
}

/// Default namespace for a workspace: one namespace per workspace per agent.
pub fn default_namespace(agent_id: AgentId, workspace_id: WorkspaceId) -> String {
    format!("gl-rd-ns-{}-{}", agent_id, workspace_id)
}

/// Inputs for a new workspace record.
#[derive(Debug, Clone)]
pub struct NewWorkspace {
    pub id: WorkspaceId,
    pub name: String,
    pub namespace: Option<String>,
    pub agent_id: AgentId,
    pub dns_zone: String,
    pub project: ProjectSource,
    pub desired_state: WorkspaceState,
    /// User variables, layered over the system variables.
    pub variables: Vec<WorkspaceVariable>,
    pub max_hours_before_termination: Option<u32>,
    pub user: UserIdentity,
    pub personal_access_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    pub namespace: String,
    pub agent_id: AgentId,
    pub dns_zone: String,
    pub project: ProjectSource,
    variables: Vec<WorkspaceVariable>,
    desired_state: WorkspaceState,
    actual_state: WorkspaceState,
    /// Optimistic-concurrency watermark for the Deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deployment_resource_version: Option<String>,
    pub max_hours_before_termination: u32,
    pub created_at_ms: u64,
    desired_state_updated_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    responded_to_agent_at_ms: Option<u64>,
    /// Variables changed since the Secrets were last sent to the agent.
    #[serde(default)]
    variables_rotated: bool,
    /// Last operator-visible error for this workspace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
    /// Consecutive agent reports rejected as unmodeled transitions.
    #[serde(default)]
    rejected_reports: u32,
}

impl Workspace {
    /// Create a record in `CreationRequested` carrying the system variables.
    pub fn create(new: NewWorkspace, now_ms: u64) -> Result<Self, StateError> {
        // Nothing to restart before the first start.
        if !new.desired_state.is_client_settable()
            || new.desired_state == WorkspaceState::RestartRequested
        {
            return Err(StateError::NotClientSettable(new.desired_state));
        }
        let system =
            default_variables(&new.name, &new.dns_zone, &new.user, &new.personal_access_token);
        Ok(Self {
            namespace: new.namespace.unwrap_or_else(|| default_namespace(new.agent_id, new.id)),
            id: new.id,
            name: new.name,
            agent_id: new.agent_id,
            dns_zone: new.dns_zone,
            project: new.project,
            variables: merge_variables(system, new.variables),
            desired_state: new.desired_state,
            actual_state: WorkspaceState::CreationRequested,
            deployment_resource_version: None,
            max_hours_before_termination: new
                .max_hours_before_termination
                .unwrap_or(DEFAULT_MAX_HOURS_BEFORE_TERMINATION),
            created_at_ms: now_ms,
            desired_state_updated_at_ms: now_ms,
            responded_to_agent_at_ms: None,
            variables_rotated: false,
            last_error: None,
            rejected_reports: 0,
        })
    }

    pub fn desired_state(&self) -> WorkspaceState {
        self.desired_state
    }

    pub fn actual_state(&self) -> WorkspaceState {
        self.actual_state
    }

    pub fn deployment_resource_version(&self) -> Option<&str> {
        self.deployment_resource_version.as_deref()
    }

    pub fn variables(&self) -> &[WorkspaceVariable] {
        &self.variables
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn rejected_reports(&self) -> u32 {
        self.rejected_reports
    }

    pub fn desired_state_updated_at_ms(&self) -> u64 {
        self.desired_state_updated_at_ms
    }

    pub fn responded_to_agent_at_ms(&self) -> Option<u64> {
        self.responded_to_agent_at_ms
    }

    pub fn variables_rotated(&self) -> bool {
        self.variables_rotated
    }

    /// Whether the Deployment has been observed in the cluster.
    pub fn exists_in_cluster(&self) -> bool {
        self.deployment_resource_version.is_some()
    }

    pub fn is_terminated(&self) -> bool {
        self.actual_state == WorkspaceState::Terminated
    }

    /// Client write of the desired state.
    pub fn set_desired_state(&mut self, state: WorkspaceState, now_ms: u64) -> Result<(), StateError> {
        if !state.is_client_settable() {
            return Err(StateError::NotClientSettable(state));
        }
        if self.is_terminated() {
            return Err(StateError::Terminated(self.name.clone()));
        }
        self.desired_state = state;
        self.desired_state_updated_at_ms = now_ms;
        Ok(())
    }

    /// Replace the user variables; the next apply regenerates the Secrets.
    ///
    /// System variables are kept unless `variables` overrides them.
    pub fn rotate_variables(
        &mut self,
        variables: Vec<WorkspaceVariable>,
        now_ms: u64,
    ) -> Result<(), StateError> {
        if self.is_terminated() {
            return Err(StateError::Terminated(self.name.clone()));
        }
        let system = self.variables.iter().filter(|v| v.is_system()).cloned().collect();
        self.variables = merge_variables(system, variables);
        self.variables_rotated = true;
        self.desired_state_updated_at_ms = now_ms;
        Ok(())
    }

    /// Whether the desired state changed after the last response to the agent.
    pub fn desired_state_updated_since_response(&self) -> bool {
        self.responded_to_agent_at_ms.map_or(true, |at| self.desired_state_updated_at_ms > at)
    }

    /// Whether a reconciliation cycle has anything to do for this workspace.
    pub fn needs_reconcile(&self) -> bool {
        !self.is_terminated()
            && (self.desired_state_updated_since_response()
                || !self.desired_state.is_satisfied_by(self.actual_state))
    }

    /// Whether the time-to-live has run out.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        let ttl_ms = u64::from(self.max_hours_before_termination) * MS_PER_HOUR;
        self.created_at_ms.saturating_add(ttl_ms) < now_ms
    }

    /// Record an interpreted agent report (or a timeout).
    ///
    /// Also applies the two backend-side desired-state rules: a pending
    /// restart proceeds once the workspace is stopped, and an expired
    /// workspace is terminated.
    pub fn apply_observation(&mut self, observation: Observation, now_ms: u64) {
        let actual = observation.actual_state();
        if self.desired_state == WorkspaceState::RestartRequested
            && actual == WorkspaceState::Stopped
        {
            self.desired_state = WorkspaceState::Running;
            self.desired_state_updated_at_ms = now_ms;
        }
        if self.is_expired(now_ms) && self.desired_state != WorkspaceState::Terminated {
            self.desired_state = WorkspaceState::Terminated;
            self.desired_state_updated_at_ms = now_ms;
        }
        self.actual_state = actual;
        if let Some(version) = observation.into_resource_version() {
            self.deployment_resource_version = Some(version);
        }
    }

    /// Replace the watermark after a conflict refresh.
    pub fn refresh_resource_version(&mut self, version: Option<String>) {
        self.deployment_resource_version = version;
    }

    pub fn mark_responded(&mut self, now_ms: u64) {
        self.responded_to_agent_at_ms = Some(now_ms);
    }

    pub fn mark_secrets_applied(&mut self) {
        self.variables_rotated = false;
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    /// Record an agent report that was rejected; returns how many in a row.
    pub fn record_rejected_report(&mut self, message: impl fmt::Display) -> u32 {
        self.rejected_reports += 1;
        self.last_error = Some(match self.rejected_reports {
            1 => message.to_string(),
            n => format!("{} ({} reports in a row)", message, n),
        });
        self.rejected_reports
    }

    pub fn clear_error(&mut self) {
        self.rejected_reports = 0;
        self.last_error = None;
    }

    /// Name of the ConfigMap inventory owning the workload resources.
    pub fn inventory_name(&self) -> String {
        format!("{}-workspace-inventory", self.name)
    }

    /// Name of the ConfigMap inventory owning the Secrets.
    pub fn secrets_inventory_name(&self) -> String {
        format!("{}-secret-inventory", self.name)
    }
}

crate::builder! {
    pub struct WorkspaceBuilder => Workspace {
        into {
            name: String = "ws1",
            namespace: String = "ns1",
            dns_zone: String = "workspaces.localdev.me",
        }
        set {
            id: WorkspaceId = WorkspaceId(1),
            agent_id: AgentId = AgentId(42),
            project: ProjectSource = ProjectSource {
                clone_url: "http://localhost/test-group/test-project.git".to_string(),
                directory: "test-project".to_string(),
                git_ref: "master".to_string(),
            },
            variables: Vec<WorkspaceVariable> = Vec::new(),
            desired_state: WorkspaceState = WorkspaceState::Running,
            actual_state: WorkspaceState = WorkspaceState::CreationRequested,
            deployment_resource_version: Option<String> = None,
            max_hours_before_termination: u32 = DEFAULT_MAX_HOURS_BEFORE_TERMINATION,
            created_at_ms: u64 = 0,
            desired_state_updated_at_ms: u64 = 0,
            responded_to_agent_at_ms: Option<u64> = None,
            variables_rotated: bool = false,
            last_error: Option<String> = None,
            rejected_reports: u32 = 0,
        }
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
