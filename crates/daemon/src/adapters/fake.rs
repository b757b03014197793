// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory agent transport for tests.
//!
//! Simulates one Deployment per workspace. Each report advances the
//! simulated rollout by one step toward the last applied replica count.

use super::transport::{AgentTransport, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use rdev_core::{AgentInfo, TerminationProgress, Workspace, WorkspaceState};
use rdev_engine::interpret;
use rdev_manifest::ManifestSet;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// Recorded apply attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyCall {
    pub workspace: String,
    pub namespace: String,
    pub kinds: Vec<&'static str>,
    pub watermark: Option<String>,
    pub replicas: Option<i32>,
}

struct FakeWorkload {
    resource_version: u64,
    replicas: i32,
    terminating: bool,
}

#[derive(Default)]
struct FakeTransportState {
    workloads: HashMap<String, FakeWorkload>,
    calls: Vec<ApplyCall>,
    apply_errors: VecDeque<TransportError>,
    report_errors: VecDeque<TransportError>,
    reports: HashMap<String, VecDeque<AgentInfo>>,
    apply_delay: Option<Duration>,
    workspace_apply_delays: HashMap<String, Duration>,
    report_delay: Option<Duration>,
    next_version: u64,
}

/// Fake agent transport for testing
#[derive(Clone, Default)]
pub struct FakeAgentTransport {
    inner: Arc<Mutex<FakeTransportState>>,
}

impl FakeAgentTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded apply attempts, including failed ones
    pub fn calls(&self) -> Vec<ApplyCall> {
        self.inner.lock().calls.clone()
    }

    pub fn fail_next_apply(&self, error: TransportError) {
        self.inner.lock().apply_errors.push_back(error);
    }

    pub fn fail_next_report(&self, error: TransportError) {
        self.inner.lock().report_errors.push_back(error);
    }

    /// Queue a literal report for a workspace, served before the simulation.
    pub fn push_report(&self, info: AgentInfo) {
        self.inner.lock().reports.entry(info.name.clone()).or_default().push_back(info);
    }

    pub fn set_apply_delay(&self, delay: Duration) {
        self.inner.lock().apply_delay = Some(delay);
    }

    /// Delay applies to one workspace, ahead of any delay for all of them.
    pub fn set_apply_delay_for(&self, workspace: &str, delay: Duration) {
        self.inner.lock().workspace_apply_delays.insert(workspace.to_string(), delay);
    }

    pub fn set_report_delay(&self, delay: Duration) {
        self.inner.lock().report_delay = Some(delay);
    }

    /// Simulate a write by another client, staling any recorded watermark.
    pub fn bump_resource_version(&self, workspace: &str) {
        let mut state = self.inner.lock();
        state.next_version += 1;
        let version = state.next_version;
        if let Some(workload) = state.workloads.get_mut(workspace) {
            workload.resource_version = version;
        }
    }

    pub fn resource_version_of(&self, workspace: &str) -> Option<String> {
        self.inner.lock().workloads.get(workspace).map(|w| w.resource_version.to_string())
    }
}

/// Next simulated state, paired with the previous state whose transition
/// stanza describes it.
fn step(actual: WorkspaceState, replicas: i32) -> (WorkspaceState, WorkspaceState) {
    use WorkspaceState::*;
    match (actual, replicas) {
        (CreationRequested, _) => (CreationRequested, Starting),
        (Starting, _) => (Starting, Running),
        (Stopped, 1) => (Stopped, Starting),
        (Stopping, _) => (Stopping, Stopped),
        (Running, 0) => (Running, Stopping),
        (_, 0) => (Stopping, Stopped),
        _ => (Starting, Running),
    }
}

#[async_trait]
impl AgentTransport for FakeAgentTransport {
    async fn apply(
        &self,
        workspace: &Workspace,
        manifests: &ManifestSet,
    ) -> Result<(), TransportError> {
        let delay = {
            let state = self.inner.lock();
            state.workspace_apply_delays.get(&workspace.name).copied().or(state.apply_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.inner.lock();
        let replicas = manifests.deployment().and_then(|d| d.spec.as_ref()).and_then(|s| s.replicas);
        state.calls.push(ApplyCall {
            workspace: workspace.name.clone(),
            namespace: workspace.namespace.clone(),
            kinds: manifests.kinds(),
            watermark: workspace.deployment_resource_version().map(str::to_string),
            replicas,
        });
        if let Some(error) = state.apply_errors.pop_front() {
            return Err(error);
        }

        let name = workspace.name.clone();
        if let Some(replicas) = replicas {
            if let Some(existing) = state.workloads.get(&name) {
                let current = existing.resource_version.to_string();
                if workspace.deployment_resource_version() != Some(current.as_str()) {
                    return Err(TransportError::Conflict(format!(
                        "Deployment {} has resourceVersion {}",
                        name, current
                    )));
                }
            }
            state.next_version += 1;
            let resource_version = state.next_version;
            state.workloads.insert(name, FakeWorkload { resource_version, replicas, terminating: false });
        } else if workspace.desired_state() == WorkspaceState::Terminated {
            state.next_version += 1;
            let resource_version = state.next_version;
            state
                .workloads
                .entry(name)
                .or_insert(FakeWorkload { resource_version, replicas: 0, terminating: true })
                .terminating = true;
        }
        Ok(())
    }

    async fn report(&self, workspace: &Workspace) -> Result<AgentInfo, TransportError> {
        let delay = self.inner.lock().report_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.inner.lock();
        if let Some(error) = state.report_errors.pop_front() {
            return Err(error);
        }
        if let Some(info) = state.reports.get_mut(&workspace.name).and_then(VecDeque::pop_front) {
            return Ok(info);
        }

        let Some(workload) = state.workloads.get(&workspace.name) else {
            return Ok(AgentInfo {
                name: workspace.name.clone(),
                namespace: workspace.namespace.clone(),
                termination_progress: None,
                latest_k8s_deployment_info: None,
                error_details: None,
            });
        };

        if workload.terminating {
            let progress = if workspace.actual_state() == WorkspaceState::Terminating {
                TerminationProgress::Terminated
            } else {
                TerminationProgress::Terminating
            };
            return Ok(AgentInfo::terminating(&workspace.name, &workspace.namespace, progress));
        }

        let (previous, current) = step(workspace.actual_state(), workload.replicas);
        interpret(
            workspace,
            previous,
            current,
            workspace.exists_in_cluster(),
            &workload.resource_version.to_string(),
        )
        .map_err(|e| TransportError::Rejected(e.to_string()))
    }

    async fn resource_version(
        &self,
        workspace: &Workspace,
    ) -> Result<Option<String>, TransportError> {
        Ok(self.resource_version_of(&workspace.name))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
