// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-facing reconcile request/response contract.
//!
//! One call consumes the agent's batch of reports and answers with what each
//! workspace should look like next.

use crate::desired_config::{desired_config, select_groups};
use crate::ingest::{ingest_agent_info, IngestError};
use rdev_core::{AgentId, AgentInfo, Clock, RailsInfo, UpdateType, Workspace, WorkspaceState};
use rdev_manifest::ManifestError;
use std::collections::HashMap;
use thiserror::Error;

/// A failure scoped to one workspace; the rest of the batch still proceeds.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("workspace {name}: {source}")]
    Ingest {
        name: String,
        #[source]
        source: IngestError,
    },

    #[error("workspace {name}: manifest generation failed: {source}")]
    Manifest {
        name: String,
        #[source]
        source: ManifestError,
    },
}

impl ProcessError {
    pub fn workspace(&self) -> &str {
        match self {
            ProcessError::Ingest { name, .. } | ProcessError::Manifest { name, .. } => name,
        }
    }
}

/// Response payload for one agent batch.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub rails_infos: Vec<RailsInfo>,
    pub errors: Vec<ProcessError>,
}

impl ReconcileOutcome {
    pub fn rails_info(&self, name: &str) -> Option<&RailsInfo> {
        self.rails_infos.iter().find(|i| i.name == name)
    }
}

/// Processes reconcile batches for a single agent.
pub struct ReconcileProcessor<C: Clock> {
    agent_id: AgentId,
    clock: C,
}

impl<C: Clock> ReconcileProcessor<C> {
    pub fn new(agent_id: AgentId, clock: C) -> Self {
        Self { agent_id, clock }
    }

    pub fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    /// Ingest `infos` into `workspaces` and build the response.
    ///
    /// Workspaces belonging to other agents are ignored.
    pub fn process(
        &self,
        workspaces: &mut [Workspace],
        infos: &[AgentInfo],
        update_type: UpdateType,
    ) -> ReconcileOutcome {
        let now_ms = self.clock.epoch_ms();
        let mut outcome = ReconcileOutcome::default();

        let by_name: HashMap<&str, &AgentInfo> =
            infos.iter().map(|info| (info.name.as_str(), info)).collect();
        for info in infos {
            let known = workspaces
                .iter()
                .any(|ws| ws.agent_id == self.agent_id && ws.name == info.name);
            if !known {
                tracing::warn!(
                    agent_id = %self.agent_id,
                    workspace = %info.name,
                    namespace = %info.namespace,
                    "agent reported on a workspace with no record"
                );
            }
        }

        for ws in workspaces.iter_mut().filter(|ws| ws.agent_id == self.agent_id) {
            let reported = by_name.get(ws.name.as_str()).copied();
            if let Some(info) = reported {
                match ingest_agent_info(ws, info, now_ms) {
                    Ok(WorkspaceState::Unknown) => {
                        tracing::warn!(
                            workspace = %ws.name,
                            namespace = %ws.namespace,
                            "agent report does not map to a known state"
                        );
                    }
                    Ok(_) => {}
                    Err(source) => {
                        outcome.errors.push(ProcessError::Ingest { name: ws.name.clone(), source });
                        continue;
                    }
                }
            }

            let wants_config = update_type == UpdateType::Full
                || ws.desired_state_updated_since_response();
            let include = reported.is_some() || (wants_config && !ws.is_terminated());
            if !include {
                continue;
            }

            let config_to_apply = if wants_config && !ws.is_terminated() {
                match render_config(ws, update_type) {
                    Ok(stream) => Some(stream),
                    Err(source) => {
                        ws.record_error(source.to_string());
                        outcome
                            .errors
                            .push(ProcessError::Manifest { name: ws.name.clone(), source });
                        continue;
                    }
                }
            } else {
                None
            };

            if config_to_apply.is_some() && select_groups(ws, update_type).secrets {
                ws.mark_secrets_applied();
            }
            ws.mark_responded(now_ms);
            outcome.rails_infos.push(RailsInfo {
                name: ws.name.clone(),
                namespace: ws.namespace.clone(),
                desired_state: ws.desired_state(),
                actual_state: ws.actual_state(),
                deployment_resource_version: ws.deployment_resource_version().map(str::to_string),
                config_to_apply,
            });
        }

        tracing::debug!(
            agent_id = %self.agent_id,
            update_type = %update_type,
            reported = infos.len(),
            responded = outcome.rails_infos.len(),
            errors = outcome.errors.len(),
            "processed reconcile batch"
        );
        outcome
    }
}

fn render_config(ws: &Workspace, update_type: UpdateType) -> Result<String, ManifestError> {
    desired_config(ws, update_type)?.to_yaml_stream()
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;
