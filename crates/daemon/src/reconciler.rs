// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polling reconciliation loop.
//!
//! Each tick fetches the workspaces with outstanding work and spawns their
//! reconciliations, at most one in flight per workspace id. One reconciliation
//! applies the desired manifests (when the desired state changed since the
//! last response) and then ingests the agent's next report. Only the agent
//! I/O suspends, and each call is bounded by a timeout.

use crate::adapters::{AgentTransport, TransportError};
use crate::env::ReconcilerConfig;
use crate::storage::WorkspaceStore;
use parking_lot::Mutex;
use rdev_core::{Clock, Observation, UpdateType, Workspace, WorkspaceId, WorkspaceState};
use rdev_engine::{desired_config, ingest_agent_info, select_groups, IngestError};
use rdev_manifest::ManifestError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("workspace {0} not found")]
    NotFound(WorkspaceId),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error("agent did not respond within {0:?}")]
    AgentTimeout(Duration),
    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: TransportError },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("reconciliation cancelled")]
    Cancelled,
}

/// Outcome of one workspace's reconciliation within a tick.
#[derive(Debug)]
pub struct CycleResult {
    pub workspace_id: WorkspaceId,
    pub result: Result<WorkspaceState, ReconcileError>,
}

type InFlightMap = Arc<Mutex<HashMap<WorkspaceId, CancellationToken>>>;

/// Registration of a running reconciliation; removed on drop.
struct InFlight {
    id: WorkspaceId,
    token: CancellationToken,
    registry: InFlightMap,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.id);
    }
}

#[derive(Clone)]
pub struct Reconciler<S, T, C>
where
    S: WorkspaceStore,
    T: AgentTransport,
    C: Clock,
{
    store: S,
    transport: T,
    clock: C,
    config: ReconcilerConfig,
    in_flight: InFlightMap,
}

impl<S, T, C> Reconciler<S, T, C>
where
    S: WorkspaceStore,
    T: AgentTransport,
    C: Clock,
{
    pub fn new(store: S, transport: T, clock: C, config: ReconcilerConfig) -> Self {
        Self { store, transport, clock, config, in_flight: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Poll until `shutdown` is cancelled.
    ///
    /// Reconciliations outlive the tick that started them; a workspace still
    /// in flight is skipped until its task finishes.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "reconciler started"
        );
        let mut tasks = JoinSet::new();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => self.spawn_pending(&mut tasks, &shutdown),
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    finish(joined);
                }
            }
        }
        // In-flight tokens are children of `shutdown` and are cancelled too.
        while let Some(joined) = tasks.join_next().await {
            finish(joined);
        }
        tracing::info!("reconciler stopped");
    }

    /// One poll: reconcile every pending workspace not already in flight and
    /// wait for those reconciliations.
    pub async fn tick(&self, shutdown: &CancellationToken) -> Vec<CycleResult> {
        let mut tasks = JoinSet::new();
        self.spawn_pending(&mut tasks, shutdown);

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            results.extend(finish(joined));
        }
        results.sort_by_key(|cycle| cycle.workspace_id);
        results
    }

    fn spawn_pending(&self, tasks: &mut JoinSet<CycleResult>, shutdown: &CancellationToken) {
        for id in self.store.pending() {
            let Some(guard) = self.claim(id, shutdown) else {
                tracing::debug!(workspace_id = %id, "reconciliation already in flight");
                continue;
            };
            let this = self.clone();
            tasks.spawn(async move {
                let token = guard.token.clone();
                let result = tokio::select! {
                    _ = token.cancelled() => Err(ReconcileError::Cancelled),
                    result = this.reconcile(id) => result,
                };
                drop(guard);
                CycleResult { workspace_id: id, result }
            });
        }
    }

    /// Cancel the in-flight reconciliation of one workspace.
    ///
    /// Returns false if none is running.
    pub fn cancel(&self, id: WorkspaceId) -> bool {
        match self.in_flight.lock().get(&id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn in_flight(&self) -> Vec<WorkspaceId> {
        let mut ids: Vec<_> = self.in_flight.lock().keys().copied().collect();
        ids.sort();
        ids
    }

    fn claim(&self, id: WorkspaceId, shutdown: &CancellationToken) -> Option<InFlight> {
        let mut registry = self.in_flight.lock();
        if registry.contains_key(&id) {
            return None;
        }
        let token = shutdown.child_token();
        registry.insert(id, token.clone());
        Some(InFlight { id, token, registry: Arc::clone(&self.in_flight) })
    }

    /// Reconcile one workspace: apply if needed, then ingest a report.
    pub async fn reconcile(&self, id: WorkspaceId) -> Result<WorkspaceState, ReconcileError> {
        let mut snapshot = self.store.get(id).ok_or(ReconcileError::NotFound(id))?;
        if snapshot.desired_state_updated_since_response() {
            self.apply_desired(&mut snapshot).await?;
        }
        self.ingest_report(&snapshot).await
    }

    async fn apply_desired(&self, snapshot: &mut Workspace) -> Result<(), ReconcileError> {
        let id = snapshot.id;
        let groups = select_groups(snapshot, UpdateType::Partial);
        let manifests = match desired_config(snapshot, UpdateType::Partial) {
            Ok(manifests) => manifests,
            Err(e) => {
                self.store.update(id, |ws| ws.record_error(e.to_string()));
                return Err(e.into());
            }
        };

        let mut refreshed = false;
        let mut attempt = 0;
        loop {
            let outcome = tokio::time::timeout(
                self.config.apply_timeout,
                self.transport.apply(snapshot, &manifests),
            )
            .await;
            let error = match outcome {
                Ok(Ok(())) => break,
                Ok(Err(e)) => e,
                Err(_) => {
                    let timeout = self.config.apply_timeout;
                    self.mark_unknown(id, format!("apply timed out after {:?}", timeout));
                    return Err(ReconcileError::AgentTimeout(timeout));
                }
            };

            if !error.is_retryable() {
                tracing::error!(workspace = %snapshot.name, error = %error, "apply rejected");
                self.store.update(id, |ws| ws.record_error(error.to_string()));
                return Err(error.into());
            }
            if attempt >= self.config.max_apply_retries {
                self.mark_unknown(id, error.to_string());
                return Err(ReconcileError::RetriesExhausted { attempts: attempt + 1, last: error });
            }

            if let TransportError::Conflict(_) = error {
                match self.transport.resource_version(snapshot).await {
                    Ok(version) => {
                        snapshot.refresh_resource_version(version);
                        refreshed = true;
                    }
                    Err(e) => {
                        tracing::warn!(
                            workspace = %snapshot.name,
                            error = %e,
                            "watermark refresh failed"
                        )
                    }
                }
            }
            let backoff = self.config.backoff(attempt);
            tracing::warn!(
                workspace = %snapshot.name,
                attempt,
                backoff_ms = backoff.as_millis() as u64,
                error = %error,
                "retrying apply"
            );
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }

        let version = snapshot.deployment_resource_version().map(str::to_string);
        let sent = &*snapshot;
        self.store.update(id, |ws| {
            if refreshed {
                ws.refresh_resource_version(version);
            }
            // A write that landed during the apply, even within the same
            // millisecond, leaves the response open for the next tick.
            if ws.desired_state() == sent.desired_state() && ws.variables() == sent.variables() {
                ws.mark_responded(sent.desired_state_updated_at_ms());
                if groups.secrets {
                    ws.mark_secrets_applied();
                }
            }
        });
        tracing::info!(
            workspace = %snapshot.name,
            namespace = %snapshot.namespace,
            desired = %snapshot.desired_state(),
            resources = manifests.len(),
            "applied desired config"
        );
        Ok(())
    }

    async fn ingest_report(&self, snapshot: &Workspace) -> Result<WorkspaceState, ReconcileError> {
        let id = snapshot.id;
        let mut attempt = 0;
        let info = loop {
            let outcome =
                tokio::time::timeout(self.config.report_timeout, self.transport.report(snapshot))
                    .await;
            match outcome {
                Ok(Ok(info)) => break info,
                Ok(Err(e)) if e.is_retryable() && attempt < self.config.max_apply_retries => {
                    tokio::time::sleep(self.config.backoff(attempt)).await;
                    attempt += 1;
                }
                Ok(Err(e)) => {
                    self.mark_unknown(id, e.to_string());
                    return Err(ReconcileError::RetriesExhausted { attempts: attempt + 1, last: e });
                }
                Err(_) => {
                    let timeout = self.config.report_timeout;
                    self.mark_unknown(id, format!("no agent report within {:?}", timeout));
                    return Err(ReconcileError::AgentTimeout(timeout));
                }
            }
        };

        let now = self.clock.epoch_ms();
        let state = self
            .store
            .update(id, |ws| ingest_agent_info(ws, &info, now))
            .ok_or(ReconcileError::NotFound(id))??;
        Ok(state)
    }

    fn mark_unknown(&self, id: WorkspaceId, message: String) {
        let now = self.clock.epoch_ms();
        self.store.update(id, |ws| {
            tracing::warn!(workspace = %ws.name, error = %message, "actual state now unknown");
            ws.apply_observation(Observation::timed_out(), now);
            ws.record_error(message);
        });
    }
}

fn finish(joined: Result<CycleResult, JoinError>) -> Option<CycleResult> {
    match joined {
        Ok(cycle) => {
            log_cycle(&cycle);
            Some(cycle)
        }
        Err(e) => {
            tracing::error!(error = %e, "reconcile task failed");
            None
        }
    }
}

fn log_cycle(cycle: &CycleResult) {
    match &cycle.result {
        Ok(state) => {
            tracing::debug!(workspace_id = %cycle.workspace_id, actual = %state, "reconciled")
        }
        Err(ReconcileError::Cancelled) => {
            tracing::info!(workspace_id = %cycle.workspace_id, "reconciliation cancelled")
        }
        Err(e) => {
            tracing::warn!(workspace_id = %cycle.workspace_id, error = %e, "reconciliation failed")
        }
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
