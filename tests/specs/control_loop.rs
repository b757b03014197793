// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control loop specs
//!
//! The reconciler against the in-memory store and the simulated agent.

use crate::prelude::*;
use crate::prelude::assert_eq;
use rdev_daemon::{Reconciler, ReconcileError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

type TestReconciler = Reconciler<MemoryStore, FakeAgentTransport, FakeClock>;

struct Cluster {
    store: MemoryStore,
    agent: FakeAgentTransport,
    clock: FakeClock,
    reconciler: TestReconciler,
    shutdown: CancellationToken,
}

impl Cluster {
    fn new(config: ReconcilerConfig) -> Self {
        let store = MemoryStore::new();
        let agent = FakeAgentTransport::new();
        let clock = FakeClock::at(1_000);
        let reconciler = Reconciler::new(store.clone(), agent.clone(), clock.clone(), config);
        Self { store, agent, clock, reconciler, shutdown: CancellationToken::new() }
    }

    fn add(&self, id: u64, name: &str) {
        let ws = Workspace::builder()
            .id(WorkspaceId(id))
            .name(name)
            .desired_state_updated_at_ms(self.clock.epoch_ms())
            .build();
        self.store.insert(ws);
    }

    async fn settle(&self) {
        for _ in 0..10 {
            let results = self.reconciler.tick(&self.shutdown).await;
            self.clock.advance(Duration::from_secs(1));
            if results.is_empty() {
                return;
            }
        }
        panic!("workspaces never settled");
    }

    fn set_desired(&self, id: u64, state: WorkspaceState) {
        let now = self.clock.epoch_ms();
        self.store.update(WorkspaceId(id), |ws| ws.set_desired_state(state, now)).unwrap().unwrap();
    }

    fn actual(&self, id: u64) -> WorkspaceState {
        self.store.get(WorkspaceId(id)).unwrap().actual_state()
    }
}

#[tokio::test]
async fn workspaces_converge_independently() {
    let cluster = Cluster::new(ReconcilerConfig::default());
    cluster.add(1, "ws1");
    cluster.add(2, "ws2");

    cluster.settle().await;
    assert_eq!(cluster.actual(1), Running);
    assert_eq!(cluster.actual(2), Running);

    cluster.set_desired(2, Stopped);
    cluster.settle().await;
    assert_eq!(cluster.actual(1), Running);
    assert_eq!(cluster.actual(2), Stopped);

    let deployments: Vec<_> =
        cluster.agent.calls().into_iter().filter(|c| c.replicas.is_some()).collect();
    assert_eq!(deployments.len(), 3);
    assert_eq!(deployments[2].workspace, "ws2");
    assert_eq!(deployments[2].replicas, Some(0));
}

#[tokio::test]
async fn restart_and_terminate() {
    let cluster = Cluster::new(ReconcilerConfig::default());
    cluster.add(1, "ws1");
    cluster.settle().await;

    cluster.set_desired(1, RestartRequested);
    cluster.settle().await;
    let ws = cluster.store.get(WorkspaceId(1)).unwrap();
    assert_eq!(ws.desired_state(), Running);
    assert_eq!(ws.actual_state(), Running);

    cluster.set_desired(1, Terminated);
    cluster.settle().await;
    assert_eq!(cluster.actual(1), Terminated);
    assert!(cluster.store.pending().is_empty());
}

#[tokio::test(start_paused = true)]
async fn silent_agent_goes_unknown_then_recovers() {
    let config = ReconcilerConfig::from_toml("report_timeout_ms = 2000\n").unwrap();
    let cluster = Cluster::new(config);
    cluster.add(1, "ws1");
    cluster.agent.set_report_delay(Duration::from_secs(3));

    let results = cluster.reconciler.tick(&cluster.shutdown).await;
    assert!(matches!(
        results[0].result,
        Err(ReconcileError::AgentTimeout(d)) if d == Duration::from_secs(2)
    ));
    let ws = cluster.store.get(WorkspaceId(1)).unwrap();
    assert_eq!(ws.actual_state(), Unknown);
    assert!(ws.last_error().is_some());

    cluster.agent.set_report_delay(Duration::ZERO);
    cluster.clock.advance(Duration::from_secs(1));
    cluster.settle().await;
    let ws = cluster.store.get(WorkspaceId(1)).unwrap();
    assert_eq!(ws.actual_state(), Running);
    assert_eq!(ws.last_error(), None);
}

#[tokio::test(start_paused = true)]
async fn run_loop_stops_on_shutdown() {
    let config = ReconcilerConfig::from_toml("poll_interval_ms = 100\n").unwrap();
    let cluster = Cluster::new(config);
    cluster.add(1, "ws1");

    let reconciler = cluster.reconciler.clone();
    let shutdown = cluster.shutdown.clone();
    let handle = tokio::spawn(async move { reconciler.run(shutdown).await });

    tokio::time::sleep(Duration::from_secs(1)).await;
    cluster.shutdown.cancel();
    handle.await.unwrap();

    assert_eq!(cluster.actual(1), Running);
    assert!(cluster.reconciler.in_flight().is_empty());
}
