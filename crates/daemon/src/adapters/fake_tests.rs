// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rdev_core::actual_state::Observation;
use rdev_engine::desired_config;
use rdev_core::UpdateType;
use WorkspaceState::*;

#[yare::parameterized(
    create        = { CreationRequested, 1, CreationRequested, Starting },
    roll_out      = { Starting, 1, Starting, Running },
    steady        = { Running, 1, Starting, Running },
    restart       = { Stopped, 1, Stopped, Starting },
    scale_down    = { Running, 0, Running, Stopping },
    settle        = { Stopping, 0, Stopping, Stopped },
    stopped       = { Stopped, 0, Stopping, Stopped },
    after_timeout = { Unknown, 1, Starting, Running },
)]
fn simulated_rollout(actual: WorkspaceState, replicas: i32, previous: WorkspaceState, next: WorkspaceState) {
    assert_eq!(step(actual, replicas), (previous, next));
}

#[tokio::test]
async fn reports_follow_the_applied_replicas() {
    let transport = FakeAgentTransport::new();
    let mut ws = Workspace::builder().build();
    let set = desired_config(&ws, UpdateType::Partial).unwrap();
    transport.apply(&ws, &set).await.unwrap();

    for expected in [Starting, Running, Running] {
        let info = transport.report(&ws).await.unwrap();
        let observation = Observation::from_report(&info);
        assert_eq!(observation.actual_state(), expected);
        ws.apply_observation(observation, 0);
    }
    assert_eq!(ws.deployment_resource_version(), Some("1"));
}

#[tokio::test]
async fn stale_watermark_conflicts() {
    let transport = FakeAgentTransport::new();
    let ws = Workspace::builder().build();
    let set = desired_config(&ws, UpdateType::Partial).unwrap();
    transport.apply(&ws, &set).await.unwrap();

    // Recorded watermark is still None while the Deployment now exists.
    let err = transport.apply(&ws, &set).await.unwrap_err();
    assert!(matches!(err, TransportError::Conflict(_)));
    assert_eq!(transport.calls().len(), 2);
}

#[tokio::test]
async fn scripted_failures_and_reports_come_first() {
    let transport = FakeAgentTransport::new();
    let ws = Workspace::builder().build();
    transport.fail_next_report(TransportError::Unreachable("down".into()));
    transport.push_report(AgentInfo::terminating("ws1", "ns1", TerminationProgress::Terminated));

    assert!(transport.report(&ws).await.is_err());
    let info = transport.report(&ws).await.unwrap();
    assert_eq!(info.termination_progress, Some(TerminationProgress::Terminated));
    // Nothing applied yet: an empty report.
    assert!(transport.report(&ws).await.unwrap().latest_k8s_deployment_info.is_none());
}

#[tokio::test]
async fn termination_apply_reports_terminating_then_terminated() {
    let transport = FakeAgentTransport::new();
    let mut ws = Workspace::builder()
        .desired_state(Terminated)
        .actual_state(Running)
        .build();
    let set = desired_config(&ws, UpdateType::Partial).unwrap();
    transport.apply(&ws, &set).await.unwrap();

    let first = transport.report(&ws).await.unwrap();
    assert_eq!(first.termination_progress, Some(TerminationProgress::Terminating));
    ws.apply_observation(Observation::from_report(&first), 0);
    let second = transport.report(&ws).await.unwrap();
    assert_eq!(second.termination_progress, Some(TerminationProgress::Terminated));
}
