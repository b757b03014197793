// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent reconcile contract specs
//!
//! Drives [`ReconcileProcessor`] the way a polling agent would: report what
//! the cluster shows, apply whatever config comes back.

use crate::prelude::*;
use crate::prelude::assert_eq;
use rdev_core::{NewWorkspace, RailsInfo};
use rdev_engine::{interpret, ReconcileProcessor};
use std::time::Duration;

struct Agent {
    processor: ReconcileProcessor<FakeClock>,
    clock: FakeClock,
    workspaces: Vec<Workspace>,
}

impl Agent {
    fn new() -> Self {
        let clock = FakeClock::at(1_000);
        let ws = Workspace::create(
            NewWorkspace {
                id: WorkspaceId(1),
                name: "ws1".to_string(),
                namespace: Some("ns1".to_string()),
                agent_id: AgentId(42),
                dns_zone: "workspaces.localdev.me".to_string(),
                project: scenario_params().project,
                desired_state: Running,
                variables: vec![WorkspaceVariable::env("EDITOR", "vim")],
                max_hours_before_termination: None,
                user: UserIdentity {
                    name: "Ada".to_string(),
                    email: "ada@example.com".to_string(),
                },
                personal_access_token: "glpat-1".to_string(),
            },
            clock.epoch_ms(),
        )
        .unwrap();
        Self {
            processor: ReconcileProcessor::new(AgentId(42), clock.clone()),
            clock,
            workspaces: vec![ws],
        }
    }

    /// One agent poll; time moves on afterwards.
    fn poll(&mut self, infos: &[AgentInfo], update_type: UpdateType) -> Vec<RailsInfo> {
        let outcome = self.processor.process(&mut self.workspaces, infos, update_type);
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        self.clock.advance(Duration::from_secs(1));
        outcome.rails_infos
    }

    fn report(&self, previous: WorkspaceState, current: WorkspaceState, rv: &str) -> AgentInfo {
        let ws = &self.workspaces[0];
        interpret(ws, previous, current, ws.exists_in_cluster(), rv).unwrap()
    }

    fn set_desired(&mut self, state: WorkspaceState) {
        let now = self.clock.epoch_ms();
        self.workspaces[0].set_desired_state(state, now).unwrap();
    }
}

fn kinds(rails: &RailsInfo) -> Vec<String> {
    let docs = parse_yaml_stream(rails.config_to_apply.as_deref().unwrap()).unwrap();
    docs.iter().map(|d| d["kind"].as_str().unwrap().to_string()).collect()
}

fn replicas(rails: &RailsInfo) -> Value {
    let docs = parse_yaml_stream(rails.config_to_apply.as_deref().unwrap()).unwrap();
    doc_of(&docs, "Deployment")["spec"]["replicas"].clone()
}

fn secret_keys(rails: &RailsInfo, name: &str) -> Vec<String> {
    let docs = parse_yaml_stream(rails.config_to_apply.as_deref().unwrap()).unwrap();
    let secret = docs
        .iter()
        .find(|d| d["kind"] == "Secret" && d["metadata"]["name"] == name)
        .unwrap();
    secret["data"].as_object().unwrap().keys().cloned().collect()
}

#[test]
fn workspace_lifecycle_over_partial_polls() {
    let mut agent = Agent::new();

    // Creation: everything, Secrets included.
    let answer = agent.poll(&[], UpdateType::Partial);
    assert_eq!(answer.len(), 1);
    assert_eq!(answer[0].actual_state, CreationRequested);
    assert_eq!(kinds(&answer[0]).iter().filter(|k| *k == "Secret").count(), 2);
    assert_eq!(replicas(&answer[0]), 1);

    // Nothing new to say.
    assert!(agent.poll(&[], UpdateType::Partial).is_empty());

    let starting = agent.report(CreationRequested, Starting, "1");
    let answer = agent.poll(&[starting], UpdateType::Partial);
    assert_eq!(answer[0].actual_state, Starting);
    assert_eq!(answer[0].deployment_resource_version.as_deref(), Some("1"));
    assert_eq!(answer[0].config_to_apply, None);

    let running = agent.report(Starting, Running, "2");
    let answer = agent.poll(&[running], UpdateType::Partial);
    assert_eq!(answer[0].actual_state, Running);
    assert_eq!(agent.workspaces[0].deployment_resource_version(), Some("2"));

    // The client stops the workspace: workload only, scaled to zero.
    agent.set_desired(Stopped);
    let answer = agent.poll(&[], UpdateType::Partial);
    assert_eq!(answer[0].desired_state, Stopped);
    assert!(!kinds(&answer[0]).contains(&"Secret".to_string()));
    assert_eq!(replicas(&answer[0]), 0);

    let stopping = agent.report(Running, Stopping, "3");
    agent.poll(&[stopping], UpdateType::Partial);
    let stopped = agent.report(Stopping, Stopped, "4");
    let answer = agent.poll(&[stopped], UpdateType::Partial);
    assert_eq!(answer[0].actual_state, Stopped);
    assert_eq!(agent.workspaces[0].last_error(), None);
}

#[test]
fn rotated_variables_ship_secrets_once() {
    let mut agent = Agent::new();
    agent.poll(&[], UpdateType::Partial);
    let starting = agent.report(CreationRequested, Starting, "1");
    agent.poll(&[starting], UpdateType::Partial);

    let now = agent.clock.epoch_ms();
    agent.workspaces[0]
        .rotate_variables(vec![WorkspaceVariable::env("EDITOR", "emacs")], now)
        .unwrap();
    let answer = agent.poll(&[], UpdateType::Partial);
    assert!(kinds(&answer[0]).contains(&"Secret".to_string()));
    assert!(!agent.workspaces[0].variables_rotated());
    // System variables survive a rotation.
    let env = secret_keys(&answer[0], "ws1-env-var");
    assert!(env.contains(&"EDITOR".to_string()));
    assert!(env.contains(&"GL_WORKSPACE_DOMAIN_TEMPLATE".to_string()));
    let files = secret_keys(&answer[0], "ws1-file");
    assert!(files.contains(&"gl_token".to_string()));
    assert!(files.contains(&"gl_git_credential_store.sh".to_string()));

    agent.set_desired(Stopped);
    let answer = agent.poll(&[], UpdateType::Partial);
    assert!(!kinds(&answer[0]).contains(&"Secret".to_string()));
}

#[test]
fn full_resync_resends_complete_config() {
    let mut agent = Agent::new();
    agent.poll(&[], UpdateType::Partial);
    let starting = agent.report(CreationRequested, Starting, "1");
    agent.poll(&[starting], UpdateType::Partial);

    let answer = agent.poll(&[], UpdateType::Full);
    assert_eq!(answer.len(), 1);
    assert_eq!(kinds(&answer[0]).len(), 8);
}

#[test]
fn terminated_workspace_drops_out_of_responses() {
    let mut agent = Agent::new();
    agent.poll(&[], UpdateType::Partial);

    agent.set_desired(Terminated);
    let answer = agent.poll(&[], UpdateType::Partial);
    assert!(kinds(&answer[0]).iter().all(|k| k == "ConfigMap"));

    let terminating = agent.report(Running, Terminating, "1");
    agent.poll(&[terminating], UpdateType::Partial);
    let terminated = agent.report(Terminating, Terminated, "1");
    let answer = agent.poll(&[terminated], UpdateType::Partial);
    assert_eq!(answer[0].actual_state, Terminated);
    assert_eq!(answer[0].config_to_apply, None);

    assert!(agent.poll(&[], UpdateType::Full).is_empty());
}

#[test]
fn response_omits_absent_config() {
    let mut agent = Agent::new();
    agent.poll(&[], UpdateType::Partial);
    let starting = agent.report(CreationRequested, Starting, "1");
    let answer = agent.poll(&[starting], UpdateType::Partial);

    assert_eq!(
        serde_json::to_value(&answer[0]).unwrap(),
        json!({
            "name": "ws1",
            "namespace": "ns1",
            "desired_state": "Running",
            "actual_state": "Starting",
            "deployment_resource_version": "1",
        })
    );
}

#[test]
fn reports_for_unknown_workspaces_are_ignored() {
    let mut agent = Agent::new();
    let orphan = AgentInfo::terminating("ghost", "ns9", TerminationProgress::Terminated);
    let answer = agent.poll(&[orphan], UpdateType::Partial);
    assert_eq!(answer.len(), 1);
    assert_eq!(answer[0].name, "ws1");
}
