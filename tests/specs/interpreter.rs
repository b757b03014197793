// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-info interpreter specs

use crate::prelude::*;
use crate::prelude::assert_eq;
use rdev_core::transition::modeled;
use rdev_core::TransitionError;
use rdev_engine::{interpret, InterpretError};

fn status_of(info: &AgentInfo) -> &Value {
    &info.latest_k8s_deployment_info.as_ref().unwrap()["status"]
}

#[test]
fn scenario_b_starting_to_running_on_a_new_deployment() {
    let info = interpret(&scenario_workspace(), Starting, Running, false, "1").unwrap();
    let status = status_of(&info);
    for counter in ["availableReplicas", "readyReplicas", "replicas", "updatedReplicas"] {
        assert_eq!(status[counter], 1, "{counter}");
    }
    assert_eq!(condition(status, "Available")["status"], "True");
}

#[test]
fn scenario_c_restart_of_an_existing_deployment() {
    let info = interpret(&scenario_workspace(), Stopped, Starting, true, "1").unwrap();
    let status = status_of(&info);
    assert_eq!(status["replicas"], 1);
    assert_eq!(status["unavailableReplicas"], 1);
    assert_eq!(status["updatedReplicas"], 1);
    let available = condition(status, "Available");
    assert_eq!(available["status"], "False");
    assert_eq!(available["reason"], "MinimumReplicasUnavailable");
}

#[test]
fn scenario_d_terminated_is_bare() {
    let info = interpret(&scenario_workspace(), Terminating, Terminated, true, "1").unwrap();
    assert_eq!(
        serde_json::to_value(&info).unwrap(),
        json!({"name": "ws1", "namespace": "ns1", "termination_progress": "Terminated"})
    );
}

#[test]
fn scenario_e_starting_to_failed_is_unimplemented() {
    for exists in [false, true] {
        let err = interpret(&scenario_workspace(), Starting, Failed, exists, "1").unwrap_err();
        assert!(matches!(
            err,
            InterpretError::Transition(TransitionError::Unimplemented { .. })
        ));
    }
}

#[test]
fn scaled_down_status_has_no_replica_counters() {
    let info = interpret(&scenario_workspace(), Stopping, Stopped, true, "1").unwrap();
    let status = status_of(&info).as_object().unwrap();
    for counter in
        ["replicas", "readyReplicas", "availableReplicas", "updatedReplicas", "unavailableReplicas"]
    {
        assert!(!status.contains_key(counter), "{counter} present");
    }
    assert_eq!(info.latest_k8s_deployment_info.as_ref().unwrap()["spec"]["replicas"], 0);
}

#[test]
fn only_modeled_transitions_carry_a_status() {
    let table = modeled();
    for previous in WorkspaceState::ACTUAL {
        for current in WorkspaceState::ACTUAL {
            for exists in [false, true] {
                let listed = table.iter().any(|(p, c, e, _)| {
                    *p == previous && *c == current && *e == exists
                });
                match interpret(&scenario_workspace(), previous, current, exists, "1") {
                    Ok(info) if info.latest_k8s_deployment_info.is_some() => assert!(listed),
                    Ok(_) => {}
                    Err(_) => assert!(!listed),
                }
            }
        }
    }
}
