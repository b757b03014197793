// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deployment status stanzas for modeled transitions.
//!
//! Each [`StatusTemplate`] is the status the Kubernetes Deployment controller
//! reports at that point of a workspace's lifecycle. Replica counters that the
//! controller omits are omitted here too; an absent counter is not a zero.

use k8s_openapi::api::apps::v1::DeploymentStatus;
use rdev_core::StatusTemplate;
use serde_json::{json, Map, Value};

const AVAILABLE_MESSAGE: &str = "Deployment has minimum availability.";
const UNAVAILABLE_MESSAGE: &str = "Deployment does not have minimum availability.";

/// Status stanza for `template` on the Deployment named `name`.
pub fn deployment_status(
    template: StatusTemplate,
    name: &str,
) -> Result<DeploymentStatus, serde_json::Error> {
    serde_json::from_value(stanza(template, name))
}

fn stanza(template: StatusTemplate, name: &str) -> Value {
    let progressed = format!("ReplicaSet \"{}-hash\" has successfully progressed.", name);
    match template {
        StatusTemplate::NewReplicaSetCreated => status(
            vec![condition(
                "Progressing",
                true,
                "NewReplicaSetCreated",
                &format!("Created new replica set \"{}-hash\"", name),
                ("2023-04-10T10:14:14Z", "2023-04-10T10:14:14Z"),
            )],
            &[],
        ),
        StatusTemplate::ReplicaSetProgressing => status(
            vec![
                condition(
                    "Available",
                    false,
                    "MinimumReplicasUnavailable",
                    UNAVAILABLE_MESSAGE,
                    ("2023-04-10T10:14:14Z", "2023-04-10T10:14:14Z"),
                ),
                condition(
                    "Progressing",
                    true,
                    "ReplicaSetUpdated",
                    &format!("ReplicaSet \"{}-hash\" is progressing.", name),
                    ("2023-04-10T10:14:14Z", "2023-04-10T10:14:14Z"),
                ),
            ],
            &[("observedGeneration", 1), ("replicas", 1), ("unavailableReplicas", 1), ("updatedReplicas", 1)],
        ),
        StatusTemplate::AwaitingAvailability | StatusTemplate::AwaitingAvailabilityWithReplicas => {
            let conditions = vec![
                condition(
                    "Progressing",
                    true,
                    "NewReplicaSetAvailable",
                    &progressed,
                    ("2023-04-10T10:40:24Z", "2023-04-10T10:40:35Z"),
                ),
                condition(
                    "Available",
                    false,
                    "MinimumReplicasUnavailable",
                    UNAVAILABLE_MESSAGE,
                    ("2023-04-10T10:49:59Z", "2023-04-10T10:49:59Z"),
                ),
            ];
            if template == StatusTemplate::AwaitingAvailability {
                status(conditions, &[("observedGeneration", 3)])
            } else {
                status(
                    conditions,
                    &[("observedGeneration", 3), ("replicas", 1), ("unavailableReplicas", 1), ("updatedReplicas", 1)],
                )
            }
        }
        StatusTemplate::Available => status(
            vec![
                condition(
                    "Available",
                    true,
                    "MinimumReplicasAvailable",
                    AVAILABLE_MESSAGE,
                    ("2023-03-06T14:36:36Z", "2023-03-06T14:36:36Z"),
                ),
                condition(
                    "Progressing",
                    true,
                    "NewReplicaSetAvailable",
                    &progressed,
                    ("2023-03-06T14:36:31Z", "2023-03-06T14:36:36Z"),
                ),
            ],
            &[("availableReplicas", 1), ("readyReplicas", 1), ("replicas", 1), ("updatedReplicas", 1)],
        ),
        StatusTemplate::AvailableExisting => status(
            vec![
                condition(
                    "Progressing",
                    true,
                    "NewReplicaSetAvailable",
                    &progressed,
                    ("2023-04-10T10:40:24Z", "2023-04-10T10:40:35Z"),
                ),
                condition(
                    "Available",
                    true,
                    "MinimumReplicasAvailable",
                    AVAILABLE_MESSAGE,
                    ("2023-04-10T10:50:10Z", "2023-04-10T10:50:10Z"),
                ),
            ],
            &[
                ("availableReplicas", 1),
                ("observedGeneration", 3),
                ("readyReplicas", 1),
                ("replicas", 1),
                ("updatedReplicas", 1),
            ],
        ),
        StatusTemplate::ScalingDown | StatusTemplate::ScaledDown => {
            let conditions = vec![
                condition(
                    "Available",
                    true,
                    "MinimumReplicasAvailable",
                    AVAILABLE_MESSAGE,
                    ("2023-04-10T10:40:35Z", "2023-04-10T10:40:35Z"),
                ),
                condition(
                    "Progressing",
                    true,
                    "NewReplicaSetAvailable",
                    &progressed,
                    ("2023-04-10T10:40:24Z", "2023-04-10T10:40:35Z"),
                ),
            ];
            if template == StatusTemplate::ScalingDown {
                status(
                    conditions,
                    &[
                        ("availableReplicas", 1),
                        ("observedGeneration", 1),
                        ("readyReplicas", 1),
                        ("replicas", 1),
                        ("updatedReplicas", 1),
                    ],
                )
            } else {
                // Scaled to zero: the controller drops the counters.
                status(conditions, &[("observedGeneration", 2)])
            }
        }
    }
}

fn status(conditions: Vec<Value>, counters: &[(&str, i64)]) -> Value {
    let mut status = Map::new();
    status.insert("conditions".to_string(), Value::Array(conditions));
    for (key, value) in counters {
        status.insert((*key).to_string(), json!(value));
    }
    Value::Object(status)
}

fn condition(kind: &str, ok: bool, reason: &str, message: &str, times: (&str, &str)) -> Value {
    json!({
        "type": kind,
        "status": if ok { "True" } else { "False" },
        "reason": reason,
        "message": message,
        "lastTransitionTime": times.0,
        "lastUpdateTime": times.1,
    })
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
