// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manifest builder specs

use crate::prelude::*;
use crate::prelude::assert_eq;
use rdev_manifest::{decode_secret_data, Manifest, ManifestError};
use std::collections::BTreeMap;

#[test]
fn scenario_a_emits_five_resources() {
    let set = build(&scenario_params()).unwrap();
    let docs = parse_yaml_stream(&set.to_yaml_stream().unwrap()).unwrap();

    let kinds: Vec<&str> = docs.iter().map(|d| d["kind"].as_str().unwrap()).collect();
    assert_eq!(
        kinds,
        vec!["ConfigMap", "Deployment", "Service", "PersistentVolumeClaim", "NetworkPolicy"]
    );

    let deployment = doc_of(&docs, "Deployment");
    assert_eq!(deployment["spec"]["strategy"]["type"], "Recreate");
    assert_eq!(deployment["spec"]["template"]["spec"]["initContainers"].as_array().unwrap().len(), 2);
    assert_eq!(
        deployment["metadata"]["annotations"]["workspaces.gitlab.com/host-template"],
        "{{.port}}-ws1.workspaces.localdev.me"
    );

    let service = doc_of(&docs, "Service");
    assert_eq!(service["spec"]["ports"].as_array().unwrap().len(), 2);

    let claim = doc_of(&docs, "PersistentVolumeClaim");
    assert_eq!(claim["spec"]["resources"]["requests"]["storage"], "15Gi");

    let policy = doc_of(&docs, "NetworkPolicy");
    let egress = policy["spec"]["egress"].as_array().unwrap();
    assert!(egress.iter().any(|rule| rule["ports"][0]["port"] == 53));
    assert_eq!(
        egress[1]["to"][0]["ipBlock"]["except"],
        json!(["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16"])
    );
}

#[test]
fn every_workspace_resource_is_owned_by_an_inventory() {
    let set = build(&scenario_params().groups(ResourceGroups::ALL)).unwrap();
    for doc in set.to_documents().unwrap() {
        let name = doc["metadata"]["name"].as_str().unwrap();
        if name.ends_with("-inventory") {
            continue;
        }
        let owner = doc["metadata"]["annotations"]["config.k8s.io/owning-inventory"]
            .as_str()
            .unwrap();
        let expected =
            if doc["kind"] == "Secret" { "ws1-secret-inventory" } else { "ws1-workspace-inventory" };
        assert_eq!(owner, expected, "{name}");
    }
}

#[test]
fn generation_is_idempotent_for_both_replica_counts() {
    for replicas in [0, 1] {
        let params = scenario_params()
            .replicas(replicas)
            .groups(ResourceGroups::ALL)
            .env_vars(BTreeMap::from([("EDITOR".to_string(), "vim".to_string())]));
        let first = build(&params).unwrap().to_yaml_stream().unwrap();
        let second = build(&params).unwrap().to_yaml_stream().unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn env_secret_round_trips_empty_values() {
    let vars = BTreeMap::from([
        ("EMPTY".to_string(), String::new()),
        ("TOKEN".to_string(), "abc".to_string()),
    ]);
    let set = build(&scenario_params().groups(ResourceGroups::ALL).env_vars(vars.clone())).unwrap();
    let secret = set
        .iter()
        .find_map(|m| match m {
            Manifest::Secret(s) if m.name() == "ws1-env-var" => Some(s),
            _ => None,
        })
        .unwrap();
    let decoded = decode_secret_data(secret).unwrap();
    for (key, value) in &vars {
        assert_eq!(decoded.get(key), Some(value));
    }
}

#[test]
fn builder_refuses_invalid_inputs() {
    assert!(matches!(
        build(&scenario_params().replicas(2)),
        Err(ManifestError::InvalidReplicas(2))
    ));

    let ws = Workspace::builder()
        .variables(vec![WorkspaceVariable::file("cfg", "x").mount_path("/projects")])
        .build();
    let params = ManifestParams::for_workspace(&ws, ResourceGroups::ALL);
    assert!(matches!(build(&params), Err(ManifestError::ReservedMountPath { .. })));
}
