// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The workspace's network isolation boundary.
//!
//! Egress is open to the internet but not to RFC1918 ranges, except DNS in
//! kube-system. Ingress is only accepted from the workspaces proxy.

use crate::error::ManifestError;
use crate::meta::{agent_labels, owned_meta};
use crate::params::ManifestParams;
use k8s_openapi::api::networking::v1::{NetworkPolicy, NetworkPolicySpec};
use serde_json::json;

const PRIVATE_RANGES: [&str; 3] = ["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16"];
const PROXY_NAMESPACE: &str = "gitlab-workspaces";
const PROXY_APP: &str = "gitlab-workspaces-proxy";
const NAMESPACE_NAME_LABEL: &str = "kubernetes.io/metadata.name";

pub(crate) fn network_policy(params: &ManifestParams) -> Result<NetworkPolicy, ManifestError> {
    let spec = json!({
        "podSelector": { "matchLabels": agent_labels(params) },
        "policyTypes": ["Ingress", "Egress"],
        "ingress": [{
            "from": [{
                "namespaceSelector": { "matchLabels": { NAMESPACE_NAME_LABEL: PROXY_NAMESPACE } },
                "podSelector": { "matchLabels": { "app.kubernetes.io/name": PROXY_APP } },
            }],
        }],
        "egress": [
            {
                "ports": [
                    { "port": 53, "protocol": "TCP" },
                    { "port": 53, "protocol": "UDP" },
                ],
                "to": [{
                    "namespaceSelector": { "matchLabels": { NAMESPACE_NAME_LABEL: "kube-system" } },
                }],
            },
            {
                "to": [{ "ipBlock": { "cidr": "0.0.0.0/0", "except": PRIVATE_RANGES } }],
            },
        ],
    });
    let spec: NetworkPolicySpec = serde_json::from_value(spec)
        .map_err(|source| ManifestError::Render { kind: "NetworkPolicy", source })?;

    Ok(NetworkPolicy {
        metadata: owned_meta(params, params.name.clone(), &params.inventory_name()),
        spec: Some(spec),
        ..Default::default()
    })
}
