// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Labels, annotations and inventory objects shared by every resource.

use crate::params::ManifestParams;
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

pub const AGENT_ID_LABEL: &str = "agent.gitlab.com/id";
pub const INVENTORY_ID_LABEL: &str = "cli-utils.sigs.k8s.io/inventory-id";
pub const OWNING_INVENTORY_ANNOTATION: &str = "config.k8s.io/owning-inventory";
pub const HOST_TEMPLATE_ANNOTATION: &str = "workspaces.gitlab.com/host-template";
pub const WORKSPACE_ID_ANNOTATION: &str = "workspaces.gitlab.com/id";

/// Externally reachable hostname pattern; `{{.port}}` is filled in by the proxy.
pub fn host_template(name: &str, dns_zone: &str) -> String {
    format!("{{{{.port}}}}-{}.{}", name, dns_zone)
}

pub(crate) fn agent_labels(params: &ManifestParams) -> BTreeMap<String, String> {
    [(AGENT_ID_LABEL.to_string(), params.agent_id.to_string())].into_iter().collect()
}

fn annotations(params: &ManifestParams, owning_inventory: &str) -> BTreeMap<String, String> {
    [
        (OWNING_INVENTORY_ANNOTATION.to_string(), owning_inventory.to_string()),
        (HOST_TEMPLATE_ANNOTATION.to_string(), host_template(&params.name, &params.dns_zone)),
        (WORKSPACE_ID_ANNOTATION.to_string(), params.workspace_id.to_string()),
    ]
    .into_iter()
    .collect()
}

/// Metadata for a resource owned by `owning_inventory`.
pub(crate) fn owned_meta(params: &ManifestParams, name: String, owning_inventory: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name),
        namespace: Some(params.namespace.clone()),
        labels: Some(agent_labels(params)),
        annotations: Some(annotations(params, owning_inventory)),
        ..Default::default()
    }
}

/// ConfigMap-based inventory; the agent prunes resources that claim it as
/// owner but are missing from the applied set.
pub(crate) fn inventory(params: &ManifestParams, inventory_name: String) -> ConfigMap {
    let mut labels = agent_labels(params);
    labels.insert(INVENTORY_ID_LABEL.to_string(), inventory_name.clone());
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(inventory_name),
            namespace: Some(params.namespace.clone()),
            labels: Some(labels),
            ..Default::default()
        },
        ..Default::default()
    }
}
