// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed resources, their ordered set, and YAML stream rendering.

use crate::error::ManifestError;
use crate::meta::inventory;
use crate::network_policy::network_policy;
use crate::params::ManifestParams;
use crate::secrets::{env_secret, file_secret};
use crate::workload::{deployment, persistent_volume_claim, service};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Secret, Service};
use k8s_openapi::api::networking::v1::NetworkPolicy;
use serde::Deserialize;
use serde_json::Value;

/// Renders a typed Kubernetes object to a generic document.
pub trait Render {
    fn render(&self) -> Result<Value, ManifestError>;
}

impl<K> Render for K
where
    K: k8s_openapi::Resource + serde::Serialize,
{
    fn render(&self) -> Result<Value, ManifestError> {
        serde_json::to_value(self).map_err(|source| ManifestError::Render { kind: K::KIND, source })
    }
}

/// One resource of a workspace.
#[derive(Debug, Clone, PartialEq)]
pub enum Manifest {
    ConfigMap(ConfigMap),
    Deployment(Box<Deployment>),
    Service(Service),
    PersistentVolumeClaim(PersistentVolumeClaim),
    NetworkPolicy(NetworkPolicy),
    Secret(Secret),
}

impl Manifest {
    pub fn kind(&self) -> &'static str {
        use k8s_openapi::Resource;
        match self {
            Manifest::ConfigMap(_) => ConfigMap::KIND,
            Manifest::Deployment(_) => Deployment::KIND,
            Manifest::Service(_) => Service::KIND,
            Manifest::PersistentVolumeClaim(_) => PersistentVolumeClaim::KIND,
            Manifest::NetworkPolicy(_) => NetworkPolicy::KIND,
            Manifest::Secret(_) => Secret::KIND,
        }
    }

    pub fn name(&self) -> &str {
        let meta = match self {
            Manifest::ConfigMap(o) => &o.metadata,
            Manifest::Deployment(o) => &o.metadata,
            Manifest::Service(o) => &o.metadata,
            Manifest::PersistentVolumeClaim(o) => &o.metadata,
            Manifest::NetworkPolicy(o) => &o.metadata,
            Manifest::Secret(o) => &o.metadata,
        };
        meta.name.as_deref().unwrap_or_default()
    }

    pub fn to_document(&self) -> Result<Value, ManifestError> {
        match self {
            Manifest::ConfigMap(o) => o.render(),
            Manifest::Deployment(o) => o.as_ref().render(),
            Manifest::Service(o) => o.render(),
            Manifest::PersistentVolumeClaim(o) => o.render(),
            Manifest::NetworkPolicy(o) => o.render(),
            Manifest::Secret(o) => o.render(),
        }
    }
}

/// Ordered resources for one workspace.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ManifestSet {
    manifests: Vec<Manifest>,
}

impl ManifestSet {
    pub fn iter(&self) -> impl Iterator<Item = &Manifest> {
        self.manifests.iter()
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.manifests.iter().map(Manifest::kind).collect()
    }

    pub fn deployment(&self) -> Option<&Deployment> {
        self.manifests.iter().find_map(|m| match m {
            Manifest::Deployment(d) => Some(d.as_ref()),
            _ => None,
        })
    }

    pub fn into_deployment(self) -> Option<Deployment> {
        self.manifests.into_iter().find_map(|m| match m {
            Manifest::Deployment(d) => Some(*d),
            _ => None,
        })
    }

    pub fn to_documents(&self) -> Result<Vec<Value>, ManifestError> {
        self.manifests.iter().map(Manifest::to_document).collect()
    }

    /// Multi-document YAML stream, each document prefixed with `---`.
    pub fn to_yaml_stream(&self) -> Result<String, ManifestError> {
        let mut out = String::new();
        for doc in self.to_documents()? {
            out.push_str("---\n");
            out.push_str(&serde_yaml::to_string(&doc)?);
        }
        Ok(out)
    }
}

impl IntoIterator for ManifestSet {
    type Item = Manifest;
    type IntoIter = std::vec::IntoIter<Manifest>;

    fn into_iter(self) -> Self::IntoIter {
        self.manifests.into_iter()
    }
}

/// Build the resources selected by `params.groups`.
///
/// Order: workspace inventory, Deployment, Service, PVC, NetworkPolicy,
/// secrets inventory, env-var Secret, file Secret.
pub fn build(params: &ManifestParams) -> Result<ManifestSet, ManifestError> {
    params.validate()?;
    let groups = params.groups;
    let mut manifests = Vec::new();

    if groups.inventory {
        manifests.push(Manifest::ConfigMap(inventory(params, params.inventory_name())));
    }
    if groups.workload {
        manifests.push(Manifest::Deployment(Box::new(deployment(params))));
        manifests.push(Manifest::Service(service(params)));
        manifests.push(Manifest::PersistentVolumeClaim(persistent_volume_claim(params)));
    }
    if groups.network_policy {
        manifests.push(Manifest::NetworkPolicy(network_policy(params)?));
    }
    if groups.secrets {
        manifests.push(Manifest::ConfigMap(inventory(params, params.secrets_inventory_name())));
        if groups.workload {
            manifests.push(Manifest::Secret(env_secret(params)));
            manifests.push(Manifest::Secret(file_secret(params)));
        }
    }

    tracing::debug!(
        workspace = %params.name,
        namespace = %params.namespace,
        replicas = params.replicas,
        count = manifests.len(),
        "built workspace manifests"
    );
    Ok(ManifestSet { manifests })
}

/// Split a multi-document YAML stream into generic documents.
pub fn parse_yaml_stream(stream: &str) -> Result<Vec<Value>, ManifestError> {
    let mut docs = Vec::new();
    for doc in serde_yaml::Deserializer::from_str(stream) {
        let value = Value::deserialize(doc)?;
        if !value.is_null() {
            docs.push(value);
        }
    }
    Ok(docs)
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
