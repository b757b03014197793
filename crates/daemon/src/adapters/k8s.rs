// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubernetes transport: server-side apply through the API server.
//!
//! Each manifest is applied with `Patch::Apply` under one field manager. The
//! Deployment carries the recorded watermark as `metadata.resourceVersion`,
//! so a stale watermark comes back as HTTP 409 and maps to
//! [`TransportError::Conflict`].

use super::transport::{AgentTransport, TransportError};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, PersistentVolumeClaim, Secret, Service};
use k8s_openapi::api::networking::v1::NetworkPolicy;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, DeleteParams, Patch, PatchParams};
use kube::Client;
use rdev_core::{AgentInfo, TerminationProgress, Workspace, WorkspaceState};
use rdev_manifest::{Manifest, ManifestParams, ManifestSet, ResourceGroups};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Agent transport backed by a `kube` client.
#[derive(Clone)]
pub struct KubernetesTransport {
    client: Client,
    field_manager: String,
}

impl KubernetesTransport {
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self { client, field_manager: field_manager.into() }
    }

    /// Connect using the in-cluster or kubeconfig defaults.
    pub async fn try_default(field_manager: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::try_default().await.map_err(|e| {
            TransportError::Unreachable(format!("failed to create kube client: {}", e))
        })?;
        Ok(Self::new(client, field_manager))
    }

    fn params(&self) -> PatchParams {
        PatchParams::apply(&self.field_manager).force()
    }

    async fn ensure_namespace(&self, name: &str) -> Result<(), TransportError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let namespace = Namespace {
            metadata: ObjectMeta { name: Some(name.to_string()), ..Default::default() },
            ..Default::default()
        };
        api.patch(name, &self.params(), &Patch::Apply(&namespace)).await.map_err(map_kube_error)?;
        Ok(())
    }

    async fn apply_one<K>(
        &self,
        namespace: &str,
        name: &str,
        object: &K,
    ) -> Result<(), TransportError>
    where
        K: kube::Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + Debug
            + DeserializeOwned
            + Serialize,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        api.patch(name, &self.params(), &Patch::Apply(object)).await.map_err(map_kube_error)?;
        tracing::debug!(%namespace, %name, kind = %K::kind(&()), "applied");
        Ok(())
    }

    async fn delete_one<K>(&self, namespace: &str, name: &str) -> Result<(), TransportError>
    where
        K: kube::Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + Debug
            + DeserializeOwned,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        match api.delete(name, &DeleteParams::foreground()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(resp)) if resp.code == 404 => Ok(()),
            Err(e) => Err(map_kube_error(e)),
        }
    }

    /// Remove the workload resources of a workspace being terminated.
    async fn prune_workload(&self, workspace: &Workspace) -> Result<(), TransportError> {
        let params = ManifestParams::for_workspace(workspace, ResourceGroups::ALL);
        let ns = workspace.namespace.as_str();
        let name = workspace.name.as_str();
        self.delete_one::<Deployment>(ns, name).await?;
        self.delete_one::<Service>(ns, name).await?;
        self.delete_one::<PersistentVolumeClaim>(ns, &params.claim_name()).await?;
        self.delete_one::<NetworkPolicy>(ns, name).await?;
        self.delete_one::<Secret>(ns, &params.env_secret_name()).await?;
        self.delete_one::<Secret>(ns, &params.file_secret_name()).await?;
        tracing::info!(workspace = %name, namespace = %ns, "pruned workload resources");
        Ok(())
    }
}

#[async_trait]
impl AgentTransport for KubernetesTransport {
    async fn apply(
        &self,
        workspace: &Workspace,
        manifests: &ManifestSet,
    ) -> Result<(), TransportError> {
        let ns = workspace.namespace.as_str();
        self.ensure_namespace(ns).await?;

        for manifest in manifests.iter() {
            let name = manifest.name();
            match manifest {
                Manifest::ConfigMap(cm) => self.apply_one::<ConfigMap>(ns, name, cm).await?,
                Manifest::Deployment(deployment) => {
                    let mut deployment = (**deployment).clone();
                    deployment.metadata.resource_version =
                        workspace.deployment_resource_version().map(str::to_string);
                    self.apply_one::<Deployment>(ns, name, &deployment).await?
                }
                Manifest::Service(svc) => self.apply_one::<Service>(ns, name, svc).await?,
                Manifest::PersistentVolumeClaim(pvc) => {
                    self.apply_one::<PersistentVolumeClaim>(ns, name, pvc).await?
                }
                Manifest::NetworkPolicy(np) => {
                    self.apply_one::<NetworkPolicy>(ns, name, np).await?
                }
                Manifest::Secret(secret) => self.apply_one::<Secret>(ns, name, secret).await?,
            }
        }

        let terminating = workspace.desired_state() == WorkspaceState::Terminated;
        if terminating && manifests.deployment().is_none() {
            self.prune_workload(workspace).await?;
        }
        Ok(())
    }

    async fn report(&self, workspace: &Workspace) -> Result<AgentInfo, TransportError> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), &workspace.namespace);
        let deployment = api.get_opt(&workspace.name).await.map_err(map_kube_error)?;
        let name = workspace.name.clone();
        let namespace = workspace.namespace.clone();
        match deployment {
            None => Ok(AgentInfo::terminating(name, namespace, TerminationProgress::Terminated)),
            Some(d) if d.metadata.deletion_timestamp.is_some() => {
                Ok(AgentInfo::terminating(name, namespace, TerminationProgress::Terminating))
            }
            Some(d) => {
                let document = serde_json::to_value(&d).map_err(|e| {
                    TransportError::Unreachable(format!("unreadable Deployment {}: {}", name, e))
                })?;
                Ok(AgentInfo {
                    name,
                    namespace,
                    termination_progress: None,
                    latest_k8s_deployment_info: Some(document),
                    error_details: None,
                })
            }
        }
    }

    async fn resource_version(
        &self,
        workspace: &Workspace,
    ) -> Result<Option<String>, TransportError> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), &workspace.namespace);
        let deployment = api.get_opt(&workspace.name).await.map_err(map_kube_error)?;
        Ok(deployment.and_then(|d| d.metadata.resource_version))
    }
}

/// 409 is a stale watermark; other API refusals are rejections; anything
/// below the API layer means the cluster could not be reached.
fn map_kube_error(e: kube::Error) -> TransportError {
    match e {
        kube::Error::Api(resp) if resp.code == 409 => TransportError::Conflict(resp.message),
        kube::Error::Api(resp) => {
            TransportError::Rejected(format!("{} ({})", resp.message, resp.code))
        }
        other => TransportError::Unreachable(other.to_string()),
    }
}

#[cfg(test)]
#[path = "k8s_tests.rs"]
mod tests;
