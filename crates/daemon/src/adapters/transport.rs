// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use async_trait::async_trait;
use rdev_core::{AgentInfo, Workspace};
use rdev_manifest::ManifestSet;
use thiserror::Error;

/// Errors from agent transport operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The apply carried a stale resource-version watermark.
    #[error("apply conflict: {0}")]
    Conflict(String),
    /// The cluster refused the manifests for another reason.
    #[error("apply rejected: {0}")]
    Rejected(String),
    #[error("agent unreachable: {0}")]
    Unreachable(String),
}

impl TransportError {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Conflict(_) | TransportError::Unreachable(_))
    }
}

/// Channel to the agent that owns a workspace's cluster resources.
#[async_trait]
pub trait AgentTransport: Clone + Send + Sync + 'static {
    /// Apply `manifests` in order, using the workspace's recorded
    /// Deployment resource version as the optimistic-concurrency token.
    async fn apply(&self, workspace: &Workspace, manifests: &ManifestSet)
        -> Result<(), TransportError>;

    /// Latest status report for the workspace.
    async fn report(&self, workspace: &Workspace) -> Result<AgentInfo, TransportError>;

    /// Current Deployment resource version, for refreshing a stale watermark.
    async fn resource_version(&self, workspace: &Workspace)
        -> Result<Option<String>, TransportError>;
}
