// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport adapters between the reconciler and the cluster agent.

pub(crate) mod k8s;
mod transport;

pub use k8s::KubernetesTransport;
pub use transport::{AgentTransport, TransportError};

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ApplyCall, FakeAgentTransport};
