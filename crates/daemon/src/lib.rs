// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rdev-daemon: the workspace reconciliation loop
//!
//! Polls the workspace store, applies generated manifests through an
//! [`AgentTransport`], and folds the agent's reports back into the records.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod env;
pub mod reconciler;
pub mod storage;
pub mod telemetry;

pub use adapters::{AgentTransport, KubernetesTransport, TransportError};
#[cfg(any(test, feature = "test-support"))]
pub use adapters::{ApplyCall, FakeAgentTransport};
pub use env::{ConfigError, ReconcilerConfig};
pub use reconciler::{CycleResult, ReconcileError, Reconciler};
pub use storage::{MemoryStore, WorkspaceStore};
pub use telemetry::init_tracing;
