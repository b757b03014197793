// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rdev-engine: agent-info interpretation and reconcile decisions.
//!
//! Everything here is synchronous and free of I/O; the daemon crate drives it
//! against a real or fake agent.

mod desired_config;
mod ingest;
mod interpreter;
mod processor;
mod status;

pub use desired_config::{desired_config, select_groups};
pub use ingest::{ingest_agent_info, IngestError};
pub use interpreter::{interpret, InterpretError};
pub use processor::{ProcessError, ReconcileOutcome, ReconcileProcessor};
pub use status::deployment_status;
