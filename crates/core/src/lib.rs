// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rdev-core: domain model for remote development workspace reconciliation

pub mod macros;

pub mod actual_state;
pub mod agent_info;
pub mod clock;
pub mod state;
pub mod transition;
pub mod variable;
pub mod workspace;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use actual_state::{calculate_actual_state, Observation};
pub use agent_info::{AgentInfo, ErrorDetails, RailsInfo, TerminationProgress, UpdateType};
pub use clock::{Clock, FakeClock, SystemClock};
pub use state::{StateError, WorkspaceState};
pub use transition::{StatusTemplate, TransitionError, TransitionOutcome};
pub use variable::{
    default_variables, merge_variables, UserIdentity, VariableType, WorkspaceVariable,
};
#[cfg(any(test, feature = "test-support"))]
pub use workspace::WorkspaceBuilder;
pub use workspace::{AgentId, NewWorkspace, ProjectSource, Workspace, WorkspaceId};
