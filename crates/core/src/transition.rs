// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Legal actual-state transitions.
//!
//! The table maps a `(previous, current, workspace_exists)` triple to the
//! Deployment status stanza that describes it. Transitions into
//! `Terminating`, `Terminated` and `Unknown` need no stanza and are resolved
//! before the table is consulted. Every other triple must be listed; a triple
//! that is missing, or listed as a known gap, is rejected rather than guessed.

use crate::state::WorkspaceState;
use crate::state::WorkspaceState::{
    CreationRequested, Failed, Running, Starting, Stopped, Stopping, Terminated, Terminating,
    Unknown,
};
use thiserror::Error;

/// Matcher for the `workspace_exists` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exists {
    Any,
    No,
    Yes,
}

impl Exists {
    fn matches(self, exists: bool) -> bool {
        match self {
            Exists::Any => true,
            Exists::No => !exists,
            Exists::Yes => exists,
        }
    }
}

/// Identifies one Deployment status stanza.
///
/// The stanzas themselves live with the agent-info interpreter; the table only
/// names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusTemplate {
    /// Progressing only: a new ReplicaSet was created.
    NewReplicaSetCreated,
    /// Progressing, not yet available, replica counters present, generation 1.
    ReplicaSetProgressing,
    /// Progressing complete, availability lost, no replica counters yet.
    AwaitingAvailability,
    /// Progressing complete, availability lost, replica counters present.
    AwaitingAvailabilityWithReplicas,
    /// Fully available on a freshly created Deployment.
    Available,
    /// Fully available on a Deployment that already existed.
    AvailableExisting,
    /// Still available while the spec replica count is lowered.
    ScalingDown,
    /// Scaled to zero; replica counters omitted.
    ScaledDown,
}

/// Result of resolving a modeled transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The target state carries no Deployment status.
    NoStatus,
    /// The target state is described by this stanza.
    Status(StatusTemplate),
}

/// Why a triple has no outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gap {
    /// Listed in the table as not yet modeled (the `Failed` family).
    Known,
    /// Not listed at all.
    Unlisted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error(
        "unimplemented transition: {previous} -> {current} (workspace_exists: {exists}, {gap:?})"
    )]
    Unimplemented { previous: WorkspaceState, current: WorkspaceState, exists: bool, gap: Gap },
}

#[derive(Debug, Clone, Copy)]
enum Rule {
    Modeled(StatusTemplate),
    Gap,
}

struct Row {
    previous: Option<WorkspaceState>,
    current: WorkspaceState,
    exists: Exists,
    rule: Rule,
}

const fn row(previous: WorkspaceState, current: WorkspaceState, exists: Exists, rule: Rule) -> Row {
    Row { previous: Some(previous), current, exists, rule }
}

use Rule::{Gap as G, Modeled as M};
use StatusTemplate as T;

/// First matching row wins.
const TABLE: &[Row] = &[
    row(CreationRequested, Starting, Exists::Any, M(T::NewReplicaSetCreated)),
    row(Starting, Starting, Exists::No, M(T::ReplicaSetProgressing)),
    row(Starting, Starting, Exists::Yes, M(T::AwaitingAvailabilityWithReplicas)),
    row(Starting, Running, Exists::No, M(T::Available)),
    row(Starting, Running, Exists::Yes, M(T::AvailableExisting)),
    row(Running, Stopping, Exists::Any, M(T::ScalingDown)),
    row(Stopping, Stopped, Exists::Any, M(T::ScaledDown)),
    row(Stopped, Starting, Exists::No, M(T::AwaitingAvailability)),
    row(Stopped, Starting, Exists::Yes, M(T::AwaitingAvailabilityWithReplicas)),
    row(Failed, Starting, Exists::Any, G),
    row(Failed, Stopping, Exists::Any, G),
    Row { previous: None, current: Failed, exists: Exists::Any, rule: G },
];

/// Resolve a reported transition to its status requirement.
pub fn resolve(
    previous: WorkspaceState,
    current: WorkspaceState,
    exists: bool,
) -> Result<TransitionOutcome, TransitionError> {
    if matches!(current, Terminating | Terminated | Unknown) {
        return Ok(TransitionOutcome::NoStatus);
    }

    let matched = TABLE.iter().find(|r| {
        r.previous.map_or(true, |p| p == previous) && r.current == current && r.exists.matches(exists)
    });

    match matched.map(|r| r.rule) {
        Some(Rule::Modeled(template)) => Ok(TransitionOutcome::Status(template)),
        Some(Rule::Gap) => {
            Err(TransitionError::Unimplemented { previous, current, exists, gap: Gap::Known })
        }
        None => {
            Err(TransitionError::Unimplemented { previous, current, exists, gap: Gap::Unlisted })
        }
    }
}

/// Every triple that resolves to a status stanza.
pub fn modeled() -> Vec<(WorkspaceState, WorkspaceState, bool, StatusTemplate)> {
    let mut out = Vec::new();
    for previous in WorkspaceState::ACTUAL {
        for current in WorkspaceState::ACTUAL {
            for exists in [false, true] {
                if let Ok(TransitionOutcome::Status(t)) = resolve(previous, current, exists) {
                    out.push((previous, current, exists, t));
                }
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "transition_tests.rs"]
mod tests;
