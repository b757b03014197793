// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

/// Proptest strategies for core domain types.
pub mod strategies {
    use crate::state::WorkspaceState;
    use crate::variable::WorkspaceVariable;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    pub fn arb_actual_state() -> impl Strategy<Value = WorkspaceState> {
        proptest::sample::select(WorkspaceState::ACTUAL.to_vec())
    }

    pub fn arb_desired_state() -> impl Strategy<Value = WorkspaceState> {
        prop_oneof![
            Just(WorkspaceState::Running),
            Just(WorkspaceState::Stopped),
            Just(WorkspaceState::Terminated),
            Just(WorkspaceState::RestartRequested),
        ]
    }

    /// Env-var keys as Kubernetes accepts them in a Secret.
    pub fn arb_env_key() -> impl Strategy<Value = String> {
        "[A-Z][A-Z0-9_]{0,15}"
    }

    /// Arbitrary env-var map; values may be empty.
    pub fn arb_env_map() -> impl Strategy<Value = BTreeMap<String, String>> {
        proptest::collection::btree_map(arb_env_key(), "[ -~]{0,12}", 0..8)
    }

    pub fn arb_variables() -> impl Strategy<Value = Vec<WorkspaceVariable>> {
        proptest::collection::vec(
            prop_oneof![
                (arb_env_key(), "[ -~]{0,12}").prop_map(|(k, v)| WorkspaceVariable::env(k, v)),
                ("[a-z][a-z0-9_]{0,10}", "[ -~]{0,12}")
                    .prop_map(|(k, v)| WorkspaceVariable::file(k, v)),
            ],
            0..5,
        )
        .prop_map(|vars| {
            // File targets must be unique.
            let mut seen = std::collections::HashSet::new();
            vars.into_iter().filter(|v| seen.insert((v.variable_type, v.key.clone()))).collect()
        })
    }
}
