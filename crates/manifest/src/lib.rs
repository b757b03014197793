// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rdev-manifest: Kubernetes object graph for a workspace.
//!
//! [`build`] turns [`ManifestParams`] into an ordered [`ManifestSet`]. Output
//! is a pure function of the params: the same params always render the same
//! YAML stream byte for byte.

mod error;
mod manifest;
mod meta;
mod network_policy;
mod params;
mod secrets;
mod workload;

pub use error::ManifestError;
pub use manifest::{build, parse_yaml_stream, Manifest, ManifestSet, Render};
pub use meta::{
    host_template, AGENT_ID_LABEL, HOST_TEMPLATE_ANNOTATION, INVENTORY_ID_LABEL,
    OWNING_INVENTORY_ANNOTATION, WORKSPACE_ID_ANNOTATION,
};
pub use params::{
    FileVariable, ManifestParams, ResourceGroups, DATA_VOLUME, EDITOR_PORT, PROJECTS_ROOT,
    SSH_PORT, VARIABLES_VOLUME,
};
pub use secrets::{decode_secret_data, encode_env_data};
