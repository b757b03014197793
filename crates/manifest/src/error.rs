// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Invalid input to manifest generation, or a rendering failure.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("replica count must be 0 or 1, got {0}")]
    InvalidReplicas(i32),

    #[error("file variable {key} targets reserved mount path {path}")]
    ReservedMountPath { key: String, path: String },

    #[error("file variable {key} must be mounted under {dir}, got {path}")]
    MountPathOutsideVariablesDir { key: String, path: String, dir: &'static str },

    #[error("file variables {first} and {second} both target {path}")]
    DuplicateMountPath { first: String, second: String, path: String },

    #[error("secret key {key} does not hold UTF-8 data")]
    InvalidSecretData { key: String },

    #[error("failed to render {kind}: {source}")]
    Render {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to render YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
