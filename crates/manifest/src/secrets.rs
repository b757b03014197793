// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Variable Secrets.
//!
//! Secret `data` is base64 on the wire; `ByteString` does the encoding when
//! the object is serialized.

use crate::error::ManifestError;
use crate::meta::owned_meta;
use crate::params::ManifestParams;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use rdev_core::variable::RESERVED_ENV_KEYS;
use std::collections::BTreeMap;

/// Secret data for env-var variables, one entry per variable.
pub fn encode_env_data(env: &BTreeMap<String, String>) -> BTreeMap<String, ByteString> {
    env.iter().map(|(key, value)| (key.clone(), ByteString(value.as_bytes().to_vec()))).collect()
}

/// Env vars with every reserved key present.
///
/// Workspaces created through `Workspace::create` already carry them; a
/// missing one is sent as an empty string so consumers can rely on the key
/// set.
fn with_reserved_keys(env: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut env = env.clone();
    for key in RESERVED_ENV_KEYS {
        env.entry((*key).to_string()).or_default();
    }
    env
}

/// Decode a Secret's data back into strings.
pub fn decode_secret_data(secret: &Secret) -> Result<BTreeMap<String, String>, ManifestError> {
    let Some(data) = &secret.data else {
        return Ok(BTreeMap::new());
    };
    data.iter()
        .map(|(key, value)| {
            String::from_utf8(value.0.clone())
                .map(|s| (key.clone(), s))
                .map_err(|_| ManifestError::InvalidSecretData { key: key.clone() })
        })
        .collect()
}

pub(crate) fn env_secret(params: &ManifestParams) -> Secret {
    Secret {
        metadata: owned_meta(params, params.env_secret_name(), &params.secrets_inventory_name()),
        data: Some(encode_env_data(&with_reserved_keys(&params.env_vars))),
        type_: Some("Opaque".to_string()),
        ..Default::default()
    }
}

pub(crate) fn file_secret(params: &ManifestParams) -> Secret {
    let data = params
        .file_vars
        .iter()
        .map(|v| (v.key.clone(), ByteString(v.value.as_bytes().to_vec())))
        .collect();
    Secret {
        metadata: owned_meta(params, params.file_secret_name(), &params.secrets_inventory_name()),
        data: Some(data),
        type_: Some("Opaque".to_string()),
        ..Default::default()
    }
}
