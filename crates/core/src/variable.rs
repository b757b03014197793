// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace variables.
//!
//! Env-var typed variables end up in the `{name}-env-var` Secret consumed via
//! `envFrom`; file typed variables end up in the `{name}-file` Secret, projected
//! into every container under [`VARIABLES_FILE_DIR`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mount point of the projected file-variables volume.
pub const VARIABLES_FILE_DIR: &str = "/.workspace-data/variables/file";

pub const GIT_CREDENTIAL_STORE_SCRIPT: &str = "gl_git_credential_store.sh";
pub const TOKEN_FILE: &str = "gl_token";

/// Keys always present in the env-var Secret.
pub const RESERVED_ENV_KEYS: &[&str] = &[
    "GIT_CONFIG_COUNT",
    "GIT_CONFIG_KEY_0",
    "GIT_CONFIG_VALUE_0",
    "GIT_CONFIG_KEY_1",
    "GIT_CONFIG_VALUE_1",
    "GIT_CONFIG_KEY_2",
    "GIT_CONFIG_VALUE_2",
    "GL_GIT_CREDENTIAL_STORE_FILE_PATH",
    "GL_TOKEN_FILE_PATH",
    "GL_WORKSPACE_DOMAIN_TEMPLATE",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    EnvVar,
    File,
}

crate::simple_display! {
    VariableType {
        EnvVar => "env_var",
        File => "file",
    }
}

/// A variable scoped to one workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceVariable {
    pub key: String,
    pub value: String,
    pub variable_type: VariableType,
    /// Absolute target path for file variables; defaults to
    /// `{VARIABLES_FILE_DIR}/{key}`. Ignored for env vars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_path: Option<String>,
}

impl WorkspaceVariable {
    pub fn env(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            variable_type: VariableType::EnvVar,
            mount_path: None,
        }
    }

    pub fn file(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            variable_type: VariableType::File,
            mount_path: None,
        }
    }

    crate::setters! {
        option {
            mount_path: String,
        }
    }

    /// Whether this is one of the variables from [`default_variables`].
    pub fn is_system(&self) -> bool {
        match self.variable_type {
            VariableType::EnvVar => RESERVED_ENV_KEYS.contains(&self.key.as_str()),
            VariableType::File => {
                self.key == TOKEN_FILE || self.key == GIT_CREDENTIAL_STORE_SCRIPT
            }
        }
    }

    /// Where a file variable appears inside the containers.
    pub fn target_path(&self) -> String {
        match &self.mount_path {
            Some(path) => path.clone(),
            None => format!("{}/{}", VARIABLES_FILE_DIR, self.key),
        }
    }
}

/// Env-var typed variables as a key/value map.
pub fn env_vars(variables: &[WorkspaceVariable]) -> BTreeMap<String, String> {
    variables
        .iter()
        .filter(|v| v.variable_type == VariableType::EnvVar)
        .map(|v| (v.key.clone(), v.value.clone()))
        .collect()
}

/// File typed variables, in input order.
pub fn file_vars(variables: &[WorkspaceVariable]) -> Vec<&WorkspaceVariable> {
    variables.iter().filter(|v| v.variable_type == VariableType::File).collect()
}

/// Layer `overrides` on `base`; a variable of the same type and key replaces
/// the base entry.
pub fn merge_variables(
    mut base: Vec<WorkspaceVariable>,
    overrides: Vec<WorkspaceVariable>,
) -> Vec<WorkspaceVariable> {
    for var in overrides {
        base.retain(|v| !(v.variable_type == var.variable_type && v.key == var.key));
        base.push(var);
    }
    base
}

/// Identity of the user owning a workspace, used for git configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub name: String,
    pub email: String,
}

/// System variables every workspace receives.
pub fn default_variables(
    workspace_name: &str,
    dns_zone: &str,
    user: &UserIdentity,
    personal_access_token: &str,
) -> Vec<WorkspaceVariable> {
    let store_script = format!("{}/{}", VARIABLES_FILE_DIR, GIT_CREDENTIAL_STORE_SCRIPT);
    let token_file = format!("{}/{}", VARIABLES_FILE_DIR, TOKEN_FILE);
    vec![
        WorkspaceVariable::file(TOKEN_FILE, personal_access_token),
        WorkspaceVariable::file(GIT_CREDENTIAL_STORE_SCRIPT, credential_store_script()),
        WorkspaceVariable::env("GIT_CONFIG_COUNT", "3"),
        WorkspaceVariable::env("GIT_CONFIG_KEY_0", "credential.helper"),
        WorkspaceVariable::env("GIT_CONFIG_VALUE_0", store_script.clone()),
        WorkspaceVariable::env("GIT_CONFIG_KEY_1", "user.name"),
        WorkspaceVariable::env("GIT_CONFIG_VALUE_1", user.name.clone()),
        WorkspaceVariable::env("GIT_CONFIG_KEY_2", "user.email"),
        WorkspaceVariable::env("GIT_CONFIG_VALUE_2", user.email.clone()),
        WorkspaceVariable::env("GL_GIT_CREDENTIAL_STORE_FILE_PATH", store_script),
        WorkspaceVariable::env("GL_TOKEN_FILE_PATH", token_file),
        WorkspaceVariable::env(
            "GL_WORKSPACE_DOMAIN_TEMPLATE",
            format!("${{PORT}}-{}.{}", workspace_name, dns_zone),
        ),
    ]
}

fn credential_store_script() -> String {
    [
        "#!/bin/sh",
        "# This is a readonly store so we can exit cleanly when git attempts a store or erase action",
        "if [ \"$1\" != \"get\" ];",
        "then",
        "  exit 0",
        "fi",
        "",
        "if [ -z \"${GL_TOKEN_FILE_PATH}\" ];",
        "then",
        "  echo \"We could not find the GL_TOKEN_FILE_PATH variable\"",
        "  exit 1",
        "fi",
        "password=$(cat ${GL_TOKEN_FILE_PATH})",
        "",
        "# The username is derived from the \"user.email\" configuration item. Ensure it is set.",
        "echo \"username=does-not-matter\"",
        "echo \"password=${password}\"",
        "exit 0",
        "",
    ]
    .join("\n")
}

#[cfg(test)]
#[path = "variable_tests.rs"]
mod tests;
