// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deployment, Service and PersistentVolumeClaim for a workspace.

use crate::meta::{agent_labels, owned_meta};
use crate::params::{
    ManifestParams, DATA_VOLUME, EDITOR_PORT, EDITOR_VOLUME_DIR, PROJECTS_ROOT, SSH_PORT,
    VARIABLES_VOLUME,
};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStrategy};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvFromSource, EnvVar, KeyToPath, PersistentVolumeClaim,
    PersistentVolumeClaimSpec, PersistentVolumeClaimVolumeSource, PodSecurityContext, PodSpec,
    PodTemplateSpec, ProjectedVolumeSource, ResourceRequirements, SecretEnvSource,
    SecretProjection, SecurityContext, Service, ServicePort, ServiceSpec, Volume, VolumeMount,
    VolumeProjection, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use rdev_core::variable::VARIABLES_FILE_DIR;
use std::collections::BTreeMap;

const RUN_AS_USER: i64 = 5001;
const STORAGE_REQUEST: &str = "15Gi";

const TOOLING_IMAGE: &str = "quay.io/mloriedo/universal-developer-image:ubi8-dw-demo";
const CLONER_IMAGE: &str = "alpine/git:2.36.3";
const INJECTOR_IMAGE: &str =
    "registry.gitlab.com/gitlab-org/gitlab-web-ide-vscode-fork/web-ide-injector:1";

pub(crate) fn deployment(params: &ManifestParams) -> Deployment {
    let inventory = params.inventory_name();
    let labels = agent_labels(params);

    let main = Container {
        name: "tooling-container".to_string(),
        image: Some(TOOLING_IMAGE.to_string()),
        command: Some(vec![format!("{}/start_server.sh", EDITOR_VOLUME_DIR)]),
        env: Some(editor_env()),
        ports: Some(vec![
            container_port("editor-server", EDITOR_PORT),
            container_port("ssh-server", SSH_PORT),
        ]),
        ..base_container(params)
    };

    let cloner = Container {
        name: "gl-cloner-injector-gl-cloner-injector-command-1".to_string(),
        image: Some(CLONER_IMAGE.to_string()),
        command: Some(vec!["/bin/sh".to_string(), "-c".to_string()]),
        args: Some(vec![clone_script(params)]),
        env: Some(project_env()),
        resources: Some(init_resources()),
        ..base_container(params)
    };

    let injector = Container {
        name: "gl-editor-injector-gl-editor-injector-command-2".to_string(),
        image: Some(INJECTOR_IMAGE.to_string()),
        env: Some(editor_env()),
        resources: Some(init_resources()),
        ..base_container(params)
    };

    let pod_spec = PodSpec {
        containers: vec![main],
        init_containers: Some(vec![cloner, injector]),
        volumes: Some(vec![
            Volume {
                name: DATA_VOLUME.to_string(),
                persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                    claim_name: params.claim_name(),
                    ..Default::default()
                }),
                ..Default::default()
            },
            variables_volume(params),
        ]),
        security_context: Some(PodSecurityContext {
            run_as_non_root: Some(true),
            run_as_user: Some(RUN_AS_USER),
            fs_group: Some(0),
            fs_group_change_policy: Some("OnRootMismatch".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    };

    Deployment {
        metadata: owned_meta(params, params.name.clone(), &inventory),
        spec: Some(DeploymentSpec {
            replicas: Some(params.replicas),
            selector: LabelSelector { match_labels: Some(labels), ..Default::default() },
            strategy: Some(DeploymentStrategy {
                type_: Some("Recreate".to_string()),
                ..Default::default()
            }),
            template: PodTemplateSpec {
                metadata: Some(owned_meta(params, params.name.clone(), &inventory)),
                spec: Some(pod_spec),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub(crate) fn service(params: &ManifestParams) -> Service {
    Service {
        metadata: owned_meta(params, params.name.clone(), &params.inventory_name()),
        spec: Some(ServiceSpec {
            ports: Some(vec![
                service_port("editor-server", EDITOR_PORT),
                service_port("ssh-server", SSH_PORT),
            ]),
            selector: Some(agent_labels(params)),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub(crate) fn persistent_volume_claim(params: &ManifestParams) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: owned_meta(params, params.claim_name(), &params.inventory_name()),
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(
                    [("storage".to_string(), Quantity(STORAGE_REQUEST.to_string()))]
                        .into_iter()
                        .collect(),
                ),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Shared by all three containers so every process sees the same variables.
fn base_container(params: &ManifestParams) -> Container {
    Container {
        image_pull_policy: Some("Always".to_string()),
        env_from: Some(vec![EnvFromSource {
            secret_ref: Some(SecretEnvSource {
                name: params.env_secret_name(),
                ..Default::default()
            }),
            ..Default::default()
        }]),
        volume_mounts: Some(vec![
            VolumeMount {
                name: DATA_VOLUME.to_string(),
                mount_path: PROJECTS_ROOT.to_string(),
                ..Default::default()
            },
            VolumeMount {
                name: VARIABLES_VOLUME.to_string(),
                mount_path: VARIABLES_FILE_DIR.to_string(),
                ..Default::default()
            },
        ]),
        security_context: Some(SecurityContext {
            allow_privilege_escalation: Some(false),
            privileged: Some(false),
            run_as_non_root: Some(true),
            run_as_user: Some(RUN_AS_USER),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn variables_volume(params: &ManifestParams) -> Volume {
    let items: Vec<KeyToPath> = params
        .file_vars
        .iter()
        .map(|v| KeyToPath {
            key: v.key.clone(),
            path: v.relative_path().to_string(),
            ..Default::default()
        })
        .collect();
    Volume {
        name: VARIABLES_VOLUME.to_string(),
        projected: Some(ProjectedVolumeSource {
            default_mode: Some(0o774),
            sources: Some(vec![VolumeProjection {
                secret: Some(SecretProjection {
                    name: params.file_secret_name(),
                    items: if items.is_empty() { None } else { Some(items) },
                    ..Default::default()
                }),
                ..Default::default()
            }]),
        }),
        ..Default::default()
    }
}

fn clone_script(params: &ManifestParams) -> String {
    let dir = format!("{}/{}", PROJECTS_ROOT, params.project.directory);
    format!(
        "if [ ! -d '{dir}' ];\nthen\n  git clone --branch {git_ref} {url} {dir};\nfi",
        dir = dir,
        git_ref = params.project.git_ref,
        url = params.project.clone_url,
    )
}

fn project_env() -> Vec<EnvVar> {
    vec![env_var("PROJECTS_ROOT", PROJECTS_ROOT), env_var("PROJECT_SOURCE", PROJECTS_ROOT)]
}

fn editor_env() -> Vec<EnvVar> {
    let mut env = vec![
        env_var("EDITOR_VOLUME_DIR", EDITOR_VOLUME_DIR),
        env_var("EDITOR_PORT", &EDITOR_PORT.to_string()),
        env_var("SSH_PORT", &SSH_PORT.to_string()),
    ];
    env.extend(project_env());
    env
}

fn init_resources() -> ResourceRequirements {
    let quantities = |cpu: &str, memory: &str| -> BTreeMap<String, Quantity> {
        [("cpu".to_string(), Quantity(cpu.to_string())), ("memory".to_string(), Quantity(memory.to_string()))]
            .into_iter()
            .collect()
    };
    ResourceRequirements {
        limits: Some(quantities("500m", "128Mi")),
        requests: Some(quantities("30m", "32Mi")),
        ..Default::default()
    }
}

fn container_port(name: &str, port: i32) -> ContainerPort {
    ContainerPort {
        name: Some(name.to_string()),
        container_port: port,
        protocol: Some("TCP".to_string()),
        ..Default::default()
    }
}

fn service_port(name: &str, port: i32) -> ServicePort {
    ServicePort {
        name: Some(name.to_string()),
        port,
        target_port: Some(IntOrString::Int(port)),
        ..Default::default()
    }
}

fn env_var(name: &str, value: &str) -> EnvVar {
    EnvVar { name: name.to_string(), value: Some(value.to_string()), ..Default::default() }
}
