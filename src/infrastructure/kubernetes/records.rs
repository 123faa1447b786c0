// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Typed views of the Kubernetes objects the commands display.
//!
//! Conversions fail with [`JeraError::MalformedResponse`] when a field the
//! tables depend on (the object name) is absent. Everything else is optional
//! and shown as `<none>` or `-`.

use crate::domain::usage::{
    ContainerResourceSpec, NodeCapacity, PodResourceProfile, ResourceStrings, Resources,
};
use crate::domain::quantity::{parse_optional, ResourceKind};
use crate::shared::error::{JeraError, Result};
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{
    Container, ContainerStatus, Event, Namespace, Node, PersistentVolume, PersistentVolumeClaim,
    Pod, ResourceRequirements,
};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use std::collections::BTreeMap;

/// Label prefix carrying node roles.
pub const NODE_ROLE_LABEL_PREFIX: &str = "node-role.kubernetes.io/";

fn required_name(meta: &ObjectMeta, kind: &str) -> Result<String> {
    meta.name
        .clone()
        .ok_or_else(|| JeraError::malformed(kind, "object without metadata.name"))
}

fn time(t: &Option<Time>) -> Option<DateTime<Utc>> {
    t.as_ref().map(|t| t.0)
}

fn quantity(map: &Option<BTreeMap<String, Quantity>>, key: &str) -> Option<String> {
    map.as_ref().and_then(|m| m.get(key)).map(|q| q.0.clone())
}

fn resource_strings(map: &Option<BTreeMap<String, Quantity>>) -> ResourceStrings {
    ResourceStrings {
        cpu: quantity(map, "cpu"),
        memory: quantity(map, "memory"),
    }
}

fn container_spec(container: &Container) -> ContainerResourceSpec {
    let resources = container.resources.clone().unwrap_or_default();
    let ResourceRequirements {
        requests, limits, ..
    } = resources;
    ContainerResourceSpec {
        name: container.name.clone(),
        requests: resource_strings(&requests),
        limits: resource_strings(&limits),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceRecord {
    pub name: String,
    pub phase: String,
    pub created: Option<DateTime<Utc>>,
}

impl TryFrom<&Namespace> for NamespaceRecord {
    type Error = JeraError;

    fn try_from(ns: &Namespace) -> Result<Self> {
        Ok(Self {
            name: required_name(&ns.metadata, "Namespace")?,
            phase: ns
                .status
                .as_ref()
                .and_then(|s| s.phase.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            created: time(&ns.metadata.creation_timestamp),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PodRecord {
    pub name: String,
    pub namespace: String,
    pub node: Option<String>,
    pub phase: String,
    pub pod_ip: Option<String>,
    pub ready_containers: usize,
    pub total_containers: usize,
    pub restarts: u32,
    pub created: Option<DateTime<Utc>>,
    pub started: Option<DateTime<Utc>>,
    pub containers: Vec<ContainerResourceSpec>,
}

impl PodRecord {
    /// Succeeded and Failed pods no longer hold resources.
    pub fn is_terminated(&self) -> bool {
        matches!(self.phase.as_str(), "Succeeded" | "Failed")
    }

    pub fn is_ready(&self) -> bool {
        self.total_containers > 0 && self.ready_containers == self.total_containers
    }

    pub fn profile(&self) -> Result<PodResourceProfile> {
        PodResourceProfile::from_containers(
            self.name.clone(),
            self.namespace.clone(),
            self.node.clone(),
            &self.containers,
        )
    }
}

impl TryFrom<&Pod> for PodRecord {
    type Error = JeraError;

    fn try_from(pod: &Pod) -> Result<Self> {
        let name = required_name(&pod.metadata, "Pod")?;
        let spec = pod.spec.clone().unwrap_or_default();
        let status = pod.status.clone().unwrap_or_default();
        let statuses = status.container_statuses.clone().unwrap_or_default();

        Ok(Self {
            name,
            namespace: pod.metadata.namespace.clone().unwrap_or_default(),
            node: spec.node_name.clone(),
            phase: status.phase.clone().unwrap_or_else(|| "Unknown".to_string()),
            pod_ip: status.pod_ip.clone(),
            ready_containers: statuses.iter().filter(|s| s.ready).count(),
            total_containers: spec.containers.len(),
            restarts: statuses
                .iter()
                .map(|s| s.restart_count.max(0) as u32)
                .sum(),
            created: time(&pod.metadata.creation_timestamp),
            started: time(&status.start_time),
            containers: spec.containers.iter().map(container_spec).collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionRecord {
    pub condition_type: String,
    pub status: String,
    pub last_transition: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContainerDetail {
    pub name: String,
    pub image: String,
    pub requests: ResourceStrings,
    pub limits: ResourceStrings,
    pub ready: bool,
    pub restart_count: u32,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeRecord {
    pub name: String,
    pub kind: String,
}

/// Where a pod references a secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretReference {
    pub name: String,
    pub source: String,
    pub optional: bool,
}

/// Everything `describe` shows about a pod.
#[derive(Debug, Clone, PartialEq)]
pub struct PodDetail {
    pub pod: PodRecord,
    pub host_ip: Option<String>,
    pub qos_class: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub conditions: Vec<ConditionRecord>,
    pub containers: Vec<ContainerDetail>,
    pub volumes: Vec<VolumeRecord>,
    pub secrets: Vec<SecretReference>,
}

fn container_state(status: Option<&ContainerStatus>) -> String {
    let Some(state) = status.and_then(|s| s.state.as_ref()) else {
        return "Unknown".to_string();
    };
    if state.running.is_some() {
        "Running".to_string()
    } else if let Some(waiting) = &state.waiting {
        format!(
            "Waiting ({})",
            waiting.reason.as_deref().unwrap_or("unknown")
        )
    } else if let Some(terminated) = &state.terminated {
        format!(
            "Terminated ({})",
            terminated.reason.as_deref().unwrap_or("unknown")
        )
    } else {
        "Unknown".to_string()
    }
}

/// Name of the first populated source field of a volume, e.g. `configMap`.
fn volume_kind(value: &serde_json::Value) -> String {
    value
        .as_object()
        .and_then(|o| o.keys().find(|k| k.as_str() != "name").cloned())
        .unwrap_or_else(|| "unknown".to_string())
}

fn json_str<'a>(value: &'a serde_json::Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(|v| v.as_str())
}

fn json_bool(value: &serde_json::Value, pointer: &str) -> bool {
    value
        .pointer(pointer)
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

/// Secrets mounted as volumes or pulled into the environment.
fn secret_references(spec: &serde_json::Value) -> Vec<SecretReference> {
    let mut refs = Vec::new();
    let empty = Vec::new();

    let volumes = spec
        .get("volumes")
        .and_then(|v| v.as_array())
        .unwrap_or(&empty);
    for volume in volumes {
        if let Some(name) = json_str(volume, "/secret/secretName") {
            refs.push(SecretReference {
                name: name.to_string(),
                source: format!(
                    "volume {}",
                    json_str(volume, "/name").unwrap_or_default()
                ),
                optional: json_bool(volume, "/secret/optional"),
            });
        }
    }

    let containers = spec
        .get("containers")
        .and_then(|v| v.as_array())
        .unwrap_or(&empty);
    for container in containers {
        let container_name = json_str(container, "/name").unwrap_or_default();
        let env = container
            .get("env")
            .and_then(|v| v.as_array())
            .unwrap_or(&empty);
        for var in env {
            if let Some(name) = json_str(var, "/valueFrom/secretKeyRef/name") {
                refs.push(SecretReference {
                    name: name.to_string(),
                    source: format!(
                        "env {} ({})",
                        json_str(var, "/name").unwrap_or_default(),
                        container_name
                    ),
                    optional: json_bool(var, "/valueFrom/secretKeyRef/optional"),
                });
            }
        }

        let env_from = container
            .get("envFrom")
            .and_then(|v| v.as_array())
            .unwrap_or(&empty);
        for source in env_from {
            if let Some(name) = json_str(source, "/secretRef/name") {
                refs.push(SecretReference {
                    name: name.to_string(),
                    source: format!("envFrom ({})", container_name),
                    optional: json_bool(source, "/secretRef/optional"),
                });
            }
        }
    }

    refs
}

impl TryFrom<&Pod> for PodDetail {
    type Error = JeraError;

    fn try_from(pod: &Pod) -> Result<Self> {
        let record = PodRecord::try_from(pod)?;
        let spec = pod.spec.clone().unwrap_or_default();
        let status = pod.status.clone().unwrap_or_default();
        let statuses = status.container_statuses.clone().unwrap_or_default();
        let spec_json = serde_json::to_value(&spec)?;

        let containers = spec
            .containers
            .iter()
            .map(|c| {
                let status = statuses.iter().find(|s| s.name == c.name);
                let resources = container_spec(c);
                ContainerDetail {
                    name: c.name.clone(),
                    image: c.image.clone().unwrap_or_default(),
                    requests: resources.requests,
                    limits: resources.limits,
                    ready: status.map(|s| s.ready).unwrap_or(false),
                    restart_count: status.map(|s| s.restart_count.max(0) as u32).unwrap_or(0),
                    state: container_state(status),
                }
            })
            .collect();

        let volumes = spec_json
            .get("volumes")
            .and_then(|v| v.as_array())
            .map(|vs| {
                vs.iter()
                    .map(|v| VolumeRecord {
                        name: json_str(v, "/name").unwrap_or_default().to_string(),
                        kind: volume_kind(v),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let conditions = status
            .conditions
            .clone()
            .unwrap_or_default()
            .into_iter()
            .map(|c| ConditionRecord {
                condition_type: c.type_,
                status: c.status,
                last_transition: time(&c.last_transition_time),
            })
            .collect();

        Ok(Self {
            pod: record,
            host_ip: status.host_ip.clone(),
            qos_class: status.qos_class.clone(),
            labels: pod.metadata.labels.clone().unwrap_or_default(),
            conditions,
            containers,
            volumes,
            secrets: secret_references(&spec_json),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub name: String,
    pub ready: bool,
    pub roles: Vec<String>,
    pub kubelet_version: String,
    pub allocatable_cpu: Option<String>,
    pub allocatable_memory: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

impl NodeRecord {
    pub fn capacity(&self) -> Result<NodeCapacity> {
        Ok(NodeCapacity {
            name: self.name.clone(),
            allocatable: Resources::new(
                parse_optional(self.allocatable_cpu.as_deref(), ResourceKind::Cpu)?,
                parse_optional(self.allocatable_memory.as_deref(), ResourceKind::Memory)?,
            ),
        })
    }
}

/// Roles from `node-role.kubernetes.io/<role>` labels, `worker` when none.
pub fn node_roles(labels: &BTreeMap<String, String>) -> Vec<String> {
    let roles: Vec<String> = labels
        .keys()
        .filter_map(|k| k.strip_prefix(NODE_ROLE_LABEL_PREFIX))
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();
    if roles.is_empty() {
        vec!["worker".to_string()]
    } else {
        roles
    }
}

impl TryFrom<&Node> for NodeRecord {
    type Error = JeraError;

    fn try_from(node: &Node) -> Result<Self> {
        let name = required_name(&node.metadata, "Node")?;
        let status = node.status.clone().unwrap_or_default();
        let ready = status
            .conditions
            .unwrap_or_default()
            .iter()
            .any(|c| c.type_ == "Ready" && c.status == "True");

        Ok(Self {
            name,
            ready,
            roles: node_roles(&node.metadata.labels.clone().unwrap_or_default()),
            kubelet_version: status
                .node_info
                .map(|i| i.kubelet_version)
                .unwrap_or_default(),
            allocatable_cpu: quantity(&status.allocatable, "cpu"),
            allocatable_memory: quantity(&status.allocatable, "memory"),
            created: time(&node.metadata.creation_timestamp),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressRuleRecord {
    pub host: String,
    pub path: String,
    pub service: String,
    pub port: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngressRecord {
    pub name: String,
    pub namespace: String,
    pub hosts: Vec<String>,
    pub tls_hosts: Vec<String>,
    pub rules: Vec<IngressRuleRecord>,
    pub load_balancer: Vec<String>,
    pub created: Option<DateTime<Utc>>,
}

impl IngressRecord {
    /// `80`, plus `443` when TLS is configured.
    pub fn ports(&self) -> String {
        if self.tls_hosts.is_empty() {
            "80".to_string()
        } else {
            "80, 443".to_string()
        }
    }
}

impl TryFrom<&Ingress> for IngressRecord {
    type Error = JeraError;

    fn try_from(ingress: &Ingress) -> Result<Self> {
        let name = required_name(&ingress.metadata, "Ingress")?;
        let spec = ingress.spec.clone().unwrap_or_default();

        let mut hosts = Vec::new();
        let mut rules = Vec::new();
        for rule in spec.rules.unwrap_or_default() {
            let host = rule.host.clone().unwrap_or_else(|| "*".to_string());
            if !hosts.contains(&host) {
                hosts.push(host.clone());
            }
            for path in rule.http.map(|h| h.paths).unwrap_or_default() {
                let backend = path.backend.service;
                rules.push(IngressRuleRecord {
                    host: host.clone(),
                    path: path.path.unwrap_or_else(|| "/".to_string()),
                    service: backend
                        .as_ref()
                        .map(|s| s.name.clone())
                        .unwrap_or_else(|| "-".to_string()),
                    port: backend
                        .and_then(|s| s.port)
                        .and_then(|p| p.number.map(|n| n.to_string()).or(p.name))
                        .unwrap_or_else(|| "-".to_string()),
                });
            }
        }

        let tls_hosts = spec
            .tls
            .unwrap_or_default()
            .into_iter()
            .flat_map(|t| t.hosts.unwrap_or_default())
            .collect();

        let load_balancer = ingress
            .status
            .clone()
            .and_then(|s| s.load_balancer)
            .and_then(|lb| lb.ingress)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|i| i.hostname.or(i.ip))
            .collect();

        Ok(Self {
            name,
            namespace: ingress.metadata.namespace.clone().unwrap_or_default(),
            hosts,
            tls_hosts,
            rules,
            load_balancer,
            created: time(&ingress.metadata.creation_timestamp),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub event_type: String,
    pub reason: String,
    pub message: String,
    pub source: String,
    pub last_seen: Option<DateTime<Utc>>,
}

impl From<&Event> for EventRecord {
    fn from(event: &Event) -> Self {
        Self {
            event_type: event.type_.clone().unwrap_or_else(|| "Normal".to_string()),
            reason: event.reason.clone().unwrap_or_default(),
            message: event.message.clone().unwrap_or_default(),
            source: event
                .source
                .as_ref()
                .and_then(|s| s.component.clone())
                .unwrap_or_default(),
            last_seen: time(&event.last_timestamp)
                .or_else(|| time(&event.first_timestamp))
                .or_else(|| time(&event.metadata.creation_timestamp)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PvcRecord {
    pub name: String,
    pub namespace: String,
    pub phase: String,
    pub volume: Option<String>,
    pub capacity: Option<String>,
    pub access_modes: Vec<String>,
    pub storage_class: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

impl TryFrom<&PersistentVolumeClaim> for PvcRecord {
    type Error = JeraError;

    fn try_from(pvc: &PersistentVolumeClaim) -> Result<Self> {
        let name = required_name(&pvc.metadata, "PersistentVolumeClaim")?;
        let spec = pvc.spec.clone().unwrap_or_default();
        let status = pvc.status.clone().unwrap_or_default();

        Ok(Self {
            name,
            namespace: pvc.metadata.namespace.clone().unwrap_or_default(),
            phase: status.phase.unwrap_or_else(|| "Unknown".to_string()),
            volume: spec.volume_name,
            capacity: quantity(&status.capacity, "storage"),
            access_modes: spec.access_modes.unwrap_or_default(),
            storage_class: spec.storage_class_name,
            created: time(&pvc.metadata.creation_timestamp),
        })
    }
}

/// PV spec fields that are not a volume source.
const PV_SPEC_FIELDS: &[&str] = &[
    "accessModes",
    "capacity",
    "claimRef",
    "mountOptions",
    "nodeAffinity",
    "persistentVolumeReclaimPolicy",
    "storageClassName",
    "volumeAttributesClassName",
    "volumeMode",
];

#[derive(Debug, Clone, PartialEq)]
pub struct PvRecord {
    pub name: String,
    pub phase: String,
    pub capacity: Option<String>,
    pub access_modes: Vec<String>,
    pub storage_class: Option<String>,
    pub reclaim_policy: Option<String>,
    pub claim_namespace: Option<String>,
    pub claim_name: Option<String>,
    pub volume_type: String,
    pub created: Option<DateTime<Utc>>,
}

impl TryFrom<&PersistentVolume> for PvRecord {
    type Error = JeraError;

    fn try_from(pv: &PersistentVolume) -> Result<Self> {
        let name = required_name(&pv.metadata, "PersistentVolume")?;
        let spec = pv.spec.clone().unwrap_or_default();
        let spec_json = serde_json::to_value(&spec)?;
        let volume_type = spec_json
            .as_object()
            .and_then(|o| {
                o.keys()
                    .find(|k| !PV_SPEC_FIELDS.contains(&k.as_str()))
                    .cloned()
            })
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Self {
            name,
            phase: pv
                .status
                .as_ref()
                .and_then(|s| s.phase.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            capacity: quantity(&spec.capacity, "storage"),
            access_modes: spec.access_modes.clone().unwrap_or_default(),
            storage_class: spec.storage_class_name.clone(),
            reclaim_policy: spec.persistent_volume_reclaim_policy.clone(),
            claim_namespace: spec.claim_ref.as_ref().and_then(|c| c.namespace.clone()),
            claim_name: spec.claim_ref.as_ref().and_then(|c| c.name.clone()),
            volume_type,
            created: time(&pv.metadata.creation_timestamp),
        })
    }
}
