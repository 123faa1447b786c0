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

use super::records::{
    EventRecord, IngressRecord, NamespaceRecord, NodeRecord, PodDetail, PodRecord, PvRecord,
    PvcRecord,
};
use crate::shared::error::{JeraError, Result};
use k8s_openapi::api::core::v1::{
    Event, Namespace, Node, PersistentVolume, PersistentVolumeClaim, Pod,
};
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::ListParams;
use kube::{Api, Client};
use std::path::PathBuf;

/// Read access to the cluster objects the commands display.
#[async_trait::async_trait]
pub trait ClusterResourceProvider: Send + Sync {
    async fn list_namespaces(&self) -> Result<Vec<NamespaceRecord>>;

    /// Pods of one namespace, or of all namespaces when `None`.
    async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<PodRecord>>;

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<PodDetail>;

    async fn list_nodes(&self) -> Result<Vec<NodeRecord>>;

    async fn list_ingresses(&self, namespace: &str) -> Result<Vec<IngressRecord>>;

    async fn list_pod_events(&self, namespace: &str, pod: &str) -> Result<Vec<EventRecord>>;

    async fn list_pvcs(&self, namespace: Option<&str>) -> Result<Vec<PvcRecord>>;

    async fn list_pvs(&self) -> Result<Vec<PvRecord>>;
}

/// Provider backed by the Kubernetes API.
pub struct KubeClusterProvider {
    client: Client,
}

impl KubeClusterProvider {
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn new_with_config(
        kubeconfig_path: Option<PathBuf>,
        context: Option<String>,
    ) -> Result<Self> {
        use kube::config::{KubeConfigOptions, Kubeconfig};

        let kubeconfig = if let Some(path) = kubeconfig_path {
            Kubeconfig::read_from(path)
                .map_err(|e| JeraError::KubeError(format!("Failed to load kubeconfig: {}", e)))?
        } else {
            Kubeconfig::read()
                .map_err(|e| JeraError::KubeError(format!("Failed to load kubeconfig: {}", e)))?
        };

        let config_options = KubeConfigOptions {
            context,
            cluster: None,
            user: None,
        };

        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &config_options)
            .await
            .map_err(|e| {
                JeraError::KubeError(format!("Failed to create Kubernetes config: {}", e))
            })?;

        let client = Client::try_from(config).map_err(|e| {
            JeraError::KubeError(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self { client })
    }

    fn namespaced_or_all<K>(&self, namespace: Option<&str>) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }
}

fn convert<'a, K: 'a, R>(items: impl IntoIterator<Item = &'a K>) -> Result<Vec<R>>
where
    R: TryFrom<&'a K, Error = JeraError>,
{
    items.into_iter().map(R::try_from).collect()
}

#[async_trait::async_trait]
impl ClusterResourceProvider for KubeClusterProvider {
    async fn list_namespaces(&self) -> Result<Vec<NamespaceRecord>> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let list = api.list(&ListParams::default()).await?;
        let mut records: Vec<NamespaceRecord> = convert(&list.items)?;
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<PodRecord>> {
        let api: Api<Pod> = self.namespaced_or_all(namespace);
        let list = api.list(&ListParams::default()).await?;
        convert(&list.items)
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<PodDetail> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        match api.get(name).await {
            Ok(pod) => PodDetail::try_from(&pod),
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                Err(JeraError::not_found("Pod", name, format!("namespace '{}'", namespace)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_nodes(&self) -> Result<Vec<NodeRecord>> {
        let api: Api<Node> = Api::all(self.client.clone());
        let list = api.list(&ListParams::default()).await?;
        convert(&list.items)
    }

    async fn list_ingresses(&self, namespace: &str) -> Result<Vec<IngressRecord>> {
        let api: Api<Ingress> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&ListParams::default()).await?;
        convert(&list.items)
    }

    async fn list_pod_events(&self, namespace: &str, pod: &str) -> Result<Vec<EventRecord>> {
        let api: Api<Event> = Api::namespaced(self.client.clone(), namespace);
        let params = ListParams::default().fields(&format!("involvedObject.name={}", pod));
        let list = api.list(&params).await?;
        let mut events: Vec<EventRecord> = list.items.iter().map(EventRecord::from).collect();
        events.sort_by_key(|e| e.last_seen);
        Ok(events)
    }

    async fn list_pvcs(&self, namespace: Option<&str>) -> Result<Vec<PvcRecord>> {
        let api: Api<PersistentVolumeClaim> = self.namespaced_or_all(namespace);
        let list = api.list(&ListParams::default()).await?;
        convert(&list.items)
    }

    async fn list_pvs(&self) -> Result<Vec<PvRecord>> {
        let api: Api<PersistentVolume> = Api::all(self.client.clone());
        let list = api.list(&ListParams::default()).await?;
        convert(&list.items)
    }
}
