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

//! Persisted current selection (namespace, cluster, cloud).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Cloud the current cluster lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CloudKind {
    #[default]
    Aws,
    Azure,
}

impl CloudKind {
    pub fn toggled(self) -> Self {
        match self {
            CloudKind::Aws => CloudKind::Azure,
            CloudKind::Azure => CloudKind::Aws,
        }
    }
}

impl fmt::Display for CloudKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudKind::Aws => write!(f, "aws"),
            CloudKind::Azure => write!(f, "azure"),
        }
    }
}

impl FromStr for CloudKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aws" | "eks" => Ok(CloudKind::Aws),
            "azure" | "aks" => Ok(CloudKind::Azure),
            _ => Err(format!("Unknown cloud type: {}", s)),
        }
    }
}

/// EKS cluster selected by `init` or `use-cluster`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsClusterSelection {
    pub name: String,
    pub region: String,
    pub profile: String,
}

/// Contents of the state file.
///
/// Keys this tool does not know about are kept in `extra` so a rewrite
/// never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JeraConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_cluster: Option<AwsClusterSelection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_type: Option<CloudKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure_cluster: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure_resource_group: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure_subscription: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl JeraConfig {
    pub fn cloud_kind(&self) -> CloudKind {
        self.current_type.unwrap_or_default()
    }

    pub fn select_aws_cluster(&mut self, selection: AwsClusterSelection) {
        self.current_cluster = Some(selection);
        self.current_type = Some(CloudKind::Aws);
    }

    pub fn select_azure_cluster(
        &mut self,
        cluster: impl Into<String>,
        resource_group: impl Into<String>,
        subscription: Option<String>,
    ) {
        self.azure_cluster = Some(cluster.into());
        self.azure_resource_group = Some(resource_group.into());
        if subscription.is_some() {
            self.azure_subscription = subscription;
        }
        self.current_type = Some(CloudKind::Azure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_keys_survive() {
        let yaml = "namespace: prod\ntheme: dark\nnested:\n  a: 1\n";
        let config: JeraConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.namespace.as_deref(), Some("prod"));
        assert!(config.extra.contains_key("theme"));

        let written = serde_yaml::to_string(&config).unwrap();
        let reread: JeraConfig = serde_yaml::from_str(&written).unwrap();
        assert_eq!(reread, config);
    }

    #[test]
    fn test_cloud_kind_serialization() {
        let mut config = JeraConfig::default();
        config.select_azure_cluster("aks-prod", "rg-prod", Some("sub-1".to_string()));
        let written = serde_yaml::to_string(&config).unwrap();
        assert!(written.contains("current_type: azure"));
        assert_eq!(config.cloud_kind(), CloudKind::Azure);
        assert_eq!(JeraConfig::default().cloud_kind(), CloudKind::Aws);
    }

    #[test]
    fn test_cloud_kind_parse_and_toggle() {
        assert_eq!("AKS".parse::<CloudKind>().unwrap(), CloudKind::Azure);
        assert_eq!("aws".parse::<CloudKind>().unwrap(), CloudKind::Aws);
        assert!("gcp".parse::<CloudKind>().is_err());
        assert_eq!(CloudKind::Aws.toggled(), CloudKind::Azure);
    }
}
