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

//! Declared and observed resources of a single pod.

use crate::domain::quantity::{parse_optional, ResourceKind};
use crate::shared::error::{JeraError, Result};
use std::collections::HashMap;

/// Raw request or limit strings of one container, as declared in the pod spec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceStrings {
    pub cpu: Option<String>,
    pub memory: Option<String>,
}

impl ResourceStrings {
    pub fn new(cpu: Option<&str>, memory: Option<&str>) -> Self {
        Self {
            cpu: cpu.map(str::to_string),
            memory: memory.map(str::to_string),
        }
    }

    fn normalize(&self) -> Result<Resources> {
        Ok(Resources {
            cpu: parse_optional(self.cpu.as_deref(), ResourceKind::Cpu)?,
            memory: parse_optional(self.memory.as_deref(), ResourceKind::Memory)?,
        })
    }
}

/// Requests and limits of one container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerResourceSpec {
    pub name: String,
    pub requests: ResourceStrings,
    pub limits: ResourceStrings,
}

/// Normalized CPU (millicores) and memory (mebibytes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resources {
    pub cpu: u64,
    pub memory: u64,
}

impl Resources {
    pub fn new(cpu: u64, memory: u64) -> Self {
        Self { cpu, memory }
    }
}

impl Resources {
    /// `None` when either sum leaves the `u64` range.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        Some(Self {
            cpu: self.cpu.checked_add(rhs.cpu)?,
            memory: self.memory.checked_add(rhs.memory)?,
        })
    }
}

/// Sum of container requests and limits for one pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodResourceProfile {
    pub name: String,
    pub namespace: String,
    pub node: Option<String>,
    pub requests: Resources,
    pub limits: Resources,
}

impl PodResourceProfile {
    pub fn from_containers(
        name: impl Into<String>,
        namespace: impl Into<String>,
        node: Option<String>,
        containers: &[ContainerResourceSpec],
    ) -> Result<Self> {
        let name: String = name.into();
        let overflow = || JeraError::total_overflow(format!("pod '{}'", name));

        let mut requests = Resources::default();
        let mut limits = Resources::default();
        for container in containers {
            requests = requests
                .checked_add(container.requests.normalize()?)
                .ok_or_else(overflow)?;
            limits = limits
                .checked_add(container.limits.normalize()?)
                .ok_or_else(overflow)?;
        }

        Ok(Self {
            name,
            namespace: namespace.into(),
            node,
            requests,
            limits,
        })
    }
}

/// One observed usage data point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSample {
    /// Pod or node name.
    pub subject_id: String,
    /// Set when the sample came from a cluster-wide listing.
    pub namespace: Option<String>,
    pub cpu_used: u64,
    pub memory_used: u64,
}

impl UsageSample {
    pub fn new(subject_id: impl Into<String>, cpu_used: u64, memory_used: u64) -> Self {
        Self {
            subject_id: subject_id.into(),
            namespace: None,
            cpu_used,
            memory_used,
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn resources(&self) -> Resources {
        Resources::new(self.cpu_used, self.memory_used)
    }
}

/// Usage samples indexed by subject for lookup during aggregation.
#[derive(Debug, Clone, Default)]
pub struct UsageIndex {
    samples: HashMap<String, UsageSample>,
}

impl UsageIndex {
    pub fn from_samples(samples: impl IntoIterator<Item = UsageSample>) -> Self {
        let samples = samples
            .into_iter()
            .map(|s| (Self::key(s.namespace.as_deref(), &s.subject_id), s))
            .collect();
        Self { samples }
    }

    fn key(namespace: Option<&str>, name: &str) -> String {
        match namespace {
            Some(ns) => format!("{}/{}", ns, name),
            None => name.to_string(),
        }
    }

    /// Namespaced samples win over bare-name samples.
    pub fn lookup(&self, namespace: &str, name: &str) -> Option<&UsageSample> {
        self.samples
            .get(&Self::key(Some(namespace), name))
            .or_else(|| self.samples.get(name))
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(req: (&str, &str), lim: (Option<&str>, Option<&str>)) -> ContainerResourceSpec {
        ContainerResourceSpec {
            name: "app".to_string(),
            requests: ResourceStrings::new(Some(req.0), Some(req.1)),
            limits: ResourceStrings::new(lim.0, lim.1),
        }
    }

    #[test]
    fn test_profile_sums_containers() {
        let containers = vec![
            container(("250m", "128Mi"), (Some("1"), Some("1Gi"))),
            container(("0.5", "64Mi"), (None, None)),
        ];
        let profile =
            PodResourceProfile::from_containers("web", "prod", None, &containers).unwrap();
        assert_eq!(profile.requests, Resources::new(750, 192));
        assert_eq!(profile.limits, Resources::new(1000, 1024));
    }

    #[test]
    fn test_profile_rejects_bad_quantity() {
        let containers = vec![container(("lots", "128Mi"), (None, None))];
        assert!(PodResourceProfile::from_containers("web", "prod", None, &containers).is_err());
    }

    #[test]
    fn test_profile_sum_out_of_range() {
        let containers = vec![
            container(("18446744073709551", "1Mi"), (None, None)),
            container(("18446744073709551", "1Mi"), (None, None)),
        ];
        let err = PodResourceProfile::from_containers("web", "prod", None, &containers).unwrap_err();
        assert!(matches!(err, JeraError::TotalOverflow(_)));
    }

    #[test]
    fn test_usage_index_lookup() {
        let index = UsageIndex::from_samples(vec![
            UsageSample::new("web", 10, 20).in_namespace("prod"),
            UsageSample::new("web", 1, 2).in_namespace("dev"),
            UsageSample::new("db", 5, 6),
        ]);
        assert_eq!(index.lookup("prod", "web").unwrap().cpu_used, 10);
        assert_eq!(index.lookup("dev", "web").unwrap().cpu_used, 1);
        assert_eq!(index.lookup("any", "db").unwrap().memory_used, 6);
        assert!(index.lookup("prod", "missing").is_none());
        assert_eq!(index.len(), 3);
    }
}
