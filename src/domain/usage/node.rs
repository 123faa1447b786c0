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

//! Node-scoped aggregation.

use super::aggregate::{aggregate, ScopeReport, SubjectReport};
use crate::shared::error::Result;
use super::profile::{PodResourceProfile, Resources, UsageIndex, UsageSample};

/// Number of pods listed as the heaviest CPU consumers of a node.
pub const HOT_POD_LIMIT: usize = 5;

/// Node allocatable capacity, normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCapacity {
    pub name: String,
    pub allocatable: Resources,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeReport {
    pub name: String,
    pub allocatable: Resources,
    /// Observed node usage from `kubectl top nodes`, if available.
    pub node_used: Option<Resources>,
    /// Aggregation over pods scheduled on this node.
    pub pods: ScopeReport,
}

impl NodeReport {
    /// Share of allocatable capacity claimed by pod requests.
    pub fn cpu_allocated_percent(&self) -> Option<f64> {
        ratio_percent(self.pods.totals.cpu_request, self.allocatable.cpu)
    }

    pub fn memory_allocated_percent(&self) -> Option<f64> {
        ratio_percent(self.pods.totals.memory_request, self.allocatable.memory)
    }

    pub fn cpu_used_percent(&self) -> Option<f64> {
        self.node_used
            .and_then(|u| ratio_percent(u.cpu, self.allocatable.cpu))
    }

    pub fn memory_used_percent(&self) -> Option<f64> {
        self.node_used
            .and_then(|u| ratio_percent(u.memory, self.allocatable.memory))
    }

    pub fn hot_pods(&self) -> Vec<&SubjectReport> {
        top_pods_by_cpu(&self.pods.subjects, HOT_POD_LIMIT)
    }
}

fn ratio_percent(part: u64, whole: u64) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64 * 100.0)
}

/// Highest CPU consumers first. Equal usage keeps listing order.
pub fn top_pods_by_cpu(subjects: &[SubjectReport], limit: usize) -> Vec<&SubjectReport> {
    let mut ranked: Vec<&SubjectReport> = subjects.iter().collect();
    ranked.sort_by(|a, b| b.cpu_used().cmp(&a.cpu_used()));
    ranked.truncate(limit);
    ranked
}

/// Build one report per node from the pods assigned to it.
pub fn aggregate_nodes(
    nodes: Vec<NodeCapacity>,
    profiles: Vec<PodResourceProfile>,
    pod_usage: &UsageIndex,
    node_usage: &[UsageSample],
) -> Result<Vec<NodeReport>> {
    nodes
        .into_iter()
        .map(|node| {
            let assigned: Vec<PodResourceProfile> = profiles
                .iter()
                .filter(|p| p.node.as_deref() == Some(node.name.as_str()))
                .cloned()
                .collect();
            let node_used = node_usage
                .iter()
                .find(|s| s.subject_id == node.name)
                .map(UsageSample::resources);

            Ok(NodeReport {
                pods: aggregate(node.name.clone(), assigned, pod_usage)?,
                name: node.name,
                allocatable: node.allocatable,
                node_used,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pod(name: &str, node: &str, cpu_req: u64) -> PodResourceProfile {
        PodResourceProfile {
            name: name.to_string(),
            namespace: "prod".to_string(),
            node: Some(node.to_string()),
            requests: Resources::new(cpu_req, 64),
            limits: Resources::default(),
        }
    }

    #[test]
    fn test_top_five_by_cpu() {
        let usages = [10u64, 90, 30, 70, 20, 60, 5];
        let profiles: Vec<_> = (0..usages.len())
            .map(|i| pod(&format!("p{}", i), "n1", 100))
            .collect();
        let usage = UsageIndex::from_samples(
            usages
                .iter()
                .enumerate()
                .map(|(i, cpu)| UsageSample::new(format!("p{}", i), *cpu, 0)),
        );
        let report = aggregate("n1", profiles, &usage).unwrap();

        let top: Vec<u64> = top_pods_by_cpu(&report.subjects, HOT_POD_LIMIT)
            .iter()
            .map(|s| s.cpu_used())
            .collect();
        assert_eq!(top, vec![90, 70, 60, 30, 20]);
    }

    #[test]
    fn test_ties_keep_listing_order() {
        let usage = UsageIndex::from_samples(vec![
            UsageSample::new("first", 50, 0),
            UsageSample::new("second", 50, 0),
        ]);
        let report = aggregate(
            "n1",
            vec![pod("first", "n1", 10), pod("second", "n1", 10)],
            &usage,
        )
        .unwrap();
        let top: Vec<_> = top_pods_by_cpu(&report.subjects, 1)
            .iter()
            .map(|s| s.profile.name.clone())
            .collect();
        assert_eq!(top, vec!["first"]);
    }

    #[test]
    fn test_aggregate_nodes() {
        let nodes = vec![
            NodeCapacity {
                name: "n1".to_string(),
                allocatable: Resources::new(4000, 8192),
            },
            NodeCapacity {
                name: "n2".to_string(),
                allocatable: Resources::new(2000, 4096),
            },
        ];
        let profiles = vec![pod("a", "n1", 1000), pod("b", "n1", 1000), pod("c", "n2", 500)];
        let pod_usage = UsageIndex::from_samples(vec![UsageSample::new("a", 1500, 10)]);
        let node_usage = vec![UsageSample::new("n1", 2000, 4096)];

        let reports = aggregate_nodes(nodes, profiles, &pod_usage, &node_usage).unwrap();
        assert_eq!(reports.len(), 2);

        let n1 = &reports[0];
        assert_eq!(n1.pods.subjects.len(), 2);
        assert_eq!(n1.cpu_allocated_percent(), Some(50.0));
        assert_eq!(n1.cpu_used_percent(), Some(50.0));
        assert_eq!(n1.memory_used_percent(), Some(50.0));
        assert_eq!(n1.hot_pods()[0].profile.name, "a");
        assert!(n1.hot_pods()[0].is_over_allocated());

        let n2 = &reports[1];
        assert_eq!(n2.cpu_allocated_percent(), Some(25.0));
        assert_eq!(n2.cpu_used_percent(), None);
    }
}
