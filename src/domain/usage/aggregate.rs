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

use super::profile::{PodResourceProfile, Resources, UsageIndex};
use crate::shared::error::{JeraError, Result};
use std::collections::BTreeMap;

/// Usage relative to a declared request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Utilization {
    /// `used / request * 100`, flagged when usage exceeds the request.
    Percent { value: f64, over_allocated: bool },
    /// Something is used but nothing was requested.
    NoRequest,
    /// Nothing requested and nothing used.
    NotApplicable,
}

impl Utilization {
    pub fn compute(used: u64, request: u64) -> Self {
        if request > 0 {
            Utilization::Percent {
                value: used as f64 / request as f64 * 100.0,
                over_allocated: used > request,
            }
        } else if used > 0 {
            Utilization::NoRequest
        } else {
            Utilization::NotApplicable
        }
    }

    pub fn is_over_allocated(&self) -> bool {
        matches!(
            self,
            Utilization::Percent {
                over_allocated: true,
                ..
            }
        )
    }

    pub fn percent(&self) -> Option<f64> {
        match self {
            Utilization::Percent { value, .. } => Some(*value),
            _ => None,
        }
    }
}

/// Six running sums over a scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateTotals {
    pub cpu_request: u64,
    pub cpu_limit: u64,
    pub cpu_used: u64,
    pub memory_request: u64,
    pub memory_limit: u64,
    pub memory_used: u64,
}

impl AggregateTotals {
    /// Totals with one more subject counted. `None` when a sum overflows.
    pub fn checked_add(
        &self,
        requests: Resources,
        limits: Resources,
        used: Resources,
    ) -> Option<Self> {
        self.checked_merge(&AggregateTotals {
            cpu_request: requests.cpu,
            cpu_limit: limits.cpu,
            cpu_used: used.cpu,
            memory_request: requests.memory,
            memory_limit: limits.memory,
            memory_used: used.memory,
        })
    }

    pub fn checked_merge(&self, other: &AggregateTotals) -> Option<Self> {
        Some(Self {
            cpu_request: self.cpu_request.checked_add(other.cpu_request)?,
            cpu_limit: self.cpu_limit.checked_add(other.cpu_limit)?,
            cpu_used: self.cpu_used.checked_add(other.cpu_used)?,
            memory_request: self.memory_request.checked_add(other.memory_request)?,
            memory_limit: self.memory_limit.checked_add(other.memory_limit)?,
            memory_used: self.memory_used.checked_add(other.memory_used)?,
        })
    }

    pub fn cpu_utilization(&self) -> Utilization {
        Utilization::compute(self.cpu_used, self.cpu_request)
    }

    pub fn memory_utilization(&self) -> Utilization {
        Utilization::compute(self.memory_used, self.memory_request)
    }
}

/// Per-pod line of a report.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectReport {
    pub profile: PodResourceProfile,
    /// `None` when no usage sample existed for the pod.
    pub used: Option<Resources>,
    pub cpu: Utilization,
    pub memory: Utilization,
}

impl SubjectReport {
    pub fn new(profile: PodResourceProfile, used: Option<Resources>) -> Self {
        let observed = used.unwrap_or_default();
        Self {
            cpu: Utilization::compute(observed.cpu, profile.requests.cpu),
            memory: Utilization::compute(observed.memory, profile.requests.memory),
            profile,
            used,
        }
    }

    pub fn cpu_used(&self) -> u64 {
        self.used.map(|u| u.cpu).unwrap_or(0)
    }

    pub fn memory_used(&self) -> u64 {
        self.used.map(|u| u.memory).unwrap_or(0)
    }

    pub fn is_over_allocated(&self) -> bool {
        self.cpu.is_over_allocated() || self.memory.is_over_allocated()
    }
}

/// Aggregation over one scope (a namespace, a node, or an ad-hoc pod set).
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeReport {
    pub scope: String,
    pub subjects: Vec<SubjectReport>,
    pub totals: AggregateTotals,
    /// False when no pod of this scope had a usage sample.
    pub has_usage: bool,
}

impl ScopeReport {
    pub fn over_allocated(&self) -> impl Iterator<Item = &SubjectReport> {
        self.subjects.iter().filter(|s| s.is_over_allocated())
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

/// Aggregate pod profiles against usage samples.
///
/// Every profile contributes to the totals. Pods without a sample count as
/// zero usage and keep `used == None` so the table can tell them apart.
/// Fails with [`JeraError::TotalOverflow`] instead of wrapping a sum.
pub fn aggregate(
    scope: impl Into<String>,
    profiles: Vec<PodResourceProfile>,
    usage: &UsageIndex,
) -> Result<ScopeReport> {
    let scope = scope.into();
    let mut totals = AggregateTotals::default();
    let mut subjects = Vec::with_capacity(profiles.len());

    for profile in profiles {
        let used = usage
            .lookup(&profile.namespace, &profile.name)
            .map(|s| s.resources());
        totals = totals
            .checked_add(profile.requests, profile.limits, used.unwrap_or_default())
            .ok_or_else(|| JeraError::total_overflow(scope.clone()))?;
        subjects.push(SubjectReport::new(profile, used));
    }

    Ok(ScopeReport {
        has_usage: subjects.iter().any(|s| s.used.is_some()),
        scope,
        subjects,
        totals,
    })
}

/// Per-namespace reports plus a cluster-wide grand total.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterReport {
    pub namespaces: Vec<ScopeReport>,
    pub totals: AggregateTotals,
    pub has_usage: bool,
}

impl ClusterReport {
    pub fn pod_count(&self) -> usize {
        self.namespaces.iter().map(|n| n.subjects.len()).sum()
    }
}

/// Group profiles by namespace (sorted by name) and aggregate each group.
pub fn aggregate_by_namespace(
    profiles: Vec<PodResourceProfile>,
    usage: &UsageIndex,
) -> Result<ClusterReport> {
    let mut grouped: BTreeMap<String, Vec<PodResourceProfile>> = BTreeMap::new();
    for profile in profiles {
        grouped
            .entry(profile.namespace.clone())
            .or_default()
            .push(profile);
    }

    let mut totals = AggregateTotals::default();
    let mut namespaces = Vec::with_capacity(grouped.len());
    for (namespace, pods) in grouped {
        let report = aggregate(namespace, pods, usage)?;
        totals = totals
            .checked_merge(&report.totals)
            .ok_or_else(|| JeraError::total_overflow("the cluster"))?;
        namespaces.push(report);
    }

    Ok(ClusterReport {
        namespaces,
        totals,
        has_usage: !usage.is_empty(),
    })
}

#[cfg(test)]
mod tests {
    use super::super::profile::UsageSample;
    use super::*;
    use crate::domain::quantity::{parse_quantity, ResourceKind};

    fn profile(ns: &str, name: &str, cpu_req: u64, mem_req: u64) -> PodResourceProfile {
        PodResourceProfile {
            name: name.to_string(),
            namespace: ns.to_string(),
            node: None,
            requests: Resources::new(cpu_req, mem_req),
            limits: Resources::new(cpu_req * 2, mem_req * 2),
        }
    }

    fn requesting(ns: &str, name: &str, cpu_req: u64) -> PodResourceProfile {
        PodResourceProfile {
            name: name.to_string(),
            namespace: ns.to_string(),
            node: None,
            requests: Resources::new(cpu_req, 1),
            limits: Resources::default(),
        }
    }

    #[test]
    fn test_utilization_states() {
        assert_eq!(Utilization::compute(50, 0), Utilization::NoRequest);
        assert_eq!(Utilization::compute(0, 0), Utilization::NotApplicable);
        assert_eq!(
            Utilization::compute(150, 100),
            Utilization::Percent {
                value: 150.0,
                over_allocated: true
            }
        );
        assert_eq!(
            Utilization::compute(100, 100),
            Utilization::Percent {
                value: 100.0,
                over_allocated: false
            }
        );
    }

    #[test]
    fn test_mixed_request_pods() {
        let usage = UsageIndex::from_samples(vec![
            UsageSample::new("a", 50, 0),
            UsageSample::new("b", 30, 0),
        ]);
        let report = aggregate(
            "prod",
            vec![profile("prod", "a", 100, 0), profile("prod", "b", 0, 0)],
            &usage,
        )
        .unwrap();

        assert_eq!(report.totals.cpu_request, 100);
        assert_eq!(report.totals.cpu_used, 80);
        assert_eq!(report.subjects[0].cpu.percent(), Some(50.0));
        assert_eq!(report.subjects[1].cpu, Utilization::NoRequest);
        assert!(report.has_usage);
    }

    #[test]
    fn test_totals_equal_sum_of_subjects() {
        let usage = UsageIndex::from_samples(vec![
            UsageSample::new("a", 120, 300),
            UsageSample::new("c", 7, 9),
        ]);
        let report = aggregate(
            "prod",
            vec![
                profile("prod", "a", 100, 256),
                profile("prod", "b", 200, 512),
                profile("prod", "c", 0, 0),
            ],
            &usage,
        )
        .unwrap();

        let sum = |f: fn(&SubjectReport) -> u64| report.subjects.iter().map(f).sum::<u64>();
        assert_eq!(report.totals.cpu_request, sum(|s| s.profile.requests.cpu));
        assert_eq!(report.totals.cpu_limit, sum(|s| s.profile.limits.cpu));
        assert_eq!(report.totals.cpu_used, sum(|s| s.cpu_used()));
        assert_eq!(report.totals.memory_request, sum(|s| s.profile.requests.memory));
        assert_eq!(report.totals.memory_limit, sum(|s| s.profile.limits.memory));
        assert_eq!(report.totals.memory_used, sum(|s| s.memory_used()));

        let flagged: Vec<_> = report.over_allocated().map(|s| s.profile.name.as_str()).collect();
        assert_eq!(flagged, vec!["a"]);
        assert!(report.subjects[1].used.is_none());
    }

    #[test]
    fn test_empty_usage_degrades() {
        let report = aggregate(
            "prod",
            vec![profile("prod", "a", 100, 100)],
            &UsageIndex::default(),
        )
        .unwrap();
        assert!(!report.has_usage);
        assert_eq!(report.totals.cpu_used, 0);
        assert_eq!(report.subjects[0].cpu.percent(), Some(0.0));
    }

    #[test]
    fn test_aggregate_by_namespace() {
        let usage = UsageIndex::from_samples(vec![
            UsageSample::new("web", 10, 10).in_namespace("prod"),
            UsageSample::new("web", 20, 20).in_namespace("dev"),
        ]);
        let cluster = aggregate_by_namespace(
            vec![
                profile("prod", "web", 100, 100),
                profile("dev", "web", 50, 50),
                profile("dev", "worker", 50, 50),
            ],
            &usage,
        )
        .unwrap();

        let names: Vec<_> = cluster.namespaces.iter().map(|n| n.scope.as_str()).collect();
        assert_eq!(names, vec!["dev", "prod"]);
        assert_eq!(cluster.namespaces[0].totals.cpu_used, 20);
        assert_eq!(cluster.totals.cpu_request, 200);
        assert_eq!(cluster.totals.cpu_used, 30);
        assert_eq!(cluster.pod_count(), 3);
    }

    #[test]
    fn test_totals_near_the_range_limit() {
        let big = 9_000_000_000_000_000_000;
        let report = aggregate(
            "prod",
            vec![requesting("prod", "a", big), requesting("prod", "b", big)],
            &UsageIndex::default(),
        )
        .unwrap();
        assert_eq!(report.totals.cpu_request, 2 * big);
    }

    #[test]
    fn test_total_overflow_is_an_error() {
        let cores = parse_quantity("18446744073709551", ResourceKind::Cpu).unwrap();
        let err = aggregate(
            "prod",
            vec![requesting("prod", "a", cores), requesting("prod", "b", cores)],
            &UsageIndex::default(),
        )
        .unwrap_err();
        assert!(matches!(err, JeraError::TotalOverflow(ref scope) if scope == "prod"));

        let err = aggregate_by_namespace(
            vec![requesting("dev", "a", cores), requesting("prod", "b", cores)],
            &UsageIndex::default(),
        )
        .unwrap_err();
        assert!(matches!(err, JeraError::TotalOverflow(_)));
    }

    #[test]
    fn test_has_usage_is_per_scope() {
        let usage =
            UsageIndex::from_samples(vec![UsageSample::new("web", 10, 10).in_namespace("prod")]);
        let cluster = aggregate_by_namespace(
            vec![profile("prod", "web", 100, 100), profile("dev", "job", 50, 50)],
            &usage,
        )
        .unwrap();
        assert!(cluster.has_usage);
        assert!(!cluster.namespaces[0].has_usage);
        assert!(cluster.namespaces[1].has_usage);
    }
}
