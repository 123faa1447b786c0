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

//! Resource usage aggregation across pods, namespaces and nodes.

pub mod aggregate;
pub mod node;
pub mod profile;

pub use aggregate::{
    aggregate, aggregate_by_namespace, AggregateTotals, ClusterReport, ScopeReport, SubjectReport,
    Utilization,
};
pub use node::{aggregate_nodes, top_pods_by_cpu, NodeCapacity, NodeReport, HOT_POD_LIMIT};
pub use profile::{
    ContainerResourceSpec, PodResourceProfile, ResourceStrings, Resources, UsageIndex,
    UsageSample,
};

use crate::shared::error::{JeraError, Result};

/// Turn an unavailable metrics source into "no usage data".
///
/// Only [`JeraError::MetricsUnavailable`] is absorbed; any other error
/// still aborts the command.
pub fn samples_or_empty(result: Result<Vec<UsageSample>>) -> Result<Vec<UsageSample>> {
    match result {
        Ok(samples) => Ok(samples),
        Err(JeraError::MetricsUnavailable(reason)) => {
            tracing::warn!("Metrics unavailable, continuing without usage data: {}", reason);
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}
