//! Resource usage commands

use super::context::AppContext;
use super::display::ReportRenderer;
use super::resources::choose_namespace;
use crate::domain::usage::{
    aggregate, aggregate_by_namespace, aggregate_nodes, samples_or_empty, ClusterReport,
    NodeReport, PodResourceProfile, ScopeReport, UsageIndex,
};
use crate::infrastructure::kubernetes::{ClusterResourceProvider, MetricsSource, PodRecord};
use crate::shared::error::{JeraError, Result};
use clap::Parser;

/// Resource profiles of pods that still hold resources.
fn active_profiles(pods: Vec<PodRecord>) -> Result<Vec<PodResourceProfile>> {
    pods.iter()
        .filter(|p| !p.is_terminated())
        .map(PodRecord::profile)
        .collect()
}

/// Per-pod usage against requests for one namespace.
pub async fn namespace_report(
    provider: &dyn ClusterResourceProvider,
    metrics: &dyn MetricsSource,
    namespace: &str,
) -> Result<ScopeReport> {
    let profiles = active_profiles(provider.list_pods(Some(namespace)).await?)?;
    let samples = samples_or_empty(metrics.pod_usage(Some(namespace)).await)?;
    let usage = UsageIndex::from_samples(samples);

    aggregate(namespace, profiles, &usage)
}

/// Usage of every namespace plus the cluster total.
pub async fn cluster_report(
    provider: &dyn ClusterResourceProvider,
    metrics: &dyn MetricsSource,
) -> Result<ClusterReport> {
    let profiles = active_profiles(provider.list_pods(None).await?)?;
    let samples = samples_or_empty(metrics.pod_usage(None).await)?;
    let usage = UsageIndex::from_samples(samples);

    aggregate_by_namespace(profiles, &usage)
}

/// Allocation and usage per node, optionally narrowed to one node.
pub async fn node_reports(
    provider: &dyn ClusterResourceProvider,
    metrics: &dyn MetricsSource,
    node: Option<&str>,
) -> Result<Vec<NodeReport>> {
    let nodes: Vec<_> = provider
        .list_nodes()
        .await?
        .into_iter()
        .filter(|n| node.map_or(true, |wanted| n.name == wanted))
        .collect();
    if let (Some(wanted), true) = (node, nodes.is_empty()) {
        return Err(JeraError::not_found("Node", wanted, "cluster"));
    }
    let capacities = nodes
        .iter()
        .map(|n| n.capacity())
        .collect::<Result<Vec<_>>>()?;

    let profiles = active_profiles(provider.list_pods(None).await?)?;
    let pod_usage = UsageIndex::from_samples(samples_or_empty(metrics.pod_usage(None).await)?);
    let node_usage = samples_or_empty(metrics.node_usage().await)?;

    aggregate_nodes(capacities, profiles, &pod_usage, &node_usage)
}

#[derive(Parser, Debug)]
pub struct PodMetricsCommand {
    /// Namespace (asked interactively when omitted)
    pub namespace: Option<String>,
}

impl PodMetricsCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let provider = ctx.provider().await?;
        let namespace = choose_namespace(
            provider.as_ref(),
            self.namespace.as_deref(),
            "Select the namespace to analyse",
        )
        .await?;

        let report = namespace_report(provider.as_ref(), &ctx.kubectl(), &namespace).await?;
        println!("{}", ReportRenderer::new().render_scope(&report));
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct AllMetricsCommand {}

impl AllMetricsCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let provider = ctx.provider().await?;
        let report = cluster_report(provider.as_ref(), &ctx.kubectl()).await?;

        println!("{}", ReportRenderer::new().render_cluster(&report));
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct NodeMetricsCommand {
    /// Only this node
    pub node: Option<String>,
}

impl NodeMetricsCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let provider = ctx.provider().await?;
        let reports =
            node_reports(provider.as_ref(), &ctx.kubectl(), self.node.as_deref()).await?;

        println!("{}", ReportRenderer::new().render_nodes(&reports));
        Ok(())
    }
}
