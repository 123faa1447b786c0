//! Pod commands

use super::context::AppContext;
use super::display::TableRenderer;
use super::prompt;
use crate::infrastructure::constants::{DEFAULT_SHELL, WATCH_INTERVAL_SECS};
use crate::infrastructure::kubernetes::{ClusterResourceProvider, PodRecord};
use crate::shared::error::{JeraError, Result};
use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Group label for pods not yet scheduled.
pub const UNASSIGNED_NODE: &str = "unassigned";

/// Pods keyed by node name, sorted by node.
pub fn group_by_node(pods: Vec<PodRecord>) -> BTreeMap<String, Vec<PodRecord>> {
    let mut groups: BTreeMap<String, Vec<PodRecord>> = BTreeMap::new();
    for pod in pods {
        let node = pod
            .node
            .clone()
            .unwrap_or_else(|| UNASSIGNED_NODE.to_string());
        groups.entry(node).or_default().push(pod);
    }
    groups
}

/// Resolve the target pod of `logs`, `exec` and `describe`.
///
/// A given name must exist in the namespace; without one the operator picks
/// from the pods that do.
pub async fn resolve_pod(
    provider: &dyn ClusterResourceProvider,
    namespace: &str,
    pod: Option<&str>,
    message: &str,
) -> Result<String> {
    let names: Vec<String> = provider
        .list_pods(Some(namespace))
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect();

    match pod {
        Some(pod) if names.iter().any(|n| n == pod) => Ok(pod.to_string()),
        Some(pod) => Err(JeraError::not_found(
            "Pod",
            pod,
            format!("namespace '{}'", namespace),
        )),
        None if names.is_empty() => Err(JeraError::not_found(
            "Pod",
            "*",
            format!("namespace '{}'", namespace),
        )),
        None => prompt::select(message, names),
    }
}

#[derive(Parser, Debug)]
pub struct PodsCommand {
    /// Refresh the list every second until Ctrl-C
    #[arg(long, short = 'w')]
    pub watch: bool,
}

impl PodsCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let namespace = ctx.current_namespace()?;
        let provider = ctx.provider().await?;
        let renderer = TableRenderer::new();

        loop {
            let pods = provider
                .list_pods(Some(&namespace))
                .await
                .with_context(|| format!("Failed to list pods in {}", namespace))?;

            if self.watch {
                // Clear the screen and home the cursor.
                print!("\x1B[2J\x1B[1;1H");
            }
            println!("{}", renderer.render_pods(&namespace, &pods));

            if !self.watch {
                return Ok(());
            }
            println!(
                "{}",
                format!(
                    "Refreshing every {}s, press Ctrl-C to stop",
                    WATCH_INTERVAL_SECS
                )
                .bright_black()
            );

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    println!("\nStopped watching pods");
                    return Ok(());
                }
                _ = tokio::time::sleep(Duration::from_secs(WATCH_INTERVAL_SECS)) => {}
            }
        }
    }
}

#[derive(Parser, Debug)]
pub struct PodsByNodeCommand {
    /// Only pods of this namespace (default: all namespaces)
    pub namespace: Option<String>,
}

impl PodsByNodeCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let provider = ctx.provider().await?;
        let pods = provider.list_pods(self.namespace.as_deref()).await?;

        let groups = group_by_node(pods);
        println!("{}", TableRenderer::new().render_pods_by_node(&groups));
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct LogsCommand {
    /// Pod name (asked interactively when omitted)
    pub pod: Option<String>,

    /// Keep streaming new log lines
    #[arg(long, short = 'f')]
    pub follow: bool,

    /// Number of lines to show from the end
    #[arg(long = "tail", short = 'n', value_name = "LINES")]
    pub tail: Option<u32>,
}

impl LogsCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let namespace = ctx.current_namespace()?;
        let provider = ctx.provider().await?;
        let pod = resolve_pod(
            provider.as_ref(),
            &namespace,
            self.pod.as_deref(),
            "Select a pod to view its logs",
        )
        .await?;

        ctx.kubectl()
            .stream_logs(&namespace, &pod, self.follow, self.tail)
            .await?;
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct ExecCommand {
    /// Pod name (asked interactively when omitted)
    pub pod: Option<String>,

    /// Shell started in the container
    #[arg(long, default_value = DEFAULT_SHELL)]
    pub shell: String,
}

impl ExecCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let namespace = ctx.current_namespace()?;
        let provider = ctx.provider().await?;
        let pod = resolve_pod(
            provider.as_ref(),
            &namespace,
            self.pod.as_deref(),
            "Select a pod to open a shell in",
        )
        .await?;

        println!("Opening {} in {}/{} (exit to leave)", self.shell, namespace, pod);
        ctx.kubectl()
            .exec_shell(&namespace, &pod, &self.shell)
            .await?;
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct DeleteCommand {
    /// Pod to delete
    pub pod: String,

    /// Delete immediately (--force --grace-period=0)
    #[arg(long, short = 'f')]
    pub force: bool,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl DeleteCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let namespace = ctx.current_namespace()?;
        let provider = ctx.provider().await?;
        // Fails with NotFound before asking anything.
        provider.get_pod(&namespace, &self.pod).await?;

        let question = if self.force {
            format!(
                "Force delete pod '{}' in '{}' without waiting for shutdown?",
                self.pod, namespace
            )
        } else {
            format!("Delete pod '{}' in '{}'?", self.pod, namespace)
        };
        if !self.yes && !prompt::confirm(&question, false)? {
            println!("Deletion cancelled");
            return Ok(());
        }

        let output = ctx
            .kubectl()
            .delete_pod(&namespace, &self.pod, self.force)
            .await
            .with_context(|| format!("Failed to delete pod {}", self.pod))?;
        tracing::debug!("kubectl delete: {}", output.trim());

        println!("{} Pod {} deleted", "✓".green(), self.pod);
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct DescribeCommand {
    /// Pod name (asked interactively when omitted)
    pub pod: Option<String>,
}

impl DescribeCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let namespace = ctx.current_namespace()?;
        let provider = ctx.provider().await?;
        let pod = resolve_pod(
            provider.as_ref(),
            &namespace,
            self.pod.as_deref(),
            "Select a pod to describe",
        )
        .await?;

        let detail = provider.get_pod(&namespace, &pod).await?;
        let events = provider.list_pod_events(&namespace, &pod).await?;

        println!("{}", TableRenderer::new().render_pod_detail(&detail, &events));
        Ok(())
    }
}
