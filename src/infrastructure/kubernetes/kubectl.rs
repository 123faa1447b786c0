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

//! `kubectl` shell-outs: metrics, logs, exec, delete and kubeconfig contexts.

use crate::domain::quantity::{parse_quantity, ResourceKind};
use crate::domain::usage::UsageSample;
use crate::infrastructure::constants::{CONNECTIVITY_TIMEOUT, DEFAULT_KUBECTL};
use crate::infrastructure::process::CommandRunner;
use crate::shared::error::{JeraError, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Observed usage from the metrics API.
#[async_trait::async_trait]
pub trait MetricsSource: Send + Sync {
    /// Per-pod usage in one namespace, or cluster-wide when `None`.
    async fn pod_usage(&self, namespace: Option<&str>) -> Result<Vec<UsageSample>>;

    /// Per-node usage.
    async fn node_usage(&self) -> Result<Vec<UsageSample>>;
}

/// A context entry of the kubeconfig.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubeContext {
    pub name: String,
    pub cluster: String,
    pub user: String,
    pub namespace: Option<String>,
    pub current: bool,
}

#[derive(Debug, Deserialize)]
struct KubeconfigView {
    #[serde(rename = "current-context", default)]
    current_context: Option<String>,
    #[serde(default)]
    contexts: Option<Vec<NamedContext>>,
}

#[derive(Debug, Deserialize)]
struct NamedContext {
    name: String,
    #[serde(default)]
    context: Option<ContextFields>,
}

#[derive(Debug, Deserialize, Default)]
struct ContextFields {
    #[serde(default)]
    cluster: String,
    #[serde(default)]
    user: String,
    #[serde(default)]
    namespace: Option<String>,
}

/// Parse `kubectl config view -o json`.
pub fn parse_contexts(json: &str) -> Result<Vec<KubeContext>> {
    let view: KubeconfigView = serde_json::from_str(json)
        .map_err(|e| JeraError::malformed("kubectl config view", e.to_string()))?;
    let current = view.current_context.unwrap_or_default();

    Ok(view
        .contexts
        .unwrap_or_default()
        .into_iter()
        .map(|c| {
            let fields = c.context.unwrap_or_default();
            KubeContext {
                current: c.name == current,
                name: c.name,
                cluster: fields.cluster,
                user: fields.user,
                namespace: fields.namespace,
            }
        })
        .collect())
}

/// Parse `kubectl top pods --no-headers` (with a leading namespace column
/// when listed with `-A`).
pub fn parse_top_pods(output: &str, all_namespaces: bool) -> Result<Vec<UsageSample>> {
    let expected = if all_namespaces { 4 } else { 3 };
    let mut samples = Vec::new();

    for line in output.lines().filter(|l| !l.trim().is_empty()) {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < expected {
            return Err(JeraError::malformed(
                "kubectl top pods",
                format!("unexpected line '{}'", line),
            ));
        }
        let offset = expected - 3;
        let sample = UsageSample::new(
            cols[offset],
            parse_quantity(cols[offset + 1], ResourceKind::Cpu)?,
            parse_quantity(cols[offset + 2], ResourceKind::Memory)?,
        );
        samples.push(if all_namespaces {
            sample.in_namespace(cols[0])
        } else {
            sample
        });
    }

    Ok(samples)
}

/// Parse `kubectl top nodes --no-headers`.
///
/// Columns are name, cpu, cpu%, memory, memory%. Nodes reporting
/// `<unknown>` have no metrics yet and are skipped.
pub fn parse_top_nodes(output: &str) -> Result<Vec<UsageSample>> {
    let mut samples = Vec::new();

    for line in output.lines().filter(|l| !l.trim().is_empty()) {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < 4 {
            return Err(JeraError::malformed(
                "kubectl top nodes",
                format!("unexpected line '{}'", line),
            ));
        }
        if cols[1].starts_with('<') || cols[3].starts_with('<') {
            tracing::debug!("Node {} has no metrics yet", cols[0]);
            continue;
        }
        samples.push(UsageSample::new(
            cols[0],
            parse_quantity(cols[1], ResourceKind::Cpu)?,
            parse_quantity(cols[3], ResourceKind::Memory)?,
        ));
    }

    Ok(samples)
}

/// Wrapper around the `kubectl` binary.
#[derive(Clone)]
pub struct Kubectl {
    runner: Arc<dyn CommandRunner>,
    binary: String,
    kubeconfig: Option<PathBuf>,
    context: Option<String>,
}

impl Kubectl {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            binary: DEFAULT_KUBECTL.to_string(),
            kubeconfig: None,
            context: None,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_kubeconfig(mut self, kubeconfig: Option<PathBuf>, context: Option<String>) -> Self {
        self.kubeconfig = kubeconfig;
        self.context = context;
        self
    }

    fn args(&self, rest: &[&str]) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(path) = &self.kubeconfig {
            args.push("--kubeconfig".to_string());
            args.push(path.display().to_string());
        }
        if let Some(context) = &self.context {
            args.push("--context".to_string());
            args.push(context.clone());
        }
        args.extend(rest.iter().map(|a| a.to_string()));
        args
    }

    async fn run(&self, rest: &[&str]) -> Result<String> {
        let args = self.args(rest);
        self.runner
            .capture(&self.binary, &args)
            .await?
            .into_stdout(&self.binary, &args)
    }

    async fn run_attached(&self, rest: &[&str]) -> Result<()> {
        let args = self.args(rest);
        let code = self.runner.interactive(&self.binary, &args).await?;
        if code == 0 {
            Ok(())
        } else {
            Err(JeraError::tool_failure(
                &self.binary,
                args.join(" "),
                format!("exited with status {}", code),
            ))
        }
    }

    /// Stream `kubectl logs` to the terminal.
    pub async fn stream_logs(
        &self,
        namespace: &str,
        pod: &str,
        follow: bool,
        tail: Option<u32>,
    ) -> Result<()> {
        let tail = tail.map(|t| t.to_string());
        let mut rest = vec!["logs", "-n", namespace];
        if follow {
            rest.push("-f");
        }
        if let Some(tail) = tail.as_deref() {
            rest.push("--tail");
            rest.push(tail);
        }
        rest.push(pod);
        self.run_attached(&rest).await
    }

    /// Open an interactive shell in the pod.
    pub async fn exec_shell(&self, namespace: &str, pod: &str, shell: &str) -> Result<()> {
        self.run_attached(&["exec", "-it", pod, "-n", namespace, "--", shell])
            .await
    }

    pub async fn delete_pod(&self, namespace: &str, pod: &str, force: bool) -> Result<String> {
        let mut rest = vec!["delete", "pod", "-n", namespace];
        if force {
            rest.push("--force");
            rest.push("--grace-period=0");
        }
        rest.push(pod);
        self.run(&rest).await
    }

    /// True when the API server answers `get nodes` within the timeout.
    pub async fn check_connectivity(&self) -> Result<bool> {
        let timeout = format!("--request-timeout={}", CONNECTIVITY_TIMEOUT);
        let args = self.args(&["get", "nodes", &timeout]);
        let output = self.runner.capture(&self.binary, &args).await?;
        Ok(output.success)
    }

    pub async fn list_contexts(&self) -> Result<Vec<KubeContext>> {
        let json = self.run(&["config", "view", "-o", "json"]).await?;
        parse_contexts(&json)
    }
}

/// Output `kubectl top` printed but we cannot read counts as no metrics at
/// all, so one bad line never yields partial totals.
fn unreadable_metrics(err: JeraError) -> JeraError {
    JeraError::MetricsUnavailable(format!("unreadable kubectl top output: {}", err))
}

#[async_trait::async_trait]
impl MetricsSource for Kubectl {
    async fn pod_usage(&self, namespace: Option<&str>) -> Result<Vec<UsageSample>> {
        let mut rest = vec!["top", "pods", "--no-headers"];
        match namespace {
            Some(ns) => {
                rest.push("-n");
                rest.push(ns);
            }
            None => rest.push("-A"),
        }

        let args = self.args(&rest);
        let output = self.runner.capture(&self.binary, &args).await?;
        if !output.success {
            return Err(JeraError::MetricsUnavailable(output.stderr.trim().to_string()));
        }
        parse_top_pods(&output.stdout, namespace.is_none()).map_err(unreadable_metrics)
    }

    async fn node_usage(&self) -> Result<Vec<UsageSample>> {
        let args = self.args(&["top", "nodes", "--no-headers"]);
        let output = self.runner.capture(&self.binary, &args).await?;
        if !output.success {
            return Err(JeraError::MetricsUnavailable(output.stderr.trim().to_string()));
        }
        parse_top_nodes(&output.stdout).map_err(unreadable_metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_top_pods() {
        let output = "web-0   3m    45Mi\nworker-1   120m   1Gi\n";
        let samples = parse_top_pods(output, false).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], UsageSample::new("web-0", 3, 45));
        assert_eq!(samples[1].cpu_used, 120);
        assert_eq!(samples[1].memory_used, 1024);
    }

    #[test]
    fn test_parse_top_pods_all_namespaces() {
        let output = "kube-system  coredns-abc  2m  12Mi\nprod  web-0  5m  30Mi\n";
        let samples = parse_top_pods(output, true).unwrap();
        assert_eq!(samples[0].namespace.as_deref(), Some("kube-system"));
        assert_eq!(samples[1].subject_id, "web-0");
    }

    #[test]
    fn test_parse_top_pods_rejects_short_lines() {
        let err = parse_top_pods("web-0 3m\n", false).unwrap_err();
        assert!(matches!(err, JeraError::MalformedResponse { .. }));
    }

    #[test]
    fn test_parse_top_nodes() {
        let output = "node-a   250m   6%   2048Mi   13%\nnode-b   <unknown>   <unknown>   <unknown>   <unknown>\n";
        let samples = parse_top_nodes(output).unwrap();
        assert_eq!(samples, vec![UsageSample::new("node-a", 250, 2048)]);
    }

    #[test]
    fn test_parse_contexts() {
        let json = r#"{
            "current-context": "prod",
            "contexts": [
                {"name": "dev", "context": {"cluster": "dev-cluster", "user": "dev-user"}},
                {"name": "prod", "context": {"cluster": "prod-cluster", "user": "admin", "namespace": "web"}}
            ]
        }"#;
        let contexts = parse_contexts(json).unwrap();
        assert_eq!(contexts.len(), 2);
        assert!(!contexts[0].current);
        assert!(contexts[1].current);
        assert_eq!(contexts[1].namespace.as_deref(), Some("web"));
        assert!(parse_contexts("not json").is_err());
    }
}
