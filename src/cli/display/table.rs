//! Table rendering for CLI output

use super::format::{
    cores_text, format_age, gibibytes_text, memory_limit_text, or_none, cpu_limit_text,
};
use super::{ColorTheme, StatusIcon};
use crate::domain::quantity::{parse_optional, ResourceKind};
use crate::infrastructure::kubernetes::{
    EventRecord, IngressRecord, KubeContext, NamespaceRecord, NodeRecord, PodDetail, PodRecord,
    PvRecord, PvcRecord,
};
use chrono::{DateTime, Utc};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Color, ContentArrangement, Table};
use std::collections::BTreeMap;

/// Boxed title line placed above a table.
pub fn title_line(title: &str, badge: &str) -> String {
    format!("╭─ {} {} ─╮\n", title, badge.bright_black())
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).set_alignment(CellAlignment::Left))
                .collect::<Vec<_>>(),
        );
    table
}

/// Table renderer for formatted output
pub struct TableRenderer {
    theme: ColorTheme,
    now: DateTime<Utc>,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRenderer {
    /// Create a new table renderer with default theme
    pub fn new() -> Self {
        Self {
            theme: ColorTheme::default(),
            now: Utc::now(),
        }
    }

    /// Fix the reference time used for ages.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            theme: ColorTheme::default(),
            now,
        }
    }

    fn age(&self, created: Option<DateTime<Utc>>) -> String {
        format_age(created, self.now)
    }

    fn phase_cell(&self, phase: &str) -> Cell {
        Cell::new(format!("{} {}", StatusIcon::get_phase_icon(phase), phase))
            .fg(self.theme.get_phase_color(phase))
    }

    pub fn render_namespaces(&self, namespaces: &[NamespaceRecord]) -> String {
        if namespaces.is_empty() {
            return "No namespaces found".to_string();
        }

        let mut table = new_table(&["NAMESPACE", "STATUS", "AGE"]);
        for ns in namespaces {
            table.add_row(vec![
                Cell::new(&ns.name).fg(self.theme.info),
                self.phase_cell(&ns.phase),
                Cell::new(self.age(ns.created)),
            ]);
        }

        let mut output = title_line("Namespaces", &format!("[{}]", namespaces.len()));
        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    pub fn render_nodes(&self, nodes: &[NodeRecord]) -> String {
        if nodes.is_empty() {
            return "No nodes found".to_string();
        }

        let mut table = new_table(&["NODE", "STATUS", "ROLES", "VERSION", "CPU", "MEMORY", "AGE"]);
        for node in nodes {
            let (status, color) = if node.ready {
                (format!("{} Ready", StatusIcon::SUCCESS), self.theme.success)
            } else {
                (format!("{} NotReady", StatusIcon::ERROR), self.theme.error)
            };
            let cpu = parse_optional(node.allocatable_cpu.as_deref(), ResourceKind::Cpu)
                .map(cores_text)
                .unwrap_or_else(|_| or_none(node.allocatable_cpu.as_deref()));
            let memory = parse_optional(node.allocatable_memory.as_deref(), ResourceKind::Memory)
                .map(gibibytes_text)
                .unwrap_or_else(|_| or_none(node.allocatable_memory.as_deref()));

            table.add_row(vec![
                Cell::new(&node.name).fg(self.theme.info),
                Cell::new(status).fg(color),
                Cell::new(node.roles.join(",")),
                Cell::new(&node.kubelet_version),
                Cell::new(cpu).set_alignment(CellAlignment::Right),
                Cell::new(memory).set_alignment(CellAlignment::Right),
                Cell::new(self.age(node.created)),
            ]);
        }

        let ready = nodes.iter().filter(|n| n.ready).count();
        let mut output = title_line("Nodes", &format!("[{}/{} ready]", ready, nodes.len()));
        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    pub fn render_pods(&self, namespace: &str, pods: &[PodRecord]) -> String {
        if pods.is_empty() {
            return format!("No pods found in namespace '{}'", namespace);
        }

        let mut table = new_table(&["POD", "READY", "STATUS", "RESTARTS", "IP", "AGE"]);
        for pod in pods {
            table.add_row(vec![
                Cell::new(&pod.name).fg(self.theme.info),
                Cell::new(format!(
                    "{} {}/{}",
                    StatusIcon::get_ready_icon(pod.ready_containers, pod.total_containers),
                    pod.ready_containers,
                    pod.total_containers
                ))
                .fg(self
                    .theme
                    .get_ready_color(pod.ready_containers, pod.total_containers)),
                self.phase_cell(&pod.phase),
                Cell::new(pod.restarts).set_alignment(CellAlignment::Right),
                Cell::new(or_none(pod.pod_ip.as_deref())),
                Cell::new(self.age(pod.created)),
            ]);
        }

        let mut output = title_line(
            &format!("Pods in {}", namespace),
            &format!("[{} pods]", pods.len()),
        );
        output.push_str(&table.to_string());
        output.push('\n');
        output.push_str(&format!(
            "Legend: {} Ready  {} Partially ready  {} Not ready\n",
            StatusIcon::SUCCESS.green(),
            StatusIcon::WARNING.yellow(),
            StatusIcon::ERROR.red()
        ));
        output
    }

    /// One table per node, pods grouped by `spec.nodeName`.
    pub fn render_pods_by_node(&self, groups: &BTreeMap<String, Vec<PodRecord>>) -> String {
        if groups.is_empty() {
            return "No pods found".to_string();
        }

        let mut output = String::new();
        for (node, pods) in groups {
            let mut table = new_table(&["NAMESPACE", "POD", "STATUS", "READY", "LIFETIME"]);
            for pod in pods {
                table.add_row(vec![
                    Cell::new(&pod.namespace).fg(Color::Magenta),
                    Cell::new(&pod.name).fg(self.theme.info),
                    self.phase_cell(&pod.phase),
                    Cell::new(format!("{}/{}", pod.ready_containers, pod.total_containers))
                        .fg(self
                            .theme
                            .get_ready_color(pod.ready_containers, pod.total_containers)),
                    Cell::new(self.age(pod.started.or(pod.created))),
                ]);
            }
            output.push_str(&title_line(
                &format!("Node {}", node),
                &format!("[{} pods]", pods.len()),
            ));
            output.push_str(&table.to_string());
            output.push_str("\n\n");
        }

        let total: usize = groups.values().map(Vec::len).sum();
        output.push_str(&format!(
            "Summary: {} nodes, {} pods\n",
            groups.len(),
            total
        ));
        output
    }

    pub fn render_contexts(&self, contexts: &[KubeContext]) -> String {
        if contexts.is_empty() {
            return "No contexts configured in kubeconfig".to_string();
        }

        let mut table = new_table(&["CONTEXT", "CLUSTER", "USER", "NAMESPACE", "CURRENT"]);
        for ctx in contexts {
            let (marker, color) = if ctx.current {
                (StatusIcon::SUCCESS, self.theme.success)
            } else {
                ("", Color::Reset)
            };
            table.add_row(vec![
                Cell::new(&ctx.name).fg(color),
                Cell::new(&ctx.cluster),
                Cell::new(&ctx.user),
                Cell::new(or_none(ctx.namespace.as_deref())),
                Cell::new(marker)
                    .fg(color)
                    .set_alignment(CellAlignment::Center),
            ]);
        }

        let mut output = title_line("Configured clusters", &format!("[{}]", contexts.len()));
        output.push_str(&table.to_string());
        output.push('\n');
        output.push_str(&format!(
            "{}\n",
            "Tip: use 'jera use-cluster' to switch clusters".bright_black()
        ));
        output
    }

    pub fn render_urls(&self, namespace: &str, ingresses: &[IngressRecord]) -> String {
        if ingresses.is_empty() {
            return format!("No ingresses found in namespace '{}'", namespace);
        }

        let mut table = new_table(&["INGRESS", "HOSTS", "ADDRESS", "PORTS", "AGE"]);
        for ingress in ingresses {
            let hosts = if ingress.hosts.is_empty() {
                "*".to_string()
            } else {
                ingress.hosts.join("\n")
            };
            let address = if ingress.load_balancer.is_empty() {
                "<pending>".to_string()
            } else {
                ingress.load_balancer.join("\n")
            };
            table.add_row(vec![
                Cell::new(&ingress.name).fg(self.theme.info),
                Cell::new(hosts).fg(self.theme.success),
                Cell::new(address),
                Cell::new(ingress.ports()),
                Cell::new(self.age(ingress.created)),
            ]);
        }

        let mut output = title_line(
            &format!("Ingress URLs in {}", namespace),
            &format!("[{}]", ingresses.len()),
        );
        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    /// Rule table for one ingress plus its HTTPS hosts.
    pub fn render_ingress_rules(&self, ingress: &IngressRecord) -> String {
        let mut output = title_line(
            &format!("Ingress {}", ingress.name),
            &format!("[{}]", ingress.namespace),
        );

        if ingress.rules.is_empty() {
            output.push_str("  No rules defined\n");
        } else {
            let mut table = new_table(&["HOST", "PATH", "SERVICE", "PORT"]);
            for rule in &ingress.rules {
                table.add_row(vec![
                    Cell::new(&rule.host).fg(self.theme.success),
                    Cell::new(&rule.path),
                    Cell::new(&rule.service).fg(self.theme.info),
                    Cell::new(&rule.port),
                ]);
            }
            output.push_str(&table.to_string());
            output.push('\n');
        }

        if !ingress.tls_hosts.is_empty() {
            output.push_str("HTTPS hosts:\n");
            for host in &ingress.tls_hosts {
                output.push_str(&format!("  {} https://{}\n", StatusIcon::SUCCESS.green(), host));
            }
        }
        output
    }

    pub fn render_pvcs(&self, pvcs: &[PvcRecord], show_namespace: bool) -> String {
        if pvcs.is_empty() {
            return "No persistent volume claims found".to_string();
        }

        let mut headers = Vec::new();
        if show_namespace {
            headers.push("NAMESPACE");
        }
        headers.extend(["PVC", "STATUS", "VOLUME", "CAPACITY", "ACCESS MODES", "STORAGECLASS", "AGE"]);
        let mut table = new_table(&headers);

        for pvc in pvcs {
            let mut row = Vec::new();
            if show_namespace {
                row.push(Cell::new(&pvc.namespace).fg(Color::Magenta));
            }
            row.extend([
                Cell::new(&pvc.name).fg(self.theme.info),
                self.phase_cell(&pvc.phase),
                Cell::new(or_none(pvc.volume.as_deref())),
                Cell::new(or_none(pvc.capacity.as_deref())).set_alignment(CellAlignment::Right),
                Cell::new(pvc.access_modes.join(",")),
                Cell::new(or_none(pvc.storage_class.as_deref())),
                Cell::new(self.age(pvc.created)),
            ]);
            table.add_row(row);
        }

        let mut output = title_line("Persistent Volume Claims", &format!("[{}]", pvcs.len()));
        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    pub fn render_pvs(&self, pvs: &[PvRecord], detailed: bool) -> String {
        if pvs.is_empty() {
            return "No persistent volumes found".to_string();
        }

        let mut headers = vec![
            "PV",
            "STATUS",
            "CAPACITY",
            "ACCESS MODES",
            "STORAGECLASS",
            "RECLAIM",
        ];
        if detailed {
            headers.extend(["CLAIM", "TYPE"]);
        }
        headers.push("AGE");
        let mut table = new_table(&headers);

        for pv in pvs {
            let mut row = vec![
                Cell::new(&pv.name).fg(self.theme.info),
                self.phase_cell(&pv.phase),
                Cell::new(or_none(pv.capacity.as_deref())).set_alignment(CellAlignment::Right),
                Cell::new(pv.access_modes.join(",")),
                Cell::new(or_none(pv.storage_class.as_deref())),
                Cell::new(or_none(pv.reclaim_policy.as_deref())),
            ];
            if detailed {
                let claim = match (&pv.claim_namespace, &pv.claim_name) {
                    (Some(ns), Some(name)) => format!("{}/{}", ns, name),
                    (None, Some(name)) => name.clone(),
                    _ => "<none>".to_string(),
                };
                row.push(Cell::new(claim));
                row.push(Cell::new(&pv.volume_type));
            }
            row.push(Cell::new(self.age(pv.created)));
            table.add_row(row);
        }

        let mut output = title_line("Persistent Volumes", &format!("[{}]", pvs.len()));
        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    /// Sectioned view of a pod for `describe`.
    pub fn render_pod_detail(&self, detail: &PodDetail, events: &[EventRecord]) -> String {
        let pod = &detail.pod;
        let mut output = title_line(&format!("Pod {}", pod.name), &format!("[{}]", pod.namespace));

        let mut info = new_table(&["FIELD", "VALUE"]);
        info.add_row(vec![Cell::new("Name"), Cell::new(&pod.name).fg(self.theme.info)]);
        info.add_row(vec![Cell::new("Namespace"), Cell::new(&pod.namespace)]);
        info.add_row(vec![Cell::new("Status"), self.phase_cell(&pod.phase)]);
        info.add_row(vec![Cell::new("Node"), Cell::new(or_none(pod.node.as_deref()))]);
        info.add_row(vec![Cell::new("Pod IP"), Cell::new(or_none(pod.pod_ip.as_deref()))]);
        info.add_row(vec![Cell::new("Host IP"), Cell::new(or_none(detail.host_ip.as_deref()))]);
        info.add_row(vec![Cell::new("QoS"), Cell::new(or_none(detail.qos_class.as_deref()))]);
        info.add_row(vec![Cell::new("Age"), Cell::new(self.age(pod.created))]);
        output.push_str(&info.to_string());
        output.push_str("\n\n");

        if !detail.labels.is_empty() {
            output.push_str("Labels:\n");
            for (key, value) in &detail.labels {
                output.push_str(&format!("  {}={}\n", key.cyan(), value));
            }
            output.push('\n');
        }

        if !detail.conditions.is_empty() {
            let mut table = new_table(&["CONDITION", "STATUS", "LAST TRANSITION"]);
            for condition in &detail.conditions {
                let color = if condition.status == "True" {
                    self.theme.success
                } else {
                    self.theme.error
                };
                table.add_row(vec![
                    Cell::new(&condition.condition_type),
                    Cell::new(&condition.status).fg(color),
                    Cell::new(self.age(condition.last_transition)),
                ]);
            }
            output.push_str(&table.to_string());
            output.push_str("\n\n");
        }

        let mut containers = new_table(&[
            "CONTAINER", "IMAGE", "CPU REQ/LIM", "MEM REQ/LIM", "READY", "RESTARTS", "STATE",
        ]);
        for c in &detail.containers {
            let cpu_req = parse_optional(c.requests.cpu.as_deref(), ResourceKind::Cpu).unwrap_or(0);
            let cpu_lim = parse_optional(c.limits.cpu.as_deref(), ResourceKind::Cpu).unwrap_or(0);
            let mem_req =
                parse_optional(c.requests.memory.as_deref(), ResourceKind::Memory).unwrap_or(0);
            let mem_lim =
                parse_optional(c.limits.memory.as_deref(), ResourceKind::Memory).unwrap_or(0);
            let (ready, color) = if c.ready {
                (StatusIcon::SUCCESS, self.theme.success)
            } else {
                (StatusIcon::ERROR, self.theme.error)
            };
            containers.add_row(vec![
                Cell::new(&c.name).fg(self.theme.info),
                Cell::new(&c.image),
                Cell::new(format!("{}m / {}", cpu_req, cpu_limit_text(cpu_lim))),
                Cell::new(format!("{}Mi / {}", mem_req, memory_limit_text(mem_lim))),
                Cell::new(ready).fg(color).set_alignment(CellAlignment::Center),
                Cell::new(c.restart_count).set_alignment(CellAlignment::Right),
                Cell::new(&c.state),
            ]);
        }
        output.push_str(&containers.to_string());
        output.push_str("\n\n");

        if !detail.volumes.is_empty() {
            let mut table = new_table(&["VOLUME", "TYPE"]);
            for volume in &detail.volumes {
                table.add_row(vec![Cell::new(&volume.name), Cell::new(&volume.kind)]);
            }
            output.push_str(&table.to_string());
            output.push_str("\n\n");
        }

        if !detail.secrets.is_empty() {
            let mut table = new_table(&["SECRET", "USED BY", "OPTIONAL"]);
            for secret in &detail.secrets {
                table.add_row(vec![
                    Cell::new(&secret.name).fg(self.theme.warning),
                    Cell::new(&secret.source),
                    Cell::new(if secret.optional { "yes" } else { "no" }),
                ]);
            }
            output.push_str(&table.to_string());
            output.push_str("\n\n");
        }

        if events.is_empty() {
            output.push_str("Events: <none>\n");
        } else {
            let mut table = new_table(&["TYPE", "REASON", "AGE", "FROM", "MESSAGE"]);
            for event in events {
                let color = if event.event_type == "Warning" {
                    self.theme.warning
                } else {
                    self.theme.muted
                };
                table.add_row(vec![
                    Cell::new(&event.event_type).fg(color),
                    Cell::new(&event.reason),
                    Cell::new(self.age(event.last_seen)),
                    Cell::new(&event.source),
                    Cell::new(&event.message),
                ]);
            }
            output.push_str(&table.to_string());
            output.push('\n');
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::kubernetes::IngressRuleRecord;
    use chrono::Duration;

    fn pod(name: &str, ns: &str, ready: usize, total: usize) -> PodRecord {
        PodRecord {
            name: name.to_string(),
            namespace: ns.to_string(),
            node: Some("node-a".to_string()),
            phase: "Running".to_string(),
            pod_ip: Some("10.0.0.1".to_string()),
            ready_containers: ready,
            total_containers: total,
            restarts: 0,
            created: None,
            started: None,
            containers: Vec::new(),
        }
    }

    #[test]
    fn test_render_empty_pods() {
        let renderer = TableRenderer::new();
        let output = renderer.render_pods("prod", &[]);
        assert!(output.contains("No pods found in namespace 'prod'"));
    }

    #[test]
    fn test_render_pods() {
        let renderer = TableRenderer::new();
        let output = renderer.render_pods("prod", &[pod("web-0", "prod", 1, 2)]);
        assert!(output.contains("web-0"));
        assert!(output.contains("1/2"));
        assert!(output.contains("10.0.0.1"));
    }

    #[test]
    fn test_render_pods_by_node_summary() {
        let renderer = TableRenderer::new();
        let mut groups = BTreeMap::new();
        groups.insert("node-a".to_string(), vec![pod("a", "prod", 1, 1)]);
        groups.insert(
            "unassigned".to_string(),
            vec![pod("b", "dev", 0, 1), pod("c", "dev", 0, 1)],
        );
        let output = renderer.render_pods_by_node(&groups);
        assert!(output.contains("Node node-a"));
        assert!(output.contains("Summary: 2 nodes, 3 pods"));
    }

    #[test]
    fn test_render_nodes() {
        let now = Utc::now();
        let renderer = TableRenderer::at(now);
        let nodes = vec![NodeRecord {
            name: "node-a".to_string(),
            ready: true,
            roles: vec!["worker".to_string()],
            kubelet_version: "v1.30.2".to_string(),
            allocatable_cpu: Some("3920m".to_string()),
            allocatable_memory: Some("15Gi".to_string()),
            created: Some(now - Duration::days(3)),
        }];
        let output = renderer.render_nodes(&nodes);
        assert!(output.contains("3.92 cores"));
        assert!(output.contains("15.0Gi"));
        assert!(output.contains("3d"));
        assert!(output.contains("Ready"));
    }

    #[test]
    fn test_render_urls_and_rules() {
        let renderer = TableRenderer::new();
        let ingress = IngressRecord {
            name: "web".to_string(),
            namespace: "prod".to_string(),
            hosts: vec!["web.example.com".to_string()],
            tls_hosts: vec!["web.example.com".to_string()],
            rules: vec![IngressRuleRecord {
                host: "web.example.com".to_string(),
                path: "/".to_string(),
                service: "web-svc".to_string(),
                port: "80".to_string(),
            }],
            load_balancer: Vec::new(),
            created: None,
        };
        let urls = renderer.render_urls("prod", std::slice::from_ref(&ingress));
        assert!(urls.contains("web.example.com"));
        assert!(urls.contains("<pending>"));
        assert!(urls.contains("80, 443"));

        let rules = renderer.render_ingress_rules(&ingress);
        assert!(rules.contains("web-svc"));
        assert!(rules.contains("https://web.example.com"));
    }

    #[test]
    fn test_render_pvs_detailed() {
        let renderer = TableRenderer::new();
        let pv = PvRecord {
            name: "pv-1".to_string(),
            phase: "Bound".to_string(),
            capacity: Some("10Gi".to_string()),
            access_modes: vec!["ReadWriteOnce".to_string()],
            storage_class: Some("gp3".to_string()),
            reclaim_policy: Some("Delete".to_string()),
            claim_namespace: Some("prod".to_string()),
            claim_name: Some("data".to_string()),
            volume_type: "csi".to_string(),
            created: None,
        };
        let brief = renderer.render_pvs(std::slice::from_ref(&pv), false);
        assert!(!brief.contains("prod/data"));
        let detailed = renderer.render_pvs(&[pv], true);
        assert!(detailed.contains("prod/data"));
        assert!(detailed.contains("csi"));
    }

    #[test]
    fn test_render_contexts() {
        let renderer = TableRenderer::new();
        let output = renderer.render_contexts(&[KubeContext {
            name: "arn:aws:eks:us-east-1:1:cluster/prod".to_string(),
            cluster: "prod".to_string(),
            user: "admin".to_string(),
            namespace: None,
            current: true,
        }]);
        assert!(output.contains("admin"));
        assert!(output.contains(StatusIcon::SUCCESS));
    }
}
