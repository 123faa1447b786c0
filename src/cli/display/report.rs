//! Resource usage reports for the metrics commands

use super::format::{
    cores_text, cpu_limit_text, cpu_text, gibibytes_text, memory_limit_text, memory_text,
    optional_percent_text, utilization_text,
};
use super::table::title_line;
use super::{ColorTheme, StatusIcon};
use crate::domain::usage::{AggregateTotals, ClusterReport, NodeReport, ScopeReport, SubjectReport};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, CellAlignment, ContentArrangement, Table};

const USAGE_HEADERS: [&str; 9] = [
    "POD", "CPU REQ", "CPU LIM", "CPU USE", "CPU %", "MEM REQ", "MEM LIM", "MEM USE", "MEM %",
];

/// Renders aggregation results as tables with a summary.
pub struct ReportRenderer {
    theme: ColorTheme,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRenderer {
    pub fn new() -> Self {
        Self {
            theme: ColorTheme::default(),
        }
    }

    /// Usage columns behind `leading`, which replaces the POD header.
    fn usage_table(&self, leading: &[&str]) -> Table {
        let mut table = Table::new();
        let headers: Vec<&str> = leading
            .iter()
            .chain(USAGE_HEADERS.iter().skip(1))
            .copied()
            .collect();
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

    fn used_cell(&self, text: String, observed: bool) -> Cell {
        if observed {
            Cell::new(text).set_alignment(CellAlignment::Right)
        } else {
            Cell::new("-")
                .fg(self.theme.muted)
                .set_alignment(CellAlignment::Right)
        }
    }

    fn subject_row(&self, subject: &SubjectReport) -> Vec<Cell> {
        let profile = &subject.profile;
        let observed = subject.used.is_some();
        vec![
            Cell::new(&profile.name).fg(self.theme.info),
            Cell::new(cpu_text(profile.requests.cpu)).set_alignment(CellAlignment::Right),
            Cell::new(cpu_limit_text(profile.limits.cpu)).set_alignment(CellAlignment::Right),
            self.used_cell(cpu_text(subject.cpu_used()), observed),
            Cell::new(utilization_text(&subject.cpu))
                .fg(self.theme.get_utilization_color(&subject.cpu)),
            Cell::new(memory_text(profile.requests.memory)).set_alignment(CellAlignment::Right),
            Cell::new(memory_limit_text(profile.limits.memory)).set_alignment(CellAlignment::Right),
            self.used_cell(memory_text(subject.memory_used()), observed),
            Cell::new(utilization_text(&subject.memory))
                .fg(self.theme.get_utilization_color(&subject.memory)),
        ]
    }

    fn totals_row(&self, label: &str, totals: &AggregateTotals) -> Vec<Cell> {
        let cpu = totals.cpu_utilization();
        let memory = totals.memory_utilization();
        vec![
            Cell::new(label).add_attribute(Attribute::Bold),
            Cell::new(cpu_text(totals.cpu_request)).set_alignment(CellAlignment::Right),
            Cell::new(cpu_limit_text(totals.cpu_limit)).set_alignment(CellAlignment::Right),
            Cell::new(cpu_text(totals.cpu_used)).set_alignment(CellAlignment::Right),
            Cell::new(utilization_text(&cpu)).fg(self.theme.get_utilization_color(&cpu)),
            Cell::new(memory_text(totals.memory_request)).set_alignment(CellAlignment::Right),
            Cell::new(memory_limit_text(totals.memory_limit)).set_alignment(CellAlignment::Right),
            Cell::new(memory_text(totals.memory_used)).set_alignment(CellAlignment::Right),
            Cell::new(utilization_text(&memory)).fg(self.theme.get_utilization_color(&memory)),
        ]
    }

    fn no_metrics_note(&self) -> String {
        format!(
            "{} No usage data from metrics-server, showing requests and limits only\n",
            StatusIcon::WARNING.yellow()
        )
    }

    fn over_allocated_lines(&self, report: &ScopeReport) -> String {
        let mut output = String::new();
        for subject in report.over_allocated() {
            let mut parts = Vec::new();
            if subject.cpu.is_over_allocated() {
                parts.push(format!(
                    "CPU {} of {} requested",
                    cpu_text(subject.cpu_used()),
                    cpu_text(subject.profile.requests.cpu)
                ));
            }
            if subject.memory.is_over_allocated() {
                parts.push(format!(
                    "memory {} of {} requested",
                    memory_text(subject.memory_used()),
                    memory_text(subject.profile.requests.memory)
                ));
            }
            output.push_str(&format!(
                "  {} {} is above allocated: {}\n",
                StatusIcon::WARNING.yellow(),
                subject.profile.name,
                parts.join(", ")
            ));
        }
        output
    }

    /// Per-pod table of one namespace with a TOTAL row and a summary.
    pub fn render_scope(&self, report: &ScopeReport) -> String {
        if report.is_empty() {
            return format!("No running pods found in namespace '{}'", report.scope);
        }

        let mut table = self.usage_table(&["POD"]);
        for subject in &report.subjects {
            table.add_row(self.subject_row(subject));
        }
        table.add_row(self.totals_row("TOTAL", &report.totals));

        let mut output = title_line(
            &format!("Resource usage in {}", report.scope),
            &format!("[{} pods]", report.subjects.len()),
        );
        if !report.has_usage {
            output.push_str(&self.no_metrics_note());
        }
        output.push_str(&table.to_string());
        output.push_str("\n\n");
        output.push_str(&self.summary(report));
        output
    }

    fn summary(&self, report: &ScopeReport) -> String {
        let mut output = self.totals_summary(&report.totals);

        let flagged = self.over_allocated_lines(report);
        if flagged.is_empty() {
            if report.has_usage {
                output.push_str(&self.all_within_line());
            }
        } else {
            output.push_str(&flagged);
        }
        output
    }

    fn all_within_line(&self) -> String {
        format!(
            "  {} All pods are within their requests\n",
            StatusIcon::SUCCESS.green()
        )
    }

    fn totals_summary(&self, totals: &AggregateTotals) -> String {
        let mut output = String::from("Summary:\n");
        output.push_str(&format!(
            "  CPU:    {} used of {} requested ({})\n",
            cpu_text(totals.cpu_used),
            cpu_text(totals.cpu_request),
            utilization_text(&totals.cpu_utilization())
        ));
        output.push_str(&format!(
            "  Memory: {} used of {} requested ({})\n",
            memory_text(totals.memory_used),
            memory_text(totals.memory_request),
            utilization_text(&totals.memory_utilization())
        ));
        output
    }

    /// Pod rows grouped by namespace, a subtotal per namespace and a grand
    /// total, followed by the cluster summary.
    pub fn render_cluster(&self, report: &ClusterReport) -> String {
        if report.namespaces.is_empty() {
            return "No running pods found".to_string();
        }

        let mut table = self.usage_table(&["NAMESPACE", "POD"]);
        for namespace in &report.namespaces {
            for subject in &namespace.subjects {
                let mut row = vec![Cell::new(&namespace.scope).fg(self.theme.muted)];
                row.extend(self.subject_row(subject));
                table.add_row(row);
            }

            let mut subtotal = vec![Cell::new(format!(
                "{} ({})",
                namespace.scope,
                namespace.subjects.len()
            ))
            .fg(self.theme.info)
            .add_attribute(Attribute::Bold)];
            subtotal.extend(self.totals_row("Subtotal", &namespace.totals));
            table.add_row(subtotal);
        }
        let mut total = vec![Cell::new("TOTAL").add_attribute(Attribute::Bold)];
        total.extend(self.totals_row("", &report.totals));
        table.add_row(total);

        let mut output = title_line(
            "Cluster resource usage",
            &format!(
                "[{} namespaces, {} pods]",
                report.namespaces.len(),
                report.pod_count()
            ),
        );
        if !report.has_usage {
            output.push_str(&self.no_metrics_note());
        }
        output.push_str(&table.to_string());
        output.push_str("\n\n");
        output.push_str(&self.totals_summary(&report.totals));

        let flagged: String = report
            .namespaces
            .iter()
            .map(|ns| self.over_allocated_lines(ns))
            .collect();
        if !flagged.is_empty() {
            output.push_str("\nPods above allocated:\n");
            output.push_str(&flagged);
        } else if report.has_usage {
            output.push_str(&self.all_within_line());
        }
        output
    }

    /// Capacity, allocation and hot pods per node.
    pub fn render_nodes(&self, reports: &[NodeReport]) -> String {
        if reports.is_empty() {
            return "No nodes found".to_string();
        }

        let mut output = String::new();
        for node in reports {
            output.push_str(&title_line(
                &format!("Node {}", node.name),
                &format!("[{} pods]", node.pods.subjects.len()),
            ));

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    Cell::new("RESOURCE"),
                    Cell::new("ALLOCATABLE"),
                    Cell::new("REQUESTED"),
                    Cell::new("ALLOCATED %"),
                    Cell::new("USED"),
                    Cell::new("USED %"),
                ]);
            table.add_row(vec![
                Cell::new("CPU"),
                Cell::new(cores_text(node.allocatable.cpu)),
                Cell::new(cpu_text(node.pods.totals.cpu_request)),
                Cell::new(optional_percent_text(node.cpu_allocated_percent())),
                Cell::new(
                    node.node_used
                        .map(|u| cpu_text(u.cpu))
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::new(optional_percent_text(node.cpu_used_percent())),
            ]);
            table.add_row(vec![
                Cell::new("Memory"),
                Cell::new(gibibytes_text(node.allocatable.memory)),
                Cell::new(memory_text(node.pods.totals.memory_request)),
                Cell::new(optional_percent_text(node.memory_allocated_percent())),
                Cell::new(
                    node.node_used
                        .map(|u| memory_text(u.memory))
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::new(optional_percent_text(node.memory_used_percent())),
            ]);
            output.push_str(&table.to_string());
            output.push('\n');

            let hot = node.hot_pods();
            if node.pods.has_usage && !hot.is_empty() {
                output.push_str("Top pods by CPU:\n");
                for (rank, subject) in hot.iter().enumerate() {
                    output.push_str(&format!(
                        "  {}. {}/{}  {}  {}\n",
                        rank + 1,
                        subject.profile.namespace,
                        subject.profile.name,
                        cpu_text(subject.cpu_used()),
                        memory_text(subject.memory_used())
                    ));
                }
            }
            output.push('\n');
        }
        output
    }
}
