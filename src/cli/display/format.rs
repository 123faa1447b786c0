//! Value formatting shared by the tables

use super::StatusIcon;
use crate::domain::quantity::{format_cpu, format_memory};
use crate::domain::usage::Utilization;
use chrono::{DateTime, Utc};

/// Compact age such as `45s`, `12m`, `3h` or `20d`.
pub fn format_age(created: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(created) = created else {
        return "-".to_string();
    };
    let secs = (now - created).num_seconds().max(0);
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3_600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h", secs / 3_600)
    } else {
        format!("{}d", secs / 86_400)
    }
}

pub fn cpu_text(millicores: u64) -> String {
    format_cpu(millicores)
}

pub fn memory_text(mebibytes: u64) -> String {
    format_memory(mebibytes)
}

/// Limits of zero mean "no limit".
pub fn cpu_limit_text(millicores: u64) -> String {
    if millicores == 0 {
        StatusIcon::UNLIMITED.to_string()
    } else {
        cpu_text(millicores)
    }
}

pub fn memory_limit_text(mebibytes: u64) -> String {
    if mebibytes == 0 {
        StatusIcon::UNLIMITED.to_string()
    } else {
        memory_text(mebibytes)
    }
}

/// Allocatable CPU as cores, e.g. `3.92 cores`.
pub fn cores_text(millicores: u64) -> String {
    let cores = millicores as f64 / 1000.0;
    if millicores % 1000 == 0 {
        format!("{} cores", millicores / 1000)
    } else {
        format!("{:.2} cores", cores)
    }
}

/// Memory in GiB with one decimal, e.g. `15.5Gi`.
pub fn gibibytes_text(mebibytes: u64) -> String {
    format!("{:.1}Gi", mebibytes as f64 / 1024.0)
}

pub fn utilization_text(utilization: &Utilization) -> String {
    match utilization {
        Utilization::Percent {
            value,
            over_allocated: true,
        } => format!("{} {:.1}%", StatusIcon::WARNING, value),
        Utilization::Percent { value, .. } => format!("{:.1}%", value),
        Utilization::NoRequest => format!("{} no request", StatusIcon::WARNING),
        Utilization::NotApplicable => "N/A".to_string(),
    }
}

pub fn optional_percent_text(percent: Option<f64>) -> String {
    percent
        .map(|p| format!("{:.1}%", p))
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn or_none(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or("<none>")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_age() {
        let now = Utc::now();
        assert_eq!(format_age(Some(now - Duration::seconds(42)), now), "42s");
        assert_eq!(format_age(Some(now - Duration::minutes(5)), now), "5m");
        assert_eq!(format_age(Some(now - Duration::hours(3)), now), "3h");
        assert_eq!(format_age(Some(now - Duration::days(12)), now), "12d");
        assert_eq!(format_age(None, now), "-");
        assert_eq!(format_age(Some(now + Duration::seconds(5)), now), "0s");
    }

    #[test]
    fn test_limit_text() {
        assert_eq!(cpu_limit_text(0), "∞");
        assert_eq!(cpu_limit_text(500), "500m");
        assert_eq!(memory_limit_text(0), "∞");
        assert_eq!(memory_limit_text(256), "256Mi");
    }

    #[test]
    fn test_capacity_text() {
        assert_eq!(cores_text(4000), "4 cores");
        assert_eq!(cores_text(3920), "3.92 cores");
        assert_eq!(gibibytes_text(15 * 1024 + 512), "15.5Gi");
    }

    #[test]
    fn test_utilization_text() {
        assert_eq!(utilization_text(&Utilization::compute(50, 100)), "50.0%");
        assert_eq!(utilization_text(&Utilization::compute(150, 100)), "⚠ 150.0%");
        assert_eq!(utilization_text(&Utilization::compute(50, 0)), "⚠ no request");
        assert_eq!(utilization_text(&Utilization::compute(0, 0)), "N/A");
    }
}
