//! Color theme for CLI output

use crate::domain::usage::Utilization;
use comfy_table::Color as TableColor;

/// Color theme for terminal output
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub success: TableColor,
    pub warning: TableColor,
    pub error: TableColor,
    pub info: TableColor,
    pub muted: TableColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            success: TableColor::Green,
            warning: TableColor::Yellow,
            error: TableColor::Red,
            info: TableColor::Cyan,
            muted: TableColor::DarkGrey,
        }
    }
}

impl ColorTheme {
    /// Get color based on ready/total containers
    pub fn get_ready_color(&self, ready: usize, total: usize) -> TableColor {
        if total == 0 {
            self.muted
        } else if ready == total {
            self.success
        } else if ready > 0 {
            self.warning
        } else {
            self.error
        }
    }

    /// Pod, namespace and volume phases
    pub fn get_phase_color(&self, phase: &str) -> TableColor {
        match phase {
            "Running" | "Active" | "Bound" | "Available" | "Succeeded" | "Ready" => self.success,
            "Pending" | "Released" | "Terminating" => self.warning,
            "Unknown" => self.muted,
            _ => self.error,
        }
    }

    pub fn get_utilization_color(&self, utilization: &Utilization) -> TableColor {
        match utilization {
            Utilization::Percent {
                over_allocated: true,
                ..
            } => self.error,
            Utilization::Percent { value, .. } if *value >= 80.0 => self.warning,
            Utilization::Percent { .. } => self.success,
            Utilization::NoRequest => self.warning,
            Utilization::NotApplicable => self.muted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_theme() {
        let theme = ColorTheme::default();
        assert_eq!(theme.success, TableColor::Green);
        assert_eq!(theme.warning, TableColor::Yellow);
        assert_eq!(theme.error, TableColor::Red);
    }

    #[test]
    fn test_get_ready_color() {
        let theme = ColorTheme::default();
        assert_eq!(theme.get_ready_color(3, 3), TableColor::Green);
        assert_eq!(theme.get_ready_color(2, 3), TableColor::Yellow);
        assert_eq!(theme.get_ready_color(0, 3), TableColor::Red);
        assert_eq!(theme.get_ready_color(0, 0), TableColor::DarkGrey);
    }

    #[test]
    fn test_get_phase_color() {
        let theme = ColorTheme::default();
        assert_eq!(theme.get_phase_color("Bound"), TableColor::Green);
        assert_eq!(theme.get_phase_color("Pending"), TableColor::Yellow);
        assert_eq!(theme.get_phase_color("Failed"), TableColor::Red);
    }

    #[test]
    fn test_get_utilization_color() {
        let theme = ColorTheme::default();
        assert_eq!(
            theme.get_utilization_color(&Utilization::compute(150, 100)),
            TableColor::Red
        );
        assert_eq!(
            theme.get_utilization_color(&Utilization::compute(90, 100)),
            TableColor::Yellow
        );
        assert_eq!(
            theme.get_utilization_color(&Utilization::compute(10, 100)),
            TableColor::Green
        );
        assert_eq!(
            theme.get_utilization_color(&Utilization::compute(0, 0)),
            TableColor::DarkGrey
        );
    }
}
