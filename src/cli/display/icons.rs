//! Status icons for CLI output

/// Status icons for different states
pub struct StatusIcon;

impl StatusIcon {
    /// Success icon (all containers ready)
    pub const SUCCESS: &'static str = "✓";

    /// Warning icon (partially ready, over-allocated)
    pub const WARNING: &'static str = "⚠";

    /// Error icon (nothing ready)
    pub const ERROR: &'static str = "✗";

    /// Pending icon (waiting)
    pub const PENDING: &'static str = "⏳";

    /// Unknown icon
    pub const UNKNOWN: &'static str = "?";

    /// Info icon
    pub const INFO: &'static str = "ℹ";

    /// Shown in place of a zero limit
    pub const UNLIMITED: &'static str = "∞";

    /// Get status icon based on ready/total containers
    pub fn get_ready_icon(ready: usize, total: usize) -> &'static str {
        if total == 0 {
            Self::UNKNOWN
        } else if ready == total {
            Self::SUCCESS
        } else if ready > 0 {
            Self::WARNING
        } else {
            Self::ERROR
        }
    }

    /// Icon for a pod or volume phase
    pub fn get_phase_icon(phase: &str) -> &'static str {
        match phase {
            "Running" | "Active" | "Bound" | "Available" | "Succeeded" => Self::SUCCESS,
            "Pending" | "ContainerCreating" => Self::PENDING,
            "Unknown" => Self::UNKNOWN,
            _ => Self::ERROR,
        }
    }
}
