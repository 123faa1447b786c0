//! Display module for formatted CLI output

pub mod colors;
pub mod format;
pub mod icons;
pub mod report;
pub mod table;

pub use colors::ColorTheme;
pub use icons::StatusIcon;
pub use report::ReportRenderer;
pub use table::TableRenderer;
