// Command line surface of the jera binary

pub mod cluster;
pub mod commands;
pub mod context;
pub mod display;
pub mod metrics;
pub mod pods;
pub mod prompt;
pub mod resources;

pub use commands::{CliArgs, Commands};
pub use context::AppContext;
