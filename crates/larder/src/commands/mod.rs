//! CLI command handlers.

pub mod config;
pub mod soak;

use larder_config::{ConfigSource, LarderConfig};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Merged configuration.
    pub config: LarderConfig,
    /// Config files that were checked, lowest precedence first.
    pub sources: Vec<ConfigSource>,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}
