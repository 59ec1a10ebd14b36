//! CLI command implementations

pub mod authenticate;
pub mod check_config;
pub mod hash;

use crate::OutputFormat;
use verity_core::VerityConfig;

/// Context passed to all commands
pub struct CommandContext {
    pub config: VerityConfig,
    pub output_format: OutputFormat,
}

impl CommandContext {
    /// Check if output should be JSON
    pub fn is_json(&self) -> bool {
        matches!(self.output_format, OutputFormat::Json)
    }

    /// Print a serializable value as pretty JSON
    pub fn print_json<T: serde::Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}
