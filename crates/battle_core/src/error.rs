//! Error types for the battle simulation.
//!
//! Stepping the engine never fails; errors only come from building or
//! loading a configuration.

use thiserror::Error;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Top-level error type for simulation setup.
#[derive(Debug, Error)]
pub enum SimError {
    /// A configuration value is out of its allowed range.
    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfig {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Failed to read a configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead {
        /// Path to the file that failed to load.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a RON configuration.
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    /// Agent identifier does not exist in the current population.
    #[error("Agent not found: {0}")]
    AgentNotFound(u32),
}
