//! Error types for the config file and command line.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for configuration operations.
///
/// Covers reading and writing the config file and building the command
/// line from the option registry.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the configuration file.
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A per-option flag would shadow a built-in one.
    #[error("Option flag --{flag} for {variable} clashes with a built-in flag")]
    FlagClash {
        /// Flag name without dashes
        flag: String,
        /// Config file key of the option
        variable: String,
    },
}
