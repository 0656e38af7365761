//! Configuration layer for the DBNode configurator.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Invocation`]), extended with one flag
//!   per user-settable option
//! - The node config file ([`ConfigFile`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Option values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI flags** - applied after the file
//! 2. **Config file** - only when `--load-config`, `--reconfigure` or
//!    `--print-config` is given
//! 3. **Built-in defaults** - derived from the host where they depend on it
//!
//! Interactive answers given in wizard mode or on re-prompt override all
//! three.

mod cli;
pub mod defaults;
mod error;
mod file;


pub use cli::{Assignment, Cli, FlagValue, Invocation, command};
pub use error::ConfigError;
pub use file::{ConfigFile, parse};
