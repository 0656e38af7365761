//! DBNode configurator
//!
//! A library for collecting, validating and persisting the machine-specific
//! settings of a clustered database node: typed options with a shared
//! check/re-prompt lifecycle, host interface and route resolution, and the
//! flat config file they are saved to.

pub mod config;
pub mod network;
pub mod options;
pub mod service;
pub mod system;
pub mod time;
