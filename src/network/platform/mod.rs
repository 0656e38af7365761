//! Platform-specific network interface fetcher implementations.
//!
//! This module provides conditional compilation for platform-specific
//! implementations of the [`InterfaceFetcher`](super::InterfaceFetcher) trait.
//!
//! # Platform Support
//!
//! - **Linux**: Uses `getifaddrs` via the `nix` crate.

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "linux")]
pub use linux::LinuxFetcher;

// Re-export platform-specific fetcher as PlatformFetcher for convenience
#[cfg(target_os = "linux")]
pub use linux::LinuxFetcher as PlatformFetcher;
