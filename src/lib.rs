//! DLMM Rebalance Bot - Main Library
//!
//! This crate ties the workspace together for the binary executables:
//!
//! - **bin_common**: Common utilities for binaries (config paths, yaml
//!   loading, logging setup)
//! - **poolwatch**: The watch core (re-exported from the workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust
//! use dlmm_rebalance_bot::bin_common::{load_config_from_env, ConfigType};
//! ```

// Re-export workspace libraries for convenience
pub use poolwatch;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables
    //!
    //! Shared functionality for the presentation layer (binaries):
    //! configuration resolution and logging initialization.

    pub mod cli;
    pub mod runner;

    pub use cli::{load_config_from_env, parse_args, ConfigType};
    pub use runner::{init_tracing, MonitorConfig};
}
