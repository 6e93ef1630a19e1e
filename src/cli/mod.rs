//! CLI module - command-line interface
//!
//! Contains argument parsing and logging setup for the two binaries.

pub mod args;
pub mod logging;

pub use args::{DeployArgs, SmokeArgs};
pub use logging::init_logging;
