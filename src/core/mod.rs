//! Core module - shared infrastructure for sitedeploy
//!
//! This module contains foundational types, configuration, and error handling
//! used by both the deploy and smoke-check tools.

pub mod config;
pub mod error;
pub mod types;

pub use config::Settings;
pub use error::{DeployError, RemoteError, Result};
pub use types::*;
