//! sitedeploy - static site deployment helpers
//!
//! Two independent tools share this crate: `deploy` mirrors a local build
//! directory onto an FTP server, and `smoke-check` loads the site in a
//! headless browser and saves a screenshot.
//!
//! # Architecture
//!
//! - **Core**: Settings, error handling, and shared result types
//! - **Deploy**: Credentials file, remote filesystem abstraction, FTP session, uploader
//! - **Smoke**: Browser driver over agent-browser and the page check
//! - **CLI**: Argument parsing and logging setup
//!
//! # Usage
//!
//! ```rust,no_run
//! use sitedeploy::{deploy, Settings};
//!
//! fn main() -> sitedeploy::Result<()> {
//!     let settings = Settings::load()?;
//!     let outcome = deploy::run(&settings)?;
//!     println!("{}", outcome);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod core;
pub mod deploy;
pub mod smoke;

// Re-export commonly used items
pub use core::{DeployError, Result, Settings, SmokeReport, UploadOutcome};
