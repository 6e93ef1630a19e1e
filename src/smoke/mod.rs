//! Smoke-check module
//!
//! Drives a headless browser through agent-browser to confirm a page renders.

mod browser;
mod check;

pub use browser::{AgentBrowser, BrowserDriver};
pub use check::run_smoke_check;
