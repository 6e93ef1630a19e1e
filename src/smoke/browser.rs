//! Browser driver - wraps agent-browser CLI
//!
//! Provides an async interface to the handful of agent-browser commands the
//! smoke check needs.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::core::config::SmokeConfig;
use crate::core::{DeployError, Result};
use crate::deploy::credentials::{HOST_KEY, PASSWORD_KEY, PORT_KEY, USERNAME_KEY};

/// Variables a loaded `.env` may have put in our environment that the
/// browser has no business seeing
const WITHHELD_ENV: [&str; 4] = [HOST_KEY, USERNAME_KEY, PASSWORD_KEY, PORT_KEY];

/// An agent-browser command with the FTP credentials stripped from its environment
fn agent_browser() -> Command {
    let mut cmd = Command::new("agent-browser");
    for key in WITHHELD_ENV {
        cmd.env_remove(key);
    }
    cmd
}

/// Operations the smoke check performs on a browser page
#[async_trait]
pub trait BrowserDriver: Send {
    /// Navigate to a URL
    async fn open(&mut self, url: &str) -> Result<()>;

    /// Wait until an element matching `selector` is present
    async fn wait_for(&mut self, selector: &str) -> Result<()>;

    /// Save a screenshot of the current page
    async fn screenshot(&mut self, path: &Path, full_page: bool) -> Result<()>;

    /// Close the browser
    async fn close(&mut self) -> Result<()>;
}

/// Browser automation via the agent-browser CLI
pub struct AgentBrowser {
    /// Session name for isolation
    session_name: String,
    /// Whether to run in headed mode
    headed: bool,
    /// Upper bound for a single command
    command_timeout: Duration,
}

impl AgentBrowser {
    /// Create a new browser driver
    pub fn new(session_name: impl Into<String>) -> Self {
        Self {
            session_name: session_name.into(),
            headed: false,
            command_timeout: Duration::from_secs(60),
        }
    }

    /// Create a driver from smoke-check settings, failing if agent-browser is missing
    pub async fn launch(config: &SmokeConfig) -> Result<Self> {
        if !Self::is_available().await {
            return Err(DeployError::AgentBrowserNotFound);
        }

        let mut browser = Self::new(config.session_name.clone());
        browser.set_headed(config.headed);
        browser.command_timeout = config.navigation_timeout() + config.selector_timeout();
        Ok(browser)
    }

    /// Set headed mode
    pub fn set_headed(&mut self, headed: bool) {
        self.headed = headed;
    }

    /// Check if agent-browser is installed
    pub async fn is_available() -> bool {
        agent_browser()
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Arguments for one invocation, session and mode flags first
    fn command_args<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut full = vec!["--session", self.session_name.as_str()];
        if self.headed {
            full.push("--headed");
        }
        full.extend_from_slice(args);
        full
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = agent_browser();
        cmd.args(self.command_args(args));
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd
    }

    /// Run an agent-browser command
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = self.command(args);

        debug!("agent-browser {}", args.join(" "));

        let output = tokio::time::timeout(self.command_timeout, cmd.output())
            .await
            .map_err(|_| {
                DeployError::timeout(format!("agent-browser {}", args.join(" ")), self.command_timeout)
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DeployError::AgentBrowserNotFound
                } else {
                    DeployError::browser(format!("Failed to run agent-browser: {}", e))
                }
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(DeployError::browser(format!(
                "agent-browser command failed: {}",
                stderr.trim()
            )))
        }
    }
}

#[async_trait]
impl BrowserDriver for AgentBrowser {
    async fn open(&mut self, url: &str) -> Result<()> {
        self.run_command(&["open", url]).await?;
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str) -> Result<()> {
        self.run_command(&["wait", selector]).await?;
        Ok(())
    }

    async fn screenshot(&mut self, path: &Path, full_page: bool) -> Result<()> {
        let path = path.to_string_lossy();
        let mut args = vec!["screenshot", path.as_ref()];

        if full_page {
            args.push("--full");
        }

        self.run_command(&args).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.run_command(&["close"]).await?;
        Ok(())
    }
}

impl Default for AgentBrowser {
    fn default() -> Self {
        Self::new("sitedeploy-smoke")
    }
}
