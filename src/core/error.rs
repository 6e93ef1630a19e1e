//! Custom error types for sitedeploy
//!
//! Provides a unified error handling system across the deploy and
//! smoke-check tools.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for sitedeploy operations
#[derive(Error, Debug)]
pub enum DeployError {
    /// Local build output directory is missing
    #[error("Build directory '{}' not found. Run the site build first (e.g. `npm run build`).", .0.display())]
    MissingBuildDir(PathBuf),

    /// Credentials file is missing
    #[error("Configuration file '{}' not found", .0.display())]
    ConfigNotFound(PathBuf),

    /// Required keys are absent from the credentials file
    #[error("Missing required configuration keys: {}", .0.join(", "))]
    MissingKeys(Vec<String>),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Login or permission refused by the remote server
    #[error("Authentication failed: {0}. Check the FTP username and password.")]
    Auth(String),

    /// Remote file-transfer errors
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Directory walk errors
    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Browser automation errors
    #[error("Browser error: {0}")]
    Browser(String),

    /// Agent-browser not installed
    #[error("agent-browser not found. Install with: npm install -g agent-browser && agent-browser install")]
    AgentBrowserNotFound,

    /// A bounded wait ran out
    #[error("Timed out after {}ms waiting for {what}", .after.as_millis())]
    Timeout { what: String, after: Duration },

    /// Smoke check failed; carries the screenshot taken of the failing page
    #[error("Smoke check failed: {source}")]
    SmokeCheck {
        #[source]
        source: Box<DeployError>,
        screenshot: Option<PathBuf>,
    },
}

/// Convenience Result type for sitedeploy operations
pub type Result<T> = std::result::Result<T, DeployError>;

impl DeployError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a browser error
    pub fn browser(msg: impl Into<String>) -> Self {
        Self::Browser(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(what: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            what: what.into(),
            after,
        }
    }

    /// Whether the error is a precondition failure detected before any
    /// network action
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingBuildDir(_)
                | Self::ConfigNotFound(_)
                | Self::MissingKeys(_)
                | Self::Config(_)
        )
    }
}

/// Error returned by a remote file-transfer endpoint
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The server answered with an error reply
    #[error("Remote rejected request ({code}): {message}")]
    Rejected { code: u32, message: String },

    /// The control or data connection failed
    #[error("Remote connection error: {0}")]
    Connection(String),
}

impl RemoteError {
    /// Create a rejection with the given reply code
    pub fn rejected(code: u32, message: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            message: message.into(),
        }
    }

    /// Permanent negative completion (5xx): permission denied, not found, ...
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Rejected { code, .. } if (500..600).contains(code))
    }

    /// Not logged in / login refused
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Rejected { code: 530 | 532, .. })
    }
}
