//! Shared types used across sitedeploy modules
//!
//! Contains upload bookkeeping and smoke-check results.

use std::fmt;
use std::path::PathBuf;

/// A file that could not be uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUpload {
    /// Remote-style relative path (`/` separated)
    pub path: String,
    /// Why it failed
    pub error: String,
}

/// Aggregate result of an upload run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Number of files stored successfully
    pub succeeded: usize,
    /// Total bytes stored
    pub bytes: u64,
    /// Files that failed, in walk order
    pub failures: Vec<FailedUpload>,
}

impl UploadOutcome {
    /// Record a successful transfer
    pub fn record_success(&mut self, bytes: u64) {
        self.succeeded += 1;
        self.bytes += bytes;
    }

    /// Record a failed transfer
    pub fn record_failure(&mut self, path: impl Into<String>, error: impl Into<String>) {
        self.failures.push(FailedUpload {
            path: path.into(),
            error: error.into(),
        });
    }

    /// Number of files that failed
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Total number of transfers attempted
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed()
    }

    /// Whether every file went through
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files uploaded, {} errors",
            self.succeeded,
            self.failed()
        )
    }
}

/// Result of a passing smoke check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeReport {
    /// Page that was checked
    pub url: String,
    /// Selector that was found
    pub selector: String,
    /// Screenshot written on success
    pub screenshot: PathBuf,
}
