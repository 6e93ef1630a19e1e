//! Flat key=value credentials file
//!
//! Reads the FTP host, username and password the deploy tool needs.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::core::{DeployError, Result};

/// Key holding the FTP host
pub const HOST_KEY: &str = "HOSTINGER_FTP_HOST";
/// Key holding the FTP username
pub const USERNAME_KEY: &str = "HOSTINGER_FTP_USERNAME";
/// Key holding the FTP password
pub const PASSWORD_KEY: &str = "HOSTINGER_FTP_PASSWORD";
/// Optional key overriding the control port
pub const PORT_KEY: &str = "HOSTINGER_FTP_PORT";

/// Connection credentials extracted from the credentials file
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Bare hostname, scheme stripped
    pub host: String,
    pub username: String,
    pub password: String,
    /// Port from the file, if it set one
    pub port: Option<u16>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"********")
            .field("port", &self.port)
            .finish()
    }
}

impl Credentials {
    /// Extract credentials from parsed entries
    pub fn from_entries(entries: &HashMap<String, String>) -> Result<Self> {
        let present = |key: &str| entries.get(key).filter(|v| !v.is_empty());

        let missing: Vec<String> = [HOST_KEY, USERNAME_KEY, PASSWORD_KEY]
            .into_iter()
            .filter(|key| present(*key).is_none())
            .map(String::from)
            .collect();

        if !missing.is_empty() {
            return Err(DeployError::MissingKeys(missing));
        }

        let port = match present(PORT_KEY) {
            Some(raw) => Some(raw.parse::<u16>().map_err(|_| {
                DeployError::config(format!("{} must be a port number, got '{}'", PORT_KEY, raw))
            })?),
            None => None,
        };

        Ok(Self {
            host: strip_scheme(&entries[HOST_KEY]).to_string(),
            username: entries[USERNAME_KEY].clone(),
            password: entries[PASSWORD_KEY].clone(),
            port,
        })
    }
}

/// Parse a line-oriented key=value file
///
/// Lines are trimmed; empty lines, `#` comments and lines without `=` are
/// skipped. The first `=` separates key from value, later keys overwrite
/// earlier ones.
pub fn parse_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.is_file() {
        return Err(DeployError::ConfigNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    Ok(parse_env_str(&content))
}

/// Parse key=value content already in memory
pub fn parse_env_str(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Remove a leading `scheme://` from a host; the FTP client wants a bare name
pub fn strip_scheme(host: &str) -> &str {
    let host = host.trim();
    let bare = match host.split_once("://") {
        Some((scheme, rest))
            if !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) =>
        {
            rest
        }
        _ => host,
    };
    bare.trim_end_matches('/')
}

/// Read the credentials file and extract the FTP credentials
pub fn load_credentials(path: &Path) -> Result<Credentials> {
    let entries = parse_env_file(path)?;
    Credentials::from_entries(&entries)
}
