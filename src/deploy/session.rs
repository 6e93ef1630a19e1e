//! Deploy orchestration
//!
//! Checks preconditions, opens the remote session, runs the uploader and
//! closes the session again.

use tracing::{info, warn};

use crate::core::config::FtpConfig;
use crate::core::{DeployError, Result, Settings, UploadOutcome};
use crate::deploy::credentials::{load_credentials, Credentials};
use crate::deploy::ftp::FtpSession;
use crate::deploy::memory::MemoryRemote;
use crate::deploy::remote::RemoteFs;
use crate::deploy::uploader::Uploader;

/// Deploy the build directory over FTP
pub fn run(settings: &Settings) -> Result<UploadOutcome> {
    run_with(settings, FtpSession::connect)
}

/// Deploy against an in-memory remote; nothing leaves the machine
pub fn dry_run(settings: &Settings) -> Result<UploadOutcome> {
    run_with(settings, |_, _| Ok(MemoryRemote::new()))
}

/// Deploy with a caller-supplied connection factory
///
/// `connect` is only called once the build directory and the credentials
/// file have both been validated.
pub fn run_with<R, F>(settings: &Settings, connect: F) -> Result<UploadOutcome>
where
    R: RemoteFs,
    F: FnOnce(&Credentials, &FtpConfig) -> Result<R>,
{
    let local_dir = &settings.upload.local_dir;
    if !local_dir.is_dir() {
        return Err(DeployError::MissingBuildDir(local_dir.clone()));
    }

    let credentials = load_credentials(&settings.upload.env_file)?;
    info!(
        "Deploying {} to {}@{}:{}",
        local_dir.display(),
        credentials.username,
        credentials.host,
        settings.upload.remote_dir
    );

    let mut remote = connect(&credentials, &settings.ftp)?;

    let result = Uploader::new(&mut remote, settings.upload.remote_dir.as_str())
        .cleanup_partial(settings.upload.cleanup_partial)
        .upload_tree(local_dir);

    match result {
        Ok(outcome) => {
            remote.close()?;
            info!("Connection closed");
            Ok(outcome)
        }
        Err(e) => {
            if let Err(close_err) = remote.close() {
                warn!("Failed to close connection: {}", close_err);
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::fs;
    use tempfile::TempDir;

    fn settings_in(dir: &TempDir) -> Settings {
        let mut settings = Settings::default();
        settings.upload.local_dir = dir.path().join("dist");
        settings.upload.env_file = dir.path().join(".env");
        settings.upload.remote_dir = "/public_html".to_string();
        settings
    }

    #[test]
    fn test_missing_build_dir_does_not_connect() {
        let dir = TempDir::new().unwrap();
        let connected = Cell::new(false);

        let err = run_with(&settings_in(&dir), |_, _| {
            connected.set(true);
            Ok(MemoryRemote::new())
        })
        .unwrap_err();

        assert!(matches!(err, DeployError::MissingBuildDir(_)));
        assert!(!connected.get());
    }

    #[test]
    fn test_incomplete_config_does_not_connect() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("dist")).unwrap();
        fs::write(dir.path().join(".env"), "HOSTINGER_FTP_HOST=ftp.example.com\n").unwrap();
        let connected = Cell::new(false);

        let err = run_with(&settings_in(&dir), |_, _| {
            connected.set(true);
            Ok(MemoryRemote::new())
        })
        .unwrap_err();

        assert!(matches!(err, DeployError::MissingKeys(ref keys) if keys.len() == 2));
        assert!(!connected.get());
    }

    #[test]
    fn test_auth_failure_propagates() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("dist")).unwrap();
        fs::write(
            dir.path().join(".env"),
            "HOSTINGER_FTP_HOST=ftp://ftp.example.com\n\
             HOSTINGER_FTP_USERNAME=u\n\
             HOSTINGER_FTP_PASSWORD=wrong\n",
        )
        .unwrap();

        let err = run_with(&settings_in(&dir), |creds, _| -> Result<MemoryRemote> {
            assert_eq!(creds.host, "ftp.example.com");
            Err(DeployError::Auth("530 Login incorrect".into()))
        })
        .unwrap_err();

        assert!(matches!(err, DeployError::Auth(_)));
    }
}
