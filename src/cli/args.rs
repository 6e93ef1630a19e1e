//! Command-line arguments
//!
//! Both tools run without arguments; every flag only overrides a setting.

use std::path::PathBuf;

use clap::Parser;

use crate::core::Settings;

/// Upload the site build to the FTP server
#[derive(Parser, Debug, Default)]
#[command(name = "deploy")]
#[command(author, version, about, long_about = None)]
pub struct DeployArgs {
    /// Local build directory to upload
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Credentials file (key=value lines)
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Remote directory to upload into
    #[arg(long)]
    pub remote_dir: Option<String>,

    /// Walk and "upload" against an in-memory remote without connecting
    #[arg(long)]
    pub dry_run: bool,

    /// Print the effective settings and exit
    #[arg(long)]
    pub show_config: bool,

    /// Keep partially written remote files when a transfer fails
    #[arg(long)]
    pub keep_partial: bool,

    /// Enable debug output
    #[arg(long, short = 'd')]
    pub debug: bool,
}

impl DeployArgs {
    /// Apply CLI overrides
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(ref dir) = self.dir {
            settings.upload.local_dir = dir.clone();
        }

        if let Some(ref env_file) = self.env_file {
            settings.upload.env_file = env_file.clone();
        }

        if let Some(ref remote_dir) = self.remote_dir {
            settings.upload.remote_dir = remote_dir.clone();
        }

        if self.keep_partial {
            settings.upload.cleanup_partial = false;
        }
    }
}

/// Load a page in a headless browser and check it renders
#[derive(Parser, Debug, Default)]
#[command(name = "smoke-check")]
#[command(author, version, about, long_about = None)]
pub struct SmokeArgs {
    /// Page to load
    #[arg(long)]
    pub url: Option<String>,

    /// CSS selector that must appear
    #[arg(long)]
    pub selector: Option<String>,

    /// Run in headed browser mode (visible window)
    #[arg(long)]
    pub headed: bool,

    /// Enable debug output
    #[arg(long, short = 'd')]
    pub debug: bool,
}

impl SmokeArgs {
    /// Apply CLI overrides
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(ref url) = self.url {
            settings.smoke.url = url.clone();
        }

        if let Some(ref selector) = self.selector {
            settings.smoke.selector = selector.clone();
        }

        if self.headed {
            settings.smoke.headed = true;
        }
    }
}
