//! deploy - upload the site build over FTP
//!
//! Exit status is 0 when the session completed, 1 on any fatal error.
//! Individual file failures are reported in the summary but are not fatal.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use sitedeploy::cli::{init_logging, DeployArgs};
use sitedeploy::{deploy, DeployError, Settings};
use tracing::error;

fn main() -> ExitCode {
    let args = DeployArgs::parse();
    init_logging(args.debug);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::from(1)
        }
    }
}

fn run(args: &DeployArgs) -> anyhow::Result<()> {
    let mut settings = Settings::load().context("Failed to load settings")?;
    args.apply(&mut settings);

    if args.show_config {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    let outcome = if args.dry_run {
        deploy::dry_run(&settings)?
    } else {
        deploy::run(&settings)?
    };

    for failure in &outcome.failures {
        eprintln!("  ✗ {}: {}", failure.path, failure.error);
    }
    println!("{}", outcome);
    Ok(())
}

fn report(e: &anyhow::Error) {
    match e.downcast_ref::<DeployError>() {
        // The message already says what to fix
        Some(err) if err.is_precondition() || matches!(err, DeployError::Auth(_)) => {
            error!("{}", err)
        }
        _ => error!("Deployment failed: {:?}", e),
    }
}
