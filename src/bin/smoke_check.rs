//! smoke-check - load the site and confirm it renders
//!
//! Writes `smoke-success.png` when the selector shows up and
//! `smoke-error.png` otherwise. Exit status is 1 on failure.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use sitedeploy::cli::{init_logging, SmokeArgs};
use sitedeploy::smoke::{run_smoke_check, AgentBrowser};
use sitedeploy::{DeployError, Settings};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let args = SmokeArgs::parse();
    init_logging(args.debug);

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::from(1)
        }
    }
}

async fn run(args: &SmokeArgs) -> anyhow::Result<()> {
    let mut settings = Settings::load().context("Failed to load settings")?;
    args.apply(&mut settings);
    settings.validate_smoke_url()?;

    let mut browser = AgentBrowser::launch(&settings.smoke).await?;
    let report = run_smoke_check(&mut browser, &settings.smoke).await?;

    println!(
        "✅ '{}' found on {}. Screenshot saved to {}",
        report.selector,
        report.url,
        report.screenshot.display()
    );
    Ok(())
}

fn report(e: &anyhow::Error) {
    match e.downcast_ref::<DeployError>() {
        Some(DeployError::SmokeCheck { source, screenshot }) => {
            error!("❌ {}", source);
            if let Some(path) = screenshot {
                error!("Screenshot of the failing page saved to {}", path.display());
            }
        }
        _ => error!("{:?}", e),
    }
}
