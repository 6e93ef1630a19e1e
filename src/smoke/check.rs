//! Page smoke check
//!
//! Load one page, wait for one selector, keep a screenshot either way.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use crate::core::config::SmokeConfig;
use crate::core::{DeployError, Result, SmokeReport};
use crate::smoke::browser::BrowserDriver;

/// Run the smoke check with `driver`
///
/// The driver is closed before returning, on success and on failure. A
/// failure carries the path of the error screenshot when one could be taken.
pub async fn run_smoke_check<D>(driver: &mut D, config: &SmokeConfig) -> Result<SmokeReport>
where
    D: BrowserDriver + ?Sized,
{
    let checked = match check_page(driver, config).await {
        Ok(()) => {
            info!("Found '{}' on {}", config.selector, config.url);
            driver.screenshot(&config.success_screenshot, true).await
        }
        Err(cause) => Err(cause),
    };

    let result = match checked {
        Ok(()) => Ok(SmokeReport {
            url: config.url.clone(),
            selector: config.selector.clone(),
            screenshot: config.success_screenshot.clone(),
        }),
        Err(cause) => {
            warn!("Smoke check failed: {}", cause);
            let screenshot = match driver.screenshot(&config.error_screenshot, false).await {
                Ok(()) => Some(config.error_screenshot.clone()),
                Err(e) => {
                    warn!("Could not capture error screenshot: {}", e);
                    None
                }
            };
            Err(DeployError::SmokeCheck {
                source: Box::new(cause),
                screenshot,
            })
        }
    };

    if let Err(e) = driver.close().await {
        warn!("Failed to close browser: {}", e);
    }

    result
}

async fn check_page<D>(driver: &mut D, config: &SmokeConfig) -> Result<()>
where
    D: BrowserDriver + ?Sized,
{
    info!("Opening {}", config.url);
    bounded(
        format!("navigation to {}", config.url),
        config.navigation_timeout(),
        driver.open(&config.url),
    )
    .await?;

    info!("Waiting for '{}'", config.selector);
    bounded(
        format!("selector '{}'", config.selector),
        config.selector_timeout(),
        driver.wait_for(&config.selector),
    )
    .await
}

async fn bounded<F>(what: String, after: Duration, fut: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| DeployError::timeout(what, after))?
}
