//! Headless Chrome launch for browser-driven discovery.
//!
//! A browser is always handed out wrapped in a [`BrowserGuard`]. Dropping the
//! guard drops the `headless_chrome::Browser`, which kills the Chrome
//! process, so a scan cannot leak one on any exit path.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::BrowserConfig;

/// Windows Chrome as seen from WSL.
const WSL_CHROME_PATH: &str = "/mnt/c/Program Files/Google/Chrome/Application/chrome.exe";

/// A Chrome browser instance that is shut down when the guard is dropped.
pub struct BrowserGuard {
    pub browser: headless_chrome::Browser,
}

impl Drop for BrowserGuard {
    fn drop(&mut self) {
        debug!("Closing headless Chrome");
    }
}

/// Whether we are running inside a container, where Chrome's sandbox is
/// unavailable (detected via /.dockerenv or the ZETA_CONTAINER env var).
pub fn is_container() -> bool {
    std::env::var("ZETA_CONTAINER").is_ok() || Path::new("/.dockerenv").exists()
}

/// Chrome binary to launch: configured path, then `CHROME_PATH`, then the
/// WSL install. `None` lets headless_chrome auto-detect.
pub fn resolve_chrome_path(configured: Option<&str>, env_path: Option<String>) -> Option<PathBuf> {
    configured
        .map(PathBuf::from)
        .or_else(|| env_path.map(PathBuf::from))
        .or_else(|| {
            let wsl_path = Path::new(WSL_CHROME_PATH);
            if wsl_path.exists() { Some(wsl_path.to_path_buf()) } else { None }
        })
}

/// Launch a headless Chrome instance.
pub fn create_browser(config: &BrowserConfig) -> anyhow::Result<BrowserGuard> {
    let chrome_path = resolve_chrome_path(
        config.chrome_path.as_deref(),
        std::env::var("CHROME_PATH").ok(),
    );
    let sandbox = config.sandbox && !is_container();

    debug!("Launching headless Chrome (path: {:?}, sandbox: {})", chrome_path, sandbox);

    let options = headless_chrome::LaunchOptions::default_builder()
        .headless(true)
        .sandbox(sandbox)
        .path(chrome_path)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build Chrome launch options: {}", e))?;

    let browser = headless_chrome::Browser::new(options)
        .map_err(|e| anyhow::anyhow!("Failed to launch headless Chrome: {}", e))?;

    Ok(BrowserGuard { browser })
}
