//! Browser lifecycle management for a single scrape session

use chromiumoxide::browser::Browser;
use chromiumoxide::page::Page;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{BrowserError, BrowserResult};
use crate::BrowserConfig;
use crate::browser_setup::launch_browser;

/// Wrapper for Browser and its event handler task
///
/// The handler MUST be aborted when the session ends, or it keeps running
/// after the Chrome process is gone; dropping the wrapper takes care of it.
pub struct BrowserWrapper {
    browser: Browser,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
}

impl BrowserWrapper {
    pub(crate) fn new(browser: Browser, handler: JoinHandle<()>, user_data_dir: PathBuf) -> Self {
        Self {
            browser,
            handler,
            user_data_dir: Some(user_data_dir),
        }
    }

    /// Open a new page and navigate it to `url`, waiting for the initial
    /// load to finish.
    pub async fn open_page(&self, url: &str) -> BrowserResult<Page> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::PageCreationFailed(e.to_string()))?;

        page.goto(url)
            .await
            .map_err(|e| BrowserError::NavigationFailed(format!("{}: {}", url, e)))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| BrowserError::NavigationFailed(format!("{}: {}", url, e)))?;

        info!(url, "page opened");
        Ok(page)
    }

    /// Close the Chrome process and remove the temp profile directory.
    ///
    /// Cleanup must happen after `browser.wait()` completes so Chrome has
    /// released all file handles; Windows fails to remove locked files.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "browser close failed");
        }
        let _ = self.browser.wait().await;
        self.handler.abort();

        if let Some(path) = self.user_data_dir.take()
            && let Err(e) = std::fs::remove_dir_all(&path)
        {
            warn!(
                "Failed to clean up temp directory {}: {}. Manual cleanup may be required.",
                path.display(),
                e
            );
        }
    }
}

impl Drop for BrowserWrapper {
    fn drop(&mut self) {
        self.handler.abort();
        // Browser::drop() kills the Chrome process itself.

        if let Some(path) = self.user_data_dir.take() {
            let _ = std::fs::remove_dir_all(&path);
        }
    }
}

/// Launch a browser and open `url`, returning the session wrapper and the
/// single page the scrape run will own.
pub async fn open_session(url: &str, config: &BrowserConfig) -> BrowserResult<(BrowserWrapper, Page)> {
    let user_data_dir =
        std::env::temp_dir().join(format!("gridscrape_profile_{}", std::process::id()));

    let (browser, handler) = launch_browser(config, user_data_dir.clone())
        .await
        .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

    let wrapper = BrowserWrapper::new(browser, handler, user_data_dir);
    let page = wrapper.open_page(url).await?;
    Ok((wrapper, page))
}
