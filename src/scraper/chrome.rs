use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::scraper::config::ScraperConfig;
use crate::scraper::{BrowserLauncher, BrowserSession, FetchError, PageTab};

/// Launches headless Chrome via chromiumoxide
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    config: ScraperConfig,
}

impl ChromeLauncher {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    type Session = ChromeSession;

    async fn launch(&self) -> Result<ChromeSession, FetchError> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer");

        if !self.config.headless {
            builder = builder.with_head();
        }
        if let Some(ref path) = self.config.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder
            .build()
            .map_err(|e| FetchError::LaunchFailure(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            FetchError::LaunchFailure(format!(
                "{}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        // Spawn the browser handler
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        Ok(ChromeSession {
            browser: RwLock::new(Some(browser)),
            handler,
            user_agent: self.config.user_agent.clone(),
        })
    }
}

/// One Chrome process; each page gets its own browser context
pub struct ChromeSession {
    browser: RwLock<Option<Browser>>,
    handler: JoinHandle<()>,
    user_agent: Option<String>,
}

#[async_trait]
impl BrowserSession for ChromeSession {
    type Tab = ChromeTab;

    async fn new_isolated_context(&self) -> Result<ChromeTab, FetchError> {
        let guard = self.browser.read().await;
        let browser = guard
            .as_ref()
            .ok_or_else(|| FetchError::Browser("browser already closed".to_string()))?;

        let context_id = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| FetchError::Browser(format!("Failed to create browser context: {}", e)))?
            .result
            .browser_context_id;

        let params = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(FetchError::Browser)?;

        let page = match browser.new_page(params).await {
            Ok(page) => page,
            Err(e) => {
                dispose_context(browser, context_id).await;
                return Err(FetchError::Browser(format!("Failed to create page: {}", e)));
            }
        };

        let tab = ChromeTab {
            page: Some(page),
            context_id: Some(context_id),
            runtime: tokio::runtime::Handle::current(),
        };

        // Set user agent if configured
        if let Some(ref ua) = self.user_agent {
            tab.page()?
                .set_user_agent(ua)
                .await
                .map_err(|e| FetchError::Browser(format!("Failed to set user agent: {}", e)))?;
        }

        Ok(tab)
    }

    async fn close_context(&self, mut tab: ChromeTab) -> Result<(), FetchError> {
        let page = tab.page.take();
        let context_id = tab.context_id.take();

        let closed = match page {
            Some(page) => page
                .close()
                .await
                .map_err(|e| FetchError::Browser(format!("Failed to close page: {}", e))),
            None => Ok(()),
        };

        if let Some(context_id) = context_id {
            if let Some(browser) = self.browser.read().await.as_ref() {
                dispose_context(browser, context_id).await;
            }
        }

        closed
    }

    async fn close(&self) -> Result<(), FetchError> {
        let Some(mut browser) = self.browser.write().await.take() else {
            return Ok(());
        };

        let closed = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| FetchError::Browser(format!("Failed to close browser: {}", e)));
        if let Err(e) = browser.wait().await {
            warn!("Failed to wait for browser exit: {}", e);
        }
        self.handler.abort();

        closed
    }
}

async fn dispose_context(browser: &Browser, context_id: BrowserContextId) {
    if let Err(e) = browser
        .execute(DisposeBrowserContextParams::new(context_id))
        .await
    {
        warn!("Failed to dispose browser context: {}", e);
    }
}

/// A page in its own browser context.
///
/// Batches close every tab through [`BrowserSession::close_context`], also
/// when cancelled. A tab dropped without it (its task aborted after the close
/// grace period) is closed on a background task, and its context goes away
/// with the browser.
pub struct ChromeTab {
    page: Option<Page>,
    context_id: Option<BrowserContextId>,
    runtime: tokio::runtime::Handle,
}

impl ChromeTab {
    fn page(&self) -> Result<&Page, FetchError> {
        self.page
            .as_ref()
            .ok_or_else(|| FetchError::Browser("page already closed".to_string()))
    }
}

impl Drop for ChromeTab {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            self.runtime.spawn(async move {
                if let Err(e) = page.close().await {
                    debug!("Background page close failed: {}", e);
                }
            });
        }
    }
}

#[async_trait]
impl PageTab for ChromeTab {
    async fn navigate(&self, url: &str) -> Result<(), FetchError> {
        self.page()?
            .goto(url)
            .await
            .map(|_| ())
            .map_err(|e| FetchError::NavigationError {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn has_element(&self, selector: &str) -> bool {
        match self.page() {
            Ok(page) => page.find_element(selector).await.is_ok(),
            Err(_) => false,
        }
    }

    async fn content(&self) -> Result<String, FetchError> {
        self.page()?
            .content()
            .await
            .map_err(|e| FetchError::Browser(format!("Failed to read page content: {}", e)))
    }
}
