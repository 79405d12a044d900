use std::future::Future;

use tracing::{debug, warn};

use crate::domain::{RenderedPage, SourceUrl};
use crate::scraper::config::ScraperConfig;
use crate::scraper::{BrowserSession, FetchError, PageTab};

/// Loads one column page in an isolated context and returns its rendered DOM
#[derive(Debug, Clone)]
pub struct PageLoader {
    config: ScraperConfig,
}

impl PageLoader {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    /// Validate `url` and load it. Non-conforming URLs never reach the browser.
    pub async fn load<S: BrowserSession>(&self, session: &S, url: &str) -> Result<RenderedPage, FetchError> {
        let target = SourceUrl::parse(url, &self.config.url_rules).map_err(|reason| {
            FetchError::InvalidTarget {
                url: url.to_string(),
                reason,
            }
        })?;
        self.load_target(session, &target).await
    }

    /// Load an already validated URL. The context is closed on every exit path.
    pub async fn load_target<S: BrowserSession>(
        &self,
        session: &S,
        target: &SourceUrl,
    ) -> Result<RenderedPage, FetchError> {
        self.load_until(session, target, std::future::pending()).await
    }

    /// Like [`load_target`](Self::load_target), but gives up with
    /// [`FetchError::Cancelled`] once `cancelled` completes. The context is
    /// still closed before this returns.
    pub async fn load_until<S, C>(
        &self,
        session: &S,
        target: &SourceUrl,
        cancelled: C,
    ) -> Result<RenderedPage, FetchError>
    where
        S: BrowserSession,
        C: Future<Output = ()>,
    {
        let tab = session.new_isolated_context().await?;
        let result = tokio::select! {
            result = self.render(&tab, target) => result,
            _ = cancelled => Err(FetchError::Cancelled {
                url: target.as_str().to_string(),
            }),
        };

        if let Err(e) = session.close_context(tab).await {
            warn!("Failed to close page for {}: {}", target, e);
        }

        result
    }

    async fn render<T: PageTab>(&self, tab: &T, target: &SourceUrl) -> Result<RenderedPage, FetchError> {
        let url = target.as_str();
        let timeout = self.config.timeout();

        tokio::time::timeout(timeout, tab.navigate(url))
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                after: timeout,
            })??;

        // Logged-out or slow pages may never show the content signals; extract what is there.
        let ready = tokio::time::timeout(self.config.ready_timeout(), async {
            let poll = self.config.poll_interval();
            let budget = self.config.ready_timeout();
            tab.wait_for_signal(&["body".to_string()], budget, poll).await
                && tab.wait_for_signal(&self.config.ready_signals, budget, poll).await
        })
        .await
        .unwrap_or(false);
        if !ready {
            warn!("Page elements did not appear in time, extracting anyway: {}", url);
        }

        tokio::time::sleep(self.config.settle_delay()).await;

        let html = tokio::time::timeout(timeout, tab.content())
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                after: timeout,
            })??;
        debug!("Rendered {} ({} bytes)", url, html.len());

        Ok(RenderedPage::new(url, html))
    }
}
