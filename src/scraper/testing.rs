//! In-process browser stand-in with resource-leak counters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicIsize, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::domain::UrlRules;
use crate::scraper::{BrowserLauncher, BrowserSession, FetchError, PageTab, ScraperConfig};

pub const FULL_PAGE: &str = include_str!("../../tests/fixtures/column_page.html");
pub const GATED_PAGE: &str = include_str!("../../tests/fixtures/gated_page.html");
pub const BARE_PAGE: &str = include_str!("../../tests/fixtures/bare_page.html");

/// Config with no settle or rate-limit delays, accepting any host
pub fn test_config() -> ScraperConfig {
    ScraperConfig {
        ready_timeout_ms: 50,
        poll_interval_ms: 10,
        settle_delay_ms: 0,
        request_delay_ms: 0,
        url_rules: UrlRules::any_host(),
        ..Default::default()
    }
}

/// A column page titled `name`
pub fn named_page(name: &str) -> FakePage {
    FakePage::html(&format!(
        r#"<html><head><title>{name}</title></head><body><h1>{name}</h1>
        <div class="stats">10读者 2内容</div></body></html>"#
    ))
}

#[derive(Debug, Clone)]
pub enum FakePage {
    Html(String),
    /// Loads after the given delay
    Slow(Duration, String),
    NavigationError,
    Timeout,
    /// Navigation never completes
    Hang,
}

impl FakePage {
    pub fn html(html: &str) -> Self {
        Self::Html(html.to_string())
    }
}

#[derive(Debug, Default)]
pub struct ResourceCounters {
    launches: AtomicUsize,
    sessions_open: AtomicIsize,
    contexts_open: AtomicIsize,
    contexts_opened: AtomicUsize,
    contexts_closed: AtomicUsize,
    contexts_dropped_open: AtomicUsize,
    peak_contexts: AtomicIsize,
    closed_with_open_contexts: AtomicBool,
}

impl ResourceCounters {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn sessions_open(&self) -> isize {
        self.sessions_open.load(Ordering::SeqCst)
    }

    /// Contexts opened and not yet passed to `close_context`
    pub fn contexts_open(&self) -> isize {
        self.contexts_open.load(Ordering::SeqCst)
    }

    pub fn contexts_opened(&self) -> usize {
        self.contexts_opened.load(Ordering::SeqCst)
    }

    /// Explicit `close_context` calls
    pub fn contexts_closed(&self) -> usize {
        self.contexts_closed.load(Ordering::SeqCst)
    }

    /// Tabs dropped without `close_context`
    pub fn contexts_dropped_open(&self) -> usize {
        self.contexts_dropped_open.load(Ordering::SeqCst)
    }

    /// Most contexts open at the same time
    pub fn peak_contexts(&self) -> isize {
        self.peak_contexts.load(Ordering::SeqCst)
    }

    /// Every context was closed explicitly, and before the browser
    pub fn assert_released(&self) {
        assert_eq!(self.sessions_open(), 0, "browser session left open");
        assert_eq!(self.contexts_open(), 0, "page context left open");
        assert_eq!(self.contexts_dropped_open(), 0, "page dropped without close_context");
        assert!(
            !self.closed_with_open_contexts.load(Ordering::SeqCst),
            "browser closed while page contexts were open"
        );
    }
}

#[derive(Clone, Default)]
pub struct FakeLauncher {
    pages: HashMap<String, FakePage>,
    fail_launch: bool,
    pub counters: Arc<ResourceCounters>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    /// A launcher whose browser binary is missing
    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    type Session = FakeSession;

    async fn launch(&self) -> Result<FakeSession, FetchError> {
        if self.fail_launch {
            return Err(FetchError::LaunchFailure("chrome: No such file or directory".into()));
        }
        self.counters.launches.fetch_add(1, Ordering::SeqCst);
        self.counters.sessions_open.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            pages: Arc::new(self.pages.clone()),
            counters: self.counters.clone(),
            closed: AtomicBool::new(false),
        })
    }
}

pub struct FakeSession {
    pages: Arc<HashMap<String, FakePage>>,
    counters: Arc<ResourceCounters>,
    closed: AtomicBool,
}

#[async_trait]
impl BrowserSession for FakeSession {
    type Tab = FakeTab;

    async fn new_isolated_context(&self) -> Result<FakeTab, FetchError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(FetchError::Browser("browser already closed".into()));
        }
        let open = self.counters.contexts_open.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak_contexts.fetch_max(open, Ordering::SeqCst);
        self.counters.contexts_opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeTab {
            pages: self.pages.clone(),
            counters: self.counters.clone(),
            document: Mutex::new(None),
            closed: false,
        })
    }

    async fn close_context(&self, mut tab: FakeTab) -> Result<(), FetchError> {
        tab.closed = true;
        self.counters.contexts_open.fetch_sub(1, Ordering::SeqCst);
        self.counters.contexts_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), FetchError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            if self.counters.contexts_open() > 0 {
                self.counters
                    .closed_with_open_contexts
                    .store(true, Ordering::SeqCst);
            }
            self.counters.sessions_open.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

pub struct FakeTab {
    pages: Arc<HashMap<String, FakePage>>,
    counters: Arc<ResourceCounters>,
    document: Mutex<Option<String>>,
    closed: bool,
}

impl FakeTab {
    fn set_document(&self, html: &str) {
        if let Ok(mut doc) = self.document.lock() {
            *doc = Some(html.to_string());
        }
    }

    fn document(&self) -> Option<String> {
        self.document.lock().ok().and_then(|doc| doc.clone())
    }
}

impl Drop for FakeTab {
    fn drop(&mut self) {
        if !self.closed {
            self.counters.contexts_dropped_open.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl PageTab for FakeTab {
    async fn navigate(&self, url: &str) -> Result<(), FetchError> {
        match self.pages.get(url).cloned() {
            Some(FakePage::Html(html)) => {
                self.set_document(&html);
                Ok(())
            }
            Some(FakePage::Slow(delay, html)) => {
                tokio::time::sleep(delay).await;
                self.set_document(&html);
                Ok(())
            }
            Some(FakePage::Timeout) => Err(FetchError::Timeout {
                url: url.to_string(),
                after: Duration::from_secs(30),
            }),
            Some(FakePage::Hang) => std::future::pending().await,
            Some(FakePage::NavigationError) | None => Err(FetchError::NavigationError {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".into(),
            }),
        }
    }

    async fn has_element(&self, selector: &str) -> bool {
        let Some(html) = self.document() else {
            return false;
        };
        let Ok(selector) = Selector::parse(selector) else {
            return false;
        };
        Html::parse_document(&html).select(&selector).next().is_some()
    }

    async fn content(&self) -> Result<String, FetchError> {
        self.document()
            .ok_or_else(|| FetchError::Browser("no document loaded".into()))
    }
}
