use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::domain::{PreviewRecord, SourceUrl};
use crate::extractor::FieldExtractor;
use crate::metrics::ScrapeMetrics;
use crate::scraper::config::ScraperConfig;
use crate::scraper::loader::PageLoader;
use crate::scraper::{BatchError, BrowserLauncher, BrowserSession, FetchError};

/// How long cancelled pages get to close before their tasks are aborted
const CLOSE_GRACE: Duration = Duration::from_secs(10);

/// Scrapes a batch of column URLs into preview records.
///
/// One browser per batch; pages run with bounded concurrency and every
/// per-URL failure is logged and dropped.
pub struct BatchScraper<L: BrowserLauncher> {
    launcher: L,
    config: ScraperConfig,
    loader: PageLoader,
    extractor: Arc<FieldExtractor>,
    metrics: Arc<ScrapeMetrics>,
}

impl<L: BrowserLauncher> BatchScraper<L> {
    pub fn new(
        launcher: L,
        config: ScraperConfig,
        extractor: FieldExtractor,
        metrics: Arc<ScrapeMetrics>,
    ) -> Self {
        let loader = PageLoader::new(config.clone());
        Self {
            launcher,
            config,
            loader,
            extractor: Arc::new(extractor),
            metrics,
        }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Scrape `urls` and return records for the pages that yielded a name, in input order.
    ///
    /// Fails only when the batch exceeds `max_urls` (before any browser work)
    /// or the browser cannot start. If every URL fails the result is empty.
    ///
    /// Page contexts are closed before the browser, also when the batch
    /// deadline passes. If the returned future is dropped, the same cleanup
    /// runs on a background task.
    pub async fn run(&self, urls: &[String], max_urls: usize) -> Result<Vec<PreviewRecord>, BatchError> {
        if urls.len() > max_urls {
            return Err(BatchError::TooMany {
                count: urls.len(),
                max: max_urls,
            });
        }

        let targets: Vec<SourceUrl> = urls
            .iter()
            .filter_map(|url| match SourceUrl::parse(url, &self.config.url_rules) {
                Ok(target) => Some(target),
                Err(e) => {
                    warn!("Skipping invalid URL {:?}: {}", url, e);
                    None
                }
            })
            .collect();

        if targets.is_empty() {
            info!("No valid column URLs in batch of {}", urls.len());
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let total = targets.len();
        info!("Scraping {} column pages", total);

        let session = self
            .launcher
            .launch()
            .await
            .map_err(BatchError::BrowserUnavailable)?;
        let session = Arc::new(session);
        let mut batch = BatchRun::new(session.clone(), total);
        self.spawn_pages(&mut batch, &session, targets);

        let deadline = tokio::time::Instant::now() + self.config.batch_timeout();
        if !batch.collect_until(deadline).await {
            warn!(
                "Batch timed out after {:?}, cancelling {} pages",
                self.config.batch_timeout(),
                batch.tasks.len()
            );
        }
        batch.release().await;

        let records = batch.take_records();
        self.metrics.record("batch", started.elapsed());
        info!(
            "Batch complete: {} of {} pages scraped in {:.1}s",
            records.len(),
            total,
            started.elapsed().as_secs_f64()
        );
        Ok(records)
    }

    fn spawn_pages(
        &self,
        batch: &mut BatchRun<L::Session>,
        session: &Arc<L::Session>,
        targets: Vec<SourceUrl>,
    ) {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let request_delay = self.config.request_delay();

        for (index, target) in targets.into_iter().enumerate() {
            let session = session.clone();
            let mut cancel = batch.cancel_signal();
            let semaphore = semaphore.clone();
            let loader = self.loader.clone();
            let extractor = self.extractor.clone();
            let metrics = self.metrics.clone();

            batch.tasks.spawn(async move {
                let permit = tokio::select! {
                    permit = semaphore.acquire_owned() => permit,
                    _ = cancel.cancelled() => return (index, None),
                };
                let Ok(_permit) = permit else {
                    return (index, None);
                };
                let record = scrape_one(&*session, &loader, &extractor, &metrics, &target, &mut cancel).await;
                // Keep the permit through the delay so each worker paces itself.
                tokio::select! {
                    _ = tokio::time::sleep(request_delay) => {}
                    _ = cancel.cancelled() => {}
                }
                (index, record)
            });
        }
    }
}

/// Tells page tasks to stop. Dropping the sender counts as a cancel.
#[derive(Clone)]
struct CancelSignal(watch::Receiver<bool>);

impl CancelSignal {
    async fn cancelled(&mut self) {
        let _ = self.0.wait_for(|cancelled| *cancelled).await;
    }
}

/// The browser and page tasks of one batch.
///
/// [`release`](Self::release) cancels outstanding pages, waits for their
/// contexts to close, then closes the browser. Dropping an unreleased run
/// does the same on a spawned task.
struct BatchRun<S: BrowserSession + 'static> {
    session: Option<Arc<S>>,
    tasks: JoinSet<(usize, Option<PreviewRecord>)>,
    cancel: watch::Sender<bool>,
    slots: Vec<Option<PreviewRecord>>,
}

impl<S: BrowserSession + 'static> BatchRun<S> {
    fn new(session: Arc<S>, pages: usize) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            session: Some(session),
            tasks: JoinSet::new(),
            cancel,
            slots: vec![None; pages],
        }
    }

    fn cancel_signal(&self) -> CancelSignal {
        CancelSignal(self.cancel.subscribe())
    }

    /// Store finished pages until none are left or `deadline` passes. False on deadline.
    async fn collect_until(&mut self, deadline: tokio::time::Instant) -> bool {
        loop {
            match tokio::time::timeout_at(deadline, self.tasks.join_next()).await {
                Ok(Some(joined)) => self.store(joined),
                Ok(None) => return true,
                Err(_) => return false,
            }
        }
    }

    fn store(&mut self, joined: Result<(usize, Option<PreviewRecord>), JoinError>) {
        match joined {
            Ok((index, record)) => self.slots[index] = record,
            Err(e) => error!("Task join error: {}", e),
        }
    }

    async fn release(&mut self) {
        self.cancel.send_replace(true);
        let grace = tokio::time::Instant::now() + CLOSE_GRACE;
        if !self.collect_until(grace).await {
            warn!("Pages did not close within {:?}, aborting them", CLOSE_GRACE);
            self.tasks.shutdown().await;
        }

        if let Some(session) = self.session.clone() {
            if let Err(e) = session.close().await {
                error!("Failed to close browser: {}", e);
            }
            self.session = None;
        }
    }

    fn take_records(&mut self) -> Vec<PreviewRecord> {
        std::mem::take(&mut self.slots).into_iter().flatten().collect()
    }
}

impl<S: BrowserSession + 'static> Drop for BatchRun<S> {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.cancel.send_replace(true);
        let mut tasks = std::mem::take(&mut self.tasks);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            error!("Batch dropped outside a runtime; browser left to process teardown");
            return;
        };
        warn!("Batch abandoned with {} pages in flight, closing browser", tasks.len());
        runtime.spawn(async move {
            let drained = tokio::time::timeout(CLOSE_GRACE, async {
                while tasks.join_next().await.is_some() {}
            })
            .await;
            if drained.is_err() {
                tasks.shutdown().await;
            }
            if let Err(e) = session.close().await {
                error!("Failed to close browser: {}", e);
            }
        });
    }
}

async fn scrape_one<S: BrowserSession>(
    session: &S,
    loader: &PageLoader,
    extractor: &FieldExtractor,
    metrics: &ScrapeMetrics,
    target: &SourceUrl,
    cancel: &mut CancelSignal,
) -> Option<PreviewRecord> {
    let started = Instant::now();
    let page = match loader.load_until(session, target, cancel.cancelled()).await {
        Ok(page) => {
            metrics.record("page_load", started.elapsed());
            page
        }
        Err(e @ FetchError::Cancelled { .. }) => {
            debug!("{}", e);
            return None;
        }
        Err(e) => {
            metrics.record("page_load_error", started.elapsed());
            warn!("Failed to scrape {}: {}", target, e);
            return None;
        }
    };

    let started = Instant::now();
    let record = extractor.extract_all(&page);
    metrics.record("extract", started.elapsed());

    if !record.is_usable() {
        warn!("No column name found on {}, skipping", target);
        return None;
    }

    debug!(
        "Scraped {}: {} by {} ({} readers, {} posts)",
        target, record.name, record.author, record.reader_count, record.content_count
    );
    Some(record)
}
