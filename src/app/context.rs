use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{AppError, Result};
use crate::config::Config;
use crate::extractor::FieldExtractor;
use crate::metrics::ScrapeMetrics;
use crate::scraper::{BatchScraper, ChromeLauncher};
use crate::store::sqlite::SqliteStore;

pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub metrics: Arc<ScrapeMetrics>,
}

impl AppContext {
    /// `db_path` wins over `[database] path`, which wins over the data directory.
    pub fn new(config: Config, db_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path.or_else(|| config.database.path.clone()) {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);

        Ok(Self {
            config,
            store,
            metrics: Arc::new(ScrapeMetrics::new()),
        })
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        Ok(Self {
            config,
            store: Arc::new(SqliteStore::in_memory()?),
            metrics: Arc::new(ScrapeMetrics::new()),
        })
    }

    /// A Chrome-backed scraper sharing this context's metrics
    pub fn batch_scraper(&self) -> BatchScraper<ChromeLauncher> {
        let scraper = self.config.scraper.clone();
        BatchScraper::new(
            ChromeLauncher::new(scraper.clone()),
            scraper,
            FieldExtractor::new(self.config.extractor.clone()),
            self.metrics.clone(),
        )
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| AppError::Other("Could not find data directory".into()))?;
        let app_dir = data_dir.join("column-scout");
        std::fs::create_dir_all(&app_dir)?;
        Ok(app_dir.join("columns.db"))
    }
}
