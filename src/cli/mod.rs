pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::scraper::ScraperConfig;

#[derive(Parser)]
#[command(name = "column-scout")]
#[command(about = "Batch-scrape column pages into reviewable records", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/column-scout/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Timing preset applied over the configured scraper settings
    #[arg(long, global = true, value_enum)]
    pub preset: Option<Preset>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Shorter waits, four pages at a time
    Fast,
    /// Longer waits, one page at a time
    Thorough,
}

impl Preset {
    pub fn apply(self, config: ScraperConfig) -> ScraperConfig {
        let preset = match self {
            Preset::Fast => ScraperConfig::fast(),
            Preset::Thorough => ScraperConfig::thorough(),
        };
        config.with_timings_from(&preset)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape column pages and print what was found
    Preview {
        /// Column URLs
        urls: Vec<String>,

        /// Read more URLs from a file, one per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Scrape column pages and save the results
    Import {
        /// Column URLs
        urls: Vec<String>,

        /// Read more URLs from a file, one per line
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// List saved columns
    List,
    /// Start the HTTP API
    Serve {
        /// Address to bind (overrides [server] bind)
        #[arg(long)]
        bind: Option<String>,
    },
}
