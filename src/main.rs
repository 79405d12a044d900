use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use column_scout::app::AppContext;
use column_scout::cli::{commands, Cli, Commands};
use column_scout::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(preset) = cli.preset {
        config.scraper = preset.apply(config.scraper);
    }
    let ctx = AppContext::new(config, cli.db)?;

    match cli.command {
        Commands::Preview { urls, file, json } => {
            let urls = commands::collect_urls(&urls, file.as_deref())?;
            commands::preview(&ctx, &urls, json).await?;
        }
        Commands::Import { urls, file } => {
            let urls = commands::collect_urls(&urls, file.as_deref())?;
            commands::import(&ctx, &urls).await?;
        }
        Commands::List => {
            commands::list_columns(&ctx)?;
        }
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| ctx.config.server.bind.clone());
            column_scout::server::serve(ctx, &bind).await?;
        }
    }

    Ok(())
}
