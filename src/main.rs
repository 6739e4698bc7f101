//! imdb-crawler - Sequential IMDb chart crawler
//!
//! Crawls a chart page and its titles with TLS fingerprint emulation.

use anyhow::Result;
use clap::{Parser, Subcommand};
use imdb_crawler::commands::{TitleCommand, TopCommand};
use imdb_crawler::config::{Config, OutputFormat, UserAgentMode, MAX_LISTING_ITEMS};
use std::path::PathBuf;
use tracing::{warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "imdb-crawler",
    version,
    about = "Sequential IMDb chart crawler",
    long_about = "Crawls an IMDb chart and its title pages, extracting title, year, rating, runtime, metascore and cast."
)]
struct Cli {
    /// Proxy URL (e.g., socks5h://tor:9050)
    #[arg(long, global = true, env = "IMDB_PROXY")]
    proxy: Option<String>,

    /// Delay between title requests in milliseconds
    #[arg(long, global = true, env = "IMDB_DELAY")]
    delay: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Always send the same User-Agent instead of rotating
    #[arg(long, global = true)]
    fixed_agent: bool,

    /// Send each request once, without retrying transient failures
    #[arg(long, global = true)]
    no_retry: bool,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the top chart and every title on it
    #[command(alias = "run")]
    Top {
        /// Maximum number of titles (capped at 50)
        #[arg(short, long, default_value = "50")]
        max: usize,

        /// Listing page URL
        #[arg(long)]
        url: Option<String>,

        /// Directory for movies_detailed.json and movies_detailed.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Look up titles by id (tt0111161) or URL
    #[command(alias = "t")]
    Title {
        /// Title id(s) or URL(s)
        #[arg(required = true)]
        ids: Vec<String>,

        /// Directory for movies_detailed.json and movies_detailed.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if cli.fixed_agent {
        config.user_agent_mode = UserAgentMode::Fixed;
    }
    if cli.no_retry {
        config.retry = None;
    }

    match cli.command {
        Commands::Top { max, url, output } => {
            if max > MAX_LISTING_ITEMS {
                warn!("--max {} exceeds the limit, crawling {} titles", max, MAX_LISTING_ITEMS);
            }
            config.max_items = max;

            if let Some(url) = url {
                config.set_listing_url(&url)?;
            }
            if output.is_some() {
                config.output_dir = output;
            }

            let cmd = TopCommand::new(config);
            let output = cmd.execute().await?;
            println!("{}", output);
        }

        Commands::Title { ids, output } => {
            if output.is_some() {
                config.output_dir = output;
            }

            let cmd = TitleCommand::new(config);

            let output = if ids.len() == 1 {
                cmd.execute(&ids[0]).await?
            } else {
                cmd.execute_batch(&ids).await?
            };

            println!("{}", output);
        }
    }

    Ok(())
}
