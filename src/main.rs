//! amz-scout - Amazon listing discovery and product detail extraction.

use amz_scout::amazon::Region;
use amz_scout::commands::{DiscoverCommand, ExtractCommand, RunCommand};
use amz_scout::config::{Config, OutputFormat};
use amz_scout::format::Formatter;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "amz-scout",
    version,
    about = "Discover Amazon product URLs and extract title, price, and review count",
    long_about = "Walks Amazon search-results pages over HTTP, saves the product URLs to a CSV \
                  manifest, then visits each product page in Chromium and saves the extracted \
                  fields to a second CSV."
)]
struct Cli {
    /// Amazon region to scrape (default: in)
    #[arg(short, long, global = true)]
    region: Option<Region>,

    /// Search query used to build the listing URL
    #[arg(short, long, global = true)]
    query: Option<String>,

    /// Full search-results URL; overrides --region and --query
    #[arg(long, global = true)]
    search_url: Option<String>,

    /// Number of listing pages to discover
    #[arg(short, long, global = true)]
    pages: Option<u32>,

    /// Manifest CSV of discovered product URLs
    #[arg(short, long, global = true)]
    manifest: Option<PathBuf>,

    /// CSV file receiving the extracted records
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Skip the add-to-cart interaction
    #[arg(long, global = true)]
    no_simulate: bool,

    /// Browser sessions used during extraction
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    /// Minimum delay between requests in milliseconds
    #[arg(long, global = true)]
    delay: Option<u64>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "AMZ_PROXY")]
    proxy: Option<String>,

    /// Show the browser window
    #[arg(long, global = true)]
    headful: bool,

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
    /// Walk listing pages and write the URL manifest
    #[command(alias = "d")]
    Discover,

    /// Extract product details for every URL in the manifest
    #[command(alias = "e")]
    Extract,

    /// Discover, extract, and simulate in one go
    Run,

    /// List supported regions
    Regions,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(region) = self.region {
            config.region = region;
        }
        if let Some(query) = &self.query {
            config.query = query.clone();
        }
        if let Some(url) = &self.search_url {
            config.search_url = Some(url.clone());
        }
        if let Some(pages) = self.pages {
            config.pages = pages;
        }
        if let Some(path) = &self.manifest {
            config.manifest_path = path.clone();
        }
        if let Some(path) = &self.output {
            config.output_path = path.clone();
        }
        if self.no_simulate {
            config.simulate = false;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(delay) = self.delay {
            config.delay_ms = delay;
        }
        if let Some(proxy) = &self.proxy {
            config.proxy = Some(proxy.clone());
        }
        if self.headful {
            config.headless = false;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("amz_scout=info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();
    cli.apply(&mut config);
    config.validate()?;

    let output = match cli.command {
        Commands::Discover => DiscoverCommand::new(config).execute().await?,
        Commands::Extract => ExtractCommand::new(config).execute().await?,
        Commands::Run => RunCommand::new(config).execute().await?,
        Commands::Regions => Formatter::new(config.format).format_regions(),
    };

    println!("{}", output);
    Ok(())
}
