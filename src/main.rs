//! pubharvest - PubMed keyword harvester
//!
//! ## Usage
//!
//! ### Harvest records into a CSV
//! ```bash
//! pubharvest fetch intelligence --start-year 2023 --end-year 2023 --email me@example.org
//! ```
//!
//! ### Send messages to the chat-completion model
//! ```bash
//! echo '[{"role":"user","content":"Hello"}]' | OPENAI_API_KEY=sk-... pubharvest complete
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pubharvest::completion::OpenAiConnector;
use pubharvest::config::{EntrezConfig, FetchConfig, DEFAULT_OUTPUT, DEFAULT_PAGE_SIZE, EUTILS_BASE_URL};
use pubharvest::entrez::EntrezClient;
use pubharvest::fetcher;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// PubMed keyword harvester and chat-completion connector
#[derive(Parser)]
#[command(name = "pubharvest")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every PubMed record matching a keyword into a CSV file
    Fetch {
        /// Keyword matched against title and abstract
        keyword: String,

        /// First year of the window (from October 1)
        #[arg(long)]
        start_year: i32,

        /// Last year of the window (through December 31)
        #[arg(long)]
        end_year: i32,

        /// Identifiers requested per search call
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,

        /// Output CSV file (recreated on every run)
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Contact email sent to NCBI
        #[arg(long, env = "NCBI_EMAIL", default_value = "")]
        email: String,

        /// NCBI API key
        #[arg(long, env = "NCBI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Fetch up to N records of a page at once (default: one at a time)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Per-request timeout in seconds (default: none)
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// E-utilities base URL
        #[arg(long, default_value = EUTILS_BASE_URL)]
        base_url: String,
    },

    /// Send a JSON array of messages to the chat-completion model
    Complete {
        /// File holding the messages (default: stdin)
        #[arg(short, long)]
        messages: Option<PathBuf>,

        /// OpenAI-compatible API base URL
        #[arg(long, env = "OPENAI_BASE_URL")]
        base_url: Option<String>,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    match cli.command {
        Commands::Fetch {
            keyword,
            start_year,
            end_year,
            page_size,
            output,
            email,
            api_key,
            concurrency,
            timeout_secs,
            base_url,
        } => {
            let mut entrez = EntrezConfig::new().with_base_url(&base_url).with_email(&email);
            if let Some(key) = api_key {
                entrez = entrez.with_api_key(&key);
            }
            if let Some(secs) = timeout_secs {
                entrez = entrez.with_timeout(Duration::from_secs(secs));
            }

            let mut config = FetchConfig::new(&keyword, start_year, end_year)
                .with_page_size(page_size)
                .with_output(output);
            if let Some(n) = concurrency {
                config = config.with_concurrency(n);
            }

            run_fetch(entrez, config).await
        }
        Commands::Complete { messages, base_url } => run_complete(messages, base_url).await,
    }
}

// ============================================================================
// Fetch
// ============================================================================

async fn run_fetch(entrez: EntrezConfig, config: FetchConfig) -> Result<()> {
    let client = EntrezClient::new(entrez).context("Failed to create E-utilities client")?;

    info!(
        keyword = %config.keyword,
        start_year = config.start_year,
        end_year = config.end_year,
        page_size = config.page_size,
        concurrent = config.is_concurrent(),
        "Starting PubMed fetch"
    );

    let articles = fetcher::fetch_articles(&client, &config)
        .await
        .context("PubMed fetch failed")?;

    println!(
        "All {} articles saved to {}.",
        articles.len(),
        config.output.display()
    );
    Ok(())
}

// ============================================================================
// Completion
// ============================================================================

async fn run_complete(messages_path: Option<PathBuf>, base_url: Option<String>) -> Result<()> {
    let mut connector = OpenAiConnector::from_env()?;
    if let Some(url) = base_url {
        connector = connector.with_base_url(&url);
    }

    let raw = match messages_path {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read messages from {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read messages from stdin")?;
            buf
        }
    };

    // Forwarded as given, so any extra message fields reach the API intact.
    let messages: Vec<serde_json::Value> =
        serde_json::from_str(&raw).context("Messages must be a JSON array of message objects")?;
    if let Some(pos) = messages.iter().position(|m| !m.is_object()) {
        anyhow::bail!("Message {} is not a JSON object", pos);
    }

    let response = connector.get_completions(&messages).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
