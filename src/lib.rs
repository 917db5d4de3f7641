//! # pubharvest
//!
//! PubMed keyword harvester and OpenAI chat-completion connector.
//!
//! ## Modules
//!
//! - [`query`] - Title/abstract keyword query over a publication-date window
//! - [`entrez`] - NCBI E-utilities client (esearch, efetch)
//! - [`fetcher`] - Paginated count → search → fetch → append loop
//! - [`output`] - Single-column CSV sink
//! - [`completion`] - Chat-completion connector
//! - [`config`] - Client and run configuration
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pubharvest::{config::{EntrezConfig, FetchConfig}, entrez::EntrezClient, fetcher};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = EntrezClient::new(EntrezConfig::new().with_email("me@example.org"))?;
//!     let config = FetchConfig::new("intelligence", 2023, 2023);
//!     let articles = fetcher::fetch_articles(&client, &config).await?;
//!     println!("Fetched {} articles", articles.len());
//!     Ok(())
//! }
//! ```

pub mod completion;
pub mod config;
pub mod entrez;
pub mod error;
pub mod fetcher;
pub mod output;
pub mod query;

pub use error::{HarvestError, Result};
