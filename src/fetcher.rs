//! Paginated PubMed harvest.
//!
//! Counts the matching records, walks the result set page by page, hydrates
//! every identifier into its MEDLINE text and appends each page to the
//! output CSV as soon as it is complete.

use crate::config::FetchConfig;
use crate::entrez::EntrezClient;
use crate::error::Result;
use crate::output::ArticleCsv;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{info, warn};

/// Harvest every record matching `config` into `config.output`.
///
/// The output file is recreated with a fresh header before the first remote
/// call, so invoking this twice on the same path never duplicates rows.
/// Returns all record texts in result order.
pub async fn fetch_articles(client: &EntrezClient, config: &FetchConfig) -> Result<Vec<String>> {
    let query = config.validate()?;
    let mut csv = ArticleCsv::create(&config.output)?;

    let total = client.count(&query).await?;
    info!(query = %query, total = total, "Matched PubMed records");

    let page_size = u64::from(config.page_size);
    let mut articles = Vec::new();

    let mut retstart = 0;
    while retstart < total {
        let page = client.search(&query, config.page_size, retstart).await?;
        if page.count != total {
            warn!(initial = total, now = page.count, retstart = retstart, "Result set changed during fetch");
        }

        let batch = match config.concurrency_limit() {
            Some(limit) => hydrate_concurrent(client, &page.ids, limit).await?,
            None => hydrate_sequential(client, &page.ids).await?,
        };

        csv.append(&batch)?;
        articles.extend(batch);

        info!(fetched = articles.len(), total = total, retstart = retstart, "Page saved");
        println!("Fetched {} out of {} articles.", articles.len(), total);

        retstart += page_size;
    }

    info!(
        articles = articles.len(),
        path = %csv.path().display(),
        "Fetch complete"
    );
    Ok(articles)
}

/// One fetch call per identifier, strictly in order.
async fn hydrate_sequential(client: &EntrezClient, ids: &[String]) -> Result<Vec<String>> {
    let mut records = Vec::with_capacity(ids.len());
    for id in ids {
        records.push(client.fetch_record(id).await?);
    }
    Ok(records)
}

/// Up to `limit` fetch calls in flight; results keep identifier order.
async fn hydrate_concurrent(client: &EntrezClient, ids: &[String], limit: usize) -> Result<Vec<String>> {
    stream::iter(ids)
        .map(|id| client.fetch_record(id))
        .buffered(limit)
        .try_collect()
        .await
}
