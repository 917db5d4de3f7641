//! Single-column CSV output for fetched records.
//!
//! The file is created fresh once per run (header `Article`) and then
//! reopened in append mode for every page of records. Rows end in CRLF.

use crate::error::Result;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::debug;

/// CSV header of the only column
pub const ARTICLE_HEADER: &str = "Article";

#[derive(Debug, Serialize)]
struct ArticleRow<'a> {
    #[serde(rename = "Article")]
    article: &'a str,
}

/// Append-only record sink backed by a CSV file.
#[derive(Debug)]
pub struct ArticleCsv {
    path: PathBuf,
    rows: usize,
}

impl ArticleCsv {
    /// Create (or truncate) `path` and write the header row.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut wtr = csv_writer().from_path(&path)?;
        wtr.write_record([ARTICLE_HEADER])?;
        wtr.flush()?;

        debug!(path = %path.display(), "Initialized output file");
        Ok(Self { path, rows: 0 })
    }

    /// Append one row per record, then flush and close the file.
    pub fn append(&mut self, records: &[String]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut wtr = csv_writer().from_writer(file);
        for record in records {
            wtr.serialize(ArticleRow { article: record })?;
        }
        wtr.flush()?;

        self.rows += records.len();
        debug!(appended = records.len(), total_rows = self.rows, "Appended batch");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Data rows written through this handle.
    pub fn rows(&self) -> usize {
        self.rows
    }
}

fn csv_writer() -> csv::WriterBuilder {
    let mut builder = csv::WriterBuilder::new();
    builder.has_headers(false).terminator(csv::Terminator::CRLF);
    builder
}

/// Read back every data row of an article CSV.
pub fn read_articles(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut articles = Vec::new();
    for record in rdr.records() {
        let record = record?;
        articles.push(record.get(0).unwrap_or_default().to_string());
    }
    Ok(articles)
}
