//! PubMed query construction.
//!
//! A [`SearchQuery`] restricts a keyword to the title/abstract field and to a
//! publication-date window running from October 1 of the start year through
//! December 31 of the end year.

use crate::error::{HarvestError, Result};
use chrono::NaiveDate;
use std::fmt;

/// Immutable keyword + year-range query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    keyword: String,
    start: NaiveDate,
    end: NaiveDate,
}

impl SearchQuery {
    /// Build a query, validating the keyword and the year range.
    pub fn new(keyword: &str, start_year: i32, end_year: i32) -> Result<Self> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(HarvestError::Validation("keyword must not be empty".to_string()));
        }
        if start_year > end_year {
            return Err(HarvestError::Validation(format!(
                "start year {} is after end year {}",
                start_year, end_year
            )));
        }

        let start = NaiveDate::from_ymd_opt(start_year, 10, 1)
            .ok_or_else(|| HarvestError::Validation(format!("invalid start year: {}", start_year)))?;
        let end = NaiveDate::from_ymd_opt(end_year, 12, 31)
            .ok_or_else(|| HarvestError::Validation(format!("invalid end year: {}", end_year)))?;

        Ok(Self {
            keyword: keyword.to_string(),
            start,
            end,
        })
    }

    /// Render the E-utilities `term` string.
    pub fn term(&self) -> String {
        format!(
            "{} [Title/Abstract] AND {}[PDat]:{}[PDat]",
            self.keyword,
            self.start.format("%Y/%m/%d"),
            self.end.format("%Y/%m/%d")
        )
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.term())
    }
}
