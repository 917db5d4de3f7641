//! Configuration for the E-utilities client and the fetch run.

use crate::error::{HarvestError, Result};
use crate::query::SearchQuery;
use std::path::PathBuf;
use std::time::Duration;

/// NCBI E-utilities base URL
pub const EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Tool name reported to NCBI on every request
pub const DEFAULT_TOOL: &str = "pubharvest";

/// Default number of identifiers requested per search call
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Default output file name
pub const DEFAULT_OUTPUT: &str = "articles.csv";

/// Connection settings for [`crate::entrez::EntrezClient`].
#[derive(Debug, Clone)]
pub struct EntrezConfig {
    /// Base URL (override for mock servers)
    pub base_url: String,
    /// Contact email sent with each request
    pub email: String,
    /// Optional API key raising the NCBI request quota
    pub api_key: Option<String>,
    pub tool: String,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for EntrezConfig {
    fn default() -> Self {
        Self {
            base_url: EUTILS_BASE_URL.to_string(),
            email: String::new(),
            api_key: None,
            tool: DEFAULT_TOOL.to_string(),
            timeout: None,
        }
    }
}

impl EntrezConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = email.trim().to_string();
        self
    }

    /// Set the API key. Blank keys are treated as absent.
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        let key = api_key.trim();
        self.api_key = (!key.is_empty()).then(|| key.to_string());
        self
    }

    pub fn with_tool(mut self, tool: &str) -> Self {
        self.tool = tool.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Query parameters appended to every E-utilities request.
    pub fn build_api_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("tool", self.tool.clone())];
        if !self.email.is_empty() {
            params.push(("email", self.email.clone()));
        }
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }
}

/// Parameters of one fetch run.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub keyword: String,
    pub start_year: i32,
    pub end_year: i32,
    /// Identifiers per search call
    pub page_size: u32,
    /// CSV file recreated at the start of the run
    pub output: PathBuf,
    /// Max in-flight record fetches per page; `None` fetches sequentially
    pub concurrency: Option<usize>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            start_year: 2023,
            end_year: 2023,
            page_size: DEFAULT_PAGE_SIZE,
            output: PathBuf::from(DEFAULT_OUTPUT),
            concurrency: None,
        }
    }
}

impl FetchConfig {
    pub fn new(keyword: &str, start_year: i32, end_year: i32) -> Self {
        Self {
            keyword: keyword.to_string(),
            start_year,
            end_year,
            ..Default::default()
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    /// Check the settings and build the query they describe.
    pub fn validate(&self) -> Result<SearchQuery> {
        if self.page_size == 0 {
            return Err(HarvestError::Config("page size must be at least 1".to_string()));
        }
        if self.concurrency == Some(0) {
            return Err(HarvestError::Config("concurrency must be at least 1".to_string()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(HarvestError::Config("output path must not be empty".to_string()));
        }
        SearchQuery::new(&self.keyword, self.start_year, self.end_year)
    }

    /// In-flight limit when the bounded-concurrency hydrate path is selected.
    pub fn concurrency_limit(&self) -> Option<usize> {
        self.concurrency.filter(|&n| n > 1)
    }

    pub fn is_concurrent(&self) -> bool {
        self.concurrency_limit().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_params_minimal() {
        let params = EntrezConfig::new().build_api_params();
        assert_eq!(params, vec![("tool", "pubharvest".to_string())]);
    }

    #[test]
    fn test_api_params_full() {
        let config = EntrezConfig::new()
            .with_email(" me@example.org ")
            .with_api_key("abc123");
        let params = config.build_api_params();
        assert!(params.contains(&("email", "me@example.org".to_string())));
        assert!(params.contains(&("api_key", "abc123".to_string())));
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let config = EntrezConfig::new().with_api_key("  ");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = EntrezConfig::new().with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_fetch_config_defaults() {
        let config = FetchConfig::new("intelligence", 2023, 2023);
        assert_eq!(config.page_size, 100);
        assert_eq!(config.output, PathBuf::from("articles.csv"));
        assert!(!config.is_concurrent());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let config = FetchConfig::new("intelligence", 2023, 2023).with_page_size(0);
        assert!(matches!(config.validate(), Err(HarvestError::Config(_))));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = FetchConfig::new("intelligence", 2023, 2023).with_concurrency(0);
        match config.validate() {
            Err(HarvestError::Config(msg)) => assert_eq!(msg, "concurrency must be at least 1"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_concurrency_of_one_is_sequential() {
        let config = FetchConfig::new("x", 2020, 2020).with_concurrency(1);
        assert!(!config.is_concurrent());
        assert_eq!(config.concurrency_limit(), None);
        let config = config.with_concurrency(4);
        assert!(config.is_concurrent());
        assert_eq!(config.concurrency_limit(), Some(4));
    }
}
