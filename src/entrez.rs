//! NCBI E-utilities client.
//!
//! Two calls are used: `esearch` (query term → total count and one page of
//! PubMed identifiers) and `efetch` (one identifier → MEDLINE text record).

use crate::config::EntrezConfig;
use crate::error::{HarvestError, OptionExt, Result};
use crate::query::SearchQuery;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

/// Fallback wait reported for 429 responses without `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// One decoded esearch response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    /// Total number of records matching the query
    pub count: u64,
    /// Identifiers on this page, in service order
    pub ids: Vec<String>,
}

/// E-utilities client holding one HTTP connection pool.
pub struct EntrezClient {
    client: Client,
    config: EntrezConfig,
}

impl EntrezClient {
    pub fn new(config: EntrezConfig) -> Result<Self> {
        Url::parse(&config.base_url)
            .map_err(|e| HarvestError::Config(format!("Invalid base URL {}: {}", config.base_url, e)))?;

        if config.email.is_empty() {
            warn!("No contact email configured; NCBI asks for one on every request");
        }

        let mut builder = Client::builder().user_agent(format!("{}/{}", config.tool, env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| HarvestError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Total number of records matching `query`.
    pub async fn count(&self, query: &SearchQuery) -> Result<u64> {
        let term = query.term();
        debug!(term = %term, "Requesting ESearch count");

        let params = vec![
            ("db", "pubmed".to_string()),
            ("term", term),
            ("retmax", "0".to_string()),
            ("retmode", "json".to_string()),
        ];
        let data = self.esearch(params).await?;
        parse_count(&data.count)
    }

    /// One page of identifiers, `retmax` long, starting at `retstart`.
    pub async fn search(&self, query: &SearchQuery, retmax: u32, retstart: u64) -> Result<SearchPage> {
        debug!(retstart = retstart, retmax = retmax, "Requesting ESearch page");

        let params = vec![
            ("db", "pubmed".to_string()),
            ("term", query.term()),
            ("retmax", retmax.to_string()),
            ("retstart", retstart.to_string()),
            ("retmode", "json".to_string()),
        ];
        let data = self.esearch(params).await?;

        Ok(SearchPage {
            count: parse_count(&data.count)?,
            ids: data.idlist,
        })
    }

    /// Full MEDLINE text of one record.
    pub async fn fetch_record(&self, id: &str) -> Result<String> {
        debug!(id = id, "Requesting EFetch record");

        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("id", id.to_string()),
            ("rettype", "medline".to_string()),
            ("retmode", "text".to_string()),
        ];
        params.extend(self.config.build_api_params());

        let response = self
            .client
            .get(self.endpoint("efetch.fcgi"))
            .query(&params)
            .send()
            .await?;
        let response = check_status(response, "EFetch").await?;

        Ok(response.text().await?)
    }

    async fn esearch(&self, mut params: Vec<(&'static str, String)>) -> Result<ESearchData> {
        params.extend(self.config.build_api_params());

        let response = self
            .client
            .get(self.endpoint("esearch.fcgi"))
            .query(&params)
            .send()
            .await?;
        let response = check_status(response, "ESearch").await?;

        let body = response.text().await?;
        parse_esearch(&body)
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.config.base_url, name)
    }
}

/// Map non-success statuses to typed errors.
async fn check_status(response: Response, call: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        warn!(call = call, retry_after = secs, "Rate limited by NCBI");
        return Err(HarvestError::RateLimited(secs));
    }

    let body = response.text().await.unwrap_or_default();
    warn!(call = call, status = %status, "E-utilities request failed");
    Err(HarvestError::Api {
        code: status.as_u16() as i32,
        message: format!("{} error: {} - {}", call, status, body.trim()),
    })
}

// === ESearch Response Types ===

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    esearchresult: Option<ESearchData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ESearchData {
    #[serde(default)]
    count: String,
    #[serde(default)]
    idlist: Vec<String>,
    #[serde(rename = "ERROR", default)]
    error: Option<String>,
}

fn parse_esearch(body: &str) -> Result<ESearchData> {
    let response: ESearchResponse = serde_json::from_str(body)
        .map_err(|e| HarvestError::Parse(format!("Failed to parse ESearch response: {}", e)))?;

    if let Some(message) = response.error {
        return Err(HarvestError::Api { code: 200, message });
    }

    let data = response.esearchresult.ok_or_parse("ESearch response has no esearchresult")?;
    if let Some(message) = data.error {
        return Err(HarvestError::Api { code: 200, message });
    }

    Ok(data)
}

fn parse_count(count: &str) -> Result<u64> {
    count
        .trim()
        .parse()
        .map_err(|_| HarvestError::Parse(format!("Invalid ESearch count: {:?}", count)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_esearch_page() {
        let body = r#"{
            "header": {"type": "esearch", "version": "0.3"},
            "esearchresult": {
                "count": "250",
                "retmax": "2",
                "retstart": "100",
                "idlist": ["38000001", "38000002"]
            }
        }"#;
        let data = parse_esearch(body).expect("valid response");
        assert_eq!(parse_count(&data.count).expect("count"), 250);
        assert_eq!(data.idlist, vec!["38000001", "38000002"]);
    }

    #[test]
    fn test_parse_esearch_error_field() {
        let body = r#"{"esearchresult": {"ERROR": "Invalid query"}}"#;
        assert!(matches!(parse_esearch(body), Err(HarvestError::Api { .. })));
    }

    #[test]
    fn test_parse_esearch_top_level_error() {
        let body = r#"{"error": "API key invalid", "api-key": "x"}"#;
        match parse_esearch(body) {
            Err(HarvestError::Api { message, .. }) => assert_eq!(message, "API key invalid"),
            other => panic!("unexpected result: {:?}", other.map(|d| d.count)),
        }
    }

    #[test]
    fn test_parse_esearch_missing_result() {
        assert!(matches!(parse_esearch("{}"), Err(HarvestError::Parse(_))));
        assert!(matches!(parse_esearch("<html>"), Err(HarvestError::Parse(_))));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(" 0 ").expect("count"), 0);
        assert!(matches!(parse_count(""), Err(HarvestError::Parse(_))));
        assert!(matches!(parse_count("-3"), Err(HarvestError::Parse(_))));
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let config = EntrezConfig::new().with_base_url("not a url");
        assert!(matches!(EntrezClient::new(config), Err(HarvestError::Config(_))));
    }
}
