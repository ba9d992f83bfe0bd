//! Web search backend for reputation sampling.
//!
//! Provides the `SearchBackend` trait, an HTTP implementation speaking the
//! Custom Search JSON format, and the concurrent fan-out that turns a set
//! of queries into one deduplicated list of `ReputationSample`s.

use futures::future::join_all;
use sitescore_model::ReputationSample;
use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Errors from search backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Backend not available")]
    Unavailable,
}

/// Trait for web search backends.
pub trait SearchBackend {
    /// Run one query and return its hits as enabled samples.
    fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<ReputationSample>, BackendError>> + Send;

    /// Check if the backend is healthy.
    fn health_check(&self) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Get the backend name for logging.
    fn name(&self) -> &'static str;
}

/// Web search backend configuration.
#[derive(Debug, Clone)]
pub struct WebSearchConfig {
    /// Search endpoint URL
    pub base_url: String,
    /// API key sent as `key`
    pub api_key: String,
    /// Search engine id sent as `cx`
    pub engine_id: String,
    /// Hits requested per query
    pub results_per_query: u8,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com/customsearch/v1".to_string(),
            api_key: String::new(),
            engine_id: String::new(),
            results_per_query: 10,
            timeout_secs: 15,
        }
    }
}

/// HTTP JSON web search backend.
pub struct WebSearchBackend {
    config: WebSearchConfig,
    client: reqwest::Client,
}

impl WebSearchBackend {
    /// Create a new web search backend.
    pub fn new(config: WebSearchConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Build the query-string parameters for one search.
    fn build_params(&self, query: &str) -> Vec<(&'static str, String)> {
        vec![
            ("key", self.config.api_key.clone()),
            ("cx", self.config.engine_id.clone()),
            ("q", query.to_string()),
            ("num", self.config.results_per_query.to_string()),
        ]
    }

    /// Parse a search response into samples.
    ///
    /// A body without `items` is a valid empty result. Hits without a link
    /// cannot be deduplicated and are skipped.
    fn parse_response(&self, response: serde_json::Value) -> Result<Vec<ReputationSample>, BackendError> {
        let Some(items) = response.get("items") else {
            return Ok(Vec::new());
        };
        let items = items
            .as_array()
            .ok_or_else(|| BackendError::ParseError("items is not an array".to_string()))?;

        let text = |item: &serde_json::Value, key: &str| {
            item.get(key)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .trim()
                .to_string()
        };

        let samples = items
            .iter()
            .filter_map(|item| {
                let link = text(item, "link");
                if link.is_empty() {
                    return None;
                }
                let display = text(item, "displayLink");
                let source_domain = if display.is_empty() {
                    domain_of(&link)
                } else {
                    display
                };

                Some(
                    ReputationSample::new(text(item, "title"), link)
                        .with_snippet(text(item, "snippet"))
                        .with_source_domain(source_domain),
                )
            })
            .collect();

        Ok(samples)
    }
}

/// Host part of a link, empty if it does not parse.
fn domain_of(link: &str) -> String {
    url::Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_default()
}

impl SearchBackend for WebSearchBackend {
    async fn search(&self, query: &str) -> Result<Vec<ReputationSample>, BackendError> {
        tracing::debug!(query = %query, backend = self.name(), "Executing web search");

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&self.build_params(query))
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::QueryFailed(format!("HTTP {}: {}", status, body)));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BackendError::ParseError(e.to_string()))?;

        self.parse_response(json)
    }

    async fn health_check(&self) -> Result<(), BackendError> {
        let mut params = self.build_params("health");
        params.retain(|(k, _)| *k != "num");
        params.push(("num", "1".to_string()));

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(BackendError::Unavailable)
        }
    }

    fn name(&self) -> &'static str {
        "websearch"
    }
}

/// Run all queries concurrently and merge their hits.
///
/// A failed query is logged and contributes no samples; the others still
/// count. Samples are deduplicated by link, first occurrence wins.
pub async fn gather_samples<B: SearchBackend + Sync>(backend: &B, queries: &[String]) -> Vec<ReputationSample> {
    let searches = queries.iter().map(|query| async move {
        match backend.search(query).await {
            Ok(samples) => samples,
            Err(e) => {
                tracing::warn!(
                    query = %query,
                    backend = backend.name(),
                    error = %e,
                    "Reputation query failed, continuing without it"
                );
                Vec::new()
            }
        }
    });

    let mut seen = HashSet::new();
    join_all(searches)
        .await
        .into_iter()
        .flatten()
        .filter(|s| seen.insert(s.link.clone()))
        .collect()
}

/// Ticket identifying one reputation acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// Tracks the latest reputation acquisition so superseded results can be
/// dropped on arrival instead of merged.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: AtomicU64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new acquisition; every earlier ticket becomes stale.
    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Hand back `result` only if `ticket` is still the latest.
    pub fn accept<T>(&self, ticket: RequestTicket, result: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(result)
        } else {
            tracing::warn!(ticket = ticket.0, "Discarding superseded reputation result");
            None
        }
    }
}

/// Gather samples under a fresh ticket; `None` if a newer acquisition
/// started before this one finished.
pub async fn gather_latest<B: SearchBackend + Sync>(
    backend: &B,
    queries: &[String],
    tracker: &RequestTracker,
) -> Option<Vec<ReputationSample>> {
    let ticket = tracker.begin();
    let samples = gather_samples(backend, queries).await;
    tracker.accept(ticket, samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn backend() -> WebSearchBackend {
        WebSearchBackend::new(WebSearchConfig {
            api_key: "k".to_string(),
            engine_id: "cx".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_build_params() {
        let params = backend().build_params("\"Muster GmbH\" reviews");
        assert_eq!(params[0], ("key", "k".to_string()));
        assert_eq!(params[2], ("q", "\"Muster GmbH\" reviews".to_string()));
        assert_eq!(params[3], ("num", "10".to_string()));
    }

    #[test]
    fn test_parse_response() {
        let json = serde_json::json!({
            "items": [
                {
                    "title": "Muster GmbH - Erfahrungen",
                    "snippet": "Sehr zufrieden",
                    "link": "https://www.bewertungen.example/muster",
                    "displayLink": "bewertungen.example"
                },
                {
                    "title": "Muster GmbH Forum",
                    "link": "https://www.forum.example/t/1"
                },
                { "title": "no link" }
            ]
        });
        let samples = backend().parse_response(json).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].source_domain, "bewertungen.example");
        assert_eq!(samples[0].snippet, "Sehr zufrieden");
        assert_eq!(samples[1].source_domain, "forum.example");
        assert!(samples.iter().all(|s| s.enabled));
    }

    #[test]
    fn test_parse_no_items() {
        let samples = backend().parse_response(serde_json::json!({"kind": "x"})).unwrap();
        assert!(samples.is_empty());
        assert!(backend().parse_response(serde_json::json!({"items": 3})).is_err());
    }

    struct MockBackend {
        responses: HashMap<String, Vec<ReputationSample>>,
    }

    impl SearchBackend for MockBackend {
        async fn search(&self, query: &str) -> Result<Vec<ReputationSample>, BackendError> {
            self.responses
                .get(query)
                .cloned()
                .ok_or_else(|| BackendError::QueryFailed(format!("no response for {query}")))
        }

        async fn health_check(&self) -> Result<(), BackendError> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "mock"
        }
    }

    fn mock() -> MockBackend {
        let shared = ReputationSample::new("Shared", "https://a.example/1");
        let mut responses = HashMap::new();
        responses.insert(
            "q1".to_string(),
            vec![shared.clone(), ReputationSample::new("Only q1", "https://a.example/2")],
        );
        responses.insert(
            "q2".to_string(),
            vec![shared, ReputationSample::new("Only q2", "https://b.example/3")],
        );
        MockBackend { responses }
    }

    #[tokio::test]
    async fn test_gather_dedupes_by_link() {
        let queries = vec!["q1".to_string(), "q2".to_string()];
        let samples = gather_samples(&mock(), &queries).await;
        let titles: Vec<&str> = samples.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Shared", "Only q1", "Only q2"]);
    }

    #[tokio::test]
    async fn test_failed_query_contributes_nothing() {
        let queries = vec!["broken".to_string(), "q2".to_string()];
        let samples = gather_samples(&mock(), &queries).await;
        assert_eq!(samples.len(), 2);
    }

    #[tokio::test]
    async fn test_gather_latest_uncontested() {
        let tracker = RequestTracker::new();
        let queries = vec!["q1".to_string()];
        let samples = gather_latest(&mock(), &queries, &tracker).await;
        assert_eq!(samples.map(|s| s.len()), Some(2));
    }

    #[test]
    fn test_superseded_result_discarded() {
        let tracker = RequestTracker::new();
        let first = tracker.begin();
        let second = tracker.begin();
        assert!(!tracker.is_current(first));
        assert_eq!(tracker.accept(first, 1), None);
        assert_eq!(tracker.accept(second, 2), Some(2));
    }

    /// Holds "slow" queries until released; everything else answers at once.
    struct GatedBackend {
        gate: tokio::sync::Notify,
    }

    impl SearchBackend for GatedBackend {
        async fn search(&self, query: &str) -> Result<Vec<ReputationSample>, BackendError> {
            if query == "slow" {
                self.gate.notified().await;
            }
            Ok(vec![ReputationSample::new(query, format!("https://g.example/{query}"))])
        }

        async fn health_check(&self) -> Result<(), BackendError> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "gated"
        }
    }

    #[tokio::test]
    async fn test_older_acquisition_finishing_last_is_dropped() {
        let tracker = RequestTracker::new();
        let backend = GatedBackend {
            gate: tokio::sync::Notify::new(),
        };
        let slow = vec!["slow".to_string()];
        let fast = vec!["fast".to_string()];

        let older = gather_latest(&backend, &slow, &tracker);
        let newer = async {
            let result = gather_latest(&backend, &fast, &tracker).await;
            backend.gate.notify_one();
            result
        };
        let (older, newer) = tokio::join!(older, newer);

        assert_eq!(older, None);
        let titles: Vec<String> = newer.unwrap().into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["fast".to_string()]);
    }
}
