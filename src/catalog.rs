//! Problem catalog boundary and the solved.ac search client.
use crate::error::ExamError;
use crate::pool::Candidate;
use crate::tier::TierRange;
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Display;
use std::time::{Duration, Instant};

pub const SOLVED_AC_SEARCH_URL: &str = "https://solved.ac/api/v3/search/problem";

/// One page request against the catalog.
#[derive(Debug, Clone)]
pub struct CatalogQuery<'a> {
    pub range: TierRange,
    pub tags: &'a [String],
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl CatalogQuery<'_> {
    /// Catalog search expression, e.g. `tier:1..3 tag:graph`.
    pub fn query_string(&self) -> String {
        let mut parts = vec![format!("tier:{}..{}", self.range.lo(), self.range.hi())];
        parts.extend(
            self.tags
                .iter()
                .map(|tag| tag.trim())
                .filter(|tag| !tag.is_empty())
                .map(|tag| format!("tag:{tag}")),
        );
        parts.join(" ")
    }
}

#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub items: Vec<Candidate>,
    pub total_count: Option<u64>,
}

/// Paged problem search. A page shorter than `page_size` ends the results.
pub trait ProblemCatalog {
    fn search(&self, query: &CatalogQuery<'_>) -> Result<CatalogPage, ExamError>;
}

/// Bounded retry with linear backoff: attempt `n` waits `backoff * n` before
/// the next try.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(800),
        }
    }
}

/// Run `op` until it succeeds or the policy is exhausted, returning the last
/// error.
pub fn with_retries<T, E: Display>(
    policy: RetryPolicy,
    label: &str,
    mut op: impl FnMut(u32) -> Result<T, E>,
) -> Result<T, E> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(err) if attempt < attempts => {
                tracing::debug!(label, attempt, error = %err, "retrying");
                std::thread::sleep(policy.backoff * attempt);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Shared HTTP agent with a global per-request timeout.
pub fn http_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    items: Vec<Value>,
}

/// Keep catalog items that carry a numeric `problemId`; anything else is
/// skipped rather than failing the page.
fn candidates_from_items(items: Vec<Value>) -> Vec<Candidate> {
    items
        .into_iter()
        .filter_map(|item| {
            if !item.get("problemId").is_some_and(Value::is_u64) {
                tracing::debug!(item = %item, "catalog item without problemId skipped");
                return None;
            }
            match serde_json::from_value::<Candidate>(item) {
                Ok(candidate) => Some(candidate),
                Err(err) => {
                    tracing::warn!(error = %err, "malformed catalog item skipped");
                    None
                }
            }
        })
        .collect()
}

/// solved.ac `search/problem` client.
pub struct SolvedAcCatalog {
    agent: ureq::Agent,
    url: String,
    retry: RetryPolicy,
}

impl SolvedAcCatalog {
    pub fn new(agent: ureq::Agent, retry: RetryPolicy) -> Self {
        Self {
            agent,
            url: SOLVED_AC_SEARCH_URL.to_string(),
            retry,
        }
    }

    fn fetch_page(&self, query: &CatalogQuery<'_>) -> Result<SearchResponse, ureq::Error> {
        let mut response = self
            .agent
            .get(&self.url)
            .query("query", query.query_string())
            .query("page", query.page.to_string())
            .query("size", query.page_size.to_string())
            .header("Accept", "application/json")
            .call()?;
        response.body_mut().read_json::<SearchResponse>()
    }
}

impl ProblemCatalog for SolvedAcCatalog {
    fn search(&self, query: &CatalogQuery<'_>) -> Result<CatalogPage, ExamError> {
        let start = Instant::now();
        let response = with_retries(self.retry, "catalog search", |_| self.fetch_page(query))
            .map_err(|err| ExamError::CatalogQueryFailed {
                page: query.page,
                reason: err.to_string(),
            })?;
        let raw_items = response.items.len();
        let items = candidates_from_items(response.items);
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            page = query.page,
            items = items.len(),
            skipped = raw_items - items.len(),
            "catalog search complete"
        );
        Ok(CatalogPage {
            items,
            total_count: response.count,
        })
    }
}
