use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::{debug, instrument};
use url::Url;

use super::encode::{filter_pairs, needs_local_match, query_pairs};
use super::error::{from_reqwest, from_status};
use super::rate_limiter::RequestRateLimiter;
use super::retry::RetryPolicy;
use crate::domain::models::{Config, ConnectionConfig, Filter, Privilege, Query, Record};
use crate::domain::ports::RecordStore;
use crate::domain::{BackendError, StoreResult};

const PREFER: &str = "Prefer";
const RETURN_ROWS: &str = "return=representation";
const UPSERT_ROWS: &str = "resolution=merge-duplicates,return=representation";
const COUNT_EXACT: &str = "count=exact";

/// HTTP client for a PostgREST-compatible backend
///
/// Holds one credential for its whole life. Features:
/// - `apikey` and bearer headers on every request, marked sensitive
/// - per-request timeout
/// - token bucket rate limiting shared by all requests
/// - exponential backoff for transient errors on idempotent requests
///
/// Construction does not contact the backend.
#[derive(Debug)]
pub struct PostgrestClient {
    http_client: ReqwestClient,
    rest_base: Url,
    privilege: Privilege,
    rate_limiter: RequestRateLimiter,
    retry_policy: RetryPolicy,
}

impl PostgrestClient {
    /// Build a client for `connection`, tuned by `config`.
    pub fn new(connection: &ConnectionConfig, config: &Config) -> Result<Self> {
        let mut key = HeaderValue::from_str(connection.key())
            .context("Backend key contains characters not allowed in a header")?;
        key.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", connection.key()))
            .context("Backend key contains characters not allowed in a header")?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let http_client = ReqwestClient::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.backend.timeout_secs))
            .pool_max_idle_per_host(4)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            rest_base: rest_base(connection.endpoint())?,
            privilege: connection.privilege(),
            rate_limiter: RequestRateLimiter::from(&config.rate_limit),
            retry_policy: RetryPolicy::from(&config.retry),
        })
    }

    fn table_url(&self, table: &str) -> StoreResult<Url> {
        if table.is_empty()
            || !table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(BackendError::BadRequest(format!(
                "invalid table name '{table}'"
            )));
        }
        self.rest_base
            .join(table)
            .map_err(|e| BackendError::BadRequest(format!("invalid table name '{table}': {e}")))
    }

    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        self.http_client.request(method, url.clone())
    }

    /// Send one attempt and classify the outcome.
    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        self.rate_limiter.acquire().await;
        let response = request.send().await.map_err(|e| from_reqwest(&e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(from_status(status, &body))
    }

    /// Send with retries when `idempotent`, otherwise exactly once.
    async fn dispatch<B>(&self, idempotent: bool, build: B) -> StoreResult<Response>
    where
        B: Fn() -> RequestBuilder + Send + Sync,
    {
        if idempotent {
            self.retry_policy.execute(|| self.send(build())).await
        } else {
            self.send(build()).await
        }
    }

    async fn rows(response: Response) -> StoreResult<Vec<Record>> {
        let body = response.text().await.map_err(|e| from_reqwest(&e))?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn fetch(&self, url: &Url, pairs: &[(String, String)]) -> StoreResult<Vec<Record>> {
        let response = self
            .dispatch(true, || self.request(Method::GET, url).query(pairs))
            .await?;
        Self::rows(response).await
    }

    /// Select every column without a limit, then apply `query` locally.
    async fn select_narrowed(&self, url: &Url, query: &Query) -> StoreResult<Vec<Record>> {
        let broad = Query {
            columns: None,
            limit: None,
            ..query.clone()
        };
        let rows = self.fetch(url, &query_pairs(&broad)).await?;
        Ok(rows
            .iter()
            .filter(|row| query.matches(row))
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|row| query.project(row))
            .collect())
    }

    fn require_filters(
        operation: &'static str,
        table: &str,
        filters: &[Filter],
    ) -> StoreResult<()> {
        if filters.is_empty() {
            return Err(BackendError::UnfilteredMutation {
                operation,
                table: table.to_string(),
            });
        }
        if needs_local_match(filters) {
            return Err(BackendError::BadRequest(format!(
                "cannot {operation} {table} with a pattern containing '*'; \
                 the backend would treat it as a wildcard"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for PostgrestClient {
    #[instrument(skip(self, query), fields(privilege = %self.privilege))]
    async fn select(&self, table: &str, query: &Query) -> StoreResult<Vec<Record>> {
        let url = self.table_url(table)?;
        let rows = if needs_local_match(&query.filters) {
            self.select_narrowed(&url, query).await?
        } else {
            self.fetch(&url, &query_pairs(query)).await?
        };
        debug!(rows = rows.len(), "select complete");
        Ok(rows)
    }

    #[instrument(skip(self, filters), fields(privilege = %self.privilege))]
    async fn count(&self, table: &str, filters: &[Filter]) -> StoreResult<u64> {
        let url = self.table_url(table)?;
        if needs_local_match(filters) {
            let query = Query {
                filters: filters.to_vec(),
                ..Query::default()
            };
            let rows = self.select_narrowed(&url, &query).await?;
            return Ok(rows.len() as u64);
        }
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(filter_pairs(filters));
        let response = self
            .dispatch(true, || {
                self.request(Method::HEAD, &url)
                    .query(&pairs)
                    .header(PREFER, COUNT_EXACT)
            })
            .await?;
        let header = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        parse_content_range(&header)
    }

    #[instrument(skip(self, rows), fields(privilege = %self.privilege, rows = rows.len()))]
    async fn insert(&self, table: &str, rows: Vec<Record>) -> StoreResult<Vec<Record>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.table_url(table)?;
        let response = self
            .dispatch(false, || {
                self.request(Method::POST, &url)
                    .header(PREFER, RETURN_ROWS)
                    .json(&rows)
            })
            .await?;
        Self::rows(response).await
    }

    #[instrument(skip(self, rows), fields(privilege = %self.privilege, rows = rows.len()))]
    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Record>,
        on_conflict: &str,
    ) -> StoreResult<Vec<Record>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.table_url(table)?;
        let response = self
            .dispatch(true, || {
                self.request(Method::POST, &url)
                    .query(&[("on_conflict", on_conflict)])
                    .header(PREFER, UPSERT_ROWS)
                    .json(&rows)
            })
            .await?;
        Self::rows(response).await
    }

    #[instrument(skip(self, patch, filters), fields(privilege = %self.privilege))]
    async fn update(
        &self,
        table: &str,
        patch: Record,
        filters: &[Filter],
    ) -> StoreResult<Vec<Record>> {
        Self::require_filters("update", table, filters)?;
        let url = self.table_url(table)?;
        let pairs = filter_pairs(filters);
        let response = self
            .dispatch(true, || {
                self.request(Method::PATCH, &url)
                    .query(&pairs)
                    .header(PREFER, RETURN_ROWS)
                    .json(&patch)
            })
            .await?;
        Self::rows(response).await
    }

    #[instrument(skip(self, filters), fields(privilege = %self.privilege))]
    async fn delete(&self, table: &str, filters: &[Filter]) -> StoreResult<Vec<Record>> {
        Self::require_filters("delete", table, filters)?;
        let url = self.table_url(table)?;
        let pairs = filter_pairs(filters);
        let response = self
            .dispatch(true, || {
                self.request(Method::DELETE, &url)
                    .query(&pairs)
                    .header(PREFER, RETURN_ROWS)
            })
            .await?;
        Self::rows(response).await
    }
}

/// `{endpoint}/rest/v1/`, keeping any path prefix on the endpoint.
fn rest_base(endpoint: &Url) -> Result<Url> {
    let mut base = endpoint.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("rest/v1/")
        .with_context(|| format!("Invalid backend endpoint: {endpoint}"))
}

/// Total from a `Content-Range` value such as `*/42` or `0-9/42`.
fn parse_content_range(header: &str) -> StoreResult<u64> {
    header
        .rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse().ok())
        .ok_or_else(|| BackendError::InvalidCountHeader(header.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_base_keeps_prefix() {
        let plain = Url::parse("https://abc.supabase.co").unwrap();
        assert_eq!(
            rest_base(&plain).unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/"
        );
        let prefixed = Url::parse("http://localhost:54321/proxy").unwrap();
        assert_eq!(
            rest_base(&prefixed).unwrap().as_str(),
            "http://localhost:54321/proxy/rest/v1/"
        );
    }

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range("*/42").unwrap(), 42);
        assert_eq!(parse_content_range("0-9/120").unwrap(), 120);
        assert!(matches!(
            parse_content_range("*/*"),
            Err(BackendError::InvalidCountHeader(_))
        ));
        assert!(parse_content_range("").is_err());
    }
}
