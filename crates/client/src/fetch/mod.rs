//! Cache-routed HTTP fetcher.
//!
//! ### Call shapes
//! - `fetch_page(url)`: unauthenticated GET returning the body as text,
//!   cached under the `page:` namespace keyed by the URL alone.
//! - `fetch_api(base_url, params)`: GET with a bearer token and query
//!   parameters returning decoded JSON, cached under the `api:` namespace
//!   keyed by the order-independent parameter fingerprint.
//!
//! ### Failure policy
//! - No retries. A network failure, timeout or non-2xx status is returned
//!   to the caller and nothing is cached.
//! - The bearer token is only needed when the response is not cached.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, header};
use serde_json::Value;

use forkmap_core::cache::{CacheStore, Namespace, fingerprint, get_or_fetch};
use forkmap_core::{AppConfig, Error};

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "forkmap/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "forkmap/0.1".to_string(), timeout: Duration::from_millis(20000) }
    }
}

impl FetchConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout() }
    }
}

/// One outbound GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub bearer: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self { url: url.into(), query: Vec::new(), bearer: None }
    }
}

/// Network seam under the fetcher.
///
/// Implementations return the raw body of a 2xx response and map every
/// other outcome to `Error::Transport` or `Error::HttpStatus`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &HttpRequest) -> Result<Bytes, Error>;
}

/// Transport backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// Create a transport with the given configuration.
    pub fn new(config: &FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: &HttpRequest) -> Result<Bytes, Error> {
        let start = Instant::now();

        let mut builder = self.http.get(&request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token).header(header::ACCEPT, "application/json");
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Transport(format!("timeout fetching {}", request.url))
            } else {
                Error::Transport(format!("network error: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus { status: status.as_u16(), url: request.url.clone() });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("failed to read response: {}", e)))?;

        tracing::debug!(
            "fetched {} ({} params) in {}ms ({} bytes)",
            request.url,
            request.query.len(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(bytes)
    }
}

/// Fetcher that answers from the cache and falls back to the transport.
pub struct Fetcher {
    transport: Box<dyn Transport>,
    cache: Box<dyn CacheStore>,
    bearer: Option<String>,
}

impl Fetcher {
    pub fn new(transport: Box<dyn Transport>, cache: Box<dyn CacheStore>) -> Self {
        Self { transport, cache, bearer: None }
    }

    /// Set the bearer token used for API calls. Blank tokens count as absent.
    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn cache(&self) -> &dyn CacheStore {
        self.cache.as_ref()
    }

    /// Fetch a page as text.
    pub async fn fetch_page(&mut self, url: &str) -> Result<String, Error> {
        let key = fingerprint(Namespace::Page, url, std::iter::empty::<(&str, &str)>());
        let transport = self.transport.as_ref();
        let request = HttpRequest::get(url.trim());

        let value = get_or_fetch(self.cache.as_mut(), &key, || async move {
            let bytes = transport.get(&request).await?;
            let text = String::from_utf8(bytes.to_vec())
                .map_err(|e| Error::Parse(format!("page {} is not UTF-8: {e}", request.url)))?;
            Ok(Value::String(text))
        })
        .await?;

        match value {
            Value::String(text) => Ok(text),
            _ => Err(Error::Parse(format!("cached entry {key} is not page text"))),
        }
    }

    /// Fetch and decode a JSON API response.
    pub async fn fetch_api(&mut self, base_url: &str, params: &[(String, String)]) -> Result<Value, Error> {
        let key = fingerprint(Namespace::Api, base_url, params.iter().map(|(k, v)| (k, v)));
        let transport = self.transport.as_ref();
        let bearer = self.bearer.clone();
        let url = base_url.trim().to_string();
        let query = params.to_vec();

        get_or_fetch(self.cache.as_mut(), &key, || async move {
            let bearer = bearer.ok_or_else(|| Error::Auth(format!("no API key for uncached request to {url}")))?;
            let request = HttpRequest { url, query, bearer: Some(bearer) };
            let bytes = transport.get(&request).await?;
            serde_json::from_slice(&bytes)
                .map_err(|e| Error::Parse(format!("response from {} is not JSON: {e}", request.url)))
        })
        .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use forkmap_core::MemoryCache;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Scripted transport: answers by URL and records every request.
    #[derive(Clone, Default)]
    pub(crate) struct StubTransport {
        pub(crate) bodies: Arc<Mutex<HashMap<String, Result<String, u16>>>>,
        pub(crate) calls: Arc<Mutex<Vec<HttpRequest>>>,
    }

    impl StubTransport {
        pub(crate) fn respond(&self, url: &str, body: &str) {
            self.bodies.lock().unwrap().insert(url.to_string(), Ok(body.to_string()));
        }

        pub(crate) fn fail(&self, url: &str, status: u16) {
            self.bodies.lock().unwrap().insert(url.to_string(), Err(status));
        }

        pub(crate) fn calls(&self) -> Vec<HttpRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn get(&self, request: &HttpRequest) -> Result<Bytes, Error> {
            self.calls.lock().unwrap().push(request.clone());
            match self.bodies.lock().unwrap().get(&request.url) {
                Some(Ok(body)) => Ok(Bytes::from(body.clone())),
                Some(Err(status)) => Err(Error::HttpStatus { status: *status, url: request.url.clone() }),
                None => Err(Error::Transport(format!("connection refused: {}", request.url))),
            }
        }
    }

    fn fetcher(stub: &StubTransport) -> Fetcher {
        Fetcher::new(Box::new(stub.clone()), Box::new(MemoryCache::new()))
    }

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    const WIKI: &str = "https://en.wikipedia.org/wiki/Cities";
    const SEARCH: &str = "https://api.yelp.com/v3/businesses/search";

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "forkmap/0.1");
        assert_eq!(config.timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_fetch_config_from_app() {
        let app = AppConfig { user_agent: "test-agent".into(), timeout_ms: 1500, ..Default::default() };
        let config = FetchConfig::from_app(&app);
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_reqwest_transport_builds() {
        assert!(ReqwestTransport::new(&FetchConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_page_cached_after_first_call() {
        let stub = StubTransport::default();
        stub.respond(WIKI, "<html>cities</html>");
        let mut fetcher = fetcher(&stub);

        let first = fetcher.fetch_page(WIKI).await.unwrap();
        let second = fetcher.fetch_page(WIKI).await.unwrap();

        assert_eq!(first, "<html>cities</html>");
        assert_eq!(first, second);
        assert_eq!(stub.calls().len(), 1);
        assert_eq!(stub.calls()[0].bearer, None);
        assert_eq!(fetcher.cache().count(Namespace::Page), 1);
    }

    #[tokio::test]
    async fn test_fetch_api_order_independent() {
        let stub = StubTransport::default();
        stub.respond(SEARCH, r#"{"businesses": [], "total": 0}"#);
        let mut fetcher = fetcher(&stub).with_bearer(Some("secret".into()));

        let a = fetcher
            .fetch_api(SEARCH, &params(&[("location", "Troy"), ("term", "food")]))
            .await
            .unwrap();
        let b = fetcher
            .fetch_api(SEARCH, &params(&[("term", "food"), ("location", "Troy")]))
            .await
            .unwrap();

        assert_eq!(a, b);
        assert_eq!(stub.calls().len(), 1);
        assert_eq!(fetcher.cache().count(Namespace::Api), 1);
    }

    #[tokio::test]
    async fn test_fetch_api_sends_bearer_and_query() {
        let stub = StubTransport::default();
        stub.respond(SEARCH, r#"{"businesses": []}"#);
        let mut fetcher = fetcher(&stub).with_bearer(Some("secret".into()));

        fetcher.fetch_api(SEARCH, &params(&[("location", "Troy")])).await.unwrap();

        let calls = stub.calls();
        assert_eq!(calls[0].bearer.as_deref(), Some("secret"));
        assert_eq!(calls[0].query, params(&[("location", "Troy")]));
    }

    #[tokio::test]
    async fn test_fetch_api_miss_without_key_is_auth_error() {
        let stub = StubTransport::default();
        stub.respond(SEARCH, r#"{"businesses": []}"#);
        let mut fetcher = fetcher(&stub).with_bearer(Some("  ".into()));

        let result = fetcher.fetch_api(SEARCH, &params(&[("location", "Troy")])).await;

        assert!(matches!(result, Err(Error::Auth(_))));
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_api_hit_needs_no_key() {
        let stub = StubTransport::default();
        let mut cache = MemoryCache::new();
        let key = fingerprint(Namespace::Api, SEARCH, [("location", "Troy")]);
        cache.put(key, serde_json::json!({"businesses": []})).await.unwrap();

        let mut fetcher = Fetcher::new(Box::new(stub.clone()), Box::new(cache));
        let value = fetcher.fetch_api(SEARCH, &params(&[("location", "Troy")])).await.unwrap();

        assert_eq!(value, serde_json::json!({"businesses": []}));
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_not_cached() {
        let stub = StubTransport::default();
        stub.fail(WIKI, 503);
        let mut fetcher = fetcher(&stub);

        let result = fetcher.fetch_page(WIKI).await;
        assert!(matches!(result, Err(Error::HttpStatus { status: 503, .. })));
        assert!(fetcher.cache().is_empty());

        stub.respond(WIKI, "<html></html>");
        assert_eq!(fetcher.fetch_page(WIKI).await.unwrap(), "<html></html>");
        assert_eq!(stub.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_non_json_api_body_is_parse_error() {
        let stub = StubTransport::default();
        stub.respond(SEARCH, "<html>rate limited</html>");
        let mut fetcher = fetcher(&stub).with_bearer(Some("secret".into()));

        let result = fetcher.fetch_api(SEARCH, &[]).await;
        assert!(matches!(result, Err(Error::Parse(_))));
        assert!(fetcher.cache().is_empty());
    }
}
