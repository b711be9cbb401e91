//! HTTP client for the AgentOps trace API.
//!
//! A client holds one API key and lazily exchanges it for a session token on
//! its first authenticated call. Responses are returned as raw text; the
//! adapter never interprets trace payloads.

use std::time::Duration;

use serde::Deserialize;

use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::error::{AdapterError, Result};
use crate::observability::mask_key;

/// Bearer token and project returned by the token exchange.
#[derive(Debug, Clone)]
struct SessionToken {
    token: String,
    project_id: Option<String>,
}

#[derive(Deserialize)]
struct AuthResponse {
    token: Option<String>,
    project_id: Option<String>,
}

pub struct AgentOpsClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
    session: Option<SessionToken>,
}

impl std::fmt::Debug for AgentOpsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentOpsClient")
            .field("api_key", &mask_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("authenticated", &self.session.is_some())
            .finish()
    }
}

impl AgentOpsClient {
    /// Create a client with its own connection pool and the default timeout.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self::with_http(
            reqwest::Client::new(),
            api_key,
            base_url,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create a client on top of a shared `reqwest::Client`.
    ///
    /// The pool carries no credentials, so sharing it across invocations does
    /// not share session tokens.
    pub fn with_http(
        http: reqwest::Client,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            session: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn project_id(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.project_id.as_deref())
    }

    /// Exchange the API key for a session token and keep it on the client.
    pub async fn authenticate(&mut self) -> Result<()> {
        self.session = Some(self.exchange_key().await?);
        Ok(())
    }

    async fn exchange_key(&self) -> Result<SessionToken> {
        let url = format!("{}/v3/auth/token", self.base_url);
        tracing::debug!(url = %url, api_key = %mask_key(&self.api_key), "requesting session token");

        let auth_failed = |e: reqwest::Error| {
            tracing::warn!(error = %e, "token exchange failed");
            AdapterError::Authentication(format!("Failed to authenticate with AgentOps API: {e}"))
        };

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "api_key": self.api_key }))
            .timeout(self.timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(auth_failed)?;

        let body: AuthResponse = response.json().await.map_err(auth_failed)?;

        let token = body.token.filter(|t| !t.is_empty()).ok_or_else(|| {
            AdapterError::Authentication(
                "Failed to get JWT token from AgentOps API: No token in response".into(),
            )
        })?;

        tracing::debug!(project_id = ?body.project_id, "session token acquired");
        Ok(SessionToken {
            token,
            project_id: body.project_id,
        })
    }

    /// Authorization header value, authenticating first if needed.
    async fn bearer(&mut self) -> Result<String> {
        if let Some(session) = &self.session {
            return Ok(format!("Bearer {}", session.token));
        }
        let session = self.exchange_key().await?;
        let header = format!("Bearer {}", session.token);
        self.session = Some(session);
        Ok(header)
    }

    /// Build `{base_url}/<segments...>`, percent-encoding each segment so
    /// caller-supplied ids cannot add path components, a query, or a fragment.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url> {
        let bad_url = |detail: String| {
            AdapterError::Request(format!("Invalid AgentOps API URL {}: {detail}", self.base_url))
        };
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| bad_url(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| bad_url("cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_text(
        &self,
        url: reqwest::Url,
        query: &[(&str, String)],
        auth: &str,
    ) -> std::result::Result<String, reqwest::Error> {
        self.http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .query(query)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    /// List the project's most recent traces. `limit` must already be
    /// validated by the caller.
    pub async fn list_traces(&mut self, limit: u32) -> Result<String> {
        let auth = self.bearer().await?;
        let url = self.endpoint(&["v4", "traces"])?;
        tracing::info!(url = %url, limit, "listing traces");

        self.get_text(url, &[("limit", limit.to_string())], &auth)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "list traces failed");
                AdapterError::Request(format!("Failed to list AgentOps API traces: {e}"))
            })
    }

    /// Fetch one trace with all of its spans.
    pub async fn trace_detail(&mut self, trace_id: &str) -> Result<String> {
        if trace_id.is_empty() {
            return Err(AdapterError::Validation("trace_id is required".into()));
        }
        let auth = self.bearer().await?;
        let url = self.endpoint(&["v4", "traces", trace_id])?;
        tracing::info!(url = %url, "fetching trace detail");

        self.get_text(url, &[], &auth).await.map_err(|e| {
            tracing::warn!(error = %e, trace_id, "trace detail failed");
            AdapterError::Request(format!("Failed to get trace detail for {trace_id}: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    async fn mock_auth(server: &MockServer) -> httpmock::Mock<'_> {
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v3/auth/token")
                    .json_body(json!({ "api_key": "test-key" }));
                then.status(200)
                    .json_body(json!({ "token": "jwt-123", "project_id": "proj-1" }));
            })
            .await
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = AgentOpsClient::new("k", "https://api.agentops.ai/");
        assert_eq!(client.base_url(), "https://api.agentops.ai");
        assert!(!client.is_authenticated());
    }

    #[test]
    fn endpoint_keeps_plain_ids_verbatim() {
        let client = AgentOpsClient::new("k", "http://host:8080/");
        let url = client.endpoint(&["v4", "traces", "abc123"]).unwrap();
        assert_eq!(url.as_str(), "http://host:8080/v4/traces/abc123");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let client = AgentOpsClient::new("k", "http://host/api");
        let url = client.endpoint(&["v4", "traces"]).unwrap();
        assert_eq!(url.path(), "/api/v4/traces");
    }

    #[test]
    fn endpoint_encodes_id_as_single_segment() {
        let client = AgentOpsClient::new("k", "http://host");
        for id in ["?limit=99", "a/b", "x#frag"] {
            let url = client.endpoint(&["v4", "traces", id]).unwrap();
            assert!(url.query().is_none(), "{id}: {url}");
            assert!(url.fragment().is_none(), "{id}: {url}");
            assert_eq!(url.path_segments().unwrap().count(), 3, "{id}: {url}");
        }
    }

    #[test]
    fn endpoint_rejects_unparseable_base() {
        let client = AgentOpsClient::new("k", "not a url");
        assert!(matches!(
            client.endpoint(&["v4", "traces"]),
            Err(AdapterError::Request(_))
        ));
    }

    #[test]
    fn debug_output_masks_key() {
        let client = AgentOpsClient::new("secret-api-key", "http://x");
        let dbg = format!("{client:?}");
        assert!(!dbg.contains("secret-api-key"));
    }

    #[tokio::test]
    async fn authenticate_stores_token_and_project() {
        let server = MockServer::start_async().await;
        let auth = mock_auth(&server).await;

        let mut client = AgentOpsClient::new("test-key", server.base_url());
        client.authenticate().await.unwrap();

        auth.assert_async().await;
        assert!(client.is_authenticated());
        assert_eq!(client.project_id(), Some("proj-1"));
    }

    #[tokio::test]
    async fn authenticate_rejects_missing_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v3/auth/token");
                then.status(200).json_body(json!({ "project_id": "proj-1" }));
            })
            .await;

        let mut client = AgentOpsClient::new("test-key", server.base_url());
        let err = client.authenticate().await.unwrap_err();
        assert!(matches!(err, AdapterError::Authentication(_)));
        assert!(err.to_string().contains("No token in response"));
        assert!(!client.is_authenticated());
    }

    #[tokio::test]
    async fn authenticate_rejects_empty_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v3/auth/token");
                then.status(200).json_body(json!({ "token": "" }));
            })
            .await;

        let mut client = AgentOpsClient::new("test-key", server.base_url());
        assert!(matches!(
            client.authenticate().await,
            Err(AdapterError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn authenticate_maps_http_401() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v3/auth/token");
                then.status(401).body("unauthorized");
            })
            .await;

        let mut client = AgentOpsClient::new("bad", server.base_url());
        let err = client.authenticate().await.unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Failed to authenticate with AgentOps API"));
    }

    #[tokio::test]
    async fn token_is_exchanged_once_per_client() {
        let server = MockServer::start_async().await;
        let auth = mock_auth(&server).await;
        let list = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v4/traces")
                    .header("authorization", "Bearer jwt-123");
                then.status(200).body("[]");
            })
            .await;
        let detail = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v4/traces/t-1")
                    .header("authorization", "Bearer jwt-123");
                then.status(200).body("{}");
            })
            .await;

        let mut client = AgentOpsClient::new("test-key", server.base_url());
        client.list_traces(5).await.unwrap();
        client.trace_detail("t-1").await.unwrap();
        client.list_traces(7).await.unwrap();

        auth.assert_hits_async(1).await;
        list.assert_hits_async(2).await;
        detail.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn failed_exchange_leaves_client_unauthenticated_and_retries() {
        let server = MockServer::start_async().await;
        let auth = server
            .mock_async(|when, then| {
                when.method(POST).path("/v3/auth/token");
                then.status(401);
            })
            .await;
        let list = server
            .mock_async(|when, then| {
                when.method(GET).path("/v4/traces");
                then.status(200).body("[]");
            })
            .await;

        let mut client = AgentOpsClient::new("test-key", server.base_url());
        for _ in 0..2 {
            let err = client.list_traces(5).await.unwrap_err();
            assert!(matches!(err, AdapterError::Authentication(_)));
            assert!(!client.is_authenticated());
        }

        auth.assert_hits_async(2).await;
        list.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn trace_detail_sends_reserved_characters_inside_the_path() {
        let server = MockServer::start_async().await;
        mock_auth(&server).await;
        let listing = server
            .mock_async(|when, then| {
                when.method(GET).path("/v4/traces");
                then.status(200).body("listing");
            })
            .await;
        let detail = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path_matches(regex::Regex::new(r"^/v4/traces/[^/]+$").unwrap());
                then.status(200).body("detail");
            })
            .await;

        let mut client = AgentOpsClient::new("test-key", server.base_url());
        let body = client.trace_detail("?limit=99").await.unwrap();

        assert_eq!(body, "detail");
        listing.assert_hits_async(0).await;
        detail.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn list_traces_sends_limit_and_returns_raw_body() {
        let server = MockServer::start_async().await;
        mock_auth(&server).await;
        let list = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v4/traces")
                    .query_param("limit", "42")
                    .header("content-type", "application/json");
                then.status(200).body(r#"{"traces":[],"total":0}"#);
            })
            .await;

        let mut client = AgentOpsClient::new("test-key", server.base_url());
        let body = client.list_traces(42).await.unwrap();

        list.assert_async().await;
        assert_eq!(body, r#"{"traces":[],"total":0}"#);
    }

    #[tokio::test]
    async fn list_traces_maps_server_error() {
        let server = MockServer::start_async().await;
        mock_auth(&server).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v4/traces");
                then.status(500).body("boom");
            })
            .await;

        let mut client = AgentOpsClient::new("test-key", server.base_url());
        let err = client.list_traces(5).await.unwrap_err();
        assert!(matches!(err, AdapterError::Request(_)));
        assert!(err.to_string().starts_with("Failed to list AgentOps API traces"));
    }

    #[tokio::test]
    async fn empty_trace_id_fails_before_network() {
        let server = MockServer::start_async().await;
        let auth = mock_auth(&server).await;

        let mut client = AgentOpsClient::new("test-key", server.base_url());
        let err = client.trace_detail("").await.unwrap_err();

        assert!(matches!(err, AdapterError::Validation(_)));
        auth.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn trace_detail_maps_not_found() {
        let server = MockServer::start_async().await;
        mock_auth(&server).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v4/traces/missing");
                then.status(404);
            })
            .await;

        let mut client = AgentOpsClient::new("test-key", server.base_url());
        let err = client.trace_detail("missing").await.unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Failed to get trace detail for missing"));
    }
}
