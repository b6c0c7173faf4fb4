//! HTTP client for the knowledge-graph and vector-search backends.
//!
//! One enrichment issues two concurrent calls against the same base URL:
//! `graph/query` for related entities and patterns, and `vector/search` for
//! precedent documents. Both must succeed; their results are merged into a
//! single scored payload.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};
use url::Url;

use reportforge_shared::{
    EnrichmentError, EnrichmentResult, EnrichmentSettings, ModuleId, Provenance, ReportForgeError,
    Result,
};

use crate::client::EnrichmentClient;

/// User-Agent string for backend requests.
const USER_AGENT: &str = concat!("ReportForge/", env!("CARGO_PKG_VERSION"));

/// Longest context (in chars) sent to the backends.
const MAX_CONTEXT_CHARS: usize = 2000;

/// Confidence of a merged live result.
pub const LIVE_CONFIDENCE: f64 = 1.0;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GraphQuery<'a> {
    module_id: &'a str,
    context: &'a str,
    context_hash: String,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct GraphResponse {
    #[serde(default)]
    entities: Vec<Entity>,
    #[serde(default)]
    patterns: Vec<Pattern>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entity {
    name: String,
    #[serde(default)]
    kind: String,
    relevance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Pattern {
    description: String,
    strength: f64,
}

#[derive(Debug, Serialize)]
struct VectorSearch<'a> {
    namespace: &'a str,
    query: &'a str,
    top_k: usize,
}

#[derive(Debug, Deserialize)]
struct VectorResponse {
    #[serde(default)]
    matches: Vec<VectorMatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorMatch {
    id: String,
    score: f64,
    #[serde(default)]
    snippet: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Live enrichment over HTTP.
#[derive(Debug, Clone)]
pub struct LiveEnrichmentClient {
    client: Client,
    base: Url,
    api_key: Option<String>,
    top_k: usize,
    timeout: Duration,
}

impl LiveEnrichmentClient {
    /// Build a client for `base`, which should end with `/`.
    pub fn new(base: Url, api_key: Option<String>, top_k: usize, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ReportForgeError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base,
            api_key,
            top_k: top_k.max(1),
            timeout,
        })
    }

    /// Client for the configured endpoint, or `None` when the run is fallback-only.
    pub fn from_settings(settings: &EnrichmentSettings) -> Result<Option<Self>> {
        let Some(base) = settings.live_endpoint()? else {
            return Ok(None);
        };
        Self::new(base, settings.api_key(), settings.top_k, settings.call_timeout).map(Some)
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> std::result::Result<R, EnrichmentError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| EnrichmentError::Unavailable(format!("invalid backend path {path}: {e}")))?;

        let mut request = self.client.post(url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| self.transport_error(path, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(EnrichmentError::Unavailable(format!(
                "{path} returned HTTP {}",
                status.as_u16()
            )));
        }
        response
            .json::<R>()
            .await
            .map_err(|e| EnrichmentError::Unavailable(format!("{path} response undecodable: {e}")))
    }

    fn transport_error(&self, path: &str, err: reqwest::Error) -> EnrichmentError {
        if err.is_timeout() {
            EnrichmentError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            EnrichmentError::Unavailable(format!("{path} request failed: {err}"))
        }
    }
}

#[async_trait]
impl EnrichmentClient for LiveEnrichmentClient {
    fn name(&self) -> &str {
        "live"
    }

    #[instrument(skip_all, fields(module = %module_id))]
    async fn enrich(
        &self,
        module_id: &ModuleId,
        context: &str,
    ) -> std::result::Result<EnrichmentResult, EnrichmentError> {
        let context = truncate_context(context);
        let graph_body = GraphQuery {
            module_id: module_id.as_str(),
            context,
            context_hash: context_hash(context),
            limit: self.top_k,
        };
        let vector_body = VectorSearch {
            namespace: module_id.as_str(),
            query: context,
            top_k: self.top_k,
        };

        let (graph, vector) = tokio::try_join!(
            self.post::<_, GraphResponse>("graph/query", &graph_body),
            self.post::<_, VectorResponse>("vector/search", &vector_body),
        )?;
        debug!(
            entities = graph.entities.len(),
            patterns = graph.patterns.len(),
            matches = vector.matches.len(),
            "live enrichment received"
        );

        Ok(EnrichmentResult {
            confidence: LIVE_CONFIDENCE,
            provenance: Provenance::Live,
            payload: merge(module_id, graph, vector, self.top_k),
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Hex SHA-256 of the context, usable by the backend as a cache key.
fn context_hash(context: &str) -> String {
    let digest = Sha256::digest(context.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Cut `context` at `MAX_CONTEXT_CHARS` on a char boundary.
fn truncate_context(context: &str) -> &str {
    match context.char_indices().nth(MAX_CONTEXT_CHARS) {
        Some((end, _)) => &context[..end],
        None => context,
    }
}

/// Sort each list by score, cap at `top_k`, and summarise.
fn merge(
    module_id: &ModuleId,
    graph: GraphResponse,
    vector: VectorResponse,
    top_k: usize,
) -> serde_json::Value {
    let mut entities = graph.entities;
    entities.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
    entities.truncate(top_k);

    let mut patterns = graph.patterns;
    patterns.sort_by(|a, b| b.strength.total_cmp(&a.strength));
    patterns.truncate(top_k);

    let mut precedents = vector.matches;
    precedents.sort_by(|a, b| b.score.total_cmp(&a.score));
    precedents.truncate(top_k);

    let mut summary = format!(
        "{} related entities, {} patterns and {} precedents for {module_id}.",
        entities.len(),
        patterns.len(),
        precedents.len()
    );
    if let Some(top) = entities.first() {
        summary.push_str(&format!(" Strongest signal: {}.", top.name));
    }

    json!({
        "source": "live",
        "entities": entities,
        "patterns": patterns,
        "precedents": precedents,
        "summary": summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, api_key: Option<&str>) -> LiveEnrichmentClient {
        let base = Url::parse(&format!("{}/", server.uri())).unwrap();
        LiveEnrichmentClient::new(
            base,
            api_key.map(str::to_string),
            2,
            Duration::from_millis(500),
        )
        .unwrap()
    }

    async fn mount_healthy(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/graph/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": [
                    {"name": "Globex", "kind": "competitor", "relevance": 0.4},
                    {"name": "EU AI Act", "kind": "regulation", "relevance": 0.9},
                    {"name": "ChipCo", "kind": "supplier", "relevance": 0.7}
                ],
                "patterns": [{"description": "price compression", "strength": 0.6}]
            })))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/vector/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "matches": [
                    {"id": "doc-1", "score": 0.2, "snippet": "older"},
                    {"id": "doc-2", "score": 0.8, "snippet": "recent"}
                ]
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn context_hash_is_stable_hex() {
        let hash = context_hash("abc");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let long = "é".repeat(MAX_CONTEXT_CHARS + 10);
        assert_eq!(truncate_context(&long).chars().count(), MAX_CONTEXT_CHARS);
        assert_eq!(truncate_context("short"), "short");
    }

    #[tokio::test]
    async fn merges_and_caps_results() {
        let server = MockServer::start().await;
        mount_healthy(&server).await;

        let result = client_for(&server, None)
            .enrich(&ModuleId::new("market_share"), "The pie chart divides the market")
            .await
            .unwrap();

        assert_eq!(result.provenance, Provenance::Live);
        assert_eq!(result.confidence, LIVE_CONFIDENCE);
        let entities = result.payload["entities"].as_array().unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0]["name"], "EU AI Act");
        assert_eq!(entities[1]["name"], "ChipCo");
        assert_eq!(result.payload["precedents"][0]["id"], "doc-2");
        assert!(
            result.payload["summary"]
                .as_str()
                .unwrap()
                .contains("Strongest signal: EU AI Act")
        );
    }

    #[tokio::test]
    async fn sends_hash_and_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graph/query"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(json!({
                "module_id": "risk_matrix",
                "context_hash": context_hash("ctx"),
                "limit": 2
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"entities": [], "patterns": []})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/vector/search"))
            .and(body_partial_json(json!({"namespace": "risk_matrix", "query": "ctx", "top_k": 2})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"matches": []})))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server, Some("secret"))
            .enrich(&ModuleId::new("risk_matrix"), "ctx")
            .await
            .unwrap();
        assert_eq!(result.payload["entities"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn http_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graph/query"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/vector/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"matches": []})))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .enrich(&ModuleId::new("risk_matrix"), "ctx")
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichmentError::Unavailable(ref m) if m.contains("503")));
    }

    #[tokio::test]
    async fn malformed_body_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graph/query"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/vector/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"matches": []})))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .enrich(&ModuleId::new("risk_matrix"), "ctx")
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichmentError::Unavailable(_)));
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let server = MockServer::start().await;
        mount_healthy(&server).await;
        Mock::given(method("POST"))
            .and(path("/graph/query"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .with_priority(1)
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .enrich(&ModuleId::new("risk_matrix"), "ctx")
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichmentError::Timeout { timeout_ms: 500 }));
    }

    #[test]
    fn fallback_mode_builds_no_client() {
        let settings = EnrichmentSettings {
            mode: reportforge_shared::EnrichmentMode::Fallback,
            endpoint: Some("http://localhost:8750".into()),
            api_key_env: "REPORTFORGE_TEST_UNSET_KEY".into(),
            call_timeout: Duration::from_millis(100),
            breaker_threshold: 2,
            top_k: 5,
        };
        assert!(LiveEnrichmentClient::from_settings(&settings).unwrap().is_none());

        let settings = EnrichmentSettings {
            mode: reportforge_shared::EnrichmentMode::Auto,
            ..settings
        };
        let client = LiveEnrichmentClient::from_settings(&settings).unwrap().unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8750/");
    }
}
