//! Embedding capability contract and providers.
//!
//! The core chunking and fusion logic never calls an embedder; this trait is
//! the seam between ingestion/search orchestration and whatever turns text
//! into vectors. Two providers ship with the crate: a deterministic mock for
//! tests and demos, and an OpenAI-compatible HTTP client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::RagError;

/// Something that turns batches of text into fixed-dimension vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a batch of inputs, one vector per input, in input order.
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, RagError>;

    /// Vector dimensionality this provider produces.
    fn dimensions(&self) -> usize;

    /// Short provider name for telemetry.
    fn name(&self) -> &str;

    /// Embeds a single input.
    async fn embed(&self, input: &str) -> Result<Vec<f32>, RagError> {
        let mut vectors = self.embed_batch(&[input.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::Embedding("provider returned no embedding".to_string()))
    }
}

/// Deterministic hash-derived embeddings for tests and offline demos.
///
/// Identical inputs always produce identical unit vectors and distinct inputs
/// almost always differ, which is enough to exercise storage and retrieval
/// without a model. Components are non-negative, so the cosine similarity of
/// any two inputs is positive and downstream score normalization never sees a
/// degenerate list.
#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self { dimensions: 32 }
    }

    #[must_use]
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    fn encode_one(&self, input: &str) -> Vec<f32> {
        let seed = fnv1a(input.as_bytes());
        let mut vector: Vec<f32> = (0..self.dimensions)
            .map(|dim| {
                let hash = fnv1a_u64(seed, dim as u64);
                (hash as f64 / u64::MAX as f64) as f32
            })
            .collect();
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        Ok(inputs.iter().map(|input| self.encode_one(input)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn fnv1a_u64(seed: u64, value: u64) -> u64 {
    let mut hash = seed;
    for byte in value.to_le_bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// OpenAI-compatible embeddings client (`POST <base>/v1/embeddings`).
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimensions: usize,
    api_key: Option<String>,
}

impl HttpEmbeddingProvider {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: embeddings_endpoint(&base_url.into()),
            model: model.into(),
            dimensions,
            api_key: None,
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = self.client.post(&self.endpoint).json(&EmbeddingRequest {
            model: &self.model,
            input: inputs,
        });
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| RagError::Embedding(err.to_string()))?;
        let payload: EmbeddingResponse = response
            .json()
            .await
            .map_err(|err| RagError::Embedding(err.to_string()))?;

        if payload.data.len() != inputs.len() {
            return Err(RagError::Embedding(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                payload.data.len()
            )));
        }
        Ok(payload.data.into_iter().map(|data| data.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.model
    }
}

fn embeddings_endpoint(base_url: &str) -> String {
    let normalized = base_url.trim_end_matches('/');
    if normalized.ends_with("/embeddings") {
        return normalized.to_string();
    }
    if normalized.ends_with("/v1") {
        return format!("{normalized}/embeddings");
    }
    format!("{normalized}/v1/embeddings")
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn mock_embeddings_are_deterministic_unit_vectors() {
        let provider = MockEmbeddingProvider::new();
        let inputs = vec![
            "hello world".to_string(),
            "goodbye world".to_string(),
            "hello world".to_string(),
        ];

        let first = provider.embed_batch(&inputs).await.unwrap();
        let second = provider.embed_batch(&inputs).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0], first[2]);
        assert_ne!(first[0], first[1]);

        for vector in &first {
            assert_eq!(vector.len(), provider.dimensions());
            let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-4, "norm was {norm}");
        }
    }

    #[tokio::test]
    async fn mock_dimensions_are_configurable() {
        let provider = MockEmbeddingProvider::new().with_dimensions(8);
        let vector = provider.embed("dim check").await.unwrap();
        assert_eq!(vector.len(), 8);
    }

    #[test]
    fn endpoint_normalization() {
        assert_eq!(
            embeddings_endpoint("http://localhost:8080"),
            "http://localhost:8080/v1/embeddings"
        );
        assert_eq!(
            embeddings_endpoint("http://localhost:8080/"),
            "http://localhost:8080/v1/embeddings"
        );
        assert_eq!(
            embeddings_endpoint("http://localhost:8080/v1"),
            "http://localhost:8080/v1/embeddings"
        );
        assert_eq!(
            embeddings_endpoint("http://localhost:8080/v1/embeddings"),
            "http://localhost:8080/v1/embeddings"
        );
    }

    #[tokio::test]
    async fn http_provider_round_trips_embeddings() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(200).json_body(json!({
                    "data": [
                        {"embedding": [0.25, 0.5]},
                        {"embedding": [0.75, 1.0]},
                    ]
                }));
            })
            .await;

        let provider = HttpEmbeddingProvider::new(server.base_url(), "test-model", 2);
        let inputs = vec!["first".to_string(), "second".to_string()];
        let vectors = provider.embed_batch(&inputs).await.unwrap();

        mock.assert_async().await;
        assert_eq!(vectors, vec![vec![0.25, 0.5], vec![0.75, 1.0]]);
    }

    #[tokio::test]
    async fn http_provider_rejects_short_responses() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(200)
                    .json_body(json!({"data": [{"embedding": [0.1]}]}));
            })
            .await;

        let provider = HttpEmbeddingProvider::new(server.base_url(), "test-model", 1);
        let inputs = vec!["one".to_string(), "two".to_string()];
        let err = provider.embed_batch(&inputs).await.unwrap_err();
        assert!(matches!(err, RagError::Embedding(_)));
    }

    #[tokio::test]
    async fn http_provider_surfaces_server_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(500);
            })
            .await;

        let provider = HttpEmbeddingProvider::new(server.base_url(), "test-model", 4);
        let err = provider.embed("boom").await.unwrap_err();
        assert!(matches!(err, RagError::Embedding(_)));
    }
}
