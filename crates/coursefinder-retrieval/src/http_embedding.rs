use crate::embedding::EmbeddingProvider;
use async_trait::async_trait;
use coursefinder_core::{CourseFinderError, CourseFinderResult};
use serde::Deserialize;
use tracing::debug;

/// Embedding provider backed by an OpenAI-compatible `/v1/embeddings` API.
///
/// Works with OpenAI, Ollama, text-embeddings-inference and any other server
/// that accepts `{"model", "input": [..]}` and answers with `data[].embedding`.
pub struct HttpEmbedding {
    base_url: String,
    model: String,
    api_key: Option<String>,
    dimension: usize,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

impl HttpEmbedding {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        dimension: usize,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            dimension,
            http: reqwest::Client::new(),
        }
    }

    async fn request(&self, texts: &[&str]) -> CourseFinderResult<Vec<Vec<f32>>> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let mut request = self.http.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| CourseFinderError::Embedding(format!("Embedding request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(CourseFinderError::Embedding(format!(
                "Embedding API error {status}: {detail}"
            )));
        }

        let parsed: EmbeddingsResponse = resp
            .json()
            .await
            .map_err(|e| CourseFinderError::Embedding(format!("Invalid embedding response: {e}")))?;

        order_by_index(parsed.data, texts.len())
    }
}

/// Put the returned vectors back in input order and check the count.
///
/// Either every item carries an `index` and the indices are exactly
/// `0..expected`, or none does and the response order is kept.
fn order_by_index(
    data: Vec<EmbeddingDatum>,
    expected: usize,
) -> CourseFinderResult<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(CourseFinderError::Embedding(format!(
            "Embedding API returned {} vectors for {expected} inputs",
            data.len()
        )));
    }
    if data.iter().all(|d| d.index.is_none()) {
        return Ok(data.into_iter().map(|d| d.embedding).collect());
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for datum in data {
        let index = datum.index.ok_or_else(|| {
            CourseFinderError::Embedding(
                "Embedding API response mixes indexed and unindexed items".to_string(),
            )
        })?;
        let slot = slots.get_mut(index).ok_or_else(|| {
            CourseFinderError::Embedding(format!(
                "Embedding API returned index {index} for {expected} inputs"
            ))
        })?;
        if slot.is_some() {
            return Err(CourseFinderError::Embedding(format!(
                "Embedding API returned index {index} twice"
            )));
        }
        *slot = Some(datum.embedding);
    }
    // every slot is filled: `expected` distinct in-range indices were seen
    Ok(slots.into_iter().flatten().collect())
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedding {
    async fn embed(&self, text: &str) -> CourseFinderResult<Vec<f32>> {
        if text.is_empty() {
            return Err(CourseFinderError::Embedding(
                "Cannot embed empty text".to_string(),
            ));
        }
        let mut vectors = self.request(&[text]).await?;
        vectors
            .pop()
            .ok_or_else(|| CourseFinderError::Embedding("Empty embedding response".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> CourseFinderResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(count = texts.len(), model = %self.model, "Embedding batch");
        self.request(texts).await
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
