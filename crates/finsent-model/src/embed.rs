//! Remote embedding client (the primary provider).

use std::time::Duration;

use serde::Serialize;

use crate::error::ModelError;

/// Maximum number of texts per /embed call.
const BATCH_SIZE: usize = 64;

/// HTTP client for the gateway's `/embed` endpoint.
#[derive(Clone)]
pub struct EmbedClient {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
}

impl EmbedClient {
    /// Create a new `EmbedClient` against the gateway base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(gateway_url: &str, timeout_secs: u64) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/embed", gateway_url.trim_end_matches('/')),
        })
    }

    /// Generate embeddings for a batch of texts.
    ///
    /// Texts are batched into groups of [`BATCH_SIZE`] per request. Returns
    /// one embedding vector per input text, in the same order; a response
    /// whose length does not match its request is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Embed`] if any request fails, returns a non-2xx
    /// status, or the response cannot be parsed.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(BATCH_SIZE) {
            let request = EmbedRequest { inputs: chunk };
            let response = self
                .client
                .post(&self.url)
                .json(&request)
                .send()
                .await
                .map_err(|e| ModelError::Embed(format!("embed request failed: {e}")))?;

            if !response.status().is_success() {
                return Err(ModelError::Embed(format!(
                    "embed endpoint returned status {}",
                    response.status()
                )));
            }

            let embeddings: Vec<Vec<f32>> = response
                .json()
                .await
                .map_err(|e| ModelError::Embed(format!("embed response parse error: {e}")))?;

            if embeddings.len() != chunk.len() {
                return Err(ModelError::Embed(format!(
                    "embed returned {} vectors for {} inputs",
                    embeddings.len(),
                    chunk.len()
                )));
            }

            all_embeddings.extend(embeddings);
        }

        Ok(all_embeddings)
    }
}
