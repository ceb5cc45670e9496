//! Remote sentiment classification client.
//!
//! The classifier is a black box behind the gateway: one text in, one label
//! out. Throttling (HTTP 429) is retried with bounded exponential back-off;
//! every other fault propagates to the caller.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use finsent_core::Sentiment;

use crate::error::ModelError;
use crate::retry::retry_with_backoff;

/// HTTP client for the gateway's `/classify` endpoint.
#[derive(Clone)]
pub struct ClassifyClient {
    client: reqwest::Client,
    url: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    sentiment: String,
}

impl ClassifyClient {
    /// Create a new `ClassifyClient` against the gateway base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        gateway_url: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/classify", gateway_url.trim_end_matches('/')),
            max_retries,
            backoff_base_ms,
        })
    }

    /// Classify a single text, retrying on throttling.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Throttled`] once retries are exhausted,
    /// [`ModelError::Http`] on network or HTTP failure, and
    /// [`ModelError::Classify`] if the response label is unrecognized or the
    /// body cannot be parsed.
    pub async fn classify(&self, text: &str) -> Result<Sentiment, ModelError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.classify_once(text)
        })
        .await
    }

    async fn classify_once(&self, text: &str) -> Result<Sentiment, ModelError> {
        let response = self
            .client
            .post(&self.url)
            .json(&ClassifyRequest { text })
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ModelError::Throttled(
                "classify endpoint returned 429".to_string(),
            ));
        }

        let response = response.error_for_status()?;
        let body: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Classify(format!("classify response parse error: {e}")))?;

        Sentiment::from_label(&body.sentiment).ok_or_else(|| {
            ModelError::Classify(format!("unrecognized sentiment label: {:?}", body.sentiment))
        })
    }
}
