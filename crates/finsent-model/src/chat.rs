//! Remote chat client, single round-trip.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

const MAX_TOKENS: u32 = 400;
const TEMPERATURE: f32 = 0.3;

/// HTTP client for the gateway's `/chat` endpoint.
///
/// The collaborator keeps no conversation state; each call is one prompt in,
/// one completion out. There is no retry at this boundary: failures surface
/// directly to the caller.
#[derive(Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    text: String,
}

impl ChatClient {
    /// Create a new `ChatClient` against the gateway base URL.
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
            url: format!("{}/chat", gateway_url.trim_end_matches('/')),
        })
    }

    /// Send one prompt and return the completion text.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Http`] on network failure or non-2xx status, or
    /// [`ModelError::Chat`] if the response body cannot be parsed.
    pub async fn chat(&self, prompt: &str) -> Result<String, ModelError> {
        let request = ChatRequest {
            prompt,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };
        let response = self.client.post(&self.url).json(&request).send().await?;
        let response = response.error_for_status()?;
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Chat(format!("chat response parse error: {e}")))?;
        Ok(body.text)
    }
}
