//! Embedding provider: remote primary with local fallback.

use std::sync::Arc;

use crate::embed::EmbedClient;
use crate::error::ModelError;
use crate::fallback::FallbackModel;

/// Embeds text via the remote gateway, degrading to the local model on any
/// primary failure.
///
/// Input and output are positionally aligned and equal length regardless of
/// which provider answered. The two providers do NOT share a vector space;
/// mixing them within one corpus makes similarity comparisons unreliable
/// (documented risk, not enforced).
#[derive(Clone)]
pub struct EmbeddingProvider {
    remote: EmbedClient,
    fallback: Arc<dyn FallbackModel>,
}

impl EmbeddingProvider {
    #[must_use]
    pub fn new(remote: EmbedClient, fallback: Arc<dyn FallbackModel>) -> Self {
        Self { remote, fallback }
    }

    /// Embed a batch of texts.
    ///
    /// Tries the remote provider first; on any failure (network, quota,
    /// malformed response) substitutes the local fallback without surfacing
    /// the primary error to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Fallback`] only when the local model also fails
    /// or returns a misaligned result.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        match self.remote.embed(texts).await {
            Ok(vectors) => Ok(vectors),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    model = self.fallback.name(),
                    "remote embedding failed, substituting local fallback"
                );
                let fallback = Arc::clone(&self.fallback);
                let owned: Vec<String> = texts.to_vec();
                let vectors = tokio::task::spawn_blocking(move || fallback.encode(&owned))
                    .await
                    .map_err(|e| {
                        ModelError::Fallback(format!("local embedding task failed: {e}"))
                    })??;

                if vectors.len() != texts.len() {
                    return Err(ModelError::Fallback(format!(
                        "fallback returned {} vectors for {} inputs",
                        vectors.len(),
                        texts.len()
                    )));
                }
                Ok(vectors)
            }
        }
    }
}
