//! Local fallback embedding model.
//!
//! Loading an on-device model is expensive; [`MiniLmFallback`] defers it
//! until the first remote-embedding failure and keeps the loaded model for
//! the rest of the process. The resource is constructed explicitly and
//! shared via `Arc`, never held as ambient global state.
//!
//! Fallback vectors do not live in the same space as the remote provider's:
//! once a corpus holds vectors from one provider, similarity against the
//! other is unreliable. Provider choice is sticky per corpus.

use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::error::ModelError;

/// A local model that can embed texts without the gateway.
///
/// `encode` is blocking; async callers bridge it with `spawn_blocking`.
pub trait FallbackModel: Send + Sync {
    /// Human-readable model name, for logging.
    fn name(&self) -> &str;

    /// Embed `texts`, one vector per input, positionally aligned.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Fallback`] if the model cannot be loaded or
    /// inference fails.
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError>;
}

/// fastembed all-MiniLM-L6-v2, loaded lazily on first use.
pub struct MiniLmFallback {
    model: Mutex<Option<TextEmbedding>>,
}

impl MiniLmFallback {
    #[must_use]
    pub fn new() -> Self {
        Self {
            model: Mutex::new(None),
        }
    }
}

impl Default for MiniLmFallback {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackModel for MiniLmFallback {
    fn name(&self) -> &str {
        "all-MiniLM-L6-v2"
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        let mut guard = self
            .model
            .lock()
            .map_err(|_| ModelError::Fallback("fallback model lock poisoned".to_string()))?;

        if guard.is_none() {
            tracing::info!(model = self.name(), "loading local embedding model");
            let model = TextEmbedding::try_new(
                InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false),
            )
            .map_err(|e| ModelError::Fallback(format!("failed to load local model: {e}")))?;
            *guard = Some(model);
        }

        let model = guard.as_mut().expect("model initialized above");
        model
            .embed(texts.to_vec(), None)
            .map_err(|e| ModelError::Fallback(format!("local embedding failed: {e}")))
    }
}
