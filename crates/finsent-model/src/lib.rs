//! Model gateway clients for Finsent.
//!
//! Three HTTP boundaries against one configured gateway: `/embed` (batched
//! text embeddings), `/classify` (single-text sentiment with bounded-backoff
//! retry on throttling), and `/chat` (single-attempt generation). The
//! [`EmbeddingProvider`] composes the remote embed client with a local
//! fallback model so embedding faults degrade instead of failing.

pub mod chat;
pub mod classify;
pub mod embed;
pub mod error;
pub mod fallback;
pub mod provider;

mod retry;

pub use chat::ChatClient;
pub use classify::ClassifyClient;
pub use embed::EmbedClient;
pub use error::ModelError;
pub use fallback::{FallbackModel, MiniLmFallback};
pub use provider::EmbeddingProvider;
