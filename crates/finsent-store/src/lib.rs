//! Persistent vector index and in-memory corpus for Finsent.
//!
//! [`VectorStore`] is the on-disk, deduplicating index of
//! `doc_id -> (document, embedding)` with cosine-similarity query.
//! [`CorpusStore`] is the accumulating in-memory table of all enriched
//! records, the source of truth for aggregate statistics. The ingestion
//! coordinator is the sole writer to both.

pub mod corpus;
pub mod error;
pub mod vector_store;

pub use corpus::CorpusStore;
pub use error::StoreError;
pub use vector_store::{ScoredDoc, VectorStore};
