//! Ingestion, aggregation and retrieval-augmented answering for Finsent.
//!
//! [`TweetAgent`] coordinates the corpus and vector stores: it is the sole
//! writer to both, applying one id-conditional insert across them per batch.
//! Around it sit the record labeler, the remote-sync path over an
//! [`ObjectStore`] boundary, the per-ticker sentiment pivot, and the
//! retrieval-augmented answerer.

pub mod agent;
pub mod answer;
pub mod error;
pub mod labeler;
pub mod pivot;
pub mod sync;

mod ids;

pub use agent::TweetAgent;
pub use answer::{InsightOutcome, SentimentSummary};
pub use error::AgentError;
pub use labeler::{clean_text, extract_tickers, label_batch, LabelMode};
pub use ids::derive_doc_id;
pub use pivot::{sentiment_pivot, sentiment_trend, PivotRow, TrendBucket};
pub use sync::{DirObjectStore, ObjectStore};
