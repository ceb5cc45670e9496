//! Ingestion coordinator.
//!
//! [`TweetAgent`] is the sole writer to the corpus and vector stores. Each
//! batch goes through one id-conditional insert applied to both stores
//! together: records already known to the corpus are dropped first, the
//! vector store inserts the rest (its own persistent dedup still applies),
//! and only then does the corpus append. A vector-store failure therefore
//! never leaves the two stores diverged.

use finsent_core::{Batch, TweetRecord};
use finsent_model::{ChatClient, ClassifyClient};
use finsent_store::{CorpusStore, VectorStore};

use crate::answer::{answer_question, InsightOutcome};
use crate::error::AgentError;
use crate::ids::derive_doc_id;
use crate::labeler::{label_batch, LabelMode};
use crate::pivot::{sentiment_pivot, sentiment_trend, PivotRow, TrendBucket};
use crate::sync::{sync_prefix, ObjectStore};

pub struct TweetAgent {
    corpus: CorpusStore,
    store: VectorStore,
    classifier: ClassifyClient,
    chat: ChatClient,
    watchlist: Vec<String>,
    top_k: usize,
}

impl TweetAgent {
    #[must_use]
    pub fn new(
        store: VectorStore,
        classifier: ClassifyClient,
        chat: ChatClient,
        watchlist: Vec<String>,
        top_k: usize,
    ) -> Self {
        Self {
            corpus: CorpusStore::new(),
            store,
            classifier,
            chat,
            watchlist,
            top_k,
        }
    }

    #[must_use]
    pub fn corpus(&self) -> &CorpusStore {
        &self.corpus
    }

    /// Number of documents in the persistent vector index.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Store`] on database failure.
    pub async fn vector_count(&self) -> Result<u64, AgentError> {
        Ok(self.store.count().await?)
    }

    /// Ingest one decoded batch.
    ///
    /// Labels the batch (skipping classification when the schema already
    /// carries all derived fields), assigns deterministic ids from
    /// `(origin, row index)` where the source supplied none, and applies the
    /// conditional insert to both stores. Returns how many records were new.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Store`] if the vector store rejects the batch
    /// (including the all-or-nothing embedding failure).
    pub async fn ingest_batch(
        &mut self,
        mut batch: Batch,
        origin: &str,
    ) -> Result<usize, AgentError> {
        assign_doc_ids(&mut batch, origin);
        self.ingest_assigned(batch).await
    }

    /// Ingest a batch whose rows all carry a `doc_id` already.
    pub(crate) async fn ingest_assigned(&mut self, batch: Batch) -> Result<usize, AgentError> {
        let rows = batch.records.len();
        let labeled = label_batch(
            &self.classifier,
            batch,
            &self.watchlist,
            LabelMode::SkipIfPresent,
        )
        .await;
        let added = self.insert_fresh(labeled).await?;
        tracing::info!(rows, added, "batch ingested");
        Ok(added)
    }

    async fn insert_fresh(&mut self, records: Vec<TweetRecord>) -> Result<usize, AgentError> {
        let fresh: Vec<TweetRecord> = records
            .into_iter()
            .filter(|r| !self.corpus.contains(&r.doc_id))
            .collect();
        if fresh.is_empty() {
            return Ok(0);
        }

        let ids: Vec<String> = fresh.iter().map(|r| r.doc_id.clone()).collect();
        let texts: Vec<String> = fresh.iter().map(|r| r.clean.clone()).collect();
        let embeddings = supplied_embeddings(&fresh);

        // Vector store first: if it fails, nothing reaches the corpus either.
        let inserted = self.store.add(&ids, &texts, embeddings).await?;
        tracing::debug!(
            batch = fresh.len(),
            vector_inserts = inserted,
            "vector store insert complete"
        );

        Ok(self.corpus.append_new(fresh))
    }

    /// Pull unseen batch files from the object store under `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ObjectStore`] if the listing itself fails;
    /// individual file failures are logged and skipped.
    pub async fn sync<S: ObjectStore>(
        &mut self,
        object_store: &S,
        prefix: &str,
    ) -> Result<usize, AgentError> {
        sync_prefix(self, object_store, prefix).await
    }

    /// Per-ticker sentiment pivot over the current corpus.
    #[must_use]
    pub fn pivot(&self, min_mentions: u64) -> Vec<PivotRow> {
        sentiment_pivot(self.corpus.records(), min_mentions)
    }

    /// Hourly sentiment trend over the current corpus.
    #[must_use]
    pub fn trend(&self) -> Vec<TrendBucket> {
        sentiment_trend(self.corpus.records())
    }

    /// Answer a question over the stored corpus (retrieval-augmented).
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Store`] if retrieval fails and
    /// [`AgentError::Model`] if the chat collaborator fails; the chat error
    /// is deliberately not retried or softened.
    pub async fn answer(&self, question: &str) -> Result<InsightOutcome, AgentError> {
        answer_question(&self.corpus, &self.store, &self.chat, question, self.top_k).await
    }
}

/// Assign deterministic ids to rows the source left unidentified.
pub(crate) fn assign_doc_ids(batch: &mut Batch, origin: &str) {
    for (index, record) in batch.records.iter_mut().enumerate() {
        let missing = record.doc_id.as_deref().is_none_or(str::is_empty);
        if missing {
            record.doc_id = Some(derive_doc_id(origin, index));
        }
    }
    batch.schema.has_doc_id = true;
}

/// Batch-supplied embeddings, but only when every row carries one; a batch
/// with partial vectors is recomputed wholesale by the provider.
fn supplied_embeddings(records: &[TweetRecord]) -> Option<Vec<Vec<f32>>> {
    records
        .iter()
        .map(|r| r.embedding.clone())
        .collect::<Option<Vec<_>>>()
}
