//! On-disk vector store with cosine-similarity query.
//!
//! Documents live in a single SQLite file inside the caller-supplied data
//! directory, so the index survives process restarts. Inserts are
//! conditional on id absence at the SQL level (`ON CONFLICT DO NOTHING`):
//! the at-most-once guarantee per `doc_id` holds even if two writers race
//! past the existence pre-check. Embeddings are stored as little-endian
//! `f32` blobs.

use std::collections::HashSet;
use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use finsent_model::{EmbeddingProvider, ModelError};

use crate::error::StoreError;

const DB_FILE: &str = "vectors.sqlite";

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS documents (\
     doc_id TEXT PRIMARY KEY, \
     content TEXT NOT NULL, \
     embedding BLOB NOT NULL\
     )";

/// SQLite parameter budget per `IN (...)` query.
const ID_CHUNK: usize = 500;

/// Persistent deduplicating index of `doc_id -> (document, embedding)`.
pub struct VectorStore {
    pool: SqlitePool,
    provider: EmbeddingProvider,
}

/// One query hit, nearest-first. Carries `doc_id` so callers resolve the
/// full record by identifier rather than by content equality.
#[derive(Debug, Clone)]
pub struct ScoredDoc {
    pub doc_id: String,
    pub text: String,
    pub score: f32,
}

impl VectorStore {
    /// Open (or create) the store under `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created, or
    /// [`StoreError::Sqlx`] if the database cannot be opened or migrated.
    pub async fn open(dir: &Path, provider: EmbeddingProvider) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        let options = SqliteConnectOptions::new()
            .filename(dir.join(DB_FILE))
            .create_if_missing(true);
        // One connection: writes are serialized behind a single writer.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        sqlx::query(SCHEMA_SQL).execute(&pool).await?;
        Ok(Self { pool, provider })
    }

    /// Insert documents, skipping ids already present.
    ///
    /// `ids` and `texts` are positionally aligned; `embeddings`, when
    /// supplied, must align with them too. Missing embeddings are computed
    /// via the provider for the novel subset only. Documents with empty
    /// text are dropped up front (not embeddable or queryable). If embedding
    /// computation fails, the call fails with zero rows inserted.
    ///
    /// Returns the number of rows actually inserted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Alignment`] on length mismatches,
    /// [`StoreError::Model`] if embedding fails, or [`StoreError::Sqlx`] on
    /// database failure.
    pub async fn add(
        &self,
        ids: &[String],
        texts: &[String],
        embeddings: Option<Vec<Vec<f32>>>,
    ) -> Result<usize, StoreError> {
        if ids.len() != texts.len() {
            return Err(StoreError::Alignment {
                values: texts.len(),
                documents: ids.len(),
            });
        }
        if let Some(ref vectors) = embeddings {
            if vectors.len() != ids.len() {
                return Err(StoreError::Alignment {
                    values: vectors.len(),
                    documents: ids.len(),
                });
            }
        }

        // (input index, id, text) for every non-empty document.
        let mut candidates: Vec<(usize, &String, &String)> = ids
            .iter()
            .zip(texts)
            .enumerate()
            .filter(|(_, (_, text))| !text.trim().is_empty())
            .map(|(i, (id, text))| (i, id, text))
            .collect();
        if candidates.len() < ids.len() {
            tracing::debug!(
                skipped = ids.len() - candidates.len(),
                "dropping empty documents from add"
            );
        }

        // Existence pre-check keeps us from paying to embed known documents;
        // the conditional insert below is what enforces at-most-once.
        let existing = self.existing_ids(ids).await?;
        candidates.retain(|(_, id, _)| !existing.contains(id.as_str()));
        if candidates.is_empty() {
            return Ok(0);
        }

        let vectors: Vec<Vec<f32>> = match embeddings {
            Some(all) => candidates.iter().map(|(i, _, _)| all[*i].clone()).collect(),
            None => {
                let novel: Vec<String> =
                    candidates.iter().map(|(_, _, text)| (*text).clone()).collect();
                // All-or-nothing: an embedding failure here means nothing
                // from this call reaches the index.
                self.provider.embed(&novel).await?
            }
        };

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0usize;
        for ((_, id, text), vector) in candidates.iter().zip(&vectors) {
            let result = sqlx::query(
                "INSERT INTO documents (doc_id, content, embedding) VALUES (?, ?, ?) \
                 ON CONFLICT(doc_id) DO NOTHING",
            )
            .bind(id.as_str())
            .bind(text.as_str())
            .bind(embedding_to_blob(vector))
            .execute(&mut *tx)
            .await?;
            inserted += usize::try_from(result.rows_affected()).unwrap_or(0);
        }
        tx.commit().await?;

        tracing::debug!(inserted, batch = candidates.len(), "vector store add complete");
        Ok(inserted)
    }

    /// Return the `k` documents nearest to `text` by cosine similarity,
    /// nearest first. Ties break on `doc_id` so ordering is deterministic.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Model`] if the query embedding fails, or
    /// [`StoreError::Sqlx`] on database failure.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredDoc>, StoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query_texts = vec![text.to_string()];
        let query_vec = self
            .provider
            .embed(&query_texts)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                StoreError::Model(ModelError::Embed(
                    "provider returned no vector for query".to_string(),
                ))
            })?;

        let rows: Vec<(String, String, Vec<u8>)> =
            sqlx::query_as("SELECT doc_id, content, embedding FROM documents")
                .fetch_all(&self.pool)
                .await?;

        let mut scored: Vec<ScoredDoc> = rows
            .into_iter()
            .map(|(doc_id, text, blob)| {
                let stored = blob_to_embedding(&blob);
                let score = cosine_similarity(&query_vec, &stored);
                ScoredDoc {
                    doc_id,
                    text,
                    score,
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Which of `ids` are already stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] on database failure.
    pub async fn existing_ids(&self, ids: &[String]) -> Result<HashSet<String>, StoreError> {
        let mut found = HashSet::new();
        for chunk in ids.chunks(ID_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!("SELECT doc_id FROM documents WHERE doc_id IN ({placeholders})");
            let mut query = sqlx::query_scalar::<_, String>(&sql);
            for id in chunk {
                query = query.bind(id.as_str());
            }
            found.extend(query.fetch_all(&self.pool).await?);
        }
        Ok(found)
    }

    /// Number of stored documents.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] on database failure.
    pub async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn embedding_to_blob(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine similarity of two vectors.
///
/// Mismatched dimensionalities score 0.0 rather than faulting: a corpus
/// holding vectors from more than one provider is unreliable by design, not
/// an error condition.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
