//! Incremental sync from object storage.
//!
//! Batch files land under the partition layout
//! `tweets/year=YYYY/month=MM/day=DD/hour=HH/<name>.jsonl`. The storage
//! mechanics live behind [`ObjectStore`]; the shipped [`DirObjectStore`]
//! reads a local mirror directory of the bucket. Sync tolerates an empty
//! prefix and skips unreadable or undecodable files rather than aborting.

use std::io;
use std::path::{Path, PathBuf};

use finsent_core::decode_batch;

use crate::agent::{assign_doc_ids, TweetAgent};
use crate::error::AgentError;

/// Suffix of decodable batch files under the partition prefix.
const BATCH_EXTENSION: &str = ".jsonl";

/// Listing and retrieval boundary for the batch bucket.
#[allow(async_fn_in_trait)] // driven from generic, single-task callers
pub trait ObjectStore {
    /// List object keys under `prefix`, in stable (sorted) order.
    async fn list(&self, prefix: &str) -> io::Result<Vec<String>>;

    /// Fetch the raw bytes of one object.
    async fn get(&self, key: &str) -> io::Result<Vec<u8>>;
}

/// Object store over a local directory mirroring the bucket.
pub struct DirObjectStore {
    root: PathBuf,
}

impl DirObjectStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ObjectStore for DirObjectStore {
    async fn list(&self, prefix: &str) -> io::Result<Vec<String>> {
        let mut keys = Vec::new();
        walk(&self.root, &self.root, &mut keys)?;
        keys.retain(|key| key.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }

    async fn get(&self, key: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.root.join(key)).await
    }
}

fn walk(root: &Path, dir: &Path, keys: &mut Vec<String>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk(root, &path, keys)?;
        } else if let Ok(rel) = path.strip_prefix(root) {
            keys.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}

/// The final path component of a key, shared with local ingestion so the
/// same file yields the same derived ids from either path.
fn batch_origin(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Pull every unseen batch file under `prefix` into the agent.
///
/// Zero matching files is a normal outcome (`Ok(0)`). A file that cannot be
/// read, decoded or ingested is logged and skipped; the rest of the sync
/// continues. Returns the number of records newly added to the corpus.
///
/// # Errors
///
/// Returns [`AgentError::ObjectStore`] only if the listing itself fails.
pub(crate) async fn sync_prefix<S: ObjectStore>(
    agent: &mut TweetAgent,
    object_store: &S,
    prefix: &str,
) -> Result<usize, AgentError> {
    let keys = object_store.list(prefix).await?;
    let batch_keys: Vec<String> = keys
        .into_iter()
        .filter(|key| key.ends_with(BATCH_EXTENSION))
        .collect();

    if batch_keys.is_empty() {
        tracing::info!(prefix, "no batch files found under prefix");
        return Ok(0);
    }

    let mut added_total = 0usize;
    for key in &batch_keys {
        let bytes = match object_store.get(key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to read batch file, skipping");
                continue;
            }
        };

        let mut batch = match decode_batch(&bytes) {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to decode batch file, skipping");
                continue;
            }
        };

        assign_doc_ids(&mut batch, batch_origin(key));
        // Filter before labeling: records the corpus already holds must not
        // be re-labeled or re-embedded.
        batch.records.retain(|record| {
            record
                .doc_id
                .as_deref()
                .is_some_and(|id| !agent.corpus().contains(id))
        });
        if batch.records.is_empty() {
            tracing::debug!(key = %key, "all records already ingested");
            continue;
        }

        match agent.ingest_assigned(batch).await {
            Ok(added) => added_total += added,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "batch ingest failed during sync, skipping file");
            }
        }
    }

    tracing::info!(
        files = batch_keys.len(),
        added = added_total,
        "sync complete"
    );
    Ok(added_total)
}
