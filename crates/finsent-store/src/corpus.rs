//! In-memory corpus of all enriched records.

use std::collections::HashMap;

use finsent_core::TweetRecord;

/// Accumulating table of every ingested record, keyed by `doc_id`.
///
/// The corpus is session-scoped: it lives for the process and is rebuilt by
/// re-ingesting or re-syncing after a restart (the vector store's persistent
/// dedup prevents duplicate vectors during the rebuild). Records are
/// append-only; corrections arrive as new batches, never as in-place updates.
#[derive(Debug, Default)]
pub struct CorpusStore {
    records: Vec<TweetRecord>,
    index: HashMap<String, usize>,
}

impl CorpusStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, doc_id: &str) -> bool {
        self.index.contains_key(doc_id)
    }

    /// Append records whose `doc_id` is not yet present; returns how many
    /// were added. Duplicates within the input are also collapsed.
    pub fn append_new(&mut self, records: Vec<TweetRecord>) -> usize {
        let mut added = 0;
        for record in records {
            if self.index.contains_key(&record.doc_id) {
                continue;
            }
            self.index.insert(record.doc_id.clone(), self.records.len());
            self.records.push(record);
            added += 1;
        }
        added
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[TweetRecord] {
        &self.records
    }

    /// Look up records by id, preserving the order of `ids` (retrieval rank).
    /// Unknown ids are silently dropped.
    #[must_use]
    pub fn get_many(&self, ids: &[String]) -> Vec<&TweetRecord> {
        ids.iter()
            .filter_map(|id| self.index.get(id).map(|&i| &self.records[i]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn record(doc_id: &str) -> TweetRecord {
        TweetRecord {
            doc_id: doc_id.to_string(),
            text: format!("text for {doc_id}"),
            clean: format!("clean for {doc_id}"),
            sentiment: None,
            tickers: vec!["BBVA".to_string()],
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap(),
            embedding: None,
        }
    }

    #[test]
    fn append_new_skips_existing_ids() {
        let mut corpus = CorpusStore::new();
        assert_eq!(corpus.append_new(vec![record("a"), record("b")]), 2);
        assert_eq!(corpus.append_new(vec![record("b"), record("c")]), 1);
        assert_eq!(corpus.len(), 3);
        assert!(corpus.contains("a"));
        assert!(corpus.contains("c"));
    }

    #[test]
    fn append_new_collapses_duplicates_within_one_batch() {
        let mut corpus = CorpusStore::new();
        assert_eq!(corpus.append_new(vec![record("a"), record("a")]), 1);
        assert_eq!(corpus.len(), 1);
    }

    #[test]
    fn get_many_preserves_requested_order() {
        let mut corpus = CorpusStore::new();
        corpus.append_new(vec![record("a"), record("b"), record("c")]);
        let found = corpus.get_many(&[
            "c".to_string(),
            "missing".to_string(),
            "a".to_string(),
        ]);
        let ids: Vec<&str> = found.iter().map(|r| r.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }
}
