//! Batch file decoding against the fixed schema contract.
//!
//! Batch files are newline-delimited JSON rows. Decoding reports which
//! optional columns were present in the file as a whole ([`BatchSchema`]),
//! so downstream stages can decide whether labeling is needed without
//! probing individual rows. Rows that do not match the contract reject the
//! file at this boundary.

use serde_json::Value;
use thiserror::Error;

use crate::records::RawRecord;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("batch file is not valid UTF-8")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("batch row {line}: {source}")]
    Row {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Which optional columns the batch file carried.
///
/// A column counts as present only when every row in the file has the key
/// (a null value still counts as present, matching columnar semantics).
/// An empty file has no columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSchema {
    pub has_doc_id: bool,
    pub has_clean: bool,
    pub has_sentiment: bool,
    pub has_tickers: bool,
    pub has_embedding: bool,
}

impl BatchSchema {
    /// True when the batch already carries every field the labeler would
    /// otherwise compute.
    #[must_use]
    pub fn fully_labeled(&self) -> bool {
        self.has_clean && self.has_sentiment && self.has_tickers
    }
}

/// A decoded batch: the rows plus the observed column schema.
#[derive(Debug, Clone)]
pub struct Batch {
    pub records: Vec<RawRecord>,
    pub schema: BatchSchema,
}

/// Decode a newline-delimited JSON batch file.
///
/// Blank lines are ignored. The schema flags are the intersection across
/// all rows: a column missing from any row is reported absent for the whole
/// batch.
///
/// # Errors
///
/// Returns [`BatchError::Encoding`] for non-UTF-8 input and
/// [`BatchError::Row`] (with a 1-based line number) for the first row that
/// fails to parse or deserialize.
pub fn decode_batch(bytes: &[u8]) -> Result<Batch, BatchError> {
    let text = std::str::from_utf8(bytes)?;

    let mut records = Vec::new();
    let mut schema = BatchSchema::default();

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row = idx + 1;
        let value: Value =
            serde_json::from_str(line).map_err(|source| BatchError::Row { line: row, source })?;

        let observed = observe_columns(&value);
        if records.is_empty() {
            schema = observed;
        } else {
            schema = intersect(schema, observed);
        }

        let record: RawRecord = serde_json::from_value(value)
            .map_err(|source| BatchError::Row { line: row, source })?;
        records.push(record);
    }

    Ok(Batch { records, schema })
}

fn observe_columns(value: &Value) -> BatchSchema {
    let Some(obj) = value.as_object() else {
        return BatchSchema::default();
    };
    BatchSchema {
        has_doc_id: obj.contains_key("doc_id"),
        has_clean: obj.contains_key("clean"),
        has_sentiment: obj.contains_key("sentiment"),
        has_tickers: obj.contains_key("tickers"),
        has_embedding: obj.contains_key("embedding"),
    }
}

fn intersect(a: BatchSchema, b: BatchSchema) -> BatchSchema {
    BatchSchema {
        has_doc_id: a.has_doc_id && b.has_doc_id,
        has_clean: a.has_clean && b.has_clean,
        has_sentiment: a.has_sentiment && b.has_sentiment,
        has_tickers: a.has_tickers && b.has_tickers,
        has_embedding: a.has_embedding && b.has_embedding,
    }
}
