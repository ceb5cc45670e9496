//! Record model: raw batch rows and enriched corpus rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentiment class assigned by the classifier.
///
/// A record whose classification was skipped (off-topic content) or failed
/// carries no sentiment at all; that state is `Option::None` on the record,
/// not a fourth variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Parse a classifier label leniently.
    ///
    /// The collaborator may echo prose around the label ("Positive." or
    /// "negative sentiment"); only the first whitespace-delimited token is
    /// considered, punctuation-trimmed and case-insensitive. Returns `None`
    /// for anything that is not one of the three classes.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let first = label.split_whitespace().next()?;
        let token = first
            .trim_matches(|c: char| !c.is_alphabetic())
            .to_lowercase();
        match token.as_str() {
            "positive" => Some(Self::Positive),
            "neutral" => Some(Self::Neutral),
            "negative" => Some(Self::Negative),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row as it arrives in a batch file.
///
/// Only `text` and `created_at` are required; every other column is optional
/// and filled by the labeler or the ingestion coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub doc_id: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub clean: Option<String>,
    #[serde(default)]
    pub sentiment: Option<Sentiment>,
    #[serde(default)]
    pub tickers: Option<Vec<String>>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

/// One fully enriched record as held in the corpus store.
///
/// An empty `doc_id` means "not yet assigned"; the ingestion coordinator
/// derives one before any store sees the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetRecord {
    pub doc_id: String,
    pub text: String,
    pub clean: String,
    pub sentiment: Option<Sentiment>,
    pub tickers: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// Source-supplied embedding, if the batch carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}
