//! Retrieval-augmented answering over the stored corpus.

use finsent_model::ChatClient;
use finsent_store::{CorpusStore, VectorStore};

use finsent_core::{Sentiment, TweetRecord};

use crate::error::AgentError;

/// Per-document character budget in the chat context, keeping the composed
/// prompt inside the collaborator's size limits.
const CONTEXT_DOC_MAX_CHARS: usize = 400;

/// Outcome of a retrieval-augmented question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightOutcome {
    /// Nothing has been ingested yet; there is no corpus to ground an
    /// answer in.
    NoData,
    /// A grounded answer with the sentiment summary appended.
    Answered(String),
}

/// Aggregate sentiment over a retrieved subset of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentimentSummary {
    pub matched: usize,
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
}

impl SentimentSummary {
    #[must_use]
    pub fn over(records: &[&TweetRecord]) -> Self {
        let mut summary = Self {
            matched: records.len(),
            positive: 0,
            neutral: 0,
            negative: 0,
        };
        for record in records {
            match record.sentiment {
                Some(Sentiment::Positive) => summary.positive += 1,
                Some(Sentiment::Neutral) => summary.neutral += 1,
                Some(Sentiment::Negative) => summary.negative += 1,
                None => {}
            }
        }
        summary
    }

    /// Denominator for ratios, floored at 1 to avoid division faults.
    fn denom(self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let total = (self.positive + self.neutral + self.negative).max(1) as f64;
        total
    }

    #[must_use]
    pub fn pos_ratio(self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let positive = self.positive as f64;
        positive / self.denom()
    }

    #[must_use]
    pub fn neu_ratio(self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let neutral = self.neutral as f64;
        neutral / self.denom()
    }

    #[must_use]
    pub fn neg_ratio(self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let negative = self.negative as f64;
        negative / self.denom()
    }
}

impl std::fmt::Display for SentimentSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Sentiment across {} matched tweets: {:.1}% positive, {:.1}% neutral, {:.1}% negative.",
            self.matched,
            self.pos_ratio() * 100.0,
            self.neu_ratio() * 100.0,
            self.neg_ratio() * 100.0,
        )
    }
}

/// Answer `question` from the top-`k` semantically matching documents.
///
/// Retrieval hits carry `doc_id`; the full records are resolved from the
/// corpus by identifier. The chat collaborator is instructed to answer only
/// from the supplied context and to cite ids; its failure propagates to the
/// caller uncaught. The computed sentiment summary is appended to the reply.
pub(crate) async fn answer_question(
    corpus: &CorpusStore,
    store: &VectorStore,
    chat: &ChatClient,
    question: &str,
    k: usize,
) -> Result<InsightOutcome, AgentError> {
    if corpus.is_empty() {
        return Ok(InsightOutcome::NoData);
    }

    let hits = store.query(question, k).await?;
    if hits.is_empty() {
        return Ok(InsightOutcome::NoData);
    }

    let ids: Vec<String> = hits.into_iter().map(|h| h.doc_id).collect();
    let matched = corpus.get_many(&ids);
    if matched.is_empty() {
        return Ok(InsightOutcome::NoData);
    }

    let summary = SentimentSummary::over(&matched);
    let context = build_context(&matched);
    let prompt = format!(
        "Answer the question using only the context below. Each line is one \
         tweet prefixed with its document id in square brackets; cite ids \
         when possible. If the context does not contain the answer, say so.\n\n\
         Context:\n{context}\n\nQuestion: {question}"
    );

    tracing::debug!(matched = matched.len(), "invoking chat collaborator");
    let reply = chat.chat(&prompt).await?;

    Ok(InsightOutcome::Answered(format!("{reply}\n\n{summary}")))
}

fn build_context(records: &[&TweetRecord]) -> String {
    records
        .iter()
        .map(|record| {
            let snippet: String = record.clean.chars().take(CONTEXT_DOC_MAX_CHARS).collect();
            format!("[{}] {}", record.doc_id, snippet)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
