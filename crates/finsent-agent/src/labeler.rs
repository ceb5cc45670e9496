//! Record labeler: derived fields for raw batch rows.
//!
//! Fills `clean`, `tickers` and `sentiment` where a batch did not carry
//! them. Classification goes through the remote boundary one record at a
//! time; an individual failure marks that record's sentiment absent and the
//! record is retained, never dropped, so aggregate counts stay complete
//! while sentiment ratios exclude it.

use regex::Regex;

use finsent_core::{Batch, RawRecord, TweetRecord};
use finsent_model::ClassifyClient;

/// Off-topic chatter that must never reach the classifier. Football noise
/// dominates Spanish-language mentions of sponsor banks.
const OFF_TOPIC_TERMS: &[&str] = &[
    "liga",
    "fútbol",
    "futbol",
    "jornada",
    "torneo",
    "balón",
    "balon",
    "penal",
    "gol",
    "partido",
    "club",
    "afición",
    "equipo",
    "árbitro",
    "jugador",
    "estadio",
    "apertura",
    "clausura",
    "futbolista",
    "selección",
];

/// Phrases that flag a complaint about the banking app itself.
const APP_ISSUE_TERMS: &[&str] = &[
    "app",
    "aplicación",
    "no abre",
    "no me deja",
    "error",
    "fallando",
    "se cerró",
    "no puedo entrar",
    "pantalla blanca",
    "no inicia",
    "bug",
    "crashea",
    "no funciona",
    "se traba",
    "no responde",
    "login",
    "transferencia",
    "cierre inesperado",
];

/// Marker tag attached to app-complaint records so they can be aggregated
/// separately from ticker mentions.
pub const APP_TAG: &str = "app";

/// How existing labels in a batch are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMode {
    /// Pass a fully-labeled batch through untouched; fill only what is
    /// missing otherwise. All batch ingestion paths use this.
    SkipIfPresent,
    /// Recompute every derived field from `text`, discarding whatever the
    /// source supplied. A deliberate caller choice for sources whose labels
    /// are not trusted.
    Force,
}

/// Normalize text for embedding and matching.
///
/// Strips URLs and @mentions, collapses whitespace and lowercases. The
/// result is deterministic and may be empty for records that were nothing
/// but links and mentions; such records are kept in the corpus but never
/// indexed.
#[must_use]
pub fn clean_text(text: &str) -> String {
    let url_re = Regex::new(r"https?://\S+").expect("valid url regex");
    let mention_re = Regex::new(r"@\w+").expect("valid mention regex");
    let stripped = url_re.replace_all(text, " ");
    let stripped = mention_re.replace_all(&stripped, " ");
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Extract entity tags from raw text: `$CASHTAG`s, watchlist names, and the
/// app-complaint marker. Order is first-seen; duplicates collapse.
#[must_use]
pub fn extract_tickers(text: &str, watchlist: &[String]) -> Vec<String> {
    let cashtag_re = Regex::new(r"\$([A-Za-z]{1,6})\b").expect("valid cashtag regex");

    let mut tags: Vec<String> = Vec::new();
    for capture in cashtag_re.captures_iter(text) {
        let tag = capture[1].to_uppercase();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    let lower = text.to_lowercase();
    for name in watchlist {
        let tag = name.to_uppercase();
        if !tags.contains(&tag) && lower.contains(&name.to_lowercase()) {
            tags.push(tag);
        }
    }

    if is_app_related(text) {
        let tag = APP_TAG.to_string();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    tags
}

pub(crate) fn is_off_topic(text: &str) -> bool {
    let lower = text.to_lowercase();
    OFF_TOPIC_TERMS.iter().any(|term| lower.contains(term))
}

fn is_app_related(text: &str) -> bool {
    let lower = text.to_lowercase();
    APP_ISSUE_TERMS.iter().any(|term| lower.contains(term))
}

/// Label a decoded batch.
///
/// With [`LabelMode::SkipIfPresent`] and a schema that already carries
/// `clean`, `sentiment` and `tickers`, the batch passes through unmodified
/// and the classifier receives zero calls. Otherwise each record is filled
/// individually; classification failures downgrade that one record to
/// absent sentiment without aborting the batch.
pub async fn label_batch(
    classifier: &ClassifyClient,
    batch: Batch,
    watchlist: &[String],
    mode: LabelMode,
) -> Vec<TweetRecord> {
    let Batch { records, schema } = batch;

    if mode == LabelMode::SkipIfPresent && schema.fully_labeled() {
        tracing::debug!(
            rows = records.len(),
            "batch already labeled, skipping classification"
        );
        return records.into_iter().map(passthrough).collect();
    }

    let force = mode == LabelMode::Force;
    let mut labeled = Vec::with_capacity(records.len());
    for record in records {
        labeled.push(label_record(classifier, record, watchlist, force).await);
    }
    labeled
}

fn passthrough(record: RawRecord) -> TweetRecord {
    TweetRecord {
        doc_id: record.doc_id.unwrap_or_default(),
        clean: record.clean.unwrap_or_default(),
        sentiment: record.sentiment,
        tickers: record.tickers.unwrap_or_default(),
        text: record.text,
        created_at: record.created_at,
        embedding: record.embedding,
    }
}

async fn label_record(
    classifier: &ClassifyClient,
    record: RawRecord,
    watchlist: &[String],
    force: bool,
) -> TweetRecord {
    let clean = match record.clean {
        Some(existing) if !force && !existing.trim().is_empty() => existing,
        _ => clean_text(&record.text),
    };

    let tickers = match record.tickers {
        Some(existing) if !force && !existing.is_empty() => existing,
        _ => extract_tickers(&record.text, watchlist),
    };

    let sentiment = if let Some(existing) = record.sentiment.filter(|_| !force) {
        Some(existing)
    } else if is_off_topic(&record.text) {
        tracing::debug!("off-topic record, skipping classification");
        None
    } else {
        match classifier.classify(&record.text).await {
            Ok(label) => Some(label),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "classification failed, keeping record with absent sentiment"
                );
                None
            }
        }
    };

    TweetRecord {
        doc_id: record.doc_id.unwrap_or_default(),
        text: record.text,
        clean,
        sentiment,
        tickers,
        created_at: record.created_at,
        embedding: record.embedding,
    }
}
