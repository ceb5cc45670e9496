//! Per-ticker sentiment aggregation and hourly trend series.
//!
//! Both views are pure functions of the current corpus contents, recomputed
//! on demand and never persisted. Records with absent sentiment contribute
//! to neither: they stay in the corpus for completeness but are excluded
//! from every count and ratio here.

use std::collections::BTreeMap;

use chrono::{DateTime, Timelike, Utc};

use finsent_core::{Sentiment, TweetRecord};

/// One row of the per-ticker sentiment pivot.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub ticker: String,
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
    pub total: u64,
    pub pos_ratio: f64,
    pub neg_ratio: f64,
}

/// One hourly bucket of the sentiment trend.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendBucket {
    pub hour: DateTime<Utc>,
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
    pub pos_ratio: f64,
    pub neu_ratio: f64,
    pub neg_ratio: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    positive: u64,
    neutral: u64,
    negative: u64,
}

impl Counts {
    fn bump(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Negative => self.negative += 1,
        }
    }

    fn total(self) -> u64 {
        self.positive + self.neutral + self.negative
    }
}

/// Build the per-ticker sentiment pivot.
///
/// Each record explodes into one (record, tag) pair per ticker; empty tags
/// are dropped. Tags whose classified total is below `min_mentions` are
/// filtered out. Rows come back sorted by ticker.
#[must_use]
pub fn sentiment_pivot(records: &[TweetRecord], min_mentions: u64) -> Vec<PivotRow> {
    let mut counts: BTreeMap<&str, Counts> = BTreeMap::new();

    for record in records {
        let Some(sentiment) = record.sentiment else {
            continue;
        };
        for ticker in &record.tickers {
            if ticker.is_empty() {
                continue;
            }
            counts.entry(ticker.as_str()).or_default().bump(sentiment);
        }
    }

    counts
        .into_iter()
        .filter_map(|(ticker, c)| {
            let total = c.total();
            if total < min_mentions {
                return None;
            }
            // min_mentions >= 1 makes total == 0 unreachable here; zero
            // ratios anyway rather than dividing.
            let (pos_ratio, neg_ratio) = if total == 0 {
                (0.0, 0.0)
            } else {
                #[allow(clippy::cast_precision_loss)]
                let denom = total as f64;
                #[allow(clippy::cast_precision_loss)]
                let ratios = (c.positive as f64 / denom, c.negative as f64 / denom);
                ratios
            };
            Some(PivotRow {
                ticker: ticker.to_string(),
                positive: c.positive,
                neutral: c.neutral,
                negative: c.negative,
                total,
                pos_ratio,
                neg_ratio,
            })
        })
        .collect()
}

/// Build the hourly sentiment trend over classified records.
///
/// Buckets are keyed by `created_at` floored to the hour; each carries the
/// three class counts and their share of the bucket (denominator floored at
/// 1). Buckets come back in chronological order.
#[must_use]
pub fn sentiment_trend(records: &[TweetRecord]) -> Vec<TrendBucket> {
    let mut buckets: BTreeMap<DateTime<Utc>, Counts> = BTreeMap::new();

    for record in records {
        let Some(sentiment) = record.sentiment else {
            continue;
        };
        let hour = floor_to_hour(record.created_at);
        buckets.entry(hour).or_default().bump(sentiment);
    }

    buckets
        .into_iter()
        .map(|(hour, c)| {
            #[allow(clippy::cast_precision_loss)]
            let denom = c.total().max(1) as f64;
            #[allow(clippy::cast_precision_loss)]
            let (pos_ratio, neu_ratio, neg_ratio) = (
                c.positive as f64 / denom,
                c.neutral as f64 / denom,
                c.negative as f64 / denom,
            );
            TrendBucket {
                hour,
                positive: c.positive,
                neutral: c.neutral,
                negative: c.negative,
                pos_ratio,
                neu_ratio,
                neg_ratio,
            }
        })
        .collect()
}

fn floor_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record(ticker: &str, sentiment: Option<Sentiment>) -> TweetRecord {
        record_at(ticker, sentiment, 10, 0)
    }

    fn record_at(
        ticker: &str,
        sentiment: Option<Sentiment>,
        hour: u32,
        minute: u32,
    ) -> TweetRecord {
        TweetRecord {
            doc_id: format!("{ticker}-{hour}-{minute}-{sentiment:?}"),
            text: String::from("text"),
            clean: String::from("clean"),
            sentiment,
            tickers: vec![ticker.to_string()],
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, hour, minute, 0).unwrap(),
            embedding: None,
        }
    }

    #[test]
    fn pivot_counts_and_ratios_match() {
        let records = vec![
            record("BBVA", Some(Sentiment::Positive)),
            record("BBVA", Some(Sentiment::Positive)),
            record("BBVA", Some(Sentiment::Negative)),
        ];
        let rows = sentiment_pivot(&records, 1);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.ticker, "BBVA");
        assert_eq!(row.positive, 2);
        assert_eq!(row.negative, 1);
        assert_eq!(row.neutral, 0);
        assert_eq!(row.total, 3);
        assert!((row.pos_ratio - 0.667).abs() < 0.001, "got {}", row.pos_ratio);
        assert!((row.neg_ratio - 0.333).abs() < 0.001, "got {}", row.neg_ratio);
    }

    #[test]
    fn pivot_filters_below_min_mentions() {
        let records = vec![
            record("BBVA", Some(Sentiment::Positive)),
            record("BBVA", Some(Sentiment::Negative)),
            record("SAN", Some(Sentiment::Neutral)),
        ];
        let rows = sentiment_pivot(&records, 2);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ticker, "BBVA");
    }

    #[test]
    fn pivot_excludes_absent_sentiment_from_counts() {
        let records = vec![
            record("BBVA", Some(Sentiment::Positive)),
            record("BBVA", None),
            record("BBVA", None),
        ];
        let rows = sentiment_pivot(&records, 1);
        assert_eq!(rows[0].total, 1, "absent sentiment must not count");
    }

    #[test]
    fn pivot_drops_records_with_only_absent_sentiment() {
        let records = vec![record("SAN", None)];
        assert!(sentiment_pivot(&records, 1).is_empty());
    }

    #[test]
    fn pivot_drops_empty_ticker_tags() {
        let mut rec = record("", Some(Sentiment::Positive));
        rec.tickers = vec![String::new()];
        assert!(sentiment_pivot(&[rec], 1).is_empty());
    }

    #[test]
    fn pivot_explodes_multi_ticker_records() {
        let mut rec = record("BBVA", Some(Sentiment::Positive));
        rec.tickers = vec!["BBVA".to_string(), "SAN".to_string()];
        let rows = sentiment_pivot(&[rec], 1);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ticker, "BBVA");
        assert_eq!(rows[1].ticker, "SAN");
    }

    #[test]
    fn trend_buckets_by_hour_in_order() {
        let records = vec![
            record_at("BBVA", Some(Sentiment::Positive), 11, 45),
            record_at("BBVA", Some(Sentiment::Negative), 10, 5),
            record_at("BBVA", Some(Sentiment::Positive), 10, 59),
        ];
        let buckets = sentiment_trend(&records);
        assert_eq!(buckets.len(), 2);
        assert_eq!(
            buckets[0].hour,
            Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(buckets[0].positive, 1);
        assert_eq!(buckets[0].negative, 1);
        assert!((buckets[0].pos_ratio - 0.5).abs() < 1e-9);
        assert_eq!(buckets[1].positive, 1);
        assert!((buckets[1].pos_ratio - 1.0).abs() < 1e-9);
    }

    #[test]
    fn trend_skips_unclassified_records() {
        let records = vec![record_at("BBVA", None, 10, 0)];
        assert!(sentiment_trend(&records).is_empty());
    }
}
