use std::path::Path;
use std::sync::Arc;

use finsent_agent::{DirObjectStore, InsightOutcome, TweetAgent};
use finsent_core::{decode_batch, AppConfig};
use finsent_model::{
    ChatClient, ClassifyClient, EmbedClient, EmbeddingProvider, FallbackModel, MiniLmFallback,
};
use finsent_store::VectorStore;

async fn build_agent(config: &AppConfig) -> anyhow::Result<TweetAgent> {
    let remote = EmbedClient::new(&config.gateway_url, config.request_timeout_secs)?;
    let fallback: Arc<dyn FallbackModel> = Arc::new(MiniLmFallback::new());
    let provider = EmbeddingProvider::new(remote, fallback);

    let store = VectorStore::open(&config.data_dir, provider).await?;
    let classifier = ClassifyClient::new(
        &config.gateway_url,
        config.request_timeout_secs,
        config.classify_max_retries,
        config.classify_backoff_base_ms,
    )?;
    let chat = ChatClient::new(&config.gateway_url, config.request_timeout_secs)?;

    Ok(TweetAgent::new(
        store,
        classifier,
        chat,
        config.watchlist.clone(),
        config.rag_top_k,
    ))
}

/// Repopulate the session corpus from the bucket mirror, if one is
/// configured. The corpus is in-memory and session-scoped; the vector
/// store's persistent dedup keeps re-syncs cheap.
async fn hydrate(agent: &mut TweetAgent, config: &AppConfig) -> anyhow::Result<()> {
    let Some(ref bucket_dir) = config.bucket_dir else {
        return Ok(());
    };
    let object_store = DirObjectStore::new(bucket_dir.clone());
    let added = agent.sync(&object_store, &config.batch_prefix).await?;
    tracing::info!(added, "corpus hydrated from bucket mirror");
    Ok(())
}

pub(crate) async fn run_ingest(config: &AppConfig, file: &Path) -> anyhow::Result<()> {
    let mut agent = build_agent(config).await?;

    let bytes = tokio::fs::read(file).await?;
    let batch = decode_batch(&bytes)?;
    let origin = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    let added = agent.ingest_batch(batch, &origin).await?;
    println!(
        "ingested {added} new records from {} ({} in corpus, {} in vector store)",
        file.display(),
        agent.corpus().len(),
        agent.vector_count().await?
    );
    Ok(())
}

pub(crate) async fn run_sync(config: &AppConfig, prefix: Option<&str>) -> anyhow::Result<()> {
    let Some(ref bucket_dir) = config.bucket_dir else {
        anyhow::bail!("FINSENT_BUCKET_DIR is not set; no data source reachable");
    };
    let mut agent = build_agent(config).await?;

    let object_store = DirObjectStore::new(bucket_dir.clone());
    let prefix = prefix.unwrap_or(&config.batch_prefix);
    let added = agent.sync(&object_store, prefix).await?;
    println!(
        "synced {added} new records under {prefix} ({} in corpus)",
        agent.corpus().len()
    );
    Ok(())
}

pub(crate) async fn run_pivot(config: &AppConfig, min_mentions: u64) -> anyhow::Result<()> {
    let mut agent = build_agent(config).await?;
    hydrate(&mut agent, config).await?;

    if agent.corpus().is_empty() {
        println!("no tweets ingested yet; run `ingest` or `sync` first");
        return Ok(());
    }

    let rows = agent.pivot(min_mentions);
    if rows.is_empty() {
        println!("no tickers with at least {min_mentions} classified mentions");
        return Ok(());
    }

    let header = format!(
        "{:<10}{:>9}{:>9}{:>9}{:>8}{:>8}{:>8}",
        "TICKER", "POSITIVE", "NEUTRAL", "NEGATIVE", "TOTAL", "POS%", "NEG%"
    );
    println!("{header}");
    for row in &rows {
        println!(
            "{:<10}{:>9}{:>9}{:>9}{:>8}{:>7.1}%{:>7.1}%",
            row.ticker,
            row.positive,
            row.neutral,
            row.negative,
            row.total,
            row.pos_ratio * 100.0,
            row.neg_ratio * 100.0,
        );
    }
    Ok(())
}

pub(crate) async fn run_trend(config: &AppConfig) -> anyhow::Result<()> {
    let mut agent = build_agent(config).await?;
    hydrate(&mut agent, config).await?;

    let buckets = agent.trend();
    if buckets.is_empty() {
        println!("no classified tweets yet; run `ingest` or `sync` first");
        return Ok(());
    }

    let header = format!(
        "{:<18}{:>9}{:>9}{:>9}{:>8}{:>8}{:>8}",
        "HOUR (UTC)", "POSITIVE", "NEUTRAL", "NEGATIVE", "POS%", "NEU%", "NEG%"
    );
    println!("{header}");
    for bucket in &buckets {
        println!(
            "{:<18}{:>9}{:>9}{:>9}{:>7.1}%{:>7.1}%{:>7.1}%",
            bucket.hour.format("%Y-%m-%d %H:00"),
            bucket.positive,
            bucket.neutral,
            bucket.negative,
            bucket.pos_ratio * 100.0,
            bucket.neu_ratio * 100.0,
            bucket.neg_ratio * 100.0,
        );
    }
    Ok(())
}

pub(crate) async fn run_ask(config: &AppConfig, question: &str) -> anyhow::Result<()> {
    let mut agent = build_agent(config).await?;
    hydrate(&mut agent, config).await?;

    match agent.answer(question).await? {
        InsightOutcome::NoData => {
            println!("no tweets ingested yet; run `ingest` or `sync` first");
        }
        InsightOutcome::Answered(text) => println!("{text}"),
    }
    Ok(())
}
