//! Integration tests for the vector store against a wiremock gateway and a
//! temporary on-disk database.

use std::sync::Arc;

use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use finsent_model::{EmbedClient, EmbeddingProvider, FallbackModel, ModelError};
use finsent_store::{StoreError, VectorStore};

/// Deterministic local model; embeds by text length so similarity is stable.
struct StubFallback {
    fail: bool,
}

impl FallbackModel for StubFallback {
    fn name(&self) -> &str {
        "stub"
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        if self.fail {
            return Err(ModelError::Fallback("stub refuses to embed".to_string()));
        }
        Ok(texts
            .iter()
            .map(|t| {
                #[allow(clippy::cast_precision_loss)]
                let len = t.chars().count() as f32;
                vec![len, 1.0]
            })
            .collect())
    }
}

fn provider(base_url: &str, fallback_fails: bool) -> EmbeddingProvider {
    EmbeddingProvider::new(
        EmbedClient::new(base_url, 30).expect("client construction should not fail"),
        Arc::new(StubFallback {
            fail: fallback_fails,
        }),
    )
}

/// Mounts an /embed mock that answers any batch with unit-length vectors
/// derived from input order, so every call aligns positionally.
async fn mount_embed_identity(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(|req: &wiremock::Request| {
            #[derive(serde::Deserialize)]
            struct Body {
                inputs: Vec<String>,
            }
            let body: Body = req.body_json().expect("embed request body");
            let vectors: Vec<Vec<f32>> = body
                .inputs
                .iter()
                .map(|t| {
                    #[allow(clippy::cast_precision_loss)]
                    let len = t.chars().count() as f32;
                    vec![len, 2.0]
                })
                .collect();
            ResponseTemplate::new(200).set_body_json(vectors)
        })
        .mount(server)
        .await;
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn add_computes_embeddings_and_inserts() {
    let server = MockServer::start().await;
    mount_embed_identity(&server).await;
    let dir = TempDir::new().expect("tempdir");

    let store = VectorStore::open(dir.path(), provider(&server.uri(), true))
        .await
        .expect("store should open");

    let inserted = store
        .add(
            &ids(&["a", "b"]),
            &ids(&["bbva results strong", "markets fall"]),
            None,
        )
        .await
        .expect("add should succeed");

    assert_eq!(inserted, 2);
    assert_eq!(store.count().await.expect("count"), 2);
}

#[tokio::test]
async fn add_is_at_most_once_per_id_across_calls() {
    let server = MockServer::start().await;
    mount_embed_identity(&server).await;
    let dir = TempDir::new().expect("tempdir");

    let store = VectorStore::open(dir.path(), provider(&server.uri(), true))
        .await
        .expect("store should open");

    store
        .add(&ids(&["a", "b"]), &ids(&["uno", "dos"]), None)
        .await
        .expect("first add");
    let second = store
        .add(&ids(&["b", "c"]), &ids(&["dos", "tres"]), None)
        .await
        .expect("second add");

    assert_eq!(second, 1, "only the unseen id should insert");
    assert_eq!(store.count().await.expect("count"), 3);
}

#[tokio::test]
async fn add_with_supplied_embeddings_never_calls_the_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let dir = TempDir::new().expect("tempdir");

    let store = VectorStore::open(dir.path(), provider(&server.uri(), true))
        .await
        .expect("store should open");

    let inserted = store
        .add(
            &ids(&["a"]),
            &ids(&["bbva sube"]),
            Some(vec![vec![1.0, 0.0]]),
        )
        .await
        .expect("add should succeed");
    assert_eq!(inserted, 1);
}

#[tokio::test]
async fn add_is_all_or_nothing_when_embedding_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let dir = TempDir::new().expect("tempdir");

    // Fallback fails too, so embedding the batch is impossible.
    let store = VectorStore::open(dir.path(), provider(&server.uri(), true))
        .await
        .expect("store should open");

    let result = store
        .add(&ids(&["a", "b"]), &ids(&["uno", "dos"]), None)
        .await;
    assert!(
        matches!(result, Err(StoreError::Model(_))),
        "expected Model error, got: {result:?}"
    );
    assert_eq!(
        store.count().await.expect("count"),
        0,
        "no partial insert may survive an embedding failure"
    );
}

#[tokio::test]
async fn add_skips_empty_documents() {
    let server = MockServer::start().await;
    mount_embed_identity(&server).await;
    let dir = TempDir::new().expect("tempdir");

    let store = VectorStore::open(dir.path(), provider(&server.uri(), true))
        .await
        .expect("store should open");

    let inserted = store
        .add(
            &ids(&["a", "b", "c"]),
            &[String::from("real content"), String::new(), String::from("   ")],
            None,
        )
        .await
        .expect("add should succeed");
    assert_eq!(inserted, 1, "empty documents must not be indexed");
}

#[tokio::test]
async fn add_rejects_misaligned_supplied_embeddings() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("tempdir");

    let store = VectorStore::open(dir.path(), provider(&server.uri(), true))
        .await
        .expect("store should open");

    let result = store
        .add(
            &ids(&["a", "b"]),
            &ids(&["uno", "dos"]),
            Some(vec![vec![1.0, 0.0]]),
        )
        .await;
    assert!(
        matches!(result, Err(StoreError::Alignment { values: 1, documents: 2 })),
        "expected Alignment error, got: {result:?}"
    );
}

#[tokio::test]
async fn query_returns_nearest_first_with_doc_ids() {
    let server = MockServer::start().await;
    mount_embed_identity(&server).await;
    let dir = TempDir::new().expect("tempdir");

    let store = VectorStore::open(dir.path(), provider(&server.uri(), true))
        .await
        .expect("store should open");

    // Length-derived embeddings: "aaaa" (4) is closer to the 4-char query
    // than "aaaaaaaaaaaa" (12).
    store
        .add(
            &ids(&["short", "long"]),
            &ids(&["aaaa", "aaaaaaaaaaaa"]),
            None,
        )
        .await
        .expect("add");

    let hits = store.query("bbbb", 2).await.expect("query");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].doc_id, "short");
    assert!(hits[0].score >= hits[1].score, "nearest-first ordering");
}

#[tokio::test]
async fn store_survives_reopen() {
    let server = MockServer::start().await;
    mount_embed_identity(&server).await;
    let dir = TempDir::new().expect("tempdir");

    {
        let store = VectorStore::open(dir.path(), provider(&server.uri(), true))
            .await
            .expect("store should open");
        store
            .add(&ids(&["a"]), &ids(&["persisted document"]), None)
            .await
            .expect("add");
    }

    let reopened = VectorStore::open(dir.path(), provider(&server.uri(), true))
        .await
        .expect("store should reopen");
    assert_eq!(reopened.count().await.expect("count"), 1);
    let again = reopened
        .add(&ids(&["a"]), &ids(&["persisted document"]), None)
        .await
        .expect("add");
    assert_eq!(again, 0, "persisted id must still deduplicate");
}
