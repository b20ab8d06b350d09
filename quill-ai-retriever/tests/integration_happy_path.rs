//! End-to-end tests over the document index, retrieval engine, and answer
//! pipeline, using a deterministic in-process embedder so no model files
//! are needed.

use std::sync::Arc;

use async_trait::async_trait;
use quill_ai_embed::{EmbeddingMode, EmbeddingProvider};
use quill_ai_retriever::generation::{AnswerPipeline, Generator};
use quill_ai_retriever::retrieval::{
    ChunkInput, DocumentIndex, IndexPersistence, RetrievalEngine,
};
use tempfile::TempDir;

const DIM: usize = 8;

/// Embeds text as a character histogram. Identical texts embed identically
/// in both modes, so querying with a chunk's own text is an exact match.
struct HistogramEmbedder;

fn histogram(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; DIM];
    for b in text.bytes() {
        v[(b as usize) % DIM] += 1.0;
    }
    v
}

#[async_trait]
impl EmbeddingProvider for HistogramEmbedder {
    async fn embed(
        &self,
        texts: &[String],
        _mode: EmbeddingMode,
    ) -> quill_ai_embed::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| histogram(t)).collect())
    }

    fn dimension(&self) -> usize {
        DIM
    }

    fn provider_name(&self) -> &str {
        "histogram-test"
    }
}

/// Returns a fixed completion and asserts the prompt carries the context.
struct CannedGenerator;

#[async_trait]
impl Generator for CannedGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _temperature: f32,
        _max_tokens: usize,
    ) -> anyhow::Result<String> {
        assert!(prompt.contains("Context:"), "prompt must include context");
        Ok("Newton's second law relates force to acceleration.".to_string())
    }
}

fn chunk(text: &str, page: usize) -> ChunkInput {
    ChunkInput {
        text: text.to_string(),
        page,
    }
}

async fn embed_all(texts: &[&str]) -> Vec<Vec<f32>> {
    let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
    HistogramEmbedder
        .embed(&owned, EmbeddingMode::Document)
        .await
        .unwrap()
}

fn open_index(dir: &TempDir) -> Arc<DocumentIndex> {
    Arc::new(DocumentIndex::open(IndexPersistence::new(dir.path(), DIM)).unwrap())
}

fn engine(index: Arc<DocumentIndex>) -> RetrievalEngine {
    RetrievalEngine::new(index, Arc::new(HistogramEmbedder), 5, 10)
}

#[tokio::test]
async fn ingest_query_delete_rebuild_round_trip() {
    let dir = TempDir::new().unwrap();
    let index = open_index(&dir);

    let physics = [
        "Force equals mass times acceleration.",
        "Energy can neither be created nor destroyed.",
    ];
    let cooking = ["Simmer the broth gently for two hours."];

    index
        .add_document(
            "physics.pdf",
            vec![chunk(physics[0], 1), chunk(physics[1], 2)],
            embed_all(&physics).await,
        )
        .await
        .unwrap();
    let cooking_id = index
        .add_document(
            "cooking.pdf",
            vec![chunk(cooking[0], 5)],
            embed_all(&cooking).await,
        )
        .await
        .unwrap();

    // an exact-text query ranks its own chunk first at distance zero
    let engine = engine(index.clone());
    let results = engine.retrieve(physics[0], None).await.unwrap();
    assert_eq!(results[0].chunk.text, physics[0]);
    assert_eq!(results[0].chunk.page, 1);
    assert_eq!(results[0].score, 0.0);
    assert_eq!(results.len(), 3);

    // delete hides the document immediately, rows linger until rebuild
    assert!(index.delete_document(&cooking_id).await.unwrap());
    let results = engine.retrieve(cooking[0], None).await.unwrap();
    assert!(results.iter().all(|r| r.chunk.document_name != "cooking.pdf"));
    assert_eq!(index.stats().await.index_rows, 3);

    let reclaimed = index.rebuild().await.unwrap();
    assert_eq!(reclaimed, 1);
    assert_eq!(index.stats().await.index_rows, 2);

    // retrieval still works against the compacted index
    let results = engine.retrieve(physics[1], None).await.unwrap();
    assert_eq!(results[0].chunk.text, physics[1]);
}

#[tokio::test]
async fn state_survives_a_restart() {
    let dir = TempDir::new().unwrap();
    let texts = ["The mitochondria is the powerhouse of the cell."];
    {
        let index = open_index(&dir);
        index
            .add_document("biology.pdf", vec![chunk(texts[0], 9)], embed_all(&texts).await)
            .await
            .unwrap();
    }

    let index = open_index(&dir);
    let documents = index.list_documents().await;
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].filename, "biology.pdf");

    let results = engine(index).retrieve(texts[0], Some(1)).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk.page, 9);
}

#[tokio::test]
async fn answer_pipeline_grounds_answers_in_retrieved_sources() {
    let dir = TempDir::new().unwrap();
    let index = open_index(&dir);
    let texts = ["Force equals mass times acceleration."];
    index
        .add_document("physics.pdf", vec![chunk(texts[0], 12)], embed_all(&texts).await)
        .await
        .unwrap();

    let pipeline = AnswerPipeline::new(
        Arc::new(engine(index)),
        Arc::new(CannedGenerator),
        0.1,
        500,
    );
    let answer = pipeline
        .answer("Force equals mass times acceleration.", None)
        .await
        .unwrap();

    assert!(answer.answer.contains("Newton"));
    assert_eq!(answer.sources.len(), 1);
    assert_eq!(answer.sources[0].document, "physics.pdf");
    assert_eq!(answer.sources[0].page, 12);
    assert_eq!(answer.sources[0].score, 0.0);
}

#[tokio::test]
async fn empty_index_yields_the_no_context_answer() {
    let dir = TempDir::new().unwrap();
    let pipeline = AnswerPipeline::new(
        Arc::new(engine(open_index(&dir))),
        Arc::new(CannedGenerator),
        0.1,
        500,
    );

    let answer = pipeline.answer("anything at all?", None).await.unwrap();
    assert!(answer.answer.contains("couldn't find relevant information"));
    assert!(answer.sources.is_empty());
}

#[tokio::test]
async fn top_k_is_clamped_to_the_configured_maximum() {
    let dir = TempDir::new().unwrap();
    let index = open_index(&dir);

    let texts: Vec<String> = (0..12)
        .map(|i| format!("chunk number {i} talks about topic {i}"))
        .collect();
    let chunks: Vec<ChunkInput> = texts.iter().map(|t| chunk(t, 1)).collect();
    let vectors = HistogramEmbedder
        .embed(&texts, EmbeddingMode::Document)
        .await
        .unwrap();
    index
        .add_document("big.pdf", chunks, vectors)
        .await
        .unwrap();

    let engine = engine(index);
    let results = engine.retrieve("chunk number 3", Some(50)).await.unwrap();
    assert_eq!(results.len(), 10);
}

#[tokio::test]
async fn query_validation_is_enforced_at_the_engine() {
    let dir = TempDir::new().unwrap();
    let engine = engine(open_index(&dir));
    assert!(engine.retrieve("hi", None).await.is_err());
    assert!(engine.retrieve(&"x".repeat(1001), None).await.is_err());
}
