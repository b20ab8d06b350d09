//! Answer generation over retrieved context.
//!
//! The [`Generator`] trait is the seam to a language model; the crate ships
//! no concrete backend. [`AnswerPipeline`] does the grounding work around
//! it: retrieve, assemble a source-attributed prompt, generate, and return
//! the answer alongside the sources it was grounded on.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, RetrieverError};
use crate::retrieval::{RetrievalEngine, ScoredChunk};

/// Instruction prefix for every generation request. Keeps answers grounded
/// in the supplied context and honest about gaps.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant answering questions about uploaded documents. \
Answer using only the provided context. If the context does not contain the \
answer, say so plainly instead of guessing. Cite the document and page you \
drew each statement from.";

const NO_CONTEXT_ANSWER: &str =
    "I couldn't find relevant information in the uploaded documents to answer that question.";

const SOURCE_PREVIEW_CHARS: usize = 200;

/// Text completion backend.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce a completion for `prompt` with the given sampling settings.
    async fn generate(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: usize,
    ) -> anyhow::Result<String>;
}

/// One source the answer was grounded on, with a short text preview.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerSource {
    pub text: String,
    pub document: String,
    pub page: usize,
    pub score: f32,
}

/// A generated answer with its supporting sources.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<AnswerSource>,
}

/// Retrieval-augmented question answering.
pub struct AnswerPipeline {
    engine: Arc<RetrievalEngine>,
    generator: Arc<dyn Generator>,
    temperature: f32,
    max_output_tokens: usize,
}

impl AnswerPipeline {
    pub fn new(
        engine: Arc<RetrievalEngine>,
        generator: Arc<dyn Generator>,
        temperature: f32,
        max_output_tokens: usize,
    ) -> Self {
        Self {
            engine,
            generator,
            temperature,
            max_output_tokens,
        }
    }

    /// Answer `question` from the indexed documents.
    ///
    /// When retrieval finds nothing, the generator is not called and a
    /// fixed "nothing relevant" answer comes back with empty sources.
    pub async fn answer(&self, question: &str, top_k: Option<usize>) -> Result<Answer> {
        let retrieved = self.engine.retrieve(question, top_k).await?;
        if retrieved.is_empty() {
            debug!("no context retrieved, skipping generation");
            return Ok(Answer {
                answer: NO_CONTEXT_ANSWER.to_string(),
                sources: Vec::new(),
            });
        }

        let prompt = build_prompt(question, &retrieved);
        let answer = self
            .generator
            .generate(&prompt, self.temperature, self.max_output_tokens)
            .await
            .map_err(|e| RetrieverError::External { source: e })?;

        Ok(Answer {
            answer,
            sources: retrieved.iter().map(source_from_chunk).collect(),
        })
    }
}

/// Assemble the full prompt: instructions, attributed context blocks, then
/// the question.
fn build_prompt(question: &str, chunks: &[ScoredChunk]) -> String {
    format!(
        "{SYSTEM_PROMPT}\n\nContext:\n{}\n\nQuestion: {question}\n\nAnswer:",
        format_context(chunks)
    )
}

/// Render each chunk as a source-attributed block in retrieval order.
fn format_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|scored| {
            format!(
                "[From {} - Page {}]\n{}",
                scored.chunk.document_name, scored.chunk.page, scored.chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn source_from_chunk(scored: &ScoredChunk) -> AnswerSource {
    AnswerSource {
        text: preview(&scored.chunk.text),
        document: scored.chunk.document_name.clone(),
        page: scored.chunk.page,
        score: scored.score,
    }
}

/// First 200 characters of the chunk, cut on a char boundary.
fn preview(text: &str) -> String {
    if text.chars().count() <= SOURCE_PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(SOURCE_PREVIEW_CHARS).collect();
    format!("{cut}...")
}
