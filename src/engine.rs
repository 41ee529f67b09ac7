//! Retrieval-augmented query engine: retrieve supporting chunks and
//! ground a generated answer in them.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::generation::Generator;
use crate::index::models::Answer;
use crate::index::table::ChunkStore;
use std::sync::Arc;

/// Fallback answer when the index returns nothing for a question.
/// Generation is skipped entirely in that case so the model cannot
/// hallucinate over an empty context.
pub const NO_CONTEXT_ANSWER: &str =
    "No relevant context was found in the index for this question.";

/// Answers questions over the indexed corpus.
///
/// Long-lived: constructed once per process with its client handles and
/// reused across calls. Holds no per-query state.
pub struct QueryEngine {
    store: Arc<dyn ChunkStore>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    top_k: usize,
}

impl QueryEngine {
    pub fn new(
        store: Arc<dyn ChunkStore>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        top_k: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
            top_k,
        }
    }

    /// Answer a question from retrieved context.
    ///
    /// Retrieval happens before generation; the store's similarity order
    /// is trusted as-is. `sources` lists each hit's source in retrieval
    /// order, duplicates included.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let query_vector = self.embedder.embed(question).await?;
        let hits = self.store.search(&query_vector, self.top_k).await?;

        if hits.is_empty() {
            tracing::info!("no chunks retrieved, skipping generation");
            return Ok(Answer {
                text: NO_CONTEXT_ANSWER.to_string(),
                sources: Vec::new(),
            });
        }

        let context = hits
            .iter()
            .map(|hit| format!("[{}] {}", hit.source, hit.content))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = build_prompt(&context, question);
        tracing::debug!(
            hits = hits.len(),
            model = self.generator.model(),
            "generating answer"
        );
        let text = self.generator.generate(&prompt).await?;

        let sources = hits.into_iter().map(|hit| hit.source).collect();
        Ok(Answer { text, sources })
    }
}

/// Fixed prompt template: instruction, context, question, in that order.
fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are an expert assistant. Use the context to answer the question in detail.\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question: {question}"
    )
}

#[cfg(test)]
mod tests {
    use super::{NO_CONTEXT_ANSWER, QueryEngine};
    use crate::embedding::Embedder;
    use crate::error::Result;
    use crate::generation::Generator;
    use crate::index::models::{ChunkRecord, RetrievedChunk};
    use crate::index::table::ChunkStore;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubEmbedder;

    #[async_trait::async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.25; 4])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.25; 4]).collect())
        }

        fn dimensions(&self) -> usize {
            4
        }
    }

    /// Returns a fixed hit list regardless of the query vector.
    struct StubStore {
        hits: Vec<RetrievedChunk>,
    }

    #[async_trait::async_trait]
    impl ChunkStore for StubStore {
        async fn upsert(&self, _records: &[ChunkRecord]) -> Result<()> {
            Ok(())
        }

        async fn search(&self, _query_vector: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
            Ok(self.hits.iter().take(k).cloned().collect())
        }

        async fn count(&self) -> Result<usize> {
            Ok(self.hits.len())
        }
    }

    /// Echoes the prompt back and counts invocations.
    #[derive(Default)]
    struct EchoGenerator {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(prompt.to_string())
        }

        fn model(&self) -> &str {
            "echo"
        }
    }

    fn hit(source: &str, content: &str) -> RetrievedChunk {
        RetrievedChunk {
            content: content.to_string(),
            source: source.to_string(),
        }
    }

    fn engine(hits: Vec<RetrievedChunk>, generator: Arc<EchoGenerator>) -> QueryEngine {
        QueryEngine::new(
            Arc::new(StubStore { hits }),
            Arc::new(StubEmbedder),
            generator,
            5,
        )
    }

    #[tokio::test]
    async fn empty_retrieval_short_circuits_without_generation() {
        let generator = Arc::new(EchoGenerator::default());
        let answer = engine(Vec::new(), generator.clone())
            .answer("what is in the corpus?")
            .await
            .expect("answer");

        assert_eq!(answer.text, NO_CONTEXT_ANSWER);
        assert!(answer.sources.is_empty());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn context_lines_are_tagged_with_sources_in_retrieval_order() {
        let generator = Arc::new(EchoGenerator::default());
        let answer = engine(
            vec![
                hit("doc.pdf", "first chunk text"),
                hit("other.pdf", "second chunk text"),
            ],
            generator.clone(),
        )
        .answer("what happened?")
        .await
        .expect("answer");

        // The echo generator returns the prompt verbatim.
        assert!(answer.text.contains("[doc.pdf] first chunk text"));
        assert!(answer.text.contains("[other.pdf] second chunk text"));
        let first = answer.text.find("[doc.pdf]").unwrap();
        let second = answer.text.find("[other.pdf]").unwrap();
        assert!(first < second);
        assert!(answer.text.ends_with("Question: what happened?"));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn duplicate_sources_are_preserved() {
        let generator = Arc::new(EchoGenerator::default());
        let answer = engine(
            vec![
                hit("doc.pdf", "one"),
                hit("doc.pdf", "two"),
                hit("notes.txt", "three"),
            ],
            generator,
        )
        .answer("?")
        .await
        .expect("answer");

        assert_eq!(answer.sources, vec!["doc.pdf", "doc.pdf", "notes.txt"]);
    }

    #[tokio::test]
    async fn retrieval_respects_top_k() {
        let generator = Arc::new(EchoGenerator::default());
        let hits: Vec<_> = (0..10).map(|i| hit("doc.pdf", &format!("chunk {i}"))).collect();
        let answer = engine(hits, generator).answer("?").await.expect("answer");
        assert_eq!(answer.sources.len(), 5);
    }
}
