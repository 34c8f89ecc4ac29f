//! Answer pipeline: the serving-side seam that ties retrieval, generation
//! and evaluation together for one chat turn.
//!
//! The embedding/vector-search backend and the LLM are external. They are
//! injected as trait objects, built once at process start and shared
//! read-only across requests; nothing here owns global client state.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ScoringHandle;
use crate::error::ScoringError;
use crate::evaluate::{EvaluationReport, EvaluationRequest};
use crate::retrieval::RetrievalResult;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One chunk returned by the vector search: its text plus score/source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub content: String,
    pub result: RetrievalResult,
}

/// Nearest-neighbour search over the persona corpus.
pub trait Retriever: Send + Sync {
    fn retrieve<'a>(
        &'a self,
        query: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, anyhow::Result<Vec<RetrievedChunk>>>;
}

/// Hosted LLM producing the final answer text.
pub trait Generator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a Prompt) -> BoxFuture<'a, anyhow::Result<String>>;
}

/// Prompt handed to the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub persona: String,
    pub context: String,
    pub question: String,
}

impl Prompt {
    /// Flattened single-message prompt.
    pub fn render(&self) -> String {
        format!(
            "You are {}. Use the context below to answer.\nContext: {}\nQuestion: {}\nAnswer:",
            self.persona, self.context, self.question
        )
    }
}

/// Result of one chat turn: the answer, the exact context it was conditioned
/// on, and its quality report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurn {
    pub answer: String,
    pub context_text: String,
    pub report: EvaluationReport,
}

#[derive(Clone)]
pub struct AnswerPipeline {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    scoring: ScoringHandle,
}

impl AnswerPipeline {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn Generator>,
        scoring: ScoringHandle,
    ) -> Self {
        Self {
            retriever,
            generator,
            scoring,
        }
    }

    /// retrieve top-k → join context → generate → evaluate.
    pub async fn answer(&self, query: &str) -> anyhow::Result<ChatTurn> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ScoringError::InvalidInput("query must not be empty".into()).into());
        }

        // One snapshot for the whole turn, so a hot reload can't split it.
        let cfg = self.scoring.config();
        let evaluator = self.scoring.evaluator();

        let chunks = self
            .retriever
            .retrieve(query, cfg.pipeline.top_k)
            .await
            .context("retrieval failed")?;
        info!(returned = chunks.len(), top_k = cfg.pipeline.top_k, "retrieved context");

        let context_chunks: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let context_text = context_chunks.join("\n\n");

        let prompt = Prompt {
            persona: cfg.persona.name.clone(),
            context: context_text.clone(),
            question: query.to_string(),
        };
        let answer = self
            .generator
            .generate(&prompt)
            .await
            .context("generation failed")?;
        debug!(answer_len = answer.len(), "generated answer");

        let request = EvaluationRequest {
            answer,
            context_chunks,
            results: chunks.into_iter().map(|c| c.result).collect(),
        };
        let report = evaluator.evaluate(&request);

        Ok(ChatTurn {
            answer: request.answer,
            context_text,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::evaluate::Grade;
    use std::sync::Mutex;

    struct FixedRetriever {
        chunks: Vec<RetrievedChunk>,
        seen_limit: Mutex<Option<usize>>,
    }

    impl Retriever for FixedRetriever {
        fn retrieve<'a>(
            &'a self,
            _query: &'a str,
            limit: usize,
        ) -> BoxFuture<'a, anyhow::Result<Vec<RetrievedChunk>>> {
            Box::pin(async move {
                *self.seen_limit.lock().unwrap() = Some(limit);
                Ok(self.chunks.iter().take(limit).cloned().collect())
            })
        }
    }

    /// Echoes the context back, so every answer word is grounded.
    struct EchoGenerator {
        last_prompt: Mutex<Option<Prompt>>,
    }

    impl Generator for EchoGenerator {
        fn generate<'a>(&'a self, prompt: &'a Prompt) -> BoxFuture<'a, anyhow::Result<String>> {
            Box::pin(async move {
                *self.last_prompt.lock().unwrap() = Some(prompt.clone());
                Ok(prompt.context.replace("\n\n", " "))
            })
        }
    }

    struct FailingGenerator;
    impl Generator for FailingGenerator {
        fn generate<'a>(&'a self, _prompt: &'a Prompt) -> BoxFuture<'a, anyhow::Result<String>> {
            Box::pin(async { Err::<String, _>(anyhow::anyhow!("model unavailable")) })
        }
    }

    fn chunk(text: &str, score: f64, src: &str) -> RetrievedChunk {
        RetrievedChunk {
            content: text.into(),
            result: RetrievalResult::new(score, src).unwrap(),
        }
    }

    fn retriever() -> Arc<FixedRetriever> {
        Arc::new(FixedRetriever {
            chunks: vec![
                chunk("Retention is the growth metric", 0.9, "linkedin"),
                chunk("Find your north star", 0.8, "youtube"),
                chunk("Iterate on the roadmap", 0.7, "linkedin"),
                chunk("Never retrieved", 0.1, "youtube"),
            ],
            seen_limit: Mutex::new(None),
        })
    }

    #[tokio::test]
    async fn answer_runs_retrieve_generate_evaluate() {
        let r = retriever();
        let g = Arc::new(EchoGenerator {
            last_prompt: Mutex::new(None),
        });
        let handle = ScoringHandle::new(ScoringConfig::default()).unwrap();
        let p = AnswerPipeline::new(r.clone(), g.clone(), handle);

        let turn = p.answer("  How do I grow?  ").await.expect("turn");
        assert_eq!(*r.seen_limit.lock().unwrap(), Some(3));
        assert_eq!(
            turn.context_text,
            "Retention is the growth metric\n\nFind your north star\n\nIterate on the roadmap"
        );

        let prompt = g.last_prompt.lock().unwrap().clone().unwrap();
        assert_eq!(prompt.question, "How do I grow?");
        assert!(prompt.render().starts_with("You are Lenny Rachitsky."));

        assert_eq!(turn.report.retrieval.avg_score, 0.8);
        assert_eq!(turn.report.retrieval.source_diversity, 1.0);
        assert_eq!(turn.report.groundedness, 1.0);
        assert_eq!(turn.report.score.grade, Grade::A);
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let handle = ScoringHandle::new(ScoringConfig::default()).unwrap();
        let p = AnswerPipeline::new(
            retriever(),
            Arc::new(EchoGenerator {
                last_prompt: Mutex::new(None),
            }),
            handle,
        );
        let err = p.answer("   ").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScoringError>(),
            Some(ScoringError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn generator_failure_propagates() {
        let handle = ScoringHandle::new(ScoringConfig::default()).unwrap();
        let p = AnswerPipeline::new(retriever(), Arc::new(FailingGenerator), handle);
        let err = p.answer("question").await.unwrap_err();
        assert!(format!("{err:#}").contains("model unavailable"));
    }
}
