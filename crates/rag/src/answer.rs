//! Grounded answer synthesis.
//!
//! Builds the prompt from retrieved chunks and generates an answer via
//! the LLM. The prompt instructs the model to answer only from the
//! provided context and to emit a fixed sentinel phrase when the answer
//! is not present, so callers and tests can detect abstention exactly.

use crate::types::RetrievedChunk;
use docqa_core::{AppError, AppResult};
use docqa_llm::{LlmClient, LlmRequest};

/// Exact phrase the model is told to emit when the context does not
/// contain the answer. Also returned directly when retrieval yields no
/// chunks at all.
pub const NO_ANSWER_SENTINEL: &str = "answer is not available in the context";

/// Maximum tokens for a synthesized answer.
const MAX_ANSWER_TOKENS: u32 = 2048;

/// Generate an answer for `question` grounded in the retrieved chunks.
///
/// # Errors
/// Returns `AppError::Synthesis` if the LLM call fails or produces an
/// empty response.
pub async fn synthesize(
    client: &dyn LlmClient,
    model: &str,
    chunks: &[RetrievedChunk],
    question: &str,
    temperature: f32,
) -> AppResult<String> {
    let prompt = build_prompt(chunks, question);

    tracing::debug!(
        "Synthesizing answer from {} chunks ({} prompt characters)",
        chunks.len(),
        prompt.len()
    );

    let request = LlmRequest::new(prompt, model)
        .with_temperature(temperature)
        .with_max_tokens(MAX_ANSWER_TOKENS);

    let response = client.complete(&request).await?;

    let answer = response.content.trim().to_string();
    if answer.is_empty() {
        return Err(AppError::Synthesis(
            "LLM returned an empty answer".to_string(),
        ));
    }

    Ok(answer)
}

/// Build the grounded QA prompt from the retrieved chunks.
fn build_prompt(chunks: &[RetrievedChunk], question: &str) -> String {
    let context = chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");

    format!(
        "Answer the question as detailed as possible from the provided context, \
         make sure to provide all the details. If the answer is not in the provided \
         context just say, \"{}\", don't provide the wrong answer.\n\n\
         Context:\n{}\n\n\
         Question:\n{}\n\n\
         Answer:",
        NO_ANSWER_SENTINEL, context, question
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_llm::{LlmResponse, LlmUsage};

    #[derive(Debug)]
    struct ScriptedClient {
        reply: String,
    }

    #[async_trait::async_trait]
    impl LlmClient for ScriptedClient {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &LlmRequest) -> docqa_core::AppResult<LlmResponse> {
            Ok(LlmResponse {
                content: self.reply.clone(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
        }
    }

    fn chunk(text: &str) -> RetrievedChunk {
        RetrievedChunk {
            text: text.to_string(),
            score: 0.9,
        }
    }

    #[test]
    fn test_prompt_contains_context_question_and_sentinel() {
        let chunks = vec![chunk("Lutetia is the capital."), chunk("It lies on a river.")];
        let prompt = build_prompt(&chunks, "What is the capital?");

        assert!(prompt.contains("Lutetia is the capital."));
        assert!(prompt.contains("It lies on a river."));
        assert!(prompt.contains("What is the capital?"));
        assert!(prompt.contains(NO_ANSWER_SENTINEL));
        assert!(prompt.contains("Context:"));
        assert!(prompt.contains("Question:"));
    }

    #[test]
    fn test_prompt_separates_chunks() {
        let chunks = vec![chunk("first"), chunk("second")];
        let prompt = build_prompt(&chunks, "q");
        assert!(prompt.contains("first\n\n---\n\nsecond"));
    }

    #[tokio::test]
    async fn test_synthesize_returns_trimmed_content() {
        let client = ScriptedClient {
            reply: "  The capital is Lutetia.\n".to_string(),
        };
        let answer = synthesize(&client, "gemini-1.5-flash", &[chunk("ctx")], "q", 0.3)
            .await
            .unwrap();
        assert_eq!(answer, "The capital is Lutetia.");
    }

    #[tokio::test]
    async fn test_synthesize_rejects_empty_answer() {
        let client = ScriptedClient {
            reply: "   ".to_string(),
        };
        let err = synthesize(&client, "gemini-1.5-flash", &[chunk("ctx")], "q", 0.3)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Synthesis(_)));
    }
}
