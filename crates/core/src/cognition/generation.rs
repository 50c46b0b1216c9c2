use std::time::Duration;

use crate::config::SproutCfg;
use crate::routing::persona;
use crate::types::Persona;
use sprout_llm::provider::{ChatMessage, CompletionRequest, LlmError, LlmProvider};

/// Uniform result of a generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    pub metadata: Option<GenerationMeta>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationMeta {
    pub provider: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Build the message list: persona as system prompt, task plus expected
/// output as the user turn.
pub fn build_messages(persona: Persona, task: &str, expected_output: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(persona::descriptor(persona).system_prompt()),
        ChatMessage::user(format!("{task}\n\nExpected output: {expected_output}")),
    ]
}

/// Run one generation request under `persona`, bounded by the configured timeout.
pub async fn generate<P: LlmProvider + ?Sized>(
    provider: &P,
    persona: Persona,
    task: &str,
    expected_output: &str,
    cfg: &SproutCfg,
) -> Result<Generation, LlmError> {
    let request = CompletionRequest {
        messages: build_messages(persona, task, expected_output),
        max_tokens: cfg.generation_max_tokens,
        temperature: cfg.generation_temperature,
        top_p: Some(cfg.generation_top_p),
    };

    let limit = Duration::from_secs(cfg.generation_timeout_secs);
    let response = tokio::time::timeout(limit, provider.complete(request))
        .await
        .map_err(|_| LlmError::Timeout(limit))??;

    Ok(Generation {
        text: response.content.trim().to_string(),
        metadata: Some(GenerationMeta {
            provider: provider.name().to_string(),
            input_tokens: response.input_tokens,
            output_tokens: response.output_tokens,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprout_llm::provider::{MockProvider, Role};

    #[test]
    fn build_messages_frames_persona_and_task() {
        let msgs = build_messages(Persona::QuizGuide, "Handle math_quiz", "A math_quiz response");
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, Role::System);
        assert!(msgs[0].content.contains("Math Adventure Guide"));
        assert_eq!(msgs[1].role, Role::User);
        assert!(msgs[1].content.contains("Handle math_quiz"));
        assert!(msgs[1].content.contains("Expected output: A math_quiz response"));
    }

    #[tokio::test]
    async fn generates_with_metadata() {
        let provider = MockProvider::new("  Hi Emma!  ");
        let cfg = SproutCfg::default();
        let g = generate(&provider, Persona::Greeter, "greet", "A greeting", &cfg).await.unwrap();
        assert_eq!(g.text, "Hi Emma!");
        let meta = g.metadata.unwrap();
        assert_eq!(meta.provider, "mock");
        assert_eq!(meta.output_tokens, 20);

        let req = &provider.requests()[0];
        assert_eq!(req.max_tokens, 1024);
        assert_eq!(req.top_p, Some(0.9));
    }

    #[tokio::test]
    async fn propagates_provider_error() {
        let provider = MockProvider::failing(LlmError::RequestFailed("boom".into()));
        let cfg = SproutCfg::default();
        let err = generate(&provider, Persona::Companion, "chat", "A response", &cfg)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::RequestFailed(_)));
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let provider = MockProvider::new("late").with_delay(Duration::from_secs(5));
        let cfg = SproutCfg {
            generation_timeout_secs: 0,
            ..SproutCfg::default()
        };
        let err = generate(&provider, Persona::Companion, "chat", "A response", &cfg)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Timeout(_)));
    }
}
