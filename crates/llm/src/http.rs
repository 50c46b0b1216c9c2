//! HTTP generation backend.
//!
//! Speaks the OpenAI-compatible chat-completions API. A `groq/` model prefix
//! routes to Groq; anything else goes to OpenAI unless a base URL override
//! points it at another compatible server. Text only, no streaming.

use crate::provider::{CompletionRequest, CompletionResponse, LlmError, LlmProvider, Role};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

const GROQ_PREFIX: &str = "groq/";
const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

// ── Wire types ──

#[derive(Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    stream: bool,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatReply {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl ChatReply {
    /// First choice's text. A reply with no text is an error, not an empty story.
    fn into_completion(self) -> Result<CompletionResponse, LlmError> {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::RequestFailed("reply carried no text".into()))?;
        let (input_tokens, output_tokens) = self
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));
        Ok(CompletionResponse {
            content,
            input_tokens,
            output_tokens,
        })
    }
}

// ── Provider ──

/// Chat-completions client for Groq or any OpenAI-compatible server.
pub struct HttpProvider {
    name: &'static str,
    model: String,
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpProvider {
    /// Build from model name + API key + optional base URL override.
    /// A `groq/` routing prefix (any case) is stripped from the model sent
    /// on the wire.
    pub fn new(model: String, api_key: String, base_url: Option<String>) -> Self {
        let groq = model
            .get(..GROQ_PREFIX.len())
            .is_some_and(|p| p.eq_ignore_ascii_case(GROQ_PREFIX));
        let (name, model, default_base) = if groq {
            ("groq", model[GROQ_PREFIX.len()..].to_owned(), GROQ_BASE_URL)
        } else {
            ("openai-compatible", model, OPENAI_BASE_URL)
        };
        let base = base_url
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| default_base.to_owned());
        Self {
            name,
            model,
            endpoint: format!("{}/chat/completions", base.trim_end_matches('/')),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn body<'a>(&'a self, request: &'a CompletionRequest) -> ChatBody<'a> {
        ChatBody {
            model: &self.model,
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: role_str(m.role),
                    content: &m.content,
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
            stream: false,
        }
    }

    async fn send(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.body(&request))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::Unavailable(e.to_string())
                } else {
                    LlmError::RequestFailed(e.to_string())
                }
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(check_error(status, text));
        }

        let reply: ChatReply = resp
            .json()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;
        reply.into_completion()
    }
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

/// Map a non-success status to an error; 429 is `RateLimited`.
fn check_error(status: reqwest::StatusCode, body: String) -> LlmError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        LlmError::RateLimited
    } else if status.is_server_error() {
        LlmError::Unavailable(format!("{status}: {body}"))
    } else {
        LlmError::RequestFailed(format!("{status}: {body}"))
    }
}

impl LlmProvider for HttpProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn complete(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + '_>> {
        Box::pin(self.send(request))
    }
}

/// Build an `HttpProvider` from environment variables.
/// Reads `SPROUT_LLM_MODEL`, `SPROUT_LLM_API_KEY`, optionally `SPROUT_LLM_BASE_URL`.
/// Returns `None` if model or key is not set.
pub fn from_env() -> Option<HttpProvider> {
    let model = std::env::var("SPROUT_LLM_MODEL").ok().filter(|m| !m.trim().is_empty())?;
    let api_key = std::env::var("SPROUT_LLM_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url = std::env::var("SPROUT_LLM_BASE_URL").ok();
    Some(HttpProvider::new(model, api_key, base_url))
}
