//! # AI Bridge
//!
//! Client for the external inference backend behind the in-chat `@ai`
//! assistant and the direct `/api/ai` endpoint. Supports multiple providers
//! (OpenAI, Anthropic, Gemini, DeepSeek) through rust-genai.
//!
//! Every call is bounded by a timeout so a stalled provider can never hang
//! a room, and every successful reply is normalized into a typed
//! [`AiReply`] before it touches the broadcast pipeline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

/// AI provider type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AiProvider {
    /// OpenAI (default)
    OpenAI,
    /// Anthropic
    Anthropic,
    /// Google Gemini
    Gemini,
    /// DeepSeek
    DeepSeek,
}

impl Default for AiProvider {
    fn default() -> Self {
        AiProvider::OpenAI
    }
}

impl AiProvider {
    /// Get the default model name for this provider
    pub fn default_model(&self) -> &'static str {
        match self {
            AiProvider::OpenAI => "gpt-4o-mini",
            AiProvider::Anthropic => "claude-3-haiku-20240307",
            AiProvider::Gemini => "gemini-2.0-flash",
            AiProvider::DeepSeek => "deepseek-chat",
        }
    }

    /// Get the environment variable name for the API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            AiProvider::OpenAI => "OPENAI_API_KEY",
            AiProvider::Anthropic => "ANTHROPIC_API_KEY",
            AiProvider::Gemini => "GEMINI_API_KEY",
            AiProvider::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }

    /// Pick the first provider whose API key is present in the environment.
    pub fn detect() -> Option<Self> {
        [
            AiProvider::OpenAI,
            AiProvider::Anthropic,
            AiProvider::Gemini,
            AiProvider::DeepSeek,
        ]
        .into_iter()
        .find(|provider| {
            std::env::var(provider.api_key_env())
                .map(|key| !key.trim().is_empty())
                .unwrap_or(false)
        })
    }
}

/// Bridge configuration, read from the environment with defaults.
#[derive(Clone, Debug)]
pub struct AiConfig {
    /// AI provider
    pub provider: AiProvider,
    /// API key for the AI provider
    pub api_key: String,
    /// Model name (e.g., "gpt-4o-mini", "deepseek-chat")
    pub model: String,
    /// Upper bound on one inference call
    pub timeout: Duration,
    /// Maximum response length in tokens
    pub max_tokens: u32,
    /// Temperature for response generation
    pub temperature: f32,
    /// System prompt framing the assistant's role
    pub system_prompt: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        let provider = AiProvider::detect().unwrap_or_default();

        let default_system_prompt = "You are a senior developer assisting inside a \
            collaborative coding workspace chat. \
            - Answer development questions concisely (2-4 sentences when possible) \
            - When asked to generate code or scaffold files, respond with a JSON object \
              holding a \"text\" field with your explanation and an optional \"fileTree\" \
              object mapping file names to { \"contents\": \"...\" } \
            - For everything else respond in plain prose \
            - If you're unsure about something, say so rather than guessing"
            .to_string();

        let system_prompt = std::env::var("AI_SYSTEM_PROMPT")
            .ok()
            .filter(|prompt| !prompt.trim().is_empty())
            .unwrap_or(default_system_prompt);

        let model = std::env::var("AI_MODEL")
            .ok()
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| provider.default_model().to_string());

        let timeout_secs = std::env::var("AI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let max_tokens = std::env::var("AI_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(500);

        let temperature = std::env::var("AI_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse::<f32>().ok())
            .unwrap_or(0.8);

        Self {
            api_key: std::env::var(provider.api_key_env()).unwrap_or_default(),
            provider,
            model,
            timeout: Duration::from_secs(timeout_secs),
            max_tokens,
            temperature,
            system_prompt,
        }
    }
}

/// A normalized inference result.
///
/// Serialization into a message body is unconditional: plain text is wrapped
/// into `{"text": ...}` and structured replies pass through byte-for-byte,
/// so every AI-authored message body is a JSON object with a `text` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiReply {
    PlainText(String),
    Structured(Value),
}

impl AiReply {
    /// The reply as a JSON value.
    pub fn into_value(self) -> Value {
        match self {
            AiReply::PlainText(text) => json!({ "text": text }),
            AiReply::Structured(value) => value,
        }
    }

    /// The reply serialized for a message body.
    pub fn into_body(self) -> String {
        self.into_value().to_string()
    }
}

/// Why an inference call produced no reply.
#[derive(Debug, Error)]
pub enum AiBridgeError {
    /// The bounded wait elapsed before the backend answered.
    #[error("inference timed out after {0:?}")]
    Timeout(Duration),

    /// The backend answered with an error or an unusable response.
    #[error("inference backend error: {0}")]
    Backend(String),
}

/// One inference backend. The production implementation talks to a provider
/// through rust-genai; tests script this seam directly.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<AiReply, AiBridgeError>;
}

/// The bridge itself: a backend plus the mandatory bounded wait.
#[derive(Clone)]
pub struct AiBridge {
    backend: Arc<dyn InferenceBackend>,
    timeout: Duration,
}

impl AiBridge {
    pub fn new(backend: Arc<dyn InferenceBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Build the production bridge from the environment. Without a usable
    /// API key (or with the `genai` feature off) every call reports a
    /// backend error, which the pipeline turns into its fallback reply.
    pub fn from_env() -> Self {
        let config = AiConfig::default();
        let timeout = config.timeout;

        #[cfg(feature = "genai")]
        {
            if config.api_key.trim().is_empty() {
                tracing::warn!(
                    "[AI] no API key found (checked {}); assistant replies will report an error",
                    config.provider.api_key_env()
                );
                return Self::new(Arc::new(DisabledBackend), timeout);
            }
            tracing::info!(
                "[AI] provider={:?} model={} timeout={:?}",
                config.provider,
                config.model,
                timeout
            );
            Self::new(Arc::new(GenAiBackend::new(config)), timeout)
        }

        #[cfg(not(feature = "genai"))]
        {
            tracing::warn!("[AI] built without the 'genai' feature; assistant is disabled");
            Self::new(Arc::new(DisabledBackend), timeout)
        }
    }

    /// Run one inference call, bounded by the configured timeout.
    pub async fn infer(&self, prompt: &str) -> Result<AiReply, AiBridgeError> {
        match tokio::time::timeout(self.timeout, self.backend.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(AiBridgeError::Timeout(self.timeout)),
        }
    }
}

/// Backend used when no provider is configured.
pub struct DisabledBackend;

#[async_trait]
impl InferenceBackend for DisabledBackend {
    async fn generate(&self, _prompt: &str) -> Result<AiReply, AiBridgeError> {
        Err(AiBridgeError::Backend(
            "AI assistant is not configured".to_string(),
        ))
    }
}

/// Shape a provider's raw text into a typed reply.
///
/// A reply that parses as a JSON object with a `text` field is treated as
/// structured (the code-generation shape); anything else is plain prose,
/// even if it happens to contain braces.
#[cfg_attr(not(feature = "genai"), allow(dead_code))]
fn normalize_reply(raw: &str) -> Result<AiReply, AiBridgeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AiBridgeError::Backend("empty response".to_string()));
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if value.as_object().is_some_and(|obj| obj.contains_key("text")) {
            return Ok(AiReply::Structured(value));
        }
    }

    Ok(AiReply::PlainText(trimmed.to_string()))
}

/// Production backend over rust-genai.
#[cfg(feature = "genai")]
pub struct GenAiBackend {
    config: AiConfig,
}

#[cfg(feature = "genai")]
impl GenAiBackend {
    pub fn new(config: AiConfig) -> Self {
        Self { config }
    }
}

#[cfg(feature = "genai")]
#[async_trait]
impl InferenceBackend for GenAiBackend {
    async fn generate(&self, prompt: &str) -> Result<AiReply, AiBridgeError> {
        use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
        use genai::resolver::{AuthData, AuthResolver};
        use genai::Client;

        // Build auth resolver for custom API key
        let api_key = self.config.api_key.clone();
        let auth_resolver = AuthResolver::from_resolver_fn(
            move |_model_iden| -> Result<Option<AuthData>, genai::resolver::Error> {
                Ok(Some(AuthData::from_single(api_key.clone())))
            },
        );

        let client = Client::builder().with_auth_resolver(auth_resolver).build();

        let chat_req = ChatRequest::default()
            .with_system(&self.config.system_prompt)
            .append_message(ChatMessage::user(prompt));

        let chat_options = ChatOptions::default()
            .with_temperature(self.config.temperature as f64)
            .with_max_tokens(self.config.max_tokens);

        tracing::debug!("[AI] calling model {}", self.config.model);
        let chat_res = client
            .exec_chat(&self.config.model, chat_req, Some(&chat_options))
            .await
            .map_err(|e| AiBridgeError::Backend(format!("AI API error: {e:?}")))?;

        let text = chat_res
            .first_text()
            .ok_or_else(|| AiBridgeError::Backend("no response from AI".to_string()))?;

        normalize_reply(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Reply Normalization ==========

    #[test]
    fn test_plain_prose_stays_plain() {
        let reply = normalize_reply("Use a BTreeMap for ordered keys.").expect("should normalize");

        assert_eq!(
            reply,
            AiReply::PlainText("Use a BTreeMap for ordered keys.".to_string())
        );
    }

    #[test]
    fn test_structured_reply_is_detected_by_parse_not_braces() {
        let reply = normalize_reply(r#"{"text":"done","fileTree":{"main.rs":{"contents":"fn main() {}"}}}"#)
            .expect("should normalize");

        match reply {
            AiReply::Structured(value) => {
                assert_eq!(value["text"], "done");
                assert!(value["fileTree"]["main.rs"]["contents"].is_string());
            }
            AiReply::PlainText(_) => panic!("expected a structured reply"),
        }
    }

    #[test]
    fn test_braces_without_text_field_are_prose() {
        // Looks like JSON but is not the code-generation shape.
        let reply = normalize_reply(r#"{"foo": 1}"#).expect("should normalize");
        assert_eq!(reply, AiReply::PlainText(r#"{"foo": 1}"#.to_string()));

        let reply = normalize_reply("{ this is not json }").expect("should normalize");
        assert_eq!(reply, AiReply::PlainText("{ this is not json }".to_string()));
    }

    #[test]
    fn test_empty_response_is_a_backend_error() {
        assert!(matches!(
            normalize_reply("   "),
            Err(AiBridgeError::Backend(_))
        ));
    }

    // ========== Body Serialization ==========

    #[test]
    fn test_plain_text_wraps_into_text_object() {
        let body = AiReply::PlainText("hello".to_string()).into_body();

        let value: Value = serde_json::from_str(&body).expect("body should be JSON");
        assert_eq!(value, json!({ "text": "hello" }));
    }

    #[test]
    fn test_structured_value_passes_through() {
        let value = json!({ "text": "scaffolded", "fileTree": { "app.js": { "contents": "" } } });

        let body = AiReply::Structured(value.clone()).into_body();

        assert_eq!(
            serde_json::from_str::<Value>(&body).expect("body should be JSON"),
            value
        );
    }

    // ========== Bounded Wait ==========

    struct NeverResolves;

    #[async_trait]
    impl InferenceBackend for NeverResolves {
        async fn generate(&self, _prompt: &str) -> Result<AiReply, AiBridgeError> {
            std::future::pending().await
        }
    }

    struct CannedReply(&'static str);

    #[async_trait]
    impl InferenceBackend for CannedReply {
        async fn generate(&self, _prompt: &str) -> Result<AiReply, AiBridgeError> {
            Ok(AiReply::PlainText(self.0.to_string()))
        }
    }

    #[tokio::test]
    async fn test_stalled_backend_times_out() {
        let bridge = AiBridge::new(Arc::new(NeverResolves), Duration::from_millis(20));

        let err = bridge.infer("anything").await.expect_err("should time out");

        assert!(matches!(err, AiBridgeError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_prompt_answer_within_timeout_passes_through() {
        let bridge = AiBridge::new(Arc::new(CannedReply("pong")), Duration::from_secs(5));

        let reply = bridge.infer("ping").await.expect("should answer");

        assert_eq!(reply, AiReply::PlainText("pong".to_string()));
    }

    #[tokio::test]
    async fn test_disabled_backend_reports_backend_error() {
        let bridge = AiBridge::new(Arc::new(DisabledBackend), Duration::from_secs(5));

        let err = bridge.infer("anything").await.expect_err("should error");

        assert!(matches!(err, AiBridgeError::Backend(_)));
    }

    // ========== Provider Table ==========

    #[test]
    fn test_provider_models_and_key_envs() {
        assert_eq!(AiProvider::OpenAI.default_model(), "gpt-4o-mini");
        assert_eq!(AiProvider::DeepSeek.api_key_env(), "DEEPSEEK_API_KEY");
        assert_eq!(AiProvider::Gemini.api_key_env(), "GEMINI_API_KEY");
        assert_eq!(AiProvider::Anthropic.default_model(), "claude-3-haiku-20240307");
    }
}
