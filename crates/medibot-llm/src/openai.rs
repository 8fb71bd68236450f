//! OpenAI chat completions client.

use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use medibot_core::{ProviderMessage, RelayError, Role};
use tracing::{debug, info};

use crate::{CompletionProvider, CompletionSettings};

/// Completion provider backed by the OpenAI API (or a compatible endpoint).
///
/// Build it once at startup; the inner client is cheap to share across tasks.
/// Each request reaches the API at most once: rate-limit responses fail
/// immediately instead of being retried.
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    settings: CompletionSettings,
}

impl OpenAiProvider {
    /// Creates a new provider. Without `api_key` the provider still builds,
    /// and every call fails with the API's authentication error.
    pub fn new(api_key: Option<&str>, api_base: Option<&str>, settings: CompletionSettings) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key.unwrap_or_default());
        if let Some(base) = api_base {
            config = config.with_api_base(base);
        }

        info!(
            "OpenAiProvider: model={}, api_key_len={}, api_base={}",
            settings.model,
            api_key.map_or(0, str::len),
            api_base.unwrap_or("default"),
        );

        let client = Client::with_config(config).with_backoff(single_attempt());
        Self { client, settings }
    }

    pub fn settings(&self) -> &CompletionSettings {
        &self.settings
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, messages: &[ProviderMessage]) -> Result<String, RelayError> {
        let request = build_request(&self.settings, messages)?;
        debug!("Sending {} messages to {}", messages.len(), self.settings.model);

        let response = self.client.chat().create(request).await.map_err(map_openai_err)?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(RelayError::EmptyReply)
    }
}

/// Backoff policy that gives up after the first failed attempt.
fn single_attempt() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

/// Assembles a non-streaming chat completion request.
#[allow(deprecated)]
pub fn build_request(
    settings: &CompletionSettings,
    messages: &[ProviderMessage],
) -> Result<CreateChatCompletionRequest, RelayError> {
    let messages = messages
        .iter()
        .map(to_openai_message)
        .collect::<Result<Vec<_>, _>>()?;

    CreateChatCompletionRequestArgs::default()
        .model(settings.model.as_str())
        .messages(messages)
        .max_tokens(settings.max_tokens)
        .temperature(settings.temperature)
        .build()
        .map_err(map_openai_err)
}

fn to_openai_message(msg: &ProviderMessage) -> Result<ChatCompletionRequestMessage, RelayError> {
    let content = msg.content.clone();
    let message: ChatCompletionRequestMessage = match msg.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()
            .map_err(map_openai_err)?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()
            .map_err(map_openai_err)?
            .into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()
            .map_err(map_openai_err)?
            .into(),
    };
    Ok(message)
}

fn map_openai_err(e: OpenAIError) -> RelayError {
    match e {
        OpenAIError::ApiError(err) => RelayError::Provider(err.message),
        OpenAIError::InvalidArgument(m) => RelayError::InvalidRequest(m),
        other => RelayError::Provider(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;

    /// Serves `body` with `status` on the chat completions route and returns
    /// a provider pointed at it plus a request counter.
    async fn mock_api(status: StatusCode, body: Value) -> (OpenAiProvider, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move || {
                let counter = counter.clone();
                let body = body.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (status, Json(body))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let base = format!("http://{addr}/v1");
        let provider = OpenAiProvider::new(Some("sk-test"), Some(&base), CompletionSettings::default());
        (provider, hits)
    }

    fn completion(choices: Value) -> Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-4o-mini",
            "choices": choices
        })
    }

    fn choice(index: u32, content: Value) -> Value {
        json!({
            "index": index,
            "message": { "role": "assistant", "content": content, "refusal": null },
            "finish_reason": "stop",
            "logprobs": null
        })
    }

    fn api_error(message: &str, kind: &str, code: &str) -> Value {
        json!({ "error": { "message": message, "type": kind, "param": null, "code": code } })
    }

    fn transcript() -> Vec<ProviderMessage> {
        vec![
            ProviderMessage::system("Be brief."),
            ProviderMessage::user("I have a headache"),
            ProviderMessage::assistant("For how long?"),
            ProviderMessage::user("Two days"),
        ]
    }

    #[test]
    #[allow(deprecated)]
    fn test_build_request_uses_settings() {
        let request = build_request(&CompletionSettings::default(), &transcript()).unwrap();

        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.max_tokens, Some(300));
        assert_eq!(request.temperature, Some(0.7));
        assert_ne!(request.stream, Some(true));
    }

    #[test]
    fn test_build_request_preserves_roles_and_order() {
        let request = build_request(&CompletionSettings::with_model("gpt-4o"), &transcript()).unwrap();

        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.messages.len(), 4);
        assert!(matches!(request.messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(request.messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(request.messages[2], ChatCompletionRequestMessage::Assistant(_)));
        assert!(matches!(request.messages[3], ChatCompletionRequestMessage::User(_)));
    }

    #[test]
    fn test_provider_builds_without_api_key() {
        let provider = OpenAiProvider::new(None, None, CompletionSettings::default());
        assert_eq!(provider.settings().max_tokens, 300);
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let body = completion(json!([
            choice(0, json!("  See a neurologist.\n")),
            choice(1, json!("Try an aspirin.")),
        ]));
        let (provider, hits) = mock_api(StatusCode::OK, body).await;

        let text = provider.complete(&transcript()).await.unwrap();

        assert_eq!(text, "  See a neurologist.\n");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_complete_without_choices_is_empty_reply() {
        let (provider, _) = mock_api(StatusCode::OK, completion(json!([]))).await;

        let err = provider.complete(&transcript()).await.unwrap_err();
        assert!(matches!(err, RelayError::EmptyReply));
    }

    #[tokio::test]
    async fn test_complete_with_null_content_is_empty_reply() {
        let (provider, _) = mock_api(StatusCode::OK, completion(json!([choice(0, Value::Null)]))).await;

        let err = provider.complete(&transcript()).await.unwrap_err();
        assert!(matches!(err, RelayError::EmptyReply));
    }

    #[tokio::test]
    async fn test_auth_error_is_provider_error() {
        let body = api_error("Incorrect API key provided", "invalid_request_error", "invalid_api_key");
        let (provider, hits) = mock_api(StatusCode::UNAUTHORIZED, body).await;

        let err = provider.complete(&transcript()).await.unwrap_err();

        assert!(matches!(err, RelayError::Provider(ref m) if m == "Incorrect API key provided"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_fails_without_retry() {
        let body = api_error("Rate limit reached for gpt-4o-mini", "requests", "rate_limit_exceeded");
        let (provider, hits) = mock_api(StatusCode::TOO_MANY_REQUESTS, body).await;

        let result = tokio::time::timeout(Duration::from_secs(5), provider.complete(&transcript()))
            .await
            .expect("rate-limited call should fail immediately");

        assert!(matches!(result, Err(RelayError::Provider(_))));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refused_connection_is_provider_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let base = format!("http://{addr}/v1");
        let provider = OpenAiProvider::new(Some("sk-test"), Some(&base), CompletionSettings::default());

        let err = provider.complete(&transcript()).await.unwrap_err();
        assert!(matches!(err, RelayError::Provider(_)));
    }
}
