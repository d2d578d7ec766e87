use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{prompt::ChatRequest, UpstreamError};
use crate::config::OpenAiConfig;

const PROVIDER: &str = "openai";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub function_call: Option<FunctionCall>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionCall {
    #[serde(default)]
    pub name: Option<String>,
    pub arguments: String,
}

impl ChatResponse {
    /// Raw JSON arguments of the first choice's function call.
    pub fn function_arguments(&self) -> Option<&str> {
        self.choices
            .first()?
            .message
            .function_call
            .as_ref()
            .map(|call| call.arguments.as_str())
    }
}

#[async_trait]
pub trait ChatCompletions: Send + Sync {
    async fn create(&self, request: &ChatRequest) -> Result<ChatResponse, UpstreamError>;
}

#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, config: &OpenAiConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ChatCompletions for OpenAiClient {
    async fn create(&self, request: &ChatRequest) -> Result<ChatResponse, UpstreamError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|source| UpstreamError::Request {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "chat completion rejected");
            return Err(UpstreamError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
            });
        }

        let parsed = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| UpstreamError::Parse {
                provider: PROVIDER,
                reason: e.to_string(),
            })?;
        debug!(choices = parsed.choices.len(), model = %request.model, "chat completion received");
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::{
        http::{header::AUTHORIZATION, HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};

    use super::*;
    use crate::ai::{prompt::chat_request, GenerationSettings};
    use crate::test_support::serve_stub;

    fn client(base_url: String, timeout: Duration) -> OpenAiClient {
        let http = reqwest::Client::builder().timeout(timeout).build().unwrap();
        OpenAiClient::new(
            http,
            &OpenAiConfig {
                api_key: "sk-test".into(),
                base_url,
                model: "gpt-3.5-turbo".into(),
                temperature: 0.4,
                max_tokens: 750,
            },
        )
    }

    fn request() -> ChatRequest {
        chat_request("soup", &["vegan".into()], &GenerationSettings::default())
    }

    #[tokio::test]
    async fn posts_request_with_bearer_key() {
        let seen: Arc<Mutex<Option<(String, Value)>>> = Arc::default();
        let router = Router::new().route(
            "/chat/completions",
            post({
                let seen = seen.clone();
                move |headers: HeaderMap, Json(body): Json<Value>| async move {
                    let auth = headers
                        .get(AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    *seen.lock().unwrap() = Some((auth, body));
                    Json(json!({
                        "choices": [{
                            "message": {
                                "role": "assistant",
                                "content": null,
                                "function_call": {
                                    "name": "create_recipe",
                                    "arguments": "{\"title\":\"Soup\"}"
                                }
                            }
                        }]
                    }))
                }
            }),
        );
        let base = serve_stub(router).await;

        let resp = client(format!("{base}/"), Duration::from_secs(5))
            .create(&request())
            .await
            .unwrap();
        assert_eq!(resp.function_arguments(), Some(r#"{"title":"Soup"}"#));

        let (auth, body) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(auth, "Bearer sk-test");
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["functions"][0]["name"], "create_recipe");
        assert_eq!(body["messages"][1]["role"], "user");
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
        );
        let base = serve_stub(router).await;

        let err = client(base, Duration::from_secs(5))
            .create(&request())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UpstreamError::Status {
                provider: "openai",
                status: 503
            }
        ));
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({ "choices": [] }))
            }),
        );
        let base = serve_stub(router).await;

        let err = client(base, Duration::from_millis(100))
            .create(&request())
            .await
            .unwrap_err();
        match &err {
            UpstreamError::Request { source, .. } => assert!(source.is_timeout()),
            other => panic!("expected a request failure, got {other:?}"),
        }
        assert!(matches!(
            crate::error::AppError::from(err),
            crate::error::AppError::Upstream(_)
        ));
    }

    #[test]
    fn extracts_function_arguments() {
        let raw = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "function_call": { "name": "create_recipe", "arguments": "{\"title\":\"Soup\"}" }
                }
            }]
        }"#;
        let resp: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.function_arguments(), Some(r#"{"title":"Soup"}"#));
    }

    #[test]
    fn plain_text_answer_has_no_arguments() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"Please rephrase."}}]}"#;
        let resp: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.function_arguments(), None);
        assert_eq!(ChatResponse::default().function_arguments(), None);
    }
}
