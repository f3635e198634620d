use std::time::Duration;

use crate::error::AppError;
use crate::llm::provider::{estimate_tokens, LLMProvider, LLMResponse, Message, MessageRole, TokenUsage};
use crate::tools::definition::{ToolCall, ToolDefinition};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;

#[derive(Clone)]
pub struct OpenAICompatibleProvider {
    client: reqwest::Client,
    base_url: String,
}

impl OpenAICompatibleProvider {
    pub fn new(api_key: &str, base_url: Option<String>, timeout: Duration) -> Result<Self, AppError> {
        let base_url = normalize_openai_compatible_base_url(base_url);
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| AppError::Config(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("whisperme-relay/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn send(&self, body: &serde_json::Value) -> Result<ChatResponse, AppError> {
        let resp = self.client.post(self.endpoint()).json(body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(AppError::UpstreamCompletionFailed(format!(
                "OpenAI-compatible error: {status} {text}"
            )));
        }

        resp.json()
            .await
            .map_err(|e| AppError::UpstreamCompletionFailed(format!("Malformed completion body: {e}")))
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    fn provider_name(&self) -> &'static str {
        "openai_compatible"
    }

    async fn chat(
        &self,
        model: &str,
        messages: Vec<Message>,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<LLMResponse, AppError> {
        self.chat_with_tools(model, messages, &[], temperature, max_tokens)
            .await
    }

    async fn chat_with_tools(
        &self,
        model: &str,
        messages: Vec<Message>,
        tools: &[ToolDefinition],
        temperature: f64,
        max_tokens: u32,
    ) -> Result<LLMResponse, AppError> {
        let openai_messages = messages
            .into_iter()
            .map(to_openai_message)
            .collect::<Result<Vec<_>, AppError>>()?;

        let mut body = serde_json::json!({
            "model": model,
            "messages": openai_messages,
            "temperature": temperature,
            "max_tokens": max_tokens
        });

        if !tools.is_empty() {
            let tool_defs = tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters
                        }
                    })
                })
                .collect::<Vec<_>>();
            body["tools"] = serde_json::Value::Array(tool_defs);
            body["tool_choice"] = serde_json::Value::String("auto".to_string());
        }

        let parsed = self.send(&body).await?;

        let choice = parsed
            .choices
            .first()
            .ok_or_else(|| AppError::UpstreamCompletionFailed("No choices".to_string()))?;

        let content = choice.message.content.clone().unwrap_or_default();
        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .clone()
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: parse_tool_arguments(tc.function.arguments),
            })
            .collect();

        let prompt_tokens = parsed.usage.as_ref().and_then(|u| u.prompt_tokens);
        let completion_tokens = parsed.usage.as_ref().and_then(|u| u.completion_tokens);
        let estimated = prompt_tokens.is_none() || completion_tokens.is_none();

        let output_estimate_text = if tool_calls.is_empty() {
            content.clone()
        } else {
            format!(
                "{content}\n{}",
                serde_json::to_string(&tool_calls).unwrap_or_default()
            )
        };

        Ok(LLMResponse {
            content,
            usage: TokenUsage {
                input_tokens: prompt_tokens.unwrap_or_else(|| estimate_tokens(&body.to_string())),
                output_tokens: completion_tokens
                    .unwrap_or_else(|| estimate_tokens(&output_estimate_text)),
                estimated,
            },
            model: parsed.model.clone().unwrap_or_else(|| model.to_string()),
            finish_reason: choice.finish_reason.clone(),
            tool_calls,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    pub choices: Vec<ChatChoice>,
    pub model: Option<String>,
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIToolCall {
    pub id: String,
    pub function: OpenAIFunctionCall,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIFunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// Object payloads are parsed; anything else stays as the raw upstream text so
/// it can be echoed back unchanged on the follow-up call.
fn parse_tool_arguments(raw: String) -> serde_json::Value {
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value @ serde_json::Value::Object(_)) => value,
        _ => serde_json::Value::String(raw),
    }
}

fn to_openai_message(msg: Message) -> Result<serde_json::Value, AppError> {
    let role = match msg.role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
        MessageRole::Tool => "tool",
    };

    let mut out = serde_json::Map::new();
    out.insert(
        "role".to_string(),
        serde_json::Value::String(role.to_string()),
    );
    out.insert(
        "content".to_string(),
        msg.content
            .map(serde_json::Value::String)
            .unwrap_or(serde_json::Value::Null),
    );

    if let Some(name) = msg.name {
        out.insert("name".to_string(), serde_json::Value::String(name));
    }

    if let Some(tool_call_id) = msg.tool_call_id {
        out.insert(
            "tool_call_id".to_string(),
            serde_json::Value::String(tool_call_id),
        );
    }

    if let Some(tool_calls) = msg.tool_calls {
        let mapped = tool_calls
            .into_iter()
            .map(|tc| -> Result<serde_json::Value, AppError> {
                // Non-object payloads were kept as raw strings; send them back verbatim.
                let args = match tc.arguments {
                    serde_json::Value::String(raw) => raw,
                    other => serde_json::to_string(&other)?,
                };
                Ok(serde_json::json!({
                    "id": tc.id,
                    "type": "function",
                    "function": { "name": tc.name, "arguments": args }
                }))
            })
            .collect::<Result<Vec<_>, AppError>>()?;
        out.insert("tool_calls".to_string(), serde_json::Value::Array(mapped));
    }

    Ok(serde_json::Value::Object(out))
}

pub fn normalize_openai_compatible_base_url(base_url: Option<String>) -> String {
    let default_url = "https://api.openai.com/v1".to_string();
    let Some(mut base) = base_url else {
        return default_url;
    };
    base = base.trim().to_string();
    if base.is_empty() {
        return default_url;
    }

    // Users sometimes paste full endpoint.
    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        base = trimmed
            .strip_suffix("/chat/completions")
            .unwrap_or(trimmed)
            .to_string();
    }

    // Only append /v1 when no path provided.
    match url::Url::parse(&base) {
        Ok(url) => {
            let path = url.path();
            if path.is_empty() || path == "/" {
                return format!("{}/v1", base.trim_end_matches('/'));
            }
            base.trim_end_matches('/').to_string()
        }
        Err(_) => base.trim_end_matches('/').to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    #[test]
    fn normalizes_base_urls() {
        assert_eq!(normalize_openai_compatible_base_url(None), "https://api.openai.com/v1");
        assert_eq!(
            normalize_openai_compatible_base_url(Some("  ".into())),
            "https://api.openai.com/v1"
        );
        assert_eq!(
            normalize_openai_compatible_base_url(Some("http://localhost:8080".into())),
            "http://localhost:8080/v1"
        );
        assert_eq!(
            normalize_openai_compatible_base_url(Some("https://llm.example.com/v1/chat/completions".into())),
            "https://llm.example.com/v1"
        );
        assert_eq!(
            normalize_openai_compatible_base_url(Some("https://llm.example.com/openai/v1/".into())),
            "https://llm.example.com/openai/v1"
        );
    }

    #[test]
    fn assistant_tool_call_turn_uses_null_content_and_string_arguments() {
        let msg = Message::assistant_tool_calls(vec![ToolCall {
            id: "call_1".into(),
            name: "calculate".into(),
            arguments: json!({"expression": "1+1"}),
        }]);
        let out = to_openai_message(msg).unwrap();
        assert_eq!(out["content"], Value::Null);
        assert_eq!(out["tool_calls"][0]["type"], "function");
        assert_eq!(
            out["tool_calls"][0]["function"]["arguments"],
            "{\"expression\":\"1+1\"}"
        );
    }

    async fn spawn_upstream(reply: Value, status: u16) -> (String, Arc<Mutex<Vec<Value>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_for_handler = seen.clone();
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move |Json(body): Json<Value>| {
                let seen = seen_for_handler.clone();
                let reply = reply.clone();
                async move {
                    seen.lock().await.push(body);
                    (
                        axum::http::StatusCode::from_u16(status).unwrap(),
                        Json(reply),
                    )
                }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), seen)
    }

    #[tokio::test]
    async fn parses_tool_calls_and_advertises_tools() {
        let reply = json!({
            "model": "gpt-4o-2024",
            "choices": [{
                "finish_reason": "tool_calls",
                "message": {
                    "content": null,
                    "tool_calls": [
                        {"id": "call_a", "type": "function", "function": {"name": "get_current_weather", "arguments": "{\"location\":\"Tokyo\"}"}},
                        {"id": "call_b", "type": "function", "function": {"name": "calculate", "arguments": "{broken"}},
                        {"id": "call_c", "type": "function", "function": {"name": "get_current_weather", "arguments": "\"Tokyo\""}}
                    ]
                }
            }],
            "usage": {"prompt_tokens": 42, "completion_tokens": 7}
        });
        let (base, seen) = spawn_upstream(reply, 200).await;
        let provider = OpenAICompatibleProvider::new("sk-test", Some(base), Duration::from_secs(5)).unwrap();
        let tools = crate::tools::builtin::definitions();

        let resp = provider
            .chat_with_tools("gpt-4o", vec![Message::user("weather?")], &tools, 0.7, 1000)
            .await
            .unwrap();

        assert_eq!(resp.model, "gpt-4o-2024");
        assert_eq!(resp.usage.input_tokens, 42);
        assert!(!resp.usage.estimated);
        assert_eq!(resp.tool_calls.len(), 3);
        assert_eq!(resp.tool_calls[0].arguments, json!({"location": "Tokyo"}));
        assert_eq!(resp.tool_calls[1].arguments, json!("{broken"));
        assert_eq!(resp.tool_calls[2].arguments, json!("\"Tokyo\""));

        // Arguments go back upstream exactly as they arrived.
        let echoed = to_openai_message(Message::assistant_tool_calls(resp.tool_calls.clone())).unwrap();
        let sent: Vec<_> = echoed["tool_calls"]
            .as_array()
            .unwrap()
            .iter()
            .map(|tc| tc["function"]["arguments"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(sent, vec!["{\"location\":\"Tokyo\"}", "{broken", "\"Tokyo\""]);

        let body = seen.lock().await[0].clone();
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"].as_array().unwrap().len(), tools.len());
        assert_eq!(body["max_tokens"], 1000);
    }

    #[tokio::test]
    async fn plain_chat_omits_tools_and_estimates_missing_usage() {
        let reply = json!({"choices": [{"message": {"content": "hello there"}, "finish_reason": "stop"}]});
        let (base, seen) = spawn_upstream(reply, 200).await;
        let provider = OpenAICompatibleProvider::new("sk-test", Some(base), Duration::from_secs(5)).unwrap();

        let resp = provider
            .chat("gpt-4o-mini", vec![Message::user("hi")], 0.7, 1000)
            .await
            .unwrap();

        assert_eq!(resp.content, "hello there");
        assert_eq!(resp.model, "gpt-4o-mini");
        assert!(resp.usage.estimated);
        assert!(resp.tool_calls.is_empty());
        assert!(seen.lock().await[0].get("tools").is_none());
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_failure() {
        let (base, _) = spawn_upstream(json!({"error": {"message": "bad key"}}), 401).await;
        let provider = OpenAICompatibleProvider::new("sk-test", Some(base), Duration::from_secs(5)).unwrap();

        let err = provider
            .chat("gpt-4o", vec![Message::user("hi")], 0.7, 1000)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamCompletionFailed(ref m) if m.contains("401")));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_upstream_failure() {
        let provider = OpenAICompatibleProvider::new(
            "sk-test",
            Some("http://127.0.0.1:9/v1".into()),
            Duration::from_secs(2),
        )
        .unwrap();
        let err = provider
            .chat("gpt-4o", vec![Message::user("hi")], 0.7, 1000)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamCompletionFailed(_)));
    }
}
