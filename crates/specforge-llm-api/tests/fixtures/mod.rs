#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::*;
use wiremock::{Mock, MockServer, ResponseTemplate};

use specforge_llm_api::{
    CompletionClient, CancellationToken, HostMessage, HostModelInfo, HostModelProvider, Settings,
};

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_ANTHROPIC_KEY: &str = "sk-ant-test-key";

/// Mock server utilities for testing the direct backends
pub struct LlmMockServer {
    server: MockServer,
}

impl LlmMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Base URL to put in settings
    pub fn base_url(&self) -> String {
        format!("{}/v1", self.server.uri())
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    pub async fn received_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or_default()
    }

    /// Body of the first request the server saw
    pub async fn first_request_body(&self) -> Value {
        let requests = self.server.received_requests().await.unwrap_or_default();
        let request = requests.first().expect("no request received");
        serde_json::from_slice(&request.body).expect("request body is not JSON")
    }

    /// Mock a streaming OpenAI-compatible response
    pub async fn mock_openai_stream(&self, parts: &[&str]) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", format!("Bearer {}", TEST_API_KEY).as_str()))
            .and(body_partial_json(json!({ "stream": true })))
            .respond_with(sse_response(openai_sse_body(parts)))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Mock a streaming Anthropic response
    pub async fn mock_anthropic_stream(&self, parts: &[&str]) {
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", TEST_ANTHROPIC_KEY))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({ "stream": true, "max_tokens": 4096 })))
            .respond_with(sse_response(anthropic_sse_body(parts)))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Mock a raw SSE body on `endpoint`
    pub async fn mock_raw_stream(&self, endpoint: &str, body: String) {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(sse_response(body))
            .mount(&self.server)
            .await;
    }

    /// Mock an error status with a raw body
    pub async fn mock_error(&self, endpoint: &str, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Mock a response that only arrives after `delay`
    pub async fn mock_slow_openai(&self, delay: Duration) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(sse_response(openai_sse_body(&["late"])).set_delay(delay))
            .mount(&self.server)
            .await;
    }

    /// Fail the test if any request reaches the server
    pub async fn expect_no_requests(&self) {
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.server)
            .await;
    }

    /// Mock a non-streaming OpenAI completion carrying `tool_calls`
    pub async fn mock_openai_tool_calls(&self, calls: Value) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", format!("Bearer {}", TEST_API_KEY).as_str()))
            .and(body_partial_json(json!({ "tool_choice": "auto" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl_test123",
                "object": "chat.completion",
                "created": 1700000000,
                "model": "gpt-4o",
                "choices": [{
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": calls
                    },
                    "finish_reason": "tool_calls"
                }]
            })))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Mock a non-streaming OpenAI completion with plain text only
    pub async fn mock_openai_text_reply(&self, text: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": text },
                    "finish_reason": "stop"
                }]
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock a non-streaming Anthropic messages body
    pub async fn mock_anthropic_content(&self, content: Value) {
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", TEST_ANTHROPIC_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_test123",
                "type": "message",
                "role": "assistant",
                "content": content,
                "model": "claude-sonnet-4-20250514",
                "stop_reason": "tool_use",
                "usage": { "input_tokens": 10, "output_tokens": 20 }
            })))
            .expect(1)
            .mount(&self.server)
            .await;
    }
}

pub fn sse_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body)
}

pub fn openai_sse_body(parts: &[&str]) -> String {
    let mut body = String::new();
    body.push_str("data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\"}}]}\n\n");
    for part in parts {
        body.push_str(&format!(
            "data: {}\n\n",
            json!({ "choices": [{ "index": 0, "delta": { "content": part } }] })
        ));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

pub fn anthropic_sse_body(parts: &[&str]) -> String {
    let mut body = String::from(
        "event: message_start\ndata: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_1\"}}\n\n\
         event: content_block_start\ndata: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}\n\n",
    );
    for part in parts {
        body.push_str(&format!(
            "event: content_block_delta\ndata: {}\n\n",
            json!({ "type": "content_block_delta", "index": 0, "delta": { "type": "text_delta", "text": part } })
        ));
    }
    body.push_str("event: content_block_stop\ndata: {\"type\":\"content_block_stop\",\"index\":0}\n\n");
    body.push_str("event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n");
    body
}

pub fn openai_settings(server: &LlmMockServer) -> Settings {
    Settings {
        api_key: Some(TEST_API_KEY.to_string()),
        base_url: Some(server.base_url()),
        model_id: None,
        preferred_backend: None,
    }
}

pub fn anthropic_settings(server: &LlmMockServer) -> Settings {
    Settings {
        api_key: Some(TEST_ANTHROPIC_KEY.to_string()),
        base_url: Some(server.base_url()),
        model_id: None,
        preferred_backend: None,
    }
}

/// Nothing listens on port 1, so every connection attempt is refused
pub fn unreachable_openai_settings() -> Settings {
    Settings {
        api_key: Some(TEST_API_KEY.to_string()),
        base_url: Some("http://127.0.0.1:1/v1".to_string()),
        model_id: None,
        preferred_backend: None,
    }
}

pub fn client_with(settings: Settings) -> CompletionClient {
    CompletionClient::new(Arc::new(settings))
}

pub fn host_model(id: &str) -> HostModelInfo {
    HostModelInfo {
        id: id.to_string(),
        vendor: "copilot".to_string(),
        family: "gpt-4o".to_string(),
        name: format!("Host {}", id),
    }
}

/// Host provider with a fixed model list and a scripted reply
pub struct ScriptedHost {
    pub models: Vec<HostModelInfo>,
    pub chunks: Vec<String>,
    pub chunk_delay: Duration,
    pub list_delay: Duration,
    pub requests: Mutex<Vec<(String, Vec<HostMessage>)>>,
}

impl ScriptedHost {
    pub fn new(models: Vec<HostModelInfo>, chunks: &[&str]) -> Self {
        Self {
            models,
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            chunk_delay: Duration::ZERO,
            list_delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<(String, Vec<HostMessage>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HostModelProvider for ScriptedHost {
    async fn list_models(&self) -> anyhow::Result<Vec<HostModelInfo>> {
        if !self.list_delay.is_zero() {
            tokio::time::sleep(self.list_delay).await;
        }
        Ok(self.models.clone())
    }

    async fn send_request(
        &self,
        model_id: &str,
        messages: Vec<HostMessage>,
        _cancel: CancellationToken,
    ) -> anyhow::Result<BoxStream<'static, anyhow::Result<String>>> {
        self.requests
            .lock()
            .unwrap()
            .push((model_id.to_string(), messages));

        let chunks = self.chunks.clone();
        let delay = self.chunk_delay;
        Ok(Box::pin(async_stream::stream! {
            for chunk in chunks {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                yield Ok(chunk);
            }
        }))
    }
}

/// Host provider whose every call fails
pub struct FailingHost;

#[async_trait]
impl HostModelProvider for FailingHost {
    async fn list_models(&self) -> anyhow::Result<Vec<HostModelInfo>> {
        Err(anyhow::anyhow!("host model service unavailable"))
    }

    async fn send_request(
        &self,
        _model_id: &str,
        _messages: Vec<HostMessage>,
        _cancel: CancellationToken,
    ) -> anyhow::Result<BoxStream<'static, anyhow::Result<String>>> {
        Err(anyhow::anyhow!("host model service unavailable"))
    }
}
