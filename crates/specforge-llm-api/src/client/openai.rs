use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};

use specforge_models::{
    BackendKind, ChatRequest, ChatResponse, Message, Tool, ToolCall, ToolDefinition,
};

use crate::cancel::CancellationToken;
use crate::client::http::{post_json, read_json, Dispatch};
use crate::client::{CompletionBackend, CompletionRequest, TextStream};
use crate::config::{ClientOptions, ProviderConfig};
use crate::error::{CompletionError, Result};
use crate::sse::{decode_text_stream, OpenAiDialect};

/// OpenAI-compatible backend (OpenAI, Groq, llama.cpp server, local proxies)
pub struct OpenAiBackend {
    config: ProviderConfig,
    options: ClientOptions,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(config: ProviderConfig, options: ClientOptions, client: reqwest::Client) -> Self {
        Self {
            config,
            options,
            client,
        }
    }

    fn get_chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn headers(&self, streaming: bool) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.config.api_key)).map_err(|_| {
            CompletionError::Configuration("API key contains characters not allowed in a header".to_string())
        })?;
        headers.insert(AUTHORIZATION, bearer);
        if streaming {
            headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        }
        Ok(headers)
    }

    fn build_chat_request(
        &self,
        request: &CompletionRequest,
        tools: &[ToolDefinition],
        streaming: bool,
    ) -> ChatRequest {
        ChatRequest {
            model: self.config.model_id.clone(),
            messages: vec![Message::system(&request.system), Message::user(&request.user)],
            stream: streaming.then_some(true),
            tools: tools.iter().map(Tool::from).collect(),
            tool_choice: (!tools.is_empty()).then(|| "auto".to_string()),
        }
    }

    fn dispatch<'a>(&'a self, body: &'a ChatRequest, headers: HeaderMap) -> Dispatch<'a, ChatRequest> {
        Dispatch {
            client: &self.client,
            backend: BackendKind::OpenAICompatible,
            url: self.get_chat_completions_url(),
            headers,
            auth_header: "Authorization",
            api_key: &self.config.api_key,
            model: &self.config.model_id,
            body,
            options: &self.options,
        }
    }
}

/// Pull `choices[0].message.tool_calls` out of a completion body.
///
/// Arguments arrive JSON-encoded as a string; an unparsable string yields a
/// call with no arguments rather than failing the whole response.
pub fn extract_tool_calls(response: ChatResponse) -> Vec<ToolCall> {
    let Some(choice) = response.choices.into_iter().next() else {
        return Vec::new();
    };

    choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| {
            let arguments = if call.function.arguments.trim().is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::from_str(&call.function.arguments).unwrap_or_else(|e| {
                    tracing::warn!(tool = %call.function.name, error = %e, "tool arguments are not valid JSON");
                    serde_json::Value::Null
                })
            };
            ToolCall::from_json_arguments(&call.function.name, &arguments)
        })
        .collect()
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::OpenAICompatible
    }

    fn model_id(&self) -> &str {
        &self.config.model_id
    }

    async fn stream(&self, request: &CompletionRequest, cancel: &CancellationToken) -> Result<TextStream> {
        let body = self.build_chat_request(request, &[], true);
        let response = post_json(self.dispatch(&body, self.headers(true)?), cancel).await?;

        Ok(decode_text_stream(
            response.bytes_stream(),
            OpenAiDialect,
            self.kind(),
            self.options.verbose,
        ))
    }

    async fn tool_calls(
        &self,
        request: &CompletionRequest,
        tools: &[ToolDefinition],
        cancel: &CancellationToken,
    ) -> Result<Vec<ToolCall>> {
        let body = self.build_chat_request(request, tools, false);
        let response = post_json(self.dispatch(&body, self.headers(false)?), cancel).await?;

        let chat_response: ChatResponse = read_json(self.kind(), response, cancel).await?;
        Ok(extract_tool_calls(chat_response))
    }
}
