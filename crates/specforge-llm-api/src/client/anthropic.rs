use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};

use specforge_models::{
    AnthropicRequest, AnthropicResponse, AnthropicTool, BackendKind, ContentBlock, Message,
    ToolCall, ToolDefinition,
};

use crate::cancel::CancellationToken;
use crate::client::http::{post_json, read_json, Dispatch};
use crate::client::{CompletionBackend, CompletionRequest, TextStream};
use crate::config::{ClientOptions, ProviderConfig, ANTHROPIC_VERSION};
use crate::error::{CompletionError, Result};
use crate::sse::{decode_text_stream, AnthropicDialect};

const API_KEY_HEADER: &str = "x-api-key";
const VERSION_HEADER: &str = "anthropic-version";

/// Anthropic backend using the native messages API
pub struct AnthropicBackend {
    config: ProviderConfig,
    options: ClientOptions,
    client: reqwest::Client,
}

impl AnthropicBackend {
    pub fn new(config: ProviderConfig, options: ClientOptions, client: reqwest::Client) -> Self {
        Self {
            config,
            options,
            client,
        }
    }

    fn get_messages_url(&self) -> String {
        format!("{}/messages", self.config.base_url)
    }

    fn headers(&self, streaming: bool) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.config.api_key).map_err(|_| {
            CompletionError::Configuration("API key contains characters not allowed in a header".to_string())
        })?;
        headers.insert(HeaderName::from_static(API_KEY_HEADER), key);
        headers.insert(
            HeaderName::from_static(VERSION_HEADER),
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        if streaming {
            headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        }
        Ok(headers)
    }

    fn build_messages_request(
        &self,
        request: &CompletionRequest,
        tools: &[ToolDefinition],
        streaming: bool,
    ) -> AnthropicRequest {
        // The system prompt is a top-level field, not a message
        AnthropicRequest {
            model: self.config.model_id.clone(),
            max_tokens: self.options.max_tokens,
            stream: streaming.then_some(true),
            system: request.system.clone(),
            messages: vec![Message::user(&request.user)],
            tools: tools.iter().map(AnthropicTool::from).collect(),
        }
    }

    fn dispatch<'a>(
        &'a self,
        body: &'a AnthropicRequest,
        headers: HeaderMap,
    ) -> Dispatch<'a, AnthropicRequest> {
        Dispatch {
            client: &self.client,
            backend: BackendKind::Anthropic,
            url: self.get_messages_url(),
            headers,
            auth_header: API_KEY_HEADER,
            api_key: &self.config.api_key,
            model: &self.config.model_id,
            body,
            options: &self.options,
        }
    }
}

/// Keep the `tool_use` blocks of a messages body; their input is already structured
pub fn extract_tool_calls(response: AnthropicResponse) -> Vec<ToolCall> {
    response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::ToolUse { name, input, .. } => {
                Some(ToolCall::from_json_arguments(&name, &input))
            }
            _ => None,
        })
        .collect()
}

#[async_trait]
impl CompletionBackend for AnthropicBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Anthropic
    }

    fn model_id(&self) -> &str {
        &self.config.model_id
    }

    async fn stream(&self, request: &CompletionRequest, cancel: &CancellationToken) -> Result<TextStream> {
        let body = self.build_messages_request(request, &[], true);
        let response = post_json(self.dispatch(&body, self.headers(true)?), cancel).await?;

        Ok(decode_text_stream(
            response.bytes_stream(),
            AnthropicDialect,
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
        let body = self.build_messages_request(request, tools, false);
        let response = post_json(self.dispatch(&body, self.headers(false)?), cancel).await?;

        let messages_response: AnthropicResponse = read_json(self.kind(), response, cancel).await?;
        Ok(extract_tool_calls(messages_response))
    }
}
