use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::Stream;
use std::pin::Pin;

use specforge_models::{BackendKind, HostModelInfo, ToolCall, ToolDefinition};

use crate::cancel::CancellationToken;
use crate::error::Result;

pub mod anthropic;
pub mod host;
pub(crate) mod http;
pub mod openai;

pub use anthropic::AnthropicBackend;
pub use host::HostModelBackend;
pub use openai::OpenAiBackend;

/// Incremental text of one streaming call
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// System prompt plus user prompt, the only input a call takes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
}

impl CompletionRequest {
    pub fn new(system: &str, user: &str) -> Self {
        Self {
            system: system.to_string(),
            user: user.to_string(),
        }
    }
}

/// One request-execution target.
///
/// Every backend presents the same two operations; the engine picks exactly
/// one backend per call and never switches mid-call.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Model id requests are sent with
    fn model_id(&self) -> &str;

    /// Dispatch a streaming request and return its text deltas.
    ///
    /// Dispatch failures (transport, HTTP status) are returned here; the
    /// returned stream carries only failures that happen after streaming began.
    async fn stream(&self, request: &CompletionRequest, cancel: &CancellationToken)
        -> Result<TextStream>;

    /// Submit a request declaring `tools` and decode the structured calls
    async fn tool_calls(
        &self,
        request: &CompletionRequest,
        tools: &[ToolDefinition],
        cancel: &CancellationToken,
    ) -> Result<Vec<ToolCall>>;
}

/// Role of a message handed to the host model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostMessage {
    pub role: HostRole,
    pub content: String,
}

impl HostMessage {
    pub fn user(content: &str) -> Self {
        Self {
            role: HostRole::User,
            content: content.to_string(),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: HostRole::Assistant,
            content: content.to_string(),
        }
    }
}

/// Model capability provided by the embedding host (an editor, usually).
///
/// Implementations are arbitrary embedder code, so failures are plain
/// `anyhow` errors; the client converts them.
#[async_trait]
pub trait HostModelProvider: Send + Sync {
    /// Models currently available from the host
    async fn list_models(&self) -> anyhow::Result<Vec<HostModelInfo>>;

    /// Send a message exchange to `model_id` and yield generated text
    /// incrementally. Implementations should stop generating once `cancel`
    /// fires.
    async fn send_request(
        &self,
        model_id: &str,
        messages: Vec<HostMessage>,
        cancel: CancellationToken,
    ) -> anyhow::Result<BoxStream<'static, anyhow::Result<String>>>;
}
