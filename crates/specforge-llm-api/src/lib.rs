//! # specforge-llm-api
//!
//! One completion client over three kinds of LLM backend:
//! - a model provided by the embedding host (an editor, usually)
//! - any OpenAI-compatible chat completions endpoint
//! - the Anthropic messages API
//!
//! ## Features
//!
//! - **Streaming**: text deltas decoded from server-sent events as they arrive
//! - **Tool calls**: structured file writes, edits and commands, normalized
//!   across backends
//! - **Cancellation**: one token aborts dispatch, streaming and tool cycles
//! - **Provider auto-detection**: backend inferred from the base URL and key
//!   shape, with an explicit pin as the override
//!
//! ## Example
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use std::sync::Arc;
//! use specforge_llm_api::{CancellationToken, CompletionClient, Settings};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings {
//!         api_key: Some("your-api-key".to_string()),
//!         ..Settings::default()
//!     };
//!     let client = CompletionClient::new(Arc::new(settings));
//!
//!     let mut chunks = client.stream_completion(
//!         "You are a concise technical writer.",
//!         "Describe a rate limiter.",
//!         CancellationToken::new(),
//!     );
//!     while let Some(chunk) = chunks.next().await {
//!         print!("{}", chunk?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod sse;
pub mod tools;

#[cfg(test)]
mod tests;

pub use cancel::{cancellable_stream, run_cancellable, CancellationToken};
pub use client::{
    AnthropicBackend, CompletionBackend, CompletionRequest, HostMessage, HostModelBackend,
    HostModelProvider, HostRole, OpenAiBackend, TextStream,
};
pub use config::{
    detect_backend_kind, normalize_base_url, resolve_provider_config, ClientFactory,
    ClientOptions, ProviderConfig, Settings, SettingsSource,
};
pub use engine::{CompletionClient, ModelSelection, StreamHandler};
pub use error::{CompletionError, Result};
pub use models::{enumerate_host_models, list_available_models};
pub use sse::{decode_text_stream, AnthropicDialect, OpenAiDialect, SseDecoder, SseDialect, SseEvent};
pub use tools::{builtin_tools, normalize_tool_call, normalize_tool_calls, parse_host_tool_calls};

pub use specforge_models::{
    BackendKind, HostModelInfo, ModelDescriptor, ParameterSchema, ParameterType, ProposedChange,
    ToolCall, ToolDefinition,
};
