// Models module - data structures shared by the completion client and its callers
pub mod types;
pub mod tools;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use types::{BackendKind, HostModelInfo, ModelDescriptor};
pub use tools::{
    ParameterSchema, ParameterType, ProposedChange, ToolCall, ToolDefinition, ToolParameter,
};
pub use requests::{AnthropicRequest, AnthropicTool, ChatRequest, FunctionDef, Message, Tool};
pub use responses::{
    AnthropicResponse, AnthropicStreamEvent, ChatResponse, ContentBlock, StreamChunk,
};
