//! Error types for the completion client

use specforge_models::BackendKind;
use thiserror::Error;

/// Longest excerpt of an error body surfaced to callers
pub const ERROR_EXCERPT_CHARS: usize = 300;

/// Message carried by [`CompletionError::Cancelled`]
pub const CANCELLED_MESSAGE: &str = "request cancelled by user";

/// Every failure a completion call can report. Each call reports at most one.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("no language model provider configured: set an API key or enable a host model")]
    NoProvider,

    #[error("invalid provider configuration: {0}")]
    Configuration(String),

    #[error("{backend} request failed: {source}")]
    Transport {
        backend: BackendKind,
        #[source]
        source: reqwest::Error,
    },

    #[error("{backend} API error {status}: {body}")]
    Http {
        backend: BackendKind,
        status: u16,
        /// Response body, truncated to [`ERROR_EXCERPT_CHARS`]
        body: String,
    },

    #[error("{backend} stream error: {message}")]
    Stream {
        backend: BackendKind,
        message: String,
    },

    #[error("host model error: {0}")]
    Host(String),

    #[error("{backend} returned an invalid response: {message}")]
    InvalidResponse {
        backend: BackendKind,
        message: String,
    },

    #[error("{}", CANCELLED_MESSAGE)]
    Cancelled,
}

impl CompletionError {
    /// True for user-initiated cancellation, which callers must not retry
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Build an HTTP error, bounding the body excerpt
    pub fn http(backend: BackendKind, status: u16, body: &str) -> Self {
        Self::Http {
            backend,
            status,
            body: specforge_logging::safe_truncate(body.trim(), ERROR_EXCERPT_CHARS),
        }
    }

    pub(crate) fn transport(backend: BackendKind, source: reqwest::Error) -> Self {
        Self::Transport { backend, source }
    }

    pub(crate) fn host(err: anyhow::Error) -> Self {
        Self::Host(format!("{:#}", err))
    }
}

/// Result type alias for completion operations
pub type Result<T> = std::result::Result<T, CompletionError>;
