use std::sync::Arc;

use specforge_models::{BackendKind, HostModelInfo};

use crate::client::{
    AnthropicBackend, CompletionBackend, HostModelBackend, HostModelProvider, OpenAiBackend,
};
use crate::config::{ClientOptions, ProviderConfig};
use crate::error::{CompletionError, Result};

/// Client factory for creating backend strategies
pub struct ClientFactory;

impl ClientFactory {
    /// Create the backend for a directly configured provider
    ///
    /// # Arguments
    /// * `config` - Resolved provider configuration; its `backend_kind` picks the protocol
    /// * `options` - Client tunables (max tokens, request dumps, verbosity)
    /// * `client` - Shared HTTP client; cloning it shares the connection pool
    pub fn create_direct(
        config: ProviderConfig,
        options: ClientOptions,
        client: reqwest::Client,
    ) -> Result<Arc<dyn CompletionBackend>> {
        match config.backend_kind {
            BackendKind::Anthropic => Ok(Arc::new(AnthropicBackend::new(config, options, client))),
            BackendKind::OpenAICompatible => Ok(Arc::new(OpenAiBackend::new(config, options, client))),
            BackendKind::HostModel => Err(CompletionError::Configuration(
                "the host model is not a direct backend".to_string(),
            )),
        }
    }

    /// Create the backend for a host model
    pub fn create_host(
        provider: Arc<dyn HostModelProvider>,
        model: HostModelInfo,
    ) -> Arc<dyn CompletionBackend> {
        Arc::new(HostModelBackend::new(provider, model))
    }
}
