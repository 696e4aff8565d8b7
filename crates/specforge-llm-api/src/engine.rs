//! The caller-facing completion client.
//!
//! Every call snapshots the settings and the current model selection, picks
//! exactly one backend from an ordered list of candidates, and runs to
//! completion on that backend alone. Calls share no mutable state, so one
//! client can serve any number of concurrent calls.

use futures::StreamExt;
use std::sync::{Arc, RwLock};

use specforge_models::{BackendKind, ModelDescriptor, ProposedChange, ToolDefinition};

use crate::cancel::{cancellable_stream, run_cancellable, CancellationToken};
use crate::client::{
    CompletionBackend, CompletionRequest, HostModelBackend, HostModelProvider, TextStream,
};
use crate::config::{resolve_provider_config, ClientFactory, ClientOptions, ProviderConfig, Settings, SettingsSource};
use crate::error::{CompletionError, Result};
use crate::models::{enumerate_host_models, list_available_models};
use crate::tools::normalize_tool_calls;

/// Model id and backend the user picked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelSelection {
    pub model_id: Option<String>,
    pub backend: Option<BackendKind>,
}

/// Callback-style consumer of a completion stream
pub trait StreamHandler: Send {
    fn on_chunk(&mut self, text: &str);
    fn on_done(&mut self);
    fn on_error(&mut self, error: &CompletionError);
}

enum Candidate {
    Host(Arc<dyn HostModelProvider>),
    Direct(ProviderConfig),
}

/// Everything one call needs, captured when the call starts
struct CallContext {
    settings: Settings,
    selection: ModelSelection,
    host: Option<Arc<dyn HostModelProvider>>,
    options: ClientOptions,
    http: reqwest::Client,
}

impl CallContext {
    fn pinned_backend(&self) -> Option<BackendKind> {
        self.selection.backend.or(self.settings.preferred_backend)
    }

    fn direct_config(&self) -> Option<ProviderConfig> {
        let pinned = self.pinned_backend();
        let mut config = resolve_provider_config(&self.settings, pinned)?;

        // A model picked for a pinned direct backend overrides the settings model
        if let (Some(kind), Some(model_id)) = (self.selection.backend, &self.selection.model_id) {
            if kind.is_direct() && kind == config.backend_kind {
                config.model_id = model_id.clone();
            }
        }
        Some(config)
    }

    /// Candidates in priority order
    fn plan(&self) -> Vec<Candidate> {
        let direct = self.direct_config();

        // A pinned direct backend is used exclusively
        if self.pinned_backend().is_some_and(|kind| kind.is_direct()) {
            if let Some(config) = direct {
                return vec![Candidate::Direct(config)];
            }
        }

        let mut plan = Vec::new();
        if let Some(host) = &self.host {
            plan.push(Candidate::Host(Arc::clone(host)));
        }
        if let Some(config) = direct {
            plan.push(Candidate::Direct(config));
        }
        plan
    }

    async fn select_backend(&self) -> Result<Arc<dyn CompletionBackend>> {
        for candidate in self.plan() {
            match candidate {
                Candidate::Direct(config) => {
                    return ClientFactory::create_direct(config, self.options.clone(), self.http.clone());
                }
                Candidate::Host(provider) => {
                    let models =
                        enumerate_host_models(provider.as_ref(), self.options.host_enumeration_timeout)
                            .await;
                    let preferred = self.selection.model_id.as_deref();
                    if let Some(model) = HostModelBackend::choose_model(&models, preferred) {
                        return Ok(ClientFactory::create_host(provider, model));
                    }
                    tracing::debug!("host reports no models, trying the next backend");
                }
            }
        }

        Err(CompletionError::NoProvider)
    }
}

/// Uniform streaming and tool-calling client over the host model, an
/// OpenAI-compatible endpoint and the Anthropic API.
pub struct CompletionClient {
    settings: Arc<dyn SettingsSource>,
    host: Option<Arc<dyn HostModelProvider>>,
    options: ClientOptions,
    http: reqwest::Client,
    selection: RwLock<ModelSelection>,
}

impl CompletionClient {
    pub fn new(settings: Arc<dyn SettingsSource>) -> Self {
        Self {
            settings,
            host: None,
            options: ClientOptions::default(),
            http: reqwest::Client::new(),
            selection: RwLock::new(ModelSelection::default()),
        }
    }

    pub fn with_host(mut self, host: Arc<dyn HostModelProvider>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Record the user's model choice; `backend_hint` pins the backend
    pub fn set_selected_model(&self, model_id: &str, backend_hint: Option<BackendKind>) {
        let selection = ModelSelection {
            model_id: Some(model_id.to_string()).filter(|id| !id.trim().is_empty()),
            backend: backend_hint,
        };
        tracing::debug!(model = model_id, backend = ?backend_hint, "model selected");

        match self.selection.write() {
            Ok(mut guard) => *guard = selection,
            Err(poisoned) => *poisoned.into_inner() = selection,
        }
    }

    pub fn clear_selection(&self) {
        match self.selection.write() {
            Ok(mut guard) => *guard = ModelSelection::default(),
            Err(poisoned) => *poisoned.into_inner() = ModelSelection::default(),
        }
    }

    pub fn selected_model(&self) -> ModelSelection {
        match self.selection.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn begin_call(&self) -> CallContext {
        CallContext {
            settings: self.settings.settings(),
            selection: self.selected_model(),
            host: self.host.clone(),
            options: self.options.clone(),
            http: self.http.clone(),
        }
    }

    /// Models selectable right now. Never fails: a failing host contributes
    /// nothing.
    pub async fn list_available_models(&self) -> Vec<ModelDescriptor> {
        let call = self.begin_call();
        let direct = call.direct_config();
        list_available_models(
            call.host.as_deref(),
            direct.as_ref(),
            call.options.host_enumeration_timeout,
        )
        .await
    }

    /// Stream a completion.
    ///
    /// The returned stream yields text chunks as they are decoded and ends
    /// after the last one. A failure is yielded once as the final item;
    /// cancellation is yielded as [`CompletionError::Cancelled`]. Nothing is
    /// dispatched until the stream is first polled.
    pub fn stream_completion(&self, system: &str, user: &str, cancel: CancellationToken) -> TextStream {
        let call = self.begin_call();
        let request = CompletionRequest::new(system, user);

        Box::pin(async_stream::stream! {
            if cancel.is_cancelled() {
                yield Err(CompletionError::Cancelled);
                return;
            }

            let backend = match run_cancellable(&cancel, call.select_backend()).await {
                Ok(Ok(backend)) => backend,
                Ok(Err(e)) | Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            tracing::debug!(backend = backend.kind().as_str(), model = backend.model_id(), "dispatching completion");
            let inner = match backend.stream(&request, &cancel).await {
                Ok(inner) => inner,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            let mut chunks = cancellable_stream(inner, cancel.clone());
            while let Some(item) = chunks.next().await {
                yield item;
            }
            tracing::debug!(backend = backend.kind().as_str(), "completion finished");
        })
    }

    /// Drive [`Self::stream_completion`] into callbacks.
    ///
    /// Exactly one of `on_done`/`on_error` is called, after every chunk.
    pub async fn stream_completion_with<H>(
        &self,
        system: &str,
        user: &str,
        handler: &mut H,
        cancel: CancellationToken,
    ) where
        H: StreamHandler + ?Sized,
    {
        let mut chunks = self.stream_completion(system, user, cancel);
        while let Some(item) = chunks.next().await {
            match item {
                Ok(text) => handler.on_chunk(&text),
                Err(e) => {
                    handler.on_error(&e);
                    return;
                }
            }
        }
        handler.on_done();
    }

    /// Ask the model for structured actions and normalize them.
    ///
    /// Zero actions is a valid result. Unknown tool names degrade to a
    /// file write rather than an error.
    pub async fn request_with_tools(
        &self,
        system: &str,
        user: &str,
        tools: &[ToolDefinition],
        cancel: CancellationToken,
    ) -> Result<Vec<ProposedChange>> {
        if cancel.is_cancelled() {
            return Err(CompletionError::Cancelled);
        }

        let call = self.begin_call();
        let backend = run_cancellable(&cancel, call.select_backend()).await??;

        tracing::debug!(
            backend = backend.kind().as_str(),
            model = backend.model_id(),
            tools = tools.len(),
            "dispatching tool request"
        );

        let request = CompletionRequest::new(system, user);
        let calls = backend.tool_calls(&request, tools, &cancel).await?;
        Ok(normalize_tool_calls(&calls))
    }
}
