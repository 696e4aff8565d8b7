use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;

use specforge_models::{BackendKind, HostModelInfo, ToolCall, ToolDefinition};

use crate::cancel::{cancellable_stream, run_cancellable, CancellationToken};
use crate::client::{CompletionBackend, CompletionRequest, HostMessage, HostModelProvider, TextStream};
use crate::error::{CompletionError, Result};
use crate::tools::{build_host_tool_prompt, parse_host_tool_calls};

/// Backend that runs requests on a model provided by the host
pub struct HostModelBackend {
    provider: Arc<dyn HostModelProvider>,
    model: HostModelInfo,
}

impl HostModelBackend {
    pub fn new(provider: Arc<dyn HostModelProvider>, model: HostModelInfo) -> Self {
        Self { provider, model }
    }

    /// Pick `preferred` if the host exposes it, otherwise the first model
    pub fn choose_model(models: &[HostModelInfo], preferred: Option<&str>) -> Option<HostModelInfo> {
        preferred
            .and_then(|id| models.iter().find(|m| m.id == id))
            .or_else(|| models.first())
            .cloned()
    }
}

#[async_trait]
impl CompletionBackend for HostModelBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::HostModel
    }

    fn model_id(&self) -> &str {
        &self.model.id
    }

    async fn stream(&self, request: &CompletionRequest, cancel: &CancellationToken) -> Result<TextStream> {
        // The host API has no system role; the framing goes in as an assistant turn
        let messages = vec![
            HostMessage::assistant(&request.system),
            HostMessage::user(&request.user),
        ];

        tracing::debug!(model = %self.model.id, "dispatching request to host model");

        let generated = run_cancellable(
            cancel,
            self.provider.send_request(&self.model.id, messages, cancel.clone()),
        )
        .await?
        .map_err(CompletionError::host)?;

        Ok(Box::pin(
            generated
                .map(|item| item.map_err(CompletionError::host))
                .filter(|item| {
                    let keep = !matches!(item, Ok(text) if text.is_empty());
                    futures::future::ready(keep)
                }),
        ))
    }

    async fn tool_calls(
        &self,
        request: &CompletionRequest,
        tools: &[ToolDefinition],
        cancel: &CancellationToken,
    ) -> Result<Vec<ToolCall>> {
        // No native tool calling: describe the tools and ask for a JSON array
        let augmented = CompletionRequest {
            system: build_host_tool_prompt(&request.system, tools),
            user: request.user.clone(),
        };

        let mut generated = cancellable_stream(self.stream(&augmented, cancel).await?, cancel.clone());
        let mut text = String::new();
        while let Some(chunk) = generated.next().await {
            text.push_str(&chunk?);
        }

        Ok(parse_host_tool_calls(&text))
    }
}
