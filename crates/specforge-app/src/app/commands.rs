use anyhow::{Context, Result};
use colored::Colorize;
use futures::StreamExt;
use std::io::Write;

use specforge_llm_api::{builtin_tools, CancellationToken, CompletionClient, CompletionError};
use specforge_models::ModelDescriptor;

/// One picker line for a model
pub fn format_model_line(model: &ModelDescriptor) -> String {
    format!(
        "{:<40} {:<18} {}",
        model.id,
        model.backend_kind.as_str(),
        model.display_name
    )
}

/// Print every selectable model
pub async fn run_models(client: &CompletionClient) -> Result<()> {
    let models = client.list_available_models().await;
    if models.is_empty() {
        println!(
            "{}",
            "No models available. Set SPECFORGE_API_KEY or pass --api-key.".yellow()
        );
        return Ok(());
    }

    for model in &models {
        println!("{}", format_model_line(model));
    }
    Ok(())
}

/// Stream a completion to stdout until it ends or `cancel` fires
pub async fn run_complete(
    client: &CompletionClient,
    system: &str,
    prompt: &str,
    cancel: CancellationToken,
) -> Result<()> {
    let mut stdout = std::io::stdout();
    let mut chunks = client.stream_completion(system, prompt, cancel);

    while let Some(item) = chunks.next().await {
        match item {
            Ok(text) => {
                print!("{}", text);
                stdout.flush().context("failed to flush stdout")?;
            }
            Err(e) if e.is_cancelled() => {
                tracing::debug!("completion cancelled, partial output kept");
                println!();
                eprintln!("{}", e.to_string().bright_black());
                return Ok(());
            }
            Err(e) => {
                println!();
                return Err(e).context("completion failed");
            }
        }
    }

    println!();
    Ok(())
}

/// Run the tool-call cycle and print the proposed changes as JSON
pub async fn run_propose(
    client: &CompletionClient,
    system: &str,
    prompt: &str,
    pretty: bool,
    cancel: CancellationToken,
) -> Result<()> {
    let changes = match client
        .request_with_tools(system, prompt, &builtin_tools(), cancel)
        .await
    {
        Ok(changes) => changes,
        Err(CompletionError::Cancelled) => {
            tracing::debug!("tool request cancelled before any change was proposed");
            eprintln!("{}", CompletionError::Cancelled.to_string().bright_black());
            return Ok(());
        }
        Err(e) => return Err(e).context("tool request failed"),
    };

    tracing::debug!(changes = changes.len(), "tool request finished");
    let json = if pretty {
        serde_json::to_string_pretty(&changes)?
    } else {
        serde_json::to_string(&changes)?
    };
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use specforge_llm_api::Settings;
    use specforge_models::BackendKind;
    use std::sync::Arc;

    #[test]
    fn test_format_model_line() {
        let model = ModelDescriptor::direct("gpt-4o", BackendKind::OpenAICompatible);
        let line = format_model_line(&model);

        assert!(line.starts_with("gpt-4o "));
        assert!(line.contains(" openai "));
        assert!(line.ends_with("gpt-4o (OpenAI-compatible)"));
    }

    #[tokio::test]
    async fn test_cancelled_commands_end_quietly() {
        let client = CompletionClient::new(Arc::new(Settings::default()));
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(run_complete(&client, "", "hi", cancel.clone()).await.is_ok());
        assert!(run_propose(&client, "", "hi", false, cancel).await.is_ok());
    }

    #[tokio::test]
    async fn test_propose_without_provider_fails() {
        let client = CompletionClient::new(Arc::new(Settings::default()));
        let error = run_propose(&client, "", "hi", false, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(error.to_string().contains("tool request failed"));
    }
}
