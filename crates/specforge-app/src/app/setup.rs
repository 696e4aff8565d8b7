use anyhow::{bail, Result};
use std::sync::Arc;

use specforge_llm_api::{BackendKind, ClientOptions, CompletionClient, Settings};

use crate::cli::Cli;

/// Client configuration derived from CLI arguments and environment
pub struct AppConfig {
    pub settings: Settings,
    pub options: ClientOptions,
}

/// Set up application configuration from CLI arguments.
///
/// Precedence: CLI flags > SPECFORGE_* env (both through clap) > provider
/// key variables read by [`Settings::from_env`].
pub fn setup_from_cli(cli: &Cli) -> Result<AppConfig> {
    let env_settings = Settings::from_env();

    let preferred_backend = match cli.backend.as_deref() {
        Some(name) => match BackendKind::parse(name) {
            Some(kind) => Some(kind),
            None => bail!("unknown backend '{}': expected openai or anthropic", name),
        },
        None => env_settings.preferred_backend,
    };

    let settings = Settings {
        api_key: cli.api_key.clone().or(env_settings.api_key),
        base_url: cli.base_url.clone().or(env_settings.base_url),
        model_id: cli.model.clone().or(env_settings.model_id),
        preferred_backend,
    };

    let options = ClientOptions {
        verbose: cli.verbose,
        log_requests: cli.log_requests,
        ..ClientOptions::default()
    };

    Ok(AppConfig { settings, options })
}

impl AppConfig {
    pub fn into_client(self) -> CompletionClient {
        CompletionClient::new(Arc::new(self.settings)).with_options(self.options)
    }
}
