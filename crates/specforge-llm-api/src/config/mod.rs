use std::env;
use std::sync::RwLock;
use std::time::Duration;

use specforge_models::BackendKind;

pub mod factory;
pub use factory::ClientFactory;

/// Default OpenAI API base URL
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Default Anthropic API base URL
pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";

/// Version header value sent to Anthropic
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Key prefix issued by Anthropic
pub const ANTHROPIC_KEY_PREFIX: &str = "sk-ant-";

/// Default model ids when settings carry none
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_HOST_ENUMERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Externally owned settings, read at the start of every call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model_id: Option<String>,
    /// Persisted backend preference, used when the client has no pin of its own
    pub preferred_backend: Option<BackendKind>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Settings {
    /// Read settings from the environment.
    ///
    /// `SPECFORGE_API_KEY` wins over `ANTHROPIC_API_KEY`, which wins over
    /// `OPENAI_API_KEY`. Empty values count as unset.
    pub fn from_env() -> Self {
        let api_key = non_empty(env::var("SPECFORGE_API_KEY").ok())
            .or_else(|| non_empty(env::var("ANTHROPIC_API_KEY").ok()))
            .or_else(|| non_empty(env::var("OPENAI_API_KEY").ok()));

        Self {
            api_key,
            base_url: non_empty(env::var("SPECFORGE_BASE_URL").ok()),
            model_id: non_empty(env::var("SPECFORGE_MODEL").ok()),
            preferred_backend: env::var("SPECFORGE_BACKEND")
                .ok()
                .and_then(|s| BackendKind::parse(&s)),
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    pub fn model_id(&self) -> Option<&str> {
        self.model_id
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

/// Anything that can hand out the current settings
pub trait SettingsSource: Send + Sync {
    fn settings(&self) -> Settings;
}

impl SettingsSource for Settings {
    fn settings(&self) -> Settings {
        self.clone()
    }
}

impl SettingsSource for RwLock<Settings> {
    fn settings(&self) -> Settings {
        match self.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Credentials and target of the directly configured backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub model_id: String,
    pub backend_kind: BackendKind,
}

/// Tunables of a [`crate::CompletionClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// `max_tokens` sent to Anthropic
    pub max_tokens: u32,
    /// Trace every raw SSE payload
    pub verbose: bool,
    /// Dump direct requests and failed responses to the logs directory
    pub log_requests: bool,
    /// Upper bound on host model enumeration
    pub host_enumeration_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            verbose: false,
            log_requests: false,
            host_enumeration_timeout: DEFAULT_HOST_ENUMERATION_TIMEOUT,
        }
    }
}

/// Get the default base URL for a direct backend
pub fn get_default_url_for_backend(backend: BackendKind) -> Option<&'static str> {
    match backend {
        BackendKind::OpenAICompatible => Some(OPENAI_API_URL),
        BackendKind::Anthropic => Some(ANTHROPIC_API_URL),
        BackendKind::HostModel => None,
    }
}

/// Get the default model id for a direct backend
pub fn get_default_model_for_backend(backend: BackendKind) -> Option<&'static str> {
    match backend {
        BackendKind::OpenAICompatible => Some(DEFAULT_OPENAI_MODEL),
        BackendKind::Anthropic => Some(DEFAULT_ANTHROPIC_MODEL),
        BackendKind::HostModel => None,
    }
}

/// Normalize a base URL: trim whitespace and trailing slashes, and strip an
/// endpoint path pasted in place of the base.
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().trim_end_matches('/');
    for suffix in ["/chat/completions", "/messages"] {
        if let Some(stripped) = url.strip_suffix(suffix) {
            url = stripped.trim_end_matches('/');
        }
    }
    url.to_string()
}

fn url_looks_anthropic(url: &str) -> bool {
    url.to_lowercase().contains("anthropic")
}

/// Infer the direct backend from the base URL and key shape.
///
/// An Anthropic-looking URL or an `sk-ant-` key selects Anthropic; anything
/// else is treated as OpenAI-compatible. When the key says Anthropic but an
/// explicit base URL does not, the key wins and the conflict is logged.
pub fn detect_backend_kind(api_key: &str, base_url: Option<&str>) -> BackendKind {
    if base_url.is_some_and(url_looks_anthropic) {
        return BackendKind::Anthropic;
    }

    if api_key.trim().starts_with(ANTHROPIC_KEY_PREFIX) {
        if let Some(url) = base_url {
            tracing::warn!(
                base_url = url,
                "API key looks like an Anthropic key but the base URL does not; using Anthropic. \
                 Pin a backend explicitly to override"
            );
        }
        return BackendKind::Anthropic;
    }

    BackendKind::OpenAICompatible
}

/// Derive the direct backend configuration from settings.
///
/// Returns `None` when no API key is present: there is no direct backend and
/// callers fall back to the host model. A pinned direct backend takes
/// priority over detection.
pub fn resolve_provider_config(
    settings: &Settings,
    pinned: Option<BackendKind>,
) -> Option<ProviderConfig> {
    let api_key = settings.api_key()?;

    let backend_kind = match pinned {
        Some(kind) if kind.is_direct() => kind,
        _ => detect_backend_kind(api_key, settings.base_url()),
    };

    let base_url = settings
        .base_url()
        .or_else(|| get_default_url_for_backend(backend_kind))
        .map(normalize_base_url)?;

    let model_id = settings
        .model_id()
        .or_else(|| get_default_model_for_backend(backend_kind))?
        .to_string();

    Some(ProviderConfig {
        api_key: api_key.to_string(),
        base_url,
        model_id,
        backend_kind,
    })
}
