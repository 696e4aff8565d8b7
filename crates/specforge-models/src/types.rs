use serde::{Deserialize, Serialize};
use std::fmt;

/// Request-execution target for one call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BackendKind {
    /// Model capability provided in-process by the embedding host
    HostModel,
    /// Any endpoint speaking the OpenAI chat-completions protocol
    OpenAICompatible,
    /// The Anthropic messages API
    Anthropic,
}

impl BackendKind {
    /// Parse backend kind from a settings or command-line string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "host" | "hostmodel" | "host-model" | "vscode" | "copilot" => Some(Self::HostModel),
            "openai" | "openai-compatible" | "openaicompatible" | "compatible" => {
                Some(Self::OpenAICompatible)
            }
            "anthropic" | "claude" => Some(Self::Anthropic),
            _ => None,
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HostModel => "host",
            Self::OpenAICompatible => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    /// Whether this backend is reached over HTTP rather than through the host
    pub fn is_direct(&self) -> bool {
        !matches!(self, Self::HostModel)
    }

    /// Human readable vendor label used in model pickers
    pub fn vendor_label(&self) -> &'static str {
        match self {
            Self::HostModel => "Host",
            Self::OpenAICompatible => "OpenAI-compatible",
            Self::Anthropic => "Anthropic",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.vendor_label())
    }
}

/// A model as reported by the host model capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostModelInfo {
    pub id: String,
    pub vendor: String,
    pub family: String,
    pub name: String,
}

/// One selectable model, tagged with the backend that serves it.
///
/// Descriptors are built fresh on every enumeration; nothing caches them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub id: String,
    pub vendor_label: String,
    pub family_label: String,
    pub display_name: String,
    pub backend_kind: BackendKind,
}

impl ModelDescriptor {
    pub fn from_host(model: &HostModelInfo) -> Self {
        Self {
            id: model.id.clone(),
            vendor_label: model.vendor.clone(),
            family_label: model.family.clone(),
            display_name: model.name.clone(),
            backend_kind: BackendKind::HostModel,
        }
    }

    /// Synthetic descriptor for the directly configured backend
    pub fn direct(model_id: &str, backend_kind: BackendKind) -> Self {
        Self {
            id: model_id.to_string(),
            vendor_label: backend_kind.vendor_label().to_string(),
            family_label: model_id.to_string(),
            display_name: format!("{} ({})", model_id, backend_kind.vendor_label()),
            backend_kind,
        }
    }
}
