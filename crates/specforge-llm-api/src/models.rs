//! Model enumeration across the host and the directly configured backend

use std::time::Duration;

use specforge_models::{HostModelInfo, ModelDescriptor};

use crate::client::HostModelProvider;
use crate::config::ProviderConfig;

/// Ask the host for its models.
///
/// Errors and timeouts both count as "no host models"; enumeration never
/// fails.
pub async fn enumerate_host_models(
    host: &dyn HostModelProvider,
    timeout: Duration,
) -> Vec<HostModelInfo> {
    match tokio::time::timeout(timeout, host.list_models()).await {
        Ok(Ok(models)) => models,
        Ok(Err(e)) => {
            tracing::warn!(error = %format!("{:#}", e), "host model enumeration failed");
            Vec::new()
        }
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "host model enumeration timed out");
            Vec::new()
        }
    }
}

/// Host descriptors first, then one synthetic descriptor for the direct backend
pub async fn list_available_models(
    host: Option<&dyn HostModelProvider>,
    direct: Option<&ProviderConfig>,
    timeout: Duration,
) -> Vec<ModelDescriptor> {
    let mut models = Vec::new();

    if let Some(host) = host {
        models.extend(
            enumerate_host_models(host, timeout)
                .await
                .iter()
                .map(ModelDescriptor::from_host),
        );
    }

    if let Some(config) = direct {
        models.push(ModelDescriptor::direct(&config.model_id, config.backend_kind));
    }

    models
}
