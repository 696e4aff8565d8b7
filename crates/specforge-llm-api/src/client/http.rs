//! Dispatch path shared by the two direct backends

use reqwest::header::HeaderMap;
use serde::Serialize;

use specforge_logging::{get_logs_dir, log_request_to_file, log_response_to_file, RequestSummary};
use specforge_models::BackendKind;

use crate::cancel::{run_cancellable, CancellationToken};
use crate::config::ClientOptions;
use crate::error::{CompletionError, Result};

pub(crate) struct Dispatch<'a, T: Serialize> {
    pub client: &'a reqwest::Client,
    pub backend: BackendKind,
    pub url: String,
    pub headers: HeaderMap,
    /// Header name holding the credential, for request dumps
    pub auth_header: &'a str,
    pub api_key: &'a str,
    pub model: &'a str,
    pub body: &'a T,
    pub options: &'a ClientOptions,
}

/// POST a JSON body and return the response once it has a success status.
///
/// A non-success status becomes [`CompletionError::Http`] with a bounded
/// excerpt of the body. Both the send and the error-body read race `cancel`.
pub(crate) async fn post_json<T: Serialize>(
    dispatch: Dispatch<'_, T>,
    cancel: &CancellationToken,
) -> Result<reqwest::Response> {
    let request_timestamp = if dispatch.options.log_requests {
        dump_request(&dispatch)
    } else {
        None
    };

    tracing::debug!(
        backend = dispatch.backend.as_str(),
        url = %dispatch.url,
        model = dispatch.model,
        "dispatching request"
    );

    let send = dispatch
        .client
        .post(&dispatch.url)
        .headers(dispatch.headers)
        .header("Content-Type", "application/json")
        .json(dispatch.body)
        .send();

    let response = run_cancellable(cancel, send)
        .await?
        .map_err(|e| CompletionError::transport(dispatch.backend, e))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = run_cancellable(cancel, response.text())
        .await?
        .unwrap_or_else(|_| "Unable to read error body".to_string());

    if let Some(timestamp) = request_timestamp {
        if let Err(e) = get_logs_dir()
            .and_then(|dir| log_response_to_file(&dir, status, &body, timestamp, dispatch.model))
        {
            tracing::debug!(error = %e, "could not write response log");
        }
    }

    tracing::debug!(backend = dispatch.backend.as_str(), status = status.as_u16(), "request rejected");
    Err(CompletionError::http(dispatch.backend, status.as_u16(), &body))
}

fn dump_request<T: Serialize>(dispatch: &Dispatch<'_, T>) -> Option<i64> {
    let body = serde_json::to_value(dispatch.body).ok()?;
    let summary = RequestSummary {
        url: &dispatch.url,
        backend: dispatch.backend.as_str(),
        model: dispatch.model,
        auth_header: dispatch.auth_header,
        api_key: dispatch.api_key,
        body: &body,
    };

    match get_logs_dir().and_then(|dir| log_request_to_file(&dir, &summary)) {
        Ok(timestamp) => Some(timestamp),
        Err(e) => {
            tracing::debug!(error = %e, "could not write request log");
            None
        }
    }
}

/// Read a full JSON body, racing `cancel`
pub(crate) async fn read_json<R: serde::de::DeserializeOwned>(
    backend: BackendKind,
    response: reqwest::Response,
    cancel: &CancellationToken,
) -> Result<R> {
    let text = run_cancellable(cancel, response.text())
        .await?
        .map_err(|e| CompletionError::transport(backend, e))?;

    serde_json::from_str(&text).map_err(|e| CompletionError::InvalidResponse {
        backend,
        message: e.to_string(),
    })
}
