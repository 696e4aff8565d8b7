use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::safe_truncate;

/// What gets written into a request dump
#[derive(Debug, Clone, Copy)]
pub struct RequestSummary<'a> {
    pub url: &'a str,
    pub backend: &'a str,
    pub model: &'a str,
    /// Name of the header carrying the credential (`Authorization`, `x-api-key`)
    pub auth_header: &'a str,
    pub api_key: &'a str,
    pub body: &'a serde_json::Value,
}

/// Show only the first 10 characters of a credential
pub fn redact_key(api_key: &str) -> String {
    format!("{}***", api_key.chars().take(10).collect::<String>())
}

fn file_safe_model(model: &str) -> String {
    model.replace(['/', ':', '\\'], "-")
}

/// Log an HTTP request to a file in `logs_dir` for persistent debugging.
///
/// Returns the timestamp used in the file name so the matching response dump
/// can share it.
pub fn log_request_to_file(logs_dir: &Path, request: &RequestSummary<'_>) -> Result<i64> {
    let now = chrono::Utc::now();
    let timestamp = now.timestamp();

    let filename = format!("req-{}-{}.txt", timestamp, file_safe_model(request.model));
    let file_path = logs_dir.join(&filename);

    let mut log_content = String::new();
    log_content.push_str("HTTP REQUEST LOG\n");
    log_content.push_str("================\n\n");
    log_content.push_str(&format!("Timestamp: {} ({})\n", timestamp, now.to_rfc3339()));
    log_content.push_str(&format!("Backend: {}\n", request.backend));
    log_content.push_str(&format!("Model: {}\n\n", request.model));

    // Parse URL to show host and port
    if let Ok(parsed_url) = reqwest::Url::parse(request.url) {
        log_content.push_str(&format!("URL: {}\n", request.url));
        log_content.push_str(&format!("Host: {}\n", parsed_url.host_str().unwrap_or("unknown")));
        log_content.push_str(&format!(
            "Port: {}\n",
            parsed_url.port().map(|p| p.to_string()).unwrap_or_else(|| {
                if parsed_url.scheme() == "https" {
                    "443 (default)".to_string()
                } else {
                    "80 (default)".to_string()
                }
            })
        ));
        log_content.push_str(&format!("Scheme: {}\n\n", parsed_url.scheme()));
    } else {
        log_content.push_str(&format!("URL: {}\n\n", request.url));
    }

    log_content.push_str("Headers:\n");
    log_content.push_str("  Content-Type: application/json\n");
    if request.auth_header.eq_ignore_ascii_case("authorization") {
        log_content.push_str(&format!("  Authorization: Bearer {}\n\n", redact_key(request.api_key)));
    } else {
        log_content.push_str(&format!("  {}: {}\n\n", request.auth_header, redact_key(request.api_key)));
    }

    log_content.push_str("Request Body:\n");
    match serde_json::to_string_pretty(request.body) {
        Ok(json) => {
            log_content.push_str(&json);
            log_content.push('\n');
        }
        Err(e) => {
            log_content.push_str(&format!("Error serializing request: {}\n", e));
        }
    }

    fs::write(&file_path, log_content)
        .with_context(|| format!("Failed to write request log to {}", file_path.display()))?;

    tracing::debug!(file = %file_path.display(), "request logged");

    Ok(timestamp)
}

/// Log an HTTP response to a file next to its request dump
pub fn log_response_to_file(
    logs_dir: &Path,
    status: reqwest::StatusCode,
    body: &str,
    request_timestamp: i64,
    model: &str,
) -> Result<PathBuf> {
    let filename = format!("resp-{}-{}.txt", request_timestamp, file_safe_model(model));
    let file_path = logs_dir.join(filename);

    let mut log_content = String::new();
    log_content.push_str("HTTP RESPONSE LOG\n");
    log_content.push_str("=================\n\n");
    log_content.push_str(&format!("Timestamp: {}\n", request_timestamp));
    log_content.push_str(&format!("Model: {}\n\n", model));
    log_content.push_str(&format!(
        "Status: {} {}\n\n",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    ));

    log_content.push_str("Response Body:\n");
    // Try to pretty-print JSON, fall back to raw text
    match serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
    {
        Some(pretty) => log_content.push_str(&pretty),
        None => log_content.push_str(body),
    }
    log_content.push('\n');

    log_content.push_str("\n---\n");
    log_content.push_str(&format!("Response Size: {} bytes\n", body.len()));

    fs::write(&file_path, log_content)
        .with_context(|| format!("Failed to write response log to {}", file_path.display()))?;

    tracing::debug!(file = %file_path.display(), "response logged");

    Ok(file_path)
}

/// Trace a raw SSE payload in verbose mode
pub fn log_stream_chunk(chunk_num: usize, data: &str, verbose: bool) {
    if !verbose {
        return;
    }

    if data.chars().count() > 200 {
        tracing::debug!(chunk = chunk_num, bytes = data.len(), "stream frame: {}", safe_truncate(data, 200));
    } else {
        tracing::debug!(chunk = chunk_num, "stream frame: {}", data);
    }
}
