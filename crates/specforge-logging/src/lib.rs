// Logging module - request dumps and stream tracing for the completion client
pub mod request_logger;

use std::path::PathBuf;
use anyhow::{Result, Context};

// Re-export request logging functions
pub use request_logger::{
    RequestSummary,
    log_request_to_file,
    log_response_to_file,
    log_stream_chunk,
    redact_key,
};

/// Safely truncate a string to a maximum number of characters
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        // Reserve space for "..." suffix
        let trunc_chars = max_chars.saturating_sub(3);
        format!("{}...", s.chars().take(trunc_chars).collect::<String>())
    }
}

/// Get or create the base specforge directory (~/.specforge)
pub fn get_specforge_dir() -> Result<PathBuf> {
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Failed to get home directory")?;

    let specforge_dir = PathBuf::from(home_dir).join(".specforge");

    if !specforge_dir.exists() {
        std::fs::create_dir_all(&specforge_dir)
            .context("Failed to create specforge directory")?;
    }

    Ok(specforge_dir)
}

/// Get or create the logs directory (~/.specforge/logs)
pub fn get_logs_dir() -> Result<PathBuf> {
    let logs_dir = get_specforge_dir()?.join("logs");

    if !logs_dir.exists() {
        std::fs::create_dir_all(&logs_dir)
            .context("Failed to create logs directory")?;
    }

    Ok(logs_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_truncate_short_string_untouched() {
        assert_eq!(safe_truncate("bad key", 300), "bad key");
    }

    #[test]
    fn test_safe_truncate_counts_chars_not_bytes() {
        let s = "é".repeat(10);
        let truncated = safe_truncate(&s, 5);
        assert_eq!(truncated, "éé...");
        assert_eq!(truncated.chars().count(), 5);
    }

    #[test]
    fn test_safe_truncate_tiny_limit() {
        assert_eq!(safe_truncate("abcdef", 2), "...");
    }
}
