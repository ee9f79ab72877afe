use std::path::PathBuf;

use crate::constants::DEFAULT_SYMBOL;

/// Read a non-empty, trimmed environment variable
fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Get instrument symbol from environment variable or use default
pub fn get_symbol() -> String {
    env_non_empty("CHIPBOARD_SYMBOL").unwrap_or_else(|| DEFAULT_SYMBOL.to_string())
}

/// Get webhook endpoint from environment variable
pub fn get_webhook_endpoint() -> Option<String> {
    env_non_empty("DISCORD_WEBHOOK")
}

/// Get output directory from environment variable or use default
pub fn get_output_dir() -> PathBuf {
    env_non_empty("CHIPBOARD_OUTPUT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the breadth page URL template from environment variable
pub fn get_breadth_url() -> Option<String> {
    env_non_empty("CHIPBOARD_BREADTH_URL")
}
