//! Structured logging and secret hygiene.
//!
//! - [`init_logging`] — one-time `tracing` setup with `RUST_LOG` support
//! - [`redact_secrets`] — scrub tokens and keys out of text before it is
//!   logged or returned to the MCP client
//! - [`mask_key`] — short, non-reversible form of an API key for log lines

use std::sync::OnceLock;

use regex::Regex;
use tracing_subscriber::EnvFilter;

/// Initialize structured logging with `RUST_LOG` environment variable support.
///
/// Defaults to `agentops_mcp=info` when `RUST_LOG` is not set. Output goes to
/// stderr: stdout carries the MCP protocol stream and must stay clean.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("agentops_mcp=info"));

    // try_init so double-init in tests doesn't panic
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

fn secret_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (
                r"(?i)Bearer\s+[a-zA-Z0-9_\-\.]{16,}",
                "Bearer ***REDACTED***",
            ),
            (
                r#"(?i)("?(?:api[_-]?key|token)"?\s*[:=]\s*)"?[a-zA-Z0-9_\-\.]{16,}"?"#,
                "$1***REDACTED***",
            ),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| {
            Regex::new(pattern).ok().map(|re| (re, replacement))
        })
        .collect()
    })
}

/// Redact bearer tokens and API keys from text.
pub fn redact_secrets(text: &str) -> String {
    let mut result = text.to_string();
    for (re, replacement) in secret_patterns() {
        result = re.replace_all(&result, *replacement).into_owned();
    }
    result
}

/// Mask an API key for logging: first four characters, then an ellipsis.
pub fn mask_key(key: &str) -> String {
    let prefix: String = key.chars().take(4).collect();
    if key.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{prefix}…")
    }
}
