use crate::error::{ChatError, Result};
use regex::Regex;
use std::sync::OnceLock;

fn env_placeholder() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"))
}

/// Expand `${VAR_NAME}` placeholders using `lookup`; unknown variables are left as-is.
pub fn expand_env_var_in_string<F>(value: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    env_placeholder()
        .replace_all(value, |caps: &regex::Captures| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Check that `url` is an absolute http(s) URL and drop any trailing slash.
pub fn normalize_base_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let parsed = reqwest::Url::parse(trimmed)
        .map_err(|e| ChatError::Config(format!("invalid base URL '{}': {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(ChatError::Config(format!(
            "unsupported URL scheme '{}' in '{}'",
            other, url
        ))),
    }
}

pub fn require_positive(name: &str, value: usize) -> Result<usize> {
    if value == 0 {
        Err(ChatError::Config(format!("{} must be at least 1", name)))
    } else {
        Ok(value)
    }
}

pub fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}
