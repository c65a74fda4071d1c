//! Environment-driven configuration for the external services.
//!
//! Nothing here validates credentials: a missing API key is carried as `None`
//! and only fails when a call is actually made.

use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f64 = 0.0;
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SEARCH_URL: &str = "https://api.tavily.com/search";
pub const DEFAULT_MAX_RESULTS: u32 = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Chat-completion settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f64,
    pub api_key: Option<String>,
    pub base_url: String,
    /// Upper bound on one completion round-trip.
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            api_key: None,
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl LlmConfig {
    /// Read `OPENAI_MODEL`, `OPENAI_TEMPERATURE`, `OPENAI_API_KEY`,
    /// `OPENAI_BASE_URL` and `STEPGRAPH_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            model: non_empty(lookup("OPENAI_MODEL")).unwrap_or(defaults.model),
            temperature: parse_or("OPENAI_TEMPERATURE", &lookup, defaults.temperature),
            api_key: non_empty(lookup("OPENAI_API_KEY")),
            base_url: non_empty(lookup("OPENAI_BASE_URL")).unwrap_or(defaults.base_url),
            timeout: timeout_or(&lookup, defaults.timeout),
        }
    }
}

/// Web-search settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub max_results: u32,
    pub timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_SEARCH_URL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SearchConfig {
    /// Read `TAVILY_API_KEY`, `TAVILY_BASE_URL` and `STEPGRAPH_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_key: non_empty(lookup("TAVILY_API_KEY")),
            base_url: non_empty(lookup("TAVILY_BASE_URL")).unwrap_or(defaults.base_url),
            max_results: defaults.max_results,
            timeout: timeout_or(&lookup, defaults.timeout),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: FromStr + Copy>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> T {
    let Some(raw) = non_empty(lookup(key)) else {
        return default;
    };
    match raw.parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable setting");
            default
        }
    }
}

/// `STEPGRAPH_TIMEOUT_SECS`, where zero means the default rather than
/// an immediate timeout.
fn timeout_or(lookup: &impl Fn(&str) -> Option<String>, default: Duration) -> Duration {
    match parse_or("STEPGRAPH_TIMEOUT_SECS", lookup, default.as_secs()) {
        0 => {
            tracing::warn!("ignoring zero STEPGRAPH_TIMEOUT_SECS");
            default
        }
        secs => Duration::from_secs(secs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn llm_defaults_when_env_is_empty() {
        let config = LlmConfig::from_lookup(lookup(&[]));
        assert_eq!(config, LlmConfig::default());
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.temperature, 0.0);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn llm_overrides_from_env() {
        let config = LlmConfig::from_lookup(lookup(&[
            ("OPENAI_MODEL", "gpt-4o"),
            ("OPENAI_TEMPERATURE", "0.3"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:9000/v1"),
            ("STEPGRAPH_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.temperature, 0.3);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.base_url, "http://localhost:9000/v1");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn bad_numbers_fall_back_to_defaults() {
        let config = LlmConfig::from_lookup(lookup(&[
            ("OPENAI_TEMPERATURE", "warm"),
            ("STEPGRAPH_TIMEOUT_SECS", "-1"),
        ]));
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn zero_timeout_uses_default() {
        let env = [("STEPGRAPH_TIMEOUT_SECS", "0")];
        assert_eq!(LlmConfig::from_lookup(lookup(&env)).timeout, DEFAULT_TIMEOUT);
        assert_eq!(SearchConfig::from_lookup(lookup(&env)).timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn blank_api_key_is_absent() {
        let config = SearchConfig::from_lookup(lookup(&[("TAVILY_API_KEY", "   ")]));
        assert!(config.api_key.is_none());
        assert_eq!(config.base_url, DEFAULT_SEARCH_URL);
        assert_eq!(config.max_results, 5);
    }

    #[test]
    fn search_key_from_env() {
        let config = SearchConfig::from_lookup(lookup(&[("TAVILY_API_KEY", "tvly-123")]));
        assert_eq!(config.api_key.as_deref(), Some("tvly-123"));
    }
}
