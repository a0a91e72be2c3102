use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Panics at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    /// Piston-compatible execution service base URL.
    pub exec_api_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Model calls admitted per rate window.
    pub model_calls_per_window: u32,
    /// Rate window length in seconds.
    pub model_window_secs: u64,
    /// Evaluation cache time-to-live in seconds.
    pub cache_ttl_secs: u64,
    /// Deadline for one model or execution call, in seconds.
    pub call_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            exec_api_url: std::env::var("EXEC_API_URL")
                .unwrap_or_else(|_| "https://emkc.org/api/v2/piston".to_string()),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            model_calls_per_window: parse_env("MODEL_CALLS_PER_WINDOW", 15)?,
            model_window_secs: parse_env("MODEL_WINDOW_SECS", 60)?,
            cache_ttl_secs: parse_env("CACHE_TTL_SECS", 600)?,
            call_timeout_secs: parse_env("CALL_TIMEOUT_SECS", 30)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' is not a valid value")),
        Err(_) => Ok(default),
    }
}
