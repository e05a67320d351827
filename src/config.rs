use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:7860";
pub const DEFAULT_MAX_UPLOAD_MB: usize = 20;

/// Gemini API key. Unset and empty values are both treated as absent.
#[derive(Clone, Default)]
pub struct Credential(Option<String>);

impl Credential {
    pub fn new(value: Option<String>) -> Self {
        Self(value.filter(|v| !v.is_empty()))
    }

    pub fn get(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }
}

// Never print the key itself.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(_) => write!(f, "Credential(<redacted>)"),
            None => write!(f, "Credential(<absent>)"),
        }
    }
}

/// Startup configuration, read once from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Credential,
    pub model: String,
    pub api_base: String,
    /// `None` means the Gemini call may wait indefinitely.
    pub request_timeout: Option<Duration>,
    pub bind_addr: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let request_timeout = match non_empty("GEMINI_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("GEMINI_TIMEOUT_SECS must be a whole number of seconds, got '{}'", raw))?;
                if secs == 0 {
                    anyhow::bail!("GEMINI_TIMEOUT_SECS must be greater than zero");
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let max_upload_mb = match non_empty("MAX_UPLOAD_MB") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("MAX_UPLOAD_MB must be a whole number, got '{}'", raw))?,
            None => DEFAULT_MAX_UPLOAD_MB,
        };
        let max_upload_bytes = max_upload_mb
            .checked_mul(1024 * 1024)
            .with_context(|| format!("MAX_UPLOAD_MB is too large: {}", max_upload_mb))?;

        Ok(Self {
            api_key: Credential::new(lookup("GEMINI_API_KEY")),
            model: non_empty("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base: non_empty("GEMINI_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            request_timeout,
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            max_upload_bytes,
        })
    }
}
