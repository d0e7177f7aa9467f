// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::env;

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_language() -> String {
    "Japanese".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    /// "openai" | "gemini" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Provider default is used when absent.
    #[serde(default)]
    pub model: Option<String>,
    /// "ENV" means: read from OPENAI_API_KEY / GEMINI_API_KEY (by provider)
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Language the localized title and summary are written in.
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            api_key: default_api_key(),
            timeout_secs: default_timeout_secs(),
            language: default_language(),
        }
    }
}

impl AiConfig {
    /// Environment variable holding the credential for the configured provider.
    pub fn key_env_var(&self) -> anyhow::Result<&'static str> {
        match self.provider.as_str() {
            "openai" => Ok("OPENAI_API_KEY"),
            "gemini" => Ok("GEMINI_API_KEY"),
            other => anyhow::bail!("Unsupported provider in config: {other}"),
        }
    }

    /// Normalize provider/timeout and resolve the api key if it is "ENV".
    /// A missing credential is an error; callers treat it as fatal.
    pub fn resolve(mut self) -> anyhow::Result<Self> {
        self.provider = self.provider.trim().to_lowercase();
        let var = self.key_env_var()?;

        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = env::var(var)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("Missing {var} env var"))?;
        }
        if self.api_key.trim().is_empty() {
            anyhow::bail!("Empty api_key for provider {}", self.provider);
        }

        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        if self.language.trim().is_empty() {
            self.language = default_language();
        }

        Ok(self)
    }
}
