//! AI adapter: provider abstraction + summary parsing + failure containment.
//!
//! [`Summarize::summarize`] on [`Summarizer`] never fails. Every transport, timeout or parse
//! problem is classified as a [`SummaryFailure`] and collapsed into a
//! placeholder [`SummaryResult`] at that boundary.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::AiConfig;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

/// Placeholder summary used whenever summarization fails.
pub const SUMMARY_FAILED: &str = "Summarization failed.";
/// Prefix put in front of the original title on failure.
pub const ERROR_TITLE_MARKER: &str = "[ERROR]";

pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Normalized generation output. Both fields are non-empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryResult {
    pub localized_title: String,
    pub summary: String,
}

impl SummaryResult {
    /// Placeholder for a failed call on `title`.
    pub fn fallback(title: &str) -> Self {
        Self {
            localized_title: format!("{ERROR_TITLE_MARKER} {}", title.trim())
                .trim_end()
                .to_string(),
            summary: SUMMARY_FAILED.to_string(),
        }
    }
}

/// Why a single summarization attempt did not produce a usable result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SummaryFailure {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("provider returned HTTP {0}")]
    Status(u16),
    #[error("provider returned no content")]
    EmptyResponse,
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("missing or empty field `{0}`")]
    MissingField(&'static str),
}

impl SummaryFailure {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Timeout => "timeout",
            Self::Status(_) => "status",
            Self::EmptyResponse => "empty",
            Self::Malformed(_) => "malformed",
            Self::MissingField(_) => "missing_field",
        }
    }
}

impl From<reqwest::Error> for SummaryFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if let Some(status) = e.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Result of one attempt, before it is collapsed at the adapter boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Success(SummaryResult),
    Failure(SummaryFailure),
}

impl SummaryOutcome {
    pub fn into_result(self, title: &str) -> SummaryResult {
        match self {
            Self::Success(r) => r,
            Self::Failure(_) => SummaryResult::fallback(title),
        }
    }
}

/// Anything that can turn `(title, url)` into a summary without failing.
/// The enricher depends on this, not on a concrete provider.
#[async_trait]
pub trait Summarize: Send + Sync {
    async fn summarize(&self, title: &str, url: &str) -> SummaryResult;

    /// Same call, keeping whether it succeeded. Implementations that can fail
    /// override this; the default reports every result as a success.
    async fn summarize_outcome(&self, title: &str, url: &str) -> SummaryOutcome {
        SummaryOutcome::Success(self.summarize(title, url).await)
    }
}

// ------------------------------------------------------------
// Provider abstraction + concrete providers
// ------------------------------------------------------------

/// Low-level provider: one remote text-generation call, raw text out.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, SummaryFailure>;
    fn name(&self) -> &'static str;
}

pub type DynProvider = Arc<dyn Provider>;

/// Build the provider named in config. Expects a resolved config (see
/// [`AiConfig::resolve`]).
pub fn build_provider(cfg: &AiConfig) -> anyhow::Result<DynProvider> {
    let timeout = Duration::from_secs(cfg.timeout_secs);
    let provider: DynProvider = match cfg.provider.as_str() {
        "openai" => Arc::new(OpenAiProvider::new(
            cfg.api_key.clone(),
            cfg.model.as_deref(),
            timeout,
        )?),
        "gemini" => Arc::new(GeminiProvider::new(
            cfg.api_key.clone(),
            cfg.model.as_deref(),
            timeout,
        )?),
        other => anyhow::bail!("Unsupported provider in config: {other}"),
    };
    Ok(provider)
}

fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("ai-news-digest/0.1")
        .connect_timeout(Duration::from_secs(4))
        .timeout(timeout)
        .build()
        .map_err(|e| anyhow::anyhow!("building AI http client: {e}"))
}

/// OpenAI provider (Chat Completions API).
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: Option<&str>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            api_key,
            model: model.unwrap_or(OPENAI_DEFAULT_MODEL).to_string(),
        })
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(&self, prompt: &str) -> Result<String, SummaryFailure> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: Option<String>,
        }

        let sys = "You are a technology news editor. Output only the JSON object you are asked for.";
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: sys,
                },
                Msg {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.3,
            max_tokens: 600,
        };

        let resp = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(SummaryFailure::Status(resp.status().as_u16()));
        }
        let body: Resp = resp
            .json()
            .await
            .map_err(|e| SummaryFailure::Malformed(e.to_string()))?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(SummaryFailure::EmptyResponse)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Google Gemini provider (`generateContent`).
pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: Option<&str>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            api_key,
            model: model.unwrap_or(GEMINI_DEFAULT_MODEL).to_string(),
        })
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn complete(&self, prompt: &str) -> Result<String, SummaryFailure> {
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }
        #[derive(Deserialize)]
        struct Candidate {
            content: Option<Content>,
        }
        #[derive(Deserialize)]
        struct Content {
            #[serde(default)]
            parts: Vec<Part>,
        }
        #[derive(Deserialize)]
        struct Part {
            text: Option<String>,
        }

        let req = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.3 }
        });
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );

        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(SummaryFailure::Status(resp.status().as_u16()));
        }
        let body: Resp = resp
            .json()
            .await
            .map_err(|e| SummaryFailure::Malformed(e.to_string()))?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            Err(SummaryFailure::EmptyResponse)
        } else {
            Ok(text)
        }
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

// ------------------------------------------------------------
// Summarizer (the containment boundary)
// ------------------------------------------------------------

pub struct Summarizer {
    provider: DynProvider,
    timeout: Duration,
    language: String,
}

impl Summarizer {
    pub fn new(provider: DynProvider, timeout: Duration, language: impl Into<String>) -> Self {
        Self {
            provider,
            timeout,
            language: language.into(),
        }
    }

    pub fn from_config(cfg: &AiConfig) -> anyhow::Result<Self> {
        let provider = build_provider(cfg)?;
        Ok(Self::new(
            provider,
            Duration::from_secs(cfg.timeout_secs),
            cfg.language.clone(),
        ))
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// One attempt, with the failure reason kept.
    pub async fn try_summarize(&self, title: &str, url: &str) -> SummaryOutcome {
        let prompt = build_prompt(title, url, &self.language);
        let t0 = Instant::now();
        let raw = tokio::time::timeout(self.timeout, self.provider.complete(&prompt)).await;
        histogram!("summarizer_call_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let parsed = match raw {
            Err(_elapsed) => Err(SummaryFailure::Timeout),
            Ok(Err(e)) => Err(e),
            Ok(Ok(text)) => parse_summary_response(&text),
        };

        match parsed {
            Ok(r) => {
                counter!("summarizer_calls_total", "outcome" => "success").increment(1);
                SummaryOutcome::Success(r)
            }
            Err(f) => {
                counter!("summarizer_calls_total", "outcome" => f.kind()).increment(1);
                SummaryOutcome::Failure(f)
            }
        }
    }
}

#[async_trait]
impl Summarize for Summarizer {
    async fn summarize(&self, title: &str, url: &str) -> SummaryResult {
        self.summarize_outcome(title, url).await.into_result(title)
    }

    async fn summarize_outcome(&self, title: &str, url: &str) -> SummaryOutcome {
        let outcome = self.try_summarize(title, url).await;
        match &outcome {
            SummaryOutcome::Success(_) => {
                debug!(target: "summarizer", provider = self.provider_name(), %title, "summarized");
            }
            SummaryOutcome::Failure(f) => {
                warn!(
                    target: "summarizer",
                    provider = self.provider_name(),
                    reason = %f,
                    %title,
                    "summarization failed, using fallback"
                );
            }
        }
        outcome
    }
}

// ------------------------------------------------------------
// Prompt + response parsing
// ------------------------------------------------------------

/// Fixed-shape instruction embedding the title and URL.
pub fn build_prompt(title: &str, url: &str, language: &str) -> String {
    let url = if url.trim().is_empty() { "(none)" } else { url };
    format!(
        "Translate the title of the following technology news article into {language} \
and write a concise {language} summary of it in about three sentences.\n\n\
Title: {title}\n\
URL: {url}\n\n\
Respond with exactly one JSON object and nothing else, in this form:\n\
{{\"localized_title\": \"<title in {language}>\", \"summary\": \"<summary in {language}>\"}}\n\
Do not add explanations, markdown, or code fences."
    )
}

/// Strip a surrounding ```json / ``` fence if present.
pub fn strip_code_fences(s: &str) -> String {
    let trimmed = s.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        rest.strip_suffix("```").unwrap_or(rest).trim().to_string()
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest.strip_suffix("```").unwrap_or(rest).trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse raw provider text into a validated [`SummaryResult`].
pub fn parse_summary_response(raw: &str) -> Result<SummaryResult, SummaryFailure> {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        return Err(SummaryFailure::EmptyResponse);
    }

    let parsed: Value = match serde_json::from_str(&cleaned) {
        Ok(v) => v,
        // Some models still wrap the object in a sentence; take the outermost braces.
        Err(e) => embedded_object(&cleaned)
            .and_then(|inner| serde_json::from_str(inner).ok())
            .ok_or_else(|| SummaryFailure::Malformed(format!("invalid JSON: {e}")))?,
    };
    if !parsed.is_object() {
        return Err(SummaryFailure::Malformed("expected a JSON object".into()));
    }

    let localized_title = non_empty_str(&parsed, &["localized_title", "japanese_title"])
        .ok_or(SummaryFailure::MissingField("localized_title"))?;
    let summary =
        non_empty_str(&parsed, &["summary"]).ok_or(SummaryFailure::MissingField("summary"))?;

    Ok(SummaryResult {
        localized_title,
        summary,
    })
}

fn embedded_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let end = s.rfind('}')?;
    (start < end).then(|| &s[start..=end])
}

fn non_empty_str(v: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| v.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_object() {
        let r = parse_summary_response(r#"{"localized_title": "新しいGPT", "summary": "要約"}"#)
            .unwrap();
        assert_eq!(r.localized_title, "新しいGPT");
        assert_eq!(r.summary, "要約");
    }

    #[test]
    fn parses_fenced_object_and_legacy_key() {
        let raw = "```json\n{\"japanese_title\": \"タイトル\", \"summary\": \"本文\"}\n```";
        let r = parse_summary_response(raw).unwrap();
        assert_eq!(r.localized_title, "タイトル");
    }

    #[test]
    fn parses_object_embedded_in_prose() {
        let raw = "Sure! Here it is: {\"localized_title\": \"t\", \"summary\": \"s\"} Hope it helps.";
        assert_eq!(parse_summary_response(raw).unwrap().summary, "s");
    }

    #[test]
    fn rejects_missing_or_blank_fields() {
        assert_eq!(
            parse_summary_response(r#"{"summary": "s"}"#),
            Err(SummaryFailure::MissingField("localized_title"))
        );
        assert_eq!(
            parse_summary_response(r#"{"localized_title": "t", "summary": "  "}"#),
            Err(SummaryFailure::MissingField("summary"))
        );
        assert_eq!(
            parse_summary_response(r#"{"localized_title": 3, "summary": "s"}"#),
            Err(SummaryFailure::MissingField("localized_title"))
        );
    }

    #[test]
    fn rejects_non_json_and_non_objects() {
        assert!(matches!(
            parse_summary_response("I cannot help with that."),
            Err(SummaryFailure::Malformed(_))
        ));
        assert!(matches!(
            parse_summary_response("[1, 2]"),
            Err(SummaryFailure::Malformed(_))
        ));
        assert_eq!(
            parse_summary_response("```\n```"),
            Err(SummaryFailure::EmptyResponse)
        );
    }

    #[test]
    fn fallback_marks_title_and_is_never_empty() {
        let f = SummaryResult::fallback("GPT news");
        assert_eq!(f.localized_title, "[ERROR] GPT news");
        assert_eq!(f.summary, SUMMARY_FAILED);

        let empty = SummaryResult::fallback("");
        assert_eq!(empty.localized_title, "[ERROR]");
    }

    #[test]
    fn prompt_embeds_title_url_and_language() {
        let p = build_prompt("LLM results", "https://x", "Japanese");
        assert!(p.contains("Title: LLM results"));
        assert!(p.contains("URL: https://x"));
        assert!(p.contains("\"localized_title\""));
        assert!(p.contains("Japanese"));
        assert!(build_prompt("t", "", "German").contains("URL: (none)"));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let cfg = AiConfig {
            provider: "claude".into(),
            api_key: "k".into(),
            ..AiConfig::default()
        };
        assert!(build_provider(&cfg).is_err());
    }
}
