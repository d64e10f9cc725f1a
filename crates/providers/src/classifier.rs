//! Remote AI intent classifier.
//!
//! One chat-completion request per query. The model is asked for a strict
//! JSON verdict; anything it returns that does not fit the contract, or that
//! points somewhere unsafe, degrades to [`AiDecision::Unknown`]. Only
//! transport failures and non-success statuses surface as errors.

use std::time::Duration;

use {
    async_trait::async_trait,
    beeline_common::{
        AiDecision,
        diagnostics::debug_event,
        urls::{is_disallowed_ai_decision_url, normalize_ai_decision_url},
    },
    beeline_config::Settings,
    serde::Deserialize,
    serde_json::json,
    tracing::{debug, warn},
};

/// Upper bound for one classifier round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const TEMPERATURE: f64 = 0.2;

const SYSTEM_PROMPT: &str = "You are a browser search intent router. \
Your output must be strict JSON with no explanation and no Markdown.";

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("classifier request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("classifier returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Something that turns free text into an [`AiDecision`].
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(
        &self,
        text: &str,
        settings: &Settings,
        api_key: &str,
    ) -> Result<AiDecision, ClassifierError>;
}

/// [`IntentClassifier`] backed by an OpenAI-compatible chat-completion API.
pub struct AiClassifier {
    client: reqwest::Client,
    timeout: Duration,
}

impl Default for AiClassifier {
    fn default() -> Self {
        Self {
            client: crate::shared_http_client().clone(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl AiClassifier {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl IntentClassifier for AiClassifier {
    async fn classify(
        &self,
        text: &str,
        settings: &Settings,
        api_key: &str,
    ) -> Result<AiDecision, ClassifierError> {
        decide_by_ai(&self.client, self.timeout, text, settings, api_key).await
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct RawDecision {
    #[serde(rename = "type")]
    kind: String,
    url: Option<String>,
}

fn user_prompt(text: &str) -> String {
    format!(
        "User input: {text}\n\n\
         Decide where the browser should go and return exactly one of:\n\
         1. {{\"type\":\"direct\",\"url\":\"https://...\"}} when the user wants a specific site or page\n\
         2. {{\"type\":\"search\",\"url\":\"https://...\"}} when the user wants to search inside a site\n\
         3. {{\"type\":\"unknown\"}} when neither applies\n\n\
         Every url must be a complete https URL."
    )
}

/// Ask the configured endpoint to classify `text`.
pub async fn decide_by_ai(
    client: &reqwest::Client,
    timeout: Duration,
    text: &str,
    settings: &Settings,
    api_key: &str,
) -> Result<AiDecision, ClassifierError> {
    let url = settings.completions_url();
    let body = json!({
        "model": settings.model,
        "temperature": TEMPERATURE,
        "messages": [
            {"role": "system", "content": SYSTEM_PROMPT},
            {"role": "user", "content": user_prompt(text)},
        ],
    });
    debug_event("ai_request", json!({ "url": url, "model": settings.model }));

    let mut req = client.post(&url).timeout(timeout).json(&body);
    if !api_key.is_empty() {
        req = req.header("Authorization", format!("Bearer {api_key}"));
    }
    let resp = req.send().await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        warn!(%status, "classifier request rejected");
        return Err(ClassifierError::Status { status, body });
    }

    let raw = resp.text().await?;
    let content = match serde_json::from_str::<CompletionResponse>(&raw) {
        Ok(parsed) => parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default(),
        Err(e) => {
            debug!(error = %e, "classifier response is not a completion payload");
            String::new()
        },
    };

    let decision = parse_decision(&content);
    debug_event(
        "ai_response",
        json!({ "content": content, "decision": decision }),
    );
    Ok(decision)
}

/// Interpret model output, degrading anything unusable to `Unknown`.
pub fn parse_decision(content: &str) -> AiDecision {
    let (visible, _) = strip_think_tags(content);
    let cleaned = strip_code_fences(&visible);
    let Ok(raw) = serde_json::from_str::<RawDecision>(cleaned) else {
        debug!("classifier content is not a decision object");
        return AiDecision::Unknown;
    };

    let kind = raw.kind.as_str();
    if kind != "direct" && kind != "search" {
        return AiDecision::Unknown;
    }
    let Some(url) = raw.url.as_deref().and_then(normalize_ai_decision_url) else {
        return AiDecision::Unknown;
    };
    if is_disallowed_ai_decision_url(&url) {
        debug!(url = %url, "classifier proposed a web search engine");
        return AiDecision::Unknown;
    }

    if kind == "direct" {
        AiDecision::Direct { url }
    } else {
        AiDecision::Search { url }
    }
}

/// Remove a leading ```` ```lang ```` line and a trailing ```` ``` ````.
pub fn strip_code_fences(content: &str) -> &str {
    let mut text = content.trim();
    if text.starts_with("```") {
        text = match text.split_once('\n') {
            Some((_, rest)) => rest,
            None => text.trim_start_matches('`'),
        };
    }
    text.trim_end().trim_end_matches("```").trim()
}

/// Split `<think>…</think>` reasoning blocks out of reasoning-model output.
///
/// Returns `(visible, thinking)`. An unclosed `<think>` swallows the rest.
pub fn strip_think_tags(content: &str) -> (String, String) {
    let mut visible = String::new();
    let mut thinking = String::new();
    let mut remaining = content;

    loop {
        match remaining.find("<think>") {
            Some(start) => {
                visible.push_str(&remaining[..start]);
                let after_open = &remaining[start + "<think>".len()..];
                match after_open.find("</think>") {
                    Some(end) => {
                        thinking.push_str(&after_open[..end]);
                        remaining = &after_open[end + "</think>".len()..];
                    },
                    None => {
                        thinking.push_str(after_open);
                        break;
                    },
                }
            },
            None => {
                visible.push_str(remaining);
                break;
            },
        }
    }

    (visible.trim().to_string(), thinking.trim().to_string())
}
