//! Config schema: routing settings plus the separately-scoped credentials.
//!
//! Field names are snake_case; the camelCase names used by browser-extension
//! exports (`apiEndpoint`, `allowedDomains`, ...) are accepted as aliases.

use std::collections::BTreeMap;

use {
    beeline_common::urls::{self, DEFAULT_ALLOWED_DOMAINS, DEFAULT_ENDPOINT},
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "BEELINE_API_KEY";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BeelineConfig {
    pub settings: Settings,
    pub credentials: CredentialsConfig,
}

impl BeelineConfig {
    /// Trimmed API key: the configured value, else `BEELINE_API_KEY`, else empty.
    pub fn api_key(&self) -> String {
        self.api_key_with(|name| std::env::var(name).ok())
    }

    fn api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> String {
        self.credentials
            .api_key
            .as_ref()
            .map(|s| s.expose_secret().trim().to_string())
            .filter(|key| !key.is_empty())
            .or_else(|| lookup(API_KEY_ENV).map(|key| key.trim().to_string()))
            .unwrap_or_default()
    }
}

/// Secrets kept apart from the shareable settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Classifier API key (overrides `BEELINE_API_KEY`).
    #[serde(
        default,
        alias = "apiKey",
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<Secret<String>>,
}

/// Web search engine used for the fallback destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum FallbackEngine {
    #[default]
    Google,
    Bing,
}

impl From<String> for FallbackEngine {
    /// Anything other than `bing` means Google.
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("bing") {
            Self::Bing
        } else {
            Self::Google
        }
    }
}

impl FallbackEngine {
    pub fn search_url(self, text: &str) -> String {
        let q = urls::encode_query(text);
        match self {
            Self::Google => format!("https://www.google.com/search?q={q}"),
            Self::Bing => format!("https://www.bing.com/search?q={q}"),
        }
    }
}

/// User-facing routing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Chat-completion endpoint base (e.g. `https://api.deepseek.com`).
    #[serde(alias = "apiEndpoint")]
    pub api_endpoint: String,
    pub model: String,
    /// A lone keyword trigger opens its template with an empty query.
    #[serde(alias = "preferExactKeywordJump")]
    pub prefer_exact_keyword_jump: bool,
    /// Refine recognized search pages into their first result.
    #[serde(alias = "openFirstResultOnSupportedSearch")]
    pub open_first_result_on_supported_search: bool,
    #[serde(alias = "enableDebugLogs")]
    pub enable_debug_logs: bool,
    #[serde(alias = "fallbackSearchEngine")]
    pub fallback_search_engine: FallbackEngine,
    #[serde(alias = "uiLanguage")]
    pub ui_language: String,
    /// Root domains navigation may land on.
    #[serde(alias = "allowedDomains")]
    pub allowed_domains: Vec<String>,
    /// Lower-cased single-word trigger → URL template with optional `{q}`.
    pub keywords: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_ENDPOINT.into(),
            model: DEFAULT_MODEL.into(),
            prefer_exact_keyword_jump: true,
            open_first_result_on_supported_search: true,
            enable_debug_logs: false,
            fallback_search_engine: FallbackEngine::Google,
            ui_language: "en".into(),
            allowed_domains: DEFAULT_ALLOWED_DOMAINS
                .iter()
                .map(|d| (*d).to_string())
                .collect(),
            keywords: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Apply the normalization every consumer relies on: trimmed endpoint and
    /// model, a never-empty allowlist, and lower-cased keyword triggers.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.api_endpoint = urls::normalize_endpoint(&self.api_endpoint);

        let model = self.model.trim();
        self.model = if model.is_empty() {
            DEFAULT_MODEL.into()
        } else {
            model.to_string()
        };

        self.allowed_domains = urls::normalize_allowed_domains(&self.allowed_domains);
        if self.allowed_domains.is_empty() {
            self.allowed_domains = urls::normalize_allowed_domains(DEFAULT_ALLOWED_DOMAINS);
        }

        let mut keywords = BTreeMap::new();
        for (trigger, template) in std::mem::take(&mut self.keywords) {
            let trigger = trigger.trim().to_lowercase();
            let template = template.trim().to_string();
            if trigger.is_empty() || template.is_empty() {
                continue;
            }
            keywords.entry(trigger).or_insert(template);
        }
        self.keywords = keywords;
        self
    }

    /// Generic web-search URL used when nothing stronger resolves.
    pub fn fallback_url(&self, text: &str) -> String {
        self.fallback_search_engine.search_url(text)
    }

    pub fn is_host_allowed(&self, host: &str) -> bool {
        urls::is_host_allowed(host, &self.allowed_domains)
    }

    pub fn completions_url(&self) -> String {
        urls::build_completions_url(&self.api_endpoint)
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
