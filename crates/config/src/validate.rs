//! Configuration validation.
//!
//! Flags unknown or misspelled keys, type errors, and settings that would
//! silently be ignored or rewritten at load time.

use std::path::{Path, PathBuf};

use {beeline_common::urls, serde_json::Value};

use crate::{
    env_subst::substitute_env,
    schema::{BeelineConfig, Settings},
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "endpoint",
    /// "allowlist", "keyword", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "settings.keywords.gh"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

const TOP_LEVEL_KEYS: &[&str] = &["settings", "credentials"];

const SETTINGS_KEYS: &[&str] = &[
    "api_endpoint",
    "apiEndpoint",
    "model",
    "prefer_exact_keyword_jump",
    "preferExactKeywordJump",
    "open_first_result_on_supported_search",
    "openFirstResultOnSupportedSearch",
    "enable_debug_logs",
    "enableDebugLogs",
    "fallback_search_engine",
    "fallbackSearchEngine",
    "ui_language",
    "uiLanguage",
    "allowed_domains",
    "allowedDomains",
    "keywords",
];

const CREDENTIALS_KEYS: &[&str] = &["api_key", "apiKey"];

// ── Levenshtein distance ────────────────────────────────────────────────────

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for &candidate in candidates {
        let d = levenshtein(needle, candidate);
        if d > 0 && d <= max_distance && best.as_ref().is_none_or(|(_, bd)| d < *bd) {
            best = Some((candidate, d));
        }
    }
    best.map(|(s, _)| s)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or the discovered one when
/// `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => crate::loader::find_config_file(),
    };

    let Some(actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Info,
                "file-ref",
                "",
                "no config file found; using defaults",
            )],
            config_path: None,
        };
    };

    let mut result = match std::fs::read_to_string(&actual_path) {
        Ok(content) => {
            let ext = actual_path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("toml");
            validate_str(&substitute_env(&content), ext)
        },
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("failed to read config file: {e}"),
            )],
            config_path: None,
        },
    };
    result.config_path = Some(actual_path);
    result
}

/// Validate config text in the format named by `ext` (`toml`, `yaml`, `yml`
/// or `json`).
#[must_use]
pub fn validate_str(raw: &str, ext: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let parsed: Result<Value, String> = match ext {
        "toml" => toml::from_str(raw).map_err(|e| format!("TOML syntax error: {e}")),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| format!("YAML syntax error: {e}")),
        "json" => serde_json::from_str(raw).map_err(|e| format!("JSON syntax error: {e}")),
        other => Err(format!("unsupported config format: {other}")),
    };
    let value = match parsed {
        Ok(value) => value,
        Err(message) => {
            diagnostics.push(Diagnostic::new(Severity::Error, "syntax", "", message));
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    check_unknown_fields(&value, &mut diagnostics);

    match serde_json::from_value::<BeelineConfig>(value) {
        Ok(config) => diagnostics.extend(validate_settings(&config.settings)),
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            format!("type error: {e}"),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_unknown_fields(value: &Value, diagnostics: &mut Vec<Diagnostic>) {
    let Some(root) = value.as_object() else {
        return;
    };
    check_keys(root, "", TOP_LEVEL_KEYS, diagnostics);
    if let Some(settings) = root.get("settings").and_then(Value::as_object) {
        check_keys(settings, "settings", SETTINGS_KEYS, diagnostics);
    }
    if let Some(credentials) = root.get("credentials").and_then(Value::as_object) {
        check_keys(credentials, "credentials", CREDENTIALS_KEYS, diagnostics);
    }
}

fn check_keys(
    table: &serde_json::Map<String, Value>,
    prefix: &str,
    known: &[&str],
    diagnostics: &mut Vec<Diagnostic>,
) {
    for key in table.keys() {
        if known.contains(&key.as_str()) {
            continue;
        }
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        let message = match suggest(key, known, 3) {
            Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
            None => "unknown field".to_string(),
        };
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "unknown-field",
            path,
            message,
        ));
    }
}

/// Semantic checks on parsed (not yet normalized) settings.
#[must_use]
pub fn validate_settings(settings: &Settings) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    check_endpoint(settings, &mut diagnostics);
    check_allowlist(settings, &mut diagnostics);
    check_keywords(settings, &mut diagnostics);
    diagnostics
}

fn check_endpoint(settings: &Settings, diagnostics: &mut Vec<Diagnostic>) {
    let endpoint = urls::normalize_endpoint(&settings.api_endpoint);
    match urls::parse_http_url(&endpoint) {
        Ok(url) if url.scheme() == "http" => {
            if urls::normalize_navigable_url(&endpoint).is_none() {
                diagnostics.push(Diagnostic::new(
                    Severity::Warning,
                    "endpoint",
                    "settings.api_endpoint",
                    format!("API key would be sent over plain http to {endpoint}"),
                ));
            }
        },
        Ok(_) => {},
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "endpoint",
            "settings.api_endpoint",
            format!("not an http(s) endpoint: {e}"),
        )),
    }

    if settings.model.trim().is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "endpoint",
            "settings.model",
            "empty model name; the default model will be used",
        ));
    }
}

fn check_allowlist(settings: &Settings, diagnostics: &mut Vec<Diagnostic>) {
    for (i, raw) in settings.allowed_domains.iter().enumerate() {
        let normalized = urls::normalize_allowed_domains([raw]);
        match normalized.first() {
            Some(domain) if domain != raw => diagnostics.push(Diagnostic::new(
                Severity::Info,
                "allowlist",
                format!("settings.allowed_domains[{i}]"),
                format!("\"{raw}\" is read as \"{domain}\""),
            )),
            Some(_) => {},
            None => diagnostics.push(Diagnostic::new(
                Severity::Info,
                "allowlist",
                format!("settings.allowed_domains[{i}]"),
                "empty entry is ignored",
            )),
        }
    }

    if urls::normalize_allowed_domains(&settings.allowed_domains).is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "allowlist",
            "settings.allowed_domains",
            "allowlist is empty; the built-in domain list will be used",
        ));
    }
}

fn check_keywords(settings: &Settings, diagnostics: &mut Vec<Diagnostic>) {
    for (trigger, template) in &settings.keywords {
        let path = format!("settings.keywords.{trigger}");
        let trimmed = trigger.trim();

        if trimmed.contains(char::is_whitespace) {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "keyword",
                path,
                "trigger contains whitespace and can never match",
            ));
            continue;
        }
        if trimmed != trigger.to_lowercase() {
            diagnostics.push(Diagnostic::new(
                Severity::Info,
                "keyword",
                path.clone(),
                format!("trigger is matched as \"{}\"", trimmed.to_lowercase()),
            ));
        }

        let template = template.trim();
        if template.is_empty() {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "keyword",
                path,
                "empty template",
            ));
            continue;
        }
        let sample = template.replace("{q}", "x");
        if urls::normalize_navigable_url(&sample).is_none() {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "keyword",
                path,
                format!("template \"{template}\" does not produce an https URL"),
            ));
        }
    }
}
