//! URL safety and normalization.
//!
//! Every URL that could become a navigation target is validated here before
//! anything else accepts it. All functions are pure: invalid input yields
//! `None` (or the input unchanged), never a panic.

use url::Url;

use crate::{Error, Result};

/// Chat-completion endpoint used when the configured one is blank.
pub const DEFAULT_ENDPOINT: &str = "https://api.deepseek.com";

/// Value of the `from` query parameter stamped on committed URLs.
pub const PRODUCT_TAG: &str = "beeline";

/// Built-in allowlist, used whenever the configured list normalizes to nothing.
pub const DEFAULT_ALLOWED_DOMAINS: &[&str] = &[
    "bilibili.com",
    "reddit.com",
    "youtube.com",
    "tiktok.com",
    "x.com",
    "twitter.com",
    "douyin.com",
    "xiaohongshu.com",
    "kuaishou.com",
    "zhihu.com",
    "weibo.com",
    "douban.com",
    "github.com",
    "stackoverflow.com",
    "wikipedia.org",
];

const COMPLETIONS_PATH: &str = "/chat/completions";

/// `url` serializes IPv6 hosts with brackets.
const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "[::1]"];

/// Trim and drop trailing slashes; a blank endpoint becomes [`DEFAULT_ENDPOINT`].
pub fn normalize_endpoint(raw: &str) -> String {
    let value = raw.trim().trim_end_matches('/');
    if value.is_empty() {
        DEFAULT_ENDPOINT.to_string()
    } else {
        value.to_string()
    }
}

/// Append the provider's completion path unless the endpoint already carries it.
pub fn build_completions_url(endpoint: &str) -> String {
    let normalized = normalize_endpoint(endpoint);
    if normalized.ends_with(COMPLETIONS_PATH) {
        normalized
    } else if normalized.ends_with("/v1") {
        format!("{normalized}{COMPLETIONS_PATH}")
    } else {
        format!("{normalized}/v1{COMPLETIONS_PATH}")
    }
}

/// Percent-encode a trimmed query component.
pub fn encode_query(query: &str) -> String {
    urlencoding::encode(query.trim()).into_owned()
}

/// Lower-case, strip scheme / `www.` / path, and deduplicate while keeping
/// first-seen order. Applying it twice yields the same list.
pub fn normalize_allowed_domains<I, S>(domains: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut unique: Vec<String> = Vec::new();
    for raw in domains {
        let Some(domain) = normalize_domain(raw.as_ref()) else {
            continue;
        };
        if !unique.contains(&domain) {
            unique.push(domain);
        }
    }
    unique
}

fn normalize_domain(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_lowercase();
    let mut rest = lowered.as_str();
    while let Some(stripped) = rest
        .strip_prefix("https://")
        .or_else(|| rest.strip_prefix("http://"))
        .or_else(|| rest.strip_prefix("www."))
    {
        rest = stripped.trim_start();
    }
    let host = rest.split('/').next().unwrap_or_default().trim_end();
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// True iff `host` equals or is a subdomain of an entry in `allowed`.
///
/// `allowed` is expected to be normalized already.
pub fn is_host_allowed(host: &str, allowed: &[String]) -> bool {
    let host = host.trim().to_lowercase();
    if host.is_empty() {
        return false;
    }
    allowed.iter().any(|domain| host_matches_domain(&host, domain))
}

/// `host == domain` or `host` ends with `.domain`.
pub fn host_matches_domain(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Lower-cased host of an absolute URL.
pub fn host_of(raw: &str) -> Option<String> {
    Url::parse(raw.trim())
        .ok()?
        .host_str()
        .map(str::to_ascii_lowercase)
}

/// Parse an absolute `http(s)` URL.
pub fn parse_http_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::UnsupportedScheme(other.to_string())),
    }
}

fn is_loopback(url: &Url) -> bool {
    url.host_str()
        .map(str::to_ascii_lowercase)
        .is_some_and(|host| LOOPBACK_HOSTS.contains(&host.as_str()))
}

/// Accept `https:` anywhere and `http:` only on loopback hosts.
pub fn normalize_navigable_url(raw: &str) -> Option<String> {
    let url = parse_http_url(raw).ok()?;
    match url.scheme() {
        "https" => Some(url.to_string()),
        "http" if is_loopback(&url) => Some(url.to_string()),
        _ => None,
    }
}

/// Sanitize a URL proposed by the remote classifier.
///
/// Plain `http:` is upgraded to `https:` (loopback excepted) and bare hosts
/// such as `www.example.com/path` get an `https://` prefix.
pub fn normalize_ai_decision_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(mut url) = Url::parse(raw) {
        match url.scheme() {
            "https" => return Some(url.to_string()),
            "http" if is_loopback(&url) => return Some(url.to_string()),
            "http" if url.host_str().is_some_and(|h| !h.is_empty()) => {
                if url.set_scheme("https").is_ok() {
                    return Some(url.to_string());
                }
            },
            _ => {},
        }
    }

    if !raw.starts_with("www.") && !looks_like_bare_host(raw) {
        return None;
    }

    let url = Url::parse(&format!("https://{raw}")).ok()?;
    (url.scheme() == "https").then(|| url.to_string())
}

/// `host.tld` optionally followed by a port, path, query or fragment.
fn looks_like_bare_host(raw: &str) -> bool {
    let split = raw
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '.' || c == '-'))
        .unwrap_or(raw.len());
    let (host, rest) = raw.split_at(split);
    if !(rest.is_empty() || rest.starts_with(['/', ':', '?', '#'])) {
        return false;
    }
    let Some((name, tld)) = host.rsplit_once('.') else {
        return false;
    };
    !name.is_empty() && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}

/// The classifier must never redirect into a competing search engine.
pub fn is_disallowed_ai_decision_url(raw: &str) -> bool {
    let Some(host) = host_of(raw) else {
        return false;
    };
    let google = host == "google.com"
        || host.ends_with(".google.com")
        || host.starts_with("google.")
        || host.starts_with("www.google.")
        || host.contains(".google.");
    let bing = host == "bing.com" || host.ends_with(".bing.com");
    google || bing
}

/// Stamp `from=<PRODUCT_TAG>` on an http(s) URL unless a non-empty `from`
/// is already present. Anything unparsable is returned untouched.
pub fn append_from_param(raw: &str) -> String {
    let Ok(mut url) = parse_http_url(raw) else {
        return raw.to_string();
    };

    let mut has_from = false;
    let mut has_empty_from = false;
    for (key, value) in url.query_pairs() {
        if key == "from" {
            if value.is_empty() {
                has_empty_from = true;
            } else {
                has_from = true;
            }
        }
    }
    if has_from {
        return url.to_string();
    }

    if has_empty_from {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != "from")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("from", PRODUCT_TAG);
    } else {
        url.query_pairs_mut().append_pair("from", PRODUCT_TAG);
    }
    url.to_string()
}
