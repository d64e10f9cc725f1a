//! Supported content platforms: aliases, canonical search pages, and
//! recognition of a platform's search surface from a URL.

use std::fmt;

use {serde::Serialize, url::Url};

use crate::urls::{encode_query, host_matches_domain};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Bilibili,
    Reddit,
    YouTube,
    TikTok,
    X,
    Douyin,
    Xiaohongshu,
}

/// Localized and English names. Tried in order; `x` stays last.
const ALIASES: &[(&str, Platform)] = &[
    ("b站", Platform::Bilibili),
    ("B站", Platform::Bilibili),
    ("哔哩哔哩", Platform::Bilibili),
    ("bilibili", Platform::Bilibili),
    ("reddit", Platform::Reddit),
    ("youtube", Platform::YouTube),
    ("yt", Platform::YouTube),
    ("tiktok", Platform::TikTok),
    ("twitter", Platform::X),
    ("推特", Platform::X),
    ("抖音", Platform::Douyin),
    ("douyin", Platform::Douyin),
    ("小红书", Platform::Xiaohongshu),
    ("xiaohongshu", Platform::Xiaohongshu),
    ("x", Platform::X),
];

impl Platform {
    pub fn name(self) -> &'static str {
        match self {
            Platform::Bilibili => "bilibili",
            Platform::Reddit => "reddit",
            Platform::YouTube => "youtube",
            Platform::TikTok => "tiktok",
            Platform::X => "x",
            Platform::Douyin => "douyin",
            Platform::Xiaohongshu => "xiaohongshu",
        }
    }

    /// Canonical search page for `query`.
    pub fn search_url(self, query: &str) -> String {
        let q = encode_query(query);
        match self {
            Platform::Bilibili => format!("https://search.bilibili.com/all?keyword={q}"),
            Platform::Reddit => format!("https://www.reddit.com/search/?q={q}"),
            Platform::YouTube => format!("https://www.youtube.com/results?search_query={q}"),
            Platform::TikTok => format!("https://www.tiktok.com/search?q={q}"),
            Platform::X => format!("https://x.com/search?q={q}"),
            Platform::Douyin => format!("https://www.douyin.com/search/{q}"),
            Platform::Xiaohongshu => {
                format!("https://www.xiaohongshu.com/search_result?keyword={q}")
            },
        }
    }

    /// Platform whose search-results page `url` points at, judged by host and
    /// path only. X has no recognized results page.
    pub fn for_search_page(url: &Url) -> Option<Platform> {
        let host = url.host_str()?.to_ascii_lowercase();
        let path = url.path();
        let under = |domain: &str| host_matches_domain(&host, domain);

        if host == "search.bilibili.com" {
            return (path.starts_with("/all") || path.starts_with("/video"))
                .then_some(Platform::Bilibili);
        }
        let (platform, prefix) = if under("reddit.com") {
            (Platform::Reddit, "/search")
        } else if under("youtube.com") {
            (Platform::YouTube, "/results")
        } else if under("tiktok.com") {
            (Platform::TikTok, "/search")
        } else if under("douyin.com") {
            (Platform::Douyin, "/search")
        } else if under("xiaohongshu.com") {
            (Platform::Xiaohongshu, "/search_result")
        } else {
            return None;
        };
        path.starts_with(prefix).then_some(platform)
    }

    /// Search keyword carried by a results-page URL on this platform's host.
    ///
    /// Douyin puts the keyword in the path (`/search/<kw>`) when it is not in
    /// the query string.
    pub fn search_keyword(url: &Url) -> String {
        let Some(host) = url.host_str().map(str::to_ascii_lowercase) else {
            return String::new();
        };
        let param = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.trim().to_string())
                .unwrap_or_default()
        };
        let under = |domain: &str| host_matches_domain(&host, domain);

        if host == "search.bilibili.com" {
            param("keyword")
        } else if under("reddit.com") || under("tiktok.com") || under("x.com") {
            param("q")
        } else if under("youtube.com") {
            param("search_query")
        } else if under("xiaohongshu.com") {
            param("keyword")
        } else if under("douyin.com") {
            let from_query = Some(param("keyword"))
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| param("q"));
            if !from_query.is_empty() {
                return from_query;
            }
            url.path()
                .split_once("/search/")
                .and_then(|(_, rest)| rest.split('/').next())
                .and_then(|segment| urlencoding::decode(segment).ok())
                .map(|decoded| decoded.trim().to_string())
                .unwrap_or_default()
        } else {
            String::new()
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A platform name found at the start of free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformPrefix<'a> {
    pub platform: Platform,
    /// Text after the name, the optional `在` and the optional `上`/`里`.
    pub rest: &'a str,
}

/// Match an optional `在`, a platform alias and an optional `上`/`里` at the
/// start of `text`.
///
/// Latin aliases are case-insensitive and must not run into further ASCII
/// letters or digits, so `xbox` is not read as `x` + `box`.
pub fn match_platform_prefix(text: &str) -> Option<PlatformPrefix<'_>> {
    let text = text.trim_start();
    let body = text.strip_prefix('在').map_or(text, str::trim_start);

    ALIASES.iter().find_map(|(alias, platform)| {
        let head = body.get(..alias.len())?;
        if !head.eq_ignore_ascii_case(alias) {
            return None;
        }
        let mut rest = &body[alias.len()..];
        if alias.is_ascii() && rest.starts_with(|c: char| c.is_ascii_alphanumeric()) {
            return None;
        }
        if let Some(stripped) = rest.strip_prefix('上').or_else(|| rest.strip_prefix('里')) {
            rest = stripped;
        }
        Some(PlatformPrefix {
            platform: *platform,
            rest,
        })
    })
}
