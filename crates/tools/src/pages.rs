//! Platforms without a usable public API: scrape the first result link out
//! of the rendered search page.

use std::sync::LazyLock;

use {
    beeline_common::{Platform, urls::encode_query},
    regex::Regex,
    reqwest::Client,
    tracing::debug,
};

use crate::{
    fetch::get_text,
    html::{absolutize, compile, extract_first_match},
    resolver::PlatformEndpoints,
};

/// How to find the first result on one platform's search page.
pub struct PageRule {
    pub platform: Platform,
    /// Origin relative links are resolved against.
    origin: &'static str,
    /// Tried in order; the first that matches wins.
    patterns: Vec<Regex>,
    /// Set when the capture is a bare id appended to this prefix rather than
    /// a link.
    id_prefix: Option<&'static str>,
}

impl PageRule {
    /// Destination URL found in `html`, if any.
    pub fn extract(&self, html: &str) -> Option<String> {
        let found = extract_first_match(html, &self.patterns)?;
        Some(match self.id_prefix {
            Some(prefix) => format!("{prefix}{found}"),
            None => absolutize(self.origin, &found),
        })
    }

    fn search_url(&self, endpoints: &PlatformEndpoints, keyword: &str, latest: bool) -> Option<String> {
        let q = encode_query(keyword);
        let url = match self.platform {
            Platform::YouTube if latest => {
                // `sp=CAI%3D` sorts by upload date.
                format!("{}/results?search_query={q}&sp=CAI%253D", endpoints.youtube)
            },
            Platform::YouTube => format!("{}/results?search_query={q}", endpoints.youtube),
            Platform::TikTok => format!("{}/search?q={q}", endpoints.tiktok),
            Platform::Douyin => format!("{}/search/{q}", endpoints.douyin),
            Platform::Xiaohongshu => format!("{}/search_result?keyword={q}", endpoints.xiaohongshu),
            Platform::Bilibili | Platform::Reddit | Platform::X => return None,
        };
        Some(url)
    }
}

pub static PAGE_RULES: LazyLock<Vec<PageRule>> = LazyLock::new(|| {
    vec![
        PageRule {
            platform: Platform::YouTube,
            origin: "https://www.youtube.com",
            patterns: vec![compile(r#""videoId":"([a-zA-Z0-9_-]{11})""#)],
            id_prefix: Some("https://www.youtube.com/watch?v="),
        },
        PageRule {
            platform: Platform::TikTok,
            origin: "https://www.tiktok.com",
            patterns: vec![
                compile(r#"(https://www\.tiktok\.com/@[^"\\]+/video/\d+)"#),
                compile(r#"(/@[^"\\]+/video/\d+)"#),
            ],
            id_prefix: None,
        },
        PageRule {
            platform: Platform::Douyin,
            origin: "https://www.douyin.com",
            patterns: vec![
                compile(r"(https://www\.douyin\.com/video/\d+)"),
                compile(r"(/video/\d+)"),
            ],
            id_prefix: None,
        },
        PageRule {
            platform: Platform::Xiaohongshu,
            origin: "https://www.xiaohongshu.com",
            patterns: vec![
                compile(r"(https://www\.xiaohongshu\.com/explore/[0-9a-fA-F]+)"),
                compile(r"(https://www\.xiaohongshu\.com/discovery/item/[0-9a-fA-F]+)"),
                compile(r"(/explore/[0-9a-fA-F]+)"),
                compile(r"(/discovery/item/[0-9a-fA-F]+)"),
            ],
            id_prefix: None,
        },
    ]
});

pub fn rule_for(platform: Platform) -> Option<&'static PageRule> {
    PAGE_RULES.iter().find(|rule| rule.platform == platform)
}

/// First result scraped from `platform`'s search page for `keyword`.
pub(crate) async fn first_result(
    client: &Client,
    endpoints: &PlatformEndpoints,
    platform: Platform,
    keyword: &str,
    latest: bool,
) -> Option<String> {
    let rule = rule_for(platform)?;
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return None;
    }
    let search_url = rule.search_url(endpoints, keyword, latest)?;
    let html = get_text(client, &search_url, &[]).await?;
    let found = rule.extract(&html);
    debug!(platform = %platform, found = ?found, "scraped search page");
    found
}
