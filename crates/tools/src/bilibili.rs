//! Bilibili: video-search API, creator lookup, and search-page scraping.

use std::sync::LazyLock;

use {
    beeline_common::{diagnostics::debug_event, urls::encode_query},
    regex::Regex,
    reqwest::Client,
    serde::Deserialize,
    serde_json::json,
    tracing::debug,
};

use crate::{
    fetch::{get_json, get_text},
    html::{compile, extract_first_match, strip_tags},
    lenient,
    resolver::PlatformEndpoints,
    scoring::{Candidate, ScoreContext, select_best},
};

const VIDEO_ORIGIN: &str = "https://www.bilibili.com/video";

/// Results considered from each API listing.
const TOP_N: usize = 5;

const API_HEADERS: &[(&str, &str)] = &[
    ("Accept", "application/json, text/plain, */*"),
    ("Referer", "https://www.bilibili.com/"),
];

static BVID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        compile(r#""bvid"\s*:\s*"(BV[a-zA-Z0-9]+)""#),
        compile(r"https://www\.bilibili\.com/video/(BV[a-zA-Z0-9]+)"),
        compile(r"//www\.bilibili\.com/video/(BV[a-zA-Z0-9]+)"),
    ]
});

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Listing<T> {
    #[serde(deserialize_with = "lenient::items", bound(deserialize = "T: serde::de::DeserializeOwned"))]
    result: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VideoItem {
    #[serde(deserialize_with = "lenient::or_default")]
    title: String,
    #[serde(deserialize_with = "lenient::or_default")]
    author: String,
    #[serde(deserialize_with = "lenient::or_default")]
    owner: Option<Owner>,
    #[serde(deserialize_with = "lenient::or_default")]
    pubdate: i64,
    #[serde(deserialize_with = "lenient::or_default")]
    arcurl: String,
    #[serde(deserialize_with = "lenient::or_default")]
    bvid: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Owner {
    #[serde(deserialize_with = "lenient::or_default")]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserItem {
    #[serde(deserialize_with = "lenient::or_default")]
    uname: String,
    #[serde(deserialize_with = "lenient::or_default")]
    fans: u64,
    #[serde(deserialize_with = "lenient::or_default")]
    mid: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Uploads {
    #[serde(deserialize_with = "lenient::or_default")]
    list: UploadList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UploadList {
    #[serde(deserialize_with = "lenient::items")]
    vlist: Vec<Upload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Upload {
    #[serde(deserialize_with = "lenient::or_default")]
    bvid: String,
}

fn video_url(bvid: &str) -> String {
    format!("{VIDEO_ORIGIN}/{bvid}")
}

impl VideoItem {
    fn author(&self) -> &str {
        let author = self.author.trim();
        if author.is_empty() {
            self.owner.as_ref().map_or("", |o| o.name.trim())
        } else {
            author
        }
    }

    /// `arcurl` when it is absolute, else a link built from `bvid`.
    fn resolved_url(&self) -> Option<String> {
        let arcurl = self.arcurl.trim();
        if arcurl.starts_with("http://") || arcurl.starts_with("https://") {
            return Some(arcurl.to_string());
        }
        let bvid = self.bvid.trim();
        (!bvid.is_empty()).then(|| video_url(bvid))
    }

    fn into_candidate(self) -> Option<Candidate> {
        let url = self.resolved_url()?;
        Some(Candidate {
            title: strip_tags(&self.title),
            author: self.author().to_string(),
            pubdate: self.pubdate,
            url,
        })
    }
}

/// How well an account name fits the creator being looked up.
fn user_score(name: &str, creator: &str, fans: u64) -> i64 {
    let base = if name == creator {
        120
    } else if !name.is_empty() && (name.contains(creator) || creator.contains(name)) {
        80
    } else if !name.is_empty() {
        10
    } else {
        0
    };
    // Whole orders of magnitude of followers, 5 points each, capped at 20.
    let magnitude = fans.max(1).ilog10() as i64;
    base + (magnitude * 5).clamp(0, 20)
}

/// Top video-search results, or `None` when the API gives nothing usable.
async fn search_videos(client: &Client, endpoints: &PlatformEndpoints, keyword: &str) -> Option<Vec<VideoItem>> {
    let url = format!(
        "{}/x/web-interface/search/type?search_type=video&keyword={}",
        endpoints.bilibili_api,
        encode_query(keyword)
    );
    let envelope: Envelope<Listing<VideoItem>> = get_json(client, &url, API_HEADERS).await?;
    let mut results = envelope.data?.result;
    results.truncate(TOP_N);
    (!results.is_empty()).then_some(results)
}

/// Newest upload of the account that best matches `creator`.
async fn creator_latest_video(client: &Client, endpoints: &PlatformEndpoints, creator: &str) -> Option<String> {
    let creator = creator.trim();
    if creator.is_empty() {
        return None;
    }

    let url = format!(
        "{}/x/web-interface/search/type?search_type=bili_user&keyword={}&order=totalrank",
        endpoints.bilibili_api,
        encode_query(creator)
    );
    let envelope: Envelope<Listing<UserItem>> = get_json(client, &url, API_HEADERS).await?;
    let users = envelope.data?.result;

    let mut best: Option<(u64, i64)> = None;
    for user in users.iter().take(TOP_N) {
        let name = strip_tags(&user.uname);
        let score = user_score(name.trim(), creator, user.fans);
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((user.mid, score));
        }
    }
    let mid = best.map(|(mid, _)| mid).filter(|mid| *mid != 0)?;

    let url = format!(
        "{}/x/space/arc/search?mid={mid}&ps=1&pn=1&order=pubdate",
        endpoints.bilibili_api
    );
    let envelope: Envelope<Uploads> = get_json(client, &url, API_HEADERS).await?;
    let bvid = envelope
        .data?
        .list
        .vlist
        .into_iter()
        .next()
        .map(|upload| upload.bvid.trim().to_string())
        .filter(|bvid| !bvid.is_empty())?;
    Some(video_url(&bvid))
}

/// First video linked from the rendered search page.
async fn scrape_search_page(client: &Client, endpoints: &PlatformEndpoints, keyword: &str) -> Option<String> {
    let url = format!(
        "{}/all?keyword={}",
        endpoints.bilibili_search,
        encode_query(keyword)
    );
    let html = get_text(client, &url, &[]).await?;
    extract_first_match(&html, &BVID_PATTERNS).map(|bvid| video_url(&bvid))
}

/// Best video for the query.
///
/// `ctx.keyword` is the optimized keyword; `ctx.creator` has already been
/// extracted from the raw text.
pub(crate) async fn best_video(client: &Client, endpoints: &PlatformEndpoints, ctx: &ScoreContext<'_>) -> Option<String> {
    let keyword = ctx.keyword.trim();
    if keyword.is_empty() {
        return None;
    }
    let latest_mode = ctx.latest_mode();

    let Some(results) = search_videos(client, endpoints, keyword).await else {
        debug!(keyword, "bilibili api empty, scraping search page");
        return scrape_search_page(client, endpoints, keyword).await;
    };

    if latest_mode && !ctx.creator.is_empty() {
        if let Some(latest) = creator_latest_video(client, endpoints, ctx.creator).await {
            debug_event(
                "bilibili.latest_from_user",
                json!({ "creator": ctx.creator, "url": latest }),
            );
            return Some(latest);
        }
    }

    if !latest_mode {
        return results.into_iter().next()?.resolved_url();
    }

    let candidates: Vec<Candidate> = results
        .into_iter()
        .filter_map(VideoItem::into_candidate)
        .collect();
    let chosen = select_best(&candidates, ctx)?;
    debug_event(
        "bilibili.scored",
        json!({ "creator": ctx.creator, "keyword": keyword, "chosen": chosen, "candidates": candidates }),
    );
    Some(chosen.url.clone())
}
