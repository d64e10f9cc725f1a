//! Turn an eligible search-results URL into the platform's best result.

use std::time::Duration;

use {
    async_trait::async_trait,
    beeline_common::{
        Platform,
        diagnostics::debug_event,
        urls::{host_of, parse_http_url},
    },
    beeline_config::Settings,
    beeline_intent::{extract_creator_name, is_creator_intent, optimize_search_keyword, wants_latest},
    beeline_providers::shared_http_client,
    reqwest::Client,
    serde_json::json,
    tracing::debug,
};

use crate::{bilibili, pages, reddit, scoring::ScoreContext};

/// Upper bound for one resolver run, network included.
pub const RESOLVER_TIMEOUT: Duration = Duration::from_millis(4500);

/// Base URLs of the third-party sites resolvers read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformEndpoints {
    pub bilibili_api: String,
    pub bilibili_search: String,
    pub reddit: String,
    pub youtube: String,
    pub tiktok: String,
    pub douyin: String,
    pub xiaohongshu: String,
}

impl Default for PlatformEndpoints {
    fn default() -> Self {
        Self {
            bilibili_api: "https://api.bilibili.com".into(),
            bilibili_search: "https://search.bilibili.com".into(),
            reddit: "https://www.reddit.com".into(),
            youtube: "https://www.youtube.com".into(),
            tiktok: "https://www.tiktok.com".into(),
            douyin: "https://www.douyin.com".into(),
            xiaohongshu: "https://www.xiaohongshu.com".into(),
        }
    }
}

/// The URL is an allowlisted results page of a platform with a resolver.
pub fn is_search_url_eligible(url: &str, settings: &Settings) -> bool {
    eligible_platform(url, settings).is_some()
}

fn eligible_platform(url: &str, settings: &Settings) -> Option<(Platform, String)> {
    let parsed = parse_http_url(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    if !settings.is_host_allowed(&host) {
        return None;
    }
    let platform = Platform::for_search_page(&parsed)?;
    Some((platform, Platform::search_keyword(&parsed)))
}

/// Resolves a search-results page to a single destination.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    fn is_eligible(&self, search_url: &str, settings: &Settings) -> bool {
        is_search_url_eligible(search_url, settings)
    }

    /// Best destination for `search_url`, or `None` when nothing usable was
    /// found in time. `raw_input` is the user's original text, preferred over
    /// the URL keyword for intent detection.
    async fn resolve(&self, search_url: &str, settings: &Settings, raw_input: Option<&str>) -> Option<String>;
}

/// Resolver that reads each platform's public search API or results page.
pub struct FirstResultResolver {
    client: Client,
    endpoints: PlatformEndpoints,
}

impl Default for FirstResultResolver {
    fn default() -> Self {
        Self::new(shared_http_client().clone())
    }
}

impl FirstResultResolver {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            endpoints: PlatformEndpoints::default(),
        }
    }

    #[must_use]
    pub fn with_endpoints(mut self, endpoints: PlatformEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    async fn dispatch(&self, platform: Platform, keyword: &str, raw_input: Option<&str>) -> Option<String> {
        let intent_text = raw_input
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .unwrap_or(keyword);
        let latest = wants_latest(intent_text);
        let optimized = optimize_search_keyword(intent_text);
        if optimized.is_empty() {
            return None;
        }

        match platform {
            Platform::Bilibili => {
                let creator_raw = extract_creator_name(intent_text, &optimized);
                let creator = Some(optimize_search_keyword(&creator_raw))
                    .filter(|c| !c.is_empty())
                    .unwrap_or(creator_raw);
                let ctx = ScoreContext {
                    keyword: &optimized,
                    creator: &creator,
                    creator_intent: is_creator_intent(intent_text),
                    wants_latest: latest,
                };
                bilibili::best_video(&self.client, &self.endpoints, &ctx).await
            },
            Platform::Reddit => reddit::first_post(&self.client, &self.endpoints, &optimized, latest).await,
            other => pages::first_result(&self.client, &self.endpoints, other, &optimized, latest).await,
        }
    }
}

#[async_trait]
impl ContentResolver for FirstResultResolver {
    async fn resolve(&self, search_url: &str, settings: &Settings, raw_input: Option<&str>) -> Option<String> {
        let (platform, keyword) = eligible_platform(search_url, settings)?;
        if keyword.is_empty() && raw_input.is_none_or(|raw| raw.trim().is_empty()) {
            return None;
        }

        let resolved = match tokio::time::timeout(RESOLVER_TIMEOUT, self.dispatch(platform, &keyword, raw_input)).await {
            Ok(resolved) => resolved?,
            Err(_) => {
                debug!(%platform, search_url, "content resolver timed out");
                return None;
            },
        };

        let allowed = host_of(&resolved).is_some_and(|host| settings.is_host_allowed(&host));
        debug_event(
            "resolver.result",
            json!({ "platform": platform.name(), "search_url": search_url, "url": resolved, "allowed": allowed }),
        );
        if !allowed {
            debug!(%platform, url = %resolved, "resolved url outside allowlist");
            return None;
        }
        Some(resolved)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher, rstest::rstest};

    fn resolver(server: &mockito::Server) -> FirstResultResolver {
        let base = server.url();
        FirstResultResolver::new(Client::new()).with_endpoints(PlatformEndpoints {
            bilibili_api: base.clone(),
            bilibili_search: base.clone(),
            reddit: base.clone(),
            youtube: base.clone(),
            tiktok: base.clone(),
            douyin: base.clone(),
            xiaohongshu: base,
        })
    }

    #[rstest]
    #[case("https://search.bilibili.com/all?keyword=a", true)]
    #[case("https://www.youtube.com/results?search_query=a", true)]
    #[case("https://www.douyin.com/search/abc", true)]
    #[case("https://x.com/search?q=a", false)]
    #[case("https://www.youtube.com/watch?v=abcdefghijk", false)]
    #[case("https://www.google.com/search?q=a", false)]
    #[case("not a url", false)]
    fn eligibility(#[case] url: &str, #[case] expected: bool) {
        assert_eq!(is_search_url_eligible(url, &Settings::default()), expected);
    }

    #[test]
    fn eligibility_needs_allowlisted_host() {
        let settings = Settings {
            allowed_domains: vec!["reddit.com".into()],
            ..Default::default()
        };
        assert!(is_search_url_eligible("https://www.reddit.com/search/?q=a", &settings));
        assert!(!is_search_url_eligible("https://www.youtube.com/results?search_query=a", &settings));
    }

    #[tokio::test]
    async fn raw_input_drives_the_keyword() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search.json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "rust".into()),
                Matcher::UrlEncoded("sort".into(), "new".into()),
            ]))
            .with_status(200)
            .with_body(json!({"data": {"children": [{"data": {"permalink": "/r/rust/comments/1/x/"}}]}}).to_string())
            .create_async()
            .await;

        let url = resolver(&server)
            .resolve(
                "https://www.reddit.com/search/?q=whatever",
                &Settings::default(),
                Some("reddit rust latest"),
            )
            .await;
        assert_eq!(url.as_deref(), Some("https://www.reddit.com/r/rust/comments/1/x/"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn result_outside_allowlist_is_dropped() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"data": {"children": [{"data": {"permalink": "https://evil.example/p"}}]}}).to_string())
            .create_async()
            .await;

        let url = resolver(&server)
            .resolve("https://www.reddit.com/search/?q=rust", &Settings::default(), None)
            .await;
        assert!(url.is_none());
    }

    #[tokio::test]
    async fn ineligible_url_is_not_fetched() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", Matcher::Any).expect(0).create_async().await;

        let url = resolver(&server)
            .resolve("https://x.com/search?q=rust", &Settings::default(), Some("rust"))
            .await;
        assert!(url.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn bilibili_first_api_result() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/x/web-interface/search/type")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({"code": 0, "data": {"result": [
                    {"bvid": "BV1aa411c7mD", "title": "<em>lofi</em>", "author": "a", "pubdate": 1},
                    {"bvid": "BV1bb411c7mD", "title": "lofi 2", "author": "b", "pubdate": 2}
                ]}})
                .to_string(),
            )
            .create_async()
            .await;

        let url = resolver(&server)
            .resolve("https://search.bilibili.com/all?keyword=lofi", &Settings::default(), None)
            .await;
        assert_eq!(url.as_deref(), Some("https://www.bilibili.com/video/BV1aa411c7mD"));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_upstream_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _hold = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let resolver = FirstResultResolver::new(Client::new()).with_endpoints(PlatformEndpoints {
            youtube: format!("http://{addr}"),
            ..Default::default()
        });
        let started = tokio::time::Instant::now();
        let url = resolver
            .resolve("https://www.youtube.com/results?search_query=lofi", &Settings::default(), None)
            .await;
        assert!(url.is_none());
        assert!(started.elapsed() >= RESOLVER_TIMEOUT);
    }
}
