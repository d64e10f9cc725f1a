//! The per-query race between local resolvers, the AI classifier, first-result
//! refinement and the fallback timer.

use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    beeline_common::{
        AiDecision,
        diagnostics::{debug_event, set_debug_logs},
        urls::parse_http_url,
    },
    beeline_config::Settings,
    beeline_intent::{resolve_built_in_platform_search, resolve_keyword},
    beeline_providers::{ClassifierError, IntentClassifier},
    beeline_tools::ContentResolver,
    serde::Serialize,
    serde_json::json,
    tokio::{
        task::JoinSet,
        time::{Instant, sleep_until},
    },
    tracing::{debug, info, warn},
};

use crate::{
    Result,
    session::{CommitOutcome, RoutingSession, Stage},
};

/// Upper bound for one routed query; the fallback commits when it elapses.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Where routing reads its settings and API key from.
///
/// Read once per query, so a settings change never affects a query that is
/// already in flight.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn settings(&self) -> Settings;

    /// Trimmed key; empty when none is configured.
    async fn api_key(&self) -> String;
}

/// Fixed settings, mostly for tests and one-shot CLI runs.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    settings: Settings,
    api_key: String,
}

impl StaticSettings {
    pub fn new(settings: Settings, api_key: impl Into<String>) -> Self {
        Self {
            settings: settings.normalized(),
            api_key: api_key.into().trim().to_string(),
        }
    }
}

#[async_trait]
impl SettingsSource for StaticSettings {
    async fn settings(&self) -> Settings {
        self.settings.clone()
    }

    async fn api_key(&self) -> String {
        self.api_key.clone()
    }
}

/// Opens a committed URL. Called at most once per distinct committed URL.
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn navigate(&self, target: Option<&str>, url: &str) -> Result<()>;
}

/// Final state of a routed query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteOutcome {
    pub stage: Stage,
    pub url: Option<String>,
}

impl From<&RoutingSession> for RouteOutcome {
    fn from(session: &RoutingSession) -> Self {
        Self {
            stage: session.stage(),
            url: session.url().map(str::to_string),
        }
    }
}

/// Result of one concurrently running branch.
enum Branch {
    Ai(std::result::Result<AiDecision, ClassifierError>),
    Refined {
        search_url: String,
        resolved: Option<String>,
    },
}

pub struct Router {
    settings: Arc<dyn SettingsSource>,
    classifier: Arc<dyn IntentClassifier>,
    resolver: Arc<dyn ContentResolver>,
    navigator: Arc<dyn Navigator>,
}

impl Router {
    pub fn new(
        settings: Arc<dyn SettingsSource>,
        classifier: Arc<dyn IntentClassifier>,
        resolver: Arc<dyn ContentResolver>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            settings,
            classifier,
            resolver,
            navigator,
        }
    }

    /// Route free text to a destination, navigating `target` as better
    /// resolutions arrive. Never fails: every error path ends in the fallback
    /// search.
    pub async fn route_query(&self, text: &str, target: Option<&str>) -> RouteOutcome {
        let text = text.trim();
        let settings = self.settings.settings().await;
        set_debug_logs(settings.enable_debug_logs);

        let mut session = RoutingSession::new(settings.fallback_url(text), target.map(str::to_string));
        if text.is_empty() {
            debug!("empty query, committing fallback");
            self.commit_fallback(&mut session).await;
            return RouteOutcome::from(&session);
        }
        let deadline = Instant::now() + SESSION_TIMEOUT;
        debug_event("route.start", json!({ "text": text, "target": target }));

        if is_literal_url(text) {
            if self.commit(&mut session, text, Stage::Direct).await == CommitOutcome::Dropped {
                debug_event("route.direct_blocked", json!({ "url": text }));
                self.commit_fallback(&mut session).await;
            }
            return RouteOutcome::from(&session);
        }

        let mut tasks = JoinSet::new();

        let keyword_url = resolve_keyword(text, &settings);
        if let Some(url) = &keyword_url {
            debug_event("route.keyword", json!({ "url": url }));
            self.commit(&mut session, url, Stage::NonAi).await;
        }
        let built_in_url = resolve_built_in_platform_search(text);
        if let Some(url) = &built_in_url {
            debug_event("route.built_in", json!({ "url": url }));
            self.commit(&mut session, url, Stage::NonAi).await;
        }

        // The local page that was actually committed; what refinement replaces.
        let local_search = built_in_url.or(keyword_url);
        let committed_search = session.url().map(str::to_string);
        if let Some(search_url) = &local_search {
            if settings.open_first_result_on_supported_search && self.resolver.is_eligible(search_url, &settings) {
                let resolver = Arc::clone(&self.resolver);
                let (search_url, settings, raw) = (search_url.clone(), settings.clone(), text.to_string());
                tasks.spawn(async move {
                    let resolved = resolver.resolve(&search_url, &settings, Some(&raw)).await;
                    Branch::Refined { search_url, resolved }
                });
            }
        }

        let api_key = self.settings.api_key().await;
        if api_key.is_empty() {
            debug!("no api key configured, skipping classifier");
        } else {
            let classifier = Arc::clone(&self.classifier);
            let (raw, settings) = (text.to_string(), settings.clone());
            tasks.spawn(async move { Branch::Ai(classifier.classify(&raw, &settings, &api_key).await) });
        }

        while !tasks.is_empty() {
            tokio::select! {
                () = sleep_until(deadline) => {
                    debug_event("route.timeout", json!({ "fallback": session.fallback_url() }));
                    self.commit_fallback(&mut session).await;
                    break;
                },
                Some(joined) = tasks.join_next() => {
                    let branch = match joined {
                        Ok(branch) => branch,
                        Err(e) => {
                            warn!(error = %e, "routing branch panicked");
                            if session.stage() < Stage::NonAi {
                                self.commit_fallback(&mut session).await;
                            }
                            continue;
                        },
                    };
                    match branch {
                        Branch::Ai(result) => {
                            if self.on_ai_result(&mut session, result, local_search.as_deref()).await {
                                // Nothing left can outrank the AI commit; let
                                // stragglers finish unobserved.
                                tasks.detach_all();
                                break;
                            }
                        },
                        Branch::Refined { search_url, resolved } => {
                            self.on_refined(&mut session, &search_url, resolved, committed_search.as_deref())
                                .await;
                        },
                    }
                },
            }
        }

        if session.stage() == Stage::None {
            self.commit_fallback(&mut session).await;
        }
        RouteOutcome::from(&session)
    }

    /// Apply a classifier result. Returns true once the session is at the AI
    /// stage or higher.
    async fn on_ai_result(
        &self,
        session: &mut RoutingSession,
        result: std::result::Result<AiDecision, ClassifierError>,
        local_search: Option<&str>,
    ) -> bool {
        let decision = match result {
            Ok(decision) => decision,
            Err(e) => {
                warn!(error = %e, "intent classifier failed");
                AiDecision::Unknown
            },
        };
        debug_event("route.ai_decision", json!({ "decision": decision }));

        let url = match &decision {
            AiDecision::Unknown => {
                if session.stage() < Stage::NonAi {
                    self.commit_fallback(session).await;
                }
                return false;
            },
            AiDecision::Search { url } if session.stage() == Stage::NonAi => {
                let redundant = [session.url(), local_search]
                    .into_iter()
                    .flatten()
                    .any(|existing| same_search_surface(existing, url));
                if redundant {
                    debug_event(
                        "route.ai_skip",
                        json!({ "reason": "sameSearchPage", "existing": session.url(), "aiUrl": url }),
                    );
                    return false;
                }
                url.clone()
            },
            AiDecision::Direct { url } | AiDecision::Search { url } => url.clone(),
        };

        self.commit(session, &url, Stage::Ai).await;
        session.stage() >= Stage::Ai
    }

    async fn on_refined(
        &self,
        session: &mut RoutingSession,
        search_url: &str,
        resolved: Option<String>,
        committed_search: Option<&str>,
    ) {
        let Some(resolved) = resolved else {
            debug!(search_url, "no first result found");
            return;
        };
        // Only replace the search page if the tab is still showing it.
        if session.stage() != Stage::NonAi || session.url() != committed_search {
            debug!(search_url, url = %resolved, "first result arrived after the session moved on");
            return;
        }
        debug_event("route.first_result", json!({ "searchUrl": search_url, "url": resolved }));
        self.commit(session, &resolved, Stage::NonAi).await;
    }

    async fn commit_fallback(&self, session: &mut RoutingSession) -> CommitOutcome {
        let fallback = session.fallback_url().to_string();
        self.commit(session, &fallback, Stage::Fallback).await
    }

    async fn commit(&self, session: &mut RoutingSession, url: &str, stage: Stage) -> CommitOutcome {
        let outcome = session.commit(url, stage);
        match &outcome {
            CommitOutcome::Navigate { url, stage } => {
                info!(stage = %stage, url = %url, "navigating");
                debug_event("route.navigate", json!({ "stage": stage, "url": url }));
                if let Err(e) = self.navigator.navigate(session.target(), url).await {
                    warn!(error = %e, "navigation failed");
                }
            },
            other => {
                debug!(proposed = %stage, url, outcome = ?other, "proposal not navigated");
            },
        }
        outcome
    }
}

fn is_literal_url(text: &str) -> bool {
    let starts_with = |prefix: &str| text.get(..prefix.len()).is_some_and(|head| head.eq_ignore_ascii_case(prefix));
    starts_with("https://") || starts_with("http://")
}

/// Both URLs show the same platform search page, so switching between them
/// would only reload the tab.
fn same_search_surface(existing: &str, proposed: &str) -> bool {
    let (Ok(a), Ok(b)) = (parse_http_url(existing), parse_http_url(proposed)) else {
        return false;
    };
    let (Some(host_a), Some(host_b)) = (a.host_str(), b.host_str()) else {
        return false;
    };
    if !host_a.eq_ignore_ascii_case(host_b) {
        return false;
    }
    if host_a.eq_ignore_ascii_case("search.bilibili.com") {
        let is_results = |path: &str| path.starts_with("/all") || path.starts_with("/video");
        return is_results(a.path()) && is_results(b.path());
    }
    a.path() == b.path()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        rstest::rstest,
        std::{collections::BTreeMap, sync::Mutex},
    };

    #[derive(Default)]
    struct RecordingNavigator {
        visits: Mutex<Vec<(Option<String>, String)>>,
    }

    impl RecordingNavigator {
        fn urls(&self) -> Vec<String> {
            self.visits.lock().unwrap().iter().map(|(_, url)| url.clone()).collect()
        }
    }

    #[async_trait]
    impl Navigator for RecordingNavigator {
        async fn navigate(&self, target: Option<&str>, url: &str) -> Result<()> {
            self.visits
                .lock()
                .unwrap()
                .push((target.map(str::to_string), url.to_string()));
            Ok(())
        }
    }

    enum Reply {
        Decision(AiDecision),
        Fail,
    }

    struct FakeClassifier {
        delay: Duration,
        reply: Reply,
    }

    #[async_trait]
    impl IntentClassifier for FakeClassifier {
        async fn classify(
            &self,
            _text: &str,
            _settings: &Settings,
            _api_key: &str,
        ) -> std::result::Result<AiDecision, ClassifierError> {
            tokio::time::sleep(self.delay).await;
            match &self.reply {
                Reply::Decision(decision) => Ok(decision.clone()),
                Reply::Fail => Err(ClassifierError::Status {
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    body: "boom".into(),
                }),
            }
        }
    }

    struct FakeResolver {
        delay: Duration,
        result: Option<String>,
    }

    #[async_trait]
    impl ContentResolver for FakeResolver {
        async fn resolve(&self, _search_url: &str, _settings: &Settings, _raw: Option<&str>) -> Option<String> {
            tokio::time::sleep(self.delay).await;
            self.result.clone()
        }
    }

    fn no_refinement() -> FakeResolver {
        FakeResolver {
            delay: Duration::ZERO,
            result: None,
        }
    }

    fn classifier(delay_ms: u64, reply: Reply) -> FakeClassifier {
        FakeClassifier {
            delay: Duration::from_millis(delay_ms),
            reply,
        }
    }

    fn settings_with_keywords() -> Settings {
        Settings {
            keywords: BTreeMap::from([("gh".to_string(), "https://github.com/{q}".to_string())]),
            ..Default::default()
        }
    }

    fn router(
        settings: Settings,
        api_key: &str,
        classifier: FakeClassifier,
        resolver: FakeResolver,
    ) -> (Router, Arc<RecordingNavigator>) {
        let navigator = Arc::new(RecordingNavigator::default());
        let router = Router::new(
            Arc::new(StaticSettings::new(settings, api_key)),
            Arc::new(classifier),
            Arc::new(resolver),
            navigator.clone(),
        );
        (router, navigator)
    }

    #[tokio::test(start_paused = true)]
    async fn literal_url_navigates_once_at_direct() {
        let (router, nav) = router(
            Settings::default(),
            "key",
            classifier(0, Reply::Decision(AiDecision::Unknown)),
            no_refinement(),
        );
        let outcome = router.route_query("https://example.com/x", Some("tab-1")).await;
        assert_eq!(outcome.stage, Stage::Direct);
        assert_eq!(nav.urls(), vec!["https://example.com/x?from=beeline"]);
        assert_eq!(nav.visits.lock().unwrap()[0].0.as_deref(), Some("tab-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn blocked_literal_url_falls_back_immediately() {
        let (router, nav) = router(
            Settings::default(),
            "key",
            classifier(0, Reply::Decision(AiDecision::Unknown)),
            no_refinement(),
        );
        let outcome = router.route_query("http://example.com/x", None).await;
        assert_eq!(outcome.stage, Stage::Fallback);
        assert_eq!(nav.urls().len(), 1);
        assert!(nav.urls()[0].starts_with("https://www.google.com/search?q=http%3A%2F%2Fexample.com%2Fx"));
    }

    #[tokio::test(start_paused = true)]
    async fn no_key_and_no_local_match_falls_back_at_once() {
        let (router, nav) = router(
            Settings::default(),
            "",
            classifier(0, Reply::Decision(AiDecision::Unknown)),
            no_refinement(),
        );
        let started = Instant::now();
        let outcome = router.route_query("rust borrow checker", None).await;
        assert_eq!(outcome.stage, Stage::Fallback);
        assert_eq!(nav.urls(), vec![
            "https://www.google.com/search?q=rust%20borrow%20checker&from=beeline"
        ]);
        assert!(started.elapsed() < SESSION_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_classifier_hits_timeout_fallback_exactly_once() {
        let (router, nav) = router(
            Settings::default(),
            "key",
            classifier(60_000, Reply::Decision(AiDecision::Direct {
                url: "https://github.com/".into(),
            })),
            no_refinement(),
        );
        let started = Instant::now();
        let outcome = router.route_query("something vague", None).await;
        assert_eq!(outcome.stage, Stage::Fallback);
        assert_eq!(nav.urls().len(), 1);
        assert!(started.elapsed() >= SESSION_TIMEOUT);
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn keyword_then_ai_upgrade() {
        let (router, nav) = router(
            settings_with_keywords(),
            "key",
            classifier(500, Reply::Decision(AiDecision::Direct {
                url: "https://github.com/torvalds/linux".into(),
            })),
            no_refinement(),
        );
        let outcome = router.route_query("gh torvalds", None).await;
        assert_eq!(outcome.stage, Stage::Ai);
        assert_eq!(nav.urls(), vec![
            "https://github.com/torvalds?from=beeline",
            "https://github.com/torvalds/linux?from=beeline",
        ]);
    }

    #[tokio::test(start_paused = true)]
    async fn ai_failure_keeps_local_match() {
        let (router, nav) = router(settings_with_keywords(), "key", classifier(100, Reply::Fail), no_refinement());
        let outcome = router.route_query("gh", None).await;
        assert_eq!(outcome.stage, Stage::NonAi);
        assert_eq!(nav.urls(), vec!["https://github.com/?from=beeline"]);
    }

    #[rstest]
    #[case(Reply::Fail)]
    #[case(Reply::Decision(AiDecision::Unknown))]
    #[tokio::test(start_paused = true)]
    async fn ai_without_answer_commits_fallback(#[case] reply: Reply) {
        let (router, nav) = router(Settings::default(), "key", classifier(100, reply), no_refinement());
        let started = Instant::now();
        let outcome = router.route_query("some words", None).await;
        assert_eq!(outcome.stage, Stage::Fallback);
        assert_eq!(nav.urls().len(), 1);
        assert!(started.elapsed() < SESSION_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn redundant_ai_search_does_not_renavigate() {
        let mut settings = Settings::default();
        settings.open_first_result_on_supported_search = false;
        let (router, nav) = router(
            settings,
            "key",
            classifier(100, Reply::Decision(AiDecision::Search {
                url: "https://search.bilibili.com/video?keyword=%E5%91%A8%E6%9D%B0%E4%BC%A6".into(),
            })),
            no_refinement(),
        );
        let outcome = router.route_query("bilibili: 周杰伦", None).await;
        assert_eq!(outcome.stage, Stage::NonAi);
        assert_eq!(nav.urls().len(), 1);
        assert!(nav.urls()[0].starts_with("https://search.bilibili.com/all?keyword="));
    }

    #[tokio::test(start_paused = true)]
    async fn ai_search_on_other_surface_upgrades() {
        let mut settings = Settings::default();
        settings.open_first_result_on_supported_search = false;
        let (router, nav) = router(
            settings,
            "key",
            classifier(100, Reply::Decision(AiDecision::Search {
                url: "https://www.youtube.com/results?search_query=lofi".into(),
            })),
            no_refinement(),
        );
        let outcome = router.route_query("reddit lofi", None).await;
        assert_eq!(outcome.stage, Stage::Ai);
        assert_eq!(nav.urls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn local_search_page_is_refined_to_first_result() {
        let (router, nav) = router(
            Settings::default(),
            "",
            classifier(0, Reply::Decision(AiDecision::Unknown)),
            FakeResolver {
                delay: Duration::from_millis(200),
                result: Some("https://www.reddit.com/r/rust/comments/1/x/".into()),
            },
        );
        let outcome = router.route_query("reddit rust", None).await;
        assert_eq!(outcome.stage, Stage::NonAi);
        let urls = nav.urls();
        assert_eq!(urls.len(), 2);
        assert!(urls[0].starts_with("https://www.reddit.com/search/?q=rust"));
        assert_eq!(urls[1], "https://www.reddit.com/r/rust/comments/1/x/?from=beeline");
    }

    #[tokio::test(start_paused = true)]
    async fn late_refinement_cannot_override_ai() {
        let (router, nav) = router(
            Settings::default(),
            "key",
            classifier(100, Reply::Decision(AiDecision::Direct {
                url: "https://www.reddit.com/r/rust/".into(),
            })),
            FakeResolver {
                delay: Duration::from_millis(2_000),
                result: Some("https://www.reddit.com/r/rust/comments/1/x/".into()),
            },
        );
        let outcome = router.route_query("reddit rust", None).await;
        assert_eq!(outcome.stage, Stage::Ai);
        assert_eq!(outcome.url.as_deref(), Some("https://www.reddit.com/r/rust/?from=beeline"));
        assert_eq!(nav.urls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_refinement_is_not_spawned() {
        let mut settings = Settings::default();
        settings.open_first_result_on_supported_search = false;
        let (router, nav) = router(
            settings,
            "",
            classifier(0, Reply::Decision(AiDecision::Unknown)),
            FakeResolver {
                delay: Duration::ZERO,
                result: Some("https://www.reddit.com/r/rust/comments/1/x/".into()),
            },
        );
        router.route_query("reddit rust", None).await;
        assert_eq!(nav.urls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unsafe_ai_url_is_downgraded_not_followed() {
        let (router, nav) = router(
            Settings::default(),
            "key",
            classifier(100, Reply::Decision(AiDecision::Direct {
                url: "http://plain.example/".into(),
            })),
            no_refinement(),
        );
        let outcome = router.route_query("plain site", None).await;
        assert_eq!(outcome.stage, Stage::Fallback);
        assert!(nav.urls()[0].starts_with("https://www.google.com/search?q=plain%20site"));
    }

    #[rstest]
    #[case("")]
    #[case("key")]
    #[tokio::test(start_paused = true)]
    async fn blank_query_commits_empty_fallback(#[case] api_key: &str) {
        let (router, nav) = router(
            Settings::default(),
            api_key,
            classifier(60_000, Reply::Decision(AiDecision::Direct {
                url: "https://github.com/".into(),
            })),
            no_refinement(),
        );
        let started = Instant::now();
        let outcome = router.route_query("   ", Some("tab-9")).await;
        assert_eq!(outcome.stage, Stage::Fallback);
        assert_eq!(nav.urls(), vec!["https://www.google.com/search?q=&from=beeline"]);
        assert_eq!(nav.visits.lock().unwrap()[0].0.as_deref(), Some("tab-9"));
        assert!(started.elapsed() < SESSION_TIMEOUT);
    }

    #[rstest]
    #[case("https://search.bilibili.com/all?keyword=a", "https://search.bilibili.com/video?keyword=b", true)]
    #[case("https://search.bilibili.com/all?keyword=a", "https://search.bilibili.com/upuser?keyword=a", false)]
    #[case("https://www.reddit.com/search/?q=a", "https://WWW.REDDIT.COM/search/?q=b", true)]
    #[case("https://www.reddit.com/search/?q=a", "https://www.reddit.com/r/rust/", false)]
    #[case("https://www.reddit.com/search/?q=a", "https://old.reddit.com/search/?q=a", false)]
    #[case("not a url", "https://www.reddit.com/search/?q=a", false)]
    fn search_surface(#[case] a: &str, #[case] b: &str, #[case] expected: bool) {
        assert_eq!(same_search_surface(a, b), expected);
    }

    #[rstest]
    #[case("https://example.com", true)]
    #[case("HTTP://example.com", true)]
    #[case("example.com", false)]
    #[case("http", false)]
    fn literal_urls(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(is_literal_url(text), expected);
    }
}
