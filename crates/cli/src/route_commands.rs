//! `route`, `resolve` and `optimize` subcommands.

use std::sync::Arc;

use {
    anyhow::{Result, bail},
    async_trait::async_trait,
    beeline_config::Settings,
    beeline_intent::{extract_creator_name, is_creator_intent, optimize_search_keyword, wants_latest},
    beeline_providers::AiClassifier,
    beeline_routing::{Navigator, Router, SettingsSource},
    beeline_tools::{ContentResolver, FirstResultResolver, is_search_url_eligible},
    serde_json::json,
    tracing::warn,
};

/// Re-reads the config file on every query so edits apply to the next one.
struct DiscoveredSettings;

#[async_trait]
impl SettingsSource for DiscoveredSettings {
    async fn settings(&self) -> Settings {
        load_blocking(|config| config.settings).await
    }

    async fn api_key(&self) -> String {
        load_blocking(|config| config.api_key()).await
    }
}

async fn load_blocking<T: Default + Send + 'static>(
    pick: impl FnOnce(beeline_config::BeelineConfig) -> T + Send + 'static,
) -> T {
    match tokio::task::spawn_blocking(move || pick(beeline_config::discover_and_load())).await {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "config load task failed, using defaults");
            T::default()
        },
    }
}

/// Opens URLs in the system browser. The target id is not meaningful here.
struct BrowserNavigator;

#[async_trait]
impl Navigator for BrowserNavigator {
    async fn navigate(&self, _target: Option<&str>, url: &str) -> beeline_routing::Result<()> {
        let owned = url.to_string();
        tokio::task::spawn_blocking(move || open::that(owned))
            .await
            .map_err(|e| beeline_routing::Error::navigation(url, e))?
            .map_err(|e| beeline_routing::Error::navigation(url, e))
    }
}

/// Prints each committed URL on its own line.
struct PrintNavigator;

#[async_trait]
impl Navigator for PrintNavigator {
    async fn navigate(&self, target: Option<&str>, url: &str) -> beeline_routing::Result<()> {
        match target {
            Some(target) => println!("{target}\t{url}"),
            None => println!("{url}"),
        }
        Ok(())
    }
}

pub async fn route(text: &str, target: Option<&str>, dry_run: bool) -> Result<()> {
    let navigator: Arc<dyn Navigator> = if dry_run {
        Arc::new(PrintNavigator)
    } else {
        Arc::new(BrowserNavigator)
    };
    let router = Router::new(
        Arc::new(DiscoveredSettings),
        Arc::new(AiClassifier::default()),
        Arc::new(FirstResultResolver::default()),
        navigator,
    );

    let outcome = router.route_query(text, target).await;
    if outcome.url.is_none() {
        bail!("nothing to route");
    }
    eprintln!("committed at stage {}", outcome.stage);
    Ok(())
}

pub async fn resolve(search_url: &str, text: Option<&str>) -> Result<()> {
    let settings = DiscoveredSettings.settings().await;
    if !is_search_url_eligible(search_url, &settings) {
        bail!("{search_url} is not a supported, allowlisted search page");
    }
    match FirstResultResolver::default()
        .resolve(search_url, &settings, text)
        .await
    {
        Some(url) => {
            println!("{url}");
            Ok(())
        },
        None => bail!("no result found for {search_url}"),
    }
}

pub fn optimize(text: &str) -> Result<()> {
    let keyword = optimize_search_keyword(text);
    let report = json!({
        "keyword": keyword,
        "wantsLatest": wants_latest(text),
        "creator": extract_creator_name(text, &keyword),
        "creatorIntent": is_creator_intent(text),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
