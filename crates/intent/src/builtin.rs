//! Built-in `<platform> <query>` matcher.

use beeline_common::platform::match_platform_prefix;

/// Canonical search page for `bilibili: 周杰伦`, `在小红书上 穿搭`, `yt lofi`, ...
///
/// Returns `None` when no platform name leads the text or nothing follows it.
pub fn resolve_built_in_platform_search(text: &str) -> Option<String> {
    let prefix = match_platform_prefix(text.trim())?;
    let rest = prefix.rest.trim_start();
    let query = rest.strip_prefix([':', '：']).unwrap_or(rest).trim();
    if query.is_empty() {
        return None;
    }
    Some(prefix.platform.search_url(query))
}
