//! Text extraction from third-party HTML and JSON payloads.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
pub(crate) fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern compiles")
}

static TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"<[^>]*>"));

/// Drop markup tags, e.g. the `<em class="keyword">` highlight wrapped around
/// matched words in search-result titles.
pub fn strip_tags(text: &str) -> String {
    TAG.replace_all(text, "").into_owned()
}

/// Capture group 1 of the first pattern that matches anywhere in `body`.
///
/// Patterns are tried in order; a later pattern is only consulted when every
/// earlier one found nothing.
pub fn extract_first_match(body: &str, patterns: &[Regex]) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Make a scraped link absolute against `origin` (`https://host`).
pub fn absolutize(origin: &str, link: &str) -> String {
    let link = link.trim();
    if link.starts_with("http://") || link.starts_with("https://") {
        return link.to_string();
    }
    if let Some(rest) = link.strip_prefix("//") {
        return format!("https://{rest}");
    }
    let origin = origin.trim_end_matches('/');
    if link.starts_with('/') {
        format!("{origin}{link}")
    } else {
        format!("{origin}/{link}")
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[test]
    fn strips_highlight_markup() {
        assert_eq!(
            strip_tags(r#"<em class="keyword">周杰伦</em>演唱会 Live"#),
            "周杰伦演唱会 Live"
        );
        assert_eq!(strip_tags("no markup"), "no markup");
    }

    #[test]
    fn first_pattern_wins_even_if_later_in_body() {
        let patterns = [compile(r"id=(\d+)"), compile(r"(\w+)@")];
        assert_eq!(
            extract_first_match("user@host then id=42", &patterns).as_deref(),
            Some("42")
        );
        assert_eq!(
            extract_first_match("user@host", &patterns).as_deref(),
            Some("user")
        );
        assert_eq!(extract_first_match("nothing", &patterns), None);
    }

    #[rstest]
    #[case("https://www.tiktok.com", "/@a/video/1", "https://www.tiktok.com/@a/video/1")]
    #[case("https://www.tiktok.com/", "@a/video/1", "https://www.tiktok.com/@a/video/1")]
    #[case("https://www.reddit.com", "https://old.reddit.com/r/x", "https://old.reddit.com/r/x")]
    #[case("https://www.bilibili.com", "//www.bilibili.com/video/BV1", "https://www.bilibili.com/video/BV1")]
    fn absolutizes(#[case] origin: &str, #[case] link: &str, #[case] expected: &str) {
        assert_eq!(absolutize(origin, link), expected);
    }
}
