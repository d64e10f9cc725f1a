//! User keyword dictionary: `gh torvalds` → `https://github.com/torvalds`.

use {
    beeline_common::urls::encode_query,
    beeline_config::Settings,
    tracing::debug,
};

/// Placeholder replaced by the encoded query remainder.
pub const QUERY_PLACEHOLDER: &str = "{q}";

/// Substitute every `{q}` with the encoded, trimmed `query`. Templates without
/// a placeholder come back verbatim.
pub fn apply_template(template: &str, query: &str) -> String {
    if template.contains(QUERY_PLACEHOLDER) {
        template.replace(QUERY_PLACEHOLDER, &encode_query(query))
    } else {
        template.to_string()
    }
}

/// Look the first whitespace-separated token up in the keyword table.
///
/// Expects normalized settings (lower-cased triggers).
pub fn resolve_keyword(text: &str, settings: &Settings) -> Option<String> {
    let mut parts = text.split_whitespace();
    let trigger = parts.next()?.to_lowercase();
    let template = settings.keywords.get(&trigger)?;
    let rest: Vec<&str> = parts.collect();

    let url = if settings.prefer_exact_keyword_jump && rest.is_empty() {
        apply_template(template, "")
    } else {
        apply_template(template, &rest.join(" "))
    };
    debug!(trigger = %trigger, url = %url, "keyword matched");
    Some(url)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn settings(exact: bool) -> Settings {
        let mut settings = Settings {
            prefer_exact_keyword_jump: exact,
            ..Default::default()
        };
        settings
            .keywords
            .insert("gh".into(), "https://github.com/{q}".into());
        settings
            .keywords
            .insert("home".into(), "https://example.com/dashboard".into());
        settings
            .keywords
            .insert("wiki".into(), "https://en.wikipedia.org/w/index.php?search={q}&q2={q}".into());
        settings
    }

    #[rstest]
    #[case("gh", "https://github.com/")]
    #[case("gh torvalds", "https://github.com/torvalds")]
    #[case("GH   rust-lang   rust", "https://github.com/rust-lang%20rust")]
    #[case("home anything here", "https://example.com/dashboard")]
    #[case(
        "wiki 周杰伦",
        "https://en.wikipedia.org/w/index.php?search=%E5%91%A8%E6%9D%B0%E4%BC%A6&q2=%E5%91%A8%E6%9D%B0%E4%BC%A6"
    )]
    fn resolves(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(resolve_keyword(text, &settings(true)).unwrap(), expected);
    }

    #[test]
    fn lone_trigger_without_exact_jump_still_resolves() {
        assert_eq!(
            resolve_keyword("gh", &settings(false)).unwrap(),
            "https://github.com/"
        );
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("github torvalds")]
    #[case("torvalds gh")]
    fn no_match(#[case] text: &str) {
        assert!(resolve_keyword(text, &settings(true)).is_none());
    }

    #[test]
    fn template_without_placeholder_is_verbatim() {
        assert_eq!(apply_template("https://a.com/x", "ignored"), "https://a.com/x");
        assert_eq!(apply_template("https://a.com/{q}", "  a b "), "https://a.com/a%20b");
    }
}
