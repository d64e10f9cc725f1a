//! Search-keyword optimization.
//!
//! Each rule is an entry in an ordered table so it can be exercised on its
//! own; the public functions only decide which table to walk and how to
//! treat the first hit.

use std::sync::LazyLock;

use {beeline_common::platform::match_platform_prefix, regex::Regex};

/// A regex plus the capture group holding the subject noun phrase.
pub struct CapturePattern {
    pub name: &'static str,
    regex: Regex,
    subject: usize,
}

impl CapturePattern {
    fn new(name: &'static str, pattern: &str, subject: usize) -> Self {
        Self {
            name,
            regex: compile(pattern),
            subject,
        }
    }

    /// Trimmed subject if the whole text matches this pattern.
    pub fn subject<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(self.subject))
            .map(|m| m.as_str().trim())
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern compiles")
}

/// "<subject>'s latest video/post/note" shapes, tried in order.
pub static SUBJECT_PATTERNS: LazyLock<Vec<CapturePattern>> = LazyLock::new(|| {
    vec![
        CapturePattern::new(
            "zh-possessive-latest",
            r"^(.+?)的(最新|最近)?(视频|作品|动态|帖子|笔记)\s*$",
            1,
        ),
        CapturePattern::new(
            "zh-latest",
            r"^(.+?)(最新|最近)(视频|作品|动态|帖子|笔记)\s*$",
            1,
        ),
        CapturePattern::new(
            "zh-possessive",
            r"^(.+?)的(视频|作品|动态|帖子|笔记)\s*$",
            1,
        ),
        CapturePattern::new(
            "en-latest-post",
            r"(?i)^(.+?)\s+(latest|newest|most\s+recent)\s+(video|videos|post|posts|note|notes)\s*$",
            1,
        ),
        CapturePattern::new(
            "en-latest-upload",
            r"(?i)^(.+?)\s+(latest|newest|most\s+recent)\s+(upload|uploads)\s*$",
            1,
        ),
        CapturePattern::new(
            "en-latest",
            r"(?i)^(.+?)\s+(latest|newest|most\s+recent)\s*$",
            1,
        ),
        CapturePattern::new(
            "en-apostrophe-s",
            r"(?i)^(.+?)\s+s\s+(latest|newest|most\s+recent)\s+(video|videos|post|posts|note|notes)\s*$",
            1,
        ),
        CapturePattern::new(
            "en-latest-of",
            r"(?i)^(?:the\s+)?(latest|newest|most\s+recent)\s+(video|videos|post|posts|note|notes)\s+of\s+(.+?)\s*$",
            3,
        ),
        CapturePattern::new(
            "en-latest-from",
            r"(?i)^(?:the\s+)?(latest|newest|most\s+recent)\s+(video|videos|post|posts|note|notes)\s+from\s+(.+?)\s*$",
            3,
        ),
    ]
});

/// Narrower shapes that isolate a creator name. The first two also define
/// creator intent.
pub static CREATOR_PATTERNS: LazyLock<Vec<CapturePattern>> = LazyLock::new(|| {
    vec![
        CapturePattern::new(
            "zh-possessive-latest",
            r"^(.+?)的(最新|最近)?(视频|作品|动态|投稿)\s*$",
            1,
        ),
        CapturePattern::new(
            "zh-latest",
            r"^(.+?)(最新|最近)(视频|作品|动态|投稿)\s*$",
            1,
        ),
        CapturePattern::new(
            "en-latest-video",
            r"(?i)^(.+?)\s+(latest|newest)\s+(video|videos)\s*$",
            1,
        ),
    ]
});

const CREATOR_INTENT_PATTERNS: usize = 2;

static QUOTES: LazyLock<Regex> = LazyLock::new(|| compile(r#"[“”"']"#));

static ON_PLATFORM: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)^(?:on|in|at)\s+(bilibili|reddit|youtube|tiktok|x|twitter|douyin|xiaohongshu)\s*")
});

static LATEST_MARKER: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)最新|最近|latest|newest"));

/// CJK noise words attach directly; Latin ones need a preceding space so
/// `postgres` keeps its tail.
static TRAILING_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?i)(?:\s*(最新|最近|新|热门|完整版|高清|合集|教程|下载|官网|入口|地址)|\s+(video|videos|post|posts))\s*$",
    )
});

/// Strip a leading platform mention: `在B站上…`, `bilibili: …`, `on youtube …`.
fn strip_platform_mention(text: &str) -> &str {
    let text = match match_platform_prefix(text) {
        Some(prefix) => {
            let rest = prefix.rest.trim_start();
            rest.strip_prefix([':', '：']).unwrap_or(rest).trim_start()
        },
        None => text,
    };
    match ON_PLATFORM.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// Reduce free text to the keyword a platform search should use.
///
/// Never returns fewer than two characters: a degenerate result yields the
/// trimmed input unchanged.
pub fn optimize_search_keyword(raw: &str) -> String {
    let original = raw.trim();
    if original.is_empty() {
        return String::new();
    }

    let unquoted = QUOTES.replace_all(original, "");
    let mut q = strip_platform_mention(unquoted.trim()).trim().to_string();

    for pattern in SUBJECT_PATTERNS.iter() {
        if let Some(subject) = pattern.subject(&q) {
            if subject.chars().count() >= 2 {
                q = subject.to_string();
            }
            break;
        }
    }

    let q = TRAILING_NOISE.replace(&q, "").trim().to_string();
    if q.chars().count() < 2 {
        return original.to_string();
    }
    q
}

/// True when the text asks for the newest content.
pub fn wants_latest(raw: &str) -> bool {
    LATEST_MARKER.is_match(raw)
}

/// Creator name from "<creator>'s latest video" phrasing, else the trimmed
/// `fallback`.
pub fn extract_creator_name(raw: &str, fallback: &str) -> String {
    let q = raw.trim();
    CREATOR_PATTERNS
        .iter()
        .find_map(|pattern| pattern.subject(q).filter(|s| !s.is_empty()))
        .unwrap_or(fallback.trim())
        .to_string()
}

/// True when the text names a creator and asks for their works.
pub fn is_creator_intent(raw: &str) -> bool {
    let q = raw.trim();
    CREATOR_PATTERNS[..CREATOR_INTENT_PATTERNS]
        .iter()
        .any(|pattern| pattern.is_match(q))
}
