use serde::{Deserialize, Serialize};

/// Intent decision produced by the remote classifier. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AiDecision {
    /// Jump straight to a site or service.
    Direct { url: String },
    /// An in-site search or content lookup.
    Search { url: String },
    Unknown,
}

impl AiDecision {
    pub fn url(&self) -> Option<&str> {
        match self {
            AiDecision::Direct { url } | AiDecision::Search { url } => Some(url),
            AiDecision::Unknown => None,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let decision = AiDecision::Search {
            url: "https://www.reddit.com/search/?q=rust".into(),
        };
        let value = serde_json::to_value(&decision).unwrap();
        assert_eq!(value["type"], "search");
        assert_eq!(value["url"], "https://www.reddit.com/search/?q=rust");
        assert_eq!(
            serde_json::to_value(AiDecision::Unknown).unwrap(),
            serde_json::json!({"type": "unknown"})
        );
    }

    #[test]
    fn url_accessor() {
        assert_eq!(AiDecision::Unknown.url(), None);
        let direct = AiDecision::Direct {
            url: "https://github.com/".into(),
        };
        assert_eq!(direct.url(), Some("https://github.com/"));
    }
}
