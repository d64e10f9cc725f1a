use std::fmt;

use {
    beeline_common::urls::{append_from_param, normalize_navigable_url},
    serde::Serialize,
};

/// Confidence rank of a navigation proposal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    #[default]
    None,
    Fallback,
    NonAi,
    Ai,
    Direct,
}

impl Stage {
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::None => "none",
            Stage::Fallback => "fallback",
            Stage::NonAi => "nonAi",
            Stage::Ai => "ai",
            Stage::Direct => "direct",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a [`RoutingSession::commit`] call decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The session moved; navigate to this URL.
    Navigate { url: String, stage: Stage },
    /// Same URL at the same stage as already committed.
    Duplicate,
    /// A higher stage has already committed.
    Outranked,
    /// Invalid URL at the direct stage.
    Dropped,
}

impl CommitOutcome {
    pub fn url(&self) -> Option<&str> {
        match self {
            CommitOutcome::Navigate { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// State of one routed query.
#[derive(Debug, Clone)]
pub struct RoutingSession {
    stage: Stage,
    url: Option<String>,
    fallback_url: String,
    target: Option<String>,
}

impl RoutingSession {
    pub fn new(fallback_url: impl Into<String>, target: Option<String>) -> Self {
        Self {
            stage: Stage::None,
            url: None,
            fallback_url: fallback_url.into(),
            target,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Committed URL, tracking parameter included.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn fallback_url(&self) -> &str {
        &self.fallback_url
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Propose `url` at `proposed`.
    ///
    /// An invalid URL is dropped at the direct stage and replaced by the
    /// fallback URL at any other stage. The committed stage never goes down,
    /// and re-proposing the committed URL at the committed stage is a no-op.
    pub fn commit(&mut self, url: &str, proposed: Stage) -> CommitOutcome {
        let (url, stage) = match normalize_navigable_url(url) {
            Some(valid) => (valid, proposed),
            None if proposed == Stage::Direct => return CommitOutcome::Dropped,
            None => match normalize_navigable_url(&self.fallback_url) {
                Some(fallback) => (fallback, Stage::Fallback),
                None => return CommitOutcome::Dropped,
            },
        };

        if stage < self.stage {
            return CommitOutcome::Outranked;
        }

        let url = append_from_param(&url);
        if stage == self.stage && self.url.as_deref() == Some(url.as_str()) {
            return CommitOutcome::Duplicate;
        }

        self.stage = stage;
        self.url = Some(url.clone());
        CommitOutcome::Navigate { url, stage }
    }

    /// Commit the fallback search URL.
    pub fn commit_fallback(&mut self) -> CommitOutcome {
        let fallback = self.fallback_url.clone();
        self.commit(&fallback, Stage::Fallback)
    }
}
