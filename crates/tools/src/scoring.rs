//! Creator/video disambiguation for multi-candidate search results.

use serde::Serialize;

const EXACT_AUTHOR: i64 = 140;
const AUTHOR_CONTAINS_CREATOR: i64 = 110;
const TITLE_CONTAINS_CREATOR: i64 = 35;
const AUTHOR_CONTAINS_KEYWORD: i64 = 55;
const TITLE_CONTAINS_KEYWORD: i64 = 20;
const MISSING_CREATOR_PENALTY: i64 = 10;
const FOREIGN_AUTHOR_PENALTY: i64 = 25;
const RECENCY_CAP: i64 = 20;

const SECONDS_PER_DAY: i64 = 86_400;

/// One search result, already reduced to the fields scoring looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Markup-free title.
    pub title: String,
    pub author: String,
    /// Unix seconds; 0 when unknown.
    pub pubdate: i64,
    pub url: String,
}

impl Candidate {
    fn authored_by(&self, creator: &str) -> bool {
        !creator.is_empty() && self.author.contains(creator)
    }
}

/// What the query asked for.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreContext<'a> {
    /// Optimized search keyword.
    pub keyword: &'a str,
    /// Extracted creator name; may be empty.
    pub creator: &'a str,
    /// The raw text had "<creator>'s videos" shape.
    pub creator_intent: bool,
    /// The raw text asked for the newest content.
    pub wants_latest: bool,
}

impl ScoreContext<'_> {
    /// Latest-from-creator mode: both latest and creator intent.
    pub fn latest_mode(&self) -> bool {
        self.wants_latest && self.creator_intent
    }
}

/// Recency bonus from the publish day, capped so it can break ties but not
/// outweigh a text match.
fn recency_bonus(pubdate: i64) -> i64 {
    if pubdate <= 0 {
        return 0;
    }
    ((pubdate / SECONDS_PER_DAY) % RECENCY_CAP).clamp(0, RECENCY_CAP)
}

pub fn score(candidate: &Candidate, ctx: &ScoreContext<'_>) -> i64 {
    let mut score = 0;
    let author = candidate.author.as_str();
    let title = candidate.title.as_str();

    if !ctx.creator.is_empty() {
        if author == ctx.creator {
            score += EXACT_AUTHOR;
        } else if author.contains(ctx.creator) {
            score += AUTHOR_CONTAINS_CREATOR;
        }
        if title.contains(ctx.creator) {
            score += TITLE_CONTAINS_CREATOR;
        }
    }

    if !ctx.keyword.is_empty() {
        if author.contains(ctx.keyword) {
            score += AUTHOR_CONTAINS_KEYWORD;
        }
        if title.contains(ctx.keyword) {
            score += TITLE_CONTAINS_KEYWORD;
        }
    }

    if ctx.creator_intent {
        if ctx.creator.is_empty() {
            score -= MISSING_CREATOR_PENALTY;
        } else if !author.contains(ctx.creator) {
            score -= FOREIGN_AUTHOR_PENALTY;
        }
    }

    score + recency_bonus(candidate.pubdate)
}

/// Pick the best candidate.
///
/// In latest mode a candidate authored by the creator beats one that is not,
/// and between two such candidates only the publish date counts. Otherwise the higher
/// score wins with the newer publish date as tie-break; the earlier
/// candidate is kept on a full tie.
pub fn select_best<'c>(candidates: &'c [Candidate], ctx: &ScoreContext<'_>) -> Option<&'c Candidate> {
    let latest_mode = ctx.latest_mode();
    let mut scored = candidates.iter().map(|c| (c, score(c, ctx)));
    let mut best = scored.next()?;

    for (candidate, candidate_score) in scored {
        let (current, current_score) = best;
        if latest_mode {
            let new_ok = candidate.authored_by(ctx.creator);
            let cur_ok = current.authored_by(ctx.creator);
            match (new_ok, cur_ok) {
                (true, false) => {
                    best = (candidate, candidate_score);
                    continue;
                },
                (false, true) => continue,
                (true, true) => {
                    if candidate.pubdate > current.pubdate {
                        best = (candidate, candidate_score);
                    }
                    continue;
                },
                (false, false) => {},
            }
        }
        if candidate_score > current_score
            || (candidate_score == current_score && candidate.pubdate > current.pubdate)
        {
            best = (candidate, candidate_score);
        }
    }

    Some(best.0)
}
