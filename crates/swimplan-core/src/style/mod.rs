//! Style inference: decide whether the main set should be varied or
//! straightforward.
//!
//! The decision is a signed score over fixed tag sets. It is a pure function
//! of its inputs; history contributes one vote per session, so permuting the
//! history never changes the outcome.

use std::fmt;

use crate::model::{HistoricSession, Thumb, normalize_tags};

/// Request tags that lean toward a varied main set (+2 each).
pub const VARIED_REQUEST_TAGS: [&str; 5] = ["fun", "mixed", "technique", "speed", "kick"];

/// Request tags that lean toward a straightforward main set (-1 each).
pub const STRAIGHTFORWARD_REQUEST_TAGS: [&str; 3] = ["recovery", "steady", "freestyle"];

/// History tags that mark a session as having had a varied feel.
pub const VARIED_HISTORY_TAGS: [&str; 4] = ["fun", "mixed", "varied", "technique"];

/// Inferred preference for main-set structural diversity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    Varied,
    Straightforward,
}

impl Style {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Varied => "varied",
            Self::Straightforward => "straightforward",
        }
    }

    pub fn prefers_varied(self) -> bool {
        self == Self::Varied
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw style score; positive means varied.
pub fn style_score<S: AsRef<str>>(requested_tags: &[S], history: &[HistoricSession]) -> i64 {
    let mut score = 0i64;

    for tag in normalize_tags(requested_tags) {
        if VARIED_REQUEST_TAGS.contains(&tag.as_str()) {
            score += 2;
        }
        if STRAIGHTFORWARD_REQUEST_TAGS.contains(&tag.as_str()) {
            score -= 1;
        }
    }

    for session in history {
        let varied_like = session
            .normalized_tags()
            .iter()
            .any(|t| VARIED_HISTORY_TAGS.contains(&t.as_str()));
        if !varied_like {
            continue;
        }
        match session.thumb {
            Thumb::Up => score += 1,
            Thumb::Down => score -= 1,
        }
    }

    score
}

/// Infer the style for a request. Zero is straightforward.
pub fn infer_style<S: AsRef<str>>(requested_tags: &[S], history: &[HistoricSession]) -> Style {
    if style_score(requested_tags, history) > 0 {
        Style::Varied
    } else {
        Style::Straightforward
    }
}
