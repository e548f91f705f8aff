use crate::models::MatchResult;

/// Above this score a correction is proposed with confidence.
pub const STRONG_THRESHOLD: f64 = 60.0;
/// Above this score (and within the distance budget) a tentative correction is proposed.
pub const WEAK_THRESHOLD: f64 = 40.0;
/// Bank names have no weak tier.
pub const BANK_THRESHOLD: f64 = 60.0;

const MIN_DISTANCE_BUDGET: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// The input already is a known value.
    AutoAccept,
    StrongSuggest,
    WeakSuggest,
    NoMatch,
}

impl Action {
    pub fn is_suggestion(self) -> bool {
        matches!(self, Action::StrongSuggest | Action::WeakSuggest)
    }
}

fn already_correct(query: &str, result: &MatchResult) -> bool {
    result.score == 100.0 && query.trim().to_lowercase() == result.candidate.trim().to_lowercase()
}

/// Maps a category (or other free-form) match to an action.
pub fn decide(query: &str, result: &MatchResult) -> Action {
    if already_correct(query, result) {
        return Action::AutoAccept;
    }
    if result.score > STRONG_THRESHOLD {
        return Action::StrongSuggest;
    }
    let budget = (query.trim().chars().count() / 2).max(MIN_DISTANCE_BUDGET);
    if result.score > WEAK_THRESHOLD && result.distance <= budget {
        return Action::WeakSuggest;
    }
    Action::NoMatch
}

/// Maps a bank match to an action. Bank vocabulary is small, so only confident
/// corrections are offered.
pub fn decide_bank(query: &str, result: &MatchResult) -> Action {
    if already_correct(query, result) {
        Action::AutoAccept
    } else if result.score > BANK_THRESHOLD {
        Action::StrongSuggest
    } else {
        Action::NoMatch
    }
}
