//! Text similarity between a noisy user string and a set of known names.
//!
//! Two modes are provided. [`best_match_plain`] compares whole strings by edit
//! distance. [`best_match`] is word-aware: both sides are split into Latin or
//! Cyrillic words, short words and stop words are dropped, and every query word
//! is matched against its closest candidate word, so word order does not matter.

use crate::models::MatchResult;

const MIN_TOKEN_CHARS: usize = 2;

const EXACT_SCORE: f64 = 100.0;
const SUBSTRING_SCORE: f64 = 95.0;
const PREFIX_SCORE: f64 = 90.0;
const ALL_EXACT_BONUS: f64 = 5.0;

/// Prepositions and generic qualifiers that carry no meaning in a category name.
const STOP_WORDS: &[&str] = &[
    "во", "на", "для", "из", "по", "со", "от", "до", "за", "над", "под", "при", "город", "городе",
    "городом", "the", "and", "for", "in", "at", "of", "on",
];

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphabetic() || ('а'..='я').contains(&c) || ('А'..='Я').contains(&c) || c == 'ё' || c == 'Ё'
}

/// Lower-case words of `text`, without short words and stop words, in input order.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !is_word_char(c))
        .filter(|w| w.chars().count() >= MIN_TOKEN_CHARS)
        .filter(|w| !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Case-insensitive Levenshtein distance over Unicode scalar values.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Closeness of two strings as a percentage, 100 meaning identical ignoring case.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.to_lowercase().chars().count().max(b.to_lowercase().chars().count());
    if max_len == 0 {
        return 100.0;
    }
    (1.0 - levenshtein(a, b) as f64 / max_len as f64) * 100.0
}

struct TokenScore {
    score: f64,
    distance: usize,
    exact: bool,
}

fn better(score: f64, distance: usize, than_score: f64, than_distance: usize) -> bool {
    score > than_score || (score == than_score && distance < than_distance)
}

fn score_token(token: &str, candidate: &str, candidate_tokens: &[String]) -> TokenScore {
    if candidate_tokens.iter().any(|ct| ct == token) {
        return TokenScore { score: EXACT_SCORE, distance: 0, exact: true };
    }
    if candidate.contains(token) {
        return TokenScore { score: SUBSTRING_SCORE, distance: 0, exact: true };
    }

    let token_len = token.chars().count();
    let mut best = TokenScore { score: 0.0, distance: token_len + candidate.chars().count(), exact: false };
    for ct in candidate_tokens {
        let ct_len = ct.chars().count();
        let (score, distance) = if ct_len >= MIN_TOKEN_CHARS && ct.starts_with(token) {
            (PREFIX_SCORE, ct_len.abs_diff(token_len))
        } else {
            (similarity(token, ct), levenshtein(token, ct))
        };
        if better(score, distance, best.score, best.distance) {
            best = TokenScore { score, distance, exact: false };
        }
    }
    best
}

/// Word-aware score of one candidate against already tokenized query words.
fn score_words(query_tokens: &[String], candidate: &str) -> (f64, usize) {
    let candidate = candidate.to_lowercase();
    let mut candidate_tokens = tokenize(&candidate);
    if candidate_tokens.is_empty() {
        candidate_tokens.push(candidate.clone());
    }

    let per_token: Vec<TokenScore> = query_tokens
        .iter()
        .map(|t| score_token(t, &candidate, &candidate_tokens))
        .collect();

    // Summed in sorted order so that word order cannot change float rounding.
    let mut scores: Vec<f64> = per_token.iter().map(|t| t.score).collect();
    scores.sort_by(f64::total_cmp);
    let n = per_token.len() as f64;
    let mut score = scores.iter().sum::<f64>() / n;
    let total_distance: usize = per_token.iter().map(|t| t.distance).sum();
    let distance = (total_distance as f64 / n).round() as usize;

    if per_token.iter().all(|t| t.exact) {
        score = (score + ALL_EXACT_BONUS).min(100.0);
    }
    (score, distance)
}

fn pick_best<F>(candidates: &[String], mut score: F) -> Option<MatchResult>
where
    F: FnMut(&str) -> (f64, usize),
{
    let mut best: Option<MatchResult> = None;
    for candidate in candidates {
        let (s, d) = score(candidate);
        let replace = match &best {
            None => true,
            Some(b) => better(s, d, b.score, b.distance),
        };
        if replace {
            best = Some(MatchResult { candidate: candidate.clone(), score: s, distance: d });
        }
    }
    best
}

/// Closest candidate by whole-string edit distance.
pub fn best_match_plain(query: &str, candidates: &[String]) -> Option<MatchResult> {
    let query = query.trim();
    pick_best(candidates, |c| (similarity(query, c), levenshtein(query, c)))
}

/// Closest candidate, comparing word by word. Returns `None` only when
/// `candidates` is empty. Ties go to the smaller distance, then the earlier
/// candidate.
pub fn best_match(query: &str, candidates: &[String]) -> Option<MatchResult> {
    let tokens = tokenize(query);
    if tokens.is_empty() {
        return best_match_plain(query, candidates);
    }
    pick_best(candidates, |c| score_words(&tokens, c))
}

/// Bank names are picked word by word but judged on the whole name, so that a
/// short name like "Альфа" is not pulled towards "Альфа-Банк". A candidate
/// equal to the query ignoring case always wins.
pub fn best_bank_match(query: &str, candidates: &[String]) -> Option<MatchResult> {
    let query = query.trim();
    let wanted = query.to_lowercase();
    if let Some(exact) = candidates.iter().find(|c| c.trim().to_lowercase() == wanted) {
        return Some(MatchResult { candidate: exact.clone(), score: 100.0, distance: 0 });
    }
    let chosen = best_match(query, candidates)?;
    Some(MatchResult {
        score: similarity(query, &chosen.candidate),
        distance: levenshtein(query, &chosen.candidate),
        candidate: chosen.candidate,
    })
}

/// Stable, case-insensitive de-duplication keeping the first spelling seen.
pub fn dedup_names<I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out: Vec<String> = Vec::new();
    for name in names {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !out.iter().any(|n| n.to_lowercase() == trimmed.to_lowercase()) {
            out.push(trimmed.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_identical_strings_score_100() {
        for s in ["Такси", "Альфа-Банк", "", "!!!", "доставка перекресток", "Tinkoff Black"] {
            let result = best_match(s, &names(&[s])).unwrap();
            assert_eq!(result.score, 100.0, "query {s:?}");
            assert_eq!(result.distance, 0, "query {s:?}");
        }
    }

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("Тинькоф", "тинькофф"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("СБЕР", "сбер"), 0);
    }

    #[test]
    fn test_levenshtein_is_symmetric() {
        let pairs = [("такси", "таксопарк"), ("Сбер", "Сбербанк"), ("abc", ""), ("рестораны", "кафе")];
        for (a, b) in pairs {
            assert_eq!(levenshtein(a, b), levenshtein(b, a));
        }
    }

    #[test]
    fn test_similarity_both_empty_is_100() {
        assert_eq!(similarity("", ""), 100.0);
        assert_eq!(similarity("Тинькоф", "Тинькофф"), 87.5);
    }

    #[test]
    fn test_tokenize_drops_short_and_stop_words() {
        assert_eq!(tokenize("Такси в городе"), vec!["такси"]);
        assert_eq!(tokenize("Кафе и рестораны!"), vec!["кафе", "рестораны"]);
        assert_eq!(tokenize("АЗС-Лукойл 24/7"), vec!["азс", "лукойл"]);
        assert!(tokenize("... 5% !").is_empty());
    }

    #[test]
    fn test_word_order_does_not_change_result() {
        let candidates = names(&["Перекресток доставка", "Доставка еды"]);
        let a = best_match("доставка перекресток", &candidates).unwrap();
        let b = best_match("перекресток доставка", &candidates).unwrap();
        assert_eq!(a, b);

        let single = names(&["Доставка продуктов Перекрёсток"]);
        let a = best_match("доставка перекресток", &single).unwrap();
        let b = best_match("перекресток доставка", &single).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_exact_category_wins() {
        let result = best_match("Такси", &names(&["Такси", "Таксопарк"])).unwrap();
        assert_eq!(result.candidate, "Такси");
        assert_eq!(result.score, 100.0);
        assert_eq!(result.distance, 0);
    }

    #[test]
    fn test_typo_in_bank_name() {
        let result = best_match("Тинькоф", &names(&["Тинькофф", "Сбер"])).unwrap();
        assert_eq!(result.candidate, "Тинькофф");
        assert!(result.score > 60.0);
    }

    #[test]
    fn test_substring_gets_bonus() {
        let result = best_match("такс", &names(&["Такси"])).unwrap();
        assert_eq!(result.score, 100.0);
        assert_eq!(result.distance, 0);
    }

    #[test]
    fn test_longer_query_word_is_scored_by_edit_distance() {
        let result = best_match("Кинотеатры", &names(&["Кино"])).unwrap();
        assert!((result.score - 40.0).abs() < 1e-9, "{}", result.score);
        assert_eq!(result.distance, 6);

        let result = best_match("рестораны", &names(&["Ресторан"])).unwrap();
        assert!((result.score - 800.0 / 9.0).abs() < 1e-9, "{}", result.score);
        assert_eq!(result.distance, 1);
    }

    #[test]
    fn test_short_candidate_is_not_offered_for_long_query() {
        let query = "Супермаркеты";
        let result = best_match(query, &names(&["Супер"])).unwrap();
        assert_eq!(result.distance, 7);
        assert!(result.score < 42.0, "{}", result.score);
        assert_eq!(crate::policy::decide(query, &result), crate::policy::Action::NoMatch);
    }

    #[test]
    fn test_ties_go_to_input_order() {
        let result = best_match("сбер", &names(&["Сбер", "Сбербанк"])).unwrap();
        assert_eq!(result.candidate, "Сбер");
        let result = best_match("сбер", &names(&["Сбербанк", "Сбер"])).unwrap();
        assert_eq!(result.candidate, "Сбербанк");
    }

    #[test]
    fn test_ties_on_score_go_to_smaller_distance() {
        let result = best_match_plain("ab", &names(&["abcd", "ax"])).unwrap();
        assert_eq!(result.candidate, "ax");
        assert_eq!(result.score, 50.0);
        assert_eq!(result.distance, 1);
    }

    #[test]
    fn test_punctuation_query_compares_whole_strings() {
        let result = best_match("!!", &names(&["Такси", "!!"])).unwrap();
        assert_eq!(result.candidate, "!!");
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn test_empty_candidates_yield_none() {
        assert!(best_match("Такси", &[]).is_none());
        assert!(best_match_plain("Такси", &[]).is_none());
        assert!(best_bank_match("Сбер", &[]).is_none());
    }

    #[test]
    fn test_bank_match_judges_whole_name() {
        let result = best_bank_match("Альфа", &names(&["Альфа-Банк"])).unwrap();
        assert_eq!(result.candidate, "Альфа-Банк");
        assert_eq!(result.score, 50.0);

        let result = best_bank_match("Тинькоф", &names(&["Тинькофф", "Сбер"])).unwrap();
        assert_eq!(result.candidate, "Тинькофф");
        assert_eq!(result.score, 87.5);
        assert_eq!(result.distance, 1);
    }

    #[test]
    fn test_bank_equal_ignoring_case_wins_over_earlier_candidates() {
        let result = best_bank_match("альфа", &names(&["Альфа-Банк", "Альфа"])).unwrap();
        assert_eq!(result.candidate, "Альфа");
        assert_eq!(result.score, 100.0);
        assert_eq!(result.distance, 0);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let candidates = names(&["Супермаркеты", "Супер маркет", "Маркетплейсы", "Аптеки"]);
        let first = best_match("супермаркет продукты", &candidates);
        for _ in 0..10 {
            assert_eq!(best_match("супермаркет продукты", &candidates), first);
        }
    }

    #[test]
    fn test_dedup_names_is_stable_and_case_insensitive() {
        let out = dedup_names(names(&["Сбер", "ВТБ", "сбер", " ", "Альфа", "втб"]));
        assert_eq!(out, names(&["Сбер", "ВТБ", "Альфа"]));
    }
}
