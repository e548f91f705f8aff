//! Classification of short replies ("yes", "no", button presses) into a closed set.

pub const BTN_YES_CORRECT: &str = "✅ Да, исправить";
pub const BTN_NO_KEEP: &str = "❌ Нет, оставить как есть";
pub const BTN_MANUAL_EDIT: &str = "✏️ Изменить вручную";
pub const BTN_CANCEL: &str = "🚫 Отмена";
pub const BTN_YES_DELETE: &str = "✅ Да, удалить";
pub const BTN_CANCEL_SHORT: &str = "❌ Отмена";
pub const BTN_PREV: &str = "◀️";
pub const BTN_NEXT: &str = "▶️";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    ManualEdit,
    Cancel,
    PrevPage,
    NextPage,
    Other,
}

const BUTTONS: &[(&str, Answer)] = &[
    (BTN_YES_CORRECT, Answer::Yes),
    (BTN_YES_DELETE, Answer::Yes),
    (BTN_NO_KEEP, Answer::No),
    (BTN_MANUAL_EDIT, Answer::ManualEdit),
    (BTN_CANCEL, Answer::Cancel),
    (BTN_CANCEL_SHORT, Answer::Cancel),
    (BTN_PREV, Answer::PrevPage),
    (BTN_NEXT, Answer::NextPage),
    ("/cancel", Answer::Cancel),
];

// Checked in this order: a reply containing both "нет" and "отмена" is a cancel.
const CANCEL_WORDS: &[&str] = &["отмена", "отменить", "cancel", "stop"];
const MANUAL_WORDS: &[&str] = &["вручную", "manual", "manually", "edit"];
const NO_WORDS: &[&str] = &["нет", "оставить", "no", "keep"];
const YES_WORDS: &[&str] = &["да", "ага", "исправить", "удалить", "yes", "ok", "ок", "fix", "delete"];

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Exact button labels win; otherwise the first vocabulary with a whole-word hit.
pub fn classify(text: &str) -> Answer {
    let trimmed = text.trim();
    let lowered = trimmed.to_lowercase();
    if let Some((_, answer)) = BUTTONS.iter().find(|(label, _)| label.to_lowercase() == lowered) {
        return *answer;
    }

    let words = words(trimmed);
    let hit = |vocab: &[&str]| words.iter().any(|w| vocab.contains(&w.as_str()));
    if hit(CANCEL_WORDS) {
        Answer::Cancel
    } else if hit(MANUAL_WORDS) {
        Answer::ManualEdit
    } else if hit(NO_WORDS) {
        Answer::No
    } else if hit(YES_WORDS) {
        Answer::Yes
    } else {
        Answer::Other
    }
}

/// Buttons for a correction that may be accepted, kept, or typed by hand.
pub fn confirm_buttons() -> Vec<Vec<String>> {
    rows(&[&[BTN_YES_CORRECT, BTN_NO_KEEP], &[BTN_MANUAL_EDIT], &[BTN_CANCEL]])
}

pub fn delete_buttons() -> Vec<Vec<String>> {
    rows(&[&[BTN_YES_DELETE, BTN_CANCEL_SHORT]])
}

pub fn page_buttons(has_prev: bool, has_next: bool) -> Vec<Vec<String>> {
    let mut row = Vec::new();
    if has_prev {
        row.push(BTN_PREV.to_string());
    }
    row.push("/cancel".to_string());
    if has_next {
        row.push(BTN_NEXT.to_string());
    }
    vec![row]
}

fn rows(labels: &[&[&str]]) -> Vec<Vec<String>> {
    labels
        .iter()
        .map(|row| row.iter().map(|l| l.to_string()).collect())
        .collect()
}
