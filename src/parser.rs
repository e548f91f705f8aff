use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::error::{AdvisorError, Result};
use crate::models::ParsedRecord;

pub const RECORD_FORMAT: &str = "Bank, Category, Percent, Cap[, Expiry]";
const MAX_TEXT_LEN: usize = 500;
const MAX_LIST_INDEX: usize = 1000;

fn percent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+(?:\.\d+)?)%?$").expect("static regex"))
}

fn cap_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+(?:\.\d+)?)(?:₽|р|руб|rub)?\.?$").expect("static regex"))
}

fn full_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{2})[./](\d{2})[./](\d{4})$").expect("static regex"))
}

fn month_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:(\d{4})-(\d{2})|(\d{2})[./](\d{4}))$").expect("static regex"))
}

// "мар" must be tried before "ма" (май).
const MONTH_STEMS: &[(&str, u32)] = &[
    ("янв", 1),
    ("фев", 2),
    ("мар", 3),
    ("апр", 4),
    ("июн", 6),
    ("июл", 7),
    ("авг", 8),
    ("сен", 9),
    ("окт", 10),
    ("ноя", 11),
    ("дек", 12),
    ("ма", 5),
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("may", 5),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
];

/// Trims and collapses runs of whitespace.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

/// Accepts dd.mm.yyyy, dd/mm/yyyy, yyyy-mm, mm/yyyy, mm.yyyy or a month name.
/// Month-only forms resolve to the last day of that month.
pub fn parse_expiry(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = text.trim().to_lowercase();

    if let Some(caps) = full_date_re().captures(&text) {
        let day = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let year = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = month_year_re().captures(&text) {
        let (year, month) = match (caps.get(1), caps.get(2), caps.get(3), caps.get(4)) {
            (Some(y), Some(m), _, _) => (y.as_str(), m.as_str()),
            (_, _, Some(m), Some(y)) => (y.as_str(), m.as_str()),
            _ => return None,
        };
        return last_day_of_month(year.parse().ok()?, month.parse().ok()?);
    }

    MONTH_STEMS
        .iter()
        .find(|(stem, _)| text.starts_with(stem))
        .and_then(|(_, month)| last_day_of_month(today.year(), *month))
}

fn parse_number(field: &str, raw: &str, re: &Regex) -> Result<f64> {
    let cleaned: String = raw.to_lowercase().chars().filter(|c| !c.is_whitespace()).collect();
    re.captures(&cleaned)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or_else(|| AdvisorError::Validation(format!("invalid {field}: {}", raw.trim())))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parses `Bank, Category, Percent, Cap[, Expiry]`. Missing expiry means the
/// end of the current month. Fields may still be empty; see [`parse_complete`].
pub fn parse_record(text: &str, today: NaiveDate) -> Result<ParsedRecord> {
    let parts: Vec<&str> = text.split(',').collect();
    if parts.len() < 4 {
        return Err(AdvisorError::Validation(format!("expected format: {RECORD_FORMAT}")));
    }

    let bank_name = normalize(parts[0]);
    let category = normalize(parts[1]);
    for (field, value) in [("bank", &bank_name), ("category", &category)] {
        if value.chars().count() > MAX_TEXT_LEN {
            return Err(AdvisorError::Validation(format!("{field} is longer than {MAX_TEXT_LEN} characters")));
        }
    }

    let percent = round2(parse_number("percent", parts[2], percent_re())?);
    if percent > 100.0 {
        return Err(AdvisorError::Validation(format!("percent must be within 0-100, got {percent}")));
    }
    let cap = round2(parse_number("cap", parts[3], cap_re())?);

    let expiry = match parts.get(4).map(|s| s.trim()).filter(|s| !s.is_empty()) {
        Some(raw) => parse_expiry(raw, today).ok_or_else(|| {
            AdvisorError::Validation(format!("invalid expiry date: {raw}. Use dd.mm.yyyy"))
        })?,
        None => last_day_of_month(today.year(), today.month())
            .ok_or_else(|| AdvisorError::Validation("cannot compute end of month".into()))?,
    };

    Ok(ParsedRecord { bank_name, category, percent, cap, expiry })
}

/// [`parse_record`] plus a completeness check.
pub fn parse_complete(text: &str, today: NaiveDate) -> Result<ParsedRecord> {
    let record = parse_record(text, today)?;
    let missing = record.missing_fields();
    if !missing.is_empty() {
        return Err(AdvisorError::Validation(format!(
            "missing data: {}\n\nFormat: {RECORD_FORMAT}\nExample: \"Тинькофф, Такси, 5%, 3000\"",
            missing.join(", ")
        )));
    }
    Ok(record)
}

/// Lines of a message that look like records.
pub fn record_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && l.contains(','))
        .collect()
}

pub fn parse_id(text: &str) -> Result<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| AdvisorError::Validation(format!("invalid id \"{}\", expected a number", text.trim())))
}

/// A bank or group name typed on its own line.
pub fn parse_name(text: &str) -> Result<String> {
    let name = normalize(text);
    if name.chars().count() < 2 {
        return Err(AdvisorError::Validation("name is too short".into()));
    }
    if name.chars().all(|c| c.is_ascii_digit()) {
        return Err(AdvisorError::Validation("name cannot consist of digits only".into()));
    }
    Ok(name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListSelection {
    Latest,
    All,
    /// 1-based positions in the listing, in the order requested.
    Indices(Vec<usize>),
}

/// Arguments of `/list`: nothing, `all`, or ranges like `1-5,8,10`.
pub fn parse_list_args(args: &str) -> Result<ListSelection> {
    let args = args.trim().to_lowercase();
    if args.is_empty() {
        return Ok(ListSelection::Latest);
    }
    if args == "all" || args == "все" {
        return Ok(ListSelection::All);
    }

    let bad = |part: &str| AdvisorError::Validation(format!("invalid list selection: {part}"));
    let mut indices = Vec::new();
    for part in args.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((a, b)) => (
                a.trim().parse::<usize>().map_err(|_| bad(part))?,
                b.trim().parse::<usize>().map_err(|_| bad(part))?,
            ),
            None => {
                let n = part.parse::<usize>().map_err(|_| bad(part))?;
                (n, n)
            }
        };
        if start == 0 || end < start || end > MAX_LIST_INDEX {
            return Err(bad(part));
        }
        for i in start..=end {
            if !indices.contains(&i) {
                indices.push(i);
            }
        }
    }
    Ok(ListSelection::Indices(indices))
}
