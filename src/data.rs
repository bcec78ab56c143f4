use std::sync::OnceLock;

use regex::Regex;

/// Neighborhood value used when the source column exists but the cell is blank.
pub const NO_NEIGHBORHOOD: &str = "no neighborhood recorded";

const PLACEHOLDER_TOKENS: &[&str] = &["nan", "none", "null", "na", "n/a", "-", "--"];

fn whitespace_runs() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("static whitespace pattern"))
}

/// Header text as spreadsheets export it may wrap across lines; collapse it to
/// a single-spaced, trimmed name before any alias comparison.
pub fn clean_header(name: &str) -> String {
    whitespace_runs()
        .replace_all(name.trim(), " ")
        .into_owned()
}

pub fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || PLACEHOLDER_TOKENS
            .iter()
            .any(|token| trimmed.eq_ignore_ascii_case(token))
}

/// Lenient numeric coercion. Blank and placeholder cells, text, and
/// non-finite values all read as missing.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if is_placeholder(trimmed) {
        return None;
    }
    let parsed = match trimmed.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) if trimmed.matches(',').count() == 1 && !trimmed.contains('.') => {
            trimmed.replace(',', ".").parse::<f64>().ok()
        }
        Err(_) => None,
    };
    parsed.filter(|value| value.is_finite())
}

/// Canonical form of a school identifier. Spreadsheet exports frequently turn
/// integer codes into floats (`33012345.0`); the trailing zero fraction is
/// dropped so the same school keys identically across sources.
pub fn normalize_identifier(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if is_placeholder(trimmed) {
        return None;
    }
    if let Some((whole, fraction)) = trimmed.split_once('.')
        && !whole.is_empty()
        && whole.chars().all(|c| c.is_ascii_digit())
        && !fraction.is_empty()
        && fraction.chars().all(|c| c == '0')
    {
        return Some(whole.to_string());
    }
    Some(trimmed.to_string())
}

pub fn normalize_neighborhood(raw: &str) -> String {
    if is_placeholder(raw) {
        NO_NEIGHBORHOOD.to_string()
    } else {
        raw.trim().to_string()
    }
}
