/// Free-text query parsing: strike, expiry, option and futures hints
use lazy_static::lazy_static;
use regex::Regex;

use crate::types::ParsedQuery;

lazy_static! {
    static ref MONTH_TAGS: Regex =
        Regex::new(r"\b(JAN|FEB|MAR|APR|MAY|JUN|JUL|AUG|SEP|OCT|NOV|DEC)\b").unwrap();
    static ref OPTION_TAGS: Regex = Regex::new(r"\b(CE|PE|CALL|PUT)\b").unwrap();
    static ref FUTURES_TAGS: Regex = Regex::new(r"\b(FUT|FUTURE|FUTURES)\b").unwrap();
    static ref STRIKE_K_NOTATION: Regex = Regex::new(r"\b(\d+(\.\d+)?)[kK]\b").unwrap();
    static ref STRIKE_PLAIN: Regex = Regex::new(r"\b(\d{4,6})\b").unwrap();
    static ref EXPIRY_DAY: Regex = Regex::new(r"\b(\d{1,2})\b").unwrap();
    static ref NON_ALPHANUMERIC: Regex = Regex::new(r"[^A-Z0-9\s]").unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Extract structured hints from a raw search phrase.
///
/// Total: absent signals become `None`, never errors. Each step consumes
/// the text it matched before the next step runs, so a strike never
/// doubles as an expiry day. A bare 4-6 digit number is always read as a
/// strike even when it could plausibly be a year.
pub fn parse_query(raw: &str) -> ParsedQuery {
    let mut text = raw.to_uppercase().trim().to_string();

    // 1. Strike price ("26k"/"26.5k" beats plain digits)
    let mut strike = None;
    if let Some(caps) = STRIKE_K_NOTATION.captures(&text) {
        let token = caps.get(0).map(|m| m.as_str().to_string()).unwrap_or_default();
        strike = caps
            .get(1)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .map(|value| value * 1000.0);
        text = text.replace(&token, "");
    } else if let Some(caps) = STRIKE_PLAIN.captures(&text) {
        let token = caps.get(0).map(|m| m.as_str().to_string()).unwrap_or_default();
        strike = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok());
        text = text.replace(&token, "");
    }

    // 2. Expiry day: first remaining 1-2 digit token in [1, 31]
    let mut expiry_day = None;
    let day_tokens: Vec<String> = EXPIRY_DAY
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .collect();
    for token in day_tokens {
        if let Ok(value) = token.parse::<u32>() {
            if (1..=31).contains(&value) {
                expiry_day = Some(value);
                text = text.replacen(&token, " ", 1);
                break;
            }
        }
    }

    // 3. Other tags
    let opt_type = OPTION_TAGS
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());
    let expiry_month = MONTH_TAGS
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());
    let is_future = FUTURES_TAGS.is_match(&text);

    // 4. Cleanup: drop consumed tags, keep only the symbol text
    if opt_type.is_some() {
        text = OPTION_TAGS.replace_all(&text, "").to_string();
    }
    if expiry_month.is_some() {
        text = MONTH_TAGS.replace_all(&text, "").to_string();
    }
    if is_future {
        text = FUTURES_TAGS.replace_all(&text, "").to_string();
    }

    let stripped = NON_ALPHANUMERIC.replace_all(&text, "");
    let trimmed = stripped.trim();
    let raw_symbol = WHITESPACE_RUN.replace_all(trimmed, " ").to_string();

    ParsedQuery {
        raw_symbol,
        strike,
        expiry_month,
        expiry_day,
        opt_type,
        is_future,
    }
}
