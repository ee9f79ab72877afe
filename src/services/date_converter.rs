//! Regional (ROC) calendar date tokens
//!
//! Chip pages print dates as `YYY/MM/DD` where the year counts from 1912.
//! Gregorian tokens (`2023/1/5`) pass through unchanged.

use regex::Regex;
use std::sync::OnceLock;

use crate::constants::{REGIONAL_YEAR_CUTOFF, REGIONAL_YEAR_OFFSET};

fn regional_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d{2,3}[/-]\d{1,2}([/-]\d{1,2})?").expect("static date pattern is valid")
    })
}

/// True when the token starts with a regional date (`YY(Y)/M(/D)`)
pub fn is_regional_date(token: &str) -> bool {
    regional_date_pattern().is_match(token.trim())
}

/// Convert a regional date token to `YYYY-MM-DD`
///
/// Years below 1912 are regional years and get 1911 added. A missing day
/// defaults to 1. Returns `None` for fewer than two parts or non-numeric parts.
pub fn regional_to_iso(token: &str) -> Option<String> {
    let parts: Vec<&str> = token.trim().split(['/', '-']).map(str::trim).collect();
    if parts.len() < 2 {
        return None;
    }

    let mut year: i32 = parts[0].parse().ok()?;
    if year < REGIONAL_YEAR_CUTOFF {
        year += REGIONAL_YEAR_OFFSET;
    }
    let month: u32 = parts[1].parse().ok()?;
    let day: u32 = match parts.get(2) {
        Some(day) => day.parse().ok()?,
        None => 1,
    };

    Some(format!("{:04}-{:02}-{:02}", year, month, day))
}
