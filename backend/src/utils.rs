use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Trim a user query, collapse inner whitespace runs to one space and
/// lower-case it. This is the exact string sent upstream and cached under.
pub fn normalize_query(query: &str) -> String {
    WHITESPACE.replace_all(query.trim(), " ").to_lowercase()
}

/// Lower-case, dash-separated, at most 80 chars. Lossy, so never use it alone as a key.
pub fn slug(input: &str) -> String {
    let lowered = input.to_lowercase();
    let dashed = NON_SLUG_CHARS.replace_all(&lowered, "-");
    dashed.trim_matches('-').chars().take(80).collect()
}

/// 31-multiplier string hash with 32-bit wrap-around. Stable across
/// processes and platforms, unlike `std::hash`.
pub fn stable_hash(input: &str) -> u32 {
    input
        .chars()
        .fold(0u32, |hash, ch| hash.wrapping_mul(31).wrapping_add(ch as u32))
}

/// `2026-10-17` -> `20261017`.
pub fn day_number(day: NaiveDate) -> u32 {
    day.year() as u32 * 10_000 + day.month() * 100 + day.day()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_query("  paw   patrol \t rescue "), "paw patrol rescue");
        assert_eq!(normalize_query("   "), "");
        assert_eq!(normalize_query(" Paw  Patrol"), "paw patrol");
    }

    #[test]
    fn slug_strips_punctuation() {
        assert_eq!(slug("Bluey: Full Episodes!"), "bluey-full-episodes");
        assert_eq!(slug("3-5"), "3-5");
        assert_eq!(slug(&"a".repeat(200)).len(), 80);
    }

    #[test]
    fn stable_hash_is_fixed() {
        assert_eq!(stable_hash(""), 0);
        assert_eq!(stable_hash("a"), 97);
        assert_eq!(stable_hash("ab"), 97 * 31 + 98);
        assert_ne!(stable_hash("bluey"), stable_hash("peppa pig"));
    }

    #[test]
    fn day_number_packs_date() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(day_number(day), 20261017);
    }
}
