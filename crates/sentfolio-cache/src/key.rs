//! Deterministic cache keys.
//!
//! A key is the SHA-256 of the parameters that fully determine a payload,
//! joined with a unit separator so that `("ab", "c")` and `("a", "bc")` differ.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

const SEPARATOR: &[u8] = b"\x1f";

/// Hex SHA-256 over `parts`.
pub fn hash_key(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update(SEPARATOR);
        }
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Key of one month's ranking for `indicator` over a given sentiment table.
pub fn monthly_key(month: NaiveDate, indicator: &str, table_hash: &str) -> String {
    let month = month.format("%Y-%m").to_string();
    hash_key(&["monthly", month.as_str(), indicator, table_hash])
}

/// Key of a complete portfolio query.
pub fn portfolio_key(
    start: NaiveDate,
    end: NaiveDate,
    benchmark: &str,
    indicator: &str,
    table_hash: &str,
) -> String {
    let (start, end) = (start.to_string(), end.to_string());
    hash_key(&[
        "portfolio",
        start.as_str(),
        end.as_str(),
        benchmark,
        indicator,
        table_hash,
    ])
}

/// Key of a news lookup; ticker order and duplicates do not matter.
pub fn news_key(tickers: &[String]) -> String {
    let mut normalized: Vec<&str> = tickers.iter().map(String::as_str).collect();
    normalized.sort_unstable();
    normalized.dedup();
    let mut parts = vec!["news"];
    parts.extend(normalized);
    hash_key(&parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_hash_is_stable_hex() {
        let key = hash_key(&["a", "b"]);
        assert_eq!(key.len(), 64);
        assert_eq!(key, hash_key(&["a", "b"]));
        assert_ne!(hash_key(&["ab", "c"]), hash_key(&["a", "bc"]));
    }

    #[test]
    fn test_monthly_key_uses_month_only() {
        assert_eq!(
            monthly_key(d(2021, 3, 1), "score", "h"),
            monthly_key(d(2021, 3, 20), "score", "h")
        );
        assert_ne!(
            monthly_key(d(2021, 3, 1), "score", "h"),
            monthly_key(d(2021, 3, 1), "score", "other")
        );
    }

    #[test]
    fn test_portfolio_key_covers_parameters() {
        let base = portfolio_key(d(2021, 2, 1), d(2021, 3, 1), "QQQ", "score", "h");
        assert_ne!(base, portfolio_key(d(2021, 2, 1), d(2021, 3, 1), "SPY", "score", "h"));
        assert_ne!(base, portfolio_key(d(2021, 2, 1), d(2021, 3, 2), "QQQ", "score", "h"));
    }

    #[test]
    fn test_news_key_ignores_order() {
        let a = news_key(&["GME".to_string(), "AMC".to_string()]);
        let b = news_key(&["AMC".to_string(), "GME".to_string(), "AMC".to_string()]);
        assert_eq!(a, b);
    }
}
