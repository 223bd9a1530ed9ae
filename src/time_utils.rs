use chrono::{NaiveDate, Utc};

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parses a `YYYY-MM-DD` date field, substituting `fallback` for missing or
/// malformed input.
pub fn parse_date_or(raw: Option<&str>, fallback: NaiveDate) -> NaiveDate {
    raw.and_then(|value| NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok())
        .unwrap_or(fallback)
}

pub fn parse_date_or_today(raw: Option<&str>) -> NaiveDate {
    parse_date_or(raw, today())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 22).unwrap()
    }

    #[test]
    fn test_valid_date_parsed() {
        assert_eq!(
            parse_date_or(Some("2026-03-15"), fallback()),
            NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
        );
        assert_eq!(
            parse_date_or(Some("  2026-01-18 "), fallback()),
            NaiveDate::from_ymd_opt(2026, 1, 18).unwrap()
        );
    }

    #[test]
    fn test_malformed_date_takes_fallback() {
        assert_eq!(parse_date_or(Some("15/03/2026"), fallback()), fallback());
        assert_eq!(parse_date_or(Some("soon"), fallback()), fallback());
        assert_eq!(parse_date_or(None, fallback()), fallback());
    }
}
