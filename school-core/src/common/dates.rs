use crate::common::error::{Result, SchoolError};
use chrono::{DateTime, NaiveDate};

/// Parses a date argument as sent by clients.
///
/// Accepts a plain `YYYY-MM-DD` date, an RFC 3339 timestamp, or a Unix
/// timestamp in seconds.
pub fn parse_date_arg(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(SchoolError::Validation("Date cannot be empty".to_string()));
    }

    if let Ok(seconds) = raw.parse::<i64>() {
        return DateTime::from_timestamp(seconds, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| SchoolError::Validation(format!("Invalid date: {raw}")));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .map_err(|_| SchoolError::Validation(format!("Invalid date: {raw}")))
}

/// Same as [`parse_date_arg`] but treats a missing or blank value as absent.
pub fn parse_optional_date_arg(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date_arg(value).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_date() {
        let date = parse_date_arg("2025-09-01").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
    }

    #[test]
    fn test_parse_unix_seconds() {
        // 2024-01-01T00:00:00Z
        let date = parse_date_arg("1704067200").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_parse_rfc3339() {
        let date = parse_date_arg("2025-03-15T10:30:00+00:00").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
    }

    #[test]
    fn test_rejects_garbage() {
        let err = parse_date_arg("next tuesday").unwrap_err();
        assert!(err.to_string().contains("Invalid date"));
    }

    #[test]
    fn test_blank_optional_is_none() {
        assert_eq!(parse_optional_date_arg(Some("  ")).unwrap(), None);
        assert_eq!(parse_optional_date_arg(None).unwrap(), None);
    }
}
