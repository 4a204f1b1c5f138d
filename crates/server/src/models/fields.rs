//! Lenient deserializers for client-supplied fields.
//!
//! Browser forms tend to send numbers as strings and dates without a time
//! component; both are accepted here and normalized.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, de};

/// A count sent either as a JSON number or as a numeric string.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Number(i64),
    Text(String),
}

/// Parse a deadline from RFC 3339 or a bare `YYYY-MM-DD` date (midnight UTC).
#[must_use]
pub fn parse_deadline(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn count_from_raw<E: de::Error>(raw: RawCount) -> Result<i32, E> {
    let value = match raw {
        RawCount::Number(n) => n,
        RawCount::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| E::custom(format!("expected a whole number, got {s:?}")))?,
    };
    i32::try_from(value).map_err(|_| E::custom(format!("count {value} is out of range")))
}

/// Deserialize a required deadline.
pub fn deadline<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_deadline(&raw).ok_or_else(|| de::Error::custom(format!("invalid deadline {raw:?}")))
}

/// Deserialize an optional deadline (used by partial updates).
pub fn optional_deadline<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| {
            parse_deadline(&raw)
                .ok_or_else(|| de::Error::custom(format!("invalid deadline {raw:?}")))
        })
        .transpose()
}

/// Deserialize a required count.
pub fn count<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    count_from_raw(RawCount::deserialize(deserializer)?)
}

/// Deserialize an optional count (used by partial updates).
pub fn optional_count<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawCount>::deserialize(deserializer)?
        .map(count_from_raw)
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn test_parse_deadline_rfc3339() {
        let ts = parse_deadline("2026-11-02T09:30:00+02:00").unwrap();
        assert_eq!(ts.hour(), 7);
        assert_eq!(ts.day(), 2);
    }

    #[test]
    fn test_parse_deadline_plain_date() {
        let ts = parse_deadline("2026-11-02").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day(), ts.hour()), (2026, 11, 2, 0));
    }

    #[test]
    fn test_parse_deadline_rejects_garbage() {
        assert!(parse_deadline("next tuesday").is_none());
        assert!(parse_deadline("").is_none());
    }

    #[derive(Deserialize)]
    struct Counted {
        #[serde(deserialize_with = "count")]
        n: i32,
    }

    #[test]
    fn test_count_accepts_number_or_string() {
        let a: Counted = serde_json::from_str(r#"{"n": 4}"#).unwrap();
        let b: Counted = serde_json::from_str(r#"{"n": " 4 "}"#).unwrap();
        assert_eq!(a.n, 4);
        assert_eq!(b.n, 4);
        assert!(serde_json::from_str::<Counted>(r#"{"n": "four"}"#).is_err());
        assert!(serde_json::from_str::<Counted>(r#"{"n": 99999999999}"#).is_err());
    }
}
