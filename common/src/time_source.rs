//! Parsing of the time service responses used to seed the clock.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{calendar::CurrentTime, error::NetworkError};

pub const DEFAULT_TIME_SERVICE_BASE: &str = "https://io.adafruit.com/api/v2";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFormat {
    /// JSON object shaped like a C `struct tm`.
    #[default]
    Struct,
    /// Plain ISO-8601 date or date-time text.
    Iso,
}

impl TimeFormat {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "struct" => Some(Self::Struct),
            "iso" => Some(Self::Iso),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StructTimePayload {
    year: i32,
    mon: u32,
    mday: u32,
    hour: u32,
    min: u32,
    sec: u32,
    #[serde(default = "unknown_dst")]
    isdst: i32,
}

fn unknown_dst() -> i32 {
    -1
}

/// Time service URL for an account. The key travels as a query parameter.
pub fn endpoint_url(base: &str, username: &str, key: &str, format: TimeFormat) -> String {
    let base = base.trim_end_matches('/');
    let username: String = form_urlencoded::byte_serialize(username.as_bytes()).collect();
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("x-aio-key", key);

    match format {
        TimeFormat::Struct => {
            format!("{base}/{username}/integrations/time/struct?{}", query.finish())
        }
        TimeFormat::Iso => {
            query.append_pair("fmt", "%Y-%m-%d %H:%M:%S");
            format!("{base}/{username}/integrations/time/strftime?{}", query.finish())
        }
    }
}

pub fn parse_time_payload(format: TimeFormat, body: &str) -> Result<CurrentTime, NetworkError> {
    match format {
        TimeFormat::Struct => parse_struct_time(body),
        TimeFormat::Iso => parse_iso_time(body),
    }
}

fn parse_struct_time(body: &str) -> Result<CurrentTime, NetworkError> {
    let payload: StructTimePayload =
        serde_json::from_str(body).map_err(|err| NetworkError::Malformed(err.to_string()))?;

    let is_dst = match payload.isdst {
        0 => Some(false),
        value if value > 0 => Some(true),
        _ => None,
    };

    CurrentTime::from_fields(
        payload.year,
        payload.mon,
        payload.mday,
        payload.hour,
        payload.min,
        payload.sec,
    )
    .map(|time| time.with_dst(is_dst))
    .ok_or_else(|| {
        NetworkError::Malformed(format!(
            "{}-{}-{} {}:{}:{} is not a valid date-time",
            payload.year, payload.mon, payload.mday, payload.hour, payload.min, payload.sec
        ))
    })
}

/// Accepts a bare date (midnight), a naive date-time with a space or `T`
/// separator, or RFC 3339 text. An explicit offset is dropped and the wall
/// clock reading kept.
fn parse_iso_time(body: &str) -> Result<CurrentTime, NetworkError> {
    let text = body.trim().trim_matches('"').trim();

    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Ok(CurrentTime::new(datetime.naive_local()));
    }

    for pattern in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, pattern) {
            return Ok(CurrentTime::new(datetime));
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(|date| CurrentTime::new(date.and_time(NaiveTime::default())))
        .map_err(|_| NetworkError::Malformed(format!("unrecognised date/time text {text:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_struct_payload() {
        let body = r#"{"year":2025,"mon":4,"mday":29,"hour":12,"min":3,"sec":4,"wday":1,"yday":119,"isdst":1}"#;
        let now = parse_time_payload(TimeFormat::Struct, body).unwrap();

        assert_eq!(now, CurrentTime::from_fields(2025, 4, 29, 12, 3, 4).unwrap().with_dst(Some(true)));
        assert_eq!(now.yearday(), 119);
    }

    #[test]
    fn struct_payload_without_dst_is_unknown() {
        let body = r#"{"year":2025,"mon":1,"mday":1,"hour":0,"min":0,"sec":0}"#;
        let now = parse_time_payload(TimeFormat::Struct, body).unwrap();
        assert_eq!(now.is_dst(), None);
    }

    #[test]
    fn rejects_malformed_struct_payloads() {
        assert!(matches!(
            parse_time_payload(TimeFormat::Struct, "<html>502 Bad Gateway</html>"),
            Err(NetworkError::Malformed(_))
        ));

        let body = r#"{"year":2025,"mon":2,"mday":30,"hour":0,"min":0,"sec":0,"isdst":0}"#;
        assert!(matches!(
            parse_time_payload(TimeFormat::Struct, body),
            Err(NetworkError::Malformed(_))
        ));
    }

    #[test]
    fn parses_iso_text_variants() {
        let expected = CurrentTime::from_fields(2025, 4, 29, 12, 3, 4).unwrap();

        assert_eq!(parse_time_payload(TimeFormat::Iso, "2025-04-29 12:03:04\n").unwrap(), expected);
        assert_eq!(parse_time_payload(TimeFormat::Iso, "2025-04-29T12:03:04").unwrap(), expected);
        assert_eq!(
            parse_time_payload(TimeFormat::Iso, "\"2025-04-29T12:03:04.250Z\"").unwrap(),
            CurrentTime::from_fields(2025, 4, 29, 12, 3, 4).unwrap()
        );
        assert_eq!(
            parse_time_payload(TimeFormat::Iso, "2025-04-29T12:03:04-07:00").unwrap(),
            expected
        );
        assert_eq!(
            parse_time_payload(TimeFormat::Iso, "2025-04-29").unwrap(),
            CurrentTime::from_fields(2025, 4, 29, 0, 0, 0).unwrap()
        );
        assert!(parse_time_payload(TimeFormat::Iso, "tomorrow").is_err());
    }

    #[test]
    fn builds_account_endpoints() {
        assert_eq!(
            endpoint_url(DEFAULT_TIME_SERVICE_BASE, "maker", "k&y", TimeFormat::Struct),
            "https://io.adafruit.com/api/v2/maker/integrations/time/struct?x-aio-key=k%26y"
        );

        let iso = endpoint_url("http://localhost:9000/", "maker", "key", TimeFormat::Iso);
        assert!(iso.starts_with("http://localhost:9000/maker/integrations/time/strftime?x-aio-key=key&fmt="));
    }
}
