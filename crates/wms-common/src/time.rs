//! Time handling for dimension domains.
//!
//! Timestamps travel as `yyyy-MM-ddTHH:mm:ss.SSSZ` in UTC. Parsing also accepts
//! the same form without the millisecond fraction. All functions here are pure;
//! there is no shared formatter state.

use chrono::{DateTime, Duration, Months, NaiveDateTime, TimeZone, Utc};

/// Output pattern for timestamps, always three fractional digits.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Parse a UTC timestamp token.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let body = s
        .strip_suffix('Z')
        .ok_or_else(|| TimeParseError::InvalidFormat(s.to_string()))?;

    // `%.f` consumes an optional fraction
    let naive = NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|_| TimeParseError::InvalidFormat(s.to_string()))?;

    Ok(Utc.from_utc_datetime(&naive))
}

/// Format a timestamp in the canonical millisecond UTC form.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// An ISO-8601 duration such as `P1D`, `PT6H` or `P1Y2M`.
///
/// Calendar parts (years, months) are kept apart from the fixed-length span so
/// stepping across months follows the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoDuration {
    /// Years and months folded into months
    pub months: u32,
    /// Weeks, days, hours, minutes and seconds
    pub span: Duration,
}

impl IsoDuration {
    /// Parse an ISO-8601 duration string.
    pub fn parse(s: &str) -> Result<Self, TimeParseError> {
        let invalid = || TimeParseError::InvalidDuration(s.to_string());

        let rest = s.strip_prefix('P').ok_or_else(invalid)?;
        if rest.is_empty() {
            return Err(invalid());
        }

        let (date_part, time_part) = match rest.split_once('T') {
            Some((_, t)) if t.is_empty() => return Err(invalid()),
            Some((d, t)) => (d, Some(t)),
            None => (rest, None),
        };

        let mut months: u32 = 0;
        let mut millis: i64 = 0;

        for (value, unit) in components(date_part).ok_or_else(invalid)? {
            let whole = whole_number(value).ok_or_else(invalid)?;
            match unit {
                'Y' => {
                    let years = whole.checked_mul(12).ok_or_else(invalid)?;
                    months = months.checked_add(years).ok_or_else(invalid)?;
                }
                'M' => months = months.checked_add(whole).ok_or_else(invalid)?,
                'W' => millis += i64::from(whole) * 7 * 86_400_000,
                'D' => millis += i64::from(whole) * 86_400_000,
                _ => return Err(invalid()),
            }
        }

        if let Some(time_part) = time_part {
            for (value, unit) in components(time_part).ok_or_else(invalid)? {
                match unit {
                    'H' => millis += i64::from(whole_number(value).ok_or_else(invalid)?) * 3_600_000,
                    'M' => millis += i64::from(whole_number(value).ok_or_else(invalid)?) * 60_000,
                    'S' => {
                        let seconds: f64 = value.parse().map_err(|_| invalid())?;
                        if !seconds.is_finite() || seconds < 0.0 {
                            return Err(invalid());
                        }
                        millis += (seconds * 1000.0).round() as i64;
                    }
                    _ => return Err(invalid()),
                }
            }
        }

        let duration = Self {
            months,
            span: Duration::milliseconds(millis),
        };
        if duration.is_zero() {
            return Err(invalid());
        }
        Ok(duration)
    }

    /// True when the duration does not advance time at all.
    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.span == Duration::zero()
    }

    /// Advance a timestamp by this duration.
    pub fn add_to(&self, dt: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let shifted = if self.months > 0 {
            dt.checked_add_months(Months::new(self.months))?
        } else {
            dt
        };
        shifted.checked_add_signed(self.span)
    }
}

/// Split "1Y2M3D" into [("1",'Y'), ("2",'M'), ("3",'D')].
fn components(s: &str) -> Option<Vec<(&str, char)>> {
    let mut out = Vec::new();
    let mut start = 0;
    for (idx, ch) in s.char_indices() {
        if ch.is_ascii_alphabetic() {
            if idx == start {
                return None;
            }
            out.push((&s[start..idx], ch));
            start = idx + ch.len_utf8();
        }
    }
    if start != s.len() {
        return None;
    }
    Some(out)
}

fn whole_number(s: &str) -> Option<u32> {
    if s.chars().all(|c| c.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Invalid ISO-8601 duration: {0}")]
    InvalidDuration(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_with_and_without_millis() {
        let a = parse_timestamp("2012-02-11T00:00:00Z").unwrap();
        let b = parse_timestamp("2012-02-11T00:00:00.000Z").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.year(), 2012);
        assert_eq!(a.day(), 11);

        let c = parse_timestamp("2024-01-15T12:30:45.250Z").unwrap();
        assert_eq!(c.hour(), 12);
        assert_eq!(c.nanosecond(), 250_000_000);
    }

    #[test]
    fn test_parse_rejects_offsets_and_garbage() {
        assert!(parse_timestamp("2012-02-11T00:00:00+01:00").is_err());
        assert!(parse_timestamp("2012-02-11").is_err());
        assert!(parse_timestamp("1.0").is_err());
    }

    #[test]
    fn test_format_round_trip() {
        let token = "2016-02-23T03:00:00.000Z";
        assert_eq!(format_timestamp(&parse_timestamp(token).unwrap()), token);
    }

    #[test]
    fn test_parse_durations() {
        let day = IsoDuration::parse("P1D").unwrap();
        assert_eq!(day.months, 0);
        assert_eq!(day.span, Duration::days(1));

        let mixed = IsoDuration::parse("P1Y2M3DT4H5M6.5S").unwrap();
        assert_eq!(mixed.months, 14);
        assert_eq!(
            mixed.span,
            Duration::days(3) + Duration::hours(4) + Duration::minutes(5) + Duration::milliseconds(6500)
        );

        assert_eq!(IsoDuration::parse("P2W").unwrap().span, Duration::days(14));
        assert_eq!(IsoDuration::parse("PT6H").unwrap().span, Duration::hours(6));
    }

    #[test]
    fn test_invalid_durations() {
        for raw in ["", "P", "PT", "1D", "P1", "PD", "P1X", "PT1D", "P0D", "P1.5D"] {
            assert!(IsoDuration::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_add_months_follows_calendar() {
        let start = parse_timestamp("2020-01-31T00:00:00Z").unwrap();
        let next = IsoDuration::parse("P1M").unwrap().add_to(start).unwrap();
        assert_eq!(format_timestamp(&next), "2020-02-29T00:00:00.000Z");
    }
}
