//! Finish times and the clock-time codec.
//!
//! Finish times are milliseconds elapsed since the event's real start. Operators
//! read and edit them as clock strings (`HH:MM:SS.hh`), and the remote store
//! transmits them the same way, so every conversion goes through this module.
//!
//! # Accepted input
//!
//! | Form          | Example        |
//! |---------------|----------------|
//! | `hh:mm:ss:ms` | `01:02:03:45`  |
//! | `hh:mm:ss.ms` | `01:02:03.45`  |
//! | `hh:mm:ss`    | `1:02:03`      |
//! | `mm:ss`       | `02:03`        |
//! | `mm:ss.ms`    | `2:03.4`       |
//! | `ss.ms`       | `3.45`         |
//!
//! Every field is one or two digits. The fractional field is a decimal
//! fraction of a second, so `.4` is 400 ms and `.45` is 450 ms.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Legacy integer encoding of [`FinishTime::NoTime`].
pub const NO_TIME_SENTINEL: i64 = 9_007_199_254_740_991;

/// Legacy integer encoding of [`FinishTime::Invalid`].
pub const INVALID_SENTINEL: i64 = -1;

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;

/// A finish time at one place.
///
/// Variant order is significant: the derived ordering puts `Invalid` first and
/// `NoTime` last, which matches how the integer sentinels sort and keeps
/// unrecorded places at the tail of a time-sorted record set.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "i64", into = "i64")]
pub enum FinishTime {
    /// Input that could not be parsed as a clock time
    Invalid,
    /// Milliseconds since the event's real start
    Duration(u64),
    /// No time recorded yet
    #[default]
    NoTime,
}

impl FinishTime {
    /// Interpret operator input. Blank input means "no time", anything the
    /// codec rejects is [`FinishTime::Invalid`].
    pub fn from_input(text: &str) -> Self {
        if text.trim().is_empty() {
            return FinishTime::NoTime;
        }
        match parse_clock_time(text) {
            Some(ms) => FinishTime::Duration(ms),
            None => FinishTime::Invalid,
        }
    }

    /// Milliseconds, if a real time is recorded.
    pub fn millis(self) -> Option<u64> {
        match self {
            FinishTime::Duration(ms) => Some(ms),
            _ => None,
        }
    }

    /// True for [`FinishTime::Duration`].
    pub fn is_recorded(self) -> bool {
        matches!(self, FinishTime::Duration(_))
    }

    /// True for [`FinishTime::NoTime`].
    pub fn is_missing(self) -> bool {
        matches!(self, FinishTime::NoTime)
    }
}

impl From<i64> for FinishTime {
    fn from(raw: i64) -> Self {
        if raw < 0 {
            FinishTime::Invalid
        } else if raw >= NO_TIME_SENTINEL {
            FinishTime::NoTime
        } else {
            FinishTime::Duration(raw as u64)
        }
    }
}

impl From<FinishTime> for i64 {
    fn from(time: FinishTime) -> Self {
        match time {
            FinishTime::Invalid => INVALID_SENTINEL,
            FinishTime::NoTime => NO_TIME_SENTINEL,
            FinishTime::Duration(ms) => ms.min((NO_TIME_SENTINEL - 1) as u64) as i64,
        }
    }
}

impl From<u64> for FinishTime {
    fn from(ms: u64) -> Self {
        FinishTime::Duration(ms)
    }
}

/// Renders `""` for no time and `"NaN"` for invalid input, everywhere.
impl fmt::Display for FinishTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinishTime::NoTime => Ok(()),
            FinishTime::Invalid => f.write_str("NaN"),
            FinishTime::Duration(ms) => f.write_str(&format_clock_time(*ms)),
        }
    }
}

/// Parse a clock-time string into milliseconds.
///
/// Returns `None` for anything outside the accepted grammar, including blank
/// input and bare integers such as `"45"`.
pub fn parse_clock_time(text: &str) -> Option<u64> {
    let text = text.trim();

    // hh:mm:ss:ms is hh:mm:ss.ms with a colon for the fraction
    let normalized: Cow<'_, str> = if text.matches(':').count() == 3 && !text.contains('.') {
        let split = text.rfind(':')?;
        Cow::Owned(format!("{}.{}", &text[..split], &text[split + 1..]))
    } else {
        Cow::Borrowed(text)
    };

    let (clock, fraction) = match normalized.split_once('.') {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (normalized.as_ref(), None),
    };

    let fields = clock
        .split(':')
        .map(parse_field)
        .collect::<Option<Vec<u64>>>()?;

    let (hours, minutes, seconds) = match (fields.as_slice(), fraction) {
        ([seconds], Some(_)) => (0, 0, *seconds),
        ([minutes, seconds], _) => (0, *minutes, *seconds),
        ([hours, minutes, seconds], _) => (*hours, *minutes, *seconds),
        _ => return None,
    };

    let fraction_ms = match fraction {
        Some(fraction) => parse_fraction(fraction)?,
        None => 0,
    };

    Some(hours * MS_PER_HOUR + minutes * MS_PER_MINUTE + seconds * MS_PER_SECOND + fraction_ms)
}

/// Render milliseconds as `HH:MM:SS.hh`.
///
/// The fraction is truncated to hundredths and hours wrap at 24.
pub fn format_clock_time(ms: u64) -> String {
    let hours = (ms / MS_PER_HOUR) % 24;
    let minutes = (ms / MS_PER_MINUTE) % 60;
    let seconds = (ms / MS_PER_SECOND) % 60;
    let hundredths = (ms % MS_PER_SECOND) / 10;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{hundredths:02}")
}

fn parse_field(field: &str) -> Option<u64> {
    if field.is_empty() || field.len() > 2 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

fn parse_fraction(fraction: &str) -> Option<u64> {
    let value = parse_field(fraction)?;
    Some(if fraction.len() == 1 {
        value * 100
    } else {
        value * 10
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_accepted_form() {
        assert_eq!(parse_clock_time("01:02:03:45"), Some(3_723_450));
        assert_eq!(parse_clock_time("01:02:03.45"), Some(3_723_450));
        assert_eq!(parse_clock_time("1:02:03"), Some(3_723_000));
        assert_eq!(parse_clock_time("02:03"), Some(123_000));
        assert_eq!(parse_clock_time("2:03.4"), Some(123_400));
        assert_eq!(parse_clock_time("3.45"), Some(3_450));
    }

    #[test]
    fn rejects_malformed_input() {
        for text in [
            "", "45", ":45", "1:", "abc", "1:2:3:4:5", "123:00", "00:00.123", "1.2.3",
            "01:02:03:45.6", "-1:00",
        ] {
            assert_eq!(parse_clock_time(text), None, "accepted {text:?}");
        }
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(parse_clock_time("  00:01:00.00 "), Some(60_000));
    }

    #[test]
    fn formats_with_two_digit_fields() {
        assert_eq!(format_clock_time(0), "00:00:00.00");
        assert_eq!(format_clock_time(60_000), "00:01:00.00");
        assert_eq!(format_clock_time(3_723_456), "01:02:03.45");
    }

    #[test]
    fn format_wraps_hours() {
        assert_eq!(format_clock_time(25 * MS_PER_HOUR), "01:00:00.00");
    }

    #[test]
    fn input_classification() {
        assert_eq!(FinishTime::from_input(""), FinishTime::NoTime);
        assert_eq!(FinishTime::from_input("   "), FinishTime::NoTime);
        assert_eq!(FinishTime::from_input("1:00"), FinishTime::Duration(60_000));
        assert_eq!(FinishTime::from_input("soon"), FinishTime::Invalid);
    }

    #[test]
    fn display_conventions() {
        assert_eq!(FinishTime::NoTime.to_string(), "");
        assert_eq!(FinishTime::Invalid.to_string(), "NaN");
        assert_eq!(FinishTime::Duration(120_000).to_string(), "00:02:00.00");
    }

    #[test]
    fn ordering_matches_sentinels() {
        let mut times = vec![
            FinishTime::NoTime,
            FinishTime::Duration(5),
            FinishTime::Invalid,
            FinishTime::Duration(1),
        ];
        times.sort();
        assert_eq!(
            times,
            vec![
                FinishTime::Invalid,
                FinishTime::Duration(1),
                FinishTime::Duration(5),
                FinishTime::NoTime,
            ]
        );
    }

    #[test]
    fn legacy_integer_encoding() {
        assert_eq!(FinishTime::from(-1i64), FinishTime::Invalid);
        assert_eq!(FinishTime::from(NO_TIME_SENTINEL), FinishTime::NoTime);
        assert_eq!(FinishTime::from(5_000i64), FinishTime::Duration(5_000));
        assert_eq!(i64::from(FinishTime::NoTime), NO_TIME_SENTINEL);

        let json = serde_json::to_string(&vec![FinishTime::Invalid, FinishTime::Duration(7)])
            .unwrap();
        assert_eq!(json, "[-1,7]");
        let parsed: Vec<FinishTime> = serde_json::from_str("[9007199254740991,42]").unwrap();
        assert_eq!(parsed, vec![FinishTime::NoTime, FinishTime::Duration(42)]);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_round_trip_in_hundredths(steps in 0u64..=8_639_999) {
                let ms = steps * 10;
                prop_assert_eq!(parse_clock_time(&format_clock_time(ms)), Some(ms));
            }

            #[test]
            fn prop_format_truncates_to_hundredths(ms in 0u64..86_400_000) {
                let parsed = parse_clock_time(&format_clock_time(ms)).unwrap();
                prop_assert_eq!(parsed, ms - ms % 10);
            }
        }
    }
}
