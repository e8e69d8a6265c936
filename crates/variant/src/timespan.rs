//! Duration scalar with a constant textual form.
//!
//! Text form is `[-][d.]hh:mm:ss[.fffffff]`, seven fractional digits of
//! 100-nanosecond ticks. A bare number is not a time span, so numeric text
//! never lands in the temporal class.

use core::fmt::{self, Display, Formatter};
use core::str::FromStr;

use chrono::TimeDelta;

/// 100-nanosecond ticks per second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;
const TICKS_PER_MINUTE: i64 = TICKS_PER_SECOND * 60;
const TICKS_PER_HOUR: i64 = TICKS_PER_MINUTE * 60;
const TICKS_PER_DAY: i64 = TICKS_PER_HOUR * 24;

/// Signed duration with tick precision.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSpan(TimeDelta);

/// Error returned when text is not a time span.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time span: '{0}'")]
pub struct ParseTimeSpanError(String);

impl TimeSpan {
    pub const ZERO: Self = Self(TimeDelta::zero());

    pub fn new(delta: TimeDelta) -> Self {
        Self(delta)
    }

    /// Builds a span from 100-nanosecond ticks.
    pub fn from_ticks(ticks: i64) -> Self {
        let secs = ticks / TICKS_PER_SECOND;
        let rem = ticks % TICKS_PER_SECOND;
        let whole = TimeDelta::try_seconds(secs).unwrap_or(TimeDelta::MAX);
        Self(whole + TimeDelta::nanoseconds(rem * 100))
    }

    /// Total 100-nanosecond ticks, saturating at the `i64` range.
    pub fn ticks(&self) -> i64 {
        let total = i128::from(self.0.num_seconds()) * i128::from(TICKS_PER_SECOND)
            + i128::from(self.0.subsec_nanos() / 100);
        i64::try_from(total).unwrap_or(if total < 0 { i64::MIN } else { i64::MAX })
    }

    pub fn as_delta(&self) -> TimeDelta {
        self.0
    }
}

impl From<TimeDelta> for TimeSpan {
    fn from(delta: TimeDelta) -> Self {
        Self(delta)
    }
}

impl From<TimeSpan> for TimeDelta {
    fn from(span: TimeSpan) -> Self {
        span.0
    }
}

impl Display for TimeSpan {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ticks = i128::from(self.ticks());
        let abs = ticks.unsigned_abs();
        if ticks < 0 {
            f.write_str("-")?;
        }
        let day = TICKS_PER_DAY as u128;
        let days = abs / day;
        let rest = abs % day;
        if days > 0 {
            write!(f, "{days}.")?;
        }
        let hours = rest / TICKS_PER_HOUR as u128;
        let minutes = rest % TICKS_PER_HOUR as u128 / TICKS_PER_MINUTE as u128;
        let seconds = rest % TICKS_PER_MINUTE as u128 / TICKS_PER_SECOND as u128;
        let fraction = rest % TICKS_PER_SECOND as u128;
        write!(f, "{hours:02}:{minutes:02}:{seconds:02}")?;
        if fraction > 0 {
            write!(f, ".{fraction:07}")?;
        }
        Ok(())
    }
}

impl FromStr for TimeSpan {
    type Err = ParseTimeSpanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s.trim()).ok_or_else(|| ParseTimeSpanError(s.to_owned()))
    }
}

fn parse(s: &str) -> Option<TimeSpan> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let parts: Vec<&str> = body.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }

    let (days, hours) = match parts[0].split_once('.') {
        Some((d, h)) => (digits(d)?, digits(h)?),
        None => (0, digits(parts[0])?),
    };
    let minutes = digits(parts[1])?;
    let (seconds, fraction) = match parts.get(2) {
        Some(sec) => match sec.split_once('.') {
            Some((whole, frac)) => (digits(whole)?, fraction_ticks(frac)?),
            None => (digits(sec)?, 0),
        },
        None => (0, 0),
    };
    if hours > 23 || minutes > 59 || seconds > 59 {
        return None;
    }

    let ticks = days
        .checked_mul(TICKS_PER_DAY)?
        .checked_add(hours * TICKS_PER_HOUR)?
        .checked_add(minutes * TICKS_PER_MINUTE)?
        .checked_add(seconds * TICKS_PER_SECOND)?
        .checked_add(fraction)?;
    Some(TimeSpan::from_ticks(if negative { -ticks } else { ticks }))
}

fn digits(s: &str) -> Option<i64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn fraction_ticks(s: &str) -> Option<i64> {
    if s.is_empty() || s.len() > 7 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let padded = format!("{s:0<7}");
    padded.parse().ok()
}

impl serde::Serialize for TimeSpan {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for TimeSpan {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
