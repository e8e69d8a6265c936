//! Host scalars carried by variant leaves.
//!
//! [`Scalar`] is the closed set of primitives a backend can hand out through
//! `raw()`. Its `Display` impl is the canonical string form used by the
//! comparer, so it never depends on locale.

use core::fmt::{self, Display, Formatter};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use url::Url;
use uuid::Uuid;

use crate::kind::VariantKind;
use crate::timespan::TimeSpan;

/// A single host primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    UInt(u64),
    BigInt(BigInt),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Guid(Uuid),
    DateTime(DateTime<Utc>),
    TimeSpan(TimeSpan),
    Uri(Url),
}

/// Conversion target.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    BigInt,
    F32,
    F64,
    Decimal,
    String,
    Bytes,
    Guid,
    DateTime,
    TimeSpan,
    Uri,
}

impl ScalarType {
    pub const ALL: [Self; 19] = [
        Self::Bool,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::BigInt,
        Self::F32,
        Self::F64,
        Self::Decimal,
        Self::String,
        Self::Bytes,
        Self::Guid,
        Self::DateTime,
        Self::TimeSpan,
        Self::Uri,
    ];

    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
                | Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
                | Self::BigInt
        )
    }

    pub const fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, Self::F32 | Self::F64 | Self::Decimal)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::BigInt => "BigInt",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Decimal => "Decimal",
            Self::String => "String",
            Self::Bytes => "bytes",
            Self::Guid => "Guid",
            Self::DateTime => "DateTime",
            Self::TimeSpan => "TimeSpan",
            Self::Uri => "Uri",
        }
    }
}

impl Display for ScalarType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Scalar {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Self::Bool(_) => ScalarType::Bool,
            Self::Int(_) => ScalarType::I64,
            Self::UInt(_) => ScalarType::U64,
            Self::BigInt(_) => ScalarType::BigInt,
            Self::F32(_) => ScalarType::F32,
            Self::F64(_) => ScalarType::F64,
            Self::Decimal(_) => ScalarType::Decimal,
            Self::Text(_) => ScalarType::String,
            Self::Bytes(_) => ScalarType::Bytes,
            Self::Guid(_) => ScalarType::Guid,
            Self::DateTime(_) => ScalarType::DateTime,
            Self::TimeSpan(_) => ScalarType::TimeSpan,
            Self::Uri(_) => ScalarType::Uri,
        }
    }

    /// Kind a typed backend reports for this scalar.
    pub fn kind(&self) -> VariantKind {
        match self {
            Self::Bool(_) => VariantKind::Boolean,
            Self::Int(_) | Self::UInt(_) | Self::BigInt(_) => VariantKind::Integer,
            Self::F32(x) if x.is_infinite() => VariantKind::Primitive,
            Self::F64(x) if x.is_infinite() => VariantKind::Primitive,
            Self::F32(_) | Self::F64(_) | Self::Decimal(_) => VariantKind::Float,
            Self::Text(_) | Self::Uri(_) => VariantKind::Primitive,
            Self::Bytes(_) => VariantKind::Bytes,
            Self::Guid(_) => VariantKind::Guid,
            Self::DateTime(_) => VariantKind::UtcDateTime,
            Self::TimeSpan(_) => VariantKind::TimeSpan,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.scalar_type().is_numeric()
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::BigInt(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
            Self::Bytes(b) => f.write_str(&STANDARD.encode(b)),
            Self::Guid(g) => write!(f, "{}", g.hyphenated()),
            Self::DateTime(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::TimeSpan(ts) => write!(f, "{ts}"),
            Self::Uri(u) => f.write_str(u.as_str()),
        }
    }
}

// ==================== Canonical parsers ====================

/// `true` / `false`, case-insensitive, surrounding whitespace ignored.
pub fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

pub fn parse_big_integer(text: &str) -> Option<BigInt> {
    text.trim().parse().ok()
}

pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    text.parse()
        .ok()
        .or_else(|| Decimal::from_scientific(text).ok())
}

pub fn parse_guid(text: &str) -> Option<Uuid> {
    Uuid::parse_str(text.trim()).ok()
}

pub fn parse_time_span(text: &str) -> Option<TimeSpan> {
    text.parse().ok()
}

/// Date-time text with or without offset; naive forms are read as UTC.
pub fn parse_date_time(text: &str) -> Option<DateTime<Utc>> {
    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    DateTime::parse_from_rfc2822(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Standard base64, rejecting the empty string.
pub fn parse_base64(text: &str) -> Option<Vec<u8>> {
    if text.is_empty() {
        return None;
    }
    STANDARD.decode(text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case(Scalar::Bool(true), "true")]
    #[case(Scalar::Int(-1), "-1")]
    #[case(Scalar::F64(1.0), "1")]
    #[case(Scalar::F64(0.5), "0.5")]
    #[case(Scalar::Decimal(Decimal::new(150, 2)), "1.50")]
    #[case(Scalar::Bytes(b"Hello".to_vec()), "SGVsbG8=")]
    #[case(Scalar::Guid(Uuid::nil()), "00000000-0000-0000-0000-000000000000")]
    #[case(Scalar::DateTime(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()), "2024-01-02T03:04:05Z")]
    #[case(Scalar::TimeSpan(TimeSpan::from_ticks(10_000_000)), "00:00:01")]
    fn test_canonical_string(#[case] scalar: Scalar, #[case] text: &str) {
        assert_eq!(scalar.to_string(), text);
    }

    #[rstest]
    #[case(Scalar::Int(1), VariantKind::Integer)]
    #[case(Scalar::F64(f64::INFINITY), VariantKind::Primitive)]
    #[case(Scalar::F32(f32::NEG_INFINITY), VariantKind::Primitive)]
    #[case(Scalar::F64(f64::NAN), VariantKind::Float)]
    #[case(Scalar::Text("x".into()), VariantKind::Primitive)]
    #[case(Scalar::Bytes(vec![]), VariantKind::Bytes)]
    fn test_kind(#[case] scalar: Scalar, #[case] kind: VariantKind) {
        assert_eq!(scalar.kind(), kind);
    }

    #[test]
    fn test_parse_date_time_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_date_time("2024-01-02T03:04:05Z"), Some(expected));
        assert_eq!(parse_date_time("2024-01-02T05:04:05+02:00"), Some(expected));
        assert_eq!(parse_date_time("2024-01-02 03:04:05"), Some(expected));
        assert_eq!(
            parse_date_time("2024-01-02"),
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_date_time("00000000-0000-0000-0000-000000000000"), None);
        assert_eq!(parse_date_time("42"), None);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool(" TRUE "), Some(true));
        assert_eq!(parse_bool("False"), Some(false));
        assert_eq!(parse_bool("1"), None);
    }

    #[test]
    fn test_parse_base64() {
        assert_eq!(parse_base64("SGVsbG8="), Some(b"Hello".to_vec()));
        assert_eq!(parse_base64("not base64!"), None);
        assert_eq!(parse_base64(""), None);
    }
}
