//! Closed converter registry.
//!
//! Every supported `(source, target)` pair maps to a plain function. The
//! table is built once on first use and never changes afterwards; pairs that
//! are not in the table simply do not convert.

use std::collections::HashMap;
use std::sync::LazyLock;

use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive, Zero};
use rust_decimal::{Decimal, RoundingStrategy};
use url::Url;
use uuid::Uuid;

use crate::format::FormatProvider;
use crate::scalar::{self, Scalar, ScalarType};

/// A single registered conversion.
pub type ConvertFn = fn(&Scalar, ScalarType, &FormatProvider) -> Option<Scalar>;

const NUMERIC_SOURCES: [ScalarType; 6] = [
    ScalarType::I64,
    ScalarType::U64,
    ScalarType::BigInt,
    ScalarType::F32,
    ScalarType::F64,
    ScalarType::Decimal,
];

static REGISTRY: LazyLock<HashMap<(ScalarType, ScalarType), ConvertFn>> = LazyLock::new(build);

fn build() -> HashMap<(ScalarType, ScalarType), ConvertFn> {
    let mut table: HashMap<(ScalarType, ScalarType), ConvertFn> = HashMap::new();

    for source in NUMERIC_SOURCES {
        for target in ScalarType::ALL.into_iter().filter(ScalarType::is_numeric) {
            if source != target {
                table.insert((source, target), numeric_to_numeric);
            }
        }
    }
    for target in ScalarType::ALL {
        if target != ScalarType::String {
            table.insert((ScalarType::String, target), text_to_any);
        }
    }
    for source in ScalarType::ALL {
        if source != ScalarType::String {
            table.insert((source, ScalarType::String), any_to_text);
        }
    }
    table.insert((ScalarType::Guid, ScalarType::Bytes), guid_to_bytes);
    table.insert((ScalarType::Bytes, ScalarType::Guid), bytes_to_guid);

    tracing::debug!(pairs = table.len(), "Converter registry initialised");
    table
}

/// Converts `value` to `target`. Identity when the types already match.
pub fn convert(value: &Scalar, target: ScalarType, provider: &FormatProvider) -> Option<Scalar> {
    let source = value.scalar_type();
    if source == target {
        return Some(value.clone());
    }
    REGISTRY
        .get(&(source, target))
        .and_then(|convert| convert(value, target, provider))
}

/// True when a conversion is registered for the pair.
pub fn can_convert(source: ScalarType, target: ScalarType) -> bool {
    source == target || REGISTRY.contains_key(&(source, target))
}

// ==================== Numeric ====================

/// Intermediate numeric form used between any two numeric scalars.
#[derive(Debug, Clone, PartialEq)]
enum Numeric {
    Integer(BigInt),
    Float(f64),
    Decimal(Decimal),
}

impl Numeric {
    fn of(value: &Scalar) -> Option<Self> {
        Some(match value {
            Scalar::Int(v) => Self::Integer(BigInt::from(*v)),
            Scalar::UInt(v) => Self::Integer(BigInt::from(*v)),
            Scalar::BigInt(v) => Self::Integer(v.clone()),
            Scalar::F32(v) => Self::Float(f64::from(*v)),
            Scalar::F64(v) => Self::Float(*v),
            Scalar::Decimal(v) => Self::Decimal(*v),
            _ => return None,
        })
    }

    /// Integer value, rounding half to even.
    fn rounded(&self) -> Option<BigInt> {
        match self {
            Self::Integer(v) => Some(v.clone()),
            Self::Float(v) => BigInt::from_f64(v.round_ties_even()),
            Self::Decimal(v) => v
                .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
                .to_i128()
                .map(BigInt::from),
        }
    }

    fn truncated(&self) -> Option<BigInt> {
        match self {
            Self::Integer(v) => Some(v.clone()),
            Self::Float(v) => BigInt::from_f64(v.trunc()),
            Self::Decimal(v) => v.trunc().to_i128().map(BigInt::from),
        }
    }

    fn to_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(big_to_f64(v)),
            Self::Float(v) => Some(*v),
            Self::Decimal(v) => v.to_string().parse().ok(),
        }
    }

    fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Integer(v) => v.to_string().parse().ok(),
            Self::Float(v) => Decimal::from_f64(*v),
            Self::Decimal(v) => Some(*v),
        }
    }

    fn emit(&self, target: ScalarType) -> Option<Scalar> {
        match target {
            ScalarType::I8 => signed(self.rounded()?, i64::from(i8::MIN), i64::from(i8::MAX)),
            ScalarType::I16 => signed(self.rounded()?, i64::from(i16::MIN), i64::from(i16::MAX)),
            ScalarType::I32 => signed(self.rounded()?, i64::from(i32::MIN), i64::from(i32::MAX)),
            ScalarType::I64 => signed(self.rounded()?, i64::MIN, i64::MAX),
            ScalarType::U8 => unsigned(self.rounded()?, u64::from(u8::MAX)),
            ScalarType::U16 => unsigned(self.rounded()?, u64::from(u16::MAX)),
            ScalarType::U32 => unsigned(self.rounded()?, u64::from(u32::MAX)),
            ScalarType::U64 => unsigned(self.rounded()?, u64::MAX),
            ScalarType::BigInt => self.truncated().map(Scalar::BigInt),
            ScalarType::F32 => self.to_f64().map(|v| Scalar::F32(v as f32)),
            ScalarType::F64 => self.to_f64().map(Scalar::F64),
            ScalarType::Decimal => self.to_decimal().map(Scalar::Decimal),
            _ => None,
        }
    }
}

fn signed(value: BigInt, min: i64, max: i64) -> Option<Scalar> {
    let v = value.to_i64()?;
    (min..=max).contains(&v).then_some(Scalar::Int(v))
}

fn unsigned(value: BigInt, max: u64) -> Option<Scalar> {
    let v = value.to_u64()?;
    (v <= max).then_some(Scalar::UInt(v))
}

/// Widens a big integer to `f64`, flagging precision loss.
pub(crate) fn big_to_f64(value: &BigInt) -> f64 {
    if value.bits() > u64::from(f64::MANTISSA_DIGITS) && !value.is_zero() {
        tracing::debug!(bits = value.bits(), "Big integer widened to f64 with precision loss");
    }
    value.to_f64().unwrap_or(f64::NAN)
}

fn numeric_to_numeric(value: &Scalar, target: ScalarType, _: &FormatProvider) -> Option<Scalar> {
    Numeric::of(value)?.emit(target)
}

// ==================== Text ====================

fn any_to_text(value: &Scalar, _: ScalarType, provider: &FormatProvider) -> Option<Scalar> {
    let text = value.to_string();
    let text = match value {
        Scalar::F32(_) | Scalar::F64(_) | Scalar::Decimal(_) => provider.localize_number(text),
        _ => text,
    };
    Some(Scalar::Text(text))
}

fn text_to_any(value: &Scalar, target: ScalarType, provider: &FormatProvider) -> Option<Scalar> {
    let text = value.as_text()?;
    match target {
        ScalarType::Bool => scalar::parse_bool(text).map(Scalar::Bool),
        t if t.is_integer() => {
            let number = scalar::parse_big_integer(&provider.normalize_number(text))?;
            Numeric::Integer(number).emit(t)
        }
        ScalarType::F32 => provider
            .normalize_number(text)
            .trim()
            .parse()
            .ok()
            .map(Scalar::F32),
        ScalarType::F64 => provider
            .normalize_number(text)
            .trim()
            .parse()
            .ok()
            .map(Scalar::F64),
        ScalarType::Decimal => scalar::parse_decimal(&provider.normalize_number(text)).map(Scalar::Decimal),
        ScalarType::Bytes => scalar::parse_base64(text.trim()).map(Scalar::Bytes),
        ScalarType::Guid => scalar::parse_guid(text).map(Scalar::Guid),
        ScalarType::DateTime => scalar::parse_date_time(text).map(Scalar::DateTime),
        ScalarType::TimeSpan => scalar::parse_time_span(text).map(Scalar::TimeSpan),
        ScalarType::Uri => Url::parse(text.trim()).ok().map(Scalar::Uri),
        _ => None,
    }
}

// ==================== Guid ====================

fn guid_to_bytes(value: &Scalar, _: ScalarType, _: &FormatProvider) -> Option<Scalar> {
    match value {
        Scalar::Guid(g) => Some(Scalar::Bytes(g.as_bytes().to_vec())),
        _ => None,
    }
}

fn bytes_to_guid(value: &Scalar, _: ScalarType, _: &FormatProvider) -> Option<Scalar> {
    match value {
        Scalar::Bytes(b) => Uuid::from_slice(b).ok().map(Scalar::Guid),
        _ => None,
    }
}
