//! Coercion probes.
//!
//! A probe answers "can this value be read as K, and what is its parsed
//! form". Probes never fail: every strategy error is swallowed and reported
//! as `None`. Strategies run in a fixed order:
//!
//! 1. the native scalar already is K;
//! 2. textual data goes through the canonical parser for K;
//! 3. the converter registry;
//! 4. the canonical string, parsed again;
//! 5. the backend's own `to_type`.
//!
//! Boolean, GUID, duration and date-time probes stop after step 1 for
//! numeric scalars, so a number is never read as a date or a flag.

use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::contract::VariantValue;
use crate::convert::{self, big_to_f64};
use crate::format::{FormatProvider, SerializeOption};
use crate::kind::VariantKind;
use crate::scalar::{self, Scalar, ScalarType};
use crate::timespan::TimeSpan;

struct Probe<T> {
    target: ScalarType,
    native: fn(&Scalar) -> Option<T>,
    parse: fn(&str) -> Option<T>,
    widen_numeric: bool,
}

impl<T> Probe<T> {
    fn run(&self, value: &dyn VariantValue) -> Option<T> {
        if !value.kind().is_scalar() {
            return None;
        }
        let raw = value.raw()?;
        if let Some(found) = (self.native)(&raw) {
            return Some(found);
        }
        if let Scalar::Text(text) = &raw {
            if let Some(found) = (self.parse)(text) {
                return Some(found);
            }
        } else if raw.is_numeric() && !self.widen_numeric {
            return None;
        } else {
            let converted = convert::convert(&raw, self.target, FormatProvider::invariant())
                .and_then(|s| (self.native)(&s));
            if converted.is_some() {
                return converted;
            }
            if let Some(found) = (self.parse)(&value.format(SerializeOption::None)) {
                return Some(found);
            }
        }
        value
            .to_type(self.target, FormatProvider::invariant())
            .ok()
            .flatten()
            .and_then(|s| (self.native)(&s))
    }
}

// ==================== Structural ====================

pub fn is_null(value: &dyn VariantValue) -> bool {
    value.kind().is_nullish()
}

pub fn is_object(value: &dyn VariantValue) -> bool {
    value.kind() == VariantKind::Object || !value.keys().is_empty()
}

/// Arrays, byte blobs, and text that decodes as standard base64.
pub fn is_array(value: &dyn VariantValue) -> bool {
    if matches!(value.kind(), VariantKind::Array | VariantKind::Bytes) {
        return true;
    }
    let raw = value.raw();
    if matches!(raw, Some(Scalar::Bytes(_))) || value.count() > 0 {
        return true;
    }
    if is_object(value) {
        return false;
    }
    matches!(raw, Some(Scalar::Text(text)) if scalar::parse_base64(&text).is_some())
}

// ==================== Scalar probes ====================

pub fn try_get_boolean(value: &dyn VariantValue) -> Option<bool> {
    Probe {
        target: ScalarType::Bool,
        native: |s| match s {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        },
        parse: scalar::parse_bool,
        widen_numeric: false,
    }
    .run(value)
}

/// Integral values as big integers; floats only when they have no fraction.
pub fn try_get_integer(value: &dyn VariantValue) -> Option<BigInt> {
    if let Some(raw) = value.raw().filter(|_| value.kind().is_scalar())
        && raw.is_numeric()
    {
        return integral(&raw);
    }
    Probe {
        target: ScalarType::BigInt,
        native: |s| match s {
            Scalar::BigInt(v) => Some(v.clone()),
            _ => None,
        },
        parse: scalar::parse_big_integer,
        widen_numeric: true,
    }
    .run(value)
}

fn integral(raw: &Scalar) -> Option<BigInt> {
    match raw {
        Scalar::Int(v) => Some(BigInt::from(*v)),
        Scalar::UInt(v) => Some(BigInt::from(*v)),
        Scalar::BigInt(v) => Some(v.clone()),
        Scalar::F32(v) if v.is_finite() && v.floor() == *v => BigInt::from_f32(*v),
        Scalar::F64(v) if v.is_finite() && v.floor() == *v => BigInt::from_f64(*v),
        Scalar::Decimal(v) if v.fract().is_zero() => v.trunc().to_i128().map(BigInt::from),
        _ => None,
    }
}

/// Floating or decimal form; text prefers `Decimal`, then `f64`.
pub fn try_get_float(value: &dyn VariantValue) -> Option<Scalar> {
    Probe {
        target: ScalarType::F64,
        native: |s| match s {
            Scalar::Int(v) => Some(Scalar::F64(*v as f64)),
            Scalar::UInt(v) => Some(Scalar::F64(*v as f64)),
            Scalar::BigInt(v) => Some(Scalar::F64(big_to_f64(v))),
            Scalar::F32(_) | Scalar::F64(_) | Scalar::Decimal(_) => Some(s.clone()),
            _ => None,
        },
        parse: |text| {
            let text = text.trim();
            text.parse::<Decimal>()
                .ok()
                .map(Scalar::Decimal)
                .or_else(|| text.parse::<f64>().ok().map(Scalar::F64))
        },
        widen_numeric: true,
    }
    .run(value)
}

/// Every scalar reads as its canonical string.
pub fn try_get_string(value: &dyn VariantValue) -> Option<String> {
    if !value.kind().is_scalar() {
        return None;
    }
    match value.raw()? {
        Scalar::Text(text) => Some(text),
        _ => Some(value.format(SerializeOption::None)),
    }
}

pub fn try_get_date_time(value: &dyn VariantValue) -> Option<DateTime<Utc>> {
    Probe {
        target: ScalarType::DateTime,
        native: |s| match s {
            Scalar::DateTime(dt) => Some(*dt),
            _ => None,
        },
        parse: scalar::parse_date_time,
        widen_numeric: false,
    }
    .run(value)
}

pub fn try_get_time_span(value: &dyn VariantValue) -> Option<TimeSpan> {
    Probe {
        target: ScalarType::TimeSpan,
        native: |s| match s {
            Scalar::TimeSpan(ts) => Some(*ts),
            _ => None,
        },
        parse: scalar::parse_time_span,
        widen_numeric: false,
    }
    .run(value)
}

pub fn try_get_guid(value: &dyn VariantValue) -> Option<Uuid> {
    Probe {
        target: ScalarType::Guid,
        native: |s| match s {
            Scalar::Guid(g) => Some(*g),
            _ => None,
        },
        parse: scalar::parse_guid,
        widen_numeric: false,
    }
    .run(value)
}

pub fn try_get_decimal(value: &dyn VariantValue) -> Option<Decimal> {
    match try_get_float(value)? {
        Scalar::Decimal(d) => Some(d),
        other => convert::convert(&other, ScalarType::Decimal, FormatProvider::invariant()).and_then(
            |s| match s {
                Scalar::Decimal(d) => Some(d),
                _ => None,
            },
        ),
    }
}
