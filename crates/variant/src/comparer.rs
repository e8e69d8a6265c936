//! Structural equality, ordering and hashing across backends.
//!
//! Two values meet on their *structural class*: typed scalar kinds fold into
//! `Primitive`, so an in-memory integer and a decoded wire integer can be
//! equal. Within the primitive class every scalar is reduced to one
//! normalized form (a number, a boolean, a GUID, an instant, a time span or
//! plain text) and equality, ordering and hashing all read that form. Text
//! goes through the same parsers as the typed scalars, so `"TRUE"`, `true`
//! and `"true"` land in one equivalence class.
//!
//! Backends can short-circuit with the `fast_path_*` hooks; those are
//! consulted first for containers and only when no raw datum is available
//! for scalars.

use core::cmp::Ordering;
use core::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;

use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use uuid::Uuid;

use crate::contract::VariantValue;
use crate::format::SerializeOption;
use crate::kind::VariantKind;
use crate::scalar::{self, Scalar};
use crate::timespan::TimeSpan;
use crate::variant::Variant;

/// Stateless comparer used by `Variant`'s `Eq`, `Ord` and `Hash`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariantComparer;

impl VariantComparer {
    pub fn equals(x: &dyn VariantValue, y: &dyn VariantValue) -> bool {
        if same_object(x, y) {
            return true;
        }
        let class = x.kind().structural();
        if class != y.kind().structural() {
            return false;
        }
        match class {
            VariantKind::Null | VariantKind::Undefined => true,
            VariantKind::Array => {
                if fast_path_agrees(x, y) {
                    return true;
                }
                let (left, right) = (x.values(), y.values());
                left.len() == right.len()
                    && left
                        .iter()
                        .zip(&right)
                        .all(|(a, b)| Self::equals(a.inner(), b.inner()))
            }
            VariantKind::Object => {
                if fast_path_agrees(x, y) {
                    return true;
                }
                let (left, right) = (sorted_entries(x), sorted_entries(y));
                left.len() == right.len()
                    && left.iter().zip(&right).all(|((ka, va), (kb, vb))| {
                        ka == kb && Self::equals(va.inner(), vb.inner())
                    })
            }
            _ => scalar_equals(x, y),
        }
    }

    pub fn compare(x: &dyn VariantValue, y: &dyn VariantValue) -> Ordering {
        if Self::equals(x, y) {
            return Ordering::Equal;
        }
        // A fast path may only break ties the comparer would also break.
        if let Some(ordering) = x.fast_path_compare(y).filter(|o| o.is_ne()) {
            return ordering;
        }
        if let Some(ordering) = y.fast_path_compare(x).filter(|o| o.is_ne()) {
            return ordering.reverse();
        }

        let (cx, cy) = (x.kind().structural(), y.kind().structural());
        if cx != cy && (cx != VariantKind::Primitive || cy != VariantKind::Primitive) {
            return cx.hash_code().cmp(&cy.hash_code());
        }
        if cx == cy && cx == VariantKind::Array {
            return compare_arrays(x, y);
        }
        if cx == cy && cx == VariantKind::Object {
            return compare_objects(x, y);
        }

        if let (Some(a), Some(b)) = (x.raw(), y.raw()) {
            let ordering = Normalized::of(&a).cmp(&Normalized::of(&b));
            if ordering.is_ne() {
                return ordering;
            }
        }
        x.format(SerializeOption::None)
            .cmp(&y.format(SerializeOption::None))
    }

    /// Order-normalised deep hash.
    pub fn deep_hash(value: &dyn VariantValue) -> u64 {
        let mut hasher = DefaultHasher::new();
        Self::hash_into(value, &mut hasher);
        hasher.finish()
    }

    pub fn hash_into<H: Hasher>(value: &dyn VariantValue, state: &mut H) {
        let kind = value.kind();
        state.write_u8(kind.hash_code());
        match kind.structural() {
            VariantKind::Null | VariantKind::Undefined => {}
            VariantKind::Bytes => value.format(SerializeOption::None).hash(state),
            VariantKind::Array => {
                let items = value.values();
                state.write_usize(items.len());
                for item in &items {
                    Self::hash_into(item.inner(), state);
                }
            }
            VariantKind::Object => {
                let entries = sorted_entries(value);
                state.write_usize(entries.len());
                for (key, item) in &entries {
                    key.hash(state);
                    Self::hash_into(item.inner(), state);
                }
            }
            _ => match value.raw() {
                Some(raw) => Normalized::of(&raw).hash(state),
                None => value.format(SerializeOption::None).hash(state),
            },
        }
    }
}

fn same_object(x: &dyn VariantValue, y: &dyn VariantValue) -> bool {
    core::ptr::addr_eq(x, y)
}

/// Only a positive fast-path answer is trusted for containers.
fn fast_path_agrees(x: &dyn VariantValue, y: &dyn VariantValue) -> bool {
    x.fast_path_equals(y) == Some(true) || y.fast_path_equals(x) == Some(true)
}

fn sorted_entries(value: &dyn VariantValue) -> Vec<(String, Variant)> {
    let mut entries = value.entries();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries
}

fn scalar_equals(x: &dyn VariantValue, y: &dyn VariantValue) -> bool {
    if let (Some(a), Some(b)) = (x.raw(), y.raw()) {
        return Normalized::of(&a) == Normalized::of(&b);
    }
    if x.format(SerializeOption::None) == y.format(SerializeOption::None) {
        return true;
    }
    tracing::trace!(left = %x.kind(), right = %y.kind(), "Scalar equality falls back to backend");
    x.fast_path_equals(y).or_else(|| y.fast_path_equals(x)) == Some(true)
}

fn compare_arrays(x: &dyn VariantValue, y: &dyn VariantValue) -> Ordering {
    let (left, right) = (x.values(), y.values());
    for (a, b) in left.iter().zip(&right) {
        match VariantComparer::compare(a.inner(), b.inner()) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    left.len().cmp(&right.len())
}

fn compare_objects(x: &dyn VariantValue, y: &dyn VariantValue) -> Ordering {
    let (left, right) = (sorted_entries(x), sorted_entries(y));
    for ((ka, va), (kb, vb)) in left.iter().zip(&right) {
        let ordering = ka
            .cmp(kb)
            .then_with(|| VariantComparer::compare(va.inner(), vb.inner()));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    left.len().cmp(&right.len())
}

// ==================== Numeric form ====================

/// Exact integers when integral, `f64` otherwise.
///
/// Floats and decimals go through their canonical string, so two scalars with
/// the same canonical string always share a numeric form.
#[derive(Debug, Clone)]
pub(crate) enum NumericForm {
    Integer(BigInt),
    Real(f64),
}

impl NumericForm {
    pub(crate) fn of(value: &Scalar) -> Option<Self> {
        match value {
            Scalar::Int(v) => Some(Self::Integer(BigInt::from(*v))),
            Scalar::UInt(v) => Some(Self::Integer(BigInt::from(*v))),
            Scalar::BigInt(v) => Some(Self::Integer(v.clone())),
            Scalar::F32(_) | Scalar::F64(_) | Scalar::Decimal(_) => Self::parse(&value.to_string()),
            Scalar::Text(text) => Self::parse(text),
            _ => None,
        }
    }

    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(integer) = scalar::parse_big_integer(text) {
            return Some(Self::Integer(integer));
        }
        let real: f64 = text.parse().ok()?;
        if real.is_finite() && real.fract() == 0.0 {
            // Shortest round-trip digits, so `1e300` and its expansion agree.
            return real.to_string().parse().ok().map(Self::Integer);
        }
        Some(Self::Real(real))
    }

    fn is_nan(&self) -> bool {
        matches!(self, Self::Real(v) if v.is_nan())
    }

    /// Numeric order with NaN above every number and equal to itself.
    fn total_cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
            .unwrap_or_else(|| self.is_nan().cmp(&other.is_nan()))
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Real(a), Self::Real(b)) => a.partial_cmp(b),
            (Self::Integer(a), Self::Real(b)) => integer_vs_real(a, *b),
            (Self::Real(a), Self::Integer(b)) => integer_vs_real(b, *a).map(Ordering::reverse),
        }
    }
}

fn integer_vs_real(integer: &BigInt, real: f64) -> Option<Ordering> {
    if real.is_nan() {
        return None;
    }
    if real.is_infinite() {
        return Some(if real > 0.0 {
            Ordering::Less
        } else {
            Ordering::Greater
        });
    }
    let floor: BigInt = real.floor().to_string().parse().ok()?;
    Some(match integer.cmp(&floor) {
        Ordering::Equal if real > real.floor() => Ordering::Less,
        other => other,
    })
}

impl PartialEq for NumericForm {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Real(a), Self::Real(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => false,
        }
    }
}

impl Hash for NumericForm {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Integer(v) => {
                state.write_u8(0);
                v.hash(state);
            }
            Self::Real(v) => {
                state.write_u8(1);
                let bits = if v.is_nan() { f64::NAN.to_bits() } else { v.to_bits() };
                state.write_u64(bits);
            }
        }
    }
}

/// Equivalence class of a primitive scalar.
///
/// Text and URIs are parsed in a fixed order: number, boolean, GUID,
/// date-time, time span, else the string itself.
#[derive(PartialEq, Hash)]
enum Normalized {
    Numeric(NumericForm),
    Bool(bool),
    Guid(Uuid),
    DateTime(i64, u32),
    TimeSpan(TimeSpan),
    Text(String),
}

impl Normalized {
    fn of(raw: &Scalar) -> Self {
        match raw {
            Scalar::Bool(b) => Self::Bool(*b),
            Scalar::Guid(g) => Self::Guid(*g),
            Scalar::DateTime(dt) => Self::date_time(dt),
            Scalar::TimeSpan(ts) => Self::TimeSpan(*ts),
            Scalar::Text(text) => Self::of_text(text),
            Scalar::Uri(url) => Self::of_text(url.as_str()),
            _ => NumericForm::of(raw).map_or_else(|| Self::Text(raw.to_string()), Self::Numeric),
        }
    }

    fn of_text(text: &str) -> Self {
        if let Some(numeric) = NumericForm::parse(text) {
            return Self::Numeric(numeric);
        }
        if let Some(b) = scalar::parse_bool(text) {
            return Self::Bool(b);
        }
        if let Some(g) = scalar::parse_guid(text) {
            return Self::Guid(g);
        }
        if let Some(dt) = scalar::parse_date_time(text) {
            return Self::date_time(&dt);
        }
        if let Some(ts) = scalar::parse_time_span(text) {
            return Self::TimeSpan(ts);
        }
        Self::Text(text.to_owned())
    }

    fn date_time(dt: &DateTime<Utc>) -> Self {
        Self::DateTime(dt.timestamp(), dt.timestamp_subsec_nanos())
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Numeric(_) => 0,
            Self::Bool(_) => 1,
            Self::Guid(_) => 2,
            Self::DateTime(..) => 3,
            Self::TimeSpan(_) => 4,
            Self::Text(_) => 5,
        }
    }

    /// Total order: by class, then by value within the class.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Numeric(a), Self::Numeric(b)) => a.total_cmp(b),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Guid(a), Self::Guid(b)) => a.cmp(b),
            (Self::DateTime(sa, na), Self::DateTime(sb, nb)) => (sa, na).cmp(&(sb, nb)),
            (Self::TimeSpan(a), Self::TimeSpan(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}
