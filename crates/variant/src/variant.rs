//! The `Variant` handle.
//!
//! A `Variant` owns one boxed backend value. Everything format-agnostic
//! (probes, typed access, equality, ordering, hashing) lives here or in the
//! modules it delegates to, so backends only answer structural queries.

use core::cmp::Ordering;
use core::fmt::{self, Display, Formatter};
use core::hash::{Hash, Hasher};

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use url::Url;
use uuid::Uuid;

use crate::coerce;
use crate::comparer::VariantComparer;
use crate::composite::CompositeValue;
use crate::contract::{KeyComparison, VariantValue};
use crate::error::VariantResult;
use crate::format::{FormatProvider, SerializeOption};
use crate::kind::{TypeCode, VariantKind};
use crate::primitive::PrimitiveValue;
use crate::scalar::{Scalar, ScalarType};
use crate::timespan::TimeSpan;
use crate::typed::FromVariant;

/// Cloneable handle over any backend value.
#[derive(Debug)]
pub struct Variant(Box<dyn VariantValue>);

impl Variant {
    pub fn new<V: VariantValue>(value: V) -> Self {
        Self(Box::new(value))
    }

    pub fn from_box(value: Box<dyn VariantValue>) -> Self {
        Self(value)
    }

    pub fn inner(&self) -> &dyn VariantValue {
        self.0.as_ref()
    }

    pub fn inner_mut(&mut self) -> &mut dyn VariantValue {
        self.0.as_mut()
    }

    pub fn into_inner(self) -> Box<dyn VariantValue> {
        self.0
    }

    /// Borrows the backend as a concrete type.
    pub fn downcast_ref<B: VariantValue>(&self) -> Option<&B> {
        self.0.as_any().downcast_ref::<B>()
    }

    // ==================== Named constructors ====================

    pub fn null() -> Self {
        Self::new(PrimitiveValue::Null)
    }

    pub fn undefined() -> Self {
        Self::new(PrimitiveValue::Undefined)
    }

    pub fn from_scalar(scalar: Scalar) -> Self {
        Self::new(PrimitiveValue::Scalar(scalar))
    }

    pub fn from_bool(value: bool) -> Self {
        Self::from_scalar(Scalar::Bool(value))
    }

    pub fn from_int64(value: i64) -> Self {
        Self::from_scalar(Scalar::Int(value))
    }

    pub fn from_uint64(value: u64) -> Self {
        Self::from_scalar(Scalar::UInt(value))
    }

    pub fn from_big_integer(value: BigInt) -> Self {
        Self::from_scalar(Scalar::BigInt(value))
    }

    pub fn from_float32(value: f32) -> Self {
        Self::from_scalar(Scalar::F32(value))
    }

    pub fn from_float64(value: f64) -> Self {
        Self::from_scalar(Scalar::F64(value))
    }

    pub fn from_decimal(value: Decimal) -> Self {
        Self::from_scalar(Scalar::Decimal(value))
    }

    pub fn from_char(value: char) -> Self {
        Self::from_scalar(Scalar::Text(value.to_string()))
    }

    pub fn from_string(value: impl Into<String>) -> Self {
        Self::from_scalar(Scalar::Text(value.into()))
    }

    pub fn from_bytes(value: impl Into<Vec<u8>>) -> Self {
        Self::from_scalar(Scalar::Bytes(value.into()))
    }

    pub fn from_guid(value: Uuid) -> Self {
        Self::from_scalar(Scalar::Guid(value))
    }

    pub fn from_date_time(value: DateTime<Utc>) -> Self {
        Self::from_scalar(Scalar::DateTime(value))
    }

    /// Normalises to UTC.
    pub fn from_date_time_offset(value: DateTime<FixedOffset>) -> Self {
        Self::from_date_time(value.with_timezone(&Utc))
    }

    pub fn from_time_span(value: TimeSpan) -> Self {
        Self::from_scalar(Scalar::TimeSpan(value))
    }

    pub fn from_uri(value: Url) -> Self {
        Self::from_scalar(Scalar::Uri(value))
    }

    pub fn array(items: impl IntoIterator<Item = Variant>) -> Self {
        Self::new(CompositeValue::Array(items.into_iter().collect()))
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Variant)>) -> Self {
        Self::new(CompositeValue::Object(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    // ==================== Structure ====================

    pub fn kind(&self) -> VariantKind {
        self.0.kind()
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.keys()
    }

    pub fn values(&self) -> Vec<Variant> {
        self.0.values()
    }

    pub fn entries(&self) -> Vec<(String, Variant)> {
        self.0.entries()
    }

    pub fn count(&self) -> usize {
        self.0.count()
    }

    pub fn raw(&self) -> Option<Scalar> {
        self.0.raw()
    }

    /// Case-insensitive key lookup; a missing key or a non-object yields null.
    pub fn get(&self, key: &str) -> Variant {
        self.0
            .property(key, KeyComparison::IgnoreCase)
            .unwrap_or_else(|| self.0.null())
    }

    pub fn try_get(&self, key: &str, comparison: KeyComparison) -> Option<Variant> {
        self.0.property(key, comparison)
    }

    /// Positional lookup; `None` when out of range or not an array.
    pub fn index(&self, index: usize) -> Option<Variant> {
        self.0.element(index)
    }

    pub fn select(&self, path: &str) -> VariantResult<Variant> {
        self.0.select(path)
    }

    // ==================== Conversion ====================

    /// Typed read with invariant formatting. Null reads as `T::default()`.
    pub fn as_<T: FromVariant>(&self) -> VariantResult<T> {
        T::from_variant(self, FormatProvider::invariant())
    }

    pub fn as_with<T: FromVariant>(&self, provider: &FormatProvider) -> VariantResult<T> {
        T::from_variant(self, provider)
    }

    pub fn to_type(&self, target: ScalarType) -> VariantResult<Option<Scalar>> {
        self.0.to_type(target, FormatProvider::invariant())
    }

    pub fn to_type_with(
        &self,
        target: ScalarType,
        provider: &FormatProvider,
    ) -> VariantResult<Option<Scalar>> {
        self.0.to_type(target, provider)
    }

    pub fn copy(&self, shallow: bool) -> VariantResult<Variant> {
        self.0.copy(shallow)
    }

    pub fn set(&mut self, value: Variant) -> VariantResult<()> {
        self.0.set(value)
    }

    pub fn format(&self, option: SerializeOption) -> String {
        self.0.format(option)
    }

    pub fn type_code(&self) -> TypeCode {
        if self.is_null() {
            TypeCode::Empty
        } else if self.is_boolean() {
            TypeCode::Boolean
        } else if self.is_integer() {
            TypeCode::Int64
        } else if self.is_float() {
            TypeCode::Decimal
        } else if self.is_date_time() {
            TypeCode::DateTime
        } else if self.kind().is_container() || self.is_object() {
            TypeCode::Object
        } else {
            TypeCode::String
        }
    }

    // ==================== Probes ====================

    pub fn is_null(&self) -> bool {
        coerce::is_null(self.inner())
    }

    pub fn is_array(&self) -> bool {
        coerce::is_array(self.inner())
    }

    pub fn is_object(&self) -> bool {
        coerce::is_object(self.inner())
    }

    pub fn is_boolean(&self) -> bool {
        self.try_get_boolean().is_some()
    }

    pub fn is_integer(&self) -> bool {
        self.try_get_integer().is_some()
    }

    pub fn is_float(&self) -> bool {
        self.try_get_float().is_some()
    }

    pub fn is_string(&self) -> bool {
        self.try_get_string().is_some()
    }

    pub fn is_date_time(&self) -> bool {
        self.try_get_date_time().is_some()
    }

    pub fn is_time_span(&self) -> bool {
        self.try_get_time_span().is_some()
    }

    pub fn is_guid(&self) -> bool {
        self.try_get_guid().is_some()
    }

    pub fn try_get_boolean(&self) -> Option<bool> {
        coerce::try_get_boolean(self.inner())
    }

    pub fn try_get_integer(&self) -> Option<BigInt> {
        coerce::try_get_integer(self.inner())
    }

    /// `F32`, `F64` or `Decimal`.
    pub fn try_get_float(&self) -> Option<Scalar> {
        coerce::try_get_float(self.inner())
    }

    pub fn try_get_string(&self) -> Option<String> {
        coerce::try_get_string(self.inner())
    }

    pub fn try_get_date_time(&self) -> Option<DateTime<Utc>> {
        coerce::try_get_date_time(self.inner())
    }

    pub fn try_get_time_span(&self) -> Option<TimeSpan> {
        coerce::try_get_time_span(self.inner())
    }

    pub fn try_get_guid(&self) -> Option<Uuid> {
        coerce::try_get_guid(self.inner())
    }

    // ==================== Typed getters ====================

    pub fn try_as_bool(&self) -> Option<bool> {
        self.try_as()
    }

    pub fn try_as_i64(&self) -> Option<i64> {
        self.try_as()
    }

    pub fn try_as_u64(&self) -> Option<u64> {
        self.try_as()
    }

    pub fn try_as_f64(&self) -> Option<f64> {
        self.try_as()
    }

    pub fn try_as_decimal(&self) -> Option<Decimal> {
        coerce::try_get_decimal(self.inner())
    }

    pub fn try_as_string(&self) -> Option<String> {
        self.try_as()
    }

    pub fn try_as_bytes(&self) -> Option<Vec<u8>> {
        self.try_as()
    }

    pub fn try_as_guid(&self) -> Option<Uuid> {
        self.try_as()
    }

    pub fn try_as_date_time(&self) -> Option<DateTime<Utc>> {
        self.try_as()
    }

    pub fn try_as_time_span(&self) -> Option<TimeSpan> {
        self.try_as()
    }

    fn try_as<T: FromVariant>(&self) -> Option<T> {
        if self.is_null() {
            return None;
        }
        self.as_().ok()
    }

    // ==================== Comparison ====================

    pub fn deep_equals(&self, other: &Variant) -> bool {
        VariantComparer::equals(self.inner(), other.inner())
    }

    pub fn deep_hash(&self) -> u64 {
        VariantComparer::deep_hash(self.inner())
    }

    pub fn compare(&self, other: &Variant) -> Ordering {
        VariantComparer::compare(self.inner(), other.inner())
    }
}

impl Default for Variant {
    fn default() -> Self {
        Self::null()
    }
}

impl Clone for Variant {
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        self.deep_equals(other)
    }
}

impl Eq for Variant {}

impl PartialOrd for Variant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variant {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl Hash for Variant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        VariantComparer::hash_into(self.inner(), state);
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(SerializeOption::None))
    }
}

// ==================== From impls ====================

macro_rules! impl_from_scalar {
    ($($ty:ty => |$v:ident| $expr:expr),* $(,)?) => {
        $(
            impl From<$ty> for Variant {
                fn from($v: $ty) -> Self {
                    Self::from_scalar($expr)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => |v| Scalar::Bool(v),
    i8 => |v| Scalar::Int(i64::from(v)),
    i16 => |v| Scalar::Int(i64::from(v)),
    i32 => |v| Scalar::Int(i64::from(v)),
    i64 => |v| Scalar::Int(v),
    u8 => |v| Scalar::UInt(u64::from(v)),
    u16 => |v| Scalar::UInt(u64::from(v)),
    u32 => |v| Scalar::UInt(u64::from(v)),
    u64 => |v| Scalar::UInt(v),
    BigInt => |v| Scalar::BigInt(v),
    f32 => |v| Scalar::F32(v),
    f64 => |v| Scalar::F64(v),
    Decimal => |v| Scalar::Decimal(v),
    char => |v| Scalar::Text(v.to_string()),
    &str => |v| Scalar::Text(v.to_owned()),
    String => |v| Scalar::Text(v),
    Vec<u8> => |v| Scalar::Bytes(v),
    &[u8] => |v| Scalar::Bytes(v.to_vec()),
    Uuid => |v| Scalar::Guid(v),
    DateTime<Utc> => |v| Scalar::DateTime(v),
    DateTime<FixedOffset> => |v| Scalar::DateTime(v.with_timezone(&Utc)),
    TimeSpan => |v| Scalar::TimeSpan(v),
    TimeDelta => |v| Scalar::TimeSpan(TimeSpan::from(v)),
    Url => |v| Scalar::Uri(v),
}

impl<T: Into<Variant>> From<Option<T>> for Variant {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Variant::null, Into::into)
    }
}

impl From<Vec<Variant>> for Variant {
    fn from(items: Vec<Variant>) -> Self {
        Self::array(items)
    }
}

impl FromIterator<Variant> for Variant {
    fn from_iter<I: IntoIterator<Item = Variant>>(iter: I) -> Self {
        Self::array(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_absence_versus_null() {
        let scalar = Variant::from(5);
        assert!(scalar.get("anything").is_null());
        assert_eq!(scalar.index(0), None);
    }

    #[test]
    fn test_null_reads_as_default() {
        let null = Variant::null();
        assert_eq!(null.as_::<i32>().unwrap(), 0);
        assert_eq!(null.as_::<String>().unwrap(), "");
        assert_eq!(null.as_::<Option<i32>>().unwrap(), None);
        assert_eq!(null.try_as_i64(), None);
    }

    #[rstest]
    #[case(Variant::null(), TypeCode::Empty)]
    #[case(Variant::from(true), TypeCode::Boolean)]
    #[case(Variant::from("17"), TypeCode::Int64)]
    #[case(Variant::from(1.5), TypeCode::Decimal)]
    #[case(Variant::from("2024-01-01T00:00:00Z"), TypeCode::DateTime)]
    #[case(Variant::array([]), TypeCode::Object)]
    #[case(Variant::from("hello"), TypeCode::String)]
    fn test_type_code(#[case] value: Variant, #[case] code: TypeCode) {
        assert_eq!(value.type_code(), code);
    }

    #[test]
    fn test_typed_getters() {
        assert_eq!(Variant::from("42").try_as_i64(), Some(42));
        assert_eq!(Variant::from(2.0).try_as_i64(), Some(2));
        assert_eq!(Variant::from(-1).try_as_u64(), None);
        assert_eq!(Variant::from("x").try_as_f64(), None);
        assert_eq!(
            Variant::from("1.25").try_as_decimal(),
            Some(Decimal::new(125, 2))
        );
        assert_eq!(Variant::from(true).try_as_string().as_deref(), Some("true"));
    }

    #[test]
    fn test_from_option() {
        assert!(Variant::from(None::<i32>).is_null());
        assert_eq!(Variant::from(Some(3)), Variant::from(3));
    }

    #[test]
    fn test_downcast() {
        let value = Variant::from(1);
        assert!(value.downcast_ref::<PrimitiveValue>().is_some());
        assert!(value.downcast_ref::<CompositeValue>().is_none());
    }

    #[test]
    fn test_display_is_canonical() {
        assert_eq!(Variant::from(1.5).to_string(), "1.5");
        assert_eq!(Variant::null().to_string(), "null");
        assert_eq!(
            Variant::array([Variant::from(1), Variant::from("a")]).to_string(),
            "[1,\"a\"]"
        );
    }
}
