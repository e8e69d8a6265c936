//! Typed reads out of a variant.

use chrono::{DateTime, TimeDelta, Utc};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use url::Url;
use uuid::Uuid;

use crate::error::{VariantError, VariantResult};
use crate::format::FormatProvider;
use crate::scalar::{Scalar, ScalarType};
use crate::timespan::TimeSpan;
use crate::variant::Variant;

/// Host types that can be produced from a converted scalar.
pub trait FromScalar: Sized {
    const TARGET: ScalarType;

    fn from_scalar(scalar: Scalar) -> Option<Self>;
}

/// Types readable with [`Variant::as_`].
pub trait FromVariant: Sized {
    fn from_variant(value: &Variant, provider: &FormatProvider) -> VariantResult<Self>;
}

fn read<T: FromScalar>(value: &Variant, provider: &FormatProvider) -> VariantResult<Option<T>> {
    match value.to_type_with(T::TARGET, provider)? {
        None => Ok(None),
        Some(scalar) => T::from_scalar(scalar)
            .map(Some)
            .ok_or_else(|| VariantError::conversion(value.kind(), T::TARGET)),
    }
}

macro_rules! impl_typed {
    ($($ty:ty => $target:ident, |$s:ident| $body:expr;)*) => {
        $(
            impl FromScalar for $ty {
                const TARGET: ScalarType = ScalarType::$target;

                fn from_scalar($s: Scalar) -> Option<Self> {
                    $body
                }
            }

            impl FromVariant for $ty {
                fn from_variant(value: &Variant, provider: &FormatProvider) -> VariantResult<Self> {
                    read::<$ty>(value, provider).map(Option::unwrap_or_default)
                }
            }

            impl FromVariant for Option<$ty> {
                fn from_variant(value: &Variant, provider: &FormatProvider) -> VariantResult<Self> {
                    read::<$ty>(value, provider)
                }
            }
        )*
    };
}

fn signed<T: TryFrom<i64> + TryFrom<u64>>(scalar: Scalar) -> Option<T> {
    match scalar {
        Scalar::Int(v) => <T as TryFrom<i64>>::try_from(v).ok(),
        Scalar::UInt(v) => <T as TryFrom<u64>>::try_from(v).ok(),
        _ => None,
    }
}

impl_typed! {
    bool => Bool, |s| match s { Scalar::Bool(b) => Some(b), _ => None };
    i8 => I8, |s| signed(s);
    i16 => I16, |s| signed(s);
    i32 => I32, |s| signed(s);
    i64 => I64, |s| signed(s);
    u8 => U8, |s| signed(s);
    u16 => U16, |s| signed(s);
    u32 => U32, |s| signed(s);
    u64 => U64, |s| signed(s);
    BigInt => BigInt, |s| match s {
        Scalar::BigInt(v) => Some(v),
        Scalar::Int(v) => Some(BigInt::from(v)),
        Scalar::UInt(v) => Some(BigInt::from(v)),
        _ => None,
    };
    f32 => F32, |s| match s { Scalar::F32(v) => Some(v), _ => None };
    f64 => F64, |s| match s { Scalar::F64(v) => Some(v), _ => None };
    Decimal => Decimal, |s| match s { Scalar::Decimal(v) => Some(v), _ => None };
    String => String, |s| match s { Scalar::Text(v) => Some(v), _ => None };
    Vec<u8> => Bytes, |s| match s { Scalar::Bytes(v) => Some(v), _ => None };
    Uuid => Guid, |s| match s { Scalar::Guid(v) => Some(v), _ => None };
    DateTime<Utc> => DateTime, |s| match s { Scalar::DateTime(v) => Some(v), _ => None };
    TimeSpan => TimeSpan, |s| match s { Scalar::TimeSpan(v) => Some(v), _ => None };
    TimeDelta => TimeSpan, |s| match s { Scalar::TimeSpan(v) => Some(v.into()), _ => None };
}

// `Url` has no meaningful default, so a null only reads through `Option<Url>`.
impl FromScalar for Url {
    const TARGET: ScalarType = ScalarType::Uri;

    fn from_scalar(scalar: Scalar) -> Option<Self> {
        match scalar {
            Scalar::Uri(v) => Some(v),
            _ => None,
        }
    }
}

impl FromVariant for Option<Url> {
    fn from_variant(value: &Variant, provider: &FormatProvider) -> VariantResult<Self> {
        read::<Url>(value, provider)
    }
}

impl FromVariant for Url {
    fn from_variant(value: &Variant, provider: &FormatProvider) -> VariantResult<Self> {
        read::<Url>(value, provider)?
            .ok_or_else(|| VariantError::conversion(value.kind(), ScalarType::Uri))
    }
}

impl FromVariant for Variant {
    fn from_variant(value: &Variant, _provider: &FormatProvider) -> VariantResult<Self> {
        Ok(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_integer_widths() {
        let value = Variant::from("200");
        assert_eq!(value.as_::<u8>().unwrap(), 200);
        assert!(value.as_::<i8>().is_err());
        assert_eq!(value.as_::<i64>().unwrap(), 200);
    }

    #[test]
    fn test_url() {
        let value = Variant::from("https://example.com/a");
        assert_eq!(
            value.as_::<Url>().unwrap().as_str(),
            "https://example.com/a"
        );
        assert!(Variant::null().as_::<Url>().is_err());
        assert_eq!(Variant::null().as_::<Option<Url>>().unwrap(), None);
    }

    #[test]
    fn test_time_delta() {
        let value = Variant::from("00:01:00");
        assert_eq!(value.as_::<TimeDelta>().unwrap(), TimeDelta::minutes(1));
    }

    #[test]
    fn test_localized_float() {
        let provider = FormatProvider::with_decimal_separator(',');
        assert_eq!(Variant::from("2,5").as_with::<f64>(&provider).unwrap(), 2.5);
    }
}
