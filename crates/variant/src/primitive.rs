//! In-memory backend for a single scalar.

use core::any::Any;

use crate::contract::{KeyComparison, VariantValue};
use crate::convert;
use crate::error::{VariantError, VariantResult};
use crate::format::{FormatProvider, SerializeOption};
use crate::kind::VariantKind;
use crate::scalar::{Scalar, ScalarType};
use crate::variant::Variant;

/// Null, undefined, or exactly one host scalar.
///
/// The kind is derived from the scalar on every call: typed scalars report
/// their typed kind, text and URIs report `Primitive`, and infinite floats
/// report `Primitive` rather than `Float`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PrimitiveValue {
    #[default]
    Null,
    Undefined,
    Scalar(Scalar),
}

impl PrimitiveValue {
    pub fn scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Scalar> for PrimitiveValue {
    fn from(scalar: Scalar) -> Self {
        Self::Scalar(scalar)
    }
}

impl VariantValue for PrimitiveValue {
    fn kind(&self) -> VariantKind {
        match self {
            Self::Null => VariantKind::Null,
            Self::Undefined => VariantKind::Undefined,
            Self::Scalar(s) => s.kind(),
        }
    }

    fn keys(&self) -> Vec<String> {
        Vec::new()
    }

    fn values(&self) -> Vec<Variant> {
        Vec::new()
    }

    fn count(&self) -> usize {
        0
    }

    fn raw(&self) -> Option<Scalar> {
        self.scalar().cloned()
    }

    fn property(&self, _key: &str, _comparison: KeyComparison) -> Option<Variant> {
        None
    }

    fn element(&self, _index: usize) -> Option<Variant> {
        None
    }

    fn select(&self, _path: &str) -> VariantResult<Variant> {
        Err(VariantError::unsupported("select", self.kind()))
    }

    fn to_type(
        &self,
        target: ScalarType,
        provider: &FormatProvider,
    ) -> VariantResult<Option<Scalar>> {
        match self {
            Self::Null | Self::Undefined => Ok(None),
            Self::Scalar(s) => convert::convert(s, target, provider)
                .map(Some)
                .ok_or_else(|| VariantError::conversion(self.kind(), target)),
        }
    }

    fn copy(&self, _shallow: bool) -> VariantResult<Variant> {
        Ok(Variant::new(self.clone()))
    }

    fn set(&mut self, _value: Variant) -> VariantResult<()> {
        Err(VariantError::unsupported("set", self.kind()))
    }

    fn null(&self) -> Variant {
        Variant::null()
    }

    fn format(&self, _option: SerializeOption) -> String {
        match self {
            Self::Null => "null".to_owned(),
            Self::Undefined => "undefined".to_owned(),
            Self::Scalar(s) => s.to_string(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn VariantValue> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone, Utc};

    #[test]
    fn test_kind_follows_scalar() {
        assert_eq!(PrimitiveValue::Null.kind(), VariantKind::Null);
        assert_eq!(PrimitiveValue::Undefined.kind(), VariantKind::Undefined);
        assert_eq!(
            PrimitiveValue::from(Scalar::F64(f64::INFINITY)).kind(),
            VariantKind::Primitive
        );
        assert_eq!(
            PrimitiveValue::from(Scalar::Text("1".into())).kind(),
            VariantKind::Primitive
        );
    }

    #[test]
    fn test_select_and_set_unsupported() {
        let mut value = PrimitiveValue::from(Scalar::Int(1));
        assert!(matches!(
            value.select("$.a"),
            Err(VariantError::Unsupported { operation: "select", .. })
        ));
        assert!(matches!(
            value.set(Variant::from(2)),
            Err(VariantError::Unsupported { operation: "set", .. })
        ));
    }

    #[test]
    fn test_to_type() {
        let value = PrimitiveValue::from(Scalar::Text("12".into()));
        assert_eq!(
            value.to_type(ScalarType::I32, FormatProvider::invariant()).unwrap(),
            Some(Scalar::Int(12))
        );
        assert!(value
            .to_type(ScalarType::Guid, FormatProvider::invariant())
            .unwrap_err()
            .is_conversion());
        assert_eq!(
            PrimitiveValue::Null
                .to_type(ScalarType::I32, FormatProvider::invariant())
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_offset_normalised_to_utc() {
        let offset = FixedOffset::east_opt(3600).unwrap();
        let local = offset.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let value = Variant::from_date_time_offset(local);
        assert_eq!(
            value.raw(),
            Some(Scalar::DateTime(Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap()))
        );
        assert_eq!(value.kind(), VariantKind::UtcDateTime);
    }
}
