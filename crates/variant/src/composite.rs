//! In-memory arrays and objects.
//!
//! Objects keep insertion order and keys that differ only in case; lookups
//! with [`KeyComparison::IgnoreCase`] return the first match.

use core::any::Any;

use indexmap::IndexMap;

use crate::contract::{KeyComparison, VariantValue};
use crate::error::{VariantError, VariantResult};
use crate::format::{FormatProvider, SerializeOption};
use crate::kind::VariantKind;
use crate::path;
use crate::render;
use crate::scalar::{Scalar, ScalarType};
use crate::variant::Variant;

#[derive(Debug, Clone)]
pub enum CompositeValue {
    Array(Vec<Variant>),
    Object(IndexMap<String, Variant>),
}

impl CompositeValue {
    pub fn array() -> Self {
        Self::Array(Vec::new())
    }

    pub fn object() -> Self {
        Self::Object(IndexMap::new())
    }

    /// Appends to an array; objects are left untouched.
    pub fn push(&mut self, value: Variant) -> VariantResult<()> {
        match self {
            Self::Array(items) => {
                items.push(value);
                Ok(())
            }
            Self::Object(_) => Err(VariantError::unsupported("push", VariantKind::Object)),
        }
    }

    /// Inserts or replaces an exact key, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Variant) -> VariantResult<Option<Variant>> {
        match self {
            Self::Object(map) => Ok(map.insert(key.into(), value)),
            Self::Array(_) => Err(VariantError::unsupported("insert", VariantKind::Array)),
        }
    }

    fn from_container(value: &dyn VariantValue) -> Option<Self> {
        match value.kind() {
            VariantKind::Array => Some(Self::Array(value.values())),
            VariantKind::Object => Some(Self::Object(value.entries().into_iter().collect())),
            _ => None,
        }
    }
}

impl VariantValue for CompositeValue {
    fn kind(&self) -> VariantKind {
        match self {
            Self::Array(_) => VariantKind::Array,
            Self::Object(_) => VariantKind::Object,
        }
    }

    fn keys(&self) -> Vec<String> {
        match self {
            Self::Object(map) => map.keys().cloned().collect(),
            Self::Array(_) => Vec::new(),
        }
    }

    fn values(&self) -> Vec<Variant> {
        match self {
            Self::Array(items) => items.clone(),
            Self::Object(_) => Vec::new(),
        }
    }

    fn count(&self) -> usize {
        match self {
            Self::Array(items) => items.len(),
            Self::Object(map) => map.len(),
        }
    }

    fn raw(&self) -> Option<Scalar> {
        None
    }

    fn property(&self, key: &str, comparison: KeyComparison) -> Option<Variant> {
        let Self::Object(map) = self else {
            return None;
        };
        match comparison {
            KeyComparison::Ordinal => map.get(key).cloned(),
            KeyComparison::IgnoreCase => map
                .iter()
                .find(|(candidate, _)| comparison.matches(candidate, key))
                .map(|(_, value)| value.clone()),
        }
    }

    fn element(&self, index: usize) -> Option<Variant> {
        match self {
            Self::Array(items) => items.get(index).cloned(),
            Self::Object(_) => None,
        }
    }

    fn entries(&self) -> Vec<(String, Variant)> {
        match self {
            Self::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            Self::Array(_) => Vec::new(),
        }
    }

    fn select(&self, path: &str) -> VariantResult<Variant> {
        path::select(self, path)
    }

    /// Arrays of byte-sized numbers convert to `Bytes`; nothing else does.
    fn to_type(
        &self,
        target: ScalarType,
        provider: &FormatProvider,
    ) -> VariantResult<Option<Scalar>> {
        if let (Self::Array(items), ScalarType::Bytes) = (self, target) {
            let bytes: Option<Vec<u8>> = items
                .iter()
                .map(|item| match item.to_type_with(ScalarType::U8, provider) {
                    Ok(Some(Scalar::UInt(b))) => u8::try_from(b).ok(),
                    _ => None,
                })
                .collect();
            if let Some(bytes) = bytes {
                return Ok(Some(Scalar::Bytes(bytes)));
            }
        }
        Err(VariantError::conversion(self.kind(), target))
    }

    fn copy(&self, shallow: bool) -> VariantResult<Variant> {
        if shallow {
            return Ok(Variant::new(self.clone()));
        }
        let copied = match self {
            Self::Array(items) => Self::Array(
                items
                    .iter()
                    .map(|item| item.copy(false))
                    .collect::<VariantResult<_>>()?,
            ),
            Self::Object(map) => Self::Object(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), v.copy(false)?)))
                    .collect::<VariantResult<_>>()?,
            ),
        };
        Ok(Variant::new(copied))
    }

    /// Replaces the whole container; scalar replacements are rejected.
    fn set(&mut self, value: Variant) -> VariantResult<()> {
        *self = Self::from_container(value.inner())
            .ok_or_else(|| VariantError::unsupported("set", value.kind()))?;
        Ok(())
    }

    fn null(&self) -> Variant {
        Variant::null()
    }

    fn format(&self, option: SerializeOption) -> String {
        render::render(self, option)
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
    use pretty_assertions::assert_eq;

    fn person() -> Variant {
        Variant::object([
            ("Name", Variant::from("upper")),
            ("name", Variant::from("lower")),
            (
                "tags",
                Variant::array([Variant::from("a"), Variant::from("b")]),
            ),
        ])
    }

    #[test]
    fn test_case_insensitive_first_match() {
        let value = person();
        assert_eq!(value.get("NAME"), Variant::from("upper"));
        assert_eq!(
            value.try_get("name", KeyComparison::Ordinal),
            Some(Variant::from("lower"))
        );
        assert_eq!(value.keys(), vec!["Name", "name", "tags"]);
    }

    #[test]
    fn test_missing_key_is_null_missing_index_is_absent() {
        let value = person();
        assert!(value.get("missing").is_null());
        assert_eq!(value.get("tags").index(5), None);
        assert_eq!(value.get("tags").index(1), Some(Variant::from("b")));
    }

    #[test]
    fn test_select() {
        let value = person();
        assert_eq!(value.select("$.tags[1]").unwrap(), Variant::from("b"));
        assert!(value.select("$.tags[9]").unwrap().is_null());
        assert!(value.select("").is_err());
    }

    #[test]
    fn test_set_replaces_container() {
        let mut value = person();
        value.set(Variant::array([Variant::from(1)])).unwrap();
        assert_eq!(value.kind(), VariantKind::Array);
        assert_eq!(value.count(), 1);
        assert!(value.set(Variant::from(1)).is_err());
    }

    #[test]
    fn test_deep_copy_is_independent() {
        let original = person();
        let mut copy = original.copy(false).unwrap();
        copy.set(Variant::object([("x", Variant::from(1))])).unwrap();
        assert_eq!(original.count(), 3);
        assert_eq!(copy.count(), 1);
    }

    #[test]
    fn test_array_to_bytes() {
        let value = Variant::array([Variant::from(1u8), Variant::from(255)]);
        assert_eq!(value.as_::<Vec<u8>>().unwrap(), vec![1, 255]);
        let value = Variant::array([Variant::from(256)]);
        assert!(value.as_::<Vec<u8>>().is_err());
    }
}
