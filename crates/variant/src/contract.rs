//! The contract every backend implements.

use core::any::Any;
use core::cmp::Ordering;
use core::fmt::Debug;

use crate::error::VariantResult;
use crate::format::{FormatProvider, SerializeOption};
use crate::kind::VariantKind;
use crate::scalar::{Scalar, ScalarType};
use crate::variant::Variant;

/// How object keys are matched.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum KeyComparison {
    /// Exact, case-sensitive match.
    Ordinal,
    /// Unicode case-insensitive match.
    #[default]
    IgnoreCase,
}

impl KeyComparison {
    pub fn matches(&self, left: &str, right: &str) -> bool {
        match self {
            Self::Ordinal => left == right,
            Self::IgnoreCase => {
                left.eq_ignore_ascii_case(right)
                    || left
                        .chars()
                        .flat_map(char::to_lowercase)
                        .eq(right.chars().flat_map(char::to_lowercase))
            }
        }
    }
}

/// A dynamically typed value, independent of the format that produced it.
///
/// Backends answer structural queries (`kind`, `keys`, `values`), expose their
/// scalar datum through [`raw`](Self::raw) and do their own conversions in
/// [`to_type`](Self::to_type). Equality, ordering and hashing are not part of
/// the trait: the comparer derives them from these queries, consulting the
/// optional `fast_path_*` hooks when both operands come from the same backend.
pub trait VariantValue: Debug + Send + Sync + 'static {
    fn kind(&self) -> VariantKind;

    /// Object keys in storage order; empty for non-objects.
    fn keys(&self) -> Vec<String>;

    /// Array elements in order; empty for non-arrays.
    fn values(&self) -> Vec<Variant>;

    /// Number of keys or elements.
    fn count(&self) -> usize;

    /// The scalar datum, `None` for null, undefined and containers.
    fn raw(&self) -> Option<Scalar>;

    fn property(&self, key: &str, comparison: KeyComparison) -> Option<Variant>;

    fn element(&self, index: usize) -> Option<Variant>;

    /// `(key, value)` pairs in storage order, duplicates included.
    fn entries(&self) -> Vec<(String, Variant)> {
        self.keys()
            .into_iter()
            .filter_map(|key| {
                self.property(&key, KeyComparison::Ordinal)
                    .map(|value| (key, value))
            })
            .collect()
    }

    fn select(&self, path: &str) -> VariantResult<Variant>;

    /// Converts the datum; `Ok(None)` for an explicit null.
    fn to_type(
        &self,
        target: ScalarType,
        provider: &FormatProvider,
    ) -> VariantResult<Option<Scalar>>;

    fn copy(&self, shallow: bool) -> VariantResult<Variant>;

    fn set(&mut self, value: Variant) -> VariantResult<()>;

    /// This backend's canonical null.
    fn null(&self) -> Variant;

    fn format(&self, option: SerializeOption) -> String;

    /// Backend-specific equality; `None` means no opinion.
    fn fast_path_equals(&self, _other: &dyn VariantValue) -> Option<bool> {
        None
    }

    /// Backend-specific ordering; `None` means no opinion.
    fn fast_path_compare(&self, _other: &dyn VariantValue) -> Option<Ordering> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn clone_box(&self) -> Box<dyn VariantValue>;
}
