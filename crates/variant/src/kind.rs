//! Variant kinds.
//!
//! `VariantKind` is the closed classification every backend reports. Typed
//! scalar kinds (`Integer`, `Float`, `Boolean`, `Guid`, `UtcDateTime`,
//! `TimeSpan`) are produced by backends that keep host types around; codec
//! graphs report every leaf scalar as `Primitive`. The comparer and the hash
//! fold both families into the same structural class so that values from
//! different backends can meet.
//!
//! ```rust
//! use nebula_variant::VariantKind;
//!
//! assert_eq!(VariantKind::Integer.structural(), VariantKind::Primitive);
//! assert!(VariantKind::Guid.is_scalar());
//! assert!(!VariantKind::Bytes.is_scalar());
//! ```

use core::fmt::{Display, Formatter};

/// Kind of a variant value.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    Null,
    Undefined,
    Primitive,
    Integer,
    Float,
    Boolean,
    Guid,
    UtcDateTime,
    TimeSpan,
    Bytes,
    Array,
    Object,
}

impl VariantKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Null,
        Self::Undefined,
        Self::Primitive,
        Self::Integer,
        Self::Float,
        Self::Boolean,
        Self::Guid,
        Self::UtcDateTime,
        Self::TimeSpan,
        Self::Bytes,
        Self::Array,
        Self::Object,
    ];

    /// Kinds whose datum is a single scalar that the coercion probes may inspect.
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Primitive
                | Self::Integer
                | Self::Float
                | Self::Boolean
                | Self::Guid
                | Self::UtcDateTime
                | Self::TimeSpan
        )
    }

    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    pub const fn is_temporal(&self) -> bool {
        matches!(self, Self::UtcDateTime | Self::TimeSpan)
    }

    pub const fn is_container(&self) -> bool {
        matches!(self, Self::Array | Self::Object)
    }

    pub const fn is_nullish(&self) -> bool {
        matches!(self, Self::Null | Self::Undefined)
    }

    /// Structural class used for equality gating and hashing.
    pub const fn structural(&self) -> Self {
        if self.is_scalar() {
            Self::Primitive
        } else {
            *self
        }
    }

    /// Stable discriminant fed into deep hashes.
    pub(crate) const fn hash_code(&self) -> u8 {
        match self.structural() {
            Self::Null => 0,
            Self::Undefined => 1,
            Self::Bytes => 9,
            Self::Array => 10,
            Self::Object => 11,
            _ => 2,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Undefined => "Undefined",
            Self::Primitive => "Primitive",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::Guid => "Guid",
            Self::UtcDateTime => "UtcDateTime",
            Self::TimeSpan => "TimeSpan",
            Self::Bytes => "Bytes",
            Self::Array => "Array",
            Self::Object => "Object",
        }
    }
}

impl Display for VariantKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Coarse host-type classification, see [`crate::Variant::type_code`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TypeCode {
    Empty,
    Boolean,
    Int64,
    Decimal,
    DateTime,
    Object,
    String,
}
