//! # nebula-variant
//!
//! Format-agnostic dynamic values.
//!
//! A [`Variant`] wraps any backend that implements [`VariantValue`]: plain
//! in-memory scalars ([`PrimitiveValue`]), in-memory containers
//! ([`CompositeValue`]) or a codec's lazily decoded graph. Business code
//! probes, converts, compares and hashes variants without knowing which
//! backend produced them.
//!
//! ```rust
//! use nebula_variant::{Variant, VariantKind};
//!
//! let value = Variant::object([("count", Variant::from("42"))]);
//! assert_eq!(value.kind(), VariantKind::Object);
//! assert!(value.get("COUNT").is_integer());
//! assert_eq!(value.get("count").as_::<i32>().unwrap(), 42);
//! assert_eq!(value.get("count"), Variant::from(42.0));
//! ```

pub mod coerce;
pub mod comparer;
pub mod composite;
pub mod contract;
pub mod convert;
pub mod error;
pub mod format;
pub mod kind;
pub mod path;
pub mod primitive;
pub mod render;
pub mod scalar;
mod serde_impl;
pub mod serializer;
pub mod timespan;
pub mod typed;
pub mod variant;

pub use comparer::VariantComparer;
pub use composite::CompositeValue;
pub use contract::{KeyComparison, VariantValue};
pub use error::{BoxError, VariantError, VariantResult};
pub use format::{FormatProvider, SerializeOption};
pub use kind::{TypeCode, VariantKind};
pub use path::PathSegment;
pub use primitive::PrimitiveValue;
pub use scalar::{Scalar, ScalarType};
pub use serde_impl::Structural;
pub use serializer::{Serializer, mime};
pub use timespan::TimeSpan;
pub use typed::{FromScalar, FromVariant};
pub use variant::Variant;

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        KeyComparison, Scalar, ScalarType, SerializeOption, Serializer, TimeSpan, Variant,
        VariantError, VariantKind, VariantResult, VariantValue,
    };
}
