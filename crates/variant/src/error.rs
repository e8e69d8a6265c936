//! Variant error types
//!
//! Probes and comparisons never fail; only operations that must produce a
//! value (conversion, selection, mutation, codec calls) return these.

use thiserror::Error;

use crate::kind::VariantKind;
use crate::scalar::ScalarType;

/// Boxed error source carried by codec and conversion failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by variant operations and serializer facades.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum VariantError {
    /// A caller-supplied argument is malformed (empty path, empty buffer, bad option).
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    /// The backend does not support the operation for this kind of value.
    #[error("Operation '{operation}' not supported for {kind} value")]
    Unsupported {
        operation: &'static str,
        kind: VariantKind,
    },

    /// A codec failed to encode or decode.
    #[error("Serialization failed: {message}")]
    SerializationFailed {
        message: String,
        #[source]
        source: BoxError,
    },

    /// Every coercion strategy was exhausted.
    #[error("Cannot convert {from} value to {to}")]
    ConversionFailed {
        from: VariantKind,
        to: ScalarType,
        #[source]
        source: Option<BoxError>,
    },
}

impl VariantError {
    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(operation: &'static str, kind: VariantKind) -> Self {
        Self::Unsupported { operation, kind }
    }

    /// Wrap a codec error, keeping it as the error source.
    pub fn serialization<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::SerializationFailed {
            message: source.to_string(),
            source: Box::new(source),
        }
    }

    pub fn conversion(from: VariantKind, to: ScalarType) -> Self {
        Self::ConversionFailed {
            from,
            to,
            source: None,
        }
    }

    pub fn conversion_with_source<E>(from: VariantKind, to: ScalarType, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ConversionFailed {
            from,
            to,
            source: Some(Box::new(source)),
        }
    }

    /// True for the "could not convert" family, which typed getters treat as absence.
    pub fn is_conversion(&self) -> bool {
        matches!(self, Self::ConversionFailed { .. })
    }
}

/// Result alias used across the crate.
pub type VariantResult<T> = Result<T, VariantError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_unsupported_message() {
        let err = VariantError::unsupported("set", VariantKind::Integer);
        assert_eq!(
            err.to_string(),
            "Operation 'set' not supported for Integer value"
        );
    }

    #[test]
    fn test_serialization_keeps_source() {
        let io = std::io::Error::other("truncated");
        let err = VariantError::serialization(io);
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "Serialization failed: truncated");
    }

    #[test]
    fn test_conversion_flag() {
        assert!(VariantError::conversion(VariantKind::Primitive, ScalarType::Guid).is_conversion());
        assert!(!VariantError::invalid_argument("path", "empty").is_conversion());
    }
}
