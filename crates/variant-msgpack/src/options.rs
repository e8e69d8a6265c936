//! Codec configuration

use nebula_variant::{VariantError, VariantResult};
use serde::{Deserialize, Serialize};

/// Default nesting limit for decoded graphs.
pub const DEFAULT_MAX_DEPTH: usize = 500;

/// Configuration for [`MsgPackSerializer`](crate::MsgPackSerializer).
///
/// Missing fields take their defaults when deserialized:
///
/// ```rust
/// use nebula_variant_msgpack::MsgPackOptions;
///
/// let options: MsgPackOptions = serde_json::from_str(r#"{"max_depth": 32}"#).unwrap();
/// assert_eq!(options.max_depth, 32);
/// assert!(options.struct_map);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MsgPackOptions {
    /// Deepest array/map nesting accepted when decoding
    pub max_depth: usize,
    /// Encode typed structs as maps keyed by field name instead of arrays
    pub struct_map: bool,
    /// Ask types with dual encodings (uuid, chrono) for their text form
    pub human_readable: bool,
}

impl Default for MsgPackOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            struct_map: true,
            human_readable: true,
        }
    }
}

impl MsgPackOptions {
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_struct_map(mut self, struct_map: bool) -> Self {
        self.struct_map = struct_map;
        self
    }

    #[must_use]
    pub fn with_human_readable(mut self, human_readable: bool) -> Self {
        self.human_readable = human_readable;
        self
    }

    /// Validate codec options, returning an error if invalid.
    pub fn validate(&self) -> VariantResult<()> {
        if self.max_depth == 0 {
            return Err(VariantError::invalid_argument(
                "max_depth",
                "max_depth must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let options = MsgPackOptions::default();
        assert_eq!(options.max_depth, 500);
        assert!(options.struct_map);
        assert!(options.human_readable);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_zero_depth_rejected() {
        let err = MsgPackOptions::default().with_max_depth(0).validate().unwrap_err();
        assert!(matches!(err, VariantError::InvalidArgument { ref name, .. } if name == "max_depth"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let options: MsgPackOptions = serde_json::from_str(r#"{"struct_map": false}"#).unwrap();
        assert_eq!(
            options,
            MsgPackOptions::default().with_struct_map(false)
        );
    }
}
