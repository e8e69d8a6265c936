//! MessagePack codec errors

use nebula_variant::VariantError;
use thiserror::Error;

/// Failures raised while encoding or decoding MessagePack.
///
/// Every variant converts into [`VariantError::SerializationFailed`], which
/// keeps this error as its source.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum MsgPackError {
    #[error("MessagePack encode failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("MessagePack decode failed: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// Nesting went deeper than [`MsgPackOptions::max_depth`](crate::MsgPackOptions::max_depth).
    #[error("MessagePack nesting exceeds the maximum depth of {max_depth}")]
    DepthExceeded { max_depth: usize },
}

impl MsgPackError {
    pub fn is_depth_exceeded(&self) -> bool {
        matches!(self, Self::DepthExceeded { .. })
    }
}

impl From<MsgPackError> for VariantError {
    fn from(err: MsgPackError) -> Self {
        VariantError::serialization(err)
    }
}

/// Result alias for codec internals.
pub type MsgPackResult<T> = Result<T, MsgPackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_error_becomes_serialization_failure() {
        let err: VariantError = MsgPackError::DepthExceeded { max_depth: 3 }.into();
        match err {
            VariantError::SerializationFailed { message, source } => {
                assert!(message.contains("maximum depth of 3"));
                let source = source.downcast_ref::<MsgPackError>();
                assert!(source.is_some_and(MsgPackError::is_depth_exceeded));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
