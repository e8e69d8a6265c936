//! MessagePack implementation of the serializer facade.

use nebula_variant::{SerializeOption, Serializer, Variant, VariantResult, mime};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec;
use crate::options::MsgPackOptions;
use crate::resolver::{self, VariantShape};

/// MessagePack codec behind the [`Serializer`] facade.
///
/// ```rust
/// use nebula_variant::{Serializer, Variant, VariantKind};
/// use nebula_variant_msgpack::MsgPackSerializer;
///
/// let codec = MsgPackSerializer::new();
/// let value = codec.from_object(&serde_json::json!({"a": 1, "b": [true, null]})).unwrap();
/// assert_eq!(value.kind(), VariantKind::Object);
/// assert_eq!(value.get("A"), Variant::from(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MsgPackSerializer {
    options: MsgPackOptions,
}

impl MsgPackSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a serializer with validated options.
    pub fn with_options(options: MsgPackOptions) -> VariantResult<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &MsgPackOptions {
        &self.options
    }

    /// Encodes a variant shape through its registered formatter.
    pub fn encode_shape<T: VariantShape>(&self, value: &T) -> VariantResult<Vec<u8>> {
        resolver::formatter::<T>().encode(value)
    }

    /// Decodes bytes into a variant shape through its registered formatter.
    pub fn decode_shape<T: VariantShape>(&self, bytes: &[u8]) -> VariantResult<T> {
        resolver::formatter::<T>().decode(bytes, &self.options)
    }
}

impl Serializer for MsgPackSerializer {
    fn mime_type(&self) -> &'static str {
        mime::MSGPACK
    }

    fn content_encoding(&self) -> Option<&'static str> {
        None
    }

    /// Binary output has no indented form; `option` is ignored.
    fn serialize<T: Serialize + ?Sized>(&self, value: &T, _option: SerializeOption) -> VariantResult<Vec<u8>> {
        Ok(codec::encode(value, &self.options)?)
    }

    fn serialize_variant(&self, value: &Variant, _option: SerializeOption) -> VariantResult<Vec<u8>> {
        self.encode_shape(value)
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> VariantResult<T> {
        Ok(codec::decode(bytes, &self.options)?)
    }

    fn parse(&self, bytes: &[u8]) -> VariantResult<Variant> {
        self.decode_shape(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_variant::VariantError;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Job {
        id: u32,
        name: String,
        tags: Vec<String>,
    }

    #[test]
    fn test_facade_metadata() {
        let codec = MsgPackSerializer::new();
        assert_eq!(codec.mime_type(), "application/x-msgpack");
        assert_eq!(codec.content_encoding(), None);
    }

    #[test]
    fn test_invalid_options_rejected() {
        let err = MsgPackSerializer::with_options(MsgPackOptions::default().with_max_depth(0)).unwrap_err();
        assert!(matches!(err, VariantError::InvalidArgument { .. }));
    }

    #[test]
    fn test_typed_round_trip() {
        let codec = MsgPackSerializer::new();
        let job = Job {
            id: 7,
            name: "sync".into(),
            tags: vec!["a".into(), "b".into()],
        };
        let bytes = codec.serialize(&job, SerializeOption::None).unwrap();
        assert_eq!(codec.deserialize::<Job>(&bytes).unwrap(), job);
    }

    #[test]
    fn test_from_object_reads_struct_fields() {
        let codec = MsgPackSerializer::new();
        let job = Job {
            id: 7,
            name: "sync".into(),
            tags: vec!["a".into()],
        };
        let value = codec.from_object(&job).unwrap();
        assert_eq!(value.get("name").try_as_string().as_deref(), Some("sync"));
        assert_eq!(value.get("Tags").count(), 1);
    }

    #[test]
    fn test_deserialize_failure_is_serialization_error() {
        let codec = MsgPackSerializer::new();
        let err = codec.deserialize::<Job>(&[0x01]).unwrap_err();
        assert!(matches!(err, VariantError::SerializationFailed { .. }));
    }

    #[test]
    fn test_depth_limit_applies_to_parse() {
        let codec = MsgPackSerializer::with_options(MsgPackOptions::default().with_max_depth(1)).unwrap();
        assert!(codec.parse(&[0x91, 0x01]).is_ok());
        assert!(matches!(
            codec.parse(&[0x91, 0x91, 0x01]).unwrap_err(),
            VariantError::SerializationFailed { .. }
        ));
    }
}
