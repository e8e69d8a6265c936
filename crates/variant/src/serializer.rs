//! Serializer facade implemented by every codec.
//!
//! Callers pick a codec by MIME type and talk to it only through this trait;
//! codec errors surface as [`VariantError::SerializationFailed`].
//!
//! [`VariantError::SerializationFailed`]: crate::VariantError::SerializationFailed

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::VariantResult;
use crate::format::SerializeOption;
use crate::variant::Variant;

/// Well-known content types.
pub mod mime {
    pub const MSGPACK: &str = "application/x-msgpack";
    pub const JSON: &str = "application/json";
}

pub trait Serializer: Send + Sync {
    fn mime_type(&self) -> &'static str;

    /// Text encoding of the payload; `None` for binary codecs.
    fn content_encoding(&self) -> Option<&'static str>;

    fn serialize<T: Serialize + ?Sized>(&self, value: &T, option: SerializeOption) -> VariantResult<Vec<u8>>;

    /// Serializes a variant; codecs with a native graph override this.
    fn serialize_variant(&self, value: &Variant, option: SerializeOption) -> VariantResult<Vec<u8>> {
        self.serialize(value, option)
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> VariantResult<T>;

    /// Parses bytes into this codec's lazy representation.
    fn parse(&self, bytes: &[u8]) -> VariantResult<Variant>;

    /// Serializes `value` and parses it back as a variant.
    fn from_object<T: Serialize + ?Sized>(&self, value: &T) -> VariantResult<Variant> {
        let bytes = self.serialize(value, SerializeOption::None)?;
        self.parse(&bytes)
    }
}
