//! # nebula-variant-msgpack
//!
//! MessagePack backend for [`nebula_variant`].
//!
//! Parsed payloads become a [`GraphValue`]: a handle into an immutable,
//! `Arc`-shared node arena. Probes and structural queries read the arena in
//! place; typed conversions round-trip the subtree through `rmp-serde` and
//! fall back to the variant converter registry.
//!
//! ```rust
//! use nebula_variant::{Serializer, SerializeOption, Variant};
//! use nebula_variant_msgpack::MsgPackSerializer;
//!
//! let codec = MsgPackSerializer::new();
//! let original = Variant::object([("id", Variant::from(7)), ("name", Variant::from("job"))]);
//! let bytes = codec.serialize_variant(&original, SerializeOption::None).unwrap();
//! let parsed = codec.parse(&bytes).unwrap();
//! assert_eq!(parsed, original);
//! assert_eq!(parsed.deep_hash(), original.deep_hash());
//! ```

mod codec;
pub mod error;
pub mod graph;
pub mod options;
pub mod resolver;
pub mod serializer;
pub mod value;
mod wire;

pub use error::{MsgPackError, MsgPackResult};
pub use graph::{Graph, Node, NodeId};
pub use options::MsgPackOptions;
pub use resolver::{VariantFormatter, VariantShape};
pub use serializer::MsgPackSerializer;
pub use value::GraphValue;
