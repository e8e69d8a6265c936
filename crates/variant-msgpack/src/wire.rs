//! MessagePack writer for any backend.

use nebula_variant::{Scalar, VariantKind, VariantValue};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::graph::{self, TIMESTAMP_EXT, UNDEFINED_EXT};
use crate::value::GraphValue;

/// Writes graph handles straight from their arena and every other backend
/// through the contract.
///
/// Unlike the generic serde bridge this keeps MessagePack-only information:
/// undefined becomes extension 127 and date-times use the timestamp
/// extension.
pub(crate) struct Wire<'a>(pub(crate) &'a dyn VariantValue);

impl Serialize for Wire<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.0;
        if let Some(graph) = value.as_any().downcast_ref::<GraphValue>() {
            return graph.node_ref().serialize(serializer);
        }
        match value.kind() {
            VariantKind::Null => serializer.serialize_unit(),
            VariantKind::Undefined => graph::serialize_ext(serializer, UNDEFINED_EXT, &[]),
            VariantKind::Array => {
                let items = value.values();
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in &items {
                    seq.serialize_element(&Wire(item.inner()))?;
                }
                seq.end()
            }
            VariantKind::Object => {
                let entries = value.entries();
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, item) in &entries {
                    map.serialize_entry(key, &Wire(item.inner()))?;
                }
                map.end()
            }
            _ => match value.raw() {
                Some(Scalar::DateTime(at)) => {
                    graph::serialize_ext(serializer, TIMESTAMP_EXT, &graph::encode_timestamp(&at))
                }
                Some(raw) => raw.serialize(serializer),
                None => serializer.serialize_unit(),
            },
        }
    }
}
