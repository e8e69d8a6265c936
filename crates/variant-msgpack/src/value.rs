//! Lazy graph backend.
//!
//! A [`GraphValue`] is a handle into a decoded [`Graph`]: the shared arena,
//! the node it points at and the path that led there. Structural queries read
//! the arena directly; nothing is re-decoded until a conversion needs the
//! codec.

use core::any::Any;
use core::cmp::Ordering;
use core::fmt;
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use nebula_variant::convert;
use nebula_variant::path;
use nebula_variant::render;
use nebula_variant::{
    FormatProvider, KeyComparison, PathSegment, Scalar, ScalarType, SerializeOption, TimeSpan, Variant,
    VariantError, VariantKind, VariantResult, VariantValue,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_bytes::ByteBuf;
use url::Url;
use uuid::Uuid;

use crate::codec;
use crate::error::MsgPackResult;
use crate::graph::{self, Graph, Node, NodeId};
use crate::options::{DEFAULT_MAX_DEPTH, MsgPackOptions};
use crate::resolver;

static NULL_GRAPH: LazyLock<Arc<Graph>> =
    LazyLock::new(|| Arc::new(Graph::singleton(Node::Nil, DEFAULT_MAX_DEPTH)));

/// A value backed by a decoded MessagePack arena.
#[derive(Clone)]
pub struct GraphValue {
    graph: Arc<Graph>,
    node: NodeId,
    path: Vec<PathSegment>,
}

impl GraphValue {
    /// Decodes `bytes` with default options.
    pub fn parse(bytes: &[u8]) -> VariantResult<Self> {
        Self::parse_with(bytes, &MsgPackOptions::default())
    }

    pub fn parse_with(bytes: &[u8], options: &MsgPackOptions) -> VariantResult<Self> {
        if bytes.is_empty() {
            return Err(VariantError::invalid_argument("bytes", "MessagePack buffer is empty"));
        }
        let graph = Graph::decode(bytes, options.max_depth)?;
        tracing::trace!(nodes = graph.len(), "Decoded MessagePack graph");
        Ok(Self::root(Arc::new(graph)))
    }

    pub(crate) fn root(graph: Arc<Graph>) -> Self {
        let node = graph.root();
        Self {
            graph,
            node,
            path: Vec::new(),
        }
    }

    fn child(&self, node: NodeId, segment: PathSegment) -> Self {
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend_from_slice(&self.path);
        path.push(segment);
        Self {
            graph: Arc::clone(&self.graph),
            node,
            path,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub fn node(&self) -> &Node {
        self.graph.node(self.node)
    }

    /// Segments from the parsed root to this node.
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// The path rendered as `$.key[0]`.
    pub fn location(&self) -> String {
        let mut out = String::from("$");
        for segment in &self.path {
            match segment {
                PathSegment::Key(key) => {
                    out.push('.');
                    out.push_str(key);
                }
                PathSegment::Index(index) => {
                    out.push('[');
                    out.push_str(&index.to_string());
                    out.push(']');
                }
            }
        }
        out
    }

    /// True when both handles point into the same arena.
    pub fn shares_graph(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.graph, &other.graph)
    }

    /// Re-encodes this subtree.
    pub fn to_bytes(&self) -> VariantResult<Vec<u8>> {
        Ok(self.graph.encode(self.node)?)
    }

    pub(crate) fn write(&self) -> MsgPackResult<Vec<u8>> {
        self.graph.encode(self.node)
    }

    pub(crate) fn node_ref(&self) -> graph::NodeRef<'_> {
        self.graph.node_ref(self.node)
    }

    /// Decodes this subtree into any serde type.
    pub fn to_typed<T: DeserializeOwned>(&self) -> VariantResult<T> {
        let bytes = self.write()?;
        Ok(codec::decode(&bytes, &MsgPackOptions::default())?)
    }

    fn map_entries(&self) -> &[(NodeId, NodeId)] {
        match self.node() {
            Node::Map(entries) => entries,
            _ => &[],
        }
    }

    fn array_items(&self) -> &[NodeId] {
        match self.node() {
            Node::Array(items) => items,
            _ => &[],
        }
    }

    fn key_text(&self, id: NodeId) -> String {
        match self.graph.node(id) {
            Node::Str(key) => key.clone(),
            other => other
                .scalar()
                .map_or_else(|| "null".to_owned(), |scalar| scalar.to_string()),
        }
    }

    /// Arrays of byte-sized integers read as bytes without touching the codec.
    fn array_bytes(&self, items: &[NodeId]) -> Option<Vec<u8>> {
        items
            .iter()
            .map(|id| match self.graph.node(*id) {
                Node::Int(v) => u8::try_from(*v).ok(),
                Node::UInt(v) => u8::try_from(*v).ok(),
                _ => None,
            })
            .collect()
    }

    /// Decodes the subtree straight into the host type for `target`.
    fn round_trip(&self, target: ScalarType) -> MsgPackResult<Option<Scalar>> {
        let bytes = self.write()?;
        let options = MsgPackOptions::default();
        let scalar = match target {
            ScalarType::Bool => Scalar::Bool(codec::decode(&bytes, &options)?),
            ScalarType::I8 => Scalar::Int(codec::decode::<i8>(&bytes, &options)?.into()),
            ScalarType::I16 => Scalar::Int(codec::decode::<i16>(&bytes, &options)?.into()),
            ScalarType::I32 => Scalar::Int(codec::decode::<i32>(&bytes, &options)?.into()),
            ScalarType::I64 => Scalar::Int(codec::decode(&bytes, &options)?),
            ScalarType::U8 => Scalar::UInt(codec::decode::<u8>(&bytes, &options)?.into()),
            ScalarType::U16 => Scalar::UInt(codec::decode::<u16>(&bytes, &options)?.into()),
            ScalarType::U32 => Scalar::UInt(codec::decode::<u32>(&bytes, &options)?.into()),
            ScalarType::U64 => Scalar::UInt(codec::decode(&bytes, &options)?),
            ScalarType::F32 => Scalar::F32(codec::decode(&bytes, &options)?),
            ScalarType::F64 => Scalar::F64(codec::decode(&bytes, &options)?),
            ScalarType::Decimal => Scalar::Decimal(codec::decode::<Decimal>(&bytes, &options)?),
            ScalarType::String => Scalar::Text(codec::decode(&bytes, &options)?),
            ScalarType::Bytes => Scalar::Bytes(codec::decode::<ByteBuf>(&bytes, &options)?.into_vec()),
            ScalarType::Guid => Scalar::Guid(codec::decode::<Uuid>(&bytes, &options)?),
            ScalarType::DateTime => Scalar::DateTime(codec::decode::<DateTime<Utc>>(&bytes, &options)?),
            ScalarType::TimeSpan => Scalar::TimeSpan(codec::decode::<TimeSpan>(&bytes, &options)?),
            ScalarType::Uri => Scalar::Uri(codec::decode::<Url>(&bytes, &options)?),
            // no serde form for big integers; the converter registry parses them
            ScalarType::BigInt => return Ok(None),
        };
        Ok(Some(scalar))
    }
}

impl fmt::Debug for GraphValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphValue")
            .field("location", &self.location())
            .field("node", self.node())
            .finish_non_exhaustive()
    }
}

impl VariantValue for GraphValue {
    fn kind(&self) -> VariantKind {
        self.node().kind()
    }

    fn keys(&self) -> Vec<String> {
        self.map_entries()
            .iter()
            .map(|(key, _)| self.key_text(*key))
            .collect()
    }

    fn values(&self) -> Vec<Variant> {
        self.array_items()
            .iter()
            .enumerate()
            .map(|(index, id)| Variant::new(self.child(*id, PathSegment::Index(index))))
            .collect()
    }

    fn count(&self) -> usize {
        match self.node() {
            Node::Array(items) => items.len(),
            Node::Map(entries) => entries.len(),
            _ => 0,
        }
    }

    fn raw(&self) -> Option<Scalar> {
        self.node().scalar()
    }

    fn property(&self, key: &str, comparison: KeyComparison) -> Option<Variant> {
        self.map_entries().iter().find_map(|(k, v)| {
            let name = self.key_text(*k);
            comparison
                .matches(&name, key)
                .then(|| Variant::new(self.child(*v, PathSegment::Key(name))))
        })
    }

    fn element(&self, index: usize) -> Option<Variant> {
        self.array_items()
            .get(index)
            .map(|id| Variant::new(self.child(*id, PathSegment::Index(index))))
    }

    fn entries(&self) -> Vec<(String, Variant)> {
        self.map_entries()
            .iter()
            .map(|(k, v)| {
                let name = self.key_text(*k);
                let child = Variant::new(self.child(*v, PathSegment::Key(name.clone())));
                (name, child)
            })
            .collect()
    }

    fn select(&self, path: &str) -> VariantResult<Variant> {
        let kind = self.kind();
        if !kind.is_container() {
            return Err(VariantError::unsupported("select", kind));
        }
        path::select(self, path)
    }

    fn to_type(
        &self,
        target: ScalarType,
        provider: &FormatProvider,
    ) -> VariantResult<Option<Scalar>> {
        let node = self.node();
        let Some(raw) = node.scalar() else {
            return match node {
                Node::Nil | Node::Undefined => Ok(None),
                Node::Array(items) if target == ScalarType::Bytes => self
                    .array_bytes(items)
                    .map(|bytes| Some(Scalar::Bytes(bytes)))
                    .ok_or_else(|| VariantError::conversion(self.kind(), target)),
                _ => Err(VariantError::conversion(self.kind(), target)),
            };
        };
        if raw.scalar_type() == target {
            return Ok(Some(raw));
        }

        tracing::debug!(location = %self.location(), to = %target, "Graph conversion through codec round-trip");
        let codec_error = match self.round_trip(target) {
            Ok(Some(scalar)) => return Ok(Some(scalar)),
            Ok(None) => None,
            Err(err) => Some(err),
        };
        if let Some(converted) = convert::convert(&raw, target, provider) {
            return Ok(Some(converted));
        }
        Err(match codec_error {
            Some(err) => VariantError::conversion_with_source(self.kind(), target, err),
            None => VariantError::conversion(self.kind(), target),
        })
    }

    fn copy(&self, shallow: bool) -> VariantResult<Variant> {
        if shallow {
            return Ok(Variant::new(self.clone()));
        }
        let bytes = self.write()?;
        let graph = Graph::decode(&bytes, self.graph.max_depth())?;
        Ok(Variant::new(Self::root(Arc::new(graph))))
    }

    fn set(&mut self, value: Variant) -> VariantResult<()> {
        let bytes = resolver::formatter::<Variant>().encode(&value)?;
        let scratch = Graph::decode(&bytes, self.graph.max_depth())?;
        // Copy-on-write: other handles keep the graph they were taken from.
        self.node = Arc::make_mut(&mut self.graph).graft(self.node, &scratch);
        Ok(())
    }

    fn null(&self) -> Variant {
        Variant::new(Self::root(Arc::clone(&NULL_GRAPH)))
    }

    fn format(&self, option: SerializeOption) -> String {
        match self.node() {
            Node::Nil => "null".to_owned(),
            Node::Undefined => "undefined".to_owned(),
            Node::Array(_) | Node::Map(_) => render::render(self, option),
            node => node
                .scalar()
                .map(|scalar| scalar.to_string())
                .unwrap_or_default(),
        }
    }

    fn fast_path_equals(&self, other: &dyn VariantValue) -> Option<bool> {
        let other = other.as_any().downcast_ref::<Self>()?;
        graph::same_tree(&self.graph, self.node, &other.graph, other.node).then_some(true)
    }

    fn fast_path_compare(&self, other: &dyn VariantValue) -> Option<Ordering> {
        let other = other.as_any().downcast_ref::<Self>()?;
        graph::native_order(self.node(), other.node())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn VariantValue> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(bytes: &[u8]) -> GraphValue {
        GraphValue::parse(bytes).unwrap()
    }

    /// {"a": 1, "b": [true, nil]}
    const SAMPLE: [u8; 9] = [0x82, 0xa1, b'a', 0x01, 0xa1, b'b', 0x92, 0xc3, 0xc0];

    #[test]
    fn test_empty_buffer_rejected() {
        let err = GraphValue::parse(&[]).unwrap_err();
        assert!(matches!(err, VariantError::InvalidArgument { .. }));
    }

    #[test]
    fn test_garbage_is_serialization_failure() {
        let err = GraphValue::parse(&[0xc1]).unwrap_err();
        assert!(matches!(err, VariantError::SerializationFailed { .. }));
    }

    #[test]
    fn test_structure() {
        let value = parse(&SAMPLE);
        assert_eq!(value.kind(), VariantKind::Object);
        assert_eq!(value.keys(), vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(value.count(), 2);

        let b = value.property("B", KeyComparison::IgnoreCase).unwrap();
        assert_eq!(b.kind(), VariantKind::Array);
        assert_eq!(b.count(), 2);
        assert_eq!(b.index(1).unwrap().kind(), VariantKind::Null);
        assert!(b.index(2).is_none());
        assert!(value.property("B", KeyComparison::Ordinal).is_none());
    }

    #[test]
    fn test_child_location() {
        let value = parse(&SAMPLE);
        let nested = value.select("$.b[1]").unwrap();
        let handle = nested.downcast_ref::<GraphValue>().unwrap();
        assert_eq!(handle.location(), "$.b[1]");
        assert!(handle.shares_graph(&value));
    }

    #[test]
    fn test_select_on_leaf_is_unsupported() {
        let leaf = parse(&[0x2a]);
        let err = leaf.select("$.a").unwrap_err();
        assert!(matches!(err, VariantError::Unsupported { operation: "select", .. }));
    }

    #[test]
    fn test_to_type_native_and_fallbacks() {
        let provider = FormatProvider::invariant();
        let int = parse(&[0x2a]);
        assert_eq!(int.to_type(ScalarType::U64, provider).unwrap(), Some(Scalar::UInt(42)));
        assert_eq!(int.to_type(ScalarType::I32, provider).unwrap(), Some(Scalar::Int(42)));
        assert_eq!(int.to_type(ScalarType::F64, provider).unwrap(), Some(Scalar::F64(42.0)));
        assert_eq!(
            int.to_type(ScalarType::String, provider).unwrap(),
            Some(Scalar::Text("42".into()))
        );

        // "12" as fixstr: the codec refuses, the converter registry parses
        let text = parse(&[0xa2, b'1', b'2']);
        assert_eq!(text.to_type(ScalarType::I64, provider).unwrap(), Some(Scalar::Int(12)));

        let nil = parse(&[0xc0]);
        assert_eq!(nil.to_type(ScalarType::I64, provider).unwrap(), None);
    }

    #[test]
    fn test_to_type_failure_keeps_codec_source() {
        let text = parse(&[0xa3, b'a', b'b', b'c']);
        let err = text
            .to_type(ScalarType::I32, FormatProvider::invariant())
            .unwrap_err();
        match err {
            VariantError::ConversionFailed { to, source, .. } => {
                assert_eq!(to, ScalarType::I32);
                assert!(source.is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_array_of_bytes() {
        let array = parse(&[0x93, 0x01, 0x02, 0xcc, 0xff]);
        assert_eq!(
            array.to_type(ScalarType::Bytes, FormatProvider::invariant()).unwrap(),
            Some(Scalar::Bytes(vec![1, 2, 255]))
        );
    }

    #[test]
    fn test_to_typed() {
        let value = parse(&SAMPLE);
        let parsed: std::collections::BTreeMap<String, serde_json::Value> = value.to_typed().unwrap();
        assert_eq!(parsed["a"], serde_json::json!(1));
        assert_eq!(parsed["b"], serde_json::json!([true, null]));
    }

    #[test]
    fn test_copy_shallow_shares_deep_does_not() {
        let value = parse(&SAMPLE);
        let shallow = value.copy(true).unwrap();
        let deep = value.copy(false).unwrap();
        assert!(shallow.downcast_ref::<GraphValue>().unwrap().shares_graph(&value));
        assert!(!deep.downcast_ref::<GraphValue>().unwrap().shares_graph(&value));
        assert_eq!(deep, Variant::new(value));
    }

    #[test]
    fn test_set_is_copy_on_write() {
        let original = parse(&SAMPLE);
        let mut child = original
            .property("a", KeyComparison::Ordinal)
            .unwrap()
            .downcast_ref::<GraphValue>()
            .unwrap()
            .clone();
        child.set(Variant::from("replaced")).unwrap();

        assert_eq!(child.raw(), Some(Scalar::Text("replaced".into())));
        assert_eq!(
            original.property("a", KeyComparison::Ordinal).unwrap().raw(),
            Some(Scalar::UInt(1))
        );
    }

    #[test]
    fn test_repeated_set_keeps_arena_bounded() {
        let mut value = parse(&[0x91, 0x01]);
        for round in 0..1000 {
            value.set(Variant::array([Variant::from(round)])).unwrap();
        }
        assert_eq!(value.graph().len(), 2);
        assert_eq!(value.element(0).unwrap(), Variant::from(999));
    }

    #[test]
    fn test_set_on_child_keeps_siblings() {
        let mut b = parse(&SAMPLE)
            .property("b", KeyComparison::Ordinal)
            .unwrap()
            .downcast_ref::<GraphValue>()
            .unwrap()
            .clone();
        for _ in 0..10 {
            b.set(Variant::from(7)).unwrap();
        }
        assert_eq!(Variant::new(b.clone()), Variant::from(7));
        let root = GraphValue::root(Arc::new(b.graph().clone()));
        assert_eq!(root.format(SerializeOption::None), r#"{"a":1,"b":7}"#);
        // "a", 1, "b", 7 and the map
        assert_eq!(b.graph().len(), 5);
    }

    #[test]
    fn test_format() {
        let value = parse(&SAMPLE);
        assert_eq!(value.format(SerializeOption::None), r#"{"a":1,"b":[true,null]}"#);
        assert_eq!(parse(&[0xc7, 0x00, 0x7f]).format(SerializeOption::None), "undefined");
    }

    #[test]
    fn test_fast_paths() {
        let left = parse(&[0x82, 0xa1, b'x', 0x01, 0xa1, b'y', 0x02]);
        let right = parse(&[0x82, 0xa1, b'y', 0x02, 0xa1, b'x', 0x01]);
        assert_eq!(left.fast_path_equals(&right), Some(true));

        let one = parse(&[0x01]);
        let two = parse(&[0xd0, 0x02]);
        assert_eq!(one.fast_path_compare(&two), Some(Ordering::Less));
        assert_eq!(one.fast_path_compare(&parse(&[0xa1, b'1'])), None);
    }
}
