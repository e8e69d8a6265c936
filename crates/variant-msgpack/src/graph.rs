//! Decoded MessagePack arena.
//!
//! A payload decodes once into a flat `Vec<Node>`; containers refer to their
//! children by [`NodeId`]. Handles into the arena are cheap to clone and never
//! re-decode the buffer.

use core::cmp::Ordering;
use core::fmt;

use chrono::{DateTime, Utc};
use nebula_variant::{Scalar, VariantKind};
use serde::de::{self, Deserialize, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_bytes::{ByteBuf, Bytes};

use crate::codec;
use crate::error::{MsgPackError, MsgPackResult};

/// MessagePack timestamp extension.
pub const TIMESTAMP_EXT: i8 = -1;
/// Extension type carrying the undefined marker (empty payload).
pub const UNDEFINED_EXT: i8 = 127;

const TIMESTAMP_SECONDS_MASK: u64 = 0x0000_0003_ffff_ffff;

/// Index of a node inside its [`Graph`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One decoded MessagePack item.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Nil,
    Undefined,
    Bool(bool),
    Int(i64),
    UInt(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Ext(i8, Vec<u8>),
    Array(Vec<NodeId>),
    Map(Vec<(NodeId, NodeId)>),
}

impl Node {
    pub fn kind(&self) -> VariantKind {
        match self {
            Self::Nil => VariantKind::Null,
            Self::Undefined => VariantKind::Undefined,
            Self::Bin(_) | Self::Ext(..) => VariantKind::Bytes,
            Self::Array(_) => VariantKind::Array,
            Self::Map(_) => VariantKind::Object,
            _ => VariantKind::Primitive,
        }
    }

    /// The scalar datum; `None` for nil, undefined and containers.
    pub fn scalar(&self) -> Option<Scalar> {
        Some(match self {
            Self::Nil | Self::Undefined | Self::Array(_) | Self::Map(_) => return None,
            Self::Bool(v) => Scalar::Bool(*v),
            Self::Int(v) => Scalar::Int(*v),
            Self::UInt(v) => Scalar::UInt(*v),
            Self::F32(v) => Scalar::F32(*v),
            Self::F64(v) => Scalar::F64(*v),
            Self::Str(v) => Scalar::Text(v.clone()),
            Self::Bin(v) | Self::Ext(_, v) => Scalar::Bytes(v.clone()),
            Self::Timestamp(v) => Scalar::DateTime(*v),
        })
    }

    fn integer(&self) -> Option<i128> {
        match self {
            Self::Int(v) => Some(i128::from(*v)),
            Self::UInt(v) => Some(i128::from(*v)),
            _ => None,
        }
    }

    fn shifted(&self, offset: usize) -> Self {
        let shift = |id: &NodeId| NodeId(id.0 + offset);
        match self {
            Self::Array(items) => Self::Array(items.iter().map(shift).collect()),
            Self::Map(entries) => Self::Map(entries.iter().map(|(k, v)| (shift(k), shift(v))).collect()),
            other => other.clone(),
        }
    }
}

/// An immutable arena of decoded nodes.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    root: NodeId,
    max_depth: usize,
}

impl Graph {
    /// Decodes exactly one MessagePack item, rejecting nesting deeper than
    /// `max_depth` and any bytes left after the item.
    pub fn decode(bytes: &[u8], max_depth: usize) -> MsgPackResult<Self> {
        let mut state = DecodeState {
            nodes: Vec::new(),
            max_depth,
            exceeded: false,
        };
        let mut deserializer = rmp_serde::Deserializer::new(bytes);
        let result = NodeSeed {
            state: &mut state,
            depth: 0,
        }
        .deserialize(&mut deserializer);

        match result {
            Ok(_) if !deserializer.get_ref().is_empty() => {
                let trailing = deserializer.get_ref().len();
                Err(MsgPackError::Decode(de::Error::custom(format_args!(
                    "{trailing} trailing bytes after the root item"
                ))))
            }
            Ok(root) => Ok(Self {
                nodes: state.nodes,
                root,
                max_depth,
            }),
            Err(_) if state.exceeded => Err(MsgPackError::DepthExceeded { max_depth }),
            Err(err) => Err(err.into()),
        }
    }

    /// A one-node graph.
    pub fn singleton(node: Node, max_depth: usize) -> Self {
        Self {
            nodes: vec![node],
            root: NodeId(0),
            max_depth,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Re-encodes the subtree rooted at `id`.
    pub fn encode(&self, id: NodeId) -> MsgPackResult<Vec<u8>> {
        codec::encode_raw(&NodeRef { graph: self, id })
    }

    pub(crate) fn node_ref(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { graph: self, id }
    }

    /// Replaces the node at `at` with the root of `scratch` and returns the
    /// id `at` has afterwards.
    ///
    /// The arena is compacted to the nodes reachable from the root, so the
    /// replaced subtree is dropped and other ids into this graph go stale.
    pub(crate) fn graft(&mut self, at: NodeId, scratch: &Self) -> NodeId {
        let offset = self.nodes.len();
        self.nodes
            .extend(scratch.nodes.iter().map(|node| node.shifted(offset)));
        self.nodes[at.0] = self.nodes[scratch.root.0 + offset].clone();
        self.compact(at)
    }

    fn compact(&mut self, keep: NodeId) -> NodeId {
        let mut remap = vec![None; self.nodes.len()];
        let mut live = Vec::with_capacity(self.nodes.len());
        let root = self.collect(self.root, &mut remap, &mut live);
        let keep = self.collect(keep, &mut remap, &mut live);
        tracing::trace!(before = self.nodes.len(), after = live.len(), "Compacted graph");
        self.nodes = live;
        self.root = root;
        keep
    }

    /// Copies the subtree at `id` into `live` in post-order.
    fn collect(&self, id: NodeId, remap: &mut [Option<NodeId>], live: &mut Vec<Node>) -> NodeId {
        if let Some(moved) = remap[id.0] {
            return moved;
        }
        let node = match &self.nodes[id.0] {
            Node::Array(items) => Node::Array(
                items
                    .iter()
                    .map(|item| self.collect(*item, remap, live))
                    .collect(),
            ),
            Node::Map(entries) => Node::Map(
                entries
                    .iter()
                    .map(|(k, v)| (self.collect(*k, remap, live), self.collect(*v, remap, live)))
                    .collect(),
            ),
            other => other.clone(),
        };
        let moved = NodeId(live.len());
        live.push(node);
        remap[id.0] = Some(moved);
        moved
    }
}

// ==================== Decoding ====================

struct DecodeState {
    nodes: Vec<Node>,
    max_depth: usize,
    exceeded: bool,
}

impl DecodeState {
    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }
}

struct NodeSeed<'a> {
    state: &'a mut DecodeState,
    depth: usize,
}

impl NodeSeed<'_> {
    fn enter<E: de::Error>(&mut self) -> Result<(), E> {
        if self.depth >= self.state.max_depth {
            self.state.exceeded = true;
            return Err(E::custom(format_args!(
                "nesting exceeds the maximum depth of {}",
                self.state.max_depth
            )));
        }
        Ok(())
    }

    fn child(&mut self) -> NodeSeed<'_> {
        NodeSeed {
            state: &mut *self.state,
            depth: self.depth + 1,
        }
    }
}

impl<'de> DeserializeSeed<'de> for NodeSeed<'_> {
    type Value = NodeId;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<NodeId, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for NodeSeed<'_> {
    type Value = NodeId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a MessagePack value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<NodeId, E> {
        Ok(self.state.push(Node::Nil))
    }

    fn visit_none<E: de::Error>(self) -> Result<NodeId, E> {
        Ok(self.state.push(Node::Nil))
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<NodeId, D::Error> {
        self.deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<NodeId, E> {
        Ok(self.state.push(Node::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<NodeId, E> {
        Ok(self.state.push(Node::Int(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<NodeId, E> {
        Ok(self.state.push(Node::UInt(v)))
    }

    fn visit_f32<E: de::Error>(self, v: f32) -> Result<NodeId, E> {
        Ok(self.state.push(Node::F32(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<NodeId, E> {
        Ok(self.state.push(Node::F64(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<NodeId, E> {
        Ok(self.state.push(Node::Str(v.to_owned())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<NodeId, E> {
        Ok(self.state.push(Node::Str(v)))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<NodeId, E> {
        Ok(self.state.push(Node::Bin(v.to_vec())))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<NodeId, E> {
        Ok(self.state.push(Node::Bin(v)))
    }

    fn visit_seq<A: SeqAccess<'de>>(mut self, mut seq: A) -> Result<NodeId, A::Error> {
        self.enter::<A::Error>()?;
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(1024));
        while let Some(id) = seq.next_element_seed(self.child())? {
            items.push(id);
        }
        Ok(self.state.push(Node::Array(items)))
    }

    fn visit_map<A: MapAccess<'de>>(mut self, mut map: A) -> Result<NodeId, A::Error> {
        self.enter::<A::Error>()?;
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0).min(1024));
        while let Some(key) = map.next_key_seed(self.child())? {
            let value = map.next_value_seed(self.child())?;
            entries.push((key, value));
        }
        Ok(self.state.push(Node::Map(entries)))
    }

    /// `rmp-serde` surfaces extension types as a `(tag, payload)` newtype.
    fn visit_newtype_struct<D: Deserializer<'de>>(self, deserializer: D) -> Result<NodeId, D::Error> {
        let (tag, data) = <(i8, ByteBuf)>::deserialize(deserializer)?;
        let node = match tag {
            TIMESTAMP_EXT => Node::Timestamp(decode_timestamp(&data).ok_or_else(|| {
                <D::Error as de::Error>::custom(format_args!(
                    "invalid timestamp extension of {} bytes",
                    data.len()
                ))
            })?),
            UNDEFINED_EXT if data.is_empty() => Node::Undefined,
            _ => Node::Ext(tag, data.into_vec()),
        };
        Ok(self.state.push(node))
    }
}

// ==================== Encoding ====================

/// Serializes a subtree back into MessagePack.
pub(crate) struct NodeRef<'a> {
    graph: &'a Graph,
    id: NodeId,
}

impl Serialize for NodeRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let graph = self.graph;
        match graph.node(self.id) {
            Node::Nil => serializer.serialize_unit(),
            Node::Undefined => serialize_ext(serializer, UNDEFINED_EXT, &[]),
            Node::Bool(v) => serializer.serialize_bool(*v),
            Node::Int(v) => serializer.serialize_i64(*v),
            Node::UInt(v) => serializer.serialize_u64(*v),
            Node::F32(v) => serializer.serialize_f32(*v),
            Node::F64(v) => serializer.serialize_f64(*v),
            Node::Str(v) => serializer.serialize_str(v),
            Node::Bin(v) => serializer.serialize_bytes(v),
            Node::Timestamp(v) => serialize_ext(serializer, TIMESTAMP_EXT, &encode_timestamp(v)),
            Node::Ext(tag, data) => serialize_ext(serializer, *tag, data),
            Node::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for id in items {
                    seq.serialize_element(&graph.node_ref(*id))?;
                }
                seq.end()
            }
            Node::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(&graph.node_ref(*key), &graph.node_ref(*value))?;
                }
                map.end()
            }
        }
    }
}

/// Writes a MessagePack extension through `rmp-serde`'s ext newtype.
pub(crate) fn serialize_ext<S: Serializer>(serializer: S, tag: i8, data: &[u8]) -> Result<S::Ok, S::Error> {
    serializer.serialize_newtype_struct(rmp_serde::MSGPACK_EXT_STRUCT_NAME, &(tag, Bytes::new(data)))
}

/// Timestamp 32/64/96 layouts of the MessagePack format.
pub(crate) fn encode_timestamp(value: &DateTime<Utc>) -> Vec<u8> {
    let seconds = value.timestamp();
    let nanos = value.timestamp_subsec_nanos();
    match u64::try_from(seconds) {
        Ok(secs) if secs & !TIMESTAMP_SECONDS_MASK == 0 => {
            if nanos == 0
                && let Ok(secs) = u32::try_from(secs)
            {
                return secs.to_be_bytes().to_vec();
            }
            ((u64::from(nanos) << 34) | secs).to_be_bytes().to_vec()
        }
        _ => {
            let mut out = Vec::with_capacity(12);
            out.extend_from_slice(&nanos.to_be_bytes());
            out.extend_from_slice(&seconds.to_be_bytes());
            out
        }
    }
}

pub(crate) fn decode_timestamp(data: &[u8]) -> Option<DateTime<Utc>> {
    let (seconds, nanos) = match data.len() {
        4 => (i64::from(u32::from_be_bytes(data.try_into().ok()?)), 0),
        8 => {
            let packed = u64::from_be_bytes(data.try_into().ok()?);
            (
                i64::try_from(packed & TIMESTAMP_SECONDS_MASK).ok()?,
                u32::try_from(packed >> 34).ok()?,
            )
        }
        12 => (
            i64::from_be_bytes(data[4..].try_into().ok()?),
            u32::from_be_bytes(data[..4].try_into().ok()?),
        ),
        _ => return None,
    };
    DateTime::from_timestamp(seconds, nanos)
}

// ==================== Native comparison ====================

/// True when two subtrees are equal node by node.
///
/// Stricter than structural equality: numbers only widen between integer
/// encodings, and maps must have string keys.
pub(crate) fn same_tree(left: &Graph, a: NodeId, right: &Graph, b: NodeId) -> bool {
    if core::ptr::eq(left, right) && a == b {
        return true;
    }
    match (left.node(a), right.node(b)) {
        (Node::Array(xs), Node::Array(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|(x, y)| same_tree(left, *x, right, *y))
        }
        (Node::Map(xs), Node::Map(ys)) => {
            let (Some(xs), Some(ys)) = (string_keyed(left, xs), string_keyed(right, ys)) else {
                return false;
            };
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(&ys)
                    .all(|((ka, va), (kb, vb))| ka == kb && same_tree(left, *va, right, *vb))
        }
        (x, y) => same_scalar(x, y),
    }
}

fn string_keyed<'g>(graph: &'g Graph, entries: &[(NodeId, NodeId)]) -> Option<Vec<(&'g str, NodeId)>> {
    let mut keyed = entries
        .iter()
        .map(|(key, value)| match graph.node(*key) {
            Node::Str(key) => Some((key.as_str(), *value)),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
    Some(keyed)
}

fn same_scalar(x: &Node, y: &Node) -> bool {
    match (x, y) {
        (Node::Nil, Node::Nil) | (Node::Undefined, Node::Undefined) => true,
        (Node::Bool(a), Node::Bool(b)) => a == b,
        (Node::F32(a), Node::F32(b)) => a == b,
        (Node::F64(a), Node::F64(b)) => a == b,
        (Node::Str(a), Node::Str(b)) => a == b,
        (Node::Bin(a), Node::Bin(b)) => a == b,
        (Node::Timestamp(a), Node::Timestamp(b)) => a == b,
        (Node::Ext(ta, a), Node::Ext(tb, b)) => ta == tb && a == b,
        _ => matches!((x.integer(), y.integer()), (Some(a), Some(b)) if a == b),
    }
}

/// Ordering of two scalar nodes of the same numeric, boolean or temporal class.
pub(crate) fn native_order(x: &Node, y: &Node) -> Option<Ordering> {
    match (x, y) {
        (Node::Bool(a), Node::Bool(b)) => Some(a.cmp(b)),
        (Node::F32(a), Node::F32(b)) => a.partial_cmp(b),
        (Node::F64(a), Node::F64(b)) => a.partial_cmp(b),
        (Node::Timestamp(a), Node::Timestamp(b)) => Some(a.cmp(b)),
        _ => Some(x.integer()?.cmp(&y.integer()?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn decode(bytes: &[u8]) -> Graph {
        Graph::decode(bytes, 500).unwrap()
    }

    #[test]
    fn test_decode_nested_map() {
        // {"a": 1, "b": [true, nil]}
        let bytes = [0x82, 0xa1, b'a', 0x01, 0xa1, b'b', 0x92, 0xc3, 0xc0];
        let graph = decode(&bytes);
        let Node::Map(entries) = graph.node(graph.root()) else {
            panic!("expected a map");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(graph.node(entries[0].0), &Node::Str("a".into()));
        assert_eq!(graph.node(entries[0].1), &Node::UInt(1));
        let Node::Array(items) = graph.node(entries[1].1) else {
            panic!("expected an array");
        };
        assert_eq!(graph.node(items[0]), &Node::Bool(true));
        assert_eq!(graph.node(items[1]), &Node::Nil);
    }

    #[rstest]
    #[case(&[0xff], Node::Int(-1))]
    #[case(&[0xcc, 0xc8], Node::UInt(200))]
    #[case(&[0xca, 0x3f, 0xc0, 0x00, 0x00], Node::F32(1.5))]
    #[case(&[0xc4, 0x02, 0x01, 0x02], Node::Bin(vec![1, 2]))]
    #[case(&[0xd4, 0x05, 0x2a], Node::Ext(5, vec![0x2a]))]
    #[case(&[0xc7, 0x00, 0x7f], Node::Undefined)]
    fn test_decode_scalars(#[case] bytes: &[u8], #[case] expected: Node) {
        let graph = decode(bytes);
        assert_eq!(graph.node(graph.root()), &expected);
    }

    #[test]
    fn test_timestamp_forms() {
        let whole = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(encode_timestamp(&whole).len(), 4);

        let fractional = whole + chrono::TimeDelta::nanoseconds(123_456_789);
        assert_eq!(encode_timestamp(&fractional).len(), 8);

        let ancient = Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(encode_timestamp(&ancient).len(), 12);

        for value in [whole, fractional, ancient] {
            assert_eq!(decode_timestamp(&encode_timestamp(&value)), Some(value));
        }
        assert_eq!(decode_timestamp(&[0; 5]), None);
    }

    #[test]
    fn test_encode_is_byte_stable() {
        let bytes = [0x82, 0xa1, b'a', 0x01, 0xa1, b'b', 0x92, 0xc3, 0xc0];
        let graph = decode(&bytes);
        assert_eq!(graph.encode(graph.root()).unwrap(), bytes.to_vec());
    }

    #[test]
    fn test_depth_limit() {
        // [[1]] fits two levels, [[[1]]] does not
        assert!(Graph::decode(&[0x91, 0x91, 0x01], 2).is_ok());
        let err = Graph::decode(&[0x91, 0x91, 0x91, 0x01], 2).unwrap_err();
        assert!(err.is_depth_exceeded());
    }

    #[test]
    fn test_truncated_input_is_decode_error() {
        let err = Graph::decode(&[0x92, 0x01], 500).unwrap_err();
        assert!(matches!(err, MsgPackError::Decode(_)));
    }

    #[rstest]
    #[case::scalar(&[0x01, 0xc1, 0xff, 0xff])]
    #[case::two_items(&[0x91, 0x01, 0x02])]
    #[case::nil_after_map(&[0x80, 0xc0])]
    fn test_trailing_bytes_are_rejected(#[case] bytes: &[u8]) {
        let err = Graph::decode(bytes, 500).unwrap_err();
        assert!(matches!(err, MsgPackError::Decode(_)));
        assert!(!err.is_depth_exceeded());
    }

    #[test]
    fn test_graft_drops_replaced_subtree() {
        let mut graph = decode(&[0x92, 0x01, 0x93, 0x02, 0x03, 0x04]);
        assert_eq!(graph.len(), 6);
        let Node::Array(items) = graph.node(graph.root()).clone() else {
            panic!("expected an array");
        };
        let scratch = decode(&[0xc3]);
        let at = graph.graft(items[1], &scratch);
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.node(at), &Node::Bool(true));
        assert_eq!(graph.root().index(), graph.len() - 1);
        assert_eq!(graph.encode(graph.root()).unwrap(), vec![0x92, 0x01, 0xc3]);
    }

    #[test]
    fn test_graft_replaces_node() {
        let mut graph = decode(&[0x92, 0x01, 0x02]);
        let scratch = decode(&[0x91, 0xa1, b'x']);
        let Node::Array(items) = graph.node(graph.root()).clone() else {
            panic!("expected an array");
        };
        graph.graft(items[1], &scratch);
        assert_eq!(
            graph.encode(graph.root()).unwrap(),
            vec![0x92, 0x01, 0x91, 0xa1, b'x']
        );
    }

    #[test]
    fn test_same_tree_ignores_key_order() {
        let left = decode(&[0x82, 0xa1, b'a', 0x01, 0xa1, b'b', 0x02]);
        let right = decode(&[0x82, 0xa1, b'b', 0x02, 0xa1, b'a', 0xd0, 0x01]);
        assert!(same_tree(&left, left.root(), &right, right.root()));

        let other = decode(&[0x82, 0xa1, b'b', 0x03, 0xa1, b'a', 0x01]);
        assert!(!same_tree(&left, left.root(), &other, other.root()));
    }
}
