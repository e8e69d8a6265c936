//! serde bridge.
//!
//! `Serialize` walks the contract, so any backend serializes into any serde
//! format. `Deserialize` builds primitive and composite values from any
//! self-describing format.

use core::fmt;

use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::composite::CompositeValue;
use crate::contract::VariantValue;
use crate::kind::VariantKind;
use crate::scalar::Scalar;
use crate::variant::Variant;

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::UInt(v) => serializer.serialize_u64(*v),
            Self::BigInt(v) => serialize_big_integer(v, serializer),
            Self::F32(v) => serializer.serialize_f32(*v),
            Self::F64(v) => serializer.serialize_f64(*v),
            Self::Text(v) => serializer.serialize_str(v),
            Self::Bytes(v) => serializer.serialize_bytes(v),
            Self::Decimal(_) | Self::Guid(_) | Self::DateTime(_) | Self::TimeSpan(_) | Self::Uri(_) => {
                serializer.collect_str(self)
            }
        }
    }
}

/// 64-bit integers stay native; wider values fall back to decimal text.
fn serialize_big_integer<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
    if let Some(v) = value.to_i64() {
        serializer.serialize_i64(v)
    } else if let Some(v) = value.to_u64() {
        serializer.serialize_u64(v)
    } else {
        serializer.collect_str(value)
    }
}

/// Serializes any backend value structurally.
pub struct Structural<'a>(pub &'a dyn VariantValue);

impl Serialize for Structural<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.0;
        match value.kind() {
            VariantKind::Null | VariantKind::Undefined => serializer.serialize_unit(),
            VariantKind::Array => {
                let items = value.values();
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in &items {
                    seq.serialize_element(&Structural(item.inner()))?;
                }
                seq.end()
            }
            VariantKind::Object => {
                let entries = value.entries();
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, item) in &entries {
                    map.serialize_entry(key, &Structural(item.inner()))?;
                }
                map.end()
            }
            _ => match value.raw() {
                Some(raw) => raw.serialize(serializer),
                None => serializer.serialize_unit(),
            },
        }
    }
}

impl Serialize for Variant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Structural(self.inner()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Variant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(VariantVisitor)
    }
}

struct VariantVisitor;

impl<'de> Visitor<'de> for VariantVisitor {
    type Value = Variant;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any self-describing value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Variant, E> {
        Ok(Variant::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Variant, E> {
        Ok(Variant::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Variant, E> {
        Ok(Variant::from(v))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Variant, E> {
        Ok(Variant::from(BigInt::from(v)))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Variant, E> {
        Ok(Variant::from(BigInt::from(v)))
    }

    fn visit_f32<E: de::Error>(self, v: f32) -> Result<Variant, E> {
        Ok(Variant::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Variant, E> {
        Ok(Variant::from(v))
    }

    fn visit_char<E: de::Error>(self, v: char) -> Result<Variant, E> {
        Ok(Variant::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Variant, E> {
        Ok(Variant::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Variant, E> {
        Ok(Variant::from(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Variant, E> {
        Ok(Variant::from(v))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Variant, E> {
        Ok(Variant::from(v))
    }

    fn visit_none<E: de::Error>(self) -> Result<Variant, E> {
        Ok(Variant::null())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Variant, E> {
        Ok(Variant::null())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Variant, D::Error> {
        Variant::deserialize(deserializer)
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> Result<Variant, D::Error> {
        Variant::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Variant, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
        while let Some(item) = seq.next_element::<Variant>()? {
            items.push(item);
        }
        Ok(Variant::new(CompositeValue::Array(items)))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Variant, A::Error> {
        let mut entries = IndexMap::with_capacity(map.size_hint().unwrap_or(0).min(4096));
        while let Some((key, value)) = map.next_entry::<Variant, Variant>()? {
            // Non-string keys keep their canonical text.
            let key = key.try_get_string().unwrap_or_else(|| key.to_string());
            entries.insert(key, value);
        }
        Ok(Variant::new(CompositeValue::Object(entries)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_deserialize_json() {
        let value: Variant = serde_json::from_value(json!({
            "name": "n",
            "count": 3,
            "ratio": 0.5,
            "tags": ["a", null, true]
        }))
        .unwrap();
        assert_eq!(value.kind(), VariantKind::Object);
        assert_eq!(value.get("COUNT").as_::<i64>().unwrap(), 3);
        assert_eq!(value.get("tags").count(), 3);
        assert!(value.get("tags").index(1).unwrap().is_null());
    }

    #[test]
    fn test_serialize_json() {
        let value = Variant::object([
            ("big", Variant::from(BigInt::from(u64::MAX) + 1)),
            ("small", Variant::from(BigInt::from(-5))),
            ("id", Variant::from(uuid::Uuid::nil())),
            ("none", Variant::undefined()),
        ]);
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({
                "big": "18446744073709551616",
                "small": -5,
                "id": "00000000-0000-0000-0000-000000000000",
                "none": null
            })
        );
    }

    #[test]
    fn test_json_round_trip_equal() {
        let value = Variant::array([
            Variant::from(1),
            Variant::from("x"),
            Variant::object([("k", Variant::from(false))]),
        ]);
        let text = serde_json::to_string(&value).unwrap();
        let back: Variant = serde_json::from_str(&text).unwrap();
        assert_eq!(back, value);
    }
}
