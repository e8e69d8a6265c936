//! Typed encode/decode through `rmp-serde`, honouring [`MsgPackOptions`].

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::MsgPackResult;
use crate::options::MsgPackOptions;

pub(crate) fn encode<T: Serialize + ?Sized>(value: &T, options: &MsgPackOptions) -> MsgPackResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer = rmp_serde::Serializer::new(&mut buf);
    match (options.struct_map, options.human_readable) {
        (true, true) => value.serialize(&mut serializer.with_struct_map().with_human_readable())?,
        (true, false) => value.serialize(&mut serializer.with_struct_map())?,
        (false, true) => value.serialize(&mut serializer.with_human_readable())?,
        (false, false) => value.serialize(&mut serializer)?,
    }
    Ok(buf)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8], options: &MsgPackOptions) -> MsgPackResult<T> {
    let mut deserializer = rmp_serde::Deserializer::new(bytes);
    let value = if options.human_readable {
        T::deserialize(&mut deserializer.with_human_readable())?
    } else {
        T::deserialize(&mut deserializer)?
    };
    Ok(value)
}

/// Encodes without options, for values whose shape does not depend on them.
pub(crate) fn encode_raw<T: Serialize + ?Sized>(value: &T) -> MsgPackResult<Vec<u8>> {
    let mut buf = Vec::new();
    value.serialize(&mut rmp_serde::Serializer::new(&mut buf))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_struct_map_option() {
        let point = Point { x: 1, y: 2 };
        let as_map = encode(&point, &MsgPackOptions::default()).unwrap();
        let as_array = encode(&point, &MsgPackOptions::default().with_struct_map(false)).unwrap();

        // fixmap(2) vs fixarray(2)
        assert_eq!(as_map[0], 0x82);
        assert_eq!(as_array[0], 0x92);
        assert_eq!(decode::<Point>(&as_map, &MsgPackOptions::default()).unwrap(), point);
    }

    #[test]
    fn test_human_readable_uuid() {
        let id = uuid::Uuid::from_u128(0x1234);
        let text = encode(&id, &MsgPackOptions::default()).unwrap();
        let binary = encode(&id, &MsgPackOptions::default().with_human_readable(false)).unwrap();

        // fixstr(36) vs bin8
        assert_eq!(text[0], 0xa0 | 36);
        assert_eq!(binary[0], 0xc4);
        assert_eq!(decode::<uuid::Uuid>(&text, &MsgPackOptions::default()).unwrap(), id);
    }
}
