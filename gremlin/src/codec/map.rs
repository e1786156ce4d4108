//! Map fields.
//!
//! On the wire a `map<K, V>` is a repeated, length-delimited entry message
//! with the key at tag 1 and the value at tag 2.

use bytes::Bytes;

use super::FieldCodec;
use crate::error::DecodeError;
use crate::wire::{self, WireType};

/// Tag of the key inside a map entry.
pub const MAP_KEY_TAG: u32 = 1;
/// Tag of the value inside a map entry.
pub const MAP_VALUE_TAG: u32 = 2;

/// Decodes one map entry.
///
/// A missing key or value decodes as its default, unknown tags inside the
/// entry are skipped, and a repeated key or value within one entry keeps the
/// last occurrence.
pub fn decode_map_entry<K: FieldCodec, V: FieldCodec>(
    entry: Bytes,
) -> Result<(K::View, V::View), DecodeError> {
    let mut key = None;
    let mut value = None;

    let mut offset = 0;
    while offset < entry.len() {
        let (field_key, value_start) = wire::read_key(&entry, offset)?;
        let (tag, wire_type) = field_key.into_parts();
        let (start, end) = wire::payload_range(&entry, value_start, wire_type)?;

        match tag {
            MAP_KEY_TAG => {
                check_wire_type(MAP_KEY_TAG, K::WIRE_TYPE, wire_type)?;
                key = Some(K::decode(entry.slice(start..end))?);
            }
            MAP_VALUE_TAG => {
                check_wire_type(MAP_VALUE_TAG, V::WIRE_TYPE, wire_type)?;
                value = Some(V::decode(entry.slice(start..end))?);
            }
            _ => {}
        }
        offset = end;
    }

    Ok((key.unwrap_or_default(), value.unwrap_or_default()))
}

#[inline]
fn check_wire_type(tag: u32, expected: WireType, actual: WireType) -> Result<(), DecodeError> {
    if expected == actual {
        Ok(())
    } else {
        Err(DecodeError::WireTypeMismatch {
            tag,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Int32, Int64, ProtoString, Str, Uint32};

    #[test]
    fn test_decode_entry() {
        // {1: "k", 2: 150}
        let entry = Bytes::from_static(&[0x0A, 0x01, b'k', 0x10, 0x96, 0x01]);
        let (key, value) = decode_map_entry::<Str, Int64>(entry).unwrap();
        assert_eq!(key, ProtoString::from("k"));
        assert_eq!(value, 150);
    }

    #[test]
    fn test_decode_entry_defaults_and_unknown() {
        // {3: 1, 2: 7}: no key, an unknown field, then the value.
        let entry = Bytes::from_static(&[0x18, 0x01, 0x10, 0x07]);
        let (key, value) = decode_map_entry::<Uint32, Uint32>(entry).unwrap();
        assert_eq!((key, value), (0, 7));

        let (key, value) = decode_map_entry::<Str, Str>(Bytes::new()).unwrap();
        assert_eq!(key.as_str(), "");
        assert_eq!(value.as_str(), "");
    }

    #[test]
    fn test_decode_entry_wire_mismatch() {
        // Key encoded as a varint but declared as a string.
        let entry = Bytes::from_static(&[0x08, 0x01]);
        let err = decode_map_entry::<Str, Int32>(entry).unwrap_err();
        assert_eq!(
            err,
            DecodeError::WireTypeMismatch {
                tag: 1,
                expected: WireType::Len,
                actual: WireType::Varint,
            }
        );
    }
}
