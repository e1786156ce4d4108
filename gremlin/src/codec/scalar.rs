//! Scalar protobuf types and their encoding/decoding implementations.

use bytes::{BufMut, Bytes};

use super::FieldCodec;
use crate::error::DecodeError;
use crate::leb128::LebCodec;
use crate::wire::{self, WireType};

/// Defines a varint encoded codec.
///
/// `decode` maps the raw `u64` read off the wire into the value type, `encode`
/// maps the value back into the `u64` that is written.
macro_rules! varint_codec {
    (
        $(#[$doc:meta])*
        $name:ident => $ty:ty,
        decode: |$raw:ident| $decode:expr,
        encode: |$value:ident| $encode:expr $(,)?
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        pub enum $name {}

        impl FieldCodec for $name {
            type Value = $ty;
            type View = $ty;

            const WIRE_TYPE: WireType = WireType::Varint;
            const PACKABLE: bool = true;

            #[inline]
            fn decode(payload: Bytes) -> Result<$ty, DecodeError> {
                let ($raw, _) = wire::read_varint(&payload, 0)?;
                Ok($decode)
            }

            fn decode_packed(run: &[u8], out: &mut Vec<$ty>) -> Result<(), DecodeError> {
                let mut offset = 0;
                while offset < run.len() {
                    let ($raw, next) = wire::read_varint(run, offset)?;
                    out.push($decode);
                    offset = next;
                }
                Ok(())
            }

            #[inline]
            fn to_value(view: &$ty) -> Result<$ty, DecodeError> {
                Ok(*view)
            }

            #[inline]
            fn is_default(value: &$ty) -> bool {
                *value == <$ty>::default()
            }

            #[inline]
            fn encoded_len(value: &$ty) -> usize {
                let $value = *value;
                let raw: u64 = $encode;
                raw.encoded_leb128_len()
            }

            #[inline]
            fn encode<B: BufMut>(value: &$ty, buf: &mut B) {
                let $value = *value;
                let raw: u64 = $encode;
                raw.encode_leb128(buf);
            }
        }
    };
}

/// Defines a little-endian fixed width codec.
macro_rules! fixed_codec {
    (
        $(#[$doc:meta])*
        $name:ident => $ty:ty, $width:literal, $wire_type:expr,
        is_default: |$value:ident| $is_default:expr $(,)?
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        pub enum $name {}

        impl FieldCodec for $name {
            type Value = $ty;
            type View = $ty;

            const WIRE_TYPE: WireType = $wire_type;
            const PACKABLE: bool = true;

            #[inline]
            fn decode(payload: Bytes) -> Result<$ty, DecodeError> {
                let (bytes, _) = wire::read_fixed::<$width>(&payload, 0)?;
                Ok(<$ty>::from_le_bytes(bytes))
            }

            fn decode_packed(run: &[u8], out: &mut Vec<$ty>) -> Result<(), DecodeError> {
                if run.len() % $width != 0 {
                    return Err(DecodeError::InvalidPackedLength {
                        expected_multiple: $width,
                        actual: run.len(),
                    });
                }
                out.reserve(run.len() / $width);
                let mut offset = 0;
                while offset < run.len() {
                    let (bytes, next) = wire::read_fixed::<$width>(run, offset)?;
                    out.push(<$ty>::from_le_bytes(bytes));
                    offset = next;
                }
                Ok(())
            }

            #[inline]
            fn to_value(view: &$ty) -> Result<$ty, DecodeError> {
                Ok(*view)
            }

            #[inline]
            fn is_default($value: &$ty) -> bool {
                $is_default
            }

            #[inline]
            fn encoded_len(_value: &$ty) -> usize {
                $width
            }

            #[inline]
            fn encode<B: BufMut>(value: &$ty, buf: &mut B) {
                buf.put_slice(&value.to_le_bytes());
            }
        }
    };
}

varint_codec! {
    /// `int32`: negative values are sign extended to ten bytes on the wire.
    Int32 => i32,
    decode: |raw| raw as i32,
    encode: |value| i64::from(value) as u64,
}

varint_codec! {
    /// `int64`
    Int64 => i64,
    decode: |raw| raw as i64,
    encode: |value| value as u64,
}

varint_codec! {
    /// `uint32`: wider values on the wire are truncated, matching other runtimes.
    Uint32 => u32,
    decode: |raw| raw as u32,
    encode: |value| u64::from(value),
}

varint_codec! {
    /// `uint64`
    Uint64 => u64,
    decode: |raw| raw,
    encode: |value| value,
}

varint_codec! {
    /// `sint32`, zigzag encoded.
    Sint32 => i32,
    decode: |raw| wire::zigzag_decode_32(raw as u32),
    encode: |value| u64::from(wire::zigzag_encode_32(value)),
}

varint_codec! {
    /// `sint64`, zigzag encoded.
    Sint64 => i64,
    decode: |raw| wire::zigzag_decode_64(raw),
    encode: |value| wire::zigzag_encode_64(value),
}

varint_codec! {
    /// `bool`: any non-zero varint decodes as `true`.
    Bool => bool,
    decode: |raw| raw != 0,
    encode: |value| u64::from(value),
}

varint_codec! {
    /// Enum fields carry their raw `i32` number so unknown values survive a
    /// round trip.
    Enum => i32,
    decode: |raw| raw as i32,
    encode: |value| i64::from(value) as u64,
}

fixed_codec! {
    /// `fixed32`
    Fixed32 => u32, 4, WireType::I32,
    is_default: |value| *value == 0,
}

fixed_codec! {
    /// `sfixed32`
    Sfixed32 => i32, 4, WireType::I32,
    is_default: |value| *value == 0,
}

fixed_codec! {
    /// `float`: only positive zero counts as the default, `-0.0` is written.
    Float => f32, 4, WireType::I32,
    is_default: |value| value.to_bits() == 0,
}

fixed_codec! {
    /// `fixed64`
    Fixed64 => u64, 8, WireType::I64,
    is_default: |value| *value == 0,
}

fixed_codec! {
    /// `sfixed64`
    Sfixed64 => i64, 8, WireType::I64,
    is_default: |value| *value == 0,
}

fixed_codec! {
    /// `double`: only positive zero counts as the default, `-0.0` is written.
    Double => f64, 8, WireType::I64,
    is_default: |value| value.to_bits() == 0,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encode_one<C: FieldCodec>(value: &C::Value) -> Vec<u8> {
        let mut buf = Vec::new();
        C::encode(value, &mut buf);
        assert_eq!(buf.len(), C::encoded_len(value));
        buf
    }

    #[test]
    fn test_negative_int32_is_ten_bytes() {
        let buf = encode_one::<Int32>(&-1);
        assert_eq!(buf.len(), 10);
        assert_eq!(Int32::decode(Bytes::from(buf)).unwrap(), -1);
    }

    #[test]
    fn test_sint_is_compact() {
        assert_eq!(encode_one::<Sint32>(&-1), vec![0x01]);
        assert_eq!(encode_one::<Sint64>(&-64), vec![0x7F]);
    }

    #[test]
    fn test_uint32_truncates_wide_values() {
        let mut buf = Vec::new();
        wire::encode_varint(u64::from(u32::MAX) + 2, &mut buf);
        assert_eq!(Uint32::decode(Bytes::from(buf)).unwrap(), 1);
    }

    #[test]
    fn test_bool_non_zero_is_true() {
        assert!(Bool::decode(Bytes::from_static(&[0x02])).unwrap());
        assert!(!Bool::decode(Bytes::from_static(&[0x00])).unwrap());
    }

    #[test]
    fn test_float_defaults() {
        assert!(Float::is_default(&0.0));
        assert!(!Float::is_default(&-0.0));
        assert!(!Double::is_default(&f64::NAN));
    }

    #[test]
    fn test_packed_fixed_length_check() {
        let mut out = Vec::new();
        let err = Fixed32::decode_packed(&[0, 0, 0, 0, 1], &mut out).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidPackedLength {
                expected_multiple: 4,
                actual: 5
            }
        );
    }

    #[test]
    fn test_packed_varint_truncated() {
        let mut out = Vec::new();
        let err = Int64::decode_packed(&[0x01, 0x80], &mut out).unwrap_err();
        assert_eq!(err, DecodeError::TruncatedInput);
    }

    proptest! {
        #[test]
        fn proptest_int32_packed(values: Vec<i32>) {
            let mut run = Vec::new();
            for value in &values {
                Int32::encode(value, &mut run);
            }
            let mut out = Vec::new();
            Int32::decode_packed(&run, &mut out).unwrap();
            prop_assert_eq!(out, values);
        }

        #[test]
        fn proptest_sint64(value: i64) {
            let buf = encode_one::<Sint64>(&value);
            prop_assert_eq!(Sint64::decode(Bytes::from(buf)).unwrap(), value);
        }

        #[test]
        fn proptest_double_bits(value: f64) {
            let buf = encode_one::<Double>(&value);
            prop_assert_eq!(Double::decode(Bytes::from(buf)).unwrap().to_bits(), value.to_bits());
        }

        #[test]
        fn proptest_sfixed64_packed(values: Vec<i64>) {
            let mut run = Vec::new();
            for value in &values {
                Sfixed64::encode(value, &mut run);
            }
            let mut out = Vec::new();
            Sfixed64::decode_packed(&run, &mut out).unwrap();
            prop_assert_eq!(out, values);
        }
    }
}
