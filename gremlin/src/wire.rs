//! Wire format for Google's Protocol Buffers, aka [protobuf](https://protobuf.dev).
//!
//! Every function here works on a borrowed byte slice plus an offset and returns
//! the offset just past whatever it read. Readers, map entries and packed runs
//! never advance an offset on their own: they always go through these routines
//! so there is one place that knows where a value ends.

use core::num::NonZeroU32;

use crate::error::DecodeError;
use crate::leb128::LebCodec;
use crate::util::{likely, unlikely};

/// Minimum value of a protobuf tag.
pub const MINIMUM_TAG_VAL: u32 = 1;
/// Maximum value of a protobuf tag.
pub const MAXIMUM_TAG_VAL: u32 = (1 << 29) - 1;

/// A decoded protobuf field key containing a wire type and tag.
///
/// The layout mirrors the protobuf wire format:
/// * Bits 0-2: wire type (0-5)
/// * Bits 3-31: tag/field number (1 to 2^29-1)
///
/// Since tags start at 1, the minimum raw value is 8 (`1 << 3`), so the value
/// is never zero.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct ProtoKey(NonZeroU32);

impl ProtoKey {
    /// Creates a new [`ProtoKey`] from a raw key value, validating the wire type and tag.
    fn try_from_raw(raw_key: u64) -> Result<Self, DecodeError> {
        let tag = raw_key >> 3;
        if unlikely(tag < u64::from(MINIMUM_TAG_VAL) || tag > u64::from(MAXIMUM_TAG_VAL)) {
            return Err(DecodeError::InvalidTag { value: tag });
        }

        WireType::try_from_val((raw_key & 0b111) as u8)?;

        // The range check above bounds the key to 32 bits and guarantees tag >= 1.
        NonZeroU32::new(raw_key as u32)
            .map(Self)
            .ok_or(DecodeError::InvalidTag { value: tag })
    }

    /// Returns the [`WireType`] component of this key.
    #[inline(always)]
    pub fn wire_type(self) -> WireType {
        match self.0.get() & 0b111 {
            0 => WireType::Varint,
            1 => WireType::I64,
            2 => WireType::Len,
            3 => WireType::SGroup,
            4 => WireType::EGroup,
            _ => WireType::I32,
        }
    }

    /// Returns the tag/field number component of this key.
    #[inline(always)]
    pub fn tag(self) -> u32 {
        self.0.get() >> 3
    }

    /// Decomposes this key into its tag and [`WireType`] components.
    #[inline(always)]
    pub fn into_parts(self) -> (u32, WireType) {
        (self.tag(), self.wire_type())
    }
}

impl core::fmt::Debug for ProtoKey {
    #[cold]
    #[inline(never)]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProtoKey")
            .field("tag", &self.tag())
            .field("wire_type", &self.wire_type())
            .finish()
    }
}

/// Reads a varint starting at `offset`, returning the value and the offset
/// just past it.
#[inline]
pub fn read_varint(buf: &[u8], offset: usize) -> Result<(u64, usize), DecodeError> {
    let rest = buf.get(offset..).ok_or(DecodeError::TruncatedInput)?;
    let (value, read) = u64::decode_leb128(rest)?;
    Ok((value, offset + read))
}

/// Appends `value` as a varint.
#[inline]
pub fn encode_varint<B: bytes::BufMut>(value: u64, buf: &mut B) {
    value.encode_leb128(buf);
}

/// Returns the number of bytes `value` occupies as a varint.
#[inline]
pub fn encoded_varint_len(value: u64) -> usize {
    value.encoded_leb128_len()
}

/// Reads a field key starting at `offset`.
///
/// The key's encoded length is the difference between the returned offset and
/// `offset`.
#[inline]
pub fn read_key(buf: &[u8], offset: usize) -> Result<(ProtoKey, usize), DecodeError> {
    // Tags 1 through 15 fit in a single byte.
    if let Some(&b) = buf.get(offset) {
        if likely(b < 0x80) {
            return Ok((ProtoKey::try_from_raw(u64::from(b))?, offset + 1));
        }
    }
    let (raw, next) = read_varint(buf, offset)?;
    Ok((ProtoKey::try_from_raw(raw)?, next))
}

/// Encodes the provided tag and wire_type as a protobuf field key.
///
/// Key layout as documented at <https://protobuf.dev/programming-guides/encoding>
/// under the "Message Structure" section.
#[inline(always)]
pub fn encode_key<B: bytes::BufMut>(wire_type: WireType, tag: u32, buf: &mut B) {
    let key = (tag << 3) | u32::from(wire_type.into_val());
    u64::from(key).encode_leb128(buf);
}

/// Returns the encoded length of a field key (tag + wire type).
///
/// The wire type only occupies the low three bits so it never changes the length.
#[inline(always)]
pub fn encoded_key_len(tag: u32) -> usize {
    u64::from(tag << 3).encoded_leb128_len()
}

/// Reads the length prefix of a length-delimited value at `offset` and returns
/// the `[start, end)` range of its payload.
///
/// Fails with [`DecodeError::TruncatedInput`] if the declared length runs past
/// the end of `buf`.
#[inline]
pub fn read_len(buf: &[u8], offset: usize) -> Result<(usize, usize), DecodeError> {
    let (len, start) = read_varint(buf, offset)?;
    let len = usize::try_from(len).map_err(|_| DecodeError::LengthOverflow { value: len })?;
    let end = start
        .checked_add(len)
        .ok_or(DecodeError::LengthOverflow { value: len as u64 })?;
    if unlikely(end > buf.len()) {
        return Err(DecodeError::TruncatedInput);
    }
    Ok((start, end))
}

/// Skips over a field value of `wire_type` starting at `offset`, returning the
/// offset of whatever follows it.
///
/// Protobuf supports backwards and forwards compatibility by skipping fields
/// we don't know about.
#[inline]
pub fn skip_field(buf: &[u8], offset: usize, wire_type: WireType) -> Result<usize, DecodeError> {
    payload_range(buf, offset, wire_type).map(|(_, end)| end)
}

/// Locates the payload of a value of `wire_type` that starts at `offset`.
///
/// For [`WireType::Len`] the range starts right after the length prefix. For
/// every wire type the end of the range is also the offset of the next key.
#[inline]
pub fn payload_range(
    buf: &[u8],
    offset: usize,
    wire_type: WireType,
) -> Result<(usize, usize), DecodeError> {
    let width = match wire_type {
        WireType::Varint => {
            let (_, end) = read_varint(buf, offset)?;
            return Ok((offset, end));
        }
        WireType::Len => return read_len(buf, offset),
        WireType::I64 => 8,
        WireType::I32 => 4,
        WireType::SGroup | WireType::EGroup => {
            return Err(DecodeError::DeprecatedGroupEncoding);
        }
    };

    let end = offset + width;
    if unlikely(end > buf.len()) {
        return Err(DecodeError::TruncatedInput);
    }
    Ok((offset, end))
}

/// Reads a little-endian fixed width value of `N` bytes at `offset`.
#[inline]
pub fn read_fixed<const N: usize>(buf: &[u8], offset: usize) -> Result<([u8; N], usize), DecodeError> {
    let end = offset + N;
    let bytes = buf
        .get(offset..end)
        .and_then(|slice| <[u8; N]>::try_from(slice).ok())
        .ok_or(DecodeError::TruncatedInput)?;
    Ok((bytes, end))
}

/// Maps a signed 32-bit integer onto an unsigned one so small magnitudes stay short.
#[inline(always)]
pub fn zigzag_encode_32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

/// Inverse of [`zigzag_encode_32`].
#[inline(always)]
pub fn zigzag_decode_32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

/// Maps a signed 64-bit integer onto an unsigned one so small magnitudes stay short.
#[inline(always)]
pub fn zigzag_encode_64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Inverse of [`zigzag_encode_64`].
#[inline(always)]
pub fn zigzag_decode_64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

/// Denotes the type of a field in an encoded protobuf message.
///
/// Protobuf messages are a series of key-value pairs. When encoded each key-value pair
/// is turned into a record consisting of a field number, a [`WireType`], and a payload.
/// The [`WireType`] indicates how large the proceeding payload is.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Variable length integer.
    ///
    /// Used for: int32, int64, uint32, uint64, sint32, sint64, bool, enum
    Varint = 0,
    /// Fixed 8-byte value.
    ///
    /// Used for: fixed64, sfixed64, double
    I64 = 1,
    /// Length-delimited value.
    ///
    /// Used for: string, bytes, embedded messages, packed repeated fields, map entries
    Len = 2,
    /// Group start (deprecated).
    SGroup = 3,
    /// Group end (deprecated).
    EGroup = 4,
    /// Fixed 4-byte value.
    ///
    /// Used for: fixed32, sfixed32, float
    I32 = 5,
}

impl WireType {
    /// Maximum value of a valid [`WireType`].
    pub const MAX_VAL: u8 = 5;

    /// Converts a raw value into a [`WireType`], if valid.
    pub fn try_from_val(val: u8) -> Result<Self, DecodeError> {
        match val {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::I64),
            2 => Ok(WireType::Len),
            3 => Ok(WireType::SGroup),
            4 => Ok(WireType::EGroup),
            5 => Ok(WireType::I32),
            value => Err(DecodeError::InvalidWireType { value }),
        }
    }

    /// Returns the raw value of this wire type.
    #[inline(always)]
    pub const fn into_val(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_read_key() {
        // Field 1, varint.
        let (key, next) = read_key(&[0x08], 0).unwrap();
        assert_eq!(key.into_parts(), (1, WireType::Varint));
        assert_eq!(next, 1);

        // Field 16, length-delimited: a two byte key.
        let (key, next) = read_key(&[0x00, 0x82, 0x01], 1).unwrap();
        assert_eq!(key.into_parts(), (16, WireType::Len));
        assert_eq!(next, 3);
    }

    #[test]
    fn test_read_key_rejects_bad_keys() {
        // Tag 0.
        assert_eq!(
            read_key(&[0x00], 0).unwrap_err(),
            DecodeError::InvalidTag { value: 0 }
        );
        // Wire type 6.
        assert_eq!(
            read_key(&[0x0E], 0).unwrap_err(),
            DecodeError::InvalidWireType { value: 6 }
        );
        // Continuation bit with nothing after it.
        assert_eq!(read_key(&[0x82], 0).unwrap_err(), DecodeError::TruncatedInput);
        // Past the end.
        assert_eq!(read_key(&[0x08], 1).unwrap_err(), DecodeError::TruncatedInput);
    }

    #[test]
    fn test_skip_field() {
        let buf = [0x96, 0x01, 0xFF];
        assert_eq!(skip_field(&buf, 0, WireType::Varint).unwrap(), 2);

        let buf = [0u8; 12];
        assert_eq!(skip_field(&buf, 0, WireType::I64).unwrap(), 8);
        assert_eq!(skip_field(&buf, 8, WireType::I32).unwrap(), 12);
        assert_eq!(
            skip_field(&buf, 9, WireType::I32).unwrap_err(),
            DecodeError::TruncatedInput
        );

        let buf = [0x03, b'a', b'b', b'c', 0x08];
        assert_eq!(skip_field(&buf, 0, WireType::Len).unwrap(), 4);
        assert_eq!(payload_range(&buf, 0, WireType::Len).unwrap(), (1, 4));
    }

    #[test]
    fn test_skip_field_len_past_end() {
        let buf = [0x05, b'a', b'b'];
        assert_eq!(
            skip_field(&buf, 0, WireType::Len).unwrap_err(),
            DecodeError::TruncatedInput
        );
    }

    #[test]
    fn test_skip_field_rejects_groups() {
        let buf = [0u8; 4];
        assert_eq!(
            skip_field(&buf, 0, WireType::SGroup).unwrap_err(),
            DecodeError::DeprecatedGroupEncoding
        );
        assert_eq!(
            skip_field(&buf, 0, WireType::EGroup).unwrap_err(),
            DecodeError::DeprecatedGroupEncoding
        );
    }

    #[test]
    fn test_zigzag_known_values() {
        assert_eq!(zigzag_encode_64(0), 0);
        assert_eq!(zigzag_encode_64(-1), 1);
        assert_eq!(zigzag_encode_64(1), 2);
        assert_eq!(zigzag_encode_64(-2), 3);
        assert_eq!(zigzag_encode_64(i64::MAX), u64::MAX - 1);
        assert_eq!(zigzag_encode_64(i64::MIN), u64::MAX);
        assert_eq!(zigzag_encode_32(i32::MIN), u32::MAX);
    }

    #[test]
    fn test_read_fixed() {
        let buf = [0x01, 0x00, 0x00, 0x00, 0x02];
        assert_eq!(read_fixed::<4>(&buf, 0).unwrap(), ([1, 0, 0, 0], 4));
        assert_eq!(read_fixed::<4>(&buf, 2).unwrap_err(), DecodeError::TruncatedInput);
    }

    proptest! {
        #[test]
        fn proptest_key_roundtrip(tag in MINIMUM_TAG_VAL..=MAXIMUM_TAG_VAL, wire in 0u8..=5) {
            let wire_type = WireType::try_from_val(wire).unwrap();
            let mut buf = Vec::new();
            encode_key(wire_type, tag, &mut buf);
            prop_assert_eq!(buf.len(), encoded_key_len(tag));

            let (key, next) = read_key(&buf, 0).unwrap();
            prop_assert_eq!(key.into_parts(), (tag, wire_type));
            prop_assert_eq!(next, buf.len());
        }

        #[test]
        fn proptest_zigzag_32(n: i32) {
            prop_assert_eq!(zigzag_decode_32(zigzag_encode_32(n)), n);
        }

        #[test]
        fn proptest_zigzag_64(n: i64) {
            prop_assert_eq!(zigzag_decode_64(zigzag_encode_64(n)), n);
        }

        #[test]
        fn proptest_len_payload(payload: Vec<u8>, trailing: Vec<u8>) {
            let mut buf = Vec::new();
            encode_varint(payload.len() as u64, &mut buf);
            let start = buf.len();
            buf.extend_from_slice(&payload);
            let end = buf.len();
            buf.extend_from_slice(&trailing);

            prop_assert_eq!(read_len(&buf, 0).unwrap(), (start, end));
            prop_assert_eq!(skip_field(&buf, 0, WireType::Len).unwrap(), end);
        }
    }
}
