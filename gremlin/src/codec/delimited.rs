//! Length-delimited `string` and `bytes` fields.

use core::borrow::Borrow;
use core::fmt;

use bytes::BufMut;

use super::FieldCodec;
use crate::error::DecodeError;
use crate::wire::{self, WireType};

/// A UTF-8 validated view into the buffer a reader was built over.
///
/// Cloning is cheap, the underlying [`bytes::Bytes`] is reference counted.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProtoString(bytes::Bytes);

impl ProtoString {
    /// Wraps `bytes`, validating that they are UTF-8.
    pub fn try_from_bytes(bytes: bytes::Bytes) -> Result<Self, DecodeError> {
        core::str::from_utf8(&bytes).map_err(|_| DecodeError::InvalidUtf8)?;
        Ok(ProtoString(bytes))
    }

    /// Returns the string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        // SAFETY: The only constructors validate (or start from a `str`).
        unsafe { core::str::from_utf8_unchecked(&self.0) }
    }

    /// Returns the underlying bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes `self`, returning the underlying [`bytes::Bytes`].
    pub fn into_bytes(self) -> bytes::Bytes {
        self.0
    }
}

impl core::ops::Deref for ProtoString {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for ProtoString {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

// Hashes like `str` so the `Borrow<str>` impl holds for hashed collections.
impl core::hash::Hash for ProtoString {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl AsRef<str> for ProtoString {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Debug for ProtoString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for ProtoString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&'static str> for ProtoString {
    fn from(value: &'static str) -> Self {
        ProtoString(bytes::Bytes::from_static(value.as_bytes()))
    }
}

impl From<String> for ProtoString {
    fn from(value: String) -> Self {
        ProtoString(bytes::Bytes::from(value.into_bytes()))
    }
}

impl PartialEq<str> for ProtoString {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for ProtoString {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

#[inline]
fn delimited_len(len: usize) -> usize {
    wire::encoded_varint_len(len as u64) + len
}

#[inline]
fn encode_delimited<B: BufMut>(payload: &[u8], buf: &mut B) {
    wire::encode_varint(payload.len() as u64, buf);
    buf.put_slice(payload);
}

/// `string` fields.
#[derive(Debug, Clone, Copy)]
pub enum Str {}

impl FieldCodec for Str {
    type Value = String;
    type View = ProtoString;

    const WIRE_TYPE: WireType = WireType::Len;

    #[inline]
    fn decode(payload: bytes::Bytes) -> Result<ProtoString, DecodeError> {
        ProtoString::try_from_bytes(payload)
    }

    fn to_value(view: &ProtoString) -> Result<String, DecodeError> {
        Ok(view.as_str().to_owned())
    }

    #[inline]
    fn is_default(value: &String) -> bool {
        value.is_empty()
    }

    #[inline]
    fn encoded_len(value: &String) -> usize {
        delimited_len(value.len())
    }

    #[inline]
    fn encode<B: BufMut>(value: &String, buf: &mut B) {
        encode_delimited(value.as_bytes(), buf);
    }
}

/// `bytes` fields.
#[derive(Debug, Clone, Copy)]
pub enum RawBytes {}

impl FieldCodec for RawBytes {
    type Value = Vec<u8>;
    type View = bytes::Bytes;

    const WIRE_TYPE: WireType = WireType::Len;

    #[inline]
    fn decode(payload: bytes::Bytes) -> Result<bytes::Bytes, DecodeError> {
        Ok(payload)
    }

    fn to_value(view: &bytes::Bytes) -> Result<Vec<u8>, DecodeError> {
        Ok(view.to_vec())
    }

    #[inline]
    fn is_default(value: &Vec<u8>) -> bool {
        value.is_empty()
    }

    #[inline]
    fn encoded_len(value: &Vec<u8>) -> usize {
        delimited_len(value.len())
    }

    #[inline]
    fn encode<B: BufMut>(value: &Vec<u8>, buf: &mut B) {
        encode_delimited(value, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_utf8() {
        let payload = bytes::Bytes::from_static(&[0xC3, 0x28]);
        assert_eq!(Str::decode(payload).unwrap_err(), DecodeError::InvalidUtf8);
    }

    #[test]
    fn test_string_encoding() {
        let mut buf = Vec::new();
        let value = String::from("hello");
        Str::encode(&value, &mut buf);
        assert_eq!(buf, b"\x05hello");
        assert_eq!(Str::encoded_len(&value), 6);

        let view = Str::decode(bytes::Bytes::copy_from_slice(&buf[1..])).unwrap();
        assert_eq!(view, "hello");
        assert_eq!(Str::to_value(&view).unwrap(), value);
    }

    #[test]
    fn test_long_bytes_prefix() {
        let value = vec![0xAB; 300];
        let mut buf = Vec::new();
        RawBytes::encode(&value, &mut buf);
        // 300 needs a two byte length prefix.
        assert_eq!(&buf[..2], &[0xAC, 0x02]);
        assert_eq!(buf.len(), RawBytes::encoded_len(&value));
    }

    #[test]
    fn test_proto_string_borrow() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(ProtoString::from("team"), 1);
        assert_eq!(map.get("team"), Some(&1));
    }
}
