//! Nested messages.

use core::fmt;
use core::marker::PhantomData;

use bytes::{BufMut, Bytes};

use super::FieldCodec;
use crate::error::DecodeError;
use crate::wire::{self, WireType};

/// A fully decoded, independently owned protobuf message.
///
/// Encoding happens in two passes: [`Message::encoded_len`] sizes the message
/// (recursing into nested messages) and [`Message::encode`] writes it, using
/// the same per-field strategies so the two can never disagree.
pub trait Message: Clone + Default + PartialEq + fmt::Debug {
    /// The lazy reader generated alongside this message.
    type Reader: MessageReader<Owned = Self>;

    /// Size pass: the number of bytes [`Message::encode`] will write.
    fn encoded_len(&self) -> usize;

    /// Write pass: appends every present field to `buf`.
    fn encode<B: BufMut>(&self, buf: &mut B);

    /// Encodes `self` into a freshly allocated, exactly sized buffer.
    fn marshal(&self) -> Vec<u8> {
        let len = self.encoded_len();
        let mut buf = Vec::with_capacity(len);
        self.encode(&mut buf);
        debug_assert_eq!(buf.len(), len, "size and write passes disagree");
        buf
    }
}

/// A lazily decoded view over an encoded message.
///
/// Construction only scans the buffer and records where each field lives.
/// Individual fields are decoded on first access and cached.
pub trait MessageReader: Default + fmt::Debug + Sized {
    /// The owned message this reader materializes into.
    type Owned: Message<Reader = Self>;

    /// Scans `buf`, recording the location of every known field.
    ///
    /// Fails if the bytes are structurally malformed. Unknown fields are skipped.
    fn unmarshal(buf: Bytes) -> Result<Self, DecodeError>;

    /// Decodes every field, recursing into nested readers, into an owned message.
    fn materialize(&self) -> Result<Self::Owned, DecodeError>;

    /// The bytes this reader was built over.
    fn as_bytes(&self) -> &[u8];
}

#[inline]
fn message_len<M: Message>(value: &M) -> usize {
    let len = value.encoded_len();
    wire::encoded_varint_len(len as u64) + len
}

/// Writes `value` with its length prefix.
///
/// The prefix recomputes the nested size, the same as prost, so writing a
/// message costs O(size * depth). Owned messages carry no size cache.
#[inline]
fn encode_message<M: Message, B: BufMut>(value: &M, buf: &mut B) {
    wire::encode_varint(value.encoded_len() as u64, buf);
    value.encode(buf);
}

/// Message typed fields. The reader for the nested message is built over a
/// sub-slice of the parent's buffer, nothing is copied.
pub struct Msg<M>(PhantomData<M>);

impl<M> fmt::Debug for Msg<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Msg")
    }
}

impl<M: Message> FieldCodec for Msg<M> {
    type Value = M;
    type View = M::Reader;

    const WIRE_TYPE: WireType = WireType::Len;

    #[inline]
    fn decode(payload: Bytes) -> Result<M::Reader, DecodeError> {
        M::Reader::unmarshal(payload)
    }

    fn to_value(view: &M::Reader) -> Result<M, DecodeError> {
        view.materialize()
    }

    /// Message fields always track presence.
    #[inline]
    fn is_default(_value: &M) -> bool {
        false
    }

    #[inline]
    fn encoded_len(value: &M) -> usize {
        message_len(value)
    }

    #[inline]
    fn encode<B: BufMut>(value: &M, buf: &mut B) {
        encode_message(value, buf);
    }
}

/// Like [`Msg`] but the cached reader is boxed. Used for singular fields that
/// close a cycle of message types (e.g. a tree node holding its parent), where
/// an inline reader would have infinite size.
pub struct BoxedMsg<M>(PhantomData<M>);

impl<M> fmt::Debug for BoxedMsg<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BoxedMsg")
    }
}

impl<M: Message> FieldCodec for BoxedMsg<M> {
    type Value = M;
    type View = Box<M::Reader>;

    const WIRE_TYPE: WireType = WireType::Len;

    #[inline]
    fn decode(payload: Bytes) -> Result<Box<M::Reader>, DecodeError> {
        M::Reader::unmarshal(payload).map(Box::new)
    }

    fn to_value(view: &Box<M::Reader>) -> Result<M, DecodeError> {
        view.materialize()
    }

    #[inline]
    fn is_default(_value: &M) -> bool {
        false
    }

    #[inline]
    fn encoded_len(value: &M) -> usize {
        message_len(value)
    }

    #[inline]
    fn encode<B: BufMut>(value: &M, buf: &mut B) {
        encode_message(value, buf);
    }
}
