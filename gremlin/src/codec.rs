//! Per-kind field codecs.
//!
//! Every protobuf field kind is represented by a zero-sized marker type that
//! implements [`FieldCodec`]. A codec knows how to decode a payload located by
//! the reader's scan, how to convert the decoded view into an owned value, and,
//! as a single unit, how large a value is on the wire and how to write it.
//! Generated code never encodes a field by hand, it names a codec and hands it
//! to one of the strategies in [`field`].

use bytes::{BufMut, Bytes};

use crate::error::DecodeError;
use crate::wire::WireType;

mod delimited;
pub mod field;
mod map;
mod message;
mod scalar;

pub use delimited::{ProtoString, RawBytes, Str};
pub use map::{decode_map_entry, MAP_KEY_TAG, MAP_VALUE_TAG};
pub use message::{BoxedMsg, Message, MessageReader, Msg};
pub use scalar::{
    Bool, Double, Enum, Fixed32, Fixed64, Float, Int32, Int64, Sfixed32, Sfixed64, Sint32,
    Sint64, Uint32, Uint64,
};

/// Decoding and encoding rules for one protobuf field kind.
pub trait FieldCodec {
    /// Owned value stored in mutable message types.
    type Value: Clone + Default + PartialEq + core::fmt::Debug;
    /// Decoded value cached by readers.
    type View: Default + core::fmt::Debug;

    /// Wire type a single, unpacked value of this kind is encoded with.
    const WIRE_TYPE: WireType;
    /// Whether repeated fields of this kind may be encoded as one packed run.
    const PACKABLE: bool = false;

    /// Decodes the payload of a single value.
    ///
    /// `payload` is exactly the range located by the scan: the varint bytes,
    /// the 4 or 8 fixed bytes, or the bytes following a length prefix.
    fn decode(payload: Bytes) -> Result<Self::View, DecodeError>;

    /// Decodes a packed run of values, appending them to `out`.
    ///
    /// Only called when [`FieldCodec::PACKABLE`] is set.
    fn decode_packed(run: &[u8], out: &mut Vec<Self::View>) -> Result<(), DecodeError> {
        let _ = (run, out);
        Err(DecodeError::WireTypeMismatch {
            tag: 0,
            expected: Self::WIRE_TYPE,
            actual: WireType::Len,
        })
    }

    /// Converts a decoded view into an independently owned value.
    fn to_value(view: &Self::View) -> Result<Self::Value, DecodeError>;

    /// Whether `value` is the zero value that implicit presence fields omit.
    fn is_default(value: &Self::Value) -> bool;

    /// Encoded size of `value`, including the length prefix for
    /// length-delimited kinds but excluding the field key.
    fn encoded_len(value: &Self::Value) -> usize;

    /// Writes `value`, including the length prefix for length-delimited kinds
    /// but excluding the field key.
    fn encode<B: BufMut>(value: &Self::Value, buf: &mut B);
}
