//! Field encoding strategies.
//!
//! Each strategy pairs a field's tag and presence rules with a [`FieldCodec`]
//! and exposes both halves of the two-pass marshal through one
//! [`FieldEncoder`] impl. Generated `encoded_len` and `encode` bodies build
//! the exact same strategy value for a field and call one method or the other.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use bytes::BufMut;

use super::map::{MAP_KEY_TAG, MAP_VALUE_TAG};
use super::FieldCodec;
use crate::wire::{self, WireType};

/// Sizes and writes one field of a message, key included.
pub trait FieldEncoder {
    /// Number of bytes [`FieldEncoder::encode`] writes.
    fn encoded_len(&self) -> usize;

    /// Writes the field, or nothing if it is not present.
    fn encode<B: BufMut>(&self, buf: &mut B);
}

/// A singular field without presence tracking: omitted when it holds the
/// zero value.
pub struct Implicit<'a, C: FieldCodec> {
    tag: u32,
    value: &'a C::Value,
    _codec: PhantomData<C>,
}

impl<'a, C: FieldCodec> Implicit<'a, C> {
    #[inline]
    pub fn new(tag: u32, value: &'a C::Value) -> Self {
        Implicit {
            tag,
            value,
            _codec: PhantomData,
        }
    }
}

impl<C: FieldCodec> FieldEncoder for Implicit<'_, C> {
    #[inline]
    fn encoded_len(&self) -> usize {
        if C::is_default(self.value) {
            0
        } else {
            wire::encoded_key_len(self.tag) + C::encoded_len(self.value)
        }
    }

    #[inline]
    fn encode<B: BufMut>(&self, buf: &mut B) {
        if !C::is_default(self.value) {
            wire::encode_key(C::WIRE_TYPE, self.tag, buf);
            C::encode(self.value, buf);
        }
    }
}

/// A singular field with presence tracking (`optional`, `required`, message
/// typed and oneof members): written whenever a value is present, even the
/// zero value.
pub struct Explicit<'a, C: FieldCodec> {
    tag: u32,
    value: Option<&'a C::Value>,
    _codec: PhantomData<C>,
}

impl<'a, C: FieldCodec> Explicit<'a, C> {
    #[inline]
    pub fn new(tag: u32, value: Option<&'a C::Value>) -> Self {
        Explicit {
            tag,
            value,
            _codec: PhantomData,
        }
    }
}

impl<C: FieldCodec> FieldEncoder for Explicit<'_, C> {
    #[inline]
    fn encoded_len(&self) -> usize {
        match self.value {
            Some(value) => wire::encoded_key_len(self.tag) + C::encoded_len(value),
            None => 0,
        }
    }

    #[inline]
    fn encode<B: BufMut>(&self, buf: &mut B) {
        if let Some(value) = self.value {
            wire::encode_key(C::WIRE_TYPE, self.tag, buf);
            C::encode(value, buf);
        }
    }
}

/// A repeated field.
///
/// Packable kinds are written as one length-delimited run when `packed` is
/// set, everything else gets one record per element.
pub struct Repeated<'a, C: FieldCodec> {
    tag: u32,
    values: &'a [C::Value],
    packed: bool,
    _codec: PhantomData<C>,
}

impl<'a, C: FieldCodec> Repeated<'a, C> {
    #[inline]
    pub fn new(tag: u32, values: &'a [C::Value], packed: bool) -> Self {
        Repeated {
            tag,
            values,
            packed: packed && C::PACKABLE,
            _codec: PhantomData,
        }
    }

    fn packed_payload_len(&self) -> usize {
        self.values.iter().map(C::encoded_len).sum()
    }
}

impl<C: FieldCodec> FieldEncoder for Repeated<'_, C> {
    fn encoded_len(&self) -> usize {
        if self.values.is_empty() {
            return 0;
        }
        if self.packed {
            let payload = self.packed_payload_len();
            wire::encoded_key_len(self.tag) + wire::encoded_varint_len(payload as u64) + payload
        } else {
            let key_len = wire::encoded_key_len(self.tag);
            self.values
                .iter()
                .map(|value| key_len + C::encoded_len(value))
                .sum()
        }
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        if self.values.is_empty() {
            return;
        }
        if self.packed {
            wire::encode_key(WireType::Len, self.tag, buf);
            wire::encode_varint(self.packed_payload_len() as u64, buf);
            for value in self.values {
                C::encode(value, buf);
            }
        } else {
            for value in self.values {
                wire::encode_key(C::WIRE_TYPE, self.tag, buf);
                C::encode(value, buf);
            }
        }
    }
}

/// A map field, written as one `{1: key, 2: value}` entry per pair. Both the
/// key and the value are always written, defaults included.
pub struct MapField<'a, K: FieldCodec, V: FieldCodec> {
    tag: u32,
    entries: &'a BTreeMap<K::Value, V::Value>,
    _codec: PhantomData<(K, V)>,
}

impl<'a, K: FieldCodec, V: FieldCodec> MapField<'a, K, V> {
    #[inline]
    pub fn new(tag: u32, entries: &'a BTreeMap<K::Value, V::Value>) -> Self {
        MapField {
            tag,
            entries,
            _codec: PhantomData,
        }
    }

    #[inline]
    fn entry_len(key: &K::Value, value: &V::Value) -> usize {
        wire::encoded_key_len(MAP_KEY_TAG)
            + K::encoded_len(key)
            + wire::encoded_key_len(MAP_VALUE_TAG)
            + V::encoded_len(value)
    }
}

impl<K: FieldCodec, V: FieldCodec> FieldEncoder for MapField<'_, K, V> {
    fn encoded_len(&self) -> usize {
        let key_len = wire::encoded_key_len(self.tag);
        self.entries
            .iter()
            .map(|(key, value)| {
                let entry = Self::entry_len(key, value);
                key_len + wire::encoded_varint_len(entry as u64) + entry
            })
            .sum()
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        for (key, value) in self.entries {
            wire::encode_key(WireType::Len, self.tag, buf);
            wire::encode_varint(Self::entry_len(key, value) as u64, buf);
            wire::encode_key(K::WIRE_TYPE, MAP_KEY_TAG, buf);
            K::encode(key, buf);
            wire::encode_key(V::WIRE_TYPE, MAP_VALUE_TAG, buf);
            V::encode(value, buf);
        }
    }
}
