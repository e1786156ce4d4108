//! Building blocks for generated lazy readers.
//!
//! A generated reader owns the [`Bytes`] it was built over plus one slot per
//! declared field. Construction runs a [`Scanner`] over the buffer once and
//! records where each field's payload lives. Nothing is decoded until a field
//! is asked for, after which the decoded value is cached in the slot.
//!
//! Slots use [`OnceCell`] for the cache, so readers are `Send` but not `Sync`.

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use smallvec::SmallVec;

use crate::codec::{decode_map_entry, FieldCodec};
use crate::error::DecodeError;
use crate::wire::{self, WireType};

/// Where one occurrence of a field lives inside a reader's buffer.
///
/// For length-delimited fields `start` is just past the length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRange {
    start: u32,
    end: u32,
    wire_type: WireType,
}

impl FieldRange {
    #[inline]
    pub fn start(&self) -> usize {
        self.start as usize
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.end as usize
    }

    #[inline]
    pub fn wire_type(&self) -> WireType {
        self.wire_type
    }

    #[inline]
    fn payload(&self, buf: &Bytes) -> Bytes {
        buf.slice(self.start()..self.end())
    }

    #[inline]
    fn expect_wire_type(&self, tag: u32, expected: WireType) -> Result<(), DecodeError> {
        if self.wire_type == expected {
            Ok(())
        } else {
            Err(DecodeError::WireTypeMismatch {
                tag,
                expected,
                actual: self.wire_type,
            })
        }
    }
}

/// Walks an encoded message field by field without interpreting payloads.
///
/// Every field, known or not, is delimited through [`wire::payload_range`],
/// so unknown fields are skipped by simply not recording them.
pub struct Scanner<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner over `buf`. Offsets are stored as `u32`, larger
    /// buffers are rejected.
    pub fn new(buf: &'a [u8]) -> Result<Self, DecodeError> {
        if u32::try_from(buf.len()).is_err() {
            return Err(DecodeError::LengthOverflow {
                value: buf.len() as u64,
            });
        }
        Ok(Scanner { buf, offset: 0 })
    }

    /// Returns the tag and payload range of the next field, or `None` at the
    /// end of the buffer.
    pub fn next_field(&mut self) -> Result<Option<(u32, FieldRange)>, DecodeError> {
        if self.offset >= self.buf.len() {
            return Ok(None);
        }

        let (key, value_start) = wire::read_key(self.buf, self.offset)?;
        let (tag, wire_type) = key.into_parts();
        let (start, end) = wire::payload_range(self.buf, value_start, wire_type)?;
        self.offset = end;

        // `new` checked the buffer length fits in a u32.
        let range = FieldRange {
            start: start as u32,
            end: end as u32,
            wire_type,
        };
        Ok(Some((tag, range)))
    }
}

/// A singular field: the last recorded occurrence plus its decoded value.
pub struct Slot<C: FieldCodec> {
    range: Option<FieldRange>,
    cache: OnceCell<C::View>,
    // Only filled for absent fields; never visible through `get`.
    default: OnceCell<C::View>,
}

impl<C: FieldCodec> Default for Slot<C> {
    fn default() -> Self {
        Slot {
            range: None,
            cache: OnceCell::new(),
            default: OnceCell::new(),
        }
    }
}

impl<C: FieldCodec> fmt::Debug for Slot<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("range", &self.range)
            .field("decoded", &self.cache.get().is_some())
            .finish()
    }
}

impl<C: FieldCodec> Slot<C> {
    /// Records an occurrence. A later occurrence replaces an earlier one.
    #[inline]
    pub fn record(&mut self, range: FieldRange) {
        self.range = Some(range);
    }

    /// Forgets any recorded occurrence. Used when another member of the same
    /// oneof shows up later in the buffer.
    #[inline]
    pub fn clear(&mut self) {
        self.range = None;
    }

    #[inline]
    pub fn is_present(&self) -> bool {
        self.range.is_some()
    }

    /// Decodes the field on first access and returns the cached view, or
    /// `None` if the field was absent.
    pub fn get(&self, buf: &Bytes, tag: u32) -> Result<Option<&C::View>, DecodeError> {
        if let Some(view) = self.cache.get() {
            return Ok(Some(view));
        }
        let Some(range) = self.range else {
            return Ok(None);
        };
        range.expect_wire_type(tag, C::WIRE_TYPE)?;
        let view = C::decode(range.payload(buf))?;
        Ok(Some(self.cache.get_or_init(|| view)))
    }

    /// Like [`Slot::get`] but an absent field yields a default view.
    ///
    /// For message fields this is an empty reader, so accessor chains through
    /// absent messages keep returning defaults at every level. The default is
    /// kept apart from the decoded value, so the field still reads as absent.
    pub fn get_or_default(&self, buf: &Bytes, tag: u32) -> Result<&C::View, DecodeError> {
        if let Some(view) = self.get(buf, tag)? {
            return Ok(view);
        }
        Ok(self.default.get_or_init(Default::default))
    }

    /// Converts the field into an owned value, `None` if absent.
    pub fn materialize(&self, buf: &Bytes, tag: u32) -> Result<Option<C::Value>, DecodeError> {
        self.get(buf, tag)?.map(C::to_value).transpose()
    }
}

/// Inline capacity for the ranges of a repeated or map field before spilling
/// to the heap.
const INLINE_RANGES: usize = 4;

/// A repeated field: every occurrence in wire order.
///
/// Packable kinds accept both packed runs and individual records, in any mix.
pub struct RepeatedSlot<C: FieldCodec> {
    ranges: SmallVec<[FieldRange; INLINE_RANGES]>,
    cache: OnceCell<Vec<C::View>>,
}

impl<C: FieldCodec> Default for RepeatedSlot<C> {
    fn default() -> Self {
        RepeatedSlot {
            ranges: SmallVec::new(),
            cache: OnceCell::new(),
        }
    }
}

impl<C: FieldCodec> fmt::Debug for RepeatedSlot<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepeatedSlot")
            .field("ranges", &self.ranges)
            .field("decoded", &self.cache.get().is_some())
            .finish()
    }
}

impl<C: FieldCodec> RepeatedSlot<C> {
    #[inline]
    pub fn push(&mut self, range: FieldRange) {
        self.ranges.push(range);
    }

    /// Whether any occurrence was recorded. An empty packed run still counts.
    #[inline]
    pub fn is_present(&self) -> bool {
        !self.ranges.is_empty()
    }

    /// Decodes every occurrence on first access and returns the cached values.
    pub fn get(&self, buf: &Bytes, tag: u32) -> Result<&[C::View], DecodeError> {
        if let Some(values) = self.cache.get() {
            return Ok(values);
        }

        let mut values = Vec::with_capacity(self.ranges.len());
        for range in &self.ranges {
            if range.wire_type == C::WIRE_TYPE {
                values.push(C::decode(range.payload(buf))?);
            } else if C::PACKABLE && range.wire_type == WireType::Len {
                C::decode_packed(&buf[range.start()..range.end()], &mut values)?;
            } else {
                range.expect_wire_type(tag, C::WIRE_TYPE)?;
            }
        }
        Ok(self.cache.get_or_init(|| values))
    }

    /// Converts every element into an owned value.
    pub fn materialize(&self, buf: &Bytes, tag: u32) -> Result<Vec<C::Value>, DecodeError> {
        self.get(buf, tag)?.iter().map(C::to_value).collect()
    }
}

/// A map field: every entry in wire order, decoded into a sorted map.
pub struct MapSlot<K: FieldCodec, V: FieldCodec> {
    ranges: SmallVec<[FieldRange; INLINE_RANGES]>,
    cache: OnceCell<BTreeMap<K::View, V::View>>,
}

impl<K: FieldCodec, V: FieldCodec> Default for MapSlot<K, V> {
    fn default() -> Self {
        MapSlot {
            ranges: SmallVec::new(),
            cache: OnceCell::new(),
        }
    }
}

impl<K: FieldCodec, V: FieldCodec> fmt::Debug for MapSlot<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapSlot")
            .field("ranges", &self.ranges)
            .field("decoded", &self.cache.get().is_some())
            .finish()
    }
}

impl<K, V> MapSlot<K, V>
where
    K: FieldCodec,
    K::View: Ord,
    K::Value: Ord,
    V: FieldCodec,
{
    #[inline]
    pub fn push(&mut self, range: FieldRange) {
        self.ranges.push(range);
    }

    #[inline]
    pub fn is_present(&self) -> bool {
        !self.ranges.is_empty()
    }

    /// Decodes every entry on first access. A key seen more than once keeps
    /// the value from its last entry.
    pub fn get(&self, buf: &Bytes, tag: u32) -> Result<&BTreeMap<K::View, V::View>, DecodeError> {
        if let Some(entries) = self.cache.get() {
            return Ok(entries);
        }

        let mut entries = BTreeMap::new();
        for range in &self.ranges {
            range.expect_wire_type(tag, WireType::Len)?;
            let (key, value) = decode_map_entry::<K, V>(range.payload(buf))?;
            entries.insert(key, value);
        }
        Ok(self.cache.get_or_init(|| entries))
    }

    /// Converts every entry into owned keys and values.
    pub fn materialize(
        &self,
        buf: &Bytes,
        tag: u32,
    ) -> Result<BTreeMap<K::Value, V::Value>, DecodeError> {
        self.get(buf, tag)?
            .iter()
            .map(|(key, value)| Ok((K::to_value(key)?, V::to_value(value)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Int32, Str, Uint64};

    fn scan(buf: &[u8]) -> Result<Vec<(u32, FieldRange)>, DecodeError> {
        let mut scanner = Scanner::new(buf)?;
        let mut fields = Vec::new();
        while let Some(field) = scanner.next_field()? {
            fields.push(field);
        }
        Ok(fields)
    }

    #[test]
    fn test_scanner_ranges() {
        let buf = [0x08, 0x07, 0x12, 0x01, b'a', 0x1D, 0, 0, 0, 0];
        let fields = scan(&buf).unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].0, 1);
        assert_eq!((fields[0].1.start(), fields[0].1.end()), (1, 2));
        assert_eq!(fields[1].0, 2);
        assert_eq!((fields[1].1.start(), fields[1].1.end()), (4, 5));
        assert_eq!(fields[2].0, 3);
        assert_eq!(fields[2].1.wire_type(), WireType::I32);
    }

    #[test]
    fn test_scanner_truncated() {
        assert_eq!(scan(&[0x12, 0x05, b'a']).unwrap_err(), DecodeError::TruncatedInput);
        assert_eq!(scan(&[0x08, 0x80]).unwrap_err(), DecodeError::TruncatedInput);
    }

    #[test]
    fn test_slot_memoizes() {
        let buf = Bytes::from_static(&[0x08, 0x96, 0x01]);
        let fields = scan(&buf).unwrap();
        let mut slot = Slot::<Uint64>::default();
        assert_eq!(slot.get(&buf, 1).unwrap(), None);

        slot.record(fields[0].1);
        let first = slot.get(&buf, 1).unwrap().unwrap() as *const u64;
        let second = slot.get(&buf, 1).unwrap().unwrap() as *const u64;
        assert_eq!(first, second);
        assert_eq!(slot.materialize(&buf, 1).unwrap(), Some(150));
    }

    #[test]
    fn test_slot_default_leaves_field_absent() {
        let buf = Bytes::new();
        let slot = Slot::<Uint64>::default();
        assert_eq!(*slot.get_or_default(&buf, 1).unwrap(), 0);
        assert_eq!(slot.get(&buf, 1).unwrap(), None);
        assert_eq!(slot.materialize(&buf, 1).unwrap(), None);
        assert!(!slot.is_present());
    }

    #[test]
    fn test_slot_wire_type_mismatch_is_lazy() {
        // Field 1 sent as a string, declared as a varint.
        let buf = Bytes::from_static(&[0x0A, 0x01, b'x']);
        let fields = scan(&buf).unwrap();
        let mut slot = Slot::<Int32>::default();
        slot.record(fields[0].1);
        assert_eq!(
            slot.get(&buf, 1).unwrap_err(),
            DecodeError::WireTypeMismatch {
                tag: 1,
                expected: WireType::Varint,
                actual: WireType::Len,
            }
        );
    }

    #[test]
    fn test_repeated_mixed_packing() {
        // 4: [1, 2] packed, then 4: 3 unpacked.
        let buf = Bytes::from_static(&[0x22, 0x02, 0x01, 0x02, 0x20, 0x03]);
        let mut slot = RepeatedSlot::<Int32>::default();
        for (_, range) in scan(&buf).unwrap() {
            slot.push(range);
        }
        assert_eq!(slot.get(&buf, 4).unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_repeated_strings_reject_fixed() {
        let buf = Bytes::from_static(&[0x1D, 0, 0, 0, 0]);
        let mut slot = RepeatedSlot::<Str>::default();
        for (_, range) in scan(&buf).unwrap() {
            slot.push(range);
        }
        assert!(matches!(
            slot.get(&buf, 3).unwrap_err(),
            DecodeError::WireTypeMismatch { tag: 3, .. }
        ));
    }

    #[test]
    fn test_map_last_entry_wins() {
        // 5: {1: "k", 2: 1}, 5: {1: "k", 2: 2}
        let buf = Bytes::from_static(&[
            0x2A, 0x05, 0x0A, 0x01, b'k', 0x10, 0x01, 0x2A, 0x05, 0x0A, 0x01, b'k', 0x10, 0x02,
        ]);
        let mut slot = MapSlot::<Str, Int32>::default();
        for (_, range) in scan(&buf).unwrap() {
            slot.push(range);
        }
        let entries = slot.get(&buf, 5).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.get("k"), Some(&2));
    }
}
