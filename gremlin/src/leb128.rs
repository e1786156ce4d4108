//! LEB128 variable-length integer encoding/decoding.

use crate::error::DecodeError;

/// Types that can be decoded from, and encoded as, a LEB128 integer.
pub trait LebCodec: Sized + Copy {
    /// Maximum number of bytes a well-formed encoding of `Self` occupies.
    const MAX_LEB_BYTES: usize;

    /// Decode a LEB128 variable length integer from the front of `data`.
    ///
    /// Returns a tuple of the decoded value and the number of bytes read.
    ///
    /// * If `data` ends while the continuation bit is still set, returns
    ///   [`DecodeError::TruncatedInput`].
    /// * If the encoding is longer than [`LebCodec::MAX_LEB_BYTES`], or the
    ///   final byte carries bits that do not fit in `Self`, returns
    ///   [`DecodeError::MalformedVarint`].
    fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeError>;

    /// Encode `self` as a LEB128 variable length integer into the provided
    /// buffer, returning the number of bytes written.
    fn encode_leb128<B: bytes::BufMut>(self, buf: &mut B) -> usize;

    /// The number of bytes required to encode this integer.
    fn encoded_leb128_len(self) -> usize;
}

/// Number of encoded bytes indexed by the count of leading zero bits of a u64.
const U64_LEN_BY_LEADING_ZEROS: [u8; 65] = {
    let mut table = [0u8; 65];
    let mut zeros = 0;
    while zeros < 65 {
        let significant = 64 - zeros;
        table[zeros] = if significant == 0 {
            1
        } else {
            ((significant + 6) / 7) as u8
        };
        zeros += 1;
    }
    table
};

impl LebCodec for u64 {
    const MAX_LEB_BYTES: usize = 10;

    #[inline]
    fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeError> {
        // Fast path for the overwhelmingly common single byte case.
        match data.first() {
            Some(&b) if b < 0x80 => return Ok((u64::from(b), 1)),
            None => return Err(DecodeError::TruncatedInput),
            _ => {}
        }

        let mut value = 0u64;
        for (idx, &b) in data.iter().take(Self::MAX_LEB_BYTES).enumerate() {
            if idx == Self::MAX_LEB_BYTES - 1 && b > 0x01 {
                // The tenth byte may only contribute the single top bit.
                return Err(DecodeError::MalformedVarint);
            }
            value |= u64::from(b & 0x7F) << (idx * 7);
            if b < 0x80 {
                return Ok((value, idx + 1));
            }
        }

        if data.len() < Self::MAX_LEB_BYTES {
            Err(DecodeError::TruncatedInput)
        } else {
            Err(DecodeError::MalformedVarint)
        }
    }

    #[inline]
    fn encode_leb128<B: bytes::BufMut>(mut self, buf: &mut B) -> usize {
        let mut written = 1;
        while self >= 0x80 {
            buf.put_u8((self as u8 & 0x7F) | 0x80);
            self >>= 7;
            written += 1;
        }
        buf.put_u8(self as u8);
        written
    }

    #[inline]
    fn encoded_leb128_len(self) -> usize {
        usize::from(U64_LEN_BY_LEADING_ZEROS[self.leading_zeros() as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_encodings() {
        let cases: &[(u64, &[u8])] = &[
            (0, &[0x00]),
            (1, &[0x01]),
            (127, &[0x7F]),
            (128, &[0x80, 0x01]),
            (150, &[0x96, 0x01]),
            (16_383, &[0xFF, 0x7F]),
            (16_384, &[0x80, 0x80, 0x01]),
            (
                u64::MAX,
                &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01],
            ),
        ];

        for (value, bytes) in cases {
            let mut buf = Vec::new();
            let written = value.encode_leb128(&mut buf);
            assert_eq!(&buf[..], *bytes, "encoding {value}");
            assert_eq!(written, bytes.len());
            assert_eq!(value.encoded_leb128_len(), bytes.len());
            assert_eq!(u64::decode_leb128(bytes).unwrap(), (*value, bytes.len()));
        }
    }

    #[test]
    fn test_truncated() {
        assert_eq!(u64::decode_leb128(&[]), Err(DecodeError::TruncatedInput));
        assert_eq!(u64::decode_leb128(&[0x80]), Err(DecodeError::TruncatedInput));
        assert_eq!(
            u64::decode_leb128(&[0xFF, 0xFF, 0xFF]),
            Err(DecodeError::TruncatedInput)
        );
    }

    #[test]
    fn test_malformed() {
        // Eleven bytes, every one with the continuation bit set.
        let too_long = [0xFF; 11];
        assert_eq!(u64::decode_leb128(&too_long), Err(DecodeError::MalformedVarint));

        // Ten bytes where the last one carries more than the top bit.
        let mut overflow = [0xFF; 10];
        overflow[9] = 0x02;
        assert_eq!(u64::decode_leb128(&overflow), Err(DecodeError::MalformedVarint));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        assert_eq!(u64::decode_leb128(&[0x96, 0x01, 0xAA]).unwrap(), (150, 2));
    }

    proptest! {
        #[test]
        fn proptest_u64_roundtrip(value: u64) {
            let mut buf = Vec::new();
            let written = value.encode_leb128(&mut buf);
            prop_assert_eq!(written, buf.len());
            prop_assert_eq!(value.encoded_leb128_len(), buf.len());
            prop_assert_eq!(u64::decode_leb128(&buf).unwrap(), (value, buf.len()));
        }

        #[test]
        fn proptest_truncated_never_panics(value in 128u64.., cut in 1usize..10) {
            let mut buf = Vec::new();
            value.encode_leb128(&mut buf);
            let cut = cut.min(buf.len() - 1);
            prop_assert_eq!(u64::decode_leb128(&buf[..cut]), Err(DecodeError::TruncatedInput));
        }
    }
}
