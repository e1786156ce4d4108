use crate::wire::WireType;

/// Errors produced while scanning or decoding protobuf bytes.
///
/// Any of these returned from a reader's `unmarshal` is terminal: no partially
/// scanned reader is ever handed out.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The buffer ended before a value was fully readable.
    #[error("truncated input: buffer ended mid-value")]
    TruncatedInput,
    /// A varint ran past its maximum encoded width.
    #[error("malformed varint: exceeds maximum encoded width")]
    MalformedVarint,
    /// A recognized field arrived with a wire type its declaration cannot carry.
    #[error("wire type mismatch for field {tag}: expected {expected:?}, found {actual:?}")]
    WireTypeMismatch {
        tag: u32,
        expected: WireType,
        actual: WireType,
    },
    #[error("invalid 'wire type' value: {value}")]
    InvalidWireType { value: u8 },
    #[error("invalid field number: {value}")]
    InvalidTag { value: u64 },
    #[error("deprecated group encoding not supported")]
    DeprecatedGroupEncoding,
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,
    #[error("length prefix {value} exceeds addressable memory")]
    LengthOverflow { value: u64 },
    #[error("invalid packed field length: {actual} is not a multiple of {expected_multiple}")]
    InvalidPackedLength { expected_multiple: u8, actual: usize },
    /// Only produced by readers generated with strict enum checking.
    #[error("value {value} is not declared by enum '{enum_name}'")]
    UnknownEnumValue { enum_name: &'static str, value: i32 },
}
