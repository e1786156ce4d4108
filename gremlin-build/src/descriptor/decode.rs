//! Decoder for FileDescriptorSet from protobuf binary format.

use gremlin::wire::{self, WireType};
use gremlin::DecodeError;

use super::*;
use crate::Error;

/// Decode a FileDescriptorSet from protobuf binary data.
pub fn decode_file_descriptor_set(data: &[u8]) -> Result<FileDescriptorSet, Error> {
    let mut fds = FileDescriptorSet::default();
    let mut fields = Fields::new(data);
    while let Some(field) = fields.next_field()? {
        if field.tag == 1 {
            fds.file.push(decode_file_descriptor_proto(field.message()?)?);
        }
    }
    Ok(fds)
}

fn decode_file_descriptor_proto(data: &[u8]) -> Result<FileDescriptorProto, Error> {
    let mut fdp = FileDescriptorProto::default();
    let mut fields = Fields::new(data);
    while let Some(field) = fields.next_field()? {
        match field.tag {
            1 => fdp.name = Some(field.string()?),
            2 => fdp.package = Some(field.string()?),
            3 => fdp.dependency.push(field.string()?),
            4 => fdp.message_type.push(decode_descriptor_proto(field.message()?)?),
            5 => fdp.enum_type.push(decode_enum_descriptor_proto(field.message()?)?),
            12 => fdp.syntax = Some(field.string()?),
            _ => {}
        }
    }
    Ok(fdp)
}

fn decode_descriptor_proto(data: &[u8]) -> Result<DescriptorProto, Error> {
    let mut dp = DescriptorProto::default();
    let mut fields = Fields::new(data);
    while let Some(field) = fields.next_field()? {
        match field.tag {
            1 => dp.name = Some(field.string()?),
            2 => dp.field.push(decode_field_descriptor_proto(field.message()?)?),
            3 => dp.nested_type.push(decode_descriptor_proto(field.message()?)?),
            4 => dp.enum_type.push(decode_enum_descriptor_proto(field.message()?)?),
            7 => dp.options = Some(decode_message_options(field.message()?)?),
            8 => dp.oneof_decl.push(decode_oneof_descriptor_proto(field.message()?)?),
            _ => {}
        }
    }
    Ok(dp)
}

fn decode_field_descriptor_proto(data: &[u8]) -> Result<FieldDescriptorProto, Error> {
    let mut fdp = FieldDescriptorProto::default();
    let mut fields = Fields::new(data);
    while let Some(field) = fields.next_field()? {
        match field.tag {
            1 => fdp.name = Some(field.string()?),
            3 => fdp.number = Some(field.int32()?),
            4 => fdp.label = Some(field.int32()?),
            5 => fdp.r#type = Some(field.int32()?),
            6 => fdp.type_name = Some(field.string()?),
            7 => fdp.default_value = Some(field.string()?),
            8 => fdp.options = Some(decode_field_options(field.message()?)?),
            9 => fdp.oneof_index = Some(field.int32()?),
            10 => fdp.json_name = Some(field.string()?),
            17 => fdp.proto3_optional = Some(field.bool()?),
            _ => {}
        }
    }
    Ok(fdp)
}

fn decode_field_options(data: &[u8]) -> Result<FieldOptions, Error> {
    let mut opts = FieldOptions::default();
    let mut fields = Fields::new(data);
    while let Some(field) = fields.next_field()? {
        if field.tag == 2 {
            opts.packed = Some(field.bool()?);
        }
    }
    Ok(opts)
}

fn decode_enum_descriptor_proto(data: &[u8]) -> Result<EnumDescriptorProto, Error> {
    let mut edp = EnumDescriptorProto::default();
    let mut fields = Fields::new(data);
    while let Some(field) = fields.next_field()? {
        match field.tag {
            1 => edp.name = Some(field.string()?),
            2 => edp.value.push(decode_enum_value_descriptor_proto(field.message()?)?),
            _ => {}
        }
    }
    Ok(edp)
}

fn decode_enum_value_descriptor_proto(data: &[u8]) -> Result<EnumValueDescriptorProto, Error> {
    let mut evdp = EnumValueDescriptorProto::default();
    let mut fields = Fields::new(data);
    while let Some(field) = fields.next_field()? {
        match field.tag {
            1 => evdp.name = Some(field.string()?),
            2 => evdp.number = Some(field.int32()?),
            _ => {}
        }
    }
    Ok(evdp)
}

fn decode_oneof_descriptor_proto(data: &[u8]) -> Result<OneofDescriptorProto, Error> {
    let mut odp = OneofDescriptorProto::default();
    let mut fields = Fields::new(data);
    while let Some(field) = fields.next_field()? {
        if field.tag == 1 {
            odp.name = Some(field.string()?);
        }
    }
    Ok(odp)
}

fn decode_message_options(data: &[u8]) -> Result<MessageOptions, Error> {
    let mut mo = MessageOptions::default();
    let mut fields = Fields::new(data);
    while let Some(field) = fields.next_field()? {
        if field.tag == 7 {
            mo.map_entry = Some(field.bool()?);
        }
    }
    Ok(mo)
}

/// Walks the fields of one encoded message. Unknown fields are delimited the
/// same way as known ones, so callers skip them by ignoring them.
struct Fields<'a> {
    buf: &'a [u8],
    offset: usize,
}

/// One field occurrence: its tag, wire type and payload.
struct Field<'a> {
    tag: u32,
    wire_type: WireType,
    payload: &'a [u8],
}

impl<'a> Fields<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Fields { buf, offset: 0 }
    }

    fn next_field(&mut self) -> Result<Option<Field<'a>>, DecodeError> {
        if self.offset >= self.buf.len() {
            return Ok(None);
        }
        let (key, value_start) = wire::read_key(self.buf, self.offset)?;
        let (tag, wire_type) = key.into_parts();
        let (start, end) = wire::payload_range(self.buf, value_start, wire_type)?;
        self.offset = end;
        Ok(Some(Field {
            tag,
            wire_type,
            payload: &self.buf[start..end],
        }))
    }
}

impl<'a> Field<'a> {
    fn expect(&self, expected: WireType) -> Result<(), DecodeError> {
        if self.wire_type == expected {
            Ok(())
        } else {
            Err(DecodeError::WireTypeMismatch {
                tag: self.tag,
                expected,
                actual: self.wire_type,
            })
        }
    }

    fn varint(&self) -> Result<u64, DecodeError> {
        self.expect(WireType::Varint)?;
        wire::read_varint(self.payload, 0).map(|(value, _)| value)
    }

    fn int32(&self) -> Result<i32, DecodeError> {
        self.varint().map(|value| value as i32)
    }

    fn bool(&self) -> Result<bool, DecodeError> {
        self.varint().map(|value| value != 0)
    }

    fn message(&self) -> Result<&'a [u8], DecodeError> {
        self.expect(WireType::Len)?;
        Ok(self.payload)
    }

    fn string(&self) -> Result<String, DecodeError> {
        let bytes = self.message()?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| DecodeError::InvalidUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_field(tag: u32, value: &str, out: &mut Vec<u8>) {
        wire::encode_key(WireType::Len, tag, out);
        wire::encode_varint(value.len() as u64, out);
        out.extend_from_slice(value.as_bytes());
    }

    fn varint_field(tag: u32, value: u64, out: &mut Vec<u8>) {
        wire::encode_key(WireType::Varint, tag, out);
        wire::encode_varint(value, out);
    }

    fn message_field(tag: u32, body: &[u8], out: &mut Vec<u8>) {
        wire::encode_key(WireType::Len, tag, out);
        wire::encode_varint(body.len() as u64, out);
        out.extend_from_slice(body);
    }

    #[test]
    fn test_decode_file_with_message() {
        let mut options = Vec::new();
        varint_field(2, 0, &mut options);

        let mut field = Vec::new();
        string_field(1, "scores", &mut field);
        varint_field(3, 5, &mut field);
        varint_field(4, 3, &mut field);
        varint_field(5, 5, &mut field);
        message_field(8, &options, &mut field);
        // An unknown field in the middle is skipped.
        varint_field(99, 1, &mut field);
        varint_field(17, 1, &mut field);

        let mut message = Vec::new();
        string_field(1, "User", &mut message);
        message_field(2, &field, &mut message);

        let mut file = Vec::new();
        string_field(1, "user.proto", &mut file);
        string_field(2, "example", &mut file);
        message_field(4, &message, &mut file);
        string_field(12, "proto3", &mut file);

        let mut set = Vec::new();
        message_field(1, &file, &mut set);

        let fds = decode_file_descriptor_set(&set).unwrap();
        assert_eq!(fds.file.len(), 1);
        let file = &fds.file[0];
        assert_eq!(file.name.as_deref(), Some("user.proto"));
        assert_eq!(file.package.as_deref(), Some("example"));
        assert_eq!(file.syntax.as_deref(), Some("proto3"));

        let field = &file.message_type[0].field[0];
        assert_eq!(field.name.as_deref(), Some("scores"));
        assert_eq!(field.number, Some(5));
        assert_eq!(field.label, Some(3));
        assert_eq!(field.r#type, Some(5));
        assert_eq!(field.options, Some(FieldOptions { packed: Some(false) }));
        assert_eq!(field.proto3_optional, Some(true));
    }

    #[test]
    fn test_decode_empty_set() {
        assert_eq!(
            decode_file_descriptor_set(&[]).unwrap(),
            FileDescriptorSet::default()
        );
    }

    #[test]
    fn test_decode_truncated() {
        // Claims a 5 byte file but only 1 byte follows.
        let err = decode_file_descriptor_set(&[0x0A, 0x05, 0x0A]).unwrap_err();
        assert!(matches!(err, Error::Descriptor(DecodeError::TruncatedInput)));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let mut file = Vec::new();
        message_field(1, &[0xFF, 0xFE], &mut file);
        let mut set = Vec::new();
        message_field(1, &file, &mut set);
        let err = decode_file_descriptor_set(&set).unwrap_err();
        assert!(matches!(err, Error::Descriptor(DecodeError::InvalidUtf8)));
    }

    #[test]
    fn test_decode_wrong_wire_type() {
        // File name sent as a varint.
        let mut file = Vec::new();
        varint_field(1, 7, &mut file);
        let mut set = Vec::new();
        message_field(1, &file, &mut set);
        let err = decode_file_descriptor_set(&set).unwrap_err();
        assert!(matches!(
            err,
            Error::Descriptor(DecodeError::WireTypeMismatch { tag: 1, .. })
        ));
    }
}
