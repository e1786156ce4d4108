use gremlin::wire::{encode_key, encode_varint, WireType};
use gremlin::{DecodeError, Message, MessageReader};
use gremlin_conformance::proto::common::Status;
use gremlin_conformance::proto::example::{User, UserReader};
use gremlin_conformance::strict::paint::{Color, Paint, PaintReader};

fn enum_field(tag: u32, value: i64, buf: &mut Vec<u8>) {
    encode_key(WireType::Varint, tag, buf);
    encode_varint(value as u64, buf);
}

#[test]
fn test_declared_values_pass() {
    let paint = Paint {
        color: Color::ColorGreen.into(),
        palette: vec![0, 1, 1],
        code: 12,
    };
    let reader = PaintReader::unmarshal(paint.marshal()).unwrap();
    assert_eq!(Color::from_i32(reader.get_color().unwrap()), Some(Color::ColorGreen));
    assert_eq!(reader.get_palette().unwrap(), [0, 1, 1]);
    assert_eq!(reader.materialize().unwrap(), paint);
}

#[test]
fn test_undeclared_value_is_rejected_on_access() {
    let mut buf = Vec::new();
    enum_field(1, 7, &mut buf);
    enum_field(3, 99, &mut buf);

    let reader = PaintReader::unmarshal(buf).unwrap();
    assert_eq!(reader.get_code().unwrap(), 99);
    assert_eq!(
        reader.get_color().unwrap_err(),
        DecodeError::UnknownEnumValue {
            enum_name: "paint.Color",
            value: 7,
        }
    );
    assert!(reader.materialize().is_err());
}

#[test]
fn test_undeclared_value_in_repeated_field() {
    let mut buf = Vec::new();
    enum_field(2, 1, &mut buf);
    enum_field(2, -4, &mut buf);

    let reader = PaintReader::unmarshal(buf).unwrap();
    assert_eq!(
        reader.get_palette().unwrap_err(),
        DecodeError::UnknownEnumValue {
            enum_name: "paint.Color",
            value: -4,
        }
    );
}

#[test]
fn test_lenient_build_passes_unknown_numbers_through() {
    let mut buf = Vec::new();
    enum_field(10, 42, &mut buf);

    let reader = UserReader::unmarshal(buf).unwrap();
    assert_eq!(reader.get_status().unwrap(), 42);
    assert_eq!(Status::from_i32(42), None);

    let user = reader.materialize().unwrap();
    assert_eq!(user.status, 42);
    let again = UserReader::unmarshal(user.marshal()).unwrap();
    assert_eq!(again.get_status().unwrap(), 42);
    assert_eq!(User::default().status, i32::from(Status::StatusUnknown));
}

#[test]
fn test_enum_names() {
    assert_eq!(Color::ColorRed.as_str_name(), "COLOR_RED");
    assert_eq!(Color::default(), Color::ColorRed);
    assert_eq!(Status::from_i32(2), Some(Status::StatusSuspended));
}
