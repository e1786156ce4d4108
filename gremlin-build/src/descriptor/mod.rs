//! Descriptor types for protobuf FileDescriptorSet.
//!
//! These types mirror the subset of google/protobuf/descriptor.proto needed to
//! build a [`Schema`](crate::schema::Schema), decoded with the `gremlin` wire
//! primitives rather than generated code.

mod convert;
mod decode;

pub use convert::into_schema;
pub use decode::decode_file_descriptor_set;

/// A collection of file descriptors.
/// Corresponds to google.protobuf.FileDescriptorSet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileDescriptorSet {
    pub file: Vec<FileDescriptorProto>, // field 1
}

/// Describes a complete .proto file.
/// Corresponds to google.protobuf.FileDescriptorProto.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileDescriptorProto {
    /// The file name, relative to root of source tree.
    pub name: Option<String>, // field 1
    pub package: Option<String>, // field 2
    /// Names of files imported by this file.
    pub dependency: Vec<String>, // field 3
    pub message_type: Vec<DescriptorProto>, // field 4
    pub enum_type: Vec<EnumDescriptorProto>, // field 5
    /// "proto2", "proto3", or absent for proto2.
    pub syntax: Option<String>, // field 12
}

/// Describes a message type.
/// Corresponds to google.protobuf.DescriptorProto.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorProto {
    pub name: Option<String>, // field 1
    pub field: Vec<FieldDescriptorProto>, // field 2
    pub nested_type: Vec<DescriptorProto>, // field 3
    pub enum_type: Vec<EnumDescriptorProto>, // field 4
    pub options: Option<MessageOptions>, // field 7
    pub oneof_decl: Vec<OneofDescriptorProto>, // field 8
}

impl DescriptorProto {
    /// Whether protoc synthesized this message for a `map<K, V>` field.
    pub fn is_map_entry(&self) -> bool {
        self.options
            .as_ref()
            .and_then(|options| options.map_entry)
            .unwrap_or(false)
    }
}

/// Describes a field within a message.
/// Corresponds to google.protobuf.FieldDescriptorProto.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldDescriptorProto {
    pub name: Option<String>, // field 1
    pub number: Option<i32>, // field 3
    pub label: Option<i32>, // field 4
    pub r#type: Option<i32>, // field 5
    /// For message and enum types, the fully-qualified type name.
    pub type_name: Option<String>, // field 6
    /// The default value in its text form.
    pub default_value: Option<String>, // field 7
    pub options: Option<FieldOptions>, // field 8
    /// If set, this field is part of a oneof.
    pub oneof_index: Option<i32>, // field 9
    pub json_name: Option<String>, // field 10
    /// If true, this is a proto3 optional field.
    pub proto3_optional: Option<bool>, // field 17
}

/// Describes an enum type.
/// Corresponds to google.protobuf.EnumDescriptorProto.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumDescriptorProto {
    pub name: Option<String>, // field 1
    pub value: Vec<EnumValueDescriptorProto>, // field 2
}

/// Corresponds to google.protobuf.EnumValueDescriptorProto.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumValueDescriptorProto {
    pub name: Option<String>, // field 1
    pub number: Option<i32>, // field 2
}

/// Corresponds to google.protobuf.OneofDescriptorProto.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OneofDescriptorProto {
    pub name: Option<String>, // field 1
}

/// Corresponds to google.protobuf.MessageOptions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageOptions {
    /// Set true if this message is a map entry type.
    pub map_entry: Option<bool>, // field 7
}

/// Corresponds to google.protobuf.FieldOptions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOptions {
    /// An explicit `[packed = ...]`.
    pub packed: Option<bool>, // field 2
}

/// Field type enumeration.
/// Corresponds to google.protobuf.FieldDescriptorProto.Type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Type {
    Double = 1,
    Float = 2,
    Int64 = 3,
    Uint64 = 4,
    Int32 = 5,
    Fixed64 = 6,
    Fixed32 = 7,
    Bool = 8,
    String = 9,
    Group = 10,
    Message = 11,
    Bytes = 12,
    Uint32 = 13,
    Enum = 14,
    Sfixed32 = 15,
    Sfixed64 = 16,
    Sint32 = 17,
    Sint64 = 18,
}

impl Type {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Double),
            2 => Some(Self::Float),
            3 => Some(Self::Int64),
            4 => Some(Self::Uint64),
            5 => Some(Self::Int32),
            6 => Some(Self::Fixed64),
            7 => Some(Self::Fixed32),
            8 => Some(Self::Bool),
            9 => Some(Self::String),
            10 => Some(Self::Group),
            11 => Some(Self::Message),
            12 => Some(Self::Bytes),
            13 => Some(Self::Uint32),
            14 => Some(Self::Enum),
            15 => Some(Self::Sfixed32),
            16 => Some(Self::Sfixed64),
            17 => Some(Self::Sint32),
            18 => Some(Self::Sint64),
            _ => None,
        }
    }
}

/// Field label enumeration.
/// Corresponds to google.protobuf.FieldDescriptorProto.Label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Label {
    Optional = 1,
    Required = 2,
    Repeated = 3,
}

impl Label {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Optional),
            2 => Some(Self::Required),
            3 => Some(Self::Repeated),
            _ => None,
        }
    }
}
