//! The resolved schema code is generated from.
//!
//! A [`Schema`] is a plain tree of files, messages, enums and fields. Type
//! references are fully-qualified protobuf names (`.package.Outer.Inner`).
//! It can be produced from a `protoc` descriptor set (see
//! [`crate::descriptor`]) or assembled directly in a build script:
//!
//! ```rust
//! use gremlin_build::schema::*;
//!
//! let schema = Schema::new().file(
//!     ProtoFile::new("user.proto")
//!         .package("example")
//!         .message(
//!             MessageDefinition::new("User")
//!                 .field(FieldDefinition::new("id", 1, ScalarType::Int64))
//!                 .field(FieldDefinition::new("name", 2, ScalarType::String))
//!                 .field(FieldDefinition::new("tags", 3, ScalarType::String).repeated()),
//!         ),
//! );
//! # assert_eq!(schema.files.len(), 1);
//! ```

/// A set of proto files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub files: Vec<ProtoFile>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, file: ProtoFile) -> Self {
        self.files.push(file);
        self
    }
}

/// Syntax level of a file. Decides the presence rules of singular scalars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Syntax {
    Proto2,
    #[default]
    Proto3,
}

/// One `.proto` file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProtoFile {
    /// Path of the file, relative to its include root.
    pub name: String,
    pub package: Option<String>,
    pub syntax: Syntax,
    /// Files this one imports.
    pub imports: Vec<String>,
    pub messages: Vec<MessageDefinition>,
    pub enums: Vec<EnumDefinition>,
}

impl ProtoFile {
    pub fn new(name: impl Into<String>) -> Self {
        ProtoFile {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn import(mut self, path: impl Into<String>) -> Self {
        self.imports.push(path.into());
        self
    }

    pub fn message(mut self, message: MessageDefinition) -> Self {
        self.messages.push(message);
        self
    }

    pub fn enumeration(mut self, enumeration: EnumDefinition) -> Self {
        self.enums.push(enumeration);
        self
    }

    /// The fully-qualified prefix of top-level types: `.package.` or `.`.
    pub fn type_prefix(&self) -> String {
        match self.package.as_deref().filter(|p| !p.is_empty()) {
            Some(package) => format!(".{package}."),
            None => String::from("."),
        }
    }
}

/// A message declaration. Field order is declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageDefinition {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
    pub oneofs: Vec<OneofDefinition>,
    /// Nested message declarations.
    pub messages: Vec<MessageDefinition>,
    /// Nested enum declarations.
    pub enums: Vec<EnumDefinition>,
}

impl MessageDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        MessageDefinition {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Declares a oneof. Fields join it with [`FieldDefinition::in_oneof`],
    /// using the order oneofs were declared in.
    pub fn oneof(mut self, name: impl Into<String>) -> Self {
        self.oneofs.push(OneofDefinition { name: name.into() });
        self
    }

    pub fn message(mut self, message: MessageDefinition) -> Self {
        self.messages.push(message);
        self
    }

    pub fn enumeration(mut self, enumeration: EnumDefinition) -> Self {
        self.enums.push(enumeration);
        self
    }
}

/// A group of mutually exclusive fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OneofDefinition {
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Label {
    #[default]
    Optional,
    Required,
    Repeated,
}

/// Scalar field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

impl ScalarType {
    /// Whether protobuf permits this kind as a map key.
    pub fn is_valid_map_key(self) -> bool {
        !matches!(self, ScalarType::Double | ScalarType::Float | ScalarType::Bytes)
    }
}

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Scalar(ScalarType),
    /// Fully-qualified enum name.
    Enum(String),
    /// Fully-qualified message name.
    Message(String),
    Map {
        key: ScalarType,
        value: Box<FieldType>,
    },
}

impl FieldType {
    pub fn message(name: impl Into<String>) -> Self {
        FieldType::Message(name.into())
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        FieldType::Enum(name.into())
    }

    pub fn map(key: ScalarType, value: impl Into<FieldType>) -> Self {
        FieldType::Map {
            key,
            value: Box::new(value.into()),
        }
    }
}

impl From<ScalarType> for FieldType {
    fn from(scalar: ScalarType) -> Self {
        FieldType::Scalar(scalar)
    }
}

/// A field declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: String,
    pub tag: u32,
    pub label: Label,
    pub ty: FieldType,
    /// Index into the owning message's `oneofs`.
    pub oneof: Option<usize>,
    /// Proto2 `[default = ...]`, in its source text form.
    pub default_value: Option<String>,
    /// Explicit `[packed = ...]`. `None` packs numeric repeated fields.
    pub packed: Option<bool>,
    /// A proto3 field declared with the `optional` keyword.
    pub proto3_optional: bool,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, tag: u32, ty: impl Into<FieldType>) -> Self {
        FieldDefinition {
            name: name.into(),
            tag,
            label: Label::Optional,
            ty: ty.into(),
            oneof: None,
            default_value: None,
            packed: None,
            proto3_optional: false,
        }
    }

    pub fn repeated(mut self) -> Self {
        self.label = Label::Repeated;
        self
    }

    pub fn required(mut self) -> Self {
        self.label = Label::Required;
        self
    }

    /// Explicit presence in a proto3 file.
    pub fn optional(mut self) -> Self {
        self.label = Label::Optional;
        self.proto3_optional = true;
        self
    }

    pub fn in_oneof(mut self, index: usize) -> Self {
        self.oneof = Some(index);
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn packed(mut self, packed: bool) -> Self {
        self.packed = Some(packed);
        self
    }
}

/// An enum declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumDefinition {
    pub name: String,
    pub values: Vec<EnumValue>,
}

impl EnumDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        EnumDefinition {
            name: name.into(),
            values: Vec::new(),
        }
    }

    pub fn value(mut self, name: impl Into<String>, number: i32) -> Self {
        self.values.push(EnumValue {
            name: name.into(),
            number,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
}
