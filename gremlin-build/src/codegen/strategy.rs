//! Field strategy resolution.
//!
//! Every field is classified once into an [`EntryKind`] (how one value is
//! encoded) and a [`Cardinality`] (how many values and which presence rules).
//! The templates in `field.rs` switch on the pair; nothing downstream looks at
//! the schema field again except for its name and tag.

use gremlin::wire::{WireType, MAXIMUM_TAG_VAL, MINIMUM_TAG_VAL};
use proc_macro2::{Literal, TokenStream};
use quote::quote;

use crate::context::{GenerationContext, Scope, TypeInfo, TypeKind};
use crate::error::GenerationError;
use crate::schema::{FieldDefinition, FieldType, Label, MessageDefinition, ProtoFile, ScalarType, Syntax};

/// Field numbers protobuf keeps for its own implementation.
const RESERVED_TAGS: std::ops::RangeInclusive<u32> = 19_000..=19_999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarintKind {
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedKind {
    Fixed32,
    Sfixed32,
    Float,
    Fixed64,
    Sfixed64,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimitedKind {
    String,
    Bytes,
}

/// How a single value of a field is encoded.
#[derive(Debug, Clone)]
pub enum EntryKind {
    Varint(VarintKind),
    Fixed(FixedKind),
    Delimited(DelimitedKind),
    Enum { fqn: String, info: TypeInfo },
    Message { info: TypeInfo },
}

/// How many values a field holds and when it is written.
#[derive(Debug, Clone)]
pub enum Cardinality {
    /// Proto3 singular scalar: omitted when it holds the zero value.
    Implicit,
    /// `optional` scalars and all singular message fields.
    Explicit,
    /// Proto2 `required`: always written.
    Required,
    Repeated { packed: bool },
    /// A map field. The field's [`EntryKind`] is the value's.
    Map { key: EntryKind },
    /// Member of the oneof at `index` in the owning message.
    Oneof { index: usize },
}

/// Everything the templates need to know about one field.
#[derive(Debug, Clone)]
pub struct FieldStrategy {
    pub kind: EntryKind,
    pub cardinality: Cardinality,
    /// Wire type of each record the field is written as.
    pub wire_type: WireType,
    /// Value getters return when the field is absent. `None` for messages.
    pub default: Option<TokenStream>,
    /// Singular message field that closes a cycle and is boxed.
    pub recursive: bool,
}

impl FieldStrategy {
    /// Doc line for the generated struct field, describing its records.
    pub fn wire_doc(&self, tag: u32) -> String {
        let wire = match self.wire_type {
            WireType::Varint => "varint",
            WireType::I64 => "fixed64",
            WireType::Len => "length-delimited",
            WireType::I32 => "fixed32",
            WireType::SGroup | WireType::EGroup => "group",
        };
        match self.cardinality {
            Cardinality::Repeated { packed: true } => {
                format!(" Field {tag}, packed into one {wire} record.")
            }
            Cardinality::Repeated { .. } => format!(" Field {tag}, one {wire} record per element."),
            Cardinality::Map { .. } => format!(" Field {tag}, one {wire} record per entry."),
            _ => format!(" Field {tag}, one {wire} record."),
        }
    }
}

impl EntryKind {
    pub fn from_scalar(scalar: ScalarType) -> Self {
        match scalar {
            ScalarType::Int32 => EntryKind::Varint(VarintKind::Int32),
            ScalarType::Int64 => EntryKind::Varint(VarintKind::Int64),
            ScalarType::Uint32 => EntryKind::Varint(VarintKind::Uint32),
            ScalarType::Uint64 => EntryKind::Varint(VarintKind::Uint64),
            ScalarType::Sint32 => EntryKind::Varint(VarintKind::Sint32),
            ScalarType::Sint64 => EntryKind::Varint(VarintKind::Sint64),
            ScalarType::Bool => EntryKind::Varint(VarintKind::Bool),
            ScalarType::Fixed32 => EntryKind::Fixed(FixedKind::Fixed32),
            ScalarType::Sfixed32 => EntryKind::Fixed(FixedKind::Sfixed32),
            ScalarType::Float => EntryKind::Fixed(FixedKind::Float),
            ScalarType::Fixed64 => EntryKind::Fixed(FixedKind::Fixed64),
            ScalarType::Sfixed64 => EntryKind::Fixed(FixedKind::Sfixed64),
            ScalarType::Double => EntryKind::Fixed(FixedKind::Double),
            ScalarType::String => EntryKind::Delimited(DelimitedKind::String),
            ScalarType::Bytes => EntryKind::Delimited(DelimitedKind::Bytes),
        }
    }

    pub fn wire_type(&self) -> WireType {
        match self {
            EntryKind::Varint(_) | EntryKind::Enum { .. } => WireType::Varint,
            EntryKind::Fixed(FixedKind::Fixed32 | FixedKind::Sfixed32 | FixedKind::Float) => {
                WireType::I32
            }
            EntryKind::Fixed(_) => WireType::I64,
            EntryKind::Delimited(_) | EntryKind::Message { .. } => WireType::Len,
        }
    }

    /// Whether repeated values may share one length-delimited run.
    pub fn is_packable(&self) -> bool {
        matches!(
            self,
            EntryKind::Varint(_) | EntryKind::Fixed(_) | EntryKind::Enum { .. }
        )
    }

    /// Path of the runtime codec for this kind.
    pub fn codec(&self, ctx: &GenerationContext, scope: &Scope, boxed: bool) -> TokenStream {
        match self {
            EntryKind::Varint(kind) => match kind {
                VarintKind::Int32 => quote!(::gremlin::codec::Int32),
                VarintKind::Int64 => quote!(::gremlin::codec::Int64),
                VarintKind::Uint32 => quote!(::gremlin::codec::Uint32),
                VarintKind::Uint64 => quote!(::gremlin::codec::Uint64),
                VarintKind::Sint32 => quote!(::gremlin::codec::Sint32),
                VarintKind::Sint64 => quote!(::gremlin::codec::Sint64),
                VarintKind::Bool => quote!(::gremlin::codec::Bool),
            },
            EntryKind::Fixed(kind) => match kind {
                FixedKind::Fixed32 => quote!(::gremlin::codec::Fixed32),
                FixedKind::Sfixed32 => quote!(::gremlin::codec::Sfixed32),
                FixedKind::Float => quote!(::gremlin::codec::Float),
                FixedKind::Fixed64 => quote!(::gremlin::codec::Fixed64),
                FixedKind::Sfixed64 => quote!(::gremlin::codec::Sfixed64),
                FixedKind::Double => quote!(::gremlin::codec::Double),
            },
            EntryKind::Delimited(DelimitedKind::String) => quote!(::gremlin::codec::Str),
            EntryKind::Delimited(DelimitedKind::Bytes) => quote!(::gremlin::codec::RawBytes),
            EntryKind::Enum { .. } => quote!(::gremlin::codec::Enum),
            EntryKind::Message { info } => {
                let path = ctx.type_path(info, scope, "");
                if boxed {
                    quote!(::gremlin::codec::BoxedMsg<#path>)
                } else {
                    quote!(::gremlin::codec::Msg<#path>)
                }
            }
        }
    }

    /// Type of the value in the owned message.
    pub fn owned_type(&self, ctx: &GenerationContext, scope: &Scope) -> TokenStream {
        match self {
            EntryKind::Varint(kind) => match kind {
                VarintKind::Int32 | VarintKind::Sint32 => quote!(i32),
                VarintKind::Int64 | VarintKind::Sint64 => quote!(i64),
                VarintKind::Uint32 => quote!(u32),
                VarintKind::Uint64 => quote!(u64),
                VarintKind::Bool => quote!(bool),
            },
            EntryKind::Fixed(kind) => match kind {
                FixedKind::Fixed32 => quote!(u32),
                FixedKind::Sfixed32 => quote!(i32),
                FixedKind::Float => quote!(f32),
                FixedKind::Fixed64 => quote!(u64),
                FixedKind::Sfixed64 => quote!(i64),
                FixedKind::Double => quote!(f64),
            },
            EntryKind::Delimited(DelimitedKind::String) => quote!(::std::string::String),
            EntryKind::Delimited(DelimitedKind::Bytes) => quote!(::std::vec::Vec<u8>),
            EntryKind::Enum { .. } => quote!(i32),
            EntryKind::Message { info } => ctx.type_path(info, scope, ""),
        }
    }

    /// Type readers cache for one value, as exposed by repeated and map getters.
    pub fn view_type(&self, ctx: &GenerationContext, scope: &Scope) -> TokenStream {
        match self {
            EntryKind::Delimited(DelimitedKind::String) => quote!(::gremlin::codec::ProtoString),
            EntryKind::Delimited(DelimitedKind::Bytes) => quote!(::gremlin::bytes::Bytes),
            EntryKind::Message { info } => ctx.type_path(info, scope, "Reader"),
            _ => self.owned_type(ctx, scope),
        }
    }

    /// The zero value getters fall back to.
    fn zero_default(&self) -> Option<TokenStream> {
        match self {
            EntryKind::Varint(VarintKind::Bool) => Some(quote!(false)),
            EntryKind::Varint(_) => Some(quote!(0)),
            EntryKind::Fixed(FixedKind::Float | FixedKind::Double) => Some(quote!(0.0)),
            EntryKind::Fixed(_) => Some(quote!(0)),
            EntryKind::Delimited(DelimitedKind::String) => Some(quote!("")),
            EntryKind::Delimited(DelimitedKind::Bytes) => Some(quote!(&[])),
            // Absent enums read as the first declared value.
            EntryKind::Enum { info, .. } => {
                let first = enum_values(info).first().map(|(_, number)| *number).unwrap_or(0);
                Some(signed(i64::from(first)))
            }
            EntryKind::Message { .. } => None,
        }
    }

    /// Parses a proto2 `[default = ...]` for this kind.
    fn parse_default(&self, text: &str) -> Option<TokenStream> {
        match self {
            EntryKind::Varint(kind) => match kind {
                VarintKind::Int32 | VarintKind::Sint32 => text.parse::<i32>().ok().map(i64::from).map(signed),
                VarintKind::Int64 | VarintKind::Sint64 => text.parse::<i64>().ok().map(signed),
                VarintKind::Uint32 => text.parse::<u32>().ok().map(|v| unsigned(u64::from(v))),
                VarintKind::Uint64 => text.parse::<u64>().ok().map(unsigned),
                VarintKind::Bool => match text {
                    "true" => Some(quote!(true)),
                    "false" => Some(quote!(false)),
                    _ => None,
                },
            },
            EntryKind::Fixed(kind) => match kind {
                FixedKind::Fixed32 => text.parse::<u32>().ok().map(|v| unsigned(u64::from(v))),
                FixedKind::Sfixed32 => text.parse::<i32>().ok().map(i64::from).map(signed),
                FixedKind::Fixed64 => text.parse::<u64>().ok().map(unsigned),
                FixedKind::Sfixed64 => text.parse::<i64>().ok().map(signed),
                FixedKind::Float => float(text, quote!(f32)),
                FixedKind::Double => float(text, quote!(f64)),
            },
            EntryKind::Delimited(DelimitedKind::String) => {
                let literal = Literal::string(text);
                Some(quote!(#literal))
            }
            EntryKind::Delimited(DelimitedKind::Bytes) => {
                let literal = Literal::byte_string(&unescape_bytes(text)?);
                Some(quote!(&#literal[..]))
            }
            EntryKind::Enum { info, .. } => enum_values(info)
                .iter()
                .find(|(name, _)| name == text)
                .map(|(_, number)| signed(i64::from(*number))),
            EntryKind::Message { .. } => None,
        }
    }
}

fn enum_values(info: &TypeInfo) -> &[(String, i32)] {
    match &info.kind {
        TypeKind::Enum { values } => values,
        TypeKind::Message => &[],
    }
}

fn signed(value: i64) -> TokenStream {
    let magnitude = Literal::u64_unsuffixed(value.unsigned_abs());
    if value < 0 {
        quote!(-#magnitude)
    } else {
        quote!(#magnitude)
    }
}

fn unsigned(value: u64) -> TokenStream {
    let literal = Literal::u64_unsuffixed(value);
    quote!(#literal)
}

fn float(text: &str, ty: TokenStream) -> Option<TokenStream> {
    match text {
        "inf" => Some(quote!(#ty::INFINITY)),
        "-inf" => Some(quote!(#ty::NEG_INFINITY)),
        "nan" | "-nan" => Some(quote!(#ty::NAN)),
        _ => {
            let value = text.parse::<f64>().ok().filter(|v| v.is_finite())?;
            let magnitude = Literal::f64_unsuffixed(value.abs());
            if value.is_sign_negative() {
                Some(quote!(-#magnitude))
            } else {
                Some(quote!(#magnitude))
            }
        }
    }
}

/// Reverses the C-style escaping protoc applies to `bytes` defaults.
fn unescape_bytes(text: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    let mut bytes = text.bytes().peekable();
    while let Some(b) = bytes.next() {
        if b != b'\\' {
            out.push(b);
            continue;
        }
        let escaped = match bytes.next()? {
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'\\' => b'\\',
            b'\'' => b'\'',
            b'"' => b'"',
            b'x' => {
                let mut value = 0u8;
                let mut digits = 0;
                while digits < 2 {
                    let Some(digit) = bytes.peek().and_then(|d| (*d as char).to_digit(16)) else {
                        break;
                    };
                    value = value * 16 + digit as u8;
                    bytes.next();
                    digits += 1;
                }
                if digits == 0 {
                    return None;
                }
                value
            }
            first @ b'0'..=b'7' => {
                let mut value = u32::from(first - b'0');
                for _ in 0..2 {
                    match bytes.peek() {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            bytes.next();
                        }
                        _ => break,
                    }
                }
                u8::try_from(value).ok()?
            }
            _ => return None,
        };
        out.push(escaped);
    }
    Some(out)
}

/// Where a field is declared, for error reporting.
pub struct FieldSite<'a> {
    pub file: &'a ProtoFile,
    /// Fully-qualified name of the message.
    pub message_fqn: &'a str,
    pub message: &'a MessageDefinition,
}

impl FieldSite<'_> {
    fn message_name(&self) -> String {
        self.message_fqn.trim_start_matches('.').to_string()
    }
}

/// Classifies one field.
pub fn resolve_field(
    ctx: &GenerationContext,
    site: &FieldSite<'_>,
    field: &FieldDefinition,
) -> Result<FieldStrategy, GenerationError> {
    let unresolvable = |type_name: &str| GenerationError::UnresolvableType {
        file: site.file.name.clone(),
        message: site.message_name(),
        field: field.name.clone(),
        type_name: type_name.to_string(),
    };

    let (kind, map_key) = match &field.ty {
        FieldType::Map { key, value } => {
            if !key.is_valid_map_key() {
                return Err(GenerationError::InvalidMapKey {
                    file: site.file.name.clone(),
                    message: site.message_name(),
                    field: field.name.clone(),
                });
            }
            if matches!(**value, FieldType::Map { .. }) {
                return Err(unresolvable("map<_, map<_, _>>"));
            }
            (resolve_kind(ctx, value).map_err(|name| unresolvable(&name))?, Some(EntryKind::from_scalar(*key)))
        }
        other => (resolve_kind(ctx, other).map_err(|name| unresolvable(&name))?, None),
    };

    let is_message = matches!(kind, EntryKind::Message { .. });
    let cardinality = if let Some(key) = map_key {
        Cardinality::Map { key }
    } else if field.label == Label::Repeated {
        Cardinality::Repeated {
            packed: kind.is_packable() && field.packed != Some(false),
        }
    } else if let Some(index) = field.oneof.filter(|i| *i < site.message.oneofs.len()) {
        Cardinality::Oneof { index }
    } else if is_message {
        Cardinality::Explicit
    } else if field.label == Label::Required {
        Cardinality::Required
    } else if site.file.syntax == Syntax::Proto3 && !field.proto3_optional {
        Cardinality::Implicit
    } else {
        Cardinality::Explicit
    };

    if field.oneof.is_some() && !matches!(cardinality, Cardinality::Oneof { .. }) {
        tracing::warn!(
            message = %site.message_name(),
            field = %field.name,
            "field is not a valid oneof member, generating it as a plain field"
        );
    }

    let wire_type = match cardinality {
        Cardinality::Map { .. } | Cardinality::Repeated { packed: true } => WireType::Len,
        _ => kind.wire_type(),
    };

    let singular = matches!(
        cardinality,
        Cardinality::Implicit | Cardinality::Explicit | Cardinality::Required | Cardinality::Oneof { .. }
    );
    let default = match &field.default_value {
        Some(text) => {
            let parsed = if singular { kind.parse_default(text) } else { None };
            Some(parsed.ok_or_else(|| GenerationError::InvalidDefault {
                file: site.file.name.clone(),
                message: site.message_name(),
                field: field.name.clone(),
                value: text.clone(),
            })?)
        }
        None => kind.zero_default(),
    };

    let recursive = is_message && singular && ctx.is_recursive(site.message_fqn, &field.name);

    Ok(FieldStrategy {
        kind,
        cardinality,
        wire_type,
        default,
        recursive,
    })
}

/// Resolves a non-map type, returning the unresolvable name on failure.
fn resolve_kind(ctx: &GenerationContext, ty: &FieldType) -> Result<EntryKind, String> {
    match ty {
        FieldType::Scalar(scalar) => Ok(EntryKind::from_scalar(*scalar)),
        FieldType::Enum(fqn) => match ctx.lookup(fqn) {
            Some(info) if matches!(info.kind, TypeKind::Enum { .. }) => Ok(EntryKind::Enum {
                fqn: fqn.clone(),
                info: info.clone(),
            }),
            _ => Err(fqn.clone()),
        },
        FieldType::Message(fqn) => match ctx.lookup(fqn) {
            Some(info) if matches!(info.kind, TypeKind::Message) => Ok(EntryKind::Message { info: info.clone() }),
            _ => Err(fqn.clone()),
        },
        FieldType::Map { .. } => Err(String::from("map")),
    }
}

/// Checks the tags of a message's fields, pushing every problem to `errors`.
pub fn check_tags(site: &FieldSite<'_>, errors: &mut Vec<GenerationError>) {
    let mut seen: Vec<(u32, &str)> = Vec::with_capacity(site.message.fields.len());
    for field in &site.message.fields {
        if !(MINIMUM_TAG_VAL..=MAXIMUM_TAG_VAL).contains(&field.tag) || RESERVED_TAGS.contains(&field.tag) {
            errors.push(GenerationError::InvalidTag {
                file: site.file.name.clone(),
                message: site.message_name(),
                field: field.name.clone(),
                tag: field.tag,
            });
            continue;
        }
        if let Some((_, first)) = seen.iter().find(|(tag, _)| *tag == field.tag) {
            errors.push(GenerationError::TagCollision {
                file: site.file.name.clone(),
                message: site.message_name(),
                tag: field.tag,
                first: first.to_string(),
                second: field.name.clone(),
            });
            continue;
        }
        seen.push((field.tag, &field.name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::schema::{EnumDefinition, Schema};

    fn resolve(file: ProtoFile, field: &str) -> Result<FieldStrategy, GenerationError> {
        let config = Config::new();
        let schema = Schema::new().file(file);
        let ctx = GenerationContext::new(&config, &schema);
        let file = &schema.files[0];
        let message = &file.messages[0];
        let message_fqn = format!("{}{}", file.type_prefix(), message.name);
        let site = FieldSite {
            file,
            message_fqn: &message_fqn,
            message,
        };
        let field = message.fields.iter().find(|f| f.name == field).unwrap();
        resolve_field(&ctx, &site, field)
    }

    fn proto3(message: MessageDefinition) -> ProtoFile {
        ProtoFile::new("test.proto").package("test").message(message)
    }

    #[test]
    fn test_presence_rules() {
        let file = proto3(
            MessageDefinition::new("M")
                .field(FieldDefinition::new("id", 1, ScalarType::Int64))
                .field(FieldDefinition::new("nick", 2, ScalarType::String).optional())
                .field(FieldDefinition::new("child", 3, FieldType::message(".test.M"))),
        );
        assert!(matches!(resolve(file.clone(), "id").unwrap().cardinality, Cardinality::Implicit));
        assert!(matches!(resolve(file.clone(), "nick").unwrap().cardinality, Cardinality::Explicit));

        let child = resolve(file, "child").unwrap();
        assert!(matches!(child.cardinality, Cardinality::Explicit));
        assert!(child.recursive);
        assert!(child.default.is_none());

        let file = ProtoFile::new("legacy.proto").syntax(Syntax::Proto2).message(
            MessageDefinition::new("L")
                .field(FieldDefinition::new("a", 1, ScalarType::Int32))
                .field(FieldDefinition::new("b", 2, ScalarType::Int32).required()),
        );
        assert!(matches!(resolve(file.clone(), "a").unwrap().cardinality, Cardinality::Explicit));
        assert!(matches!(resolve(file, "b").unwrap().cardinality, Cardinality::Required));
    }

    #[test]
    fn test_packing_policy() {
        let file = proto3(
            MessageDefinition::new("M")
                .field(FieldDefinition::new("scores", 1, ScalarType::Sint32).repeated())
                .field(FieldDefinition::new("legacy", 2, ScalarType::Int32).repeated().packed(false))
                .field(FieldDefinition::new("tags", 3, ScalarType::String).repeated()),
        );
        let scores = resolve(file.clone(), "scores").unwrap();
        assert!(matches!(scores.cardinality, Cardinality::Repeated { packed: true }));
        assert_eq!(scores.wire_type, WireType::Len);

        let legacy = resolve(file.clone(), "legacy").unwrap();
        assert!(matches!(legacy.cardinality, Cardinality::Repeated { packed: false }));
        assert_eq!(legacy.wire_type, WireType::Varint);

        let tags = resolve(file, "tags").unwrap();
        assert!(matches!(tags.cardinality, Cardinality::Repeated { packed: false }));

        assert_eq!(scores.wire_doc(1), " Field 1, packed into one length-delimited record.");
        assert_eq!(legacy.wire_doc(2), " Field 2, one varint record per element.");
        assert_eq!(tags.wire_doc(3), " Field 3, one length-delimited record per element.");
    }

    #[test]
    fn test_defaults() {
        let file = ProtoFile::new("legacy.proto")
            .syntax(Syntax::Proto2)
            .enumeration(EnumDefinition::new("Level").value("LOW", 1).value("HIGH", 5))
            .message(
                MessageDefinition::new("M")
                    .field(FieldDefinition::new("retries", 1, ScalarType::Int32).default_value("-3"))
                    .field(FieldDefinition::new("ratio", 2, ScalarType::Double).default_value("inf"))
                    .field(FieldDefinition::new("level", 3, FieldType::enumeration(".Level")).default_value("HIGH"))
                    .field(FieldDefinition::new("plain", 4, FieldType::enumeration(".Level")))
                    .field(FieldDefinition::new("bad", 5, ScalarType::Uint32).default_value("-1")),
            );

        let retries = resolve(file.clone(), "retries").unwrap();
        assert_eq!(retries.default.unwrap().to_string(), quote!(-3).to_string());
        let ratio = resolve(file.clone(), "ratio").unwrap();
        assert_eq!(ratio.default.unwrap().to_string(), quote!(f64::INFINITY).to_string());
        let level = resolve(file.clone(), "level").unwrap();
        assert_eq!(level.default.unwrap().to_string(), quote!(5).to_string());
        let plain = resolve(file.clone(), "plain").unwrap();
        assert_eq!(plain.default.unwrap().to_string(), quote!(1).to_string());

        assert!(matches!(
            resolve(file, "bad").unwrap_err(),
            GenerationError::InvalidDefault { value, .. } if value == "-1"
        ));
    }

    #[test]
    fn test_unresolvable_and_map_key() {
        let file = proto3(
            MessageDefinition::new("M")
                .field(FieldDefinition::new("ghost", 1, FieldType::message(".test.Ghost")))
                .field(FieldDefinition::new("by_ratio", 2, FieldType::map(ScalarType::Double, ScalarType::Int32))),
        );
        assert!(matches!(
            resolve(file.clone(), "ghost").unwrap_err(),
            GenerationError::UnresolvableType { type_name, .. } if type_name == ".test.Ghost"
        ));
        assert!(matches!(
            resolve(file, "by_ratio").unwrap_err(),
            GenerationError::InvalidMapKey { .. }
        ));
    }

    #[test]
    fn test_check_tags() {
        let file = proto3(
            MessageDefinition::new("M")
                .field(FieldDefinition::new("a", 1, ScalarType::Int32))
                .field(FieldDefinition::new("b", 1, ScalarType::Int32))
                .field(FieldDefinition::new("c", 0, ScalarType::Int32))
                .field(FieldDefinition::new("d", 19_500, ScalarType::Int32)),
        );
        let message = &file.messages[0];
        let site = FieldSite {
            file: &file,
            message_fqn: ".test.M",
            message,
        };
        let mut errors = Vec::new();
        check_tags(&site, &mut errors);
        assert_eq!(errors.len(), 3);
        assert!(matches!(&errors[0], GenerationError::TagCollision { tag: 1, first, second, .. } if first == "a" && second == "b"));
        assert!(matches!(&errors[1], GenerationError::InvalidTag { tag: 0, .. }));
        assert!(matches!(&errors[2], GenerationError::InvalidTag { tag: 19_500, .. }));
    }

    #[test]
    fn test_unescape_bytes() {
        assert_eq!(unescape_bytes("ab").unwrap(), b"ab");
        assert_eq!(unescape_bytes(r"\n\x41\101\\").unwrap(), b"\nAA\\");
        assert!(unescape_bytes(r"\q").is_none());
        assert!(unescape_bytes(r"\777").is_none());
    }
}
