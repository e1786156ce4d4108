//! Conversion of a decoded FileDescriptorSet into a [`Schema`].

use std::collections::HashMap;

use super::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    FileDescriptorSet, Label as DescriptorLabel, Type,
};
use crate::schema::{
    EnumDefinition, FieldDefinition, FieldType, Label, MessageDefinition, OneofDefinition,
    ProtoFile, ScalarType, Schema, Syntax,
};
use crate::Error;

/// Key and value types of a synthesized map entry message.
type MapEntries = HashMap<String, (ScalarType, FieldType)>;

/// Converts a FileDescriptorSet into a [`Schema`].
///
/// Map entry messages become [`FieldType::Map`] fields, proto3 `optional`
/// fields lose their synthetic oneof, and group fields are rejected.
pub fn into_schema(fds: &FileDescriptorSet) -> Result<Schema, Error> {
    let mut map_entries = MapEntries::new();
    for file in &fds.file {
        let prefix = type_prefix(file);
        for message in &file.message_type {
            collect_map_entries(&prefix, message, &mut map_entries)?;
        }
    }

    let files = fds
        .file
        .iter()
        .map(|file| convert_file(file, &map_entries))
        .collect::<Result<_, _>>()?;
    Ok(Schema { files })
}

fn type_prefix(file: &FileDescriptorProto) -> String {
    match file.package.as_deref().filter(|p| !p.is_empty()) {
        Some(package) => format!(".{package}."),
        None => String::from("."),
    }
}

fn collect_map_entries(
    prefix: &str,
    message: &DescriptorProto,
    entries: &mut MapEntries,
) -> Result<(), Error> {
    let name = message.name.as_deref().ok_or(Error::MissingAttribute("message name"))?;
    let fqn = format!("{prefix}{name}");

    if message.is_map_entry() {
        let key = message.field.iter().find(|field| field.number == Some(1));
        let value = message.field.iter().find(|field| field.number == Some(2));
        let (Some(key), Some(value)) = (key, value) else {
            return Err(Error::MissingAttribute("map entry key or value"));
        };
        let key = match field_type(key)? {
            FieldType::Scalar(scalar) => scalar,
            // Only scalars are legal keys; let validation report the rest.
            _ => ScalarType::Bytes,
        };
        entries.insert(fqn.clone(), (key, field_type(value)?));
    }

    let nested_prefix = format!("{fqn}.");
    for nested in &message.nested_type {
        collect_map_entries(&nested_prefix, nested, entries)?;
    }
    Ok(())
}

fn convert_file(file: &FileDescriptorProto, map_entries: &MapEntries) -> Result<ProtoFile, Error> {
    let name = file.name.clone().ok_or(Error::MissingAttribute("file name"))?;
    let syntax = match file.syntax.as_deref() {
        Some("proto3") => Syntax::Proto3,
        _ => Syntax::Proto2,
    };

    let messages = file
        .message_type
        .iter()
        .map(|message| convert_message(message, map_entries))
        .collect::<Result<_, _>>()?;
    let enums = file
        .enum_type
        .iter()
        .map(convert_enum)
        .collect::<Result<_, _>>()?;

    Ok(ProtoFile {
        name,
        package: file.package.clone().filter(|p| !p.is_empty()),
        syntax,
        imports: file.dependency.clone(),
        messages,
        enums,
    })
}

fn convert_message(
    message: &DescriptorProto,
    map_entries: &MapEntries,
) -> Result<MessageDefinition, Error> {
    let name = message.name.clone().ok_or(Error::MissingAttribute("message name"))?;

    // protoc wraps each proto3 `optional` field in a oneof of its own. Those
    // are dropped and the remaining oneofs renumbered.
    let mut synthetic = vec![false; message.oneof_decl.len()];
    for field in &message.field {
        if field.proto3_optional == Some(true) {
            if let Some(index) = field.oneof_index.and_then(|i| usize::try_from(i).ok()) {
                if let Some(flag) = synthetic.get_mut(index) {
                    *flag = true;
                }
            }
        }
    }
    let mut remap = Vec::with_capacity(synthetic.len());
    let mut oneofs = Vec::new();
    for (oneof, is_synthetic) in message.oneof_decl.iter().zip(&synthetic) {
        if *is_synthetic {
            remap.push(None);
        } else {
            remap.push(Some(oneofs.len()));
            oneofs.push(OneofDefinition {
                name: oneof.name.clone().ok_or(Error::MissingAttribute("oneof name"))?,
            });
        }
    }

    let mut fields = Vec::with_capacity(message.field.len());
    for field in &message.field {
        fields.push(convert_field(field, &remap, map_entries)?);
    }

    let mut messages = Vec::new();
    for nested in message.nested_type.iter().filter(|m| !m.is_map_entry()) {
        messages.push(convert_message(nested, map_entries)?);
    }
    let enums = message
        .enum_type
        .iter()
        .map(convert_enum)
        .collect::<Result<_, _>>()?;

    Ok(MessageDefinition {
        name,
        fields,
        oneofs,
        messages,
        enums,
    })
}

fn convert_field(
    field: &FieldDescriptorProto,
    oneof_remap: &[Option<usize>],
    map_entries: &MapEntries,
) -> Result<FieldDefinition, Error> {
    let name = field.name.clone().ok_or(Error::MissingAttribute("field name"))?;
    let number = field.number.ok_or(Error::MissingAttribute("field number"))?;
    let label = match field.label {
        None => DescriptorLabel::Optional,
        Some(raw) => DescriptorLabel::from_i32(raw).ok_or(Error::InvalidLabel(raw))?,
    };

    let mut ty = field_type(field)?;
    let mut label = match label {
        DescriptorLabel::Optional => Label::Optional,
        DescriptorLabel::Required => Label::Required,
        DescriptorLabel::Repeated => Label::Repeated,
    };
    if let FieldType::Message(type_name) = &ty {
        if let Some((key, value)) = map_entries.get(type_name) {
            ty = FieldType::Map {
                key: *key,
                value: Box::new(value.clone()),
            };
            label = Label::Optional;
        }
    }
    let proto3_optional = field.proto3_optional == Some(true);
    let oneof = if proto3_optional {
        None
    } else {
        field
            .oneof_index
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| oneof_remap.get(i).copied().flatten())
    };

    Ok(FieldDefinition {
        name,
        // Negative numbers are reported as out of range by validation.
        tag: u32::try_from(number).unwrap_or(0),
        label,
        ty,
        oneof,
        default_value: field.default_value.clone(),
        packed: field.options.as_ref().and_then(|options| options.packed),
        proto3_optional,
    })
}

fn field_type(field: &FieldDescriptorProto) -> Result<FieldType, Error> {
    let raw = field.r#type.ok_or(Error::MissingAttribute("field type"))?;
    let ty = Type::from_i32(raw).ok_or(Error::InvalidFieldType(raw))?;
    let type_name = || {
        field
            .type_name
            .clone()
            .ok_or(Error::MissingAttribute("type name"))
    };

    let scalar = match ty {
        Type::Double => ScalarType::Double,
        Type::Float => ScalarType::Float,
        Type::Int64 => ScalarType::Int64,
        Type::Uint64 => ScalarType::Uint64,
        Type::Int32 => ScalarType::Int32,
        Type::Fixed64 => ScalarType::Fixed64,
        Type::Fixed32 => ScalarType::Fixed32,
        Type::Bool => ScalarType::Bool,
        Type::String => ScalarType::String,
        Type::Bytes => ScalarType::Bytes,
        Type::Uint32 => ScalarType::Uint32,
        Type::Sfixed32 => ScalarType::Sfixed32,
        Type::Sfixed64 => ScalarType::Sfixed64,
        Type::Sint32 => ScalarType::Sint32,
        Type::Sint64 => ScalarType::Sint64,
        Type::Message => return Ok(FieldType::Message(type_name()?)),
        Type::Enum => return Ok(FieldType::Enum(type_name()?)),
        Type::Group => {
            let name = field.name.clone().unwrap_or_default();
            return Err(Error::UnsupportedGroup(name));
        }
    };
    Ok(FieldType::Scalar(scalar))
}

fn convert_enum(enumeration: &EnumDescriptorProto) -> Result<EnumDefinition, Error> {
    let mut definition = EnumDefinition::new(
        enumeration
            .name
            .clone()
            .ok_or(Error::MissingAttribute("enum name"))?,
    );
    for value in &enumeration.value {
        definition = definition.value(
            value
                .name
                .clone()
                .ok_or(Error::MissingAttribute("enum value name"))?,
            value.number.ok_or(Error::MissingAttribute("enum value number"))?,
        );
    }
    Ok(definition)
}
