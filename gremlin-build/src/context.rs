//! Type registry and naming rules shared by every code generation pass.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;

use crate::codegen::find_recursive_fields;
use crate::codegen::RecursiveField;
use crate::config::Config;
use crate::schema::{EnumDefinition, MessageDefinition, ProtoFile, Schema};

/// Context shared across the generation of every file in a run.
pub struct GenerationContext<'a> {
    pub config: &'a Config,
    /// Registry of every message and enum, keyed by fully-qualified name.
    types: HashMap<String, TypeInfo>,
    /// Singular message fields that close a cycle and must be boxed.
    recursive: HashSet<RecursiveField>,
}

/// Where a message or enum lives in the generated code.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    /// Generated module of the declaring package.
    pub module: String,
    /// Modules of the enclosing messages, outermost first.
    pub nested: Vec<String>,
    /// Rust type name.
    pub name: String,
    pub kind: TypeKind,
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Message,
    Enum {
        /// Declared values in declaration order.
        values: Vec<(String, i32)>,
    },
}

/// The module a piece of generated code is emitted into: a package module
/// plus the nested message modules below it.
#[derive(Debug, Clone)]
pub struct Scope {
    pub module: String,
    pub nested: Vec<String>,
}

impl Scope {
    pub fn package(module: impl Into<String>) -> Self {
        Scope {
            module: module.into(),
            nested: Vec::new(),
        }
    }

    /// The scope of the module holding `message`'s nested types.
    pub fn enter(&self, message: &str) -> Self {
        let mut nested = self.nested.clone();
        nested.push(to_module_name(message));
        Scope {
            module: self.module.clone(),
            nested,
        }
    }
}

impl<'a> GenerationContext<'a> {
    pub fn new(config: &'a Config, schema: &Schema) -> Self {
        let mut types = HashMap::new();
        for file in &schema.files {
            let module = file_to_module(file);
            let prefix = file.type_prefix();
            for message in &file.messages {
                register_message(&mut types, &module, &[], &prefix, message);
            }
            for enumeration in &file.enums {
                register_enum(&mut types, &module, &[], &prefix, enumeration);
            }
        }

        GenerationContext {
            config,
            types,
            recursive: find_recursive_fields(schema),
        }
    }

    /// Looks up a message or enum by fully-qualified name.
    pub fn lookup(&self, fqn: &str) -> Option<&TypeInfo> {
        self.types.get(fqn)
    }

    /// Whether `field` of `message_fqn` has to be boxed.
    pub fn is_recursive(&self, message_fqn: &str, field: &str) -> bool {
        self.recursive.contains(&RecursiveField {
            message_fqn: message_fqn.to_string(),
            field_name: field.to_string(),
        })
    }

    /// The path to `info`'s type (plus `suffix`, e.g. `Reader`) as seen from `scope`.
    pub fn type_path(&self, info: &TypeInfo, scope: &Scope, suffix: &str) -> TokenStream {
        let mut segments = Vec::new();
        let ups = if info.module == scope.module {
            scope.nested.len()
        } else {
            scope.nested.len() + 1
        };
        for _ in 0..ups {
            segments.push(Ident::new("super", Span::call_site()));
        }
        if info.module != scope.module {
            segments.push(rust_ident(&info.module));
        }
        segments.extend(info.nested.iter().map(|module| rust_ident(module)));
        segments.push(rust_ident(&format!("{}{}", info.name, suffix)));
        quote!(#(#segments)::*)
    }
}

fn register_message(
    types: &mut HashMap<String, TypeInfo>,
    module: &str,
    nested: &[String],
    prefix: &str,
    message: &MessageDefinition,
) {
    let fqn = format!("{}{}", prefix, message.name);
    types.insert(
        fqn.clone(),
        TypeInfo {
            module: module.to_string(),
            nested: nested.to_vec(),
            name: to_type_name(&message.name),
            kind: TypeKind::Message,
        },
    );

    let mut inner = nested.to_vec();
    inner.push(to_module_name(&message.name));
    let inner_prefix = format!("{fqn}.");
    for child in &message.messages {
        register_message(types, module, &inner, &inner_prefix, child);
    }
    for enumeration in &message.enums {
        register_enum(types, module, &inner, &inner_prefix, enumeration);
    }
}

fn register_enum(
    types: &mut HashMap<String, TypeInfo>,
    module: &str,
    nested: &[String],
    prefix: &str,
    enumeration: &EnumDefinition,
) {
    types.insert(
        format!("{}{}", prefix, enumeration.name),
        TypeInfo {
            module: module.to_string(),
            nested: nested.to_vec(),
            name: to_type_name(&enumeration.name),
            kind: TypeKind::Enum {
                values: enumeration
                    .values
                    .iter()
                    .map(|value| (value.name.clone(), value.number))
                    .collect(),
            },
        },
    );
}

/// The generated module for a file: its package with `.` and `-` replaced by
/// `_`, or the file stem when there is no package.
pub fn file_to_module(file: &ProtoFile) -> String {
    match file.package.as_deref().filter(|p| !p.is_empty()) {
        Some(package) => package.replace(['.', '-'], "_"),
        None => {
            let stem = Path::new(&file.name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown");
            to_snake_case(stem)
        }
    }
}

/// Creates an identifier, escaping Rust keywords.
///
/// Keywords that cannot be raw identifiers get a trailing underscore instead.
pub fn rust_ident(name: &str) -> Ident {
    if matches!(name, "self" | "Self" | "super" | "crate") {
        Ident::new(&format!("{name}_"), Span::call_site())
    } else if is_rust_keyword(name) {
        Ident::new_raw(name, Span::call_site())
    } else {
        Ident::new(name, Span::call_site())
    }
}

/// Rust type name for a message or enum.
pub fn to_type_name(name: &str) -> String {
    to_pascal_case(name)
}

/// Module name holding a message's nested types.
pub fn to_module_name(message: &str) -> String {
    to_snake_case(message)
}

/// Rust field name for a proto field.
pub fn to_field_name(name: &str) -> String {
    to_snake_case(name)
}

/// Converts a name to PascalCase: split on `-`, `_`, `.` and spaces, then
/// capitalize the first letter of each segment. Letters after the first keep
/// their case, so `PhoneNumber` and `phone_number` both become `PhoneNumber`.
pub fn to_pascal_case(s: &str) -> String {
    s.split(['-', '_', '.', ' '])
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

/// Converts SCREAMING_SNAKE_CASE enum value names to PascalCase.
pub fn to_variant_name(s: &str) -> String {
    let lowered = if s.chars().any(|c| c.is_lowercase()) {
        s.to_string()
    } else {
        s.to_lowercase()
    };
    let name = to_pascal_case(&lowered);
    // Identifiers may not start with a digit.
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("V{name}")
    } else {
        name
    }
}

/// Convert a string to snake_case.
///
/// Handles consecutive uppercase letters correctly:
/// - "HTTPServer" -> "http_server"
/// - "myField" -> "my_field"
/// - "first-name" -> "first_name"
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '-' | '.' | ' ') {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
        } else if c.is_uppercase() {
            if i > 0 {
                let prev_lower = chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit();
                let prev_upper = chars[i - 1].is_uppercase();
                let next_lower = chars.get(i + 1).map(|c| c.is_lowercase()).unwrap_or(false);
                if (prev_lower || (prev_upper && next_lower)) && !result.ends_with('_') {
                    result.push('_');
                }
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Check if a string is a Rust keyword.
fn is_rust_keyword(s: &str) -> bool {
    matches!(
        s,
        "as" | "break"
            | "const"
            | "continue"
            | "crate"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "self"
            | "Self"
            | "static"
            | "struct"
            | "super"
            | "trait"
            | "true"
            | "type"
            | "unsafe"
            | "use"
            | "where"
            | "while"
            | "async"
            | "await"
            | "dyn"
            | "abstract"
            | "become"
            | "box"
            | "do"
            | "final"
            | "macro"
            | "override"
            | "priv"
            | "typeof"
            | "unsized"
            | "virtual"
            | "yield"
            | "try"
            | "gen"
    )
}
