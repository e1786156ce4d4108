//! Code generation from a resolved schema.

mod enumeration;
mod field;
mod message;
mod module;
mod oneof;
mod recursion;
mod strategy;

pub use module::{render_modules, write_modules};
pub use recursion::{find_recursive_fields, RecursiveField};

use std::collections::BTreeMap;

use proc_macro2::TokenStream;

use crate::context::{file_to_module, GenerationContext, Scope};
use crate::error::{Error, GenerationError};
use crate::schema::{MessageDefinition, ProtoFile, Schema};
use strategy::{check_tags, resolve_field, FieldSite};

/// Generates the code of every module, keyed by module name.
///
/// The whole schema is validated first and every problem found is reported
/// at once through [`Error::Generation`].
pub fn generate(ctx: &GenerationContext, schema: &Schema) -> Result<BTreeMap<String, TokenStream>, Error> {
    let mut errors = Vec::new();
    for file in &schema.files {
        let prefix = file.type_prefix();
        for message in &file.messages {
            validate_message(ctx, file, &prefix, message, &mut errors);
        }
    }
    if !errors.is_empty() {
        tracing::warn!(errors = errors.len(), "schema failed validation");
        return Err(Error::Generation(errors));
    }

    let mut modules: BTreeMap<String, TokenStream> = BTreeMap::new();
    for file in &schema.files {
        let module = file_to_module(file);
        tracing::debug!(file = %file.name, module = %module, "generating file");
        let code = generate_file(ctx, file, &module)?;
        // Files sharing a package share a module.
        modules.entry(module).or_default().extend(code);
    }
    Ok(modules)
}

fn validate_message(
    ctx: &GenerationContext,
    file: &ProtoFile,
    prefix: &str,
    message: &MessageDefinition,
    errors: &mut Vec<GenerationError>,
) {
    let message_fqn = format!("{}{}", prefix, message.name);
    let site = FieldSite {
        file,
        message_fqn: &message_fqn,
        message,
    };
    check_tags(&site, errors);
    for field in &message.fields {
        if let Err(err) = resolve_field(ctx, &site, field) {
            errors.push(err);
        }
    }

    let nested_prefix = format!("{message_fqn}.");
    for nested in &message.messages {
        validate_message(ctx, file, &nested_prefix, nested, errors);
    }
}

/// Generate code for a single .proto file.
fn generate_file(ctx: &GenerationContext, file: &ProtoFile, module: &str) -> Result<TokenStream, Error> {
    let scope = Scope::package(module);
    let prefix = file.type_prefix();
    let mut tokens = TokenStream::new();

    for enumeration in &file.enums {
        tokens.extend(enumeration::generate_enum(enumeration));
    }
    for msg in &file.messages {
        tokens.extend(message::generate_message(ctx, file, &scope, &prefix, msg)?);
    }

    Ok(tokens)
}
