//! Message code generation: the owned struct, its reader and their impls.

use proc_macro2::TokenStream;
use quote::quote;

use super::enumeration::generate_enum;
use super::field::ResolvedField;
use super::oneof::Oneof;
use super::strategy::{resolve_field, FieldSite};
use crate::context::{rust_ident, to_module_name, to_type_name, GenerationContext, Scope};
use crate::error::GenerationError;
use crate::schema::{MessageDefinition, ProtoFile};

/// Fields of the owned struct in declaration order. A oneof takes the
/// position of its first member.
enum Member<'f, 'a> {
    Field(&'f ResolvedField<'a>),
    Oneof(Oneof<'f, 'a>),
}

/// Generate the owned struct, reader and nested module for `message`.
///
/// `prefix` is the fully-qualified prefix of the message's name, ending in `.`.
pub fn generate_message(
    ctx: &GenerationContext,
    file: &ProtoFile,
    scope: &Scope,
    prefix: &str,
    message: &MessageDefinition,
) -> Result<TokenStream, GenerationError> {
    let message_fqn = format!("{}{}", prefix, message.name);
    let site = FieldSite {
        file,
        message_fqn: &message_fqn,
        message,
    };
    let fields = message
        .fields
        .iter()
        .map(|field| resolve_field(ctx, &site, field).map(|strategy| ResolvedField::new(field, strategy)))
        .collect::<Result<Vec<_>, _>>()?;

    let type_name = to_type_name(&message.name);
    let struct_name = rust_ident(&type_name);
    let reader_name = rust_ident(&format!("{type_name}Reader"));
    let module = rust_ident(&to_module_name(&message.name));
    let inner = scope.enter(&message.name);

    let mut members = Vec::new();
    let mut emitted_oneofs = Vec::new();
    for field in &fields {
        match field.oneof_index() {
            None => members.push(Member::Field(field)),
            Some(index) if !emitted_oneofs.contains(&index) => {
                emitted_oneofs.push(index);
                let group = fields.iter().filter(|f| f.oneof_index() == Some(index)).collect();
                members.push(Member::Oneof(Oneof::new(&message.oneofs[index], &module, group)));
            }
            Some(_) => {}
        }
    }

    // Owned struct and its two encoding passes.
    let mut struct_fields = Vec::new();
    let mut size = Vec::new();
    let mut write = Vec::new();
    let mut materialize = Vec::new();
    let mut oneof_enums = Vec::new();
    let mut which_accessors = Vec::new();
    for member in &members {
        match member {
            Member::Field(field) => {
                struct_fields.extend(field.struct_field(ctx, scope));
                if let Some(encoder) = field.encoder(ctx, scope) {
                    size.push(quote!(len += #encoder.encoded_len();));
                    write.push(quote!(#encoder.encode(buf);));
                }
                materialize.extend(field.materialize(ctx));
            }
            Member::Oneof(oneof) => {
                struct_fields.push(oneof.struct_field());
                size.push(oneof.size_statement(ctx, scope));
                write.push(oneof.write_statement(ctx, scope));
                materialize.push(oneof.materialize());
                oneof_enums.push(oneof.enums(ctx, &inner));
                which_accessors.push(oneof.which_accessor());
            }
        }
    }

    let (encoded_len_body, encode_body) = if members.is_empty() {
        (quote!(0), quote!(let _ = buf;))
    } else {
        (
            quote! {
                use ::gremlin::codec::field::FieldEncoder as _;
                let mut len = 0;
                #(#size)*
                len
            },
            quote! {
                use ::gremlin::codec::field::FieldEncoder as _;
                #(#write)*
            },
        )
    };

    // Reader.
    let slots = fields.iter().map(|field| field.reader_slot(ctx, scope));
    let accessors = fields.iter().map(|field| field.accessors(ctx, scope));
    let scan_arms = fields.iter().map(|field| {
        let tag = &field.tag;
        let action = field.scan_action();
        let clears: Vec<_> = match field.oneof_index() {
            Some(index) => fields
                .iter()
                .filter(|other| other.oneof_index() == Some(index) && other.def.tag != field.def.tag)
                .map(|other| {
                    let slot = &other.slot;
                    quote!(reader.#slot.clear();)
                })
                .collect(),
            None => Vec::new(),
        };
        if clears.is_empty() {
            quote!(#tag => #action,)
        } else {
            quote! {
                #tag => {
                    #action;
                    #(#clears)*
                }
            }
        }
    });
    let unmarshal_body = if fields.is_empty() {
        quote! {
            let mut scanner = ::gremlin::reader::Scanner::new(&buf)?;
            while scanner.next_field()?.is_some() {}
            ::core::result::Result::Ok(Self { buf })
        }
    } else {
        quote! {
            let mut reader = Self::default();
            let mut scanner = ::gremlin::reader::Scanner::new(&buf)?;
            while let ::core::option::Option::Some((tag, range)) = scanner.next_field()? {
                match tag {
                    #(#scan_arms)*
                    _ => {}
                }
            }
            reader.buf = buf;
            ::core::result::Result::Ok(reader)
        }
    };

    // Nested declarations.
    let mut nested = TokenStream::new();
    for enumeration in &message.enums {
        nested.extend(generate_enum(enumeration));
    }
    let nested_prefix = format!("{message_fqn}.");
    for child in &message.messages {
        nested.extend(generate_message(ctx, file, &inner, &nested_prefix, child)?);
    }
    nested.extend(oneof_enums);
    let nested_mod = if nested.is_empty() {
        quote!()
    } else {
        quote! {
            pub mod #module {
                #nested
            }
        }
    };

    let reader_doc = format!(" Lazy reader for [`{type_name}`].");

    Ok(quote! {
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct #struct_name {
            #(#struct_fields)*
        }

        #[doc = #reader_doc]
        #[derive(Debug, Default)]
        pub struct #reader_name {
            buf: ::gremlin::bytes::Bytes,
            #(#slots)*
        }

        impl ::gremlin::codec::Message for #struct_name {
            type Reader = #reader_name;

            fn encoded_len(&self) -> usize {
                #encoded_len_body
            }

            fn encode<B: ::gremlin::bytes::BufMut>(&self, buf: &mut B) {
                #encode_body
            }
        }

        impl #reader_name {
            /// Scans `buf`, recording where each known field lives.
            pub fn unmarshal(
                buf: impl ::core::convert::Into<::gremlin::bytes::Bytes>,
            ) -> ::core::result::Result<Self, ::gremlin::DecodeError> {
                <Self as ::gremlin::codec::MessageReader>::unmarshal(buf.into())
            }

            #(#accessors)*
            #(#which_accessors)*
        }

        impl ::gremlin::codec::MessageReader for #reader_name {
            type Owned = #struct_name;

            fn unmarshal(buf: ::gremlin::bytes::Bytes) -> ::core::result::Result<Self, ::gremlin::DecodeError> {
                #unmarshal_body
            }

            fn materialize(&self) -> ::core::result::Result<#struct_name, ::gremlin::DecodeError> {
                ::core::result::Result::Ok(#struct_name {
                    #(#materialize)*
                })
            }

            fn as_bytes(&self) -> &[u8] {
                &self.buf
            }
        }

        #nested_mod
    })
}
