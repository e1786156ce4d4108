//! Per-field templates, one per strategy.

use proc_macro2::{Ident, Literal, TokenStream};
use quote::{format_ident, quote};

use super::strategy::{Cardinality, DelimitedKind, EntryKind, FieldStrategy};
use crate::context::{rust_ident, to_field_name, GenerationContext, Scope};
use crate::schema::FieldDefinition;

/// A resolved field together with the identifiers generated for it.
pub struct ResolvedField<'a> {
    pub def: &'a FieldDefinition,
    pub strategy: FieldStrategy,
    /// Field of the owned struct.
    pub ident: Ident,
    /// Slot of the reader struct.
    pub slot: Ident,
    pub getter: Ident,
    pub has: Ident,
    pub tag: Literal,
}

impl<'a> ResolvedField<'a> {
    pub fn new(def: &'a FieldDefinition, strategy: FieldStrategy) -> Self {
        let snake = to_field_name(&def.name);
        ResolvedField {
            def,
            strategy,
            ident: rust_ident(&snake),
            slot: format_ident!("field_{}", snake),
            getter: format_ident!("get_{}", snake),
            has: format_ident!("has_{}", snake),
            tag: Literal::u32_unsuffixed(def.tag),
        }
    }

    pub fn oneof_index(&self) -> Option<usize> {
        match self.strategy.cardinality {
            Cardinality::Oneof { index } => Some(index),
            _ => None,
        }
    }

    fn codec(&self, ctx: &GenerationContext, scope: &Scope) -> TokenStream {
        self.strategy.kind.codec(ctx, scope, self.strategy.recursive)
    }

    /// Owned type of a single value, boxed when it closes a cycle.
    pub fn value_type(&self, ctx: &GenerationContext, scope: &Scope) -> TokenStream {
        let ty = self.strategy.kind.owned_type(ctx, scope);
        if self.strategy.recursive {
            quote!(::std::boxed::Box<#ty>)
        } else {
            ty
        }
    }

    /// The owned struct field. Oneof members are folded into their oneof.
    pub fn struct_field(&self, ctx: &GenerationContext, scope: &Scope) -> Option<TokenStream> {
        let ident = &self.ident;
        let ty = match &self.strategy.cardinality {
            Cardinality::Implicit | Cardinality::Required => self.value_type(ctx, scope),
            Cardinality::Explicit => {
                let ty = self.value_type(ctx, scope);
                quote!(::core::option::Option<#ty>)
            }
            Cardinality::Repeated { .. } => {
                let ty = self.strategy.kind.owned_type(ctx, scope);
                quote!(::std::vec::Vec<#ty>)
            }
            Cardinality::Map { key } => {
                let key = key.owned_type(ctx, scope);
                let value = self.strategy.kind.owned_type(ctx, scope);
                quote!(::std::collections::BTreeMap<#key, #value>)
            }
            Cardinality::Oneof { .. } => return None,
        };
        let doc = self.strategy.wire_doc(self.def.tag);
        Some(quote! {
            #[doc = #doc]
            pub #ident: #ty,
        })
    }

    /// The encoding strategy value shared by the size and write passes.
    pub fn encoder(&self, ctx: &GenerationContext, scope: &Scope) -> Option<TokenStream> {
        let ident = &self.ident;
        let tag = &self.tag;
        let codec = self.codec(ctx, scope);
        let encoder = match &self.strategy.cardinality {
            Cardinality::Implicit => {
                quote!(::gremlin::codec::field::Implicit::<#codec>::new(#tag, &self.#ident))
            }
            Cardinality::Explicit if self.strategy.recursive => {
                quote!(::gremlin::codec::field::Explicit::<#codec>::new(#tag, self.#ident.as_deref()))
            }
            Cardinality::Explicit => {
                quote!(::gremlin::codec::field::Explicit::<#codec>::new(#tag, self.#ident.as_ref()))
            }
            Cardinality::Required => quote! {
                ::gremlin::codec::field::Explicit::<#codec>::new(#tag, ::core::option::Option::Some(&self.#ident))
            },
            Cardinality::Repeated { packed } => {
                quote!(::gremlin::codec::field::Repeated::<#codec>::new(#tag, &self.#ident, #packed))
            }
            Cardinality::Map { key } => {
                let key = key.codec(ctx, scope, false);
                quote!(::gremlin::codec::field::MapField::<#key, #codec>::new(#tag, &self.#ident))
            }
            Cardinality::Oneof { .. } => return None,
        };
        Some(encoder)
    }

    /// Encoder for this field when it is the active member of its oneof and
    /// `value` is bound to the variant's payload.
    pub fn oneof_encoder(&self, ctx: &GenerationContext, scope: &Scope) -> TokenStream {
        let tag = &self.tag;
        let codec = self.codec(ctx, scope);
        let value = if self.strategy.recursive {
            quote!(&**value)
        } else {
            quote!(value)
        };
        quote!(::gremlin::codec::field::Explicit::<#codec>::new(#tag, ::core::option::Option::Some(#value)))
    }

    /// The reader slot.
    pub fn reader_slot(&self, ctx: &GenerationContext, scope: &Scope) -> TokenStream {
        let slot = &self.slot;
        let codec = self.codec(ctx, scope);
        let ty = match &self.strategy.cardinality {
            Cardinality::Repeated { .. } => quote!(::gremlin::reader::RepeatedSlot<#codec>),
            Cardinality::Map { key } => {
                let key = key.codec(ctx, scope, false);
                quote!(::gremlin::reader::MapSlot<#key, #codec>)
            }
            _ => quote!(::gremlin::reader::Slot<#codec>),
        };
        quote!(#slot: #ty,)
    }

    /// Records one occurrence found by the scan.
    pub fn scan_action(&self) -> TokenStream {
        let slot = &self.slot;
        match self.strategy.cardinality {
            Cardinality::Repeated { .. } | Cardinality::Map { .. } => quote!(reader.#slot.push(range)),
            _ => quote!(reader.#slot.record(range)),
        }
    }

    /// `get_*` and, for fields with presence, `has_*`.
    pub fn accessors(&self, ctx: &GenerationContext, scope: &Scope) -> TokenStream {
        let getter = &self.getter;
        let slot = &self.slot;
        let tag = &self.tag;
        let kind = &self.strategy.kind;

        let get = match &self.strategy.cardinality {
            Cardinality::Repeated { .. } => {
                let view = kind.view_type(ctx, scope);
                let body = match self.enum_check(ctx, scope) {
                    Some((path, name)) => quote! {
                        let values = self.#slot.get(&self.buf, #tag)?;
                        if let ::core::option::Option::Some(&value) =
                            values.iter().find(|value| #path::from_i32(**value).is_none())
                        {
                            return ::core::result::Result::Err(
                                ::gremlin::DecodeError::UnknownEnumValue { enum_name: #name, value },
                            );
                        }
                        ::core::result::Result::Ok(values)
                    },
                    None => quote!(self.#slot.get(&self.buf, #tag)),
                };
                quote! {
                    pub fn #getter(&self) -> ::core::result::Result<&[#view], ::gremlin::DecodeError> {
                        #body
                    }
                }
            }
            Cardinality::Map { key } => {
                let key = key.view_type(ctx, scope);
                let value = kind.view_type(ctx, scope);
                quote! {
                    pub fn #getter(
                        &self,
                    ) -> ::core::result::Result<&::std::collections::BTreeMap<#key, #value>, ::gremlin::DecodeError> {
                        self.#slot.get(&self.buf, #tag)
                    }
                }
            }
            _ => self.singular_getter(ctx, scope),
        };

        let has = match self.strategy.cardinality {
            Cardinality::Explicit | Cardinality::Required | Cardinality::Oneof { .. } => {
                let has = &self.has;
                quote! {
                    pub fn #has(&self) -> bool {
                        self.#slot.is_present()
                    }
                }
            }
            _ => quote!(),
        };

        quote! {
            #get
            #has
        }
    }

    fn singular_getter(&self, ctx: &GenerationContext, scope: &Scope) -> TokenStream {
        let getter = &self.getter;
        let slot = &self.slot;
        let tag = &self.tag;
        let default = &self.strategy.default;

        match &self.strategy.kind {
            EntryKind::Message { info } => {
                let reader = ctx.type_path(info, scope, "Reader");
                let body = if self.strategy.recursive {
                    quote!(self.#slot.get_or_default(&self.buf, #tag).map(|reader| &**reader))
                } else {
                    quote!(self.#slot.get_or_default(&self.buf, #tag))
                };
                quote! {
                    pub fn #getter(&self) -> ::core::result::Result<&#reader, ::gremlin::DecodeError> {
                        #body
                    }
                }
            }
            EntryKind::Delimited(DelimitedKind::String) => quote! {
                pub fn #getter(&self) -> ::core::result::Result<&str, ::gremlin::DecodeError> {
                    ::core::result::Result::Ok(
                        self.#slot
                            .get(&self.buf, #tag)?
                            .map(::gremlin::codec::ProtoString::as_str)
                            .unwrap_or(#default),
                    )
                }
            },
            EntryKind::Delimited(DelimitedKind::Bytes) => quote! {
                pub fn #getter(&self) -> ::core::result::Result<&[u8], ::gremlin::DecodeError> {
                    ::core::result::Result::Ok(
                        self.#slot
                            .get(&self.buf, #tag)?
                            .map(|bytes| &bytes[..])
                            .unwrap_or(#default),
                    )
                }
            },
            kind => {
                let ty = kind.owned_type(ctx, scope);
                let body = match self.enum_check(ctx, scope) {
                    Some((path, name)) => quote! {
                        let value = self.#slot.get(&self.buf, #tag)?.copied().unwrap_or(#default);
                        if #path::from_i32(value).is_none() {
                            return ::core::result::Result::Err(
                                ::gremlin::DecodeError::UnknownEnumValue { enum_name: #name, value },
                            );
                        }
                        ::core::result::Result::Ok(value)
                    },
                    None => quote! {
                        ::core::result::Result::Ok(self.#slot.get(&self.buf, #tag)?.copied().unwrap_or(#default))
                    },
                };
                quote! {
                    pub fn #getter(&self) -> ::core::result::Result<#ty, ::gremlin::DecodeError> {
                        #body
                    }
                }
            }
        }
    }

    /// For enum fields of a strict build, the enum's path and its proto name
    /// for [`gremlin::DecodeError::UnknownEnumValue`].
    fn enum_check(&self, ctx: &GenerationContext, scope: &Scope) -> Option<(TokenStream, Literal)> {
        if !ctx.config.strict_enums {
            return None;
        }
        let EntryKind::Enum { info, fqn } = &self.strategy.kind else {
            return None;
        };
        let path = ctx.type_path(info, scope, "");
        Some((path, Literal::string(fqn.trim_start_matches('.'))))
    }

    /// The owned value of the field, read through its getter.
    pub fn owned_value(&self) -> TokenStream {
        let getter = &self.getter;
        match &self.strategy.kind {
            EntryKind::Delimited(DelimitedKind::String) => quote!(self.#getter()?.to_owned()),
            EntryKind::Delimited(DelimitedKind::Bytes) => quote!(self.#getter()?.to_vec()),
            EntryKind::Message { .. } => {
                let value = quote!(::gremlin::codec::MessageReader::materialize(self.#getter()?)?);
                if self.strategy.recursive {
                    quote!(::std::boxed::Box::new(#value))
                } else {
                    value
                }
            }
            _ => quote!(self.#getter()?),
        }
    }

    /// `field: value` for `materialize`. Oneof members are folded into their oneof.
    pub fn materialize(&self, ctx: &GenerationContext) -> Option<TokenStream> {
        let ident = &self.ident;
        let slot = &self.slot;
        let tag = &self.tag;
        let value = match &self.strategy.cardinality {
            Cardinality::Implicit | Cardinality::Required => self.owned_value(),
            Cardinality::Explicit => {
                let has = &self.has;
                let value = self.owned_value();
                quote! {
                    if self.#has() {
                        ::core::option::Option::Some(#value)
                    } else {
                        ::core::option::Option::None
                    }
                }
            }
            Cardinality::Repeated { .. } if self.is_strict_enum(ctx) => {
                let getter = &self.getter;
                quote!(self.#getter()?.to_vec())
            }
            Cardinality::Repeated { .. } | Cardinality::Map { .. } => {
                quote!(self.#slot.materialize(&self.buf, #tag)?)
            }
            Cardinality::Oneof { .. } => return None,
        };
        Some(quote!(#ident: #value,))
    }

    fn is_strict_enum(&self, ctx: &GenerationContext) -> bool {
        ctx.config.strict_enums && matches!(self.strategy.kind, EntryKind::Enum { .. })
    }
}
