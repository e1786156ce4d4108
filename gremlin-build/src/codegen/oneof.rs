//! Oneof code generation.
//!
//! A oneof becomes a `Option<module::Name>` field on the owned struct, where
//! `Name` has one variant per member. Readers keep a slot per member (the
//! scan clears the others whenever one is recorded) plus a `which_*`
//! accessor returning a fieldless `NameCase`.

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use super::field::ResolvedField;
use crate::context::{rust_ident, to_field_name, to_type_name, GenerationContext, Scope};
use crate::schema::OneofDefinition;

pub struct Oneof<'f, 'a> {
    /// Owned struct field holding the active member.
    pub ident: Ident,
    pub which: Ident,
    /// Path of the value enum, as seen from the message's scope.
    enum_path: TokenStream,
    /// Path of the case enum, as seen from the message's scope.
    case_path: TokenStream,
    enum_name: Ident,
    case_name: Ident,
    pub members: Vec<&'f ResolvedField<'a>>,
}

impl<'f, 'a> Oneof<'f, 'a> {
    /// `module` is the message's nested module, the enums live there.
    pub fn new(definition: &OneofDefinition, module: &Ident, members: Vec<&'f ResolvedField<'a>>) -> Self {
        let snake = to_field_name(&definition.name);
        let type_name = to_type_name(&definition.name);
        let enum_name = rust_ident(&type_name);
        let case_name = format_ident!("{}Case", type_name);
        Oneof {
            ident: rust_ident(&snake),
            which: format_ident!("which_{}", snake),
            enum_path: quote!(#module::#enum_name),
            case_path: quote!(#module::#case_name),
            enum_name,
            case_name,
            members,
        }
    }

    fn variant(member: &ResolvedField<'_>) -> Ident {
        rust_ident(&to_type_name(&member.def.name))
    }

    /// The value and case enums, emitted into the message's module.
    pub fn enums(&self, ctx: &GenerationContext, inner: &Scope) -> TokenStream {
        let enum_name = &self.enum_name;
        let case_name = &self.case_name;
        let variants = self.members.iter().map(|member| {
            let variant = Self::variant(member);
            let ty = member.value_type(ctx, inner);
            quote!(#variant(#ty))
        });
        let cases = self.members.iter().map(|member| Self::variant(member));

        quote! {
            #[derive(Debug, Clone, PartialEq)]
            pub enum #enum_name {
                #(#variants,)*
            }

            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub enum #case_name {
                #(#cases,)*
            }
        }
    }

    pub fn struct_field(&self) -> TokenStream {
        let ident = &self.ident;
        let enum_path = &self.enum_path;
        quote!(pub #ident: ::core::option::Option<#enum_path>,)
    }

    pub fn size_statement(&self, ctx: &GenerationContext, scope: &Scope) -> TokenStream {
        let ident = &self.ident;
        let arms = self.encode_arms(ctx, scope, quote!(encoded_len()));
        quote! {
            if let ::core::option::Option::Some(oneof) = &self.#ident {
                len += match oneof {
                    #(#arms,)*
                };
            }
        }
    }

    pub fn write_statement(&self, ctx: &GenerationContext, scope: &Scope) -> TokenStream {
        let ident = &self.ident;
        let arms = self.encode_arms(ctx, scope, quote!(encode(buf)));
        quote! {
            if let ::core::option::Option::Some(oneof) = &self.#ident {
                match oneof {
                    #(#arms,)*
                }
            }
        }
    }

    fn encode_arms<'s>(
        &'s self,
        ctx: &'s GenerationContext,
        scope: &'s Scope,
        call: TokenStream,
    ) -> impl Iterator<Item = TokenStream> + 's {
        self.members.iter().map(move |member| {
            let enum_path = &self.enum_path;
            let variant = Self::variant(member);
            let encoder = member.oneof_encoder(ctx, scope);
            quote!(#enum_path::#variant(value) => #encoder.#call)
        })
    }

    /// `which_*` on the reader.
    pub fn which_accessor(&self) -> TokenStream {
        let which = &self.which;
        let case_path = &self.case_path;
        let checks = self.members.iter().map(|member| {
            let slot = &member.slot;
            let variant = Self::variant(member);
            quote! {
                if self.#slot.is_present() {
                    return ::core::option::Option::Some(#case_path::#variant);
                }
            }
        });
        quote! {
            /// Which member of the oneof was present, if any.
            pub fn #which(&self) -> ::core::option::Option<#case_path> {
                #(#checks)*
                ::core::option::Option::None
            }
        }
    }

    /// `field: value` for `materialize`.
    pub fn materialize(&self) -> TokenStream {
        let ident = &self.ident;
        let which = &self.which;
        let enum_path = &self.enum_path;
        let case_path = &self.case_path;
        let arms = self.members.iter().map(|member| {
            let variant = Self::variant(member);
            let value = member.owned_value();
            quote! {
                ::core::option::Option::Some(#case_path::#variant) => {
                    ::core::option::Option::Some(#enum_path::#variant(#value))
                }
            }
        });
        quote! {
            #ident: match self.#which() {
                #(#arms)*
                ::core::option::Option::None => ::core::option::Option::None,
            },
        }
    }
}
