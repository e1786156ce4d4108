//! Enum code generation.

use std::collections::HashSet;

use proc_macro2::{Literal, TokenStream};
use quote::quote;

use crate::context::{rust_ident, to_type_name, to_variant_name};
use crate::schema::EnumDefinition;

/// Generate a Rust enum for a proto enum.
///
/// Fields hold the raw `i32` so undeclared numbers survive a round trip, the
/// enum converts to and from it. Aliases (values sharing a number) keep only
/// the first declared name.
pub fn generate_enum(enumeration: &EnumDefinition) -> TokenStream {
    let enum_name = rust_ident(&to_type_name(&enumeration.name));

    let mut seen = HashSet::new();
    let values: Vec<_> = enumeration
        .values
        .iter()
        .filter(|value| seen.insert(value.number))
        .map(|value| {
            let variant = rust_ident(&to_variant_name(&value.name));
            (variant, value)
        })
        .collect();

    let variants = values.iter().map(|(variant, value)| {
        let number = Literal::i32_unsuffixed(value.number);
        quote!(#variant = #number)
    });

    let from_i32_arms = values.iter().map(|(variant, value)| {
        let number = Literal::i32_unsuffixed(value.number);
        quote!(#number => ::core::option::Option::Some(Self::#variant))
    });

    let name_arms = values.iter().map(|(variant, value)| {
        let name = Literal::string(&value.name);
        quote!(Self::#variant => #name)
    });

    // Protobuf defaults an enum to its first declared value.
    let default_impl = values.first().map(|(variant, _)| {
        quote! {
            impl ::core::default::Default for #enum_name {
                fn default() -> Self {
                    Self::#variant
                }
            }
        }
    });

    // Zero-variant enums can neither carry a repr nor be cast.
    let (repr, into_i32) = if values.is_empty() {
        (quote!(), quote!(match value {}))
    } else {
        (quote!(#[repr(i32)]), quote!(value as i32))
    };

    quote! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #repr
        pub enum #enum_name {
            #(#variants),*
        }

        impl #enum_name {
            /// Convert from i32, returning None for unknown values.
            pub fn from_i32(value: i32) -> ::core::option::Option<Self> {
                match value {
                    #(#from_i32_arms,)*
                    _ => ::core::option::Option::None,
                }
            }

            /// The value's name as declared in the proto file.
            pub fn as_str_name(&self) -> &'static str {
                match *self {
                    #(#name_arms,)*
                }
            }
        }

        impl ::core::convert::From<#enum_name> for i32 {
            fn from(value: #enum_name) -> Self {
                #into_i32
            }
        }

        #default_impl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_keep_first_name() {
        let tokens = generate_enum(
            &EnumDefinition::new("Status")
                .value("STATUS_UNKNOWN", 0)
                .value("STATUS_ACTIVE", 1)
                .value("STATUS_RUNNING", 1),
        )
        .to_string();
        assert!(tokens.contains("StatusActive = 1"));
        assert!(!tokens.contains("StatusRunning"));
        assert!(tokens.contains("Self :: StatusUnknown"));
    }

    #[test]
    fn test_empty_enum_has_no_default() {
        let tokens = generate_enum(&EnumDefinition::new("Empty")).to_string();
        assert!(tokens.contains("pub enum Empty"));
        assert!(!tokens.contains("Default for"));
    }
}
