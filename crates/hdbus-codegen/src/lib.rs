// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

/// `#[derive(DBusStruct)]` macro: binds a named-field struct to the D-Bus
/// struct type made of its fields, in declaration order.
///
/// Generates `DBusType`, `Append`, `Schematic` and `Aggregate`. Every field
/// type must itself have bindings, and the struct must implement `Default`
/// so the decoder has storage to fill.
///
/// Example:
/// ```ignore
/// use hdbus::DBusStruct;
///
/// #[derive(DBusStruct, Default)]
/// struct Point {
///     x: i32,
///     y: i32,
///     label: String,
/// }
/// // signature: (iis)
/// ```
#[proc_macro_derive(DBusStruct)]
pub fn derive_dbus_struct(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "DBusStruct does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(f) => &f.named,
            _ => return Err(syn::Error::new_spanned(input, "Only named fields are supported")),
        },
        _ => return Err(syn::Error::new_spanned(input, "Only structs are supported")),
    };

    if fields.is_empty() {
        return Err(syn::Error::new_spanned(input, "A D-Bus struct needs at least one field"));
    }

    let mut names = Vec::new();
    let mut types = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "Field must have a name"));
        };
        names.push(field_name.clone());
        types.push(field.ty.clone());
    }

    Ok(quote! {
        impl ::hdbus::DBusType for #name {
            fn signature() -> ::hdbus::Signature {
                ::hdbus::types::struct_signature(&[
                    #(<#types as ::hdbus::DBusType>::signature()),*
                ])
            }
        }

        impl ::hdbus::Append for #name {
            fn append(&self, builder: &mut ::hdbus::MessageBuilder<'_>) -> ::hdbus::BuildResult<()> {
                builder.begin_struct()?;
                #(::hdbus::Append::append(&self.#names, builder)?;)*
                builder.end_struct()?;
                Ok(())
            }
        }

        impl ::hdbus::Schematic for #name {
            fn slot(&mut self) -> ::hdbus::Slot<'_> {
                ::hdbus::Slot::Struct(
                    ::hdbus::Schema::new()
                        #(.field(&mut self.#names))*
                )
            }
        }

        impl ::hdbus::Aggregate for #name {
            fn member_keys() -> ::std::vec::Vec<::hdbus::TypeKey> {
                ::std::vec![#(::hdbus::TypeKey::of::<#types>()),*]
            }

            fn register_members(
                registry: &mut ::hdbus::TypeRegistry,
            ) -> ::std::result::Result<(), ::hdbus::RegistryError> {
                #(registry.register_dbus_type::<#types>()?;)*
                Ok(())
            }
        }
    })
}
