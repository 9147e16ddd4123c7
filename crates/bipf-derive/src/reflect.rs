use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{parse_quote, Data, DeriveInput, Field, Fields, Generics};

use crate::attrs::{parse_container, parse_field, ContainerCapability};

pub fn derive_reflect_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let container = parse_container(&input.attrs)?;
    let krate = match &container.krate {
        Some(path) => quote!(#path),
        None => quote!(::bipf_codec),
    };
    let generics = with_reflect_bounds(&input.generics, &krate);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    if let Some(capability) = container.capability {
        let desc = match capability {
            ContainerCapability::Marshal => quote!(#krate::capability::marshal_desc::<Self>()),
            ContainerCapability::Binary => quote!(#krate::capability::binary_desc::<Self>()),
            ContainerCapability::Text => quote!(#krate::capability::text_desc::<Self>()),
        };
        return Ok(quote! {
            impl #impl_generics #krate::Reflect for #name #ty_generics #where_clause {
                fn describe() -> #krate::TypeDesc {
                    #krate::reflect::custom::<Self>(#desc)
                }
            }
        });
    }

    let fields = struct_fields(input)?;

    let mut accessors = Vec::with_capacity(fields.len());
    let mut descs = Vec::with_capacity(fields.len());
    for field in &fields {
        let (accessor, desc) = field_tokens(field, &krate)?;
        accessors.push(accessor);
        descs.push(desc);
    }

    Ok(quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            #(#accessors)*
        }

        impl #impl_generics #krate::Reflect for #name #ty_generics #where_clause {
            fn describe() -> #krate::TypeDesc {
                #krate::TypeDesc::new::<Self>(#krate::Kind::Struct(
                    #krate::reflect::StructDesc {
                        fields: ::std::vec![#(#descs),*],
                    },
                ))
            }
        }
    })
}

fn struct_fields(input: &DeriveInput) -> syn::Result<Vec<&Field>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(fields.named.iter().collect()),
            Fields::Unit => Ok(Vec::new()),
            Fields::Unnamed(_) => Err(syn::Error::new_spanned(
                input,
                "Reflect derive only supports structs with named fields",
            )),
        },
        _ => Err(syn::Error::new_spanned(
            input,
            "Reflect derive only supports structs, or types with #[bipf(marshal | binary | text)]",
        )),
    }
}

/// Every type parameter must itself be reflectable.
fn with_reflect_bounds(generics: &Generics, krate: &TokenStream2) -> Generics {
    let mut generics = generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(#krate::Reflect));
    }
    generics
}

/// Accessor functions and the `FieldDesc` expression for one field.
fn field_tokens(field: &Field, krate: &TokenStream2) -> syn::Result<(TokenStream2, TokenStream2)> {
    let ident = field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new_spanned(field, "expected named field"))?;
    let attrs = parse_field(&field.attrs)?;
    let ty = &field.ty;

    let bare = ident.unraw();
    let declared = bare.to_string();
    let get = format_ident!("__bipf_get_{}", bare);
    let get_mut = format_ident!("__bipf_get_mut_{}", bare);

    let accessor = quote! {
        #[doc(hidden)]
        fn #get(
            value: &dyn ::core::any::Any,
        ) -> #krate::Result<&dyn ::core::any::Any> {
            let this = #krate::reflect::downcast_ref::<Self>(value)?;
            ::core::result::Result::Ok(&this.#ident as &dyn ::core::any::Any)
        }

        #[doc(hidden)]
        fn #get_mut(
            target: &mut dyn ::core::any::Any,
        ) -> #krate::Result<&mut dyn ::core::any::Any> {
            let this = #krate::reflect::downcast_mut::<Self>(target)?;
            ::core::result::Result::Ok(&mut this.#ident as &mut dyn ::core::any::Any)
        }
    };

    // Skipped fields never reach the engine, so their type need not be reflectable.
    let describe = if attrs.skip {
        quote!(#krate::reflect::unsupported::<()>)
    } else {
        quote!(<#ty as #krate::Reflect>::describe)
    };
    let rename = match &attrs.rename {
        Some(lit) => quote!(::core::option::Option::Some(#lit)),
        None => quote!(::core::option::Option::None),
    };
    let skip = attrs.skip;
    let omit_empty = attrs.omit_empty;
    let flatten = attrs.flatten;

    let desc = quote! {
        #krate::reflect::FieldDesc {
            name: #declared,
            rename: #rename,
            skip: #skip,
            omit_empty: #omit_empty,
            flatten: #flatten,
            ty: #describe,
            get: Self::#get,
            get_mut: Self::#get_mut,
        }
    };

    Ok((accessor, desc))
}
