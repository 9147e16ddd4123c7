//! Derive macro for `bipf_codec::Reflect`.
//!
//! Generates a struct descriptor whose field accessors are plain associated
//! functions, so the engine reaches fields through `&dyn Any` without unsafe
//! code.
//!
//! # Attributes
//!
//! Field level:
//! - `#[bipf(rename = "name")]` serialize under `name`
//! - `#[bipf(skip)]` never encode or decode the field
//! - `#[bipf(omit_empty)]` leave the field out when it holds its empty value
//! - `#[bipf(flatten)]` promote the fields of a nested struct
//!
//! Container level, replacing the field-wise encoding:
//! - `#[bipf(marshal)]` through `Marshal` and `Unmarshal`
//! - `#[bipf(binary)]` through `BinaryMarshal` and `BinaryUnmarshal`
//! - `#[bipf(text)]` through `Display` and `FromStr`

use proc_macro::TokenStream;
use syn::parse_macro_input;

mod attrs;
mod reflect;

/// Derive `bipf_codec::Reflect` for a struct with named fields, a unit
/// struct, or any type carrying a container capability.
#[proc_macro_derive(Reflect, attributes(bipf))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as syn::DeriveInput);

    match reflect::derive_reflect_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
