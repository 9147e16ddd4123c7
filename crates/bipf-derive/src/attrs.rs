//! `#[bipf(...)]` attribute parsing.

use syn::{Attribute, LitStr, Path};

/// Container-level capability selected by `#[bipf(marshal | binary | text)]`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ContainerCapability {
    Marshal,
    Binary,
    Text,
}

#[derive(Default)]
pub struct ContainerAttrs {
    pub capability: Option<ContainerCapability>,
    /// Path to the codec crate when it is not reachable as `::bipf_codec`.
    pub krate: Option<Path>,
}

pub fn parse_container(attrs: &[Attribute]) -> syn::Result<ContainerAttrs> {
    let mut out = ContainerAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("bipf") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("crate") {
                let lit: LitStr = meta.value()?.parse()?;
                out.krate = Some(lit.parse()?);
                return Ok(());
            }
            let selected = if meta.path.is_ident("marshal") {
                ContainerCapability::Marshal
            } else if meta.path.is_ident("binary") {
                ContainerCapability::Binary
            } else if meta.path.is_ident("text") {
                ContainerCapability::Text
            } else {
                return Err(meta.error("expected `marshal`, `binary`, `text` or `crate`"));
            };
            if out.capability.replace(selected).is_some() {
                return Err(meta.error("only one capability may be selected"));
            }
            Ok(())
        })?;
    }
    Ok(out)
}

#[derive(Default)]
pub struct FieldAttrs {
    pub rename: Option<LitStr>,
    pub skip: bool,
    pub omit_empty: bool,
    pub flatten: bool,
}

pub fn parse_field(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("bipf") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                out.rename = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("skip") {
                out.skip = true;
            } else if meta.path.is_ident("omit_empty") {
                out.omit_empty = true;
            } else if meta.path.is_ident("flatten") {
                out.flatten = true;
            } else {
                return Err(meta.error("expected `rename`, `skip`, `omit_empty` or `flatten`"));
            }
            Ok(())
        })?;
    }
    Ok(out)
}
