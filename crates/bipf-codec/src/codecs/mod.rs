//! Codec implementations, one module per family of kinds.

pub(crate) mod custom;
pub(crate) mod dynamic;
pub(crate) mod map;
pub(crate) mod native;
pub(crate) mod optional;
pub(crate) mod seq;
pub(crate) mod structs;
