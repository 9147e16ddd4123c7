//! Per-type codec construction and the process-wide codec cache.
//!
//! A build starts from one [`TypeDesc`] and walks its components inside a
//! [`BuildContext`]. Each type gets a [`Placeholder`] before its components
//! are visited, so recursive types resolve to the placeholder instead of
//! recursing forever. Codecs and struct descriptors built in a context are
//! published to the global caches only when the whole build succeeds.
//!
//! The caches are append-only. Two threads building the same type race
//! harmlessly: the first insert wins and the loser uses the winner's codec.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use bipf_wire::{BipfError, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::codec::{Codec, Placeholder};
use crate::codecs::{custom, dynamic, map, native, optional, seq, structs};
use crate::descriptor::StructDescriptor;
use crate::interface::DynReflect;
use crate::reflect::{Kind, Reflect, TypeDesc};

static CODECS: LazyLock<DashMap<TypeId, Codec>> = LazyLock::new(DashMap::new);

static DESCRIPTORS: LazyLock<DashMap<TypeId, Arc<StructDescriptor>>> =
    LazyLock::new(DashMap::new);

/// Codec for `T`, built and cached on first use.
pub fn codec_of<T: Reflect>() -> Result<Codec> {
    if let Some(codec) = cached(TypeId::of::<T>()) {
        return Ok(codec);
    }
    build(&T::describe())
}

/// Codec for a runtime type descriptor.
pub fn codec_for(desc: &TypeDesc) -> Result<Codec> {
    if let Some(codec) = cached(desc.id) {
        return Ok(codec);
    }
    build(desc)
}

/// Codec for the concrete type behind a type-erased value.
pub fn codec_of_dyn(value: &dyn DynReflect) -> Result<Codec> {
    if let Some(codec) = cached(value.as_any().type_id()) {
        return Ok(codec);
    }
    build(&value.type_desc())
}

/// Resolved field list of a struct type.
pub fn descriptor_of<T: Reflect>() -> Result<Arc<StructDescriptor>> {
    let id = TypeId::of::<T>();
    if let Some(descriptor) = DESCRIPTORS.get(&id) {
        return Ok(descriptor.value().clone());
    }

    let desc = T::describe();
    if !matches!(desc.kind, Kind::Struct(_)) {
        return Err(BipfError::UnsupportedValueKind(desc.name));
    }
    codec_for(&desc)?;

    DESCRIPTORS
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or(BipfError::UnsupportedValueKind(desc.name))
}

fn cached(id: TypeId) -> Option<Codec> {
    let codec = CODECS.get(&id).map(|entry| entry.value().clone());
    if let Some(codec) = &codec {
        trace!(type_name = codec.type_name(), "codec cache hit");
    }
    codec
}

fn build(desc: &TypeDesc) -> Result<Codec> {
    let mut ctx = BuildContext::new();
    let codec = ctx.codec(desc)?;
    Ok(ctx.publish().remove(&desc.id).unwrap_or(codec))
}

/// Scratch state for one top-level codec build.
pub(crate) struct BuildContext {
    codecs: HashMap<TypeId, Codec>,
    descriptors: HashMap<TypeId, Arc<StructDescriptor>>,
}

impl BuildContext {
    fn new() -> Self {
        Self {
            codecs: HashMap::new(),
            descriptors: HashMap::new(),
        }
    }

    /// Codec for `desc`, from this context, the global cache, or a fresh build.
    pub(crate) fn codec(&mut self, desc: &TypeDesc) -> Result<Codec> {
        if let Some(codec) = self.codecs.get(&desc.id) {
            return Ok(codec.clone());
        }
        if let Some(codec) = cached(desc.id) {
            return Ok(codec);
        }

        let placeholder = Arc::new(Placeholder::new(desc.name));
        self.codecs
            .insert(desc.id, Codec::from_arc(desc.name, placeholder.clone()));

        let codec = self.create(desc)?;
        debug!(type_name = desc.name, kind = desc.kind.label(), "built codec");

        placeholder.fill(codec.clone());
        self.codecs.insert(desc.id, codec.clone());
        Ok(codec)
    }

    pub(crate) fn register_descriptor(&mut self, id: TypeId, descriptor: Arc<StructDescriptor>) {
        self.descriptors.insert(id, descriptor);
    }

    /// Custom capabilities first, then native scalars, then structural kinds.
    fn create(&mut self, desc: &TypeDesc) -> Result<Codec> {
        let name = desc.name;
        match &desc.kind {
            Kind::Custom(custom) => Ok(custom::build(name, custom)),
            Kind::Bool => Ok(native::bool_codec(name)),
            Kind::Int(kind) => Ok(native::int_codec(name, *kind)),
            Kind::Float(kind) => Ok(native::float_codec(name, *kind)),
            Kind::String => Ok(native::string_codec(name)),
            Kind::Bytes(bytes) => Ok(native::bytes_codec(name, bytes)),
            Kind::Dynamic => Ok(dynamic::value_codec(name)),
            Kind::Interface => Ok(dynamic::interface_codec(name)),
            Kind::AnyValue => Ok(dynamic::any_value_codec(name)),
            Kind::Struct(fields) => structs::build(self, desc, fields),
            Kind::Seq(seq) => seq::build(self, name, seq),
            Kind::Map(map) => map::build(self, name, map),
            Kind::Optional(opt) => optional::build(self, name, opt),
            Kind::Boxed(boxed) => optional::build_boxed(self, name, boxed),
            Kind::Unsupported => Err(BipfError::UnsupportedValueKind(name)),
        }
    }

    /// Move everything built here into the global caches.
    ///
    /// Returns the codec each type ended up with, which is the earlier
    /// entry when another thread published the same type first.
    fn publish(self) -> HashMap<TypeId, Codec> {
        for (id, descriptor) in self.descriptors {
            DESCRIPTORS.entry(id).or_insert(descriptor);
        }

        let mut published = HashMap::with_capacity(self.codecs.len());
        for (id, codec) in self.codecs {
            match CODECS.entry(id) {
                Entry::Occupied(existing) => {
                    trace!(type_name = codec.type_name(), "lost codec publish race");
                    published.insert(id, existing.get().clone());
                }
                Entry::Vacant(slot) => {
                    slot.insert(codec.clone());
                    published.insert(id, codec);
                }
            }
        }
        published
    }
}
