//! Type descriptors that drive codec construction.
//!
//! A [`TypeDesc`] tells the engine what shape a type has and how to reach
//! its parts through `&dyn Any`. Component types are referenced through
//! [`DescFn`] so self-referential types describe finitely.

use std::any::{type_name, Any, TypeId};
use std::fmt;

use bipf_wire::{BipfError, Reader, Result, Writer};

/// Deferred reference to a component type's descriptor.
pub type DescFn = fn() -> TypeDesc;

/// A type the engine can build a codec for.
///
/// Usually derived with `#[derive(Reflect)]`. Implementations are provided
/// for the scalar, text, collection and pointer types of the standard library.
pub trait Reflect: Any + Send + Sync {
    fn describe() -> TypeDesc;
}

/// Identity and shape of one concrete type.
#[derive(Clone)]
pub struct TypeDesc {
    pub id: TypeId,
    pub name: &'static str,
    pub kind: Kind,
}

impl TypeDesc {
    pub fn new<T: Any>(kind: Kind) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind,
        }
    }

    pub fn of<T: Reflect>() -> Self {
        T::describe()
    }
}

impl fmt::Debug for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDesc")
            .field("name", &self.name)
            .field("kind", &self.kind.label())
            .finish()
    }
}

#[derive(Clone)]
pub enum Kind {
    Bool,
    Int(IntKind),
    Float(FloatKind),
    String,
    Bytes(BytesDesc),
    Seq(SeqDesc),
    Map(MapDesc),
    /// Nullable pointer: `None` encodes as null.
    Optional(OptionalDesc),
    /// Non-null pointer, encoded as its pointee.
    Boxed(BoxedDesc),
    Struct(StructDesc),
    /// The unconstrained [`bipf_wire::Value`] target.
    Dynamic,
    /// The [`crate::Interface`] holder of a type-erased value.
    Interface,
    /// The [`crate::AnyValue`] slot: a held value, or a generic [`bipf_wire::Value`].
    AnyValue,
    /// A type with its own encode and decode capability.
    Custom(CustomDesc),
    /// A type no codec exists for.
    Unsupported,
}

impl Kind {
    pub fn label(&self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Int(_) => "int",
            Kind::Float(_) => "float",
            Kind::String => "string",
            Kind::Bytes(_) => "bytes",
            Kind::Seq(_) => "seq",
            Kind::Map(_) => "map",
            Kind::Optional(_) => "optional",
            Kind::Boxed(_) => "boxed",
            Kind::Struct(_) => "struct",
            Kind::Dynamic => "dynamic",
            Kind::Interface => "interface",
            Kind::AnyValue => "any",
            Kind::Custom(_) => "custom",
            Kind::Unsupported => "unsupported",
        }
    }

    /// Targets whose concrete shape is only known at runtime.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Kind::Dynamic | Kind::Interface | Kind::AnyValue)
    }

    /// Kinds allowed as map keys.
    ///
    /// Dynamic kinds are also accepted by map codecs, which then check
    /// each key's runtime value against this list.
    pub fn is_key_kind(&self) -> bool {
        matches!(
            self,
            Kind::Bool | Kind::Int(_) | Kind::Float(_) | Kind::String | Kind::Custom(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntKind {
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatKind {
    F32,
    F64,
}

/// Byte-buffer accessors.
#[derive(Clone)]
pub struct BytesDesc {
    pub get: fn(&dyn Any) -> Result<&[u8]>,
    pub set: fn(&mut dyn Any, &[u8]) -> Result<()>,
}

#[derive(Clone)]
pub struct SeqDesc {
    pub elem: DescFn,
    pub shape: SeqShape,
    pub len: fn(&dyn Any) -> Result<usize>,
    pub get: fn(&dyn Any, usize) -> Result<&dyn Any>,
    pub get_mut: fn(&mut dyn Any, usize) -> Result<&mut dyn Any>,
}

#[derive(Clone)]
pub enum SeqShape {
    /// Grows one default element at a time while decoding.
    Growable {
        clear: fn(&mut dyn Any) -> Result<()>,
        push_default: fn(&mut dyn Any) -> Result<&mut dyn Any>,
    },
    /// Fixed number of slots.
    Fixed(usize),
}

/// Visitor handed each map entry during encoding.
pub type EntryVisitor<'v> = dyn FnMut(&dyn Any, &dyn Any) -> Result<()> + 'v;

#[derive(Clone)]
pub struct MapDesc {
    pub key: DescFn,
    pub value: DescFn,
    pub len: fn(&dyn Any) -> Result<usize>,
    pub for_each: fn(&dyn Any, &mut EntryVisitor<'_>) -> Result<()>,
    pub clear: fn(&mut dyn Any) -> Result<()>,
    pub new_key: fn() -> Box<dyn Any>,
    pub new_value: fn() -> Box<dyn Any>,
    pub insert: fn(&mut dyn Any, Box<dyn Any>, Box<dyn Any>) -> Result<()>,
}

#[derive(Clone)]
pub struct OptionalDesc {
    pub inner: DescFn,
    pub get: fn(&dyn Any) -> Result<Option<&dyn Any>>,
    pub get_or_insert_default: fn(&mut dyn Any) -> Result<&mut dyn Any>,
    pub clear: fn(&mut dyn Any) -> Result<()>,
}

#[derive(Clone)]
pub struct BoxedDesc {
    pub inner: DescFn,
    pub get: fn(&dyn Any) -> Result<&dyn Any>,
    pub get_mut: fn(&mut dyn Any) -> Result<&mut dyn Any>,
}

#[derive(Clone)]
pub struct StructDesc {
    pub fields: Vec<FieldDesc>,
}

/// One declared struct field and its annotations.
#[derive(Clone)]
pub struct FieldDesc {
    /// Declared field name.
    pub name: &'static str,
    pub rename: Option<&'static str>,
    pub skip: bool,
    pub omit_empty: bool,
    pub flatten: bool,
    pub ty: DescFn,
    pub get: fn(&dyn Any) -> Result<&dyn Any>,
    pub get_mut: fn(&mut dyn Any) -> Result<&mut dyn Any>,
}

impl FieldDesc {
    /// Serialized name: the rename if present, else the declared name.
    pub fn wire_name(&self) -> &'static str {
        self.rename.unwrap_or(self.name)
    }

    /// Explicitly annotated fields win name conflicts against plain ones.
    pub fn is_tagged(&self) -> bool {
        self.rename.is_some() || self.omit_empty
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Raw BIPF bytes through [`crate::Marshal`] and [`crate::Unmarshal`].
    Marshal,
    /// BUFFER-wrapped bytes through [`crate::BinaryMarshal`] and [`crate::BinaryUnmarshal`].
    Binary,
    /// STRING through `Display` and `FromStr`.
    Text,
}

#[derive(Clone)]
pub struct CustomDesc {
    pub capability: Capability,
    pub encode: fn(&dyn Any, &mut Writer) -> Result<()>,
    pub decode: fn(&mut dyn Any, &mut Reader<'_>) -> Result<()>,
}

pub fn downcast_ref<T: Any>(value: &dyn Any) -> Result<&T> {
    value.downcast_ref::<T>().ok_or(BipfError::WrongTarget {
        expected: type_name::<T>(),
    })
}

pub fn downcast_mut<T: Any>(value: &mut dyn Any) -> Result<&mut T> {
    value.downcast_mut::<T>().ok_or(BipfError::WrongTarget {
        expected: type_name::<T>(),
    })
}

/// Descriptor for a type with a custom capability.
pub fn custom<T: Any>(desc: CustomDesc) -> TypeDesc {
    TypeDesc::new::<T>(Kind::Custom(desc))
}

/// Descriptor for a type no codec can be built for.
pub fn unsupported<T: Any>() -> TypeDesc {
    TypeDesc::new::<T>(Kind::Unsupported)
}
