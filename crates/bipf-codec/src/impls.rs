//! [`Reflect`] for standard library and `bytes` types.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::{BuildHasher, Hash};

use bipf_wire::{BipfError, Result, Value};
use bytes::Bytes;

use crate::interface::{AnyValue, Interface};
use crate::reflect::{
    downcast_mut, downcast_ref, unsupported, BoxedDesc, BytesDesc, EntryVisitor, FloatKind,
    IntKind, Kind, MapDesc, OptionalDesc, Reflect, SeqDesc, SeqShape, TypeDesc,
};

macro_rules! reflect_scalar {
    ($($ty:ty => $kind:expr),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn describe() -> TypeDesc {
                    TypeDesc::new::<Self>($kind)
                }
            }
        )*
    };
}

reflect_scalar! {
    bool => Kind::Bool,
    i8 => Kind::Int(IntKind::I8),
    i16 => Kind::Int(IntKind::I16),
    i32 => Kind::Int(IntKind::I32),
    i64 => Kind::Int(IntKind::I64),
    isize => Kind::Int(IntKind::Isize),
    u8 => Kind::Int(IntKind::U8),
    u16 => Kind::Int(IntKind::U16),
    u32 => Kind::Int(IntKind::U32),
    u64 => Kind::Int(IntKind::U64),
    usize => Kind::Int(IntKind::Usize),
    f32 => Kind::Float(FloatKind::F32),
    f64 => Kind::Float(FloatKind::F64),
    String => Kind::String,
    Value => Kind::Dynamic,
    Interface => Kind::Interface,
    AnyValue => Kind::AnyValue,
}

impl Reflect for () {
    fn describe() -> TypeDesc {
        unsupported::<Self>()
    }
}

impl Reflect for char {
    fn describe() -> TypeDesc {
        unsupported::<Self>()
    }
}

// Byte buffers

/// A byte vector encoded as BUFFER.
///
/// `Vec<u8>` already encodes as BUFFER; this newtype makes the intent explicit
/// in field declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteBuf(pub Vec<u8>);

impl std::ops::Deref for ByteBuf {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for ByteBuf {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<u8>> for ByteBuf {
    fn from(value: Vec<u8>) -> Self {
        ByteBuf(value)
    }
}

fn vec_u8_get(value: &dyn Any) -> Result<&[u8]> {
    Ok(downcast_ref::<Vec<u8>>(value)?.as_slice())
}

fn vec_u8_set(target: &mut dyn Any, data: &[u8]) -> Result<()> {
    let vec = downcast_mut::<Vec<u8>>(target)?;
    vec.clear();
    vec.extend_from_slice(data);
    Ok(())
}

fn byte_buf_get(value: &dyn Any) -> Result<&[u8]> {
    Ok(downcast_ref::<ByteBuf>(value)?.0.as_slice())
}

fn byte_buf_set(target: &mut dyn Any, data: &[u8]) -> Result<()> {
    downcast_mut::<ByteBuf>(target)?.0 = data.to_vec();
    Ok(())
}

fn bytes_get(value: &dyn Any) -> Result<&[u8]> {
    Ok(&downcast_ref::<Bytes>(value)?[..])
}

fn bytes_set(target: &mut dyn Any, data: &[u8]) -> Result<()> {
    *downcast_mut::<Bytes>(target)? = Bytes::copy_from_slice(data);
    Ok(())
}

impl Reflect for ByteBuf {
    fn describe() -> TypeDesc {
        TypeDesc::new::<Self>(Kind::Bytes(BytesDesc {
            get: byte_buf_get,
            set: byte_buf_set,
        }))
    }
}

impl Reflect for Bytes {
    fn describe() -> TypeDesc {
        TypeDesc::new::<Self>(Kind::Bytes(BytesDesc {
            get: bytes_get,
            set: bytes_set,
        }))
    }
}

// Sequences

trait IndexedSeq: Any {
    type Elem: Reflect;

    fn seq_len(&self) -> usize;
    fn at(&self, index: usize) -> Option<&Self::Elem>;
    fn at_mut(&mut self, index: usize) -> Option<&mut Self::Elem>;
}

trait GrowableSeq: IndexedSeq {
    fn clear_all(&mut self);
    fn push_default(&mut self) -> &mut Self::Elem;
}

impl<T: Reflect + Default> IndexedSeq for Vec<T> {
    type Elem = T;

    fn seq_len(&self) -> usize {
        self.len()
    }

    fn at(&self, index: usize) -> Option<&T> {
        self.get(index)
    }

    fn at_mut(&mut self, index: usize) -> Option<&mut T> {
        self.get_mut(index)
    }
}

impl<T: Reflect + Default> GrowableSeq for Vec<T> {
    fn clear_all(&mut self) {
        self.clear();
    }

    fn push_default(&mut self) -> &mut T {
        self.push(T::default());
        let last = self.len() - 1;
        &mut self[last]
    }
}

impl<T: Reflect + Default> IndexedSeq for VecDeque<T> {
    type Elem = T;

    fn seq_len(&self) -> usize {
        self.len()
    }

    fn at(&self, index: usize) -> Option<&T> {
        self.get(index)
    }

    fn at_mut(&mut self, index: usize) -> Option<&mut T> {
        self.get_mut(index)
    }
}

impl<T: Reflect + Default> GrowableSeq for VecDeque<T> {
    fn clear_all(&mut self) {
        self.clear();
    }

    fn push_default(&mut self) -> &mut T {
        self.push_back(T::default());
        let last = self.len() - 1;
        &mut self[last]
    }
}

impl<T: Reflect, const N: usize> IndexedSeq for [T; N] {
    type Elem = T;

    fn seq_len(&self) -> usize {
        N
    }

    fn at(&self, index: usize) -> Option<&T> {
        self.get(index)
    }

    fn at_mut(&mut self, index: usize) -> Option<&mut T> {
        self.get_mut(index)
    }
}

fn seq_len<S: IndexedSeq>(value: &dyn Any) -> Result<usize> {
    Ok(downcast_ref::<S>(value)?.seq_len())
}

fn seq_get<S: IndexedSeq>(value: &dyn Any, index: usize) -> Result<&dyn Any> {
    let seq = downcast_ref::<S>(value)?;
    match seq.at(index) {
        Some(elem) => Ok(elem as &dyn Any),
        None => Err(BipfError::TooShort {
            capacity: seq.seq_len(),
        }),
    }
}

fn seq_get_mut<S: IndexedSeq>(target: &mut dyn Any, index: usize) -> Result<&mut dyn Any> {
    let seq = downcast_mut::<S>(target)?;
    let capacity = seq.seq_len();
    match seq.at_mut(index) {
        Some(elem) => Ok(elem as &mut dyn Any),
        None => Err(BipfError::TooShort { capacity }),
    }
}

fn seq_clear<S: GrowableSeq>(target: &mut dyn Any) -> Result<()> {
    downcast_mut::<S>(target)?.clear_all();
    Ok(())
}

fn seq_push_default<S: GrowableSeq>(target: &mut dyn Any) -> Result<&mut dyn Any> {
    Ok(downcast_mut::<S>(target)?.push_default() as &mut dyn Any)
}

fn growable<S: GrowableSeq>() -> Kind {
    Kind::Seq(SeqDesc {
        elem: <S::Elem as Reflect>::describe,
        shape: SeqShape::Growable {
            clear: seq_clear::<S>,
            push_default: seq_push_default::<S>,
        },
        len: seq_len::<S>,
        get: seq_get::<S>,
        get_mut: seq_get_mut::<S>,
    })
}

impl<T: Reflect + Default> Reflect for Vec<T> {
    fn describe() -> TypeDesc {
        if TypeId::of::<T>() == TypeId::of::<u8>() {
            return TypeDesc::new::<Self>(Kind::Bytes(BytesDesc {
                get: vec_u8_get,
                set: vec_u8_set,
            }));
        }
        TypeDesc::new::<Self>(growable::<Self>())
    }
}

impl<T: Reflect + Default> Reflect for VecDeque<T> {
    fn describe() -> TypeDesc {
        TypeDesc::new::<Self>(growable::<Self>())
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn describe() -> TypeDesc {
        TypeDesc::new::<Self>(Kind::Seq(SeqDesc {
            elem: T::describe,
            shape: SeqShape::Fixed(N),
            len: seq_len::<Self>,
            get: seq_get::<Self>,
            get_mut: seq_get_mut::<Self>,
        }))
    }
}

// Maps

trait MapLike: Any {
    type Key: Reflect + Default;
    type Value: Reflect + Default;

    fn entry_count(&self) -> usize;
    fn visit(&self, visitor: &mut EntryVisitor<'_>) -> Result<()>;
    fn clear_all(&mut self);
    fn put(&mut self, key: Self::Key, value: Self::Value);
}

impl<K, V, S> MapLike for HashMap<K, V, S>
where
    K: Reflect + Default + Eq + Hash,
    V: Reflect + Default,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    type Key = K;
    type Value = V;

    fn entry_count(&self) -> usize {
        self.len()
    }

    fn visit(&self, visitor: &mut EntryVisitor<'_>) -> Result<()> {
        self.iter()
            .try_for_each(|(k, v)| visitor(k as &dyn Any, v as &dyn Any))
    }

    fn clear_all(&mut self) {
        self.clear();
    }

    fn put(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

impl<K, V> MapLike for BTreeMap<K, V>
where
    K: Reflect + Default + Ord,
    V: Reflect + Default,
{
    type Key = K;
    type Value = V;

    fn entry_count(&self) -> usize {
        self.len()
    }

    fn visit(&self, visitor: &mut EntryVisitor<'_>) -> Result<()> {
        self.iter()
            .try_for_each(|(k, v)| visitor(k as &dyn Any, v as &dyn Any))
    }

    fn clear_all(&mut self) {
        self.clear();
    }

    fn put(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

fn map_len<M: MapLike>(value: &dyn Any) -> Result<usize> {
    Ok(downcast_ref::<M>(value)?.entry_count())
}

fn map_for_each<M: MapLike>(value: &dyn Any, visitor: &mut EntryVisitor<'_>) -> Result<()> {
    downcast_ref::<M>(value)?.visit(visitor)
}

fn map_clear<M: MapLike>(target: &mut dyn Any) -> Result<()> {
    downcast_mut::<M>(target)?.clear_all();
    Ok(())
}

fn new_default<T: Default + Any>() -> Box<dyn Any> {
    Box::new(T::default())
}

fn map_insert<M: MapLike>(
    target: &mut dyn Any,
    key: Box<dyn Any>,
    value: Box<dyn Any>,
) -> Result<()> {
    let key = unbox::<M::Key>(key)?;
    let value = unbox::<M::Value>(value)?;
    downcast_mut::<M>(target)?.put(key, value);
    Ok(())
}

fn unbox<T: Any>(boxed: Box<dyn Any>) -> Result<T> {
    boxed
        .downcast::<T>()
        .map(|b| *b)
        .map_err(|_| BipfError::WrongTarget {
            expected: std::any::type_name::<T>(),
        })
}

fn map_kind<M: MapLike>() -> Kind {
    Kind::Map(MapDesc {
        key: <M::Key as Reflect>::describe,
        value: <M::Value as Reflect>::describe,
        len: map_len::<M>,
        for_each: map_for_each::<M>,
        clear: map_clear::<M>,
        new_key: new_default::<M::Key>,
        new_value: new_default::<M::Value>,
        insert: map_insert::<M>,
    })
}

impl<K, V, S> Reflect for HashMap<K, V, S>
where
    K: Reflect + Default + Eq + Hash,
    V: Reflect + Default,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    fn describe() -> TypeDesc {
        TypeDesc::new::<Self>(map_kind::<Self>())
    }
}

impl<K, V> Reflect for BTreeMap<K, V>
where
    K: Reflect + Default + Ord,
    V: Reflect + Default,
{
    fn describe() -> TypeDesc {
        TypeDesc::new::<Self>(map_kind::<Self>())
    }
}

// Pointers

fn option_get<T: Reflect>(value: &dyn Any) -> Result<Option<&dyn Any>> {
    Ok(downcast_ref::<Option<T>>(value)?
        .as_ref()
        .map(|inner| inner as &dyn Any))
}

fn option_get_or_default<T: Reflect + Default>(target: &mut dyn Any) -> Result<&mut dyn Any> {
    Ok(downcast_mut::<Option<T>>(target)?.get_or_insert_with(T::default) as &mut dyn Any)
}

fn option_clear<T: Reflect>(target: &mut dyn Any) -> Result<()> {
    *downcast_mut::<Option<T>>(target)? = None;
    Ok(())
}

impl<T: Reflect + Default> Reflect for Option<T> {
    fn describe() -> TypeDesc {
        TypeDesc::new::<Self>(Kind::Optional(OptionalDesc {
            inner: T::describe,
            get: option_get::<T>,
            get_or_insert_default: option_get_or_default::<T>,
            clear: option_clear::<T>,
        }))
    }
}

fn box_get<T: Reflect>(value: &dyn Any) -> Result<&dyn Any> {
    let boxed = downcast_ref::<Box<T>>(value)?;
    Ok(&**boxed as &dyn Any)
}

fn box_get_mut<T: Reflect>(target: &mut dyn Any) -> Result<&mut dyn Any> {
    let boxed = downcast_mut::<Box<T>>(target)?;
    Ok(&mut **boxed as &mut dyn Any)
}

impl<T: Reflect> Reflect for Box<T> {
    fn describe() -> TypeDesc {
        TypeDesc::new::<Self>(Kind::Boxed(BoxedDesc {
            inner: T::describe,
            get: box_get::<T>,
            get_mut: box_get_mut::<T>,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_vectors_are_buffers() {
        assert!(matches!(<Vec<u8>>::describe().kind, Kind::Bytes(_)));
        assert!(matches!(<Vec<i8>>::describe().kind, Kind::Seq(_)));
        assert!(matches!(<[u8; 4]>::describe().kind, Kind::Seq(_)));
    }

    #[test]
    fn seq_accessors() {
        let Kind::Seq(desc) = <Vec<i32>>::describe().kind else {
            panic!("expected seq");
        };
        let SeqShape::Growable { push_default, .. } = desc.shape else {
            panic!("expected growable");
        };

        let mut v: Vec<i32> = vec![1, 2];
        assert_eq!((desc.len)(&v).unwrap(), 2);
        let second = (desc.get)(&v, 1).unwrap();
        assert_eq!(second.downcast_ref::<i32>(), Some(&2));

        *push_default(&mut v).unwrap().downcast_mut::<i32>().unwrap() = 7;
        assert_eq!(v, vec![1, 2, 7]);
        assert!((desc.get)(&v, 3).is_err());
    }

    #[test]
    fn wrong_target_is_reported() {
        let Kind::Optional(desc) = <Option<String>>::describe().kind else {
            panic!("expected optional");
        };
        let err = (desc.get)(&5u8).unwrap_err();
        assert!(matches!(err, BipfError::WrongTarget { .. }));
    }

    #[test]
    fn map_accessors() {
        let Kind::Map(desc) = <BTreeMap<String, i32>>::describe().kind else {
            panic!("expected map");
        };
        let mut map: BTreeMap<String, i32> = BTreeMap::new();
        let mut key = (desc.new_key)();
        *key.downcast_mut::<String>().unwrap() = "a".to_string();
        (desc.insert)(&mut map, key, Box::new(1i32)).unwrap();
        assert_eq!((desc.len)(&map).unwrap(), 1);

        let mut seen = Vec::new();
        (desc.for_each)(&map, &mut |k, v| {
            seen.push((
                k.downcast_ref::<String>().cloned(),
                v.downcast_ref::<i32>().copied(),
            ));
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec![(Some("a".to_string()), Some(1))]);

        let err = (desc.insert)(&mut map, Box::new(1u8), Box::new(1i32)).unwrap_err();
        assert!(matches!(err, BipfError::WrongTarget { .. }));
    }
}
