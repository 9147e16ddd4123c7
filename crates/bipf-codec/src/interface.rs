use std::any::{Any, TypeId};
use std::fmt;

use bipf_wire::Value;

use crate::reflect::{Reflect, TypeDesc};

/// Object-safe view of a [`Reflect`] value.
pub trait DynReflect: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn type_desc(&self) -> TypeDesc;
}

impl<T: Reflect> DynReflect for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_desc(&self) -> TypeDesc {
        T::describe()
    }
}

/// Holder for a type-erased concrete value.
///
/// Encodes as the held value, or null when empty. Decoding needs a value
/// already in place to know the concrete type: an empty holder fails
/// with `CannotUnmarshalIntoNil`, and null input empties the holder.
#[derive(Default)]
pub struct Interface(Option<Box<dyn DynReflect>>);

impl Interface {
    pub fn new<T: Reflect>(value: T) -> Self {
        Interface(Some(Box::new(value)))
    }

    pub fn nil() -> Self {
        Interface(None)
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_none()
    }

    pub fn get(&self) -> Option<&dyn DynReflect> {
        self.0.as_deref()
    }

    pub fn get_mut(&mut self) -> Option<&mut dyn DynReflect> {
        self.0.as_deref_mut()
    }

    /// Replace the held value.
    pub fn set<T: Reflect>(&mut self, value: T) {
        self.0 = Some(Box::new(value));
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    /// Type id of the held value.
    pub fn held_type_id(&self) -> Option<TypeId> {
        self.get().map(|v| v.as_any().type_id())
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.get()?.as_any().downcast_ref()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.get_mut()?.as_any_mut().downcast_mut()
    }
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => write!(f, "Interface({})", value.type_desc().name),
            None => f.write_str("Interface(nil)"),
        }
    }
}

/// Unconstrained dynamic slot.
///
/// Decoding into a slot that already holds a concrete value decodes into
/// that value, exactly like [`Interface`]. An empty slot receives the
/// generic [`Value`] read from the wire instead of failing.
#[derive(Default, Debug)]
pub struct AnyValue(Interface);

impl AnyValue {
    pub fn new<T: Reflect>(value: T) -> Self {
        AnyValue(Interface::new(value))
    }

    pub fn nil() -> Self {
        AnyValue(Interface::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    pub fn set<T: Reflect>(&mut self, value: T) {
        self.0.set(value);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// The generic value stored by a decode into an empty slot.
    pub fn as_value(&self) -> Option<&Value> {
        self.0.downcast_ref()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.0.downcast_mut()
    }

    pub fn as_interface(&self) -> &Interface {
        &self.0
    }

    pub fn as_interface_mut(&mut self) -> &mut Interface {
        &mut self.0
    }
}

impl From<Interface> for AnyValue {
    fn from(held: Interface) -> Self {
        AnyValue(held)
    }
}
