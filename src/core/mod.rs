pub(crate) mod descriptor;
pub(crate) mod object;
pub(crate) mod property_key;
pub(crate) mod value;

pub use descriptor::{PropertyDescriptor, validate_descriptor_for_define};
pub(crate) use descriptor::build_property_descriptor;
pub use object::{JSObject, JSObjectData, PropertySlot};
pub use property_key::{PropertyKey, SymbolData};
pub use value::{JSFunction, Value, value_to_string};

use crate::JSError;

/// The property protocol shared by host objects and interception proxies.
///
/// Proxies reach their target only through this trait, so anything that
/// implements it (including another proxy) can be wrapped.
pub trait ObjectOps {
    fn get(&self, key: &PropertyKey) -> Result<Value, JSError>;

    /// `Ok(false)` reports a rejected assignment; `Err` is reserved for
    /// failures that must abort the caller.
    fn set(&self, key: &PropertyKey, value: Value) -> Result<bool, JSError>;

    fn has(&self, key: &PropertyKey) -> Result<bool, JSError>;

    fn delete(&self, key: &PropertyKey) -> Result<bool, JSError>;

    fn define_property(&self, key: &PropertyKey, desc: PropertyDescriptor) -> Result<bool, JSError>;

    fn get_own_property_descriptor(&self, key: &PropertyKey) -> Result<Option<PropertyDescriptor>, JSError>;

    fn own_keys(&self) -> Result<Vec<PropertyKey>, JSError>;
}

impl ObjectOps for JSObject {
    fn get(&self, key: &PropertyKey) -> Result<Value, JSError> {
        JSObject::get(self, key)
    }

    fn set(&self, key: &PropertyKey, value: Value) -> Result<bool, JSError> {
        JSObject::set(self, key, value)
    }

    fn has(&self, key: &PropertyKey) -> Result<bool, JSError> {
        Ok(JSObject::has(self, key))
    }

    fn delete(&self, key: &PropertyKey) -> Result<bool, JSError> {
        JSObject::delete(self, key)
    }

    fn define_property(&self, key: &PropertyKey, desc: PropertyDescriptor) -> Result<bool, JSError> {
        self.define_own_property(key, &desc)
    }

    fn get_own_property_descriptor(&self, key: &PropertyKey) -> Result<Option<PropertyDescriptor>, JSError> {
        Ok(JSObject::get_own_property_descriptor(self, key))
    }

    fn own_keys(&self) -> Result<Vec<PropertyKey>, JSError> {
        Ok(JSObject::own_keys(self))
    }
}
