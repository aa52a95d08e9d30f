use crate::core::{JSFunction, PropertyDescriptor, PropertyKey, Value, validate_descriptor_for_define};
use crate::JSError;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::rc::Rc;

/// Storage for a single own property. Attribute flags live in the owning
/// object's flag sets, not in the slot.
#[derive(Clone, Debug)]
pub enum PropertySlot {
    Data(Value),
    Accessor {
        getter: Option<JSFunction>,
        setter: Option<JSFunction>,
    },
}

#[derive(Default)]
pub struct JSObjectData {
    pub properties: indexmap::IndexMap<PropertyKey, PropertySlot>,
    pub non_enumerable: HashSet<PropertyKey>,
    pub non_writable: HashSet<PropertyKey>,
    pub non_configurable: HashSet<PropertyKey>,
    pub prototype: Option<JSObject>,
    // Whether new own properties can be added to this object. Default true.
    pub extensible: bool,
}

impl JSObjectData {
    pub fn new() -> Self {
        // JSObjectData::default() would initialize `extensible` to false, so ensure it's true by default
        JSObjectData {
            extensible: true,
            ..JSObjectData::default()
        }
    }

    pub fn insert(&mut self, key: PropertyKey, slot: PropertySlot) {
        self.properties.insert(key, slot);
    }

    pub fn set_non_configurable(&mut self, key: PropertyKey) {
        log::debug!("set_non_configurable: obj_ptr={:p} key={}", self as *const _, key);
        self.non_configurable.insert(key);
    }

    pub fn set_non_writable(&mut self, key: PropertyKey) {
        log::debug!("set_non_writable: obj_ptr={:p} key={}", self as *const _, key);
        self.non_writable.insert(key);
    }

    pub fn set_non_enumerable(&mut self, key: PropertyKey) {
        log::debug!("set_non_enumerable: obj_ptr={:p} key={}", self as *const _, key);
        self.non_enumerable.insert(key);
    }

    pub fn is_configurable(&self, key: &PropertyKey) -> bool {
        !self.non_configurable.contains(key)
    }

    pub fn is_writable(&self, key: &PropertyKey) -> bool {
        !self.non_writable.contains(key)
    }

    pub fn is_enumerable(&self, key: &PropertyKey) -> bool {
        !self.non_enumerable.contains(key)
    }

    fn set_flag(set: &mut HashSet<PropertyKey>, key: &PropertyKey, present: bool) {
        if present {
            set.insert(key.clone());
        } else {
            set.remove(key);
        }
    }

    fn remove(&mut self, key: &PropertyKey) {
        self.properties.shift_remove(key);
        self.non_enumerable.remove(key);
        self.non_writable.remove(key);
        self.non_configurable.remove(key);
    }
}

/// Shared handle to a host object. Cloning the handle does not clone the object.
#[derive(Clone)]
pub struct JSObject(Rc<RefCell<JSObjectData>>);

// What an ordinary assignment resolved to, computed under a borrow and
// carried out after the borrow is released.
enum SetAction {
    Reject,
    WriteOwn,
    CallSetter(JSFunction),
}

impl Default for JSObject {
    fn default() -> Self {
        Self::new()
    }
}

impl JSObject {
    pub fn new() -> Self {
        JSObject(Rc::new(RefCell::new(JSObjectData::new())))
    }

    pub fn with_prototype(prototype: &JSObject) -> Self {
        let obj = JSObject::new();
        obj.borrow_mut().prototype = Some(prototype.clone());
        obj
    }

    pub fn borrow(&self) -> Ref<'_, JSObjectData> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, JSObjectData> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &JSObject) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn as_ptr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }

    pub fn prototype(&self) -> Option<JSObject> {
        self.borrow().prototype.clone()
    }

    /// Replace the prototype. Returns `false` if the change would create a cycle.
    pub fn set_prototype(&self, prototype: Option<&JSObject>) -> bool {
        let mut cursor = prototype.cloned();
        while let Some(p) = cursor {
            if p.ptr_eq(self) {
                return false;
            }
            cursor = p.prototype();
        }
        self.borrow_mut().prototype = prototype.cloned();
        true
    }

    /// Insert a plain writable, enumerable, configurable data property,
    /// replacing whatever was there. Meant for building fixtures.
    pub fn insert(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> &Self {
        let key = key.into();
        let mut data = self.borrow_mut();
        data.non_writable.remove(&key);
        data.non_enumerable.remove(&key);
        data.non_configurable.remove(&key);
        data.insert(key, PropertySlot::Data(value.into()));
        drop(data);
        self
    }

    /// Insert an accessor property (enumerable and configurable).
    pub fn insert_accessor(&self, key: impl Into<PropertyKey>, getter: Option<JSFunction>, setter: Option<JSFunction>) -> &Self {
        let key = key.into();
        let mut data = self.borrow_mut();
        data.non_writable.remove(&key);
        data.non_enumerable.remove(&key);
        data.non_configurable.remove(&key);
        data.insert(key, PropertySlot::Accessor { getter, setter });
        drop(data);
        self
    }

    pub fn get_own_slot(&self, key: &PropertyKey) -> Option<PropertySlot> {
        self.borrow().properties.get(key).cloned()
    }

    fn find_slot(&self, key: &PropertyKey) -> Option<(JSObject, PropertySlot)> {
        let mut cursor = Some(self.clone());
        while let Some(obj) = cursor {
            if let Some(slot) = obj.get_own_slot(key) {
                return Some((obj, slot));
            }
            cursor = obj.prototype();
        }
        None
    }

    pub fn has_own(&self, key: impl Into<PropertyKey>) -> bool {
        self.borrow().properties.contains_key(&key.into())
    }

    pub fn has(&self, key: impl Into<PropertyKey>) -> bool {
        let key = key.into();
        self.find_slot(&key).is_some()
    }

    pub fn get(&self, key: impl Into<PropertyKey>) -> Result<Value, JSError> {
        self.get_with_receiver(key, &Value::Object(self.clone()))
    }

    /// Property lookup along the prototype chain; getters see `receiver` as `this`.
    pub fn get_with_receiver(&self, key: impl Into<PropertyKey>, receiver: &Value) -> Result<Value, JSError> {
        let key = key.into();
        match self.find_slot(&key) {
            Some((_, PropertySlot::Data(value))) => Ok(value),
            Some((_, PropertySlot::Accessor { getter: Some(getter), .. })) => getter.call(receiver, &[]),
            Some((_, PropertySlot::Accessor { getter: None, .. })) | None => Ok(Value::Undefined),
        }
    }

    /// Ordinary assignment. Returns `Ok(false)` when the assignment is
    /// rejected (non-writable data, accessor without setter, non-extensible).
    pub fn set(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> Result<bool, JSError> {
        let key = key.into();
        let value = value.into();
        let action = match self.find_slot(&key) {
            Some((owner, PropertySlot::Data(_))) => {
                if !owner.borrow().is_writable(&key) {
                    SetAction::Reject
                } else if owner.ptr_eq(self) || self.borrow().extensible {
                    SetAction::WriteOwn
                } else {
                    SetAction::Reject
                }
            }
            Some((_, PropertySlot::Accessor { setter: Some(setter), .. })) => SetAction::CallSetter(setter),
            Some((_, PropertySlot::Accessor { setter: None, .. })) => SetAction::Reject,
            None if self.borrow().extensible => SetAction::WriteOwn,
            None => SetAction::Reject,
        };
        match action {
            SetAction::Reject => {
                log::warn!("assignment to '{}' rejected on obj_ptr={:p}", key, self.as_ptr());
                Ok(false)
            }
            SetAction::WriteOwn => {
                let mut data = self.borrow_mut();
                if let Some(PropertySlot::Data(slot)) = data.properties.get_mut(&key) {
                    *slot = value;
                } else {
                    data.insert(key, PropertySlot::Data(value));
                }
                Ok(true)
            }
            SetAction::CallSetter(setter) => {
                setter.call(&Value::Object(self.clone()), &[value])?;
                Ok(true)
            }
        }
    }

    /// Remove an own property. Missing keys succeed; non-configurable keys
    /// fail loudly as a strict-mode `delete` would.
    pub fn delete(&self, key: impl Into<PropertyKey>) -> Result<bool, JSError> {
        let key = key.into();
        let mut data = self.borrow_mut();
        if !data.properties.contains_key(&key) {
            return Ok(true);
        }
        if !data.is_configurable(&key) {
            return Err(JSError::NotConfigurable { key: key.to_string() });
        }
        data.remove(&key);
        Ok(true)
    }

    pub fn get_own_property_descriptor(&self, key: impl Into<PropertyKey>) -> Option<PropertyDescriptor> {
        crate::core::build_property_descriptor(self, &key.into())
    }

    /// Validate and apply a (possibly partial) descriptor, following the
    /// usual rules for non-configurable properties. Returns `Ok(false)` when
    /// the change is not allowed and `Err` when the descriptor is malformed.
    pub fn define_own_property(&self, key: impl Into<PropertyKey>, desc: &PropertyDescriptor) -> Result<bool, JSError> {
        validate_descriptor_for_define(desc)?;
        let key = key.into();
        let current = self.get_own_property_descriptor(&key);

        let Some(current) = current else {
            if !self.borrow().extensible {
                return Ok(false);
            }
            let slot = if desc.is_accessor() {
                PropertySlot::Accessor {
                    getter: desc.getter(),
                    setter: desc.setter(),
                }
            } else {
                PropertySlot::Data(desc.value.clone().unwrap_or_default())
            };
            let mut data = self.borrow_mut();
            data.insert(key.clone(), slot);
            JSObjectData::set_flag(&mut data.non_writable, &key, !desc.is_accessor() && desc.writable != Some(true));
            JSObjectData::set_flag(&mut data.non_enumerable, &key, desc.enumerable != Some(true));
            JSObjectData::set_flag(&mut data.non_configurable, &key, desc.configurable != Some(true));
            return Ok(true);
        };

        if current.configurable == Some(false) && !current.permits(desc) {
            log::debug!("define_own_property: refusing to change non-configurable '{}'", key);
            return Ok(false);
        }

        let becomes_accessor = desc.is_accessor() || (!desc.is_data() && current.is_accessor());
        let slot = if becomes_accessor {
            let (old_get, old_set) = if current.is_accessor() {
                (current.getter(), current.setter())
            } else {
                (None, None)
            };
            PropertySlot::Accessor {
                getter: if desc.get.is_some() { desc.getter() } else { old_get },
                setter: if desc.set.is_some() { desc.setter() } else { old_set },
            }
        } else {
            let old_value = if current.is_data() { current.value.clone() } else { None };
            PropertySlot::Data(desc.value.clone().or(old_value).unwrap_or_default())
        };
        let writable = if becomes_accessor {
            true
        } else {
            desc.writable.or(if current.is_data() { current.writable } else { None }).unwrap_or(false)
        };
        let enumerable = desc.enumerable.or(current.enumerable).unwrap_or(false);
        let configurable = desc.configurable.or(current.configurable).unwrap_or(false);

        let mut data = self.borrow_mut();
        data.insert(key.clone(), slot);
        JSObjectData::set_flag(&mut data.non_writable, &key, !writable);
        JSObjectData::set_flag(&mut data.non_enumerable, &key, !enumerable);
        JSObjectData::set_flag(&mut data.non_configurable, &key, !configurable);
        Ok(true)
    }

    pub fn own_keys(&self) -> Vec<PropertyKey> {
        self.borrow().properties.keys().cloned().collect()
    }

    /// `Object.freeze`: every own property becomes non-configurable, data
    /// properties become non-writable and no properties can be added.
    pub fn freeze(&self) {
        let mut data = self.borrow_mut();
        let keys: Vec<(PropertyKey, bool)> = data
            .properties
            .iter()
            .map(|(k, slot)| (k.clone(), matches!(slot, PropertySlot::Data(_))))
            .collect();
        for (key, is_data) in keys {
            if is_data {
                data.set_non_writable(key.clone());
            }
            data.set_non_configurable(key);
        }
        data.extensible = false;
    }

    pub fn prevent_extensions(&self) {
        self.borrow_mut().extensible = false;
    }

    pub fn is_extensible(&self) -> bool {
        self.borrow().extensible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_accessor(obj: &JSObject) {
        let getter = JSFunction::new("get count", |this, _| match this {
            Value::Object(o) => o.get("_count"),
            _ => Ok(Value::Undefined),
        });
        let setter = JSFunction::new("set count", |this, args| {
            if let Value::Object(o) = this {
                o.set("_count", args.first().cloned().unwrap_or_default())?;
            }
            Ok(Value::Undefined)
        });
        obj.insert_accessor("count", Some(getter), Some(setter));
    }

    #[test]
    fn inherited_values_are_visible_through_get_and_has() {
        let proto = JSObject::new();
        proto.insert("greeting", "hi");
        let obj = JSObject::with_prototype(&proto);
        assert!(obj.has("greeting"));
        assert!(!obj.has_own("greeting"));
        assert_eq!(obj.get("greeting").unwrap(), Value::from("hi"));
    }

    #[test]
    fn setter_receives_the_receiver() {
        let obj = JSObject::new();
        counter_accessor(&obj);
        assert!(obj.set("count", 4).unwrap());
        assert_eq!(obj.get("_count").unwrap(), Value::from(4));
        assert_eq!(obj.get("count").unwrap(), Value::from(4));
    }

    #[test]
    fn frozen_objects_reject_writes_and_additions() {
        let obj = JSObject::new();
        obj.insert("a", 1);
        obj.freeze();
        assert!(!obj.set("a", 2).unwrap());
        assert!(!obj.set("b", 2).unwrap());
        assert_eq!(obj.get("a").unwrap(), Value::from(1));
        assert!(matches!(obj.delete("a"), Err(JSError::NotConfigurable { .. })));
    }

    #[test]
    fn define_own_property_defaults_missing_flags_to_false() {
        let obj = JSObject::new();
        let desc = PropertyDescriptor {
            value: Some(Value::from(7)),
            ..PropertyDescriptor::default()
        };
        assert!(obj.define_own_property("seven", &desc).unwrap());
        let got = obj.get_own_property_descriptor("seven").unwrap();
        assert_eq!(got.writable, Some(false));
        assert_eq!(got.enumerable, Some(false));
        assert_eq!(got.configurable, Some(false));
        // same value is allowed, a different one is not
        assert!(obj.define_own_property("seven", &desc).unwrap());
        let other = PropertyDescriptor {
            value: Some(Value::from(8)),
            ..PropertyDescriptor::default()
        };
        assert!(!obj.define_own_property("seven", &other).unwrap());
    }

    #[test]
    fn redefining_data_as_accessor_on_configurable_property() {
        let obj = JSObject::new();
        obj.insert("x", 1);
        let getter = JSFunction::new("get x", |_, _| Ok(Value::from(42)));
        let desc = PropertyDescriptor::new_accessor(Some(Value::Function(getter)), None, true, true);
        assert!(obj.define_own_property("x", &desc).unwrap());
        assert_eq!(obj.get("x").unwrap(), Value::from(42));
        assert!(obj.get_own_property_descriptor("x").unwrap().is_accessor());
    }

    #[test]
    fn non_extensible_objects_keep_existing_properties_writable() {
        let obj = JSObject::new();
        obj.insert("a", 1);
        obj.prevent_extensions();
        assert!(!obj.is_extensible());
        assert!(obj.set("a", 2).unwrap());
        assert!(!obj.set("b", 2).unwrap());
        let desc = PropertyDescriptor::new_data(3, true, true, true);
        assert!(!obj.define_own_property("b", &desc).unwrap());
        assert_eq!(obj.get("a").unwrap(), Value::from(2));
    }

    #[test]
    fn prototype_cycles_are_refused() {
        let a = JSObject::new();
        let b = JSObject::with_prototype(&a);
        assert!(!a.set_prototype(Some(&b)));
        assert!(a.prototype().is_none());
    }

    #[test]
    fn delete_keeps_insertion_order_of_the_rest() {
        let obj = JSObject::new();
        obj.insert("a", 1).insert("b", 2).insert("c", 3);
        obj.delete("b").unwrap();
        let keys: Vec<String> = obj.own_keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }
}
