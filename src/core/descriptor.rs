use crate::core::{JSFunction, JSObject, PropertyKey, PropertySlot, Value};
use crate::{JSError, raise_type_error};

/// A property descriptor record.
/// Supports both data descriptors (`value` + `writable`) and accessor descriptors (`get`/`set`).
/// Fields are optional to support "partial" descriptors (as accepted by DefineProperty).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyDescriptor {
    // Data fields
    pub value: Option<Value>,
    pub writable: Option<bool>,
    // Accessor fields
    pub get: Option<Value>,
    pub set: Option<Value>,
    // Common flags
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    /// Construct a full data descriptor from explicit values
    pub fn new_data(value: impl Into<Value>, writable: bool, enumerable: bool, configurable: bool) -> Self {
        PropertyDescriptor {
            value: Some(value.into()),
            writable: Some(writable),
            get: None,
            set: None,
            enumerable: Some(enumerable),
            configurable: Some(configurable),
        }
    }

    /// Construct an accessor descriptor
    pub fn new_accessor(get: Option<Value>, set: Option<Value>, enumerable: bool, configurable: bool) -> Self {
        PropertyDescriptor {
            value: None,
            writable: None,
            get,
            set,
            enumerable: Some(enumerable),
            configurable: Some(configurable),
        }
    }

    pub fn is_accessor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    pub fn is_data(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    pub fn getter(&self) -> Option<JSFunction> {
        self.get.as_ref().and_then(Value::as_function).cloned()
    }

    pub fn setter(&self) -> Option<JSFunction> {
        self.set.as_ref().and_then(Value::as_function).cloned()
    }

    /// Whether assignment through this descriptor can succeed on a
    /// non-configurable property: it is writable or has a setter.
    pub fn allows_assignment(&self) -> bool {
        self.setter().is_some() || self.writable == Some(true)
    }

    /// For a non-configurable `self`, whether redefining with `desc` is allowed.
    pub(crate) fn permits(&self, desc: &PropertyDescriptor) -> bool {
        if desc.configurable == Some(true) {
            return false;
        }
        if desc.enumerable.is_some() && desc.enumerable != self.enumerable {
            return false;
        }
        if (desc.is_accessor() && self.is_data()) || (desc.is_data() && self.is_accessor()) {
            return false;
        }
        if self.is_data() && self.writable != Some(true) {
            if desc.writable == Some(true) {
                return false;
            }
            if let (Some(new), Some(old)) = (&desc.value, &self.value)
                && !new.same_value(old)
            {
                return false;
            }
        }
        if self.is_accessor() {
            let same = |a: &Option<Value>, b: &Option<Value>| match (a, b) {
                (None, _) => true,
                (Some(a), Some(b)) => a.same_value(b),
                (Some(a), None) => a.is_undefined(),
            };
            if !same(&desc.get, &self.get) || !same(&desc.set, &self.set) {
                return false;
            }
        }
        true
    }

    /// Read a descriptor out of a descriptor-shaped object
    /// (`{ value, writable, get, set, enumerable, configurable }`).
    /// Missing fields stay `None`; flags are coerced with truthiness.
    pub fn from_object(obj: &JSObject) -> Result<Self, JSError> {
        let field = |name: &str| -> Result<Option<Value>, JSError> {
            if obj.has(name) { obj.get(name).map(Some) } else { Ok(None) }
        };
        let desc = PropertyDescriptor {
            value: field("value")?,
            writable: field("writable")?.map(|v| v.to_truthy()),
            get: field("get")?,
            set: field("set")?,
            enumerable: field("enumerable")?.map(|v| v.to_truthy()),
            configurable: field("configurable")?.map(|v| v.to_truthy()),
        };
        validate_descriptor_for_define(&desc)?;
        Ok(desc)
    }

    /// Produce an object representing this descriptor. Missing fields are
    /// materialized using defaults so the returned object is complete.
    pub fn to_object(&self) -> JSObject {
        let desc = JSObject::new();
        if self.is_accessor() {
            desc.insert("get", self.get.clone().unwrap_or_default());
            desc.insert("set", self.set.clone().unwrap_or_default());
        } else {
            desc.insert("value", self.value.clone().unwrap_or_default());
            desc.insert("writable", self.writable.unwrap_or(false));
        }
        desc.insert("enumerable", self.enumerable.unwrap_or(false));
        desc.insert("configurable", self.configurable.unwrap_or(false));
        desc
    }
}

/// Build a complete `PropertyDescriptor` for an own property on `obj` if present.
pub(crate) fn build_property_descriptor(obj: &JSObject, key: &PropertyKey) -> Option<PropertyDescriptor> {
    let data = obj.borrow();
    let slot = data.properties.get(key)?;
    let enumerable = data.is_enumerable(key);
    let configurable = data.is_configurable(key);
    let pd = match slot {
        PropertySlot::Data(value) => PropertyDescriptor::new_data(value.clone(), data.is_writable(key), enumerable, configurable),
        PropertySlot::Accessor { getter, setter } => PropertyDescriptor::new_accessor(
            Some(getter.clone().map(Value::Function).unwrap_or_default()),
            Some(setter.clone().map(Value::Function).unwrap_or_default()),
            enumerable,
            configurable,
        ),
    };
    Some(pd)
}

/// Validate a descriptor for use in DefineProperty.
/// Ensures it is NOT both a data and an accessor descriptor and that
/// getter/setter values are functions or `undefined`.
pub fn validate_descriptor_for_define(pd: &PropertyDescriptor) -> Result<(), JSError> {
    if pd.is_accessor() && pd.is_data() {
        return Err(raise_type_error!(
            "Invalid property descriptor: cannot be both a data and an accessor descriptor"
        ));
    }
    for (what, val) in [("getter", &pd.get), ("setter", &pd.set)] {
        match val {
            None | Some(Value::Undefined) | Some(Value::Function(_)) => {}
            Some(other) => {
                return Err(raise_type_error!(format!(
                    "Property descriptor {what} must be a function or undefined, got {}",
                    other.type_of()
                )));
            }
        }
    }
    Ok(())
}
