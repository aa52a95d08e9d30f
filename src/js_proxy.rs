use crate::core::{ObjectOps, PropertyDescriptor, PropertyKey, Value, validate_descriptor_for_define, value_to_string};
use crate::proxy_config::{ProxyConfig, ProxyOptions, ResetGuard};
use crate::{JSError, raise_type_error, registry};
use std::rc::{Rc, Weak};

pub(crate) struct ProxyCell {
    config: Rc<ProxyConfig>,
}

/// An interception wrapper around one host object.
///
/// Reads and writes go through per-proxy override tables instead of the
/// wrapped object, so a test can change what it sees and later [`reset`]
/// back to the pristine object. Lookup precedence for every key is:
/// holder override, then installed descriptor, then the live target.
///
/// Plain-object values read from the target are wrapped lazily in nested
/// proxies (cached, so repeated reads return the same proxy) and methods are
/// handed out through the configured [`WrapCallable`](crate::WrapCallable).
///
/// [`reset`]: InterceptingProxy::reset
#[derive(Clone)]
pub struct InterceptingProxy(Rc<ProxyCell>);

/// Construct a proxy over `original` and register it.
pub fn create_intercepting_proxy(original: impl Into<Value>, options: ProxyOptions) -> Result<InterceptingProxy, JSError> {
    InterceptingProxy::new(original, options)
}

// A frozen property (non-configurable, non-writable, no setter) on the
// target cannot be shadowed or removed.
fn assert_writable_descriptor(target: &dyn ObjectOps, key: &PropertyKey) -> Result<(), JSError> {
    if let Some(desc) = target.get_own_property_descriptor(key)?
        && desc.configurable == Some(false)
        && !desc.allows_assignment()
    {
        return Err(JSError::NonWritable { key: key.to_string() });
    }
    Ok(())
}

fn assert_configurable_descriptor(target: &dyn ObjectOps, key: &PropertyKey) -> Result<(), JSError> {
    if let Some(desc) = target.get_own_property_descriptor(key)?
        && desc.configurable == Some(false)
    {
        return Err(JSError::NotConfigurable { key: key.to_string() });
    }
    Ok(())
}

impl InterceptingProxy {
    pub fn new(original: impl Into<Value>, options: ProxyOptions) -> Result<Self, JSError> {
        let original = original.into();
        if !original.is_object_like() {
            return Err(JSError::NotAnObject {
                what: value_to_string(&original),
            });
        }
        let config = Rc::new(ProxyConfig::new(original, options));
        let proxy = InterceptingProxy(Rc::new(ProxyCell { config: Rc::clone(&config) }));
        registry::register(&proxy, &config);
        log::trace!("created proxy {:p}", proxy.as_ptr());
        Ok(proxy)
    }

    pub fn ptr_eq(&self, other: &InterceptingProxy) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn as_ptr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub(crate) fn downgrade(&self) -> Weak<ProxyCell> {
        Rc::downgrade(&self.0)
    }

    pub(crate) fn is_cell(&self, cell: &Rc<ProxyCell>) -> bool {
        Rc::ptr_eq(&self.0, cell)
    }

    pub fn config(&self) -> Rc<ProxyConfig> {
        Rc::clone(&self.0.config)
    }

    pub fn original(&self) -> &Value {
        self.0.config.original()
    }

    /// Drop all overrides of this proxy. Nested proxies cached in the
    /// holder are dropped with it, so the next read re-wraps the target.
    pub fn reset(&self) {
        self.0.config.reset();
    }

    /// Guard that resets this proxy when it goes out of scope.
    pub fn reset_guard(&self) -> ResetGuard {
        ResetGuard::new(self.config())
    }

    fn target(&self) -> Result<&dyn ObjectOps, JSError> {
        let original = self.0.config.original();
        original.as_object_ops().ok_or_else(|| JSError::NotAnObject {
            what: value_to_string(original),
        })
    }

    pub fn get(&self, key: impl Into<PropertyKey>) -> Result<Value, JSError> {
        let key = key.into();
        let config = &self.0.config;
        log::trace!("proxy {:p} get '{}'", self.as_ptr(), key);

        let descriptor = {
            let state = config.state();
            if let Some(value) = state.holder.get(&key) {
                return Ok(value.clone());
            }
            state.descriptors.get(&key).cloned()
        };
        if let Some(desc) = descriptor {
            if let Some(getter) = desc.getter() {
                return getter.call(config.original(), &[]);
            }
            return Ok(desc.value.unwrap_or_default());
        }

        match self.target()?.get(&key)? {
            Value::Function(func) => Ok(Value::Function(config.wrapper.wrap(&key, &func, config.original()))),
            value if value.is_object_like() => {
                let nested = InterceptingProxy::new(value, config.nested_options.clone())?;
                log::trace!("proxy {:p} wrapped '{}' in nested proxy {:p}", self.as_ptr(), key, nested.as_ptr());
                config.state_mut().holder.insert(key, Value::Proxy(nested.clone()));
                Ok(Value::Proxy(nested))
            }
            value => Ok(value),
        }
    }

    /// Returns `Ok(false)` when an installed non-writable descriptor drops
    /// the assignment; fails with `NonWritable` when the target's own
    /// property is frozen.
    pub fn set(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> Result<bool, JSError> {
        let key = key.into();
        let value = value.into();
        let config = &self.0.config;
        log::trace!("proxy {:p} set '{}'", self.as_ptr(), key);
        assert_writable_descriptor(self.target()?, &key)?;

        let descriptor = config.state().descriptors.get(&key).cloned();
        if let Some(desc) = descriptor {
            if let Some(setter) = desc.setter() {
                setter.call(config.original(), &[value])?;
                return Ok(true);
            }
            if desc.writable != Some(true) {
                log::warn!("proxy {:p}: assignment to non-writable '{}' dropped", self.as_ptr(), key);
                return Ok(false);
            }
            if let Some(desc) = config.state_mut().descriptors.get_mut(&key) {
                desc.value = Some(value);
            }
            return Ok(true);
        }

        config.state_mut().holder.insert(key, value);
        Ok(true)
    }

    /// A key is present when it is overridden, has an installed descriptor,
    /// or exists on the target (own or inherited).
    pub fn has(&self, key: impl Into<PropertyKey>) -> Result<bool, JSError> {
        let key = key.into();
        {
            let state = self.0.config.state();
            if state.holder.contains_key(&key) || state.descriptors.contains_key(&key) {
                return Ok(true);
            }
        }
        self.target()?.has(&key)
    }

    /// Removes the override and deletes the key from the target itself.
    /// Succeeds whether or not the key existed. Installed descriptors are
    /// kept until the next reset.
    pub fn delete(&self, key: impl Into<PropertyKey>) -> Result<bool, JSError> {
        let key = key.into();
        log::trace!("proxy {:p} delete '{}'", self.as_ptr(), key);
        let target = self.target()?;
        assert_writable_descriptor(target, &key)?;
        self.0.config.state_mut().holder.shift_remove(&key);
        target.delete(&key)?;
        Ok(true)
    }

    pub fn define_property(&self, key: impl Into<PropertyKey>, desc: PropertyDescriptor) -> Result<bool, JSError> {
        let key = key.into();
        log::trace!("proxy {:p} define '{}'", self.as_ptr(), key);
        assert_configurable_descriptor(self.target()?, &key)?;
        validate_descriptor_for_define(&desc)?;
        let mut state = self.0.config.state_mut();
        state.holder.shift_remove(&key);
        state.descriptors.insert(key, desc);
        Ok(true)
    }

    pub fn get_own_property_descriptor(&self, key: impl Into<PropertyKey>) -> Result<Option<PropertyDescriptor>, JSError> {
        let key = key.into();
        if let Some(desc) = self.0.config.state().descriptors.get(&key) {
            return Ok(Some(desc.clone()));
        }
        self.target()?.get_own_property_descriptor(&key)
    }

    /// Own keys of the target. Overrides do not add keys.
    pub fn own_keys(&self) -> Result<Vec<PropertyKey>, JSError> {
        self.target()?.own_keys()
    }

    /// Read `key` and invoke it as a method.
    pub fn call_method(&self, key: impl Into<PropertyKey>, args: &[Value]) -> Result<Value, JSError> {
        let key = key.into();
        match self.get(&key)? {
            Value::Function(func) => func.call(&Value::Proxy(self.clone()), args),
            other => Err(raise_type_error!(format!("'{}' is not a function (got {})", key, other.type_of()))),
        }
    }
}

impl ObjectOps for InterceptingProxy {
    fn get(&self, key: &PropertyKey) -> Result<Value, JSError> {
        InterceptingProxy::get(self, key)
    }

    fn set(&self, key: &PropertyKey, value: Value) -> Result<bool, JSError> {
        InterceptingProxy::set(self, key, value)
    }

    fn has(&self, key: &PropertyKey) -> Result<bool, JSError> {
        InterceptingProxy::has(self, key)
    }

    fn delete(&self, key: &PropertyKey) -> Result<bool, JSError> {
        InterceptingProxy::delete(self, key)
    }

    fn define_property(&self, key: &PropertyKey, desc: PropertyDescriptor) -> Result<bool, JSError> {
        InterceptingProxy::define_property(self, key, desc)
    }

    fn get_own_property_descriptor(&self, key: &PropertyKey) -> Result<Option<PropertyDescriptor>, JSError> {
        InterceptingProxy::get_own_property_descriptor(self, key)
    }

    fn own_keys(&self) -> Result<Vec<PropertyKey>, JSError> {
        InterceptingProxy::own_keys(self)
    }
}

impl std::fmt::Debug for InterceptingProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InterceptingProxy({:p})", self.as_ptr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{JSFunction, JSObject};

    fn proxy_over(obj: &JSObject) -> InterceptingProxy {
        InterceptingProxy::new(obj.clone(), ProxyOptions::default()).unwrap()
    }

    #[test]
    fn primitives_cannot_be_wrapped() {
        assert!(matches!(InterceptingProxy::new(1, ProxyOptions::default()), Err(JSError::NotAnObject { .. })));
        assert!(InterceptingProxy::new(Value::Null, ProxyOptions::default()).is_err());
        let func = JSFunction::new("f", |_, _| Ok(Value::Undefined));
        assert!(InterceptingProxy::new(func, ProxyOptions::default()).is_err());
    }

    #[test]
    fn holder_override_is_invisible_on_target() {
        let target = JSObject::new();
        target.insert("title", "original");
        let proxy = proxy_over(&target);
        assert!(proxy.set("title", "changed").unwrap());
        assert_eq!(proxy.get("title").unwrap(), Value::from("changed"));
        assert_eq!(target.get("title").unwrap(), Value::from("original"));
    }

    #[test]
    fn getter_descriptor_is_called_with_the_target() {
        let target = JSObject::new();
        target.insert("name", "win");
        let proxy = proxy_over(&target);
        let getter = JSFunction::new("get label", |this, _| {
            let name = this.as_object().map(|o| o.get("name")).transpose()?.unwrap_or_default();
            Ok(Value::from(format!("label:{name}")))
        });
        proxy
            .define_property("label", PropertyDescriptor::new_accessor(Some(Value::Function(getter)), None, true, true))
            .unwrap();
        assert_eq!(proxy.get("label").unwrap(), Value::from("label:win"));
    }

    #[test]
    fn setter_descriptor_writes_through_to_the_target() {
        let target = JSObject::new();
        let proxy = proxy_over(&target);
        let setter = JSFunction::new("set shadow", |this, args| {
            if let Some(obj) = this.as_object() {
                obj.set("_shadow", args.first().cloned().unwrap_or_default())?;
            }
            Ok(Value::Undefined)
        });
        proxy
            .define_property("shadow", PropertyDescriptor::new_accessor(None, Some(Value::Function(setter)), true, true))
            .unwrap();
        assert!(proxy.set("shadow", 5).unwrap());
        assert_eq!(target.get("_shadow").unwrap(), Value::from(5));
        // no getter installed, no value stored
        assert_eq!(proxy.get("shadow").unwrap(), Value::Undefined);
    }

    #[test]
    fn malformed_descriptor_is_a_type_error() {
        let proxy = proxy_over(&JSObject::new());
        let bad = PropertyDescriptor::new_accessor(Some(Value::from(3)), None, true, true);
        assert!(matches!(proxy.define_property("x", bad), Err(JSError::TypeError { .. })));
        assert!(proxy.config().is_pristine());
    }

    #[test]
    fn call_method_rejects_non_functions() {
        let target = JSObject::new();
        target.insert("width", 10);
        let proxy = proxy_over(&target);
        assert!(matches!(proxy.call_method("width", &[]), Err(JSError::TypeError { .. })));
    }
}
