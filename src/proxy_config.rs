use crate::core::{PropertyDescriptor, PropertyKey, Value};
use crate::js_mock::{RecordingWrapper, WrapCallable};
use indexmap::IndexMap;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

/// Plain overrides (and cached nested proxies) by key.
pub type Holder = IndexMap<PropertyKey, Value>;
/// Descriptors installed through `define_property`, by key.
pub type Descriptors = IndexMap<PropertyKey, PropertyDescriptor>;

type HolderFactory = Rc<dyn Fn() -> Holder>;
type DescriptorFactory = Rc<dyn Fn() -> Descriptors>;

/// Construction options for an interception proxy.
#[derive(Clone)]
pub struct ProxyOptions {
    make_holder: Option<HolderFactory>,
    make_descriptors: Option<DescriptorFactory>,
    wrapper: Rc<dyn WrapCallable>,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        ProxyOptions {
            make_holder: None,
            make_descriptors: None,
            wrapper: Rc::new(RecordingWrapper::new()),
        }
    }
}

impl ProxyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory for the override table, called at construction and on every reset.
    pub fn with_holder(mut self, make_holder: impl Fn() -> Holder + 'static) -> Self {
        self.make_holder = Some(Rc::new(make_holder));
        self
    }

    /// Factory for the descriptor table, called at construction and on every reset.
    pub fn with_descriptors(mut self, make_descriptors: impl Fn() -> Descriptors + 'static) -> Self {
        self.make_descriptors = Some(Rc::new(make_descriptors));
        self
    }

    pub fn with_wrapper(mut self, wrapper: impl WrapCallable + 'static) -> Self {
        self.wrapper = Rc::new(wrapper);
        self
    }

    // Nested proxies start empty but hand out methods through the same wrapper.
    pub(crate) fn for_nested(&self) -> Self {
        ProxyOptions {
            make_holder: None,
            make_descriptors: None,
            wrapper: Rc::clone(&self.wrapper),
        }
    }
}

pub(crate) struct ConfigState {
    pub(crate) holder: Holder,
    pub(crate) descriptors: Descriptors,
}

/// Mutable per-proxy state: the wrapped object, its overrides and its
/// installed descriptors.
pub struct ProxyConfig {
    original: Value,
    state: RefCell<ConfigState>,
    make_holder: Option<HolderFactory>,
    make_descriptors: Option<DescriptorFactory>,
    pub(crate) wrapper: Rc<dyn WrapCallable>,
    pub(crate) nested_options: ProxyOptions,
}

impl ProxyConfig {
    pub(crate) fn new(original: Value, options: ProxyOptions) -> Self {
        let nested_options = options.for_nested();
        let ProxyOptions {
            make_holder,
            make_descriptors,
            wrapper,
        } = options;
        let state = ConfigState {
            holder: make_holder.as_ref().map_or_else(Holder::new, |f| f()),
            descriptors: make_descriptors.as_ref().map_or_else(Descriptors::new, |f| f()),
        };
        ProxyConfig {
            original,
            state: RefCell::new(state),
            make_holder,
            make_descriptors,
            wrapper,
            nested_options,
        }
    }

    pub fn original(&self) -> &Value {
        &self.original
    }

    /// Discard every override and descriptor by rebuilding both tables from
    /// their factories. The wrapped object is left as it is.
    pub fn reset(&self) {
        let holder = self.make_holder.as_ref().map_or_else(Holder::new, |f| f());
        let descriptors = self.make_descriptors.as_ref().map_or_else(Descriptors::new, |f| f());
        let mut state = self.state.borrow_mut();
        log::debug!(
            "reset proxy config: dropping {} overrides and {} descriptors",
            state.holder.len(),
            state.descriptors.len()
        );
        state.holder = holder;
        state.descriptors = descriptors;
    }

    pub fn holder_keys(&self) -> Vec<PropertyKey> {
        self.state.borrow().holder.keys().cloned().collect()
    }

    pub fn holder_get(&self, key: impl Into<PropertyKey>) -> Option<Value> {
        self.state.borrow().holder.get(&key.into()).cloned()
    }

    pub fn descriptor_keys(&self) -> Vec<PropertyKey> {
        self.state.borrow().descriptors.keys().cloned().collect()
    }

    pub fn descriptor(&self, key: impl Into<PropertyKey>) -> Option<PropertyDescriptor> {
        self.state.borrow().descriptors.get(&key.into()).cloned()
    }

    /// True when neither overrides nor descriptors are present.
    pub fn is_pristine(&self) -> bool {
        let state = self.state.borrow();
        state.holder.is_empty() && state.descriptors.is_empty()
    }

    pub(crate) fn state(&self) -> Ref<'_, ConfigState> {
        self.state.borrow()
    }

    pub(crate) fn state_mut(&self) -> RefMut<'_, ConfigState> {
        self.state.borrow_mut()
    }
}

/// Resets a proxy config when dropped. Hold one for the duration of a test.
#[must_use = "the config is reset when the guard is dropped"]
pub struct ResetGuard {
    config: Rc<ProxyConfig>,
}

impl ResetGuard {
    pub fn new(config: Rc<ProxyConfig>) -> Self {
        ResetGuard { config }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

impl Drop for ResetGuard {
    fn drop(&mut self) {
        self.config.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_rebuilds_from_factories() {
        let options = ProxyOptions::new().with_holder(|| {
            let mut holder = Holder::new();
            holder.insert(PropertyKey::from("seeded"), Value::from(1));
            holder
        });
        let config = ProxyConfig::new(Value::Null, options);
        assert_eq!(config.holder_get("seeded"), Some(Value::from(1)));

        config.state_mut().holder.insert(PropertyKey::from("extra"), Value::from(2));
        config.state_mut().holder.shift_remove(&PropertyKey::from("seeded"));
        config.reset();
        assert_eq!(config.holder_keys(), vec![PropertyKey::from("seeded")]);
    }

    #[test]
    fn reset_right_after_construction_is_a_no_op() {
        let config = ProxyConfig::new(Value::Null, ProxyOptions::default());
        assert!(config.is_pristine());
        config.reset();
        config.reset();
        assert!(config.is_pristine());
    }

    #[test]
    fn guard_resets_on_drop() {
        let config = Rc::new(ProxyConfig::new(Value::Null, ProxyOptions::default()));
        {
            let guard = ResetGuard::new(Rc::clone(&config));
            guard
                .config()
                .state_mut()
                .descriptors
                .insert(PropertyKey::from("k"), PropertyDescriptor::new_data(1, true, true, true));
            assert!(!config.is_pristine());
        }
        assert!(config.is_pristine());
    }
}
