//! Proxy → config association.
//!
//! Entries are weak on both sides: the registry never keeps a proxy (or its
//! config) alive. Each thread has its own registry, matching the
//! one-registry-per-execution-context model of the test runner.

use crate::core::{Value, value_to_string};
use crate::js_proxy::{InterceptingProxy, ProxyCell};
use crate::proxy_config::ProxyConfig;
use crate::JSError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

struct RegistryEntry {
    proxy: Weak<ProxyCell>,
    config: Weak<ProxyConfig>,
}

impl RegistryEntry {
    fn is_live(&self) -> bool {
        self.proxy.strong_count() > 0
    }
}

// Dead entries are only swept once the table has doubled since the last
// sweep, keeping registration amortized O(1).
const MIN_PRUNE_LEN: usize = 64;

#[derive(Default)]
struct Registry {
    entries: HashMap<usize, RegistryEntry>,
    last_live: usize,
}

impl Registry {
    fn prune(&mut self) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live());
        self.last_live = self.entries.len();
        let dropped = before - self.last_live;
        if dropped > 0 {
            log::debug!("registry: pruned {dropped} dead proxy entries");
        }
    }

    fn maybe_prune(&mut self) {
        if self.entries.len() >= (self.last_live * 2).max(MIN_PRUNE_LEN) {
            self.prune();
        }
    }
}

thread_local! {
    static PROXIES: RefCell<Registry> = RefCell::new(Registry::default());
}

pub(crate) fn register(proxy: &InterceptingProxy, config: &Rc<ProxyConfig>) {
    PROXIES.with(|proxies| {
        let mut registry = proxies.borrow_mut();
        registry.maybe_prune();
        registry.entries.insert(
            proxy.addr(),
            RegistryEntry {
                proxy: proxy.downgrade(),
                config: Rc::downgrade(config),
            },
        );
    });
}

pub(crate) fn lookup(proxy: &InterceptingProxy) -> Option<Rc<ProxyConfig>> {
    PROXIES.with(|proxies| {
        let registry = proxies.borrow();
        let entry = registry.entries.get(&proxy.addr())?;
        let cell = entry.proxy.upgrade()?;
        if !proxy.is_cell(&cell) {
            return None;
        }
        entry.config.upgrade()
    })
}

/// Config of a proxy created by this crate on the current thread.
///
/// Anything else, including the raw object a proxy wraps, fails with
/// `NotRegistered`.
pub fn get_config(value: &Value) -> Result<Rc<ProxyConfig>, JSError> {
    let found = match value {
        Value::Proxy(proxy) => lookup(proxy),
        _ => None,
    };
    found.ok_or_else(|| JSError::NotRegistered {
        what: format!("{} ({})", value_to_string(value), value.type_of()),
    })
}

/// Number of proxies on this thread that are still referenced somewhere.
pub fn live_proxy_count() -> usize {
    PROXIES.with(|proxies| {
        let mut registry = proxies.borrow_mut();
        registry.prune();
        registry.entries.len()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::JSObject;
    use crate::proxy_config::ProxyOptions;

    fn table_len() -> usize {
        PROXIES.with(|proxies| proxies.borrow().entries.len())
    }

    #[test]
    fn dead_entries_are_swept_lazily() {
        for _ in 0..1000 {
            let _ = InterceptingProxy::new(JSObject::new(), ProxyOptions::default()).unwrap();
        }
        assert!(table_len() <= MIN_PRUNE_LEN, "table grew to {}", table_len());
        assert_eq!(live_proxy_count(), 0);
        assert_eq!(table_len(), 0);
    }

    #[test]
    fn live_entries_survive_sweeps() {
        let kept: Vec<_> = (0..300).map(|_| InterceptingProxy::new(JSObject::new(), ProxyOptions::default()).unwrap()).collect();
        assert_eq!(live_proxy_count(), kept.len());
        assert!(kept.iter().all(|proxy| lookup(proxy).is_some()));
    }
}
