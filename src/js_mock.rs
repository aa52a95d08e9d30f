//! Wrapping of methods read through an interception proxy.
//!
//! When a proxy hands out a method of its target it does not return the raw
//! function: it asks a [`WrapCallable`] for a replacement that tests can
//! inspect afterwards. [`RecordingWrapper`] is the default. It logs every
//! invocation and either delegates to the original (invoked against the
//! wrapped object) or returns a stubbed value.

use crate::core::{JSFunction, PropertyKey, Value};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

pub trait WrapCallable {
    /// Return a callable usable in place of `original`, which was read
    /// under `key`. `receiver` is the object the original must be invoked
    /// against.
    fn wrap(&self, key: &PropertyKey, original: &JSFunction, receiver: &Value) -> JSFunction;
}

#[derive(Clone, Debug)]
pub struct CallRecord {
    /// Property key the method was read under.
    pub name: String,
    pub receiver: Value,
    pub args: Vec<Value>,
}

#[derive(Default)]
struct RecorderState {
    calls: Vec<CallRecord>,
    stubs: IndexMap<String, Value>,
}

/// Records calls made through wrapped methods. Clones share one log, so a
/// test can keep a handle while the proxy owns another.
#[derive(Clone, Default)]
pub struct RecordingWrapper {
    state: Rc<RefCell<RecorderState>>,
}

impl RecordingWrapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop delegating calls to the method read under property `name`; they
    /// return `value` instead. The function's own name plays no part, so
    /// anonymous functions and methods stored under an alias are stubbed
    /// by the key the caller reads.
    pub fn stub(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.state.borrow_mut().stubs.insert(name.into(), value.into());
    }

    pub fn unstub(&self, name: &str) {
        self.state.borrow_mut().stubs.shift_remove(name);
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.state.borrow().calls.clone()
    }

    pub fn calls_to(&self, name: &str) -> Vec<CallRecord> {
        self.state.borrow().calls.iter().filter(|c| c.name == name).cloned().collect()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.state.borrow().calls.iter().filter(|c| c.name == name).count()
    }

    /// Forget recorded calls and stubs.
    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        state.calls.clear();
        state.stubs.clear();
    }
}

impl WrapCallable for RecordingWrapper {
    fn wrap(&self, key: &PropertyKey, original: &JSFunction, receiver: &Value) -> JSFunction {
        let state = Rc::clone(&self.state);
        let original = original.clone();
        let receiver = receiver.clone();
        let name = key.to_string();
        JSFunction::new(original.name().to_string(), move |_this, args| {
            let stub = {
                let mut state = state.borrow_mut();
                state.calls.push(CallRecord {
                    name: name.clone(),
                    receiver: receiver.clone(),
                    args: args.to_vec(),
                });
                state.stubs.get(&name).cloned()
            };
            match stub {
                Some(value) => {
                    log::trace!("stubbed call to '{}'", name);
                    Ok(value)
                }
                None => original.call(&receiver, args),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::JSObject;

    #[test]
    fn delegates_against_the_given_receiver() {
        let target = JSObject::new();
        target.insert("name", "window");
        let original = JSFunction::new("whoami", |this, _| match this {
            Value::Object(o) => o.get("name"),
            _ => Ok(Value::Undefined),
        });
        let recorder = RecordingWrapper::new();
        let wrapped = recorder.wrap(&PropertyKey::from("whoami"), &original, &Value::Object(target.clone()));
        assert_eq!(wrapped.call(&Value::Undefined, &[]).unwrap(), Value::from("window"));
        assert_eq!(recorder.call_count("whoami"), 1);
        assert_eq!(recorder.calls()[0].receiver, Value::Object(target));
    }

    #[test]
    fn stubs_short_circuit_but_still_record() {
        let original = JSFunction::new("confirm", |_, _| panic!("must not be called"));
        let recorder = RecordingWrapper::new();
        recorder.stub("confirm", true);
        let wrapped = recorder.wrap(&PropertyKey::from("confirm"), &original, &Value::Null);
        assert_eq!(wrapped.call(&Value::Null, &[Value::from("sure?")]).unwrap(), Value::from(true));
        let calls = recorder.calls_to("confirm");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args, vec![Value::from("sure?")]);

        recorder.clear();
        assert_eq!(recorder.call_count("confirm"), 0);
    }

    #[test]
    fn calls_are_keyed_by_property_not_function_name() {
        let anonymous = JSFunction::new("", |_, _| Ok(Value::from("real")));
        let recorder = RecordingWrapper::new();
        let alert = recorder.wrap(&PropertyKey::from("alert"), &anonymous, &Value::Null);
        let prompt = recorder.wrap(&PropertyKey::from("prompt"), &anonymous, &Value::Null);
        recorder.stub("alert", "stubbed");

        assert_eq!(alert.call(&Value::Null, &[]).unwrap(), Value::from("stubbed"));
        assert_eq!(prompt.call(&Value::Null, &[]).unwrap(), Value::from("real"));
        assert_eq!(recorder.call_count("alert"), 1);
        assert_eq!(recorder.call_count("prompt"), 1);
        assert_eq!(recorder.call_count(""), 0);
    }
}
