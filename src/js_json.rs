//! Conversion between `serde_json` documents and host values.
//!
//! Fixtures for wrapped objects (a browser-like `window`, a `location`
//! record, ...) are easiest to declare as JSON. Arrays become array-like
//! objects with index keys and a `length`.

use crate::core::{JSObject, PropertyKey, Value};
use crate::{JSError, raise_type_error};

const MAX_DEPTH: usize = 256;

pub fn value_from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => {
            let obj = JSObject::new();
            for (i, item) in items.iter().enumerate() {
                obj.insert(i.to_string(), value_from_json(item));
            }
            obj.insert("length", Value::Number(items.len() as f64));
            obj.borrow_mut().set_non_enumerable(PropertyKey::from("length"));
            Value::Object(obj)
        }
        serde_json::Value::Object(map) => {
            let obj = JSObject::new();
            for (k, v) in map {
                obj.insert(k.as_str(), value_from_json(v));
            }
            Value::Object(obj)
        }
    }
}

/// Build a plain object from a JSON object document.
pub fn object_from_json(json: &serde_json::Value) -> Result<JSObject, JSError> {
    match value_from_json(json) {
        Value::Object(obj) if json.is_object() => Ok(obj),
        other => Err(raise_type_error!(format!("expected a JSON object, got {}", other.type_of()))),
    }
}

/// Snapshot what a reader sees through `value`, following the object
/// protocol (so a proxy reports its overrides). Functions and `undefined`
/// are skipped like `JSON.stringify` does; symbol keys are ignored.
pub fn value_to_json(value: &Value) -> Result<serde_json::Value, JSError> {
    let mut ancestors = Vec::new();
    to_json_inner(value, &mut ancestors)
}

// A proxy is identified by the object it ultimately wraps: nested proxies
// over the same target are fresh instances, but walking them revisits it.
fn identity(value: &Value) -> Option<*const ()> {
    match value {
        Value::Object(obj) => Some(obj.as_ptr()),
        Value::Proxy(proxy) => identity(proxy.original()),
        _ => None,
    }
}

fn to_json_inner(value: &Value, ancestors: &mut Vec<*const ()>) -> Result<serde_json::Value, JSError> {
    Ok(match value {
        Value::Undefined | Value::Function(_) | Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => serde_json::Value::from(*n as i64),
        Value::Number(n) => serde_json::Number::from_f64(*n).map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Object(_) | Value::Proxy(_) => {
            let Some(ops) = value.as_object_ops() else {
                return Ok(serde_json::Value::Null);
            };
            if let Some(id) = identity(value) {
                if ancestors.contains(&id) {
                    return Err(raise_type_error!("Converting circular structure to JSON"));
                }
                if ancestors.len() >= MAX_DEPTH {
                    return Err(raise_type_error!(format!("JSON nesting exceeds {MAX_DEPTH} levels")));
                }
                ancestors.push(id);
            }
            let mut map = serde_json::Map::new();
            for key in ops.own_keys()? {
                let PropertyKey::String(name) = &key else { continue };
                let enumerable = ops.get_own_property_descriptor(&key)?.and_then(|d| d.enumerable).unwrap_or(true);
                if !enumerable {
                    continue;
                }
                let item = ops.get(&key)?;
                if item.is_undefined() || item.is_callable() {
                    continue;
                }
                map.insert(name.clone(), to_json_inner(&item, ancestors)?);
            }
            ancestors.pop();
            serde_json::Value::Object(map)
        }
    })
}
