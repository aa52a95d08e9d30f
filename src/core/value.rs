use crate::core::{JSObject, ObjectOps};
use crate::{InterceptingProxy, JSError};
use std::rc::Rc;

type NativeFn = dyn Fn(&Value, &[Value]) -> Result<Value, JSError>;

struct FunctionData {
    name: String,
    func: Box<NativeFn>,
}

/// A host-provided callable. Functions are opaque: they carry no property
/// table and compare by identity.
#[derive(Clone)]
pub struct JSFunction(Rc<FunctionData>);

impl JSFunction {
    pub fn new(name: impl Into<String>, func: impl Fn(&Value, &[Value]) -> Result<Value, JSError> + 'static) -> Self {
        JSFunction(Rc::new(FunctionData {
            name: name.into(),
            func: Box::new(func),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Invoke with an explicit receiver, like `Function.prototype.call`.
    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value, JSError> {
        log::trace!("call function '{}' with {} args", self.0.name, args.len());
        (self.0.func)(this, args)
    }

    pub fn ptr_eq(&self, other: &JSFunction) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for JSFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[Function: {}]", self.0.name)
    }
}

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Object(JSObject),
    Function(JSFunction),
    Proxy(InterceptingProxy),
}

impl Value {
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) | Value::Proxy(_) => "object",
            Value::Function(_) => "function",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// Non-null objects that carry a property table, i.e. what a nested
    /// interception proxy can wrap.
    pub fn is_object_like(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Proxy(_))
    }

    pub fn as_object_ops(&self) -> Option<&dyn ObjectOps> {
        match self {
            Value::Object(obj) => Some(obj),
            Value::Proxy(proxy) => Some(proxy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&JSObject> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&JSFunction> {
        match self {
            Value::Function(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_proxy(&self) -> Option<&InterceptingProxy> {
        match self {
            Value::Proxy(proxy) => Some(proxy),
            _ => None,
        }
    }

    pub fn to_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Object(_) | Value::Function(_) | Value::Proxy(_) => true,
        }
    }

    /// `SameValue`: primitives by value (NaN equals NaN), everything else by identity.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => (a.is_nan() && b.is_nan()) || (a == b && a.is_sign_negative() == b.is_sign_negative()),
            _ => self == other,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Proxy(a), Value::Proxy(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

pub fn value_to_string(val: &Value) -> String {
    match val {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Number(n) => {
            if n.is_nan() {
                "NaN".to_string()
            } else if n.is_infinite() {
                if *n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
            } else if *n == 0.0 {
                "0".to_string()
            } else if n.fract() == 0.0 && n.abs() < 1e21 {
                format!("{n:.0}")
            } else {
                n.to_string()
            }
        }
        Value::String(s) => s.clone(),
        Value::Object(_) | Value::Proxy(_) => "[object Object]".to_string(),
        Value::Function(func) => format!("function {}() {{ [native code] }}", func.name()),
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&value_to_string(self))
    }
}

// Objects are printed by address only; their graphs may be cyclic.
impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => write!(f, "Boolean({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Object(obj) => write!(f, "Object({:p})", obj.as_ptr()),
            Value::Function(func) => write!(f, "Function({})", func.name()),
            Value::Proxy(proxy) => write!(f, "Proxy({:p})", proxy.as_ptr()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<JSObject> for Value {
    fn from(obj: JSObject) -> Self {
        Value::Object(obj)
    }
}

impl From<JSFunction> for Value {
    fn from(func: JSFunction) -> Self {
        Value::Function(func)
    }
}

impl From<InterceptingProxy> for Value {
    fn from(proxy: InterceptingProxy) -> Self {
        Value::Proxy(proxy)
    }
}
