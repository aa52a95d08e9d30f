#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum JSError {
    #[error("Could not find '{what}' in the proxy map")]
    NotRegistered { what: String },

    #[error("Cannot override non-configurable descriptor for '{key}'")]
    NotConfigurable { key: String },

    #[error("Cannot directly set '{key}', because it is a non-configurable and non-writable property")]
    NonWritable { key: String },

    #[error("Cannot create proxy with a non-object as target: {what}")]
    NotAnObject { what: String },

    #[error("Type error: {message}")]
    TypeError { message: String },

    #[error("Thrown: {message} (at {method})")]
    Thrown { message: String, method: String },
}

impl JSError {
    /// True for the precondition failures raised when a test tries to shadow
    /// or redefine a frozen property of the wrapped object.
    pub fn is_descriptor_violation(&self) -> bool {
        matches!(self, JSError::NotConfigurable { .. } | JSError::NonWritable { .. })
    }
}

#[macro_export]
macro_rules! raise_type_error {
    ($msg:expr) => {
        $crate::JSError::TypeError { message: $msg.to_string() }
    };
}

// Builds a `Thrown` error tagged with the calling function. A macro is used
// so that the name resolves at the invocation site.
#[macro_export]
macro_rules! throw_here {
    ($msg:expr) => {
        $crate::JSError::Thrown {
            message: $msg.to_string(),
            method: $crate::function_name!().to_string(),
        }
    };
}

#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        // remove the trailing "::f"
        &name[..name.len() - 3]
    }};
}
