pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod js_json;
pub(crate) mod js_mock;
pub(crate) mod js_proxy;
pub(crate) mod proxy_config;
pub(crate) mod registry;

pub use crate::core::{
    JSFunction, JSObject, JSObjectData, ObjectOps, PropertyDescriptor, PropertyKey, PropertySlot, SymbolData, Value,
    validate_descriptor_for_define, value_to_string,
};
pub use error::JSError;
pub use js_json::{object_from_json, value_from_json, value_to_json};
pub use js_mock::{CallRecord, RecordingWrapper, WrapCallable};
pub use js_proxy::{InterceptingProxy, create_intercepting_proxy};
pub use proxy_config::{Descriptors, Holder, ProxyConfig, ProxyOptions, ResetGuard};
pub use registry::{get_config, live_proxy_count};
