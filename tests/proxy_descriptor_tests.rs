use window_mock::{InterceptingProxy, JSError, JSFunction, JSObject, PropertyDescriptor, ProxyOptions, Value};

// Initialize logger for this integration test binary so `RUST_LOG` is honored.
// Using `ctor` ensures initialization runs before tests start.
#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

#[test]
fn define_supersedes_an_existing_override() {
    let target = JSObject::new();
    let proxy = InterceptingProxy::new(target, ProxyOptions::default()).unwrap();
    proxy.set("status", "override").unwrap();
    let getter = JSFunction::new("get status", |_, _| Ok(Value::from("from getter")));
    proxy
        .define_property("status", PropertyDescriptor::new_accessor(Some(Value::Function(getter)), None, true, true))
        .unwrap();
    assert_eq!(proxy.get("status").unwrap(), Value::from("from getter"));
    assert!(proxy.config().holder_get("status").is_none());
}

#[test]
fn define_on_non_configurable_target_property_fails() {
    let target = JSObject::new();
    target
        .define_own_property("pinned", &PropertyDescriptor::new_data(1, true, true, false))
        .unwrap();
    let proxy = InterceptingProxy::new(target, ProxyOptions::default()).unwrap();
    let err = proxy
        .define_property("pinned", PropertyDescriptor::new_data(2, true, true, true))
        .unwrap_err();
    assert_eq!(err, JSError::NotConfigurable { key: "pinned".to_string() });
    assert!(proxy.config().descriptor("pinned").is_none());
    assert_eq!(proxy.get("pinned").unwrap(), Value::from(1));
}

#[test]
fn define_leaves_the_target_untouched() {
    let target = JSObject::new();
    target.insert("color", "red");
    let proxy = InterceptingProxy::new(target.clone(), ProxyOptions::default()).unwrap();
    proxy.define_property("color", PropertyDescriptor::new_data("blue", true, false, true)).unwrap();
    assert_eq!(proxy.get("color").unwrap(), Value::from("blue"));
    assert_eq!(target.get("color").unwrap(), Value::from("red"));
    assert!(target.get_own_property_descriptor("color").unwrap().enumerable == Some(true));
}

#[test]
fn own_descriptor_prefers_installed_descriptor() {
    let target = JSObject::new();
    target.insert("color", "red");
    let proxy = InterceptingProxy::new(target, ProxyOptions::default()).unwrap();

    let from_target = proxy.get_own_property_descriptor("color").unwrap().unwrap();
    assert_eq!(from_target, PropertyDescriptor::new_data("red", true, true, true));

    let installed = PropertyDescriptor::new_data("blue", false, false, true);
    proxy.define_property("color", installed.clone()).unwrap();
    assert_eq!(proxy.get_own_property_descriptor("color").unwrap(), Some(installed));

    assert_eq!(proxy.get_own_property_descriptor("nothing").unwrap(), None);
}

#[test]
fn own_descriptor_ignores_plain_overrides() {
    let target = JSObject::new();
    let proxy = InterceptingProxy::new(target, ProxyOptions::default()).unwrap();
    proxy.set("plain", 1).unwrap();
    assert_eq!(proxy.get_own_property_descriptor("plain").unwrap(), None);
}

#[test]
fn descriptor_only_key_is_reported_by_has() {
    let target = JSObject::new();
    let proxy = InterceptingProxy::new(target.clone(), ProxyOptions::default()).unwrap();
    assert!(!proxy.has("virtual").unwrap());
    proxy.define_property("virtual", PropertyDescriptor::new_data(0, true, true, true)).unwrap();
    assert!(proxy.has("virtual").unwrap());
    assert!(!target.has("virtual"));
    proxy.reset();
    assert!(!proxy.has("virtual").unwrap());
}

#[test]
fn descriptor_object_form_can_be_installed() {
    let proxy = InterceptingProxy::new(JSObject::new(), ProxyOptions::default()).unwrap();
    let shape = JSObject::new();
    shape.insert("value", 42).insert("writable", true);
    let desc = PropertyDescriptor::from_object(&shape).unwrap();
    proxy.define_property("answer", desc).unwrap();
    assert!(proxy.set("answer", 43).unwrap());
    assert_eq!(proxy.get("answer").unwrap(), Value::from(43));
    let reflected = proxy.get_own_property_descriptor("answer").unwrap().unwrap().to_object();
    assert_eq!(reflected.get("value").unwrap(), Value::from(43));
    assert_eq!(reflected.get("configurable").unwrap(), Value::from(false));
}
