//! Integration tests for the identity map, organized by feature
//!
//! These tests exercise the map through the public API only. Most properties
//! are checked against both a modern host (native weak store available) and a
//! legacy host (fallback storage from the start).
//!
//! Set `RUST_LOG=trace` to see store downgrades and window purges.

mod basics;
mod window;

use cross_domain_weakmap::{BrowserHost, IdentityMap, ObjectRef, Value};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One map per host flavour
pub fn maps() -> Vec<(&'static str, IdentityMap<i32>)> {
    init_logging();
    vec![
        ("modern", IdentityMap::with_host(BrowserHost::new())),
        ("legacy", IdentityMap::with_host(BrowserHost::legacy())),
    ]
}

/// A fresh ordinary object and its key value
pub fn object() -> (ObjectRef, Value) {
    let obj = ObjectRef::new();
    let key = Value::from(&obj);
    (obj, key)
}

/// A fresh window proxy and its key value
pub fn window(origin: &str) -> (ObjectRef, Value) {
    let win = ObjectRef::window(origin);
    let key = Value::from(&win);
    (win, key)
}
