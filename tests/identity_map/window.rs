//! Window proxy keys: linear storage and closed-window purging

use super::{init_logging, object, window};
use cross_domain_weakmap::{
    BrowserHost, Host, IdentityMap, MapOptions, NativeStoreError, NativeWeakMap, ObjectId,
    ObjectRef, StoreMode, Value, WeakStore,
};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

fn map() -> IdentityMap<&'static str> {
    init_logging();
    IdentityMap::new()
}

#[test]
fn test_scenario_window_lifecycle() {
    let mut map = map();
    let (popup, w) = window("https://login.example");

    map.set(&w, "v").unwrap();
    assert_eq!(map.get(&w).unwrap(), Some("v"));
    assert!(map.has(&w).unwrap());

    popup.close();
    assert!(!map.has(&w).unwrap());
    assert_eq!(map.get(&w).unwrap(), None);
}

#[test]
fn test_window_key_never_tagged() {
    let mut map = map();
    let (popup, w) = window("https://login.example");
    map.set(&w, "v").unwrap();
    assert!(popup.own_keys().is_empty());
}

#[test]
fn test_first_window_op_degrades_default_native_store() {
    let mut map = map();
    let (_o, o) = object();
    let (_popup, w) = window("https://login.example");

    map.set(&o, "before").unwrap();
    assert_eq!(map.mode(), StoreMode::NativeBacked);

    assert!(!map.has(&w).unwrap());
    assert_eq!(map.mode(), StoreMode::FallbackOnly);

    // Entries written while native-backed are still reachable
    assert_eq!(map.get(&o).unwrap(), Some("before"));
}

#[test]
fn test_purge_releases_closed_windows() {
    let mut map = map();
    let (first, w1) = window("https://a.example");
    let (_second, w2) = window("https://b.example");

    map.set(&w1, "a").unwrap();
    let weak = first.downgrade();
    first.close();
    drop(first);
    drop(w1);
    assert!(weak.is_alive());

    // Any operation on another window key sweeps closed ones
    assert!(!map.has(&w2).unwrap());
    assert!(!weak.is_alive());
}

#[test]
fn test_ordinary_operations_do_not_purge() {
    let mut map = map();
    let (first, w1) = window("https://a.example");
    let (_o, o) = object();

    map.set(&w1, "a").unwrap();
    let weak = first.downgrade();
    first.close();
    drop(first);
    drop(w1);

    map.set(&o, "x").unwrap();
    map.get(&o).unwrap();
    map.has(&o).unwrap();
    map.delete(&o).unwrap();
    assert!(weak.is_alive());
}

#[test]
fn test_open_windows_survive_purge() {
    let mut map = map();
    let windows: Vec<_> = (0..4)
        .map(|i| window(&format!("https://w{i}.example")))
        .collect();
    let values = ["w0", "w1", "w2", "w3"];
    for ((_, w), value) in windows.iter().zip(values) {
        map.set(w, value).unwrap();
    }

    windows[1].0.close();
    windows[2].0.close();

    assert_eq!(map.get(&windows[0].1).unwrap(), Some("w0"));
    assert_eq!(map.get(&windows[3].1).unwrap(), Some("w3"));
    assert!(!map.has(&windows[1].1).unwrap());
    assert!(!map.has(&windows[2].1).unwrap());
}

#[test]
fn test_delete_window_key() {
    let mut map = map();
    let (_popup, w) = window("https://a.example");
    map.set(&w, "v").unwrap();
    map.delete(&w).unwrap();
    assert!(!map.has(&w).unwrap());

    map.set(&w, "again").unwrap();
    assert_eq!(map.get(&w).unwrap(), Some("again"));
}

#[test]
fn test_native_store_that_accepts_windows() {
    init_logging();
    let mut map: IdentityMap<&str> = IdentityMap::builder()
        .options(MapOptions {
            native_accepts_windows: true,
            ..MapOptions::default()
        })
        .build();
    let (popup, w) = window("https://a.example");
    let (_other, w2) = window("https://b.example");

    map.set(&w, "v").unwrap();
    assert_eq!(map.get(&w).unwrap(), Some("v"));
    assert_eq!(map.mode(), StoreMode::NativeBacked);

    popup.close();
    assert!(!map.has(&w2).unwrap());
    // Purged from the native store too, not only from the linear list
    assert!(!map.has(&w).unwrap());
    assert_eq!(map.get(&w).unwrap(), None);
    assert_eq!(map.mode(), StoreMode::NativeBacked);
}

/// Window-capable native store whose deletions always throw
struct UndeletableStore(NativeWeakMap<i32>);

impl WeakStore<i32> for UndeletableStore {
    fn set(&mut self, key: &ObjectRef, value: i32) -> Result<(), NativeStoreError> {
        self.0.set(key, value)
    }

    fn get(&mut self, key: &ObjectRef) -> Result<Option<i32>, NativeStoreError> {
        self.0.get(key)
    }

    fn has(&mut self, key: &ObjectRef) -> Result<bool, NativeStoreError> {
        self.0.has(key)
    }

    fn delete(&mut self, _key: &ObjectRef) -> Result<bool, NativeStoreError> {
        Err(NativeStoreError::Host("delete threw".into()))
    }
}

#[test]
fn test_closed_window_absent_when_native_delete_fails() {
    init_logging();
    let mut map: IdentityMap<i32> = IdentityMap::builder()
        .native_store(|| {
            Ok(Box::new(UndeletableStore(NativeWeakMap::with_options(true, 64)))
                as Box<dyn WeakStore<i32>>)
        })
        .build();
    let (popup, w) = window("https://a.example");
    let (_other, w2) = window("https://b.example");

    map.set(&w, 7).unwrap();
    assert_eq!(map.get(&w).unwrap(), Some(7));

    popup.close();
    assert!(!map.has(&w).unwrap());
    assert_eq!(map.get(&w).unwrap(), None);
    assert!(!map.has(&w2).unwrap());
    assert_eq!(map.get(&w).unwrap(), None);

    // Purge-time deletions fail quietly
    assert_eq!(map.mode(), StoreMode::NativeBacked);
}

#[test]
fn test_set_on_closed_window_is_dropped() {
    let mut map = map();
    let (popup, w) = window("https://a.example");
    popup.close();

    map.set(&w, "late").unwrap();
    assert!(!map.has(&w).unwrap());
    assert_eq!(map.get(&w).unwrap(), None);
}

/// Host that treats registered ordinary objects as window proxies
#[derive(Default)]
struct PopupRegistry {
    windows: RefCell<HashSet<ObjectId>>,
    closed: RefCell<HashSet<ObjectId>>,
}

impl PopupRegistry {
    fn open(&self, obj: &ObjectRef) {
        self.windows.borrow_mut().insert(obj.id());
    }

    fn close(&self, obj: &ObjectRef) {
        self.closed.borrow_mut().insert(obj.id());
    }
}

impl Host for PopupRegistry {
    fn is_window_like(&self, obj: &ObjectRef) -> bool {
        self.windows.borrow().contains(&obj.id())
    }

    fn is_closed_window(&self, obj: &ObjectRef) -> bool {
        self.closed.borrow().contains(&obj.id())
    }

    fn has_native_weak_store(&self) -> bool {
        false
    }
}

#[test]
fn test_custom_host_classification() {
    init_logging();
    let registry = Rc::new(PopupRegistry::default());
    let mut map: IdentityMap<i32, Rc<PopupRegistry>> = IdentityMap::with_host(registry.clone());

    let (popup, p) = object();
    let (plain, o) = object();
    registry.open(&popup);

    map.set(&p, 1).unwrap();
    map.set(&o, 2).unwrap();
    assert!(popup.own_keys().is_empty());
    assert_eq!(plain.own_keys().len(), 1);

    registry.close(&popup);
    // Closure is only observed on window-keyed operations
    map.get(&o).unwrap();
    assert!(!map.has(&p).unwrap());
    assert_eq!(map.get(&o).unwrap(), Some(2));
}

#[test]
fn test_modern_and_legacy_hosts_agree_on_windows() {
    init_logging();
    for host in [BrowserHost::new(), BrowserHost::legacy()] {
        let mut map: IdentityMap<i32> = IdentityMap::with_host(host);
        let (popup, w) = window("https://a.example");
        map.set(&w, 1).unwrap();
        assert_eq!(map.get(&w).unwrap(), Some(1));
        popup.close();
        assert_eq!(map.get(&w).unwrap(), None);
        assert_eq!(map.mode(), StoreMode::FallbackOnly);
    }
}

#[test]
fn test_window_value_is_a_plain_value() {
    let mut map: IdentityMap<Value> = IdentityMap::new();
    let (popup, w) = window("https://a.example");
    map.set(&w, Value::from(&popup)).unwrap();
    assert_eq!(map.get(&w).unwrap(), Some(w.clone()));
}
