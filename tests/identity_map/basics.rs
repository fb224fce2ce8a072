//! Core set/get/has/delete behaviour on ordinary keys

use super::{init_logging, maps, object};
use cross_domain_weakmap::{IdentityMap, ObjectRef, StoreMode, Value};

#[test]
fn test_scenario_set_get_has_delete() {
    for (host, mut map) in maps() {
        let (_o, o) = object();

        map.set(&o, 42).unwrap();
        assert_eq!(map.get(&o).unwrap(), Some(42), "{host}");
        assert!(map.has(&o).unwrap(), "{host}");

        map.delete(&o).unwrap();
        assert_eq!(map.get(&o).unwrap(), None, "{host}");
        assert!(!map.has(&o).unwrap(), "{host}");
    }
}

#[test]
fn test_unknown_key_is_absent() {
    for (host, mut map) in maps() {
        let (_o, o) = object();
        assert_eq!(map.get(&o).unwrap(), None, "{host}");
        assert!(!map.has(&o).unwrap(), "{host}");
    }
}

#[test]
fn test_distinct_keys_independent_of_order() {
    for (host, mut map) in maps() {
        let (_a, a) = object();
        let (_b, b) = object();
        map.set(&a, 1).unwrap();
        map.set(&b, 2).unwrap();
        assert_eq!(map.get(&a).unwrap(), Some(1), "{host}");
        assert_eq!(map.get(&b).unwrap(), Some(2), "{host}");
    }

    for (host, mut map) in maps() {
        let (_a, a) = object();
        let (_b, b) = object();
        map.set(&b, 2).unwrap();
        map.set(&a, 1).unwrap();
        assert_eq!(map.get(&a).unwrap(), Some(1), "{host}");
        assert_eq!(map.get(&b).unwrap(), Some(2), "{host}");
    }
}

#[test]
fn test_set_is_idempotent() {
    for (host, mut map) in maps() {
        let (_o, o) = object();
        map.set(&o, 7).unwrap();
        map.set(&o, 7).unwrap();
        assert_eq!(map.get(&o).unwrap(), Some(7), "{host}");
        assert!(map.has(&o).unwrap(), "{host}");
    }
}

#[test]
fn test_overwrite() {
    for (host, mut map) in maps() {
        let (_o, o) = object();
        map.set(&o, 1).unwrap();
        map.set(&o, 2).unwrap();
        assert_eq!(map.get(&o).unwrap(), Some(2), "{host}");
    }
}

#[test]
fn test_set_after_delete() {
    for (host, mut map) in maps() {
        let (_o, o) = object();
        map.set(&o, 1).unwrap();
        map.delete(&o).unwrap();
        map.set(&o, 3).unwrap();
        assert_eq!(map.get(&o).unwrap(), Some(3), "{host}");
    }
}

#[test]
fn test_delete_missing_key_is_noop() {
    for (host, mut map) in maps() {
        let (_a, a) = object();
        let (_b, b) = object();
        map.set(&a, 1).unwrap();
        map.delete(&b).unwrap();
        map.delete(&b).unwrap();
        assert_eq!(map.get(&a).unwrap(), Some(1), "{host}");
        assert!(!map.has(&b).unwrap(), "{host}");
    }
}

#[test]
fn test_identity_not_structure() {
    for (host, mut map) in maps() {
        let a = ObjectRef::new();
        let b = ObjectRef::new();
        for obj in [&a, &b] {
            obj.set_property("x".into(), Value::from(1)).unwrap();
        }

        map.set(&Value::from(&a), 1).unwrap();
        assert!(!map.has(&Value::from(&b)).unwrap(), "{host}");
        // A second handle to the same object is the same key
        assert_eq!(map.get(&Value::from(a.clone())).unwrap(), Some(1), "{host}");
    }
}

#[test]
fn test_maps_are_independent() {
    for (host, mut first) in maps() {
        let mut second: IdentityMap<i32> = IdentityMap::with_host(*first.host());
        let (_o, o) = object();

        first.set(&o, 1).unwrap();
        assert!(!second.has(&o).unwrap(), "{host}");

        second.set(&o, 2).unwrap();
        assert_eq!(first.get(&o).unwrap(), Some(1), "{host}");
        assert_eq!(second.get(&o).unwrap(), Some(2), "{host}");

        first.delete(&o).unwrap();
        assert_eq!(second.get(&o).unwrap(), Some(2), "{host}");
    }
}

#[test]
fn test_ordinary_keys_keep_native_store() {
    init_logging();
    let mut map: IdentityMap<i32> = IdentityMap::new();
    let (_o, o) = object();
    map.set(&o, 1).unwrap();
    map.get(&o).unwrap();
    map.has(&o).unwrap();
    map.delete(&o).unwrap();
    assert_eq!(map.mode(), StoreMode::NativeBacked);
}

#[test]
fn test_non_copy_values() {
    let mut map: IdentityMap<String> = IdentityMap::new();
    let (_o, o) = object();
    map.set(&o, "payload".to_string()).unwrap();
    assert_eq!(map.get(&o).unwrap().as_deref(), Some("payload"));
}

#[test]
fn test_object_values() {
    let mut map: IdentityMap<Value> = IdentityMap::new();
    let (_o, o) = object();
    let target = ObjectRef::new();
    map.set(&o, Value::from(&target)).unwrap();
    assert_eq!(map.get(&o).unwrap(), Some(Value::from(&target)));
}

#[test]
fn test_value_does_not_outlive_dropped_key_in_native_store() {
    let mut map: IdentityMap<i32> = IdentityMap::new();
    let obj = ObjectRef::new();
    let weak = obj.downgrade();
    map.set(&Value::from(&obj), 1).unwrap();

    drop(obj);
    assert!(!weak.is_alive());
}
