#![no_main]

use cross_domain_weakmap::{BrowserHost, IdentityMap, MapOptions, ObjectRef, Value};
use libfuzzer_sys::fuzz_target;
use std::collections::HashMap;

const KEYS: usize = 8;

// Each input byte pair is one operation on a small pool of keys; the map must
// agree with a plain HashMap that forgets closed windows.
fuzz_target!(|data: &[u8]| {
    let Some((&setup, ops)) = data.split_first() else {
        return;
    };
    if ops.len() > 4096 {
        return;
    }

    let host = if setup & 1 == 0 {
        BrowserHost::new()
    } else {
        BrowserHost::legacy()
    };
    let options = MapOptions {
        native_accepts_windows: setup & 2 != 0,
        ..MapOptions::default()
    };
    let mut map: IdentityMap<u8> = IdentityMap::builder().host(host).options(options).build();

    let keys: Vec<ObjectRef> = (0..KEYS)
        .map(|i| match i % 4 {
            0 => ObjectRef::window(&format!("https://w{i}.example")),
            1 => {
                let obj = ObjectRef::new();
                obj.freeze();
                obj
            }
            _ => ObjectRef::new(),
        })
        .collect();
    let mut model: HashMap<usize, u8> = HashMap::new();

    for pair in ops.chunks_exact(2) {
        let (op, arg) = (pair[0], pair[1]);
        let index = (op as usize >> 3) % KEYS;
        let obj = &keys[index];
        let key = Value::from(obj);

        match op & 7 {
            0 | 1 => {
                map.set(&key, arg).unwrap();
                // Entries for already closed windows vanish on the next window lookup
                if !obj.as_window().is_some_and(|handle| handle.is_closed()) {
                    model.insert(index, arg);
                }
            }
            2 => assert_eq!(map.get(&key).unwrap(), model.get(&index).copied()),
            3 => assert_eq!(map.has(&key).unwrap(), model.contains_key(&index)),
            4 => {
                map.delete(&key).unwrap();
                model.remove(&index);
            }
            5 => {
                if let Some(handle) = obj.as_window() {
                    handle.close();
                    model.remove(&index);
                }
            }
            6 => assert!(map.get(&Value::Number(arg as f64)).is_err()),
            _ => assert!(map.set(&Value::Null, arg).is_err()),
        }
    }
});
