//! Identity-keyed map for hostile browser-like hosts
//!
//! [`IdentityMap`] associates values with objects by identity and keeps
//! working when the host's native weak map is missing or throws, and when
//! keys are cross-origin window proxies that refuse attached properties and
//! can close at any moment.
//!
//! # Example
//!
//! ```
//! use cross_domain_weakmap::{IdentityMap, ObjectRef, StoreMode, Value};
//!
//! let mut map = IdentityMap::new();
//!
//! let obj = Value::from(ObjectRef::new());
//! let popup = ObjectRef::window("https://login.example");
//! let win = Value::from(&popup);
//!
//! map.set(&obj, "ordinary").unwrap();
//! map.set(&win, "window").unwrap();
//! assert_eq!(map.get(&obj).unwrap(), Some("ordinary"));
//!
//! // The default native store cannot hold window proxies, so the map
//! // permanently switched to its fallback stores.
//! assert_eq!(map.mode(), StoreMode::FallbackOnly);
//!
//! popup.close();
//! assert!(!map.has(&win).unwrap());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod config;
pub mod error;
pub mod map;
pub mod native;
pub mod object;
pub mod platform;
pub mod prelude;
pub mod tag;
pub mod value;

pub use config::{MapOptions, NativeStorePolicy};
pub use error::{ConfigError, IdentityMapError, NativeStoreError, PropertyError};
pub use map::{IdentityMap, IdentityMapBuilder};
pub use native::{NativeWeakMap, StoreMode, WeakStore};
pub use object::{ObjectId, ObjectRef, Property, PropertyKey, PropertyValue, WeakObjectRef};
pub use platform::{BrowserHost, Host, RandomProvider, TimeProvider};
pub use tag::InstanceTag;
pub use value::Value;
