//! The identity map.
//!
//! Every operation validates and classifies the key, consults the native
//! weak store when the map still has one, then falls through to the store
//! that fits the key:
//!
//! - ordinary objects carry their value in a hidden tagged property
//!   ([`tagged`]);
//! - window proxies, and objects that refuse the tag, go to an identity-scanned
//!   list ([`linear`]) that drops closed windows whenever a window key is
//!   touched. Closed windows are reported absent without asking any store.

mod linear;
mod tagged;

use crate::config::{MapOptions, NativeStorePolicy};
use crate::error::{IdentityMapError, NativeStoreError};
use crate::native::{NativeSlot, NativeStoreFactory, NativeWeakMap, StoreMode, WeakStore};
use crate::object::ObjectRef;
use crate::platform::{
    BrowserHost, Host, RandomProvider, TimeProvider, default_random_provider,
    default_time_provider,
};
use crate::prelude::*;
use crate::tag::InstanceTag;
use crate::value::Value;
use linear::LinearStore;
use tagged::TaggedStore;

/// Key-to-value map keyed by object identity.
///
/// # Example
///
/// ```
/// use cross_domain_weakmap::{IdentityMap, ObjectRef, Value};
///
/// let mut map = IdentityMap::new();
/// let o = Value::from(ObjectRef::new());
///
/// map.set(&o, 42).unwrap();
/// assert_eq!(map.get(&o).unwrap(), Some(42));
/// assert!(map.has(&o).unwrap());
///
/// map.delete(&o).unwrap();
/// assert_eq!(map.get(&o).unwrap(), None);
/// assert!(map.get(&Value::Null).is_err());
/// ```
pub struct IdentityMap<V, H = BrowserHost> {
    tag: InstanceTag,
    tagged: TaggedStore,
    native: NativeSlot<V>,
    linear: LinearStore<V>,
    host: H,
}

impl<V: Clone + 'static> IdentityMap<V, BrowserHost> {
    /// Create a map for a modern browser host
    pub fn new() -> Self {
        IdentityMapBuilder::new().build()
    }

    pub fn builder() -> IdentityMapBuilder<V, BrowserHost> {
        IdentityMapBuilder::new()
    }
}

impl<V: Clone + 'static> Default for IdentityMap<V, BrowserHost> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + 'static, H: Host> IdentityMap<V, H> {
    /// Create a map with default options for `host`
    pub fn with_host(host: H) -> Self {
        IdentityMapBuilder::new().host(host).build()
    }

    /// Name of the hidden property this map attaches to ordinary keys
    pub fn tag(&self) -> &InstanceTag {
        &self.tag
    }

    /// Storage tiers in use. Moves from `NativeBacked` to `FallbackOnly` at
    /// most once.
    pub fn mode(&self) -> StoreMode {
        self.native.mode()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    fn resolve_key(key: &Value) -> Result<&ObjectRef, IdentityMapError> {
        key.as_object().ok_or(IdentityMapError::InvalidKey {
            found: key.type_of(),
        })
    }

    /// Classify `obj`, purging closed windows first when it is window-like
    fn enter(&mut self, obj: &ObjectRef) -> KeyClass {
        if !self.host.is_window_like(obj) {
            return KeyClass::Ordinary;
        }
        self.purge_closed_windows();
        if self.host.is_closed_window(obj) {
            KeyClass::ClosedWindow
        } else {
            KeyClass::Window
        }
    }

    fn purge_closed_windows(&mut self) {
        let host = &self.host;
        let native = &mut self.native;
        let removed = self.linear.purge(
            |key| host.is_window_like(key) && host.is_closed_window(key),
            |key| {
                let _ = native.attempt_quietly(|store| store.delete(key));
            },
        );
        if removed > 0 {
            log::trace!("{}: purged {} stale linear entries", self.tag, removed);
        }
    }

    pub fn set(&mut self, key: &Value, value: V) -> Result<(), IdentityMapError> {
        let obj = Self::resolve_key(key)?;
        let class = self.enter(obj);
        // Closed windows are already gone; any value stored now is unreachable
        if class == KeyClass::ClosedWindow {
            return Ok(());
        }

        let _ = self
            .native
            .attempt(&self.tag, |store| store.set(obj, value.clone()));

        if class == KeyClass::Window {
            self.linear.insert(obj, value, true);
        } else if let Err(err) = self.tagged.set(obj, value.clone()) {
            log::trace!(
                "{}: object {} refused tagging ({}), storing linearly",
                self.tag,
                obj.id(),
                err
            );
            self.linear.insert(obj, value, false);
        }
        Ok(())
    }

    pub fn get(&mut self, key: &Value) -> Result<Option<V>, IdentityMapError> {
        let obj = Self::resolve_key(key)?;
        let class = self.enter(obj);
        // The native store may still hold an entry whose purge failed
        if class == KeyClass::ClosedWindow {
            return Ok(None);
        }

        if let Some(Some(value)) = self.native.attempt(&self.tag, |store| store.get(obj)) {
            return Ok(Some(value));
        }

        if class == KeyClass::Window {
            return Ok(self.linear.get(obj).cloned());
        }
        Ok(self
            .tagged
            .get(obj)
            .or_else(|| self.linear.get(obj).cloned()))
    }

    pub fn has(&mut self, key: &Value) -> Result<bool, IdentityMapError> {
        let obj = Self::resolve_key(key)?;
        let class = self.enter(obj);
        if class == KeyClass::ClosedWindow {
            return Ok(false);
        }

        if let Some(true) = self.native.attempt(&self.tag, |store| store.has(obj)) {
            return Ok(true);
        }

        if class == KeyClass::Window {
            return Ok(self.linear.contains(obj));
        }
        Ok(self.tagged.has::<V>(obj) || self.linear.contains(obj))
    }

    pub fn delete(&mut self, key: &Value) -> Result<(), IdentityMapError> {
        let obj = Self::resolve_key(key)?;
        let class = self.enter(obj);

        let _ = self.native.attempt(&self.tag, |store| store.delete(obj));

        if class == KeyClass::Ordinary {
            self.tagged.delete::<V>(obj);
        }
        self.linear.remove(obj);
        Ok(())
    }
}

/// How an operation treats its key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyClass {
    Ordinary,
    Window,
    ClosedWindow,
}

impl<V, H> fmt::Debug for IdentityMap<V, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityMap")
            .field("tag", &self.tag)
            .field("mode", &self.native.mode())
            .finish_non_exhaustive()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Configures and builds an [`IdentityMap`]
pub struct IdentityMapBuilder<V, H = BrowserHost> {
    host: H,
    options: MapOptions,
    time: Option<Box<dyn TimeProvider>>,
    random: Option<Box<dyn RandomProvider>>,
    native_factory: Option<NativeStoreFactory<V>>,
}

impl<V: Clone + 'static> IdentityMapBuilder<V, BrowserHost> {
    pub fn new() -> Self {
        Self {
            host: BrowserHost::new(),
            options: MapOptions::default(),
            time: None,
            random: None,
            native_factory: None,
        }
    }
}

impl<V: Clone + 'static> Default for IdentityMapBuilder<V, BrowserHost> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + 'static, H: Host> IdentityMapBuilder<V, H> {
    /// Replace the host collaborators
    pub fn host<H2: Host>(self, host: H2) -> IdentityMapBuilder<V, H2> {
        IdentityMapBuilder {
            host,
            options: self.options,
            time: self.time,
            random: self.random,
            native_factory: self.native_factory,
        }
    }

    pub fn options(mut self, options: MapOptions) -> Self {
        self.options = options;
        self
    }

    pub fn time_provider(mut self, provider: impl TimeProvider + 'static) -> Self {
        self.time = Some(Box::new(provider));
        self
    }

    pub fn random_provider(mut self, provider: impl RandomProvider + 'static) -> Self {
        self.random = Some(Box::new(provider));
        self
    }

    /// Use `factory` instead of the built-in [`NativeWeakMap`].
    ///
    /// The factory only runs when the host reports a native weak store and
    /// the options allow one. If it fails the map starts in fallback mode.
    pub fn native_store<F>(mut self, factory: F) -> Self
    where
        F: FnOnce() -> Result<Box<dyn WeakStore<V>>, NativeStoreError> + 'static,
    {
        self.native_factory = Some(Box::new(factory));
        self
    }

    pub fn build(self) -> IdentityMap<V, H> {
        let time = self.time.unwrap_or_else(default_time_provider);
        let mut random = self.random.unwrap_or_else(default_random_provider);
        let tag = InstanceTag::generate(time.as_ref(), random.as_mut());

        let native = acquire_native(&self.host, &self.options, self.native_factory, &tag);

        IdentityMap {
            tagged: TaggedStore::new(&tag),
            tag,
            native,
            linear: LinearStore::new(),
            host: self.host,
        }
    }
}

fn acquire_native<V: Clone + 'static, H: Host>(
    host: &H,
    options: &MapOptions,
    factory: Option<NativeStoreFactory<V>>,
    tag: &InstanceTag,
) -> NativeSlot<V> {
    if options.native_store == NativeStorePolicy::Disabled || !host.has_native_weak_store() {
        return NativeSlot::FallbackOnly;
    }

    let store = match factory {
        Some(factory) => factory(),
        None => Ok(Box::new(NativeWeakMap::<V>::with_options(
            options.native_accepts_windows,
            options.native_sweep_threshold,
        )) as Box<dyn WeakStore<V>>),
    };

    match store {
        Ok(store) => NativeSlot::Backed(store),
        Err(err) => {
            log::debug!("{}: native weak store unavailable ({})", tag, err);
            NativeSlot::FallbackOnly
        }
    }
}
