//! Native weak store
//!
//! The optional fast path of the identity map. A [`WeakStore`] reports every
//! failure as a value; [`NativeSlot`] turns the first failure into a
//! permanent switch to fallback storage.

use crate::error::NativeStoreError;
use crate::object::{ObjectId, ObjectRef, WeakObjectRef};
use crate::prelude::*;
use crate::tag::InstanceTag;
use serde::{Deserialize, Serialize};

/// Default number of tracked entries before dead keys are swept
pub const DEFAULT_SWEEP_THRESHOLD: usize = 64;

/// A weak-reference-keyed map supplied by the host.
///
/// Implementations must not keep keys alive. Any `Err` makes the owning
/// identity map stop using the store for the rest of its life.
pub trait WeakStore<V> {
    fn set(&mut self, key: &ObjectRef, value: V) -> Result<(), NativeStoreError>;

    fn get(&mut self, key: &ObjectRef) -> Result<Option<V>, NativeStoreError>;

    fn has(&mut self, key: &ObjectRef) -> Result<bool, NativeStoreError>;

    /// Returns whether an entry was removed
    fn delete(&mut self, key: &ObjectRef) -> Result<bool, NativeStoreError>;
}

/// Produces the native store for a new identity map
pub type NativeStoreFactory<V> =
    Box<dyn FnOnce() -> Result<Box<dyn WeakStore<V>>, NativeStoreError>>;

// ═══════════════════════════════════════════════════════════════════════════════
// NativeWeakMap - the host object model's weak map
// ═══════════════════════════════════════════════════════════════════════════════

struct NativeEntry<V> {
    key: WeakObjectRef,
    value: V,
}

/// Weak map over host objects.
///
/// Entries hold a [`WeakObjectRef`] to their key; entries whose key died are
/// dropped by an amortised sweep once the table doubles past the last sweep.
/// Window proxies are rejected unless the map was built to accept them.
pub struct NativeWeakMap<V> {
    entries: FxHashMap<ObjectId, NativeEntry<V>>,
    accepts_windows: bool,
    sweep_threshold: usize,
    next_sweep: usize,
}

impl<V: Clone> NativeWeakMap<V> {
    pub fn new() -> Self {
        Self::with_options(false, DEFAULT_SWEEP_THRESHOLD)
    }

    pub fn with_options(accepts_windows: bool, sweep_threshold: usize) -> Self {
        let sweep_threshold = sweep_threshold.max(1);
        Self {
            entries: fx_map_new(),
            accepts_windows,
            sweep_threshold,
            next_sweep: sweep_threshold,
        }
    }

    /// Entries currently tracked, including ones whose key already died
    pub fn tracked(&self) -> usize {
        self.entries.len()
    }

    /// Drop entries whose key is no longer alive. Returns how many were dropped.
    pub fn sweep(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.key.is_alive());
        self.next_sweep = (self.entries.len() * 2).max(self.sweep_threshold);
        before - self.entries.len()
    }

    fn check_key(&self, key: &ObjectRef) -> Result<(), NativeStoreError> {
        if key.is_window() && !self.accepts_windows {
            return Err(NativeStoreError::UnsupportedKey {
                reason: "cross-origin window proxies cannot be weakly held",
            });
        }
        Ok(())
    }

    fn entry(&self, key: &ObjectRef) -> Option<&NativeEntry<V>> {
        self.entries
            .get(&key.id())
            .filter(|entry| entry.key.points_to(key))
    }
}

impl<V: Clone> Default for NativeWeakMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> WeakStore<V> for NativeWeakMap<V> {
    fn set(&mut self, key: &ObjectRef, value: V) -> Result<(), NativeStoreError> {
        self.check_key(key)?;
        self.entries.insert(
            key.id(),
            NativeEntry {
                key: key.downgrade(),
                value,
            },
        );
        if self.entries.len() >= self.next_sweep {
            self.sweep();
        }
        Ok(())
    }

    fn get(&mut self, key: &ObjectRef) -> Result<Option<V>, NativeStoreError> {
        self.check_key(key)?;
        Ok(self.entry(key).map(|entry| entry.value.clone()))
    }

    fn has(&mut self, key: &ObjectRef) -> Result<bool, NativeStoreError> {
        self.check_key(key)?;
        Ok(self.entry(key).is_some())
    }

    fn delete(&mut self, key: &ObjectRef) -> Result<bool, NativeStoreError> {
        self.check_key(key)?;
        Ok(self.entries.remove(&key.id()).is_some())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NativeSlot - degrade-once wrapper
// ═══════════════════════════════════════════════════════════════════════════════

/// Which storage tiers an identity map is currently using
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreMode {
    /// Native weak store first, fallback stores as well
    NativeBacked,
    /// Tagged-property and linear stores only. Terminal.
    FallbackOnly,
}

pub(crate) enum NativeSlot<V> {
    Backed(Box<dyn WeakStore<V>>),
    FallbackOnly,
}

impl<V> NativeSlot<V> {
    pub(crate) fn mode(&self) -> StoreMode {
        match self {
            NativeSlot::Backed(_) => StoreMode::NativeBacked,
            NativeSlot::FallbackOnly => StoreMode::FallbackOnly,
        }
    }

    /// Run `op` against the native store.
    ///
    /// Returns `None` when there is no store or when `op` failed; a failure
    /// discards the store for good.
    pub(crate) fn attempt<R>(
        &mut self,
        tag: &InstanceTag,
        op: impl FnOnce(&mut Box<dyn WeakStore<V>>) -> Result<R, NativeStoreError>,
    ) -> Option<R> {
        let NativeSlot::Backed(store) = self else {
            return None;
        };
        match op(store) {
            Ok(result) => Some(result),
            Err(err) => {
                log::debug!(
                    "{}: native weak store failed ({}), using fallback storage only",
                    tag,
                    err
                );
                *self = NativeSlot::FallbackOnly;
                None
            }
        }
    }

    /// Like [`attempt`](Self::attempt) but a failure is ignored and the store kept.
    pub(crate) fn attempt_quietly<R>(
        &mut self,
        op: impl FnOnce(&mut Box<dyn WeakStore<V>>) -> Result<R, NativeStoreError>,
    ) -> Option<R> {
        match self {
            NativeSlot::Backed(store) => op(store).ok(),
            NativeSlot::FallbackOnly => None,
        }
    }
}
