//! Linear store for keys that cannot carry a tag.
//!
//! Keys and values live in two index-aligned vectors searched by identity.
//! Window keys are held strongly and only leave through `remove` or a purge.
//! Any other key is held weakly; its entry is dropped once the key dies.

use crate::object::{ObjectRef, WeakObjectRef};
use crate::prelude::*;

/// How an entry refers to its key
enum LinearKey {
    Strong(ObjectRef),
    Weak(WeakObjectRef),
}

impl LinearKey {
    fn is(&self, obj: &ObjectRef) -> bool {
        match self {
            LinearKey::Strong(key) => ObjectRef::ptr_eq(key, obj),
            // A dead weak key keeps its allocation, so the address cannot be reused
            LinearKey::Weak(key) => key.points_to(obj),
        }
    }

    fn upgrade(&self) -> Option<ObjectRef> {
        match self {
            LinearKey::Strong(key) => Some(key.clone()),
            LinearKey::Weak(key) => key.upgrade(),
        }
    }
}

pub(crate) struct LinearStore<V> {
    keys: Vec<LinearKey>,
    values: Vec<V>,
}

impl<V> LinearStore<V> {
    pub(crate) fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
        }
    }

    #[inline]
    fn position(&self, key: &ObjectRef) -> Option<usize> {
        self.keys.iter().position(|k| k.is(key))
    }

    pub(crate) fn contains(&self, key: &ObjectRef) -> bool {
        self.position(key).is_some()
    }

    pub(crate) fn get(&self, key: &ObjectRef) -> Option<&V> {
        self.position(key).and_then(|index| self.values.get(index))
    }

    /// Overwrite the value for `key`, or append a new entry.
    ///
    /// `strong` pins the key until it is removed or purged. Appending also
    /// drops entries whose weak key already died.
    pub(crate) fn insert(&mut self, key: &ObjectRef, value: V, strong: bool) {
        if let Some(slot) = self.position(key).and_then(|index| self.values.get_mut(index)) {
            *slot = value;
            return;
        }

        self.purge(|_| false, |_| {});
        self.keys.push(if strong {
            LinearKey::Strong(key.clone())
        } else {
            LinearKey::Weak(key.downgrade())
        });
        self.values.push(value);
        debug_assert_eq!(self.keys.len(), self.values.len());
    }

    /// Remove the entry for `key`. Returns whether one existed.
    pub(crate) fn remove(&mut self, key: &ObjectRef) -> bool {
        let Some(index) = self.position(key) else {
            return false;
        };
        self.keys.remove(index);
        self.values.remove(index);
        debug_assert_eq!(self.keys.len(), self.values.len());
        true
    }

    /// Drop every entry whose key died or satisfies `is_stale`, compacting
    /// in place.
    ///
    /// `on_purge` sees each live key dropped by `is_stale` before it is
    /// released. Returns the number of dropped entries.
    pub(crate) fn purge(
        &mut self,
        mut is_stale: impl FnMut(&ObjectRef) -> bool,
        mut on_purge: impl FnMut(&ObjectRef),
    ) -> usize {
        if self.keys.is_empty() {
            return 0;
        }

        let mut keep = Vec::with_capacity(self.keys.len());
        self.keys.retain(|key| {
            let stale = match key.upgrade() {
                None => true,
                Some(obj) if is_stale(&obj) => {
                    on_purge(&obj);
                    true
                }
                Some(_) => false,
            };
            keep.push(!stale);
            !stale
        });

        let removed = keep.iter().filter(|kept| !**kept).count();
        if removed > 0 {
            let mut keep = keep.into_iter();
            self.values.retain(|_| keep.next().unwrap_or(true));
        }
        debug_assert_eq!(self.keys.len(), self.values.len());
        removed
    }
}
