//! Tagged-property store.
//!
//! Values for ordinary objects live on the key object itself, in a hidden
//! property named after the map's [`InstanceTag`]. The property holds a
//! `[key, value]` record; the record only counts when its key is the object
//! the lookup started from, which rules out records inherited through the
//! prototype chain and same-named properties written by anyone else.

use crate::error::PropertyError;
use crate::object::{ObjectRef, Property, PropertyKey, PropertyValue, WeakObjectRef};
use crate::prelude::*;
use crate::tag::InstanceTag;

/// The `[key, value]` pair stored under the tag.
///
/// The key is weak so the record does not keep its own object alive.
struct TaggedRecord<V> {
    key: Option<WeakObjectRef>,
    value: Option<V>,
}

type RecordCell<V> = RefCell<TaggedRecord<V>>;

pub(crate) struct TaggedStore {
    key: PropertyKey,
}

impl TaggedStore {
    pub(crate) fn new(tag: &InstanceTag) -> Self {
        Self {
            key: tag.property_key(),
        }
    }

    /// The record visible from `obj`, if it belongs to `obj`
    fn record<V: 'static>(&self, obj: &ObjectRef) -> Option<Rc<RecordCell<V>>> {
        let Ok(Some(PropertyValue::Internal(slot))) = obj.get_property(&self.key) else {
            return None;
        };
        let record = slot.downcast::<RecordCell<V>>().ok()?;
        let owned = record
            .borrow()
            .key
            .as_ref()
            .is_some_and(|key| key.points_to(obj));
        owned.then_some(record)
    }

    /// Store `value` on `obj`.
    ///
    /// Fails when the host refuses the property, e.g. on non-extensible
    /// objects; nothing is written in that case.
    pub(crate) fn set<V: 'static>(&self, obj: &ObjectRef, value: V) -> Result<(), PropertyError> {
        if let Some(record) = self.record::<V>(obj) {
            record.borrow_mut().value = Some(value);
            return Ok(());
        }

        let record: Rc<RecordCell<V>> = Rc::new(RefCell::new(TaggedRecord {
            key: Some(obj.downgrade()),
            value: Some(value),
        }));
        obj.define_property(self.key.clone(), Property::hidden(record))
    }

    pub(crate) fn get<V: Clone + 'static>(&self, obj: &ObjectRef) -> Option<V> {
        self.record::<V>(obj)
            .and_then(|record| record.borrow().value.clone())
    }

    pub(crate) fn has<V: 'static>(&self, obj: &ObjectRef) -> bool {
        self.record::<V>(obj).is_some()
    }

    /// Clear the record in place. The property itself stays on the object.
    pub(crate) fn delete<V: 'static>(&self, obj: &ObjectRef) -> bool {
        let Some(record) = self.record::<V>(obj) else {
            return false;
        };
        let mut record = record.borrow_mut();
        record.key = None;
        record.value = None;
        true
    }
}
