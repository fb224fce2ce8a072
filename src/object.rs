//! Host object model
//!
//! A minimal stand-in for a browser heap: objects with a stable identity, an
//! own property table, a prototype chain and extensibility flags, plus window
//! handles that refuse property access and can be closed at any time.

use crate::error::PropertyError;
use crate::prelude::*;
use crate::value::Value;
use core::sync::atomic::{AtomicU64, Ordering};

/// Next identity handed out by [`ObjectId::next`]. Ids are never reused.
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a host object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Object kinds
// ═══════════════════════════════════════════════════════════════════════════════

/// What sort of host object this is
#[derive(Debug)]
enum ObjectKind {
    /// Same-origin, mutable object
    Ordinary,
    /// Proxy for a browsing context, possibly cross-origin
    Window(WindowHandle),
}

/// State behind a window proxy.
///
/// Closing is driven from outside (the user closes a popup, a frame is
/// removed); the handle only observes it.
#[derive(Debug)]
pub struct WindowHandle {
    origin: Rc<str>,
    closed: Cell<bool>,
}

impl WindowHandle {
    fn new(origin: &str) -> Self {
        Self {
            origin: Rc::from(origin),
            closed: Cell::new(false),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Mark the window closed. Irreversible.
    pub fn close(&self) {
        self.closed.set(true);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Properties
// ═══════════════════════════════════════════════════════════════════════════════

/// Property name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyKey(Rc<str>);

impl PropertyKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        PropertyKey(Rc::from(s))
    }
}

impl From<Rc<str>> for PropertyKey {
    fn from(s: Rc<str>) -> Self {
        PropertyKey(s)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value stored in a property slot.
///
/// `Internal` slots carry embedder data that script-level code can see by
/// name but cannot interpret.
#[derive(Clone)]
pub enum PropertyValue {
    Data(Value),
    Internal(Rc<dyn Any>),
}

impl fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Data(value) => f.debug_tuple("Data").field(value).finish(),
            PropertyValue::Internal(_) => f.write_str("Internal(..)"),
        }
    }
}

/// Object property descriptor
#[derive(Debug, Clone)]
pub struct Property {
    pub value: PropertyValue,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl Property {
    /// A property as created by plain assignment
    pub fn data(value: Value) -> Self {
        Self {
            value: PropertyValue::Data(value),
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// A writable, non-enumerable, non-configurable internal slot
    pub fn hidden(slot: Rc<dyn Any>) -> Self {
        Self {
            value: PropertyValue::Internal(slot),
            writable: true,
            enumerable: false,
            configurable: false,
        }
    }

    pub fn with_attributes(
        value: PropertyValue,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    ) -> Self {
        Self {
            value,
            writable,
            enumerable,
            configurable,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Objects
// ═══════════════════════════════════════════════════════════════════════════════

/// Mutable part of a host object
#[derive(Debug)]
struct ObjectData {
    /// Prototype link
    prototype: Option<ObjectRef>,
    /// Whether the object can have properties added
    extensible: bool,
    /// Own properties in insertion order
    properties: IndexMap<PropertyKey, Property>,
}

impl ObjectData {
    fn new(prototype: Option<ObjectRef>) -> Self {
        Self {
            prototype,
            extensible: true,
            properties: index_map_new(),
        }
    }
}

/// A heap object owned through [`ObjectRef`]
pub struct HostObject {
    id: ObjectId,
    kind: ObjectKind,
    data: RefCell<ObjectData>,
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Prototypes are elided to keep cyclic graphs printable
        f.debug_struct("HostObject")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Strong, cheaply clonable reference to a host object.
///
/// Equality and hashing are by identity, never by contents.
#[derive(Clone)]
pub struct ObjectRef(Rc<HostObject>);

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ObjectRef {}

impl Hash for ObjectRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl Default for ObjectRef {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectRef {
    fn alloc(kind: ObjectKind, prototype: Option<ObjectRef>) -> Self {
        ObjectRef(Rc::new(HostObject {
            id: ObjectId::next(),
            kind,
            data: RefCell::new(ObjectData::new(prototype)),
        }))
    }

    /// Create a new ordinary object (`{}`)
    pub fn new() -> Self {
        Self::alloc(ObjectKind::Ordinary, None)
    }

    /// Create a new ordinary object inheriting from `prototype`
    pub fn with_prototype(prototype: &ObjectRef) -> Self {
        Self::alloc(ObjectKind::Ordinary, Some(prototype.clone()))
    }

    /// Create a window proxy for a browsing context at `origin`
    pub fn window(origin: &str) -> Self {
        Self::alloc(ObjectKind::Window(WindowHandle::new(origin)), None)
    }

    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    /// Check if two references point to the same object
    #[inline]
    pub fn ptr_eq(a: &ObjectRef, b: &ObjectRef) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    pub fn as_window(&self) -> Option<&WindowHandle> {
        match &self.0.kind {
            ObjectKind::Window(handle) => Some(handle),
            ObjectKind::Ordinary => None,
        }
    }

    pub fn is_window(&self) -> bool {
        self.as_window().is_some()
    }

    /// Close the window behind this proxy. No-op for ordinary objects.
    pub fn close(&self) {
        if let Some(handle) = self.as_window() {
            handle.close();
        }
    }

    pub fn downgrade(&self) -> WeakObjectRef {
        WeakObjectRef(Rc::downgrade(&self.0))
    }

    pub fn prototype(&self) -> Option<ObjectRef> {
        self.0.data.borrow().prototype.clone()
    }

    /// `Object.preventExtensions`
    pub fn prevent_extensions(&self) {
        self.0.data.borrow_mut().extensible = false;
    }

    /// `Object.seal`
    pub fn seal(&self) {
        let mut data = self.0.data.borrow_mut();
        data.extensible = false;
        for prop in data.properties.values_mut() {
            prop.configurable = false;
        }
    }

    /// `Object.freeze`
    pub fn freeze(&self) {
        let mut data = self.0.data.borrow_mut();
        data.extensible = false;
        for prop in data.properties.values_mut() {
            prop.configurable = false;
            prop.writable = false;
        }
    }

    fn cross_origin_guard(&self, key: &PropertyKey) -> Result<(), PropertyError> {
        if self.is_window() {
            return Err(PropertyError::CrossOrigin {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    /// Get an own property
    pub fn get_own_property(&self, key: &PropertyKey) -> Option<Property> {
        self.0.data.borrow().properties.get(key).cloned()
    }

    /// Check if object has own property
    pub fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.0.data.borrow().properties.contains_key(key)
    }

    /// Get a property, searching the prototype chain
    pub fn get_property(&self, key: &PropertyKey) -> Result<Option<PropertyValue>, PropertyError> {
        self.cross_origin_guard(key)?;

        let prototype = {
            let data = self.0.data.borrow();
            if let Some(prop) = data.properties.get(key) {
                return Ok(Some(prop.value.clone()));
            }
            data.prototype.clone()
        };

        match prototype {
            Some(proto) => proto.get_property(key),
            None => Ok(None),
        }
    }

    /// Read a data property by name, searching the prototype chain
    pub fn get(&self, key: &str) -> Option<Value> {
        match self.get_property(&PropertyKey::from(key)) {
            Ok(Some(PropertyValue::Data(value))) => Some(value),
            _ => None,
        }
    }

    /// Assign an own property (`obj.key = value` in strict code)
    pub fn set_property(&self, key: PropertyKey, value: Value) -> Result<(), PropertyError> {
        self.cross_origin_guard(&key)?;

        let mut data = self.0.data.borrow_mut();
        if let Some(prop) = data.properties.get_mut(&key) {
            if !prop.writable {
                return Err(PropertyError::ReadOnly {
                    key: key.to_string(),
                });
            }
            prop.value = PropertyValue::Data(value);
            return Ok(());
        }

        if !data.extensible {
            return Err(PropertyError::NotExtensible {
                key: key.to_string(),
            });
        }
        data.properties.insert(key, Property::data(value));
        Ok(())
    }

    /// Define a property with attributes (`Object.defineProperty`)
    pub fn define_property(&self, key: PropertyKey, prop: Property) -> Result<(), PropertyError> {
        self.cross_origin_guard(&key)?;

        let mut data = self.0.data.borrow_mut();
        if let Some(existing) = data.properties.get_mut(&key) {
            if !existing.configurable {
                // Non-configurable data properties only accept a new value,
                // and only while writable
                if !existing.writable {
                    return Err(PropertyError::ReadOnly {
                        key: key.to_string(),
                    });
                }
                existing.value = prop.value;
                existing.writable = prop.writable;
                return Ok(());
            }
            *existing = prop;
            return Ok(());
        }

        if !data.extensible {
            return Err(PropertyError::NotExtensible {
                key: key.to_string(),
            });
        }
        data.properties.insert(key, prop);
        Ok(())
    }

    /// Get own property keys in insertion order
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        self.0.data.borrow().properties.keys().cloned().collect()
    }

    /// Own keys visible to `Object.keys` and `for..in`
    pub fn enumerable_keys(&self) -> Vec<PropertyKey> {
        self.0
            .data
            .borrow()
            .properties
            .iter()
            .filter(|(_, prop)| prop.enumerable)
            .map(|(key, _)| key.clone())
            .collect()
    }
}

/// Non-owning reference to a host object
#[derive(Clone)]
pub struct WeakObjectRef(Weak<HostObject>);

impl WeakObjectRef {
    pub fn upgrade(&self) -> Option<ObjectRef> {
        self.0.upgrade().map(ObjectRef)
    }

    /// Check if the referenced object is still alive
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    /// Check if this refers to `obj` (identity, not contents)
    #[inline]
    pub fn points_to(&self, obj: &ObjectRef) -> bool {
        core::ptr::eq(self.0.as_ptr(), Rc::as_ptr(&obj.0))
    }
}

impl fmt::Debug for WeakObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(obj) => write!(f, "WeakObjectRef({})", obj.id()),
            None => f.write_str("WeakObjectRef(<dead>)"),
        }
    }
}
