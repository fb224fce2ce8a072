//! Platform abstraction traits for no_std compatibility.
//!
//! The identity map never asks the environment anything directly. Window
//! classification, closure detection and native weak store availability come
//! from a [`Host`]; clock and randomness for instance tags come from
//! [`TimeProvider`] and [`RandomProvider`].

#[cfg(feature = "std")]
mod std_impl;

#[cfg(feature = "std")]
pub use std_impl::{StdRandomProvider, StdTimeProvider};

use crate::object::ObjectRef;
use crate::prelude::*;

// ═══════════════════════════════════════════════════════════════════════════════
// Host collaborators
// ═══════════════════════════════════════════════════════════════════════════════

/// Capabilities of the embedding environment consumed by the identity map.
pub trait Host {
    /// Whether `obj` is a window proxy that cannot carry attached properties.
    fn is_window_like(&self, obj: &ObjectRef) -> bool;

    /// Whether a window-like handle now refers to a closed browsing context.
    /// Once this returns true for a handle it must keep returning true.
    fn is_closed_window(&self, obj: &ObjectRef) -> bool;

    /// Whether a native weak-reference-keyed map can be constructed.
    fn has_native_weak_store(&self) -> bool;
}

impl<H: Host + ?Sized> Host for Rc<H> {
    fn is_window_like(&self, obj: &ObjectRef) -> bool {
        (**self).is_window_like(obj)
    }

    fn is_closed_window(&self, obj: &ObjectRef) -> bool {
        (**self).is_closed_window(obj)
    }

    fn has_native_weak_store(&self) -> bool {
        (**self).has_native_weak_store()
    }
}

/// Host backed by the crate's own object model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowserHost {
    native_weak_store: bool,
}

impl BrowserHost {
    /// A modern host with a native weak map
    pub fn new() -> Self {
        Self {
            native_weak_store: true,
        }
    }

    /// A legacy host without a native weak map
    pub fn legacy() -> Self {
        Self {
            native_weak_store: false,
        }
    }
}

impl Default for BrowserHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for BrowserHost {
    fn is_window_like(&self, obj: &ObjectRef) -> bool {
        obj.is_window()
    }

    fn is_closed_window(&self, obj: &ObjectRef) -> bool {
        obj.as_window().is_some_and(|handle| handle.is_closed())
    }

    fn has_native_weak_store(&self) -> bool {
        self.native_weak_store
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Time and randomness
// ═══════════════════════════════════════════════════════════════════════════════

/// Trait for providing wall-clock time.
///
/// In std environments, this is implemented using `SystemTime`.
/// In no_std environments, the host must provide an implementation.
pub trait TimeProvider {
    /// Get the current time as milliseconds since Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Trait for providing random number generation.
///
/// In std environments, this uses a time-seeded xorshift generator.
/// In no_std environments, the host must provide an implementation.
pub trait RandomProvider {
    /// Generate a random f64 in the range [0, 1).
    fn random(&mut self) -> f64;
}

/// A no-op time provider that returns constant values.
/// Used as a fallback in no_std environments when the host doesn't provide time.
pub struct NoOpTimeProvider;

impl TimeProvider for NoOpTimeProvider {
    fn now_millis(&self) -> i64 {
        0
    }
}

/// A no-op random provider that returns a constant value.
/// Used as a fallback in no_std environments when the host doesn't provide randomness.
pub struct NoOpRandomProvider;

impl RandomProvider for NoOpRandomProvider {
    fn random(&mut self) -> f64 {
        // Return 0.5 as a predictable fallback
        0.5
    }
}

/// Default time provider for the enabled feature set
pub fn default_time_provider() -> Box<dyn TimeProvider> {
    #[cfg(feature = "std")]
    {
        Box::new(StdTimeProvider::new())
    }
    #[cfg(not(feature = "std"))]
    {
        Box::new(NoOpTimeProvider)
    }
}

/// Default random provider for the enabled feature set
pub fn default_random_provider() -> Box<dyn RandomProvider> {
    #[cfg(feature = "std")]
    {
        Box::new(StdRandomProvider::new())
    }
    #[cfg(not(feature = "std"))]
    {
        Box::new(NoOpRandomProvider)
    }
}
