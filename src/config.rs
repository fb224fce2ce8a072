//! Map configuration

use crate::error::ConfigError;
use crate::native::DEFAULT_SWEEP_THRESHOLD;
use serde::{Deserialize, Serialize};

/// Whether a new map should try to acquire a native weak store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeStorePolicy {
    /// Use the native store whenever the host reports one
    #[default]
    Auto,
    /// Never use a native store; tagged and linear storage only
    Disabled,
}

/// Tunables for [`IdentityMap`](crate::IdentityMap) construction.
///
/// Every field has a default, so partial JSON documents are accepted:
///
/// ```
/// use cross_domain_weakmap::{MapOptions, NativeStorePolicy};
///
/// let options = MapOptions::from_json(r#"{ "native_store": "disabled" }"#).unwrap();
/// assert_eq!(options.native_store, NativeStorePolicy::Disabled);
/// assert!(!options.native_accepts_windows);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapOptions {
    pub native_store: NativeStorePolicy,
    /// Let the built-in native store weakly hold window proxies
    pub native_accepts_windows: bool,
    /// Entries the built-in native store tracks before sweeping dead keys
    pub native_sweep_threshold: usize,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            native_store: NativeStorePolicy::Auto,
            native_accepts_windows: false,
            native_sweep_threshold: DEFAULT_SWEEP_THRESHOLD,
        }
    }
}

impl MapOptions {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
