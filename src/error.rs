//! Error types for the identity map and the host object model

use crate::prelude::*;
use thiserror::Error;

/// Error surfaced by the public `set`/`get`/`has`/`delete` operations.
///
/// Only invalid keys cross the public boundary. Every other internal fault is
/// absorbed by falling back to another storage tier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityMapError {
    /// The key was `undefined`, `null`, or a primitive without identity
    #[error("InvalidKey: identity map expected an object key, got {found}")]
    InvalidKey { found: &'static str },
}

/// Failure reported by a native weak store.
///
/// Never returned to callers of the map; the first one permanently switches
/// the map to fallback storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NativeStoreError {
    /// The store cannot weakly hold this kind of key
    #[error("unsupported weak key: {reason}")]
    UnsupportedKey { reason: &'static str },

    /// The host has no weak store to hand out
    #[error("native weak store unavailable")]
    Unavailable,

    /// Any other failure raised by the host primitive
    #[error("native weak store failure: {0}")]
    Host(String),
}

/// Failure to define or write a property on a host object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    #[error("TypeError: cannot define property {key}, object is not extensible")]
    NotExtensible { key: String },

    #[error("TypeError: cannot redefine read-only property {key}")]
    ReadOnly { key: String },

    #[error("SecurityError: blocked access to property {key} on a cross-origin window")]
    CrossOrigin { key: String },
}

/// Error parsing [`MapOptions`](crate::MapOptions) from JSON.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ConfigError: {message} at {line}:{column}")]
    Json {
        message: String,
        line: usize,
        column: usize,
    },
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}
