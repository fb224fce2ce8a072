//! Instance tags
//!
//! Every map names its hidden property `__weakmap_<salt>__<counter>`. The
//! counter is process-wide and strictly increasing, seeded once from the wall
//! clock, so two maps never share a tag even when their salts collide.

use crate::object::PropertyKey;
use crate::platform::{RandomProvider, TimeProvider};
use crate::prelude::*;
use core::sync::atomic::{AtomicU64, Ordering};
use serde::{Serialize, Serializer};

/// Clock seeds are reduced modulo this before use
const COUNTER_SEED_MODULUS: u64 = 1_000_000_000;

/// Upper bound (exclusive) of the random salt
const SALT_RANGE: f64 = 1e9;

/// 0 means "not yet seeded"
static TAG_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Advance the process-wide counter, seeding it on first use.
fn next_counter(time: &dyn TimeProvider) -> u64 {
    // +1 keeps a zero clock distinguishable from the unseeded state
    let seed = time.now_millis().unsigned_abs() % COUNTER_SEED_MODULUS + 1;
    let _ = TAG_COUNTER.compare_exchange(0, seed, Ordering::Relaxed, Ordering::Relaxed);
    TAG_COUNTER.fetch_add(1, Ordering::Relaxed) + 1
}

/// Process-unique name of an identity map's hidden property
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceTag(Rc<str>);

impl InstanceTag {
    pub fn generate(time: &dyn TimeProvider, random: &mut dyn RandomProvider) -> Self {
        let counter = next_counter(time);
        // Truncates toward zero; the product is always below u32::MAX
        let salt = (random.random() * SALT_RANGE) as u32;
        InstanceTag(Rc::from(format!("__weakmap_{}__{}", salt, counter).as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Property key the tagged store writes under
    pub fn property_key(&self) -> PropertyKey {
        PropertyKey::from(self.0.clone())
    }
}

impl Serialize for InstanceTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl fmt::Display for InstanceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
