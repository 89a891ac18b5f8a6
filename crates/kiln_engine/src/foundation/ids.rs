//! Identifier generation
//!
//! Entities, components and scenes get their ids from an injected
//! [`IdGenerator`] instead of a process-wide counter, so tests can supply
//! deterministic ids.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of unique 64-bit identifiers
pub trait IdGenerator: Send + Sync {
    /// Produce the next identifier. Never returns the same value twice.
    fn next_id(&self) -> u64;
}

/// Shared handle to an id generator
pub type IdSource = Arc<dyn IdGenerator>;

/// Create the default id source used when none is injected
pub fn default_id_source() -> IdSource {
    Arc::new(RandomIds::new())
}

/// Deterministic generator counting up from a start value
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    /// Create a generator whose first id is `start`
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    /// Convenience: a shared sequential source starting at 1
    pub fn shared() -> IdSource {
        Arc::new(Self::starting_at(1))
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Generator mixing wall-clock time and randomness into a per-instance base,
/// then counting up from it.
///
/// Two instances collide only if their random bases land within the number of
/// ids either one hands out.
#[derive(Debug)]
pub struct RandomIds {
    base: u64,
    counter: AtomicU64,
}

impl RandomIds {
    /// Create a generator with a fresh random base
    pub fn new() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self {
            base: (millis << 20) ^ fastrand::u64(..),
            counter: AtomicU64::new(0),
        }
    }
}

impl Default for RandomIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for RandomIds {
    fn next_id(&self) -> u64 {
        self.base
            .wrapping_add(self.counter.fetch_add(1, Ordering::Relaxed))
    }
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw id value
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Draw a new id from a generator
            pub fn generate(ids: &dyn IdGenerator) -> Self {
                Self(ids.next_id())
            }

            /// The raw id value
            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of an entity, unique for the process lifetime
    EntityId,
    "entity"
);
define_id!(
    /// Identifier of an attached component
    ComponentId,
    "component"
);
define_id!(
    /// Identifier of a scene
    SceneId,
    "scene"
);
