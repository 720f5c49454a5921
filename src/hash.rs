//! Hash containers used by the registry and id resolvers.
//!
//! Built on *hashbrown* and *foldhash*. `TypeId` keyed tables use a
//! pass-through hasher, since a `TypeId` already is a high quality hash.

use core::any::TypeId;
use core::hash::{BuildHasher, Hasher};

use foldhash::fast::{FixedState, FoldHasher};

// -----------------------------------------------------------------------------
// FixedHashState

/// A fixed hash seed, so results depend only on the input.
const FIXED_HASH_STATE: FixedState = FixedState::with_seed(0x51C6_37A4_0E92_D1B5);

/// Fixed hash state based upon a random but fixed seed.
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FoldHasher<'static>;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        FIXED_HASH_STATE.build_hasher()
    }
}

// -----------------------------------------------------------------------------
// NoOpHashState

/// A no-op hasher that passes the written value through as the hash.
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHasher {
    hash: u64,
}

impl Hasher for NoOpHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes.iter().rev() {
            self.hash = self.hash.rotate_left(8).wrapping_add(*byte as u64);
        }
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.hash = i;
    }
}

/// Build state for [`NoOpHasher`].
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHashState;

impl BuildHasher for NoOpHashState {
    type Hasher = NoOpHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        NoOpHasher { hash: 0 }
    }
}

// -----------------------------------------------------------------------------
// Aliases

/// The standard hash map of this crate.
pub type HashMap<K, V> = hashbrown::HashMap<K, V, FixedHashState>;

/// The standard hash set of this crate.
pub type HashSet<T> = hashbrown::HashSet<T, FixedHashState>;

/// A map keyed by [`TypeId`], skipping the hashing step.
pub type TypeIdMap<V> = hashbrown::HashMap<TypeId, V, NoOpHashState>;

/// A set of [`TypeId`]s, skipping the hashing step.
pub type TypeIdSet = hashbrown::HashSet<TypeId, NoOpHashState>;
