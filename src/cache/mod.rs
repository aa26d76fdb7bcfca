//! Client-side response cache.
//!
//! - Entries are keyed by a serialized query and expire after a TTL (5 minutes)
//! - The whole map is mirrored to local storage on every change and rehydrated at start
//! - Mutating actions invalidate keys (or everything) so lists are refetched

mod layer;
mod store;
mod traits;

pub use layer::CacheLayer;
pub use store::{ResourceCache, DEFAULT_TTL};
#[cfg(test)]
pub use traits::ManualClock;
pub use traits::{CacheEntry, CacheResult, CacheSource, CacheStore, Clock, QueryKey, SystemClock};
