//! Storage backends for identities, revocation records and cached lookups

pub mod memory;
#[cfg(feature = "redis-store")]
pub mod redis;
pub mod seed;
pub mod traits;
pub mod ttl_cache;

// Re-export the storage interfaces and default backends
pub use memory::{MemoryIdentityStore, MemoryRevocationStore};
#[cfg(feature = "redis-store")]
pub use self::redis::RedisRevocationStore;
pub use seed::{SeedData, SeedReport};
pub use traits::{IdentityStore, RevocationStore, SharedIdentityStore, SharedRevocationStore};
pub use ttl_cache::{CacheEntry, TtlCache};
