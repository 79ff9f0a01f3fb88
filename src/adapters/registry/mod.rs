//! Connection registry adapters.
//!
//! - `InMemoryConnectionRegistry` - Process-local, for tests and single-node runs
//! - `RedisConnectionRegistry` - Shared keyed store with conditional writes

mod in_memory;
mod redis;

pub use in_memory::InMemoryConnectionRegistry;
pub use self::redis::{RedisConnectionRegistry, DEFAULT_RECORD_TTL};
