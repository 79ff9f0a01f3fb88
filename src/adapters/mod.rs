//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `events` - Event channel implementations (in-memory, Redis pub/sub)
//! - `registry` - Connection registry implementations (in-memory, Redis)
//! - `websocket` - Live connection transport and `ConnectionSender`
//! - `http` - Axum router and webhook endpoint

pub mod events;
pub mod http;
pub mod registry;
pub mod websocket;

pub use events::{InMemoryEventChannel, RedisEventChannel};
pub use registry::{InMemoryConnectionRegistry, RedisConnectionRegistry};
pub use websocket::ConnectionHub;
