//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Event Ports
//!
//! - `EventPublisher` - Hands verified events to the pub/sub channel
//! - `EventSubscriber` - Drives an `EventHandler` from the channel
//! - `EventHandler` - Handler that processes incoming events
//!
//! ## Connection Ports
//!
//! - `ConnectionRegistry` - Keyed store of live connections per instance
//! - `ConnectionSender` - Per-connection send primitive of the transport

mod connection_registry;
mod connection_sender;
mod event_publisher;
mod event_subscriber;

pub use connection_registry::{ConnectionRegistry, ConnectionRegistryError, InstanceId};
pub use connection_sender::ConnectionSender;
pub use event_publisher::{EventPublisher, PublishError};
pub use event_subscriber::{EventHandler, EventSubscriber, SubscribeError};
