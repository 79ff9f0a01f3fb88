//! Broadcast domain: the event being fanned out, the connections it goes to,
//! and the three-valued delivery outcome that drives pruning.

mod connection;
mod delivery;
mod payment_event;

pub use connection::{ConnectionId, ConnectionRecord};
pub use delivery::{BroadcastOutcome, DeliveryOutcome};
pub use payment_event::PaymentEvent;
