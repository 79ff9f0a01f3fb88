//! Payment Fanout - verified payment webhooks delivered to live subscribers
//!
//! This crate ingests signed payment-provider webhooks, verifies them (generic
//! HMAC or provider timestamped signatures with replay protection), publishes
//! them to a pub/sub channel, and fans each event out to every live WebSocket
//! connection, pruning connections the transport reports as gone.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
