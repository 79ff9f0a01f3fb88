//! Domain layer containing verification logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (timestamps, errors, event envelope)
//! - `webhook` - Inbound request model and signature verification
//! - `broadcast` - Payment events, connections, and delivery outcomes

pub mod broadcast;
pub mod foundation;
pub mod webhook;
