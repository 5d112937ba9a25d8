//! Coordinator Module
//!
//! The cluster's routing authority. Owns the hash ring and a heartbeat table, both
//! behind a single lock, and answers "which nodes own this key?".
//!
//! ## Core Mechanisms
//! - **Registration**: Nodes upsert themselves with `REGISTER_NODE`; re-registering is harmless.
//! - **Heartbeats**: `HEARTBEAT` only refreshes a timestamp. Unknown senders are told to re-register.
//! - **Failure Detection**: A reaper task evicts any node silent for longer than the eviction
//!   timeout. There is no gossip; eviction is visible to every lookup that follows it.
//! - **Routing**: `GET_NODES_FOR_KEY` returns the key's replica set in ring order, primary first.

pub mod handlers;
pub mod protocol;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;
