//! Storage Node Module
//!
//! Holds a slice of the keyspace in memory and serves client reads and writes.
//!
//! ## Core Concepts
//! - **Local Store**: `LocalStore` is the node's only persistence; it dies with the process.
//! - **Replication**: On `PUT`/`DELETE` the node acts as primary and pushes `REPLICATE`/
//!   `REPLICATE_DELETE` to the replica list the client supplied. The client is answered as soon
//!   as the local write commits (availability over consistency).
//! - **Liveness**: Registers with the coordinator at start and heartbeats on an interval
//!   shorter than the coordinator's eviction timeout.
//! - **No Peer Awareness**: A node never tracks whether other nodes are alive; failed pushes
//!   are logged and dropped.

pub mod handlers;
pub mod heartbeat;
pub mod memory;
pub mod protocol;
pub mod replication;
pub mod service;
