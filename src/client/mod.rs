//! Client Library
//!
//! Resolves keys through the coordinator and talks to storage nodes directly.
//!
//! ## Core Concepts
//! - **Two Hops**: Every operation first asks the coordinator for the key's replica set,
//!   then sends the data request to a node of that set. The coordinator never carries data.
//! - **Failover**: Members of the set are tried in order (primary first). A node that cannot
//!   be reached is skipped; a node that answers ends the attempt, including `NOT_FOUND`.
//! - **Replica Lists**: Writes carry the rest of the set so the receiving node can push the
//!   change to the other replicas.

pub mod kv_client;

pub use kv_client::KvClient;
