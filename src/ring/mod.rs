//! Consistent Hashing Module
//!
//! Maps keys and storage nodes onto a circular 256-bit position space (SHA-256).
//!
//! ## Core Concepts
//! - **Virtual Nodes**: Each physical node occupies `V` positions (`host:port:i`), which
//!   evens out the key distribution when only a handful of nodes are alive.
//! - **Lookup**: A key is owned by the first position at or after its own, walking
//!   clockwise and wrapping past the top of the ring.
//! - **Replica Sets**: The walk keeps going until `N` *distinct* physical nodes are found;
//!   the first one is the primary, the rest are replicas.
//!
//! Adding or removing a node only moves the keys on the arcs it gains or loses
//! (roughly `1/N` of the keyspace), unlike `hash % N` placement.

pub mod hashring;
pub mod types;

#[cfg(test)]
mod tests;
