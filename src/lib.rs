//! Distributed Key/Value Cluster Library
//!
//! This library crate defines the core modules of a small sharded, replicated,
//! in-memory key/value store. The binary (`main.rs`) only wires them together.
//!
//! ## Architecture Modules
//! - **`ring`**: The consistent-hashing ring. SHA-256 positions, virtual nodes and the
//!   clockwise walk that yields a key's replica set.
//! - **`coordinator`**: The single cluster authority. Owns the ring, tracks heartbeats,
//!   evicts silent nodes and answers "which nodes own this key?". It never stores data.
//! - **`node`**: A storage node. Serves reads and writes from local memory and pushes
//!   writes to the replicas named by the client.
//! - **`client`**: Resolves keys through the coordinator and fails over between replicas.
//! - **`transport`**: The one-request-per-connection line protocol shared by all of the above.
//! - **`config`** / **`error`**: Runtime settings and typed errors.

pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod node;
pub mod ring;
pub mod transport;
