//! Error types shared across the coordinator, storage nodes and client.

use std::time::Duration;
use thiserror::Error;

/// A request line that could not be understood. Rendered to the peer as
/// `ERROR <message>`; the server keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Invalid command")]
    Empty,
    #[error("Unknown command {0}")]
    UnknownCommand(String),
    #[error("Invalid {0} format")]
    InvalidFormat(&'static str),
    #[error("Invalid address {0}")]
    InvalidAddress(String),
    #[error("Request too large")]
    RequestTooLarge,
    #[error("Invalid encoding")]
    InvalidEncoding,
}

/// Failure to complete one request/response exchange with a peer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("i/o with {addr} failed: {source}")]
    Io {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("request to {addr} timed out after {after:?}")]
    Timeout { addr: String, after: Duration },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no nodes available")]
    NoNodesAvailable,
    #[error("coordinator error: {0}")]
    Coordinator(String),
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("invalid {0}: {1}")]
    InvalidInput(&'static str, String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
