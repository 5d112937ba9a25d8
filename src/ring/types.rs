use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// Network identity of a storage node.
///
/// Ordering is by host, then numeric port. `LIST_NODES` uses this order, and
/// it also breaks ties when two virtual nodes land on the same ring position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeAddr {
    pub host: String,
    pub port: u16,
}

impl NodeAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Builds an address from the two protocol tokens `host port`.
    pub fn from_parts(host: &str, port: &str) -> Result<Self, ProtocolError> {
        let port = port
            .parse::<u16>()
            .map_err(|_| ProtocolError::InvalidAddress(format!("{}:{}", host, port)))?;
        if host.is_empty() {
            return Err(ProtocolError::InvalidAddress(format!(":{}", port)));
        }
        Ok(Self::new(host, port))
    }

    /// Parses a comma-separated `host:port,host:port` list.
    pub fn parse_list(text: &str) -> Result<Vec<Self>, ProtocolError> {
        text.split(',')
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect()
    }

    pub fn join_list(addrs: &[NodeAddr]) -> String {
        addrs
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for NodeAddr {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| ProtocolError::InvalidAddress(s.to_string()))?;
        Self::from_parts(host, port).map_err(|_| ProtocolError::InvalidAddress(s.to_string()))
    }
}

/// A point on the ring: the SHA-256 digest of a label read as a big-endian
/// 256-bit integer. Byte-wise ordering of the array is numeric ordering.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RingPosition([u8; 32]);

impl RingPosition {
    pub const MIN: RingPosition = RingPosition([0u8; 32]);

    pub fn of(label: &str) -> Self {
        let digest = Sha256::digest(label.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for RingPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The leading 6 bytes are enough to tell positions apart in logs.
        write!(f, "RingPosition(")?;
        for byte in &self.0[..6] {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, "..)")
    }
}

/// One of the `V` ring positions owned by a physical node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualNode {
    pub node: NodeAddr,
    pub replica_index: u32,
}

impl VirtualNode {
    pub fn new(node: NodeAddr, replica_index: u32) -> Self {
        Self {
            node,
            replica_index,
        }
    }

    pub fn label(&self) -> String {
        format!("{}:{}", self.node, self.replica_index)
    }

    pub fn position(&self) -> RingPosition {
        RingPosition::of(&self.label())
    }
}

/// Distinct physical nodes responsible for one key, in clockwise ring order.
/// The first entry is the primary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaSet {
    nodes: Vec<NodeAddr>,
}

impl ReplicaSet {
    pub fn new(nodes: Vec<NodeAddr>) -> Self {
        Self { nodes }
    }

    pub fn primary(&self) -> Option<&NodeAddr> {
        self.nodes.first()
    }

    pub fn replicas(&self) -> &[NodeAddr] {
        self.nodes.get(1..).unwrap_or(&[])
    }

    pub fn nodes(&self) -> &[NodeAddr] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn into_vec(self) -> Vec<NodeAddr> {
        self.nodes
    }
}
