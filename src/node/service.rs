use std::sync::Arc;

use super::memory::LocalStore;
use super::protocol::{NodeRequest, NodeResponse};
use super::replication::{ReplicaOp, Replicator};
use crate::error::ProtocolError;
use crate::ring::types::NodeAddr;
use crate::transport::fits_on_line;

/// Request handling for one storage node: the local store plus outbound replication.
pub struct NodeService {
    addr: NodeAddr,
    store: LocalStore,
    replicator: Replicator,
}

impl NodeService {
    pub fn new(addr: NodeAddr, replicator: Replicator) -> Arc<Self> {
        Arc::new(Self {
            addr,
            store: LocalStore::new(),
            replicator,
        })
    }

    pub fn addr(&self) -> &NodeAddr {
        &self.addr
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Applies a request locally. Writes commit before any replication is
    /// dispatched, and the reply never waits for replicas.
    pub fn handle_request(&self, request: NodeRequest) -> NodeResponse {
        match request {
            NodeRequest::Put {
                key,
                value,
                replicas,
            } => {
                let has_targets = !self.replicator.targets(&replicas).is_empty();
                if has_targets && !fits_on_line(&ReplicaOp::replicate_line(&key, &value)) {
                    tracing::warn!("[{}] PUT {} rejected: value too large to replicate", self.addr, key);
                    return NodeResponse::Error(ProtocolError::RequestTooLarge);
                }

                self.store.put(&key, &value);
                tracing::info!("[{}] PUT {}", self.addr, key);

                if has_targets {
                    let pushes = self.replicator.replicate(ReplicaOp::Put { key, value }, &replicas);
                    tracing::debug!("[{}] Dispatched {} replication push(es)", self.addr, pushes.len());
                }
                NodeResponse::Ok
            }
            NodeRequest::Get { key } => match self.store.get(&key) {
                Some(value) => {
                    tracing::debug!("[{}] GET {} hit", self.addr, key);
                    NodeResponse::Value(value)
                }
                None => {
                    tracing::debug!("[{}] GET {} = NOT_FOUND", self.addr, key);
                    NodeResponse::NotFound
                }
            },
            NodeRequest::Delete { key, replicas } => {
                if self.store.delete(&key).is_some() {
                    tracing::info!("[{}] DELETE {}", self.addr, key);
                } else {
                    tracing::info!("[{}] DELETE {} (not found)", self.addr, key);
                }

                if !replicas.is_empty() {
                    self.replicator.replicate(ReplicaOp::Delete { key }, &replicas);
                }
                NodeResponse::Ok
            }
            NodeRequest::Replicate { key, value } => {
                self.store.put(&key, &value);
                tracing::debug!("[{}] REPLICATE {}", self.addr, key);
                NodeResponse::Ok
            }
            NodeRequest::ReplicateDelete { key } => {
                self.store.delete(&key);
                tracing::debug!("[{}] REPLICATE_DELETE {}", self.addr, key);
                NodeResponse::Ok
            }
            NodeRequest::Info => NodeResponse::Info {
                addr: self.addr.clone(),
                keys: self.store.len(),
            },
        }
    }
}
