//! Primary-push Replication
//!
//! After a local write commits, the primary fires one task per replica target
//! and returns to the client without waiting. Each push is bounded by the
//! replication timeout; failures are logged and dropped. There is no retry,
//! no acknowledgement tracking and no ordering across replicas.

use std::time::Duration;
use tokio::task::JoinHandle;

use super::protocol::NodeRequest;
use crate::ring::types::NodeAddr;
use crate::transport::send_request;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicaOp {
    Put { key: String, value: String },
    Delete { key: String },
}

impl ReplicaOp {
    pub fn key(&self) -> &str {
        match self {
            Self::Put { key, .. } | Self::Delete { key } => key,
        }
    }

    /// The `REPLICATE` line a replica receives for a write of `key`.
    pub fn replicate_line(key: &str, value: &str) -> String {
        NodeRequest::Replicate {
            key: key.to_string(),
            value: value.to_string(),
        }
        .to_string()
    }

    fn to_request(&self) -> NodeRequest {
        match self {
            Self::Put { key, value } => NodeRequest::Replicate {
                key: key.clone(),
                value: value.clone(),
            },
            Self::Delete { key } => NodeRequest::ReplicateDelete { key: key.clone() },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Replicator {
    local: NodeAddr,
    timeout: Duration,
}

impl Replicator {
    pub fn new(local: NodeAddr, timeout: Duration) -> Self {
        Self { local, timeout }
    }

    /// Targets that will actually receive a push: self and duplicates removed.
    pub fn targets(&self, replicas: &[NodeAddr]) -> Vec<NodeAddr> {
        let mut targets: Vec<NodeAddr> = Vec::with_capacity(replicas.len());
        for addr in replicas {
            if *addr != self.local && !targets.contains(addr) {
                targets.push(addr.clone());
            }
        }
        targets
    }

    /// Dispatches `op` to every target on its own task.
    ///
    /// The handles are returned for callers that want to observe completion;
    /// request handlers drop them.
    pub fn replicate(&self, op: ReplicaOp, replicas: &[NodeAddr]) -> Vec<JoinHandle<()>> {
        let request = op.to_request().to_string();

        self.targets(replicas)
            .into_iter()
            .map(|target| {
                let request = request.clone();
                let key = op.key().to_string();
                let timeout = self.timeout;
                let origin = self.local.clone();

                tokio::spawn(async move {
                    match send_request(&target.to_string(), &request, timeout).await {
                        Ok(reply) if reply == "OK" => {
                            tracing::debug!("[{}] Replicated {} to {}", origin, key, target);
                        }
                        Ok(reply) => {
                            tracing::warn!(
                                "[{}] Replica {} rejected {}: {}",
                                origin,
                                target,
                                key,
                                reply
                            );
                        }
                        Err(e) => {
                            tracing::warn!(
                                "[{}] Failed to replicate {} to {}: {}",
                                origin,
                                key,
                                target,
                                e
                            );
                        }
                    }
                })
            })
            .collect()
    }
}
