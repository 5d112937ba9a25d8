use std::time::Duration;

use crate::config::ClientConfig;
use crate::coordinator::protocol::{CoordinatorRequest, parse_node_list_reply, parse_nodes_reply};
use crate::error::{ClientError, TransportError};
use crate::node::protocol::{NodeRequest, parse_get_reply};
use crate::ring::types::{NodeAddr, ReplicaSet};
use crate::transport::{fits_on_line, send_request};

#[derive(Debug, Clone)]
pub struct KvClient {
    coordinator_addr: String,
    io_timeout: Duration,
}

fn check_key(key: &str) -> Result<(), ClientError> {
    if key.is_empty() || key.contains(char::is_whitespace) {
        return Err(ClientError::InvalidInput("key", key.to_string()));
    }
    Ok(())
}

fn check_value(value: &str) -> Result<(), ClientError> {
    if value.trim().is_empty() || value.contains(['\n', '\r']) {
        return Err(ClientError::InvalidInput("value", value.to_string()));
    }
    Ok(())
}

impl KvClient {
    pub fn new(coordinator_addr: impl Into<String>, io_timeout: Duration) -> Self {
        Self {
            coordinator_addr: coordinator_addr.into(),
            io_timeout,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.coordinator_addr.clone(), config.io_timeout())
    }

    async fn coordinator(&self, request: CoordinatorRequest) -> Result<String, ClientError> {
        Ok(send_request(&self.coordinator_addr, &request.to_string(), self.io_timeout).await?)
    }

    async fn node(&self, addr: &NodeAddr, request: &NodeRequest) -> Result<String, TransportError> {
        send_request(&addr.to_string(), &request.to_string(), self.io_timeout).await
    }

    /// Asks the coordinator which nodes own `key`, primary first.
    pub async fn nodes_for_key(&self, key: &str) -> Result<ReplicaSet, ClientError> {
        check_key(key)?;
        let reply = self
            .coordinator(CoordinatorRequest::GetNodesForKey(key.to_string()))
            .await?;
        match parse_nodes_reply(&reply) {
            Ok(Some(set)) => Ok(set),
            Ok(None) => Err(ClientError::NoNodesAvailable),
            Err(reply) => Err(ClientError::Coordinator(reply)),
        }
    }

    pub async fn list_nodes(&self) -> Result<Vec<NodeAddr>, ClientError> {
        let reply = self.coordinator(CoordinatorRequest::ListNodes).await?;
        parse_node_list_reply(&reply).map_err(ClientError::Coordinator)
    }

    /// Stores `value` and returns the node that accepted the write.
    ///
    /// The whole set travels as the replica list, target included, so the
    /// list is never empty and the value's last word is never mistaken for
    /// one. The receiving node skips itself when replicating.
    pub async fn put(&self, key: &str, value: &str) -> Result<NodeAddr, ClientError> {
        check_value(value)?;
        let set = self.nodes_for_key(key).await?;
        let request = NodeRequest::Put {
            key: key.to_string(),
            value: value.to_string(),
            replicas: set.nodes().to_vec(),
        };

        // Replicas receive the value re-framed as REPLICATE, so both forms must fit.
        let replicate = NodeRequest::Replicate {
            key: key.to_string(),
            value: value.to_string(),
        };
        if !fits_on_line(&request.to_string()) || !fits_on_line(&replicate.to_string()) {
            return Err(ClientError::InvalidInput(
                "value",
                format!("{} bytes exceed the request size limit", value.len()),
            ));
        }

        self.first_accepting(&set, &request).await
    }

    /// Reads `key`. `Ok(None)` means a reachable owner reported `NOT_FOUND`.
    pub async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        let set = self.nodes_for_key(key).await?;
        let request = NodeRequest::Get {
            key: key.to_string(),
        };

        let mut last_error = None;
        for target in set.nodes() {
            match self.node(target, &request).await {
                Ok(reply) => return parse_get_reply(&reply).map_err(ClientError::UnexpectedResponse),
                Err(e) => {
                    tracing::warn!("GET {} via {} failed, trying next replica: {}", key, target, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.map_or(ClientError::NoNodesAvailable, ClientError::from))
    }

    /// Deletes `key` and returns the node that accepted the delete.
    pub async fn delete(&self, key: &str) -> Result<NodeAddr, ClientError> {
        let set = self.nodes_for_key(key).await?;
        let request = NodeRequest::Delete {
            key: key.to_string(),
            replicas: set.nodes().to_vec(),
        };

        self.first_accepting(&set, &request).await
    }

    /// The `INFO` line of a single node.
    pub async fn info(&self, addr: &NodeAddr) -> Result<String, ClientError> {
        let reply = self.node(addr, &NodeRequest::Info).await?;
        if reply.starts_with("OK") {
            Ok(reply)
        } else {
            Err(ClientError::UnexpectedResponse(reply))
        }
    }

    /// Sends a write to each member of `set` in order until one answers `OK`.
    async fn first_accepting(
        &self,
        set: &ReplicaSet,
        request: &NodeRequest,
    ) -> Result<NodeAddr, ClientError> {
        let mut last_error = None;
        for target in set.nodes() {
            match self.node(target, request).await {
                Ok(reply) if reply == "OK" => return Ok(target.clone()),
                Ok(reply) => return Err(ClientError::UnexpectedResponse(reply)),
                Err(e) => {
                    tracing::warn!("{} failed, trying next replica: {}", target, e);
                    last_error = Some(ClientError::from(e));
                }
            }
        }
        Err(last_error.unwrap_or(ClientError::NoNodesAvailable))
    }
}
