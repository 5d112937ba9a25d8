use anyhow::{Result, bail};
use std::time::Duration;

use crate::coordinator::protocol::CoordinatorRequest;
use crate::error::TransportError;
use crate::ring::types::NodeAddr;
use crate::transport::{ShutdownSignal, send_request};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeartbeatOutcome {
    Accepted,
    /// The coordinator no longer knows this node (evicted or restarted).
    Unknown,
    Rejected(String),
}

/// A storage node's connection details for talking to the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorLink {
    coordinator_addr: String,
    local: NodeAddr,
    io_timeout: Duration,
}

impl CoordinatorLink {
    pub fn new(coordinator_addr: impl Into<String>, local: NodeAddr, io_timeout: Duration) -> Self {
        Self {
            coordinator_addr: coordinator_addr.into(),
            local,
            io_timeout,
        }
    }

    async fn send(&self, request: CoordinatorRequest) -> Result<String, TransportError> {
        send_request(&self.coordinator_addr, &request.to_string(), self.io_timeout).await
    }

    pub async fn register(&self) -> Result<()> {
        let reply = self
            .send(CoordinatorRequest::RegisterNode(self.local.clone()))
            .await?;
        if !reply.starts_with("OK") {
            bail!("coordinator refused registration of {}: {}", self.local, reply);
        }
        tracing::info!("[{}] Coordinator response: {}", self.local, reply);
        Ok(())
    }

    pub async fn unregister(&self) -> Result<()> {
        let reply = self
            .send(CoordinatorRequest::UnregisterNode(self.local.clone()))
            .await?;
        if !reply.starts_with("OK") {
            bail!("coordinator refused to unregister {}: {}", self.local, reply);
        }
        Ok(())
    }

    pub async fn heartbeat(&self) -> Result<HeartbeatOutcome, TransportError> {
        let reply = self
            .send(CoordinatorRequest::Heartbeat(self.local.clone()))
            .await?;

        Ok(if reply.starts_with("OK") {
            HeartbeatOutcome::Accepted
        } else if reply.ends_with("not registered") {
            HeartbeatOutcome::Unknown
        } else {
            HeartbeatOutcome::Rejected(reply)
        })
    }

    /// Sends a heartbeat every `interval` until `shutdown` fires.
    ///
    /// The interval must stay below the coordinator's eviction timeout. A node
    /// the coordinator has forgotten registers again, which is a plain upsert.
    pub async fn run_heartbeats(&self, interval: Duration, mut shutdown: ShutdownSignal) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately and registration just happened.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.beat().await,
                _ = shutdown.recv() => break,
            }
        }
        tracing::debug!("[{}] Heartbeat loop stopped", self.local);
    }

    async fn beat(&self) {
        match self.heartbeat().await {
            Ok(HeartbeatOutcome::Accepted) => {
                tracing::debug!("[{}] Heartbeat accepted", self.local);
            }
            Ok(HeartbeatOutcome::Unknown) => {
                tracing::warn!("[{}] Coordinator forgot this node, re-registering", self.local);
                if let Err(e) = self.register().await {
                    tracing::warn!("[{}] Re-registration failed: {}", self.local, e);
                }
            }
            Ok(HeartbeatOutcome::Rejected(reply)) => {
                tracing::warn!("[{}] Heartbeat rejected: {}", self.local, reply);
            }
            Err(e) => {
                tracing::warn!("[{}] Heartbeat failed: {}", self.local, e);
            }
        }
    }
}
