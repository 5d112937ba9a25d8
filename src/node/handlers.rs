use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;

use super::heartbeat::CoordinatorLink;
use super::protocol::{NodeRequest, NodeResponse};
use super::replication::Replicator;
use super::service::NodeService;
use crate::config::NodeConfig;
use crate::ring::types::NodeAddr;
use crate::transport::{self, LineService, ShutdownSignal};

impl LineService for NodeService {
    fn handle_line(&self, line: &str) -> String {
        let response = match NodeRequest::parse(line) {
            Ok(request) => self.handle_request(request),
            Err(e) => {
                tracing::warn!("[{}] Rejected request {:?}: {}", self.addr(), line, e);
                NodeResponse::Error(e)
            }
        };
        response.to_string()
    }
}

/// A bound storage node, ready to join the cluster.
pub struct StorageNode {
    listener: TcpListener,
    service: Arc<NodeService>,
    link: CoordinatorLink,
    config: NodeConfig,
}

impl StorageNode {
    /// Binds the listener first so the registered address is the one actually
    /// bound (port `0` resolves to a free port).
    pub async fn bind(config: NodeConfig) -> Result<Self> {
        let listener = TcpListener::bind((config.host.as_str(), config.port))
            .await
            .with_context(|| format!("failed to bind node on {}:{}", config.host, config.port))?;
        let bound = listener.local_addr()?;
        let addr = NodeAddr::new(config.host.clone(), bound.port());

        let replicator = Replicator::new(addr.clone(), config.replication_timeout());
        let link = CoordinatorLink::new(
            config.coordinator_addr.clone(),
            addr.clone(),
            config.io_timeout(),
        );

        Ok(Self {
            listener,
            service: NodeService::new(addr, replicator),
            link,
            config,
        })
    }

    pub fn addr(&self) -> &NodeAddr {
        self.service.addr()
    }

    pub fn service(&self) -> Arc<NodeService> {
        self.service.clone()
    }

    /// Registers, then serves and heartbeats until `shutdown` fires.
    ///
    /// Failing the initial registration is fatal. On a clean shutdown the node
    /// unregisters itself; if it dies instead, the reaper evicts it.
    pub async fn run(self, shutdown: ShutdownSignal) -> Result<()> {
        let addr = self.addr().clone();

        self.link
            .register()
            .await
            .with_context(|| format!("node {} failed to register with coordinator", addr))?;
        tracing::info!("[{}] Node started", addr);

        tokio::join!(
            transport::serve(
                self.listener,
                self.service,
                self.config.io_timeout(),
                shutdown.clone(),
            ),
            self.link
                .run_heartbeats(self.config.heartbeat_interval(), shutdown),
        );

        if let Err(e) = self.link.unregister().await {
            tracing::warn!("[{}] Failed to unregister on shutdown: {}", addr, e);
        }
        tracing::info!("[{}] Node stopped", addr);
        Ok(())
    }
}
