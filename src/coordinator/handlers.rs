use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::protocol::{CoordinatorRequest, CoordinatorResponse};
use super::service::CoordinatorService;
use crate::config::CoordinatorConfig;
use crate::transport::{self, LineService, ShutdownSignal};

impl CoordinatorService {
    pub fn handle_request(&self, request: CoordinatorRequest) -> CoordinatorResponse {
        match request {
            CoordinatorRequest::RegisterNode(addr) => {
                self.register(&addr);
                CoordinatorResponse::Registered(addr)
            }
            CoordinatorRequest::UnregisterNode(addr) => {
                self.unregister(&addr);
                CoordinatorResponse::Unregistered(addr)
            }
            CoordinatorRequest::Heartbeat(addr) => {
                if self.heartbeat(&addr) {
                    CoordinatorResponse::HeartbeatAccepted(addr)
                } else {
                    tracing::debug!("Heartbeat from unknown node {}", addr);
                    CoordinatorResponse::NotRegistered(addr)
                }
            }
            CoordinatorRequest::GetNodesForKey(key) => {
                let set = self.nodes_for_key(&key);
                if set.is_empty() {
                    tracing::warn!("GET_NODES_FOR_KEY {}: no nodes available", key);
                    CoordinatorResponse::NoNodesAvailable
                } else {
                    CoordinatorResponse::Nodes(set)
                }
            }
            CoordinatorRequest::ListNodes => CoordinatorResponse::NodeList(self.list_nodes()),
        }
    }
}

impl LineService for CoordinatorService {
    fn handle_line(&self, line: &str) -> String {
        let response = match CoordinatorRequest::parse(line) {
            Ok(request) => self.handle_request(request),
            Err(e) => {
                tracing::warn!("Rejected coordinator request {:?}: {}", line, e);
                CoordinatorResponse::Error(e)
            }
        };
        response.to_string()
    }
}

/// A bound coordinator, ready to serve.
pub struct CoordinatorServer {
    listener: TcpListener,
    service: Arc<CoordinatorService>,
    config: CoordinatorConfig,
}

impl CoordinatorServer {
    /// Binds the listening socket. Failing to bind is fatal for the process.
    pub async fn bind(config: CoordinatorConfig) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)
            .await
            .with_context(|| format!("failed to bind coordinator on {}", config.listen_addr))?;

        Ok(Self {
            listener,
            service: CoordinatorService::new(&config),
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn service(&self) -> Arc<CoordinatorService> {
        self.service.clone()
    }

    /// Serves requests and runs the reaper until `shutdown` fires.
    pub async fn run(self, shutdown: ShutdownSignal) -> Result<()> {
        let addr = self.local_addr()?;
        tracing::info!("Coordinator listening on {}", addr);

        let reaper = tokio::spawn(
            self.service
                .clone()
                .run_reaper(self.config.reaper_interval(), shutdown.clone()),
        );

        transport::serve(
            self.listener,
            self.service,
            self.config.io_timeout(),
            shutdown,
        )
        .await;

        reaper.await.context("reaper task failed")?;
        tracing::info!("Coordinator on {} stopped", addr);
        Ok(())
    }
}
