use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::types::{Member, NodeState, Registration};
use crate::config::CoordinatorConfig;
use crate::ring::hashring::HashRing;
use crate::ring::types::{NodeAddr, ReplicaSet};
use crate::transport::ShutdownSignal;

/// Ring and heartbeat table. Always mutated together under one lock, so no
/// reader can see a node in one but not the other.
struct Registry {
    ring: HashRing,
    members: HashMap<NodeAddr, Member>,
}

impl Registry {
    fn check_invariant(&self) {
        debug_assert_eq!(self.ring.len(), self.members.len());
        debug_assert!(self.members.keys().all(|addr| self.ring.contains(addr)));
        debug_assert!(self.members.values().all(|member| member.state == NodeState::Alive));
        debug_assert_eq!(
            self.ring.positions().len(),
            self.members.values().map(|member| member.positions.len()).sum::<usize>()
        );
    }
}

/// Cluster membership and key routing.
///
/// One instance per coordinator process, shared via `Arc` between the
/// connection tasks and the reaper.
pub struct CoordinatorService {
    registry: Mutex<Registry>,
    replication_factor: usize,
    virtual_nodes: u32,
    eviction_timeout: Duration,
}

impl CoordinatorService {
    pub fn new(config: &CoordinatorConfig) -> Arc<Self> {
        Arc::new(Self {
            registry: Mutex::new(Registry {
                ring: HashRing::new(config.virtual_nodes),
                members: HashMap::new(),
            }),
            replication_factor: config.replication_factor,
            virtual_nodes: config.virtual_nodes,
            eviction_timeout: config.eviction_timeout(),
        })
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        // Every critical section leaves the registry consistent, so a panic in
        // another holder does not invalidate it.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn eviction_timeout(&self) -> Duration {
        self.eviction_timeout
    }

    /// Upserts a node: new nodes join the ring, known nodes get a fresh heartbeat.
    pub fn register(&self, addr: &NodeAddr) -> Registration {
        self.register_at(addr, Instant::now())
    }

    pub fn register_at(&self, addr: &NodeAddr, now: Instant) -> Registration {
        let (outcome, cluster_size) = {
            let mut guard = self.registry();
            let registry = &mut *guard;

            let outcome = match registry.members.get_mut(addr) {
                Some(member) => {
                    member.last_heartbeat = now;
                    Registration::Refreshed
                }
                None => {
                    registry.ring.insert(addr);
                    registry.members.insert(
                        addr.clone(),
                        Member::new(addr.clone(), self.virtual_nodes, now),
                    );
                    Registration::Joined
                }
            };
            registry.check_invariant();
            (outcome, registry.members.len())
        };

        match outcome {
            Registration::Joined => {
                tracing::info!("Node registered: {} (cluster size {})", addr, cluster_size)
            }
            Registration::Refreshed => tracing::debug!("Node re-registered: {}", addr),
        }

        outcome
    }

    /// Removes a node from ring and table. Returns whether it was present.
    pub fn unregister(&self, addr: &NodeAddr) -> bool {
        let (removed, cluster_size) = {
            let mut registry = self.registry();
            let removed = registry.members.remove(addr).is_some();
            registry.ring.remove(addr);
            registry.check_invariant();
            (removed, registry.members.len())
        };

        if removed {
            tracing::info!("Node unregistered: {} (cluster size {})", addr, cluster_size);
        }
        removed
    }

    /// Refreshes the heartbeat of a registered node; never touches the ring.
    ///
    /// Returns `false` for unknown nodes, which are expected to re-register.
    pub fn heartbeat(&self, addr: &NodeAddr) -> bool {
        self.heartbeat_at(addr, Instant::now())
    }

    pub fn heartbeat_at(&self, addr: &NodeAddr, now: Instant) -> bool {
        match self.registry().members.get_mut(addr) {
            Some(member) => {
                member.last_heartbeat = now;
                true
            }
            None => false,
        }
    }

    /// Replica set for `key`, at most `replication_factor` nodes, primary first.
    pub fn nodes_for_key(&self, key: &str) -> ReplicaSet {
        self.registry().ring.lookup(key, self.replication_factor)
    }

    /// Alive nodes in address order.
    pub fn list_nodes(&self) -> Vec<NodeAddr> {
        self.registry().ring.nodes()
    }

    pub fn member(&self, addr: &NodeAddr) -> Option<Member> {
        self.registry().members.get(addr).cloned()
    }

    pub fn node_count(&self) -> usize {
        self.registry().members.len()
    }

    /// Evicts every member silent for longer than the eviction timeout as of `now`.
    ///
    /// The lock is held for the scan and the removals only.
    pub fn evict_expired(&self, now: Instant) -> Vec<Member> {
        let mut evicted = {
            let mut registry = self.registry();
            let expired: Vec<NodeAddr> = registry
                .members
                .values()
                .filter(|member| member.is_expired(now, self.eviction_timeout))
                .map(|member| member.addr.clone())
                .collect();

            let mut evicted = Vec::with_capacity(expired.len());
            for addr in expired {
                registry.ring.remove(&addr);
                if let Some(mut member) = registry.members.remove(&addr) {
                    member.state = NodeState::Dead;
                    evicted.push(member);
                }
            }
            registry.check_invariant();
            evicted
        };

        evicted.sort_by(|a, b| a.addr.cmp(&b.addr));
        for member in &evicted {
            tracing::warn!(
                "Node {} marked as {:?} and removed (no heartbeat for {:?}), released positions {:?}",
                member.addr,
                member.state,
                member.silence(now),
                member.positions
            );
        }
        evicted
    }

    /// Periodic eviction scan; returns when `shutdown` fires.
    pub async fn run_reaper(self: Arc<Self>, interval: Duration, mut shutdown: ShutdownSignal) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(
            "Reaper started (interval {:?}, eviction timeout {:?})",
            interval,
            self.eviction_timeout
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = self.evict_expired(Instant::now());
                    if !evicted.is_empty() {
                        tracing::info!("Cluster size now: {} alive nodes", self.node_count());
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Reaper stopped");
                    break;
                }
            }
        }
    }
}
