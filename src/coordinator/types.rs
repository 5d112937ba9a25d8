use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::ring::types::{NodeAddr, RingPosition, VirtualNode};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeState {
    Alive,
    Dead,
}

/// A registered storage node as the coordinator sees it.
///
/// `last_heartbeat` is refreshed by `REGISTER_NODE` and `HEARTBEAT`; the reaper
/// compares it against the eviction timeout.
#[derive(Debug, Clone)]
pub struct Member {
    pub addr: NodeAddr,
    pub positions: Vec<RingPosition>,
    pub last_heartbeat: Instant,
    pub state: NodeState,
}

impl Member {
    pub fn new(addr: NodeAddr, virtual_nodes: u32, now: Instant) -> Self {
        let positions = (0..virtual_nodes)
            .map(|index| VirtualNode::new(addr.clone(), index).position())
            .collect();

        Self {
            addr,
            positions,
            last_heartbeat: now,
            state: NodeState::Alive,
        }
    }

    pub fn silence(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_heartbeat)
    }

    pub fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        self.silence(now) > timeout
    }
}

/// Outcome of a registration upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Joined,
    Refreshed,
}
