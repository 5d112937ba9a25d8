//! Coordinator Wire Protocol
//!
//! Text requests understood by the coordinator and the replies it sends back.
//! Every reply starts with an unambiguous token: `OK`, `PRIMARY`/`REPLICA` or `ERROR`.

use std::fmt;

use crate::error::ProtocolError;
use crate::ring::types::{NodeAddr, ReplicaSet};

pub const CMD_REGISTER_NODE: &str = "REGISTER_NODE";
pub const CMD_UNREGISTER_NODE: &str = "UNREGISTER_NODE";
pub const CMD_HEARTBEAT: &str = "HEARTBEAT";
pub const CMD_GET_NODES_FOR_KEY: &str = "GET_NODES_FOR_KEY";
pub const CMD_LIST_NODES: &str = "LIST_NODES";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorRequest {
    RegisterNode(NodeAddr),
    UnregisterNode(NodeAddr),
    Heartbeat(NodeAddr),
    GetNodesForKey(String),
    ListNodes,
}

impl CoordinatorRequest {
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = parts.split_first() else {
            return Err(ProtocolError::Empty);
        };

        match command {
            CMD_REGISTER_NODE => Ok(Self::RegisterNode(parse_node_args(CMD_REGISTER_NODE, args)?)),
            CMD_UNREGISTER_NODE => Ok(Self::UnregisterNode(parse_node_args(
                CMD_UNREGISTER_NODE,
                args,
            )?)),
            CMD_HEARTBEAT => Ok(Self::Heartbeat(parse_node_args(CMD_HEARTBEAT, args)?)),
            CMD_GET_NODES_FOR_KEY => match args {
                [key] => Ok(Self::GetNodesForKey(key.to_string())),
                _ => Err(ProtocolError::InvalidFormat(CMD_GET_NODES_FOR_KEY)),
            },
            CMD_LIST_NODES => match args {
                [] => Ok(Self::ListNodes),
                _ => Err(ProtocolError::InvalidFormat(CMD_LIST_NODES)),
            },
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

fn parse_node_args(command: &'static str, args: &[&str]) -> Result<NodeAddr, ProtocolError> {
    match args {
        [host, port] => NodeAddr::from_parts(host, port),
        _ => Err(ProtocolError::InvalidFormat(command)),
    }
}

impl fmt::Display for CoordinatorRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegisterNode(addr) => {
                write!(f, "{} {} {}", CMD_REGISTER_NODE, addr.host, addr.port)
            }
            Self::UnregisterNode(addr) => {
                write!(f, "{} {} {}", CMD_UNREGISTER_NODE, addr.host, addr.port)
            }
            Self::Heartbeat(addr) => write!(f, "{} {} {}", CMD_HEARTBEAT, addr.host, addr.port),
            Self::GetNodesForKey(key) => write!(f, "{} {}", CMD_GET_NODES_FOR_KEY, key),
            Self::ListNodes => write!(f, "{}", CMD_LIST_NODES),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorResponse {
    Registered(NodeAddr),
    Unregistered(NodeAddr),
    HeartbeatAccepted(NodeAddr),
    NotRegistered(NodeAddr),
    Nodes(ReplicaSet),
    NoNodesAvailable,
    NodeList(Vec<NodeAddr>),
    Error(ProtocolError),
}

impl fmt::Display for CoordinatorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered(addr) => write!(f, "OK Node {} registered", addr),
            Self::Unregistered(addr) => write!(f, "OK Node {} unregistered", addr),
            Self::HeartbeatAccepted(addr) => write!(f, "OK Heartbeat {}", addr),
            Self::NotRegistered(addr) => write!(f, "ERROR Node {} not registered", addr),
            Self::Nodes(set) => {
                for (index, addr) in set.nodes().iter().enumerate() {
                    if index == 0 {
                        write!(f, "PRIMARY {}", addr)?;
                    } else {
                        write!(f, "\nREPLICA {}", addr)?;
                    }
                }
                Ok(())
            }
            Self::NoNodesAvailable => write!(f, "ERROR No nodes available"),
            Self::NodeList(addrs) => {
                write!(f, "OK Nodes:")?;
                for addr in addrs {
                    write!(f, "\n{}", addr)?;
                }
                Ok(())
            }
            Self::Error(err) => write!(f, "ERROR {}", err),
        }
    }
}

/// Parses a `GET_NODES_FOR_KEY` reply back into a replica set.
///
/// `Ok(None)` means the coordinator reported that no nodes are available.
pub fn parse_nodes_reply(reply: &str) -> Result<Option<ReplicaSet>, String> {
    if reply.starts_with("ERROR No nodes available") {
        return Ok(None);
    }
    if reply.starts_with("ERROR") {
        return Err(reply.to_string());
    }

    let mut primary = None;
    let mut replicas = Vec::new();
    for line in reply.lines() {
        match line.split_whitespace().collect::<Vec<_>>().as_slice() {
            ["PRIMARY", addr] => primary = Some(addr.parse::<NodeAddr>().map_err(|e| e.to_string())?),
            ["REPLICA", addr] => replicas.push(addr.parse::<NodeAddr>().map_err(|e| e.to_string())?),
            [] => {}
            _ => return Err(format!("unexpected line in nodes reply: {}", line)),
        }
    }

    let primary = primary.ok_or_else(|| format!("nodes reply without PRIMARY: {}", reply))?;
    let mut nodes = vec![primary];
    nodes.extend(replicas);
    Ok(Some(ReplicaSet::new(nodes)))
}

/// Parses a `LIST_NODES` reply.
pub fn parse_node_list_reply(reply: &str) -> Result<Vec<NodeAddr>, String> {
    let mut lines = reply.lines();
    match lines.next() {
        Some(header) if header.trim() == "OK Nodes:" => {}
        _ => return Err(reply.to_string()),
    }

    lines
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.parse::<NodeAddr>().map_err(|e| e.to_string()))
        .collect()
}
