//! Storage Node Wire Protocol
//!
//! Client-facing requests (`PUT`, `GET`, `DELETE`, `INFO`) and the internal
//! replication requests a primary pushes to its replicas (`REPLICATE`,
//! `REPLICATE_DELETE`).
//!
//! Keys are single words. A value is the rest of the line, so it may contain
//! spaces. On `PUT` the final word is read as the replica list when it parses
//! as `host:port[,host:port...]` and a value precedes it.

use std::fmt;

use crate::error::ProtocolError;
use crate::ring::types::NodeAddr;

pub const CMD_PUT: &str = "PUT";
pub const CMD_GET: &str = "GET";
pub const CMD_DELETE: &str = "DELETE";
pub const CMD_REPLICATE: &str = "REPLICATE";
pub const CMD_REPLICATE_DELETE: &str = "REPLICATE_DELETE";
pub const CMD_INFO: &str = "INFO";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRequest {
    Put {
        key: String,
        value: String,
        replicas: Vec<NodeAddr>,
    },
    Get {
        key: String,
    },
    Delete {
        key: String,
        replicas: Vec<NodeAddr>,
    },
    Replicate {
        key: String,
        value: String,
    },
    ReplicateDelete {
        key: String,
    },
    Info,
}

/// Splits off the first whitespace-delimited word.
fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], text[end..].trim_start()),
        None => (text, ""),
    }
}

fn split_value_and_replicas(rest: &str) -> (String, Vec<NodeAddr>) {
    if let Some((value, tail)) = rest.rsplit_once(char::is_whitespace)
        && let Ok(replicas) = NodeAddr::parse_list(tail)
        && !replicas.is_empty()
        && !value.trim().is_empty()
    {
        return (value.trim_end().to_string(), replicas);
    }
    (rest.to_string(), Vec::new())
}

impl NodeRequest {
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let (command, rest) = split_word(line.trim());
        if command.is_empty() {
            return Err(ProtocolError::Empty);
        }

        match command {
            CMD_PUT => {
                let (key, rest) = split_word(rest);
                if key.is_empty() || rest.is_empty() {
                    return Err(ProtocolError::InvalidFormat(CMD_PUT));
                }
                let (value, replicas) = split_value_and_replicas(rest);
                Ok(Self::Put {
                    key: key.to_string(),
                    value,
                    replicas,
                })
            }
            CMD_GET => match split_word(rest) {
                (key, "") if !key.is_empty() => Ok(Self::Get {
                    key: key.to_string(),
                }),
                _ => Err(ProtocolError::InvalidFormat(CMD_GET)),
            },
            CMD_DELETE => {
                let (key, rest) = split_word(rest);
                let (list, trailing) = split_word(rest);
                if key.is_empty() || !trailing.is_empty() {
                    return Err(ProtocolError::InvalidFormat(CMD_DELETE));
                }
                Ok(Self::Delete {
                    key: key.to_string(),
                    replicas: NodeAddr::parse_list(list)?,
                })
            }
            CMD_REPLICATE => {
                let (key, value) = split_word(rest);
                if key.is_empty() || value.is_empty() {
                    return Err(ProtocolError::InvalidFormat(CMD_REPLICATE));
                }
                Ok(Self::Replicate {
                    key: key.to_string(),
                    value: value.to_string(),
                })
            }
            CMD_REPLICATE_DELETE => match split_word(rest) {
                (key, "") if !key.is_empty() => Ok(Self::ReplicateDelete {
                    key: key.to_string(),
                }),
                _ => Err(ProtocolError::InvalidFormat(CMD_REPLICATE_DELETE)),
            },
            CMD_INFO if rest.is_empty() => Ok(Self::Info),
            CMD_INFO => Err(ProtocolError::InvalidFormat(CMD_INFO)),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

impl fmt::Display for NodeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Put {
                key,
                value,
                replicas,
            } => {
                write!(f, "{} {} {}", CMD_PUT, key, value)?;
                if !replicas.is_empty() {
                    write!(f, " {}", NodeAddr::join_list(replicas))?;
                }
                Ok(())
            }
            Self::Get { key } => write!(f, "{} {}", CMD_GET, key),
            Self::Delete { key, replicas } => {
                write!(f, "{} {}", CMD_DELETE, key)?;
                if !replicas.is_empty() {
                    write!(f, " {}", NodeAddr::join_list(replicas))?;
                }
                Ok(())
            }
            Self::Replicate { key, value } => write!(f, "{} {} {}", CMD_REPLICATE, key, value),
            Self::ReplicateDelete { key } => write!(f, "{} {}", CMD_REPLICATE_DELETE, key),
            Self::Info => write!(f, "{}", CMD_INFO),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeResponse {
    Ok,
    Value(String),
    NotFound,
    Info { addr: NodeAddr, keys: usize },
    Error(ProtocolError),
}

impl fmt::Display for NodeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Value(value) => write!(f, "VALUE {}", value),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Info { addr, keys } => write!(f, "OK Node {} keys={}", addr, keys),
            Self::Error(err) => write!(f, "ERROR {}", err),
        }
    }
}

/// Interprets a `GET` reply: `Ok(Some)` for `VALUE`, `Ok(None)` for `NOT_FOUND`.
pub fn parse_get_reply(reply: &str) -> Result<Option<String>, String> {
    if reply == "NOT_FOUND" {
        return Ok(None);
    }
    match reply.strip_prefix("VALUE ") {
        Some(value) => Ok(Some(value.to_string())),
        None => Err(reply.to_string()),
    }
}
