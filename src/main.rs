use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use distributed_kv::client::KvClient;
use distributed_kv::config::Config;
use distributed_kv::coordinator::handlers::CoordinatorServer;
use distributed_kv::node::handlers::StorageNode;
use distributed_kv::ring::types::NodeAddr;
use distributed_kv::transport::{ShutdownHandle, shutdown_channel};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "distributed_kv", about = "Consistent-hashing key/value cluster")]
struct Args {
    /// JSON configuration file; flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "info")]
    log_level: tracing::Level,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the coordinator (ring owner and failure detector).
    Coordinator {
        #[arg(long)]
        listen: Option<String>,
        #[arg(long)]
        eviction_timeout_ms: Option<u64>,
        #[arg(long)]
        replication_factor: Option<usize>,
    },
    /// Run a storage node.
    Node {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        coordinator: Option<String>,
        #[arg(long)]
        heartbeat_interval_ms: Option<u64>,
    },
    /// Issue a single client request.
    Client {
        #[arg(long)]
        coordinator: Option<String>,
        #[command(subcommand)]
        op: ClientOp,
    },
}

#[derive(Subcommand, Debug)]
enum ClientOp {
    Put {
        key: String,
        /// Remaining words are joined with single spaces.
        #[arg(required = true, num_args = 1..)]
        value: Vec<String>,
    },
    Get {
        key: String,
    },
    Delete {
        key: String,
    },
    ListNodes,
    NodesForKey {
        key: String,
    },
    Info {
        node: NodeAddr,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(Config::default()),
    }
}

/// Fires `handle` on Ctrl+C so servers stop accepting and exit cleanly.
fn trigger_on_ctrl_c(handle: ShutdownHandle) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Ctrl+C received, shutting down");
                handle.trigger();
            }
            Err(e) => tracing::error!("Failed to listen for Ctrl+C: {}", e),
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    let mut config = load_config(args.config.as_ref())?;

    match args.cmd {
        Command::Coordinator {
            listen,
            eviction_timeout_ms,
            replication_factor,
        } => {
            let coordinator = &mut config.coordinator;
            if let Some(listen) = listen {
                coordinator.listen_addr = listen;
            }
            if let Some(timeout) = eviction_timeout_ms {
                coordinator.eviction_timeout_ms = timeout;
            }
            if let Some(rf) = replication_factor {
                coordinator.replication_factor = rf;
            }
            coordinator.validate()?;

            let server = CoordinatorServer::bind(config.coordinator).await?;
            let (handle, signal) = shutdown_channel();
            trigger_on_ctrl_c(handle);
            server.run(signal).await?;
        }
        Command::Node {
            host,
            port,
            coordinator,
            heartbeat_interval_ms,
        } => {
            let node = &mut config.node;
            if let Some(host) = host {
                node.host = host;
            }
            if let Some(port) = port {
                node.port = port;
            }
            if let Some(coordinator) = coordinator {
                node.coordinator_addr = coordinator;
            }
            if let Some(interval) = heartbeat_interval_ms {
                node.heartbeat_interval_ms = interval;
            }
            config.validate()?;

            let node = StorageNode::bind(config.node).await?;
            let (handle, signal) = shutdown_channel();
            trigger_on_ctrl_c(handle);
            node.run(signal).await?;
        }
        Command::Client { coordinator, op } => {
            if let Some(coordinator) = coordinator {
                config.client.coordinator_addr = coordinator;
            }
            let client = KvClient::from_config(&config.client);
            run_client(&client, op).await?;
        }
    }

    Ok(())
}

async fn run_client(client: &KvClient, op: ClientOp) -> Result<()> {
    match op {
        ClientOp::Put { key, value } => {
            let node = client.put(&key, &value.join(" ")).await?;
            println!("OK (stored on {})", node);
        }
        ClientOp::Get { key } => match client.get(&key).await? {
            Some(value) => println!("{}", value),
            None => println!("NOT_FOUND"),
        },
        ClientOp::Delete { key } => {
            let node = client.delete(&key).await?;
            println!("OK (deleted via {})", node);
        }
        ClientOp::ListNodes => {
            let nodes = client.list_nodes().await?;
            if nodes.is_empty() {
                println!("No nodes registered");
            }
            for node in nodes {
                println!("{}", node);
            }
        }
        ClientOp::NodesForKey { key } => {
            let set = client.nodes_for_key(&key).await?;
            for (index, node) in set.nodes().iter().enumerate() {
                let role = if index == 0 { "PRIMARY" } else { "REPLICA" };
                println!("{} {}", role, node);
            }
        }
        ClientOp::Info { node } => {
            println!("{}", client.info(&node).await?);
        }
    }
    Ok(())
}
