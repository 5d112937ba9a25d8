use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use super::shutdown::ShutdownSignal;
use crate::error::{ProtocolError, TransportError};

/// Upper bound on a request line (newline included) and on a response body.
pub const MAX_LINE_BYTES: u64 = 64 * 1024;

/// Whether `line` plus its terminating newline stays within `MAX_LINE_BYTES`.
pub fn fits_on_line(line: &str) -> bool {
    (line.len() as u64) < MAX_LINE_BYTES
}

/// A server that answers one request line with one (possibly multi-line) reply.
///
/// Handlers never block on the network: anything slow must be spawned.
pub trait LineService: Send + Sync + 'static {
    fn handle_line(&self, line: &str) -> String;
}

/// Sends `request` to `addr` and returns the trimmed reply.
///
/// Connect, write and read all share the single `io_timeout` budget.
pub async fn send_request(
    addr: &str,
    request: &str,
    io_timeout: Duration,
) -> Result<String, TransportError> {
    let exchange = async {
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(|source| TransportError::Connect {
                addr: addr.to_string(),
                source,
            })?;

        let io_err = |source| TransportError::Io {
            addr: addr.to_string(),
            source,
        };

        stream
            .write_all(format!("{}\n", request).as_bytes())
            .await
            .map_err(io_err)?;
        stream.shutdown().await.map_err(io_err)?;

        let mut response = String::new();
        stream
            .take(MAX_LINE_BYTES)
            .read_to_string(&mut response)
            .await
            .map_err(io_err)?;

        Ok::<_, TransportError>(response.trim_end().to_string())
    };

    tokio::time::timeout(io_timeout, exchange)
        .await
        .map_err(|_| TransportError::Timeout {
            addr: addr.to_string(),
            after: io_timeout,
        })?
}

/// Accepts connections until `shutdown` fires, serving each on its own task.
pub async fn serve<S: LineService>(
    listener: TcpListener,
    service: Arc<S>,
    io_timeout: Duration,
    mut shutdown: ShutdownSignal,
) {
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let service = service.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer, service, io_timeout).await {
                            tracing::debug!("Connection from {} ended with error: {}", peer, e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to accept connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            },
            _ = shutdown.recv() => {
                tracing::debug!("Accept loop stopping");
                break;
            }
        }
    }
}

/// Decodes one raw request line. A line that hit the size cap before its
/// newline is rejected rather than served truncated.
fn decode_request(raw: Vec<u8>) -> Result<String, ProtocolError> {
    let terminated = raw.last() == Some(&b'\n');
    if !terminated && raw.len() as u64 >= MAX_LINE_BYTES {
        return Err(ProtocolError::RequestTooLarge);
    }
    let line = String::from_utf8(raw).map_err(|_| ProtocolError::InvalidEncoding)?;
    Ok(line.trim().to_string())
}

async fn handle_connection<S: LineService>(
    stream: TcpStream,
    peer: SocketAddr,
    service: Arc<S>,
    io_timeout: Duration,
) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader.take(MAX_LINE_BYTES));

    let mut raw = Vec::new();
    let read = tokio::time::timeout(io_timeout, reader.read_until(b'\n', &mut raw))
        .await
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "request read timed out"))??;

    if read == 0 {
        tracing::debug!("Connection from {} closed without a request", peer);
        return Ok(());
    }

    let response = match decode_request(raw) {
        Ok(request) => {
            tracing::debug!("Request from {}: {}", peer, request);
            service.handle_line(&request)
        }
        Err(e) => {
            tracing::warn!("Rejected request from {}: {}", peer, e);
            if e == ProtocolError::RequestTooLarge {
                // Unread input turns the close into a reset that can drop the reply.
                let mut rest = reader.into_inner().into_inner();
                let mut sink = tokio::io::sink();
                let drain = tokio::io::copy(&mut rest, &mut sink);
                let _ = tokio::time::timeout(io_timeout, drain).await;
            }
            format!("ERROR {}", e)
        }
    };

    tokio::time::timeout(io_timeout, async {
        writer.write_all(response.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.shutdown().await
    })
    .await
    .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "response write timed out"))?
}
