//! Line Transport
//!
//! Every request in the cluster is one line of text over a fresh TCP connection:
//! the caller writes the line, half-closes, and reads the reply until the peer
//! closes. Coordinator and storage nodes share this module so both sides agree
//! on framing, limits and timeouts.
//!
//! - **`connection`**: `send_request` (caller side) and `serve` (accept loop, one task per connection).
//! - **`shutdown`**: A watch-based signal that stops accept loops and background tasks.

pub mod connection;
pub mod shutdown;

pub use connection::{LineService, MAX_LINE_BYTES, fits_on_line, send_request, serve};
pub use shutdown::{ShutdownHandle, ShutdownSignal, shutdown_channel};
