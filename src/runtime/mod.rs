//! The async runtime seam.
//!
//! This module provides the transport trait the discovery and exchange engines
//! are written against, plus the timer, lock and spawn primitives they need,
//! for whichever async runtime (tokio, async-std, smol) is selected.
//!
//! # Feature Flags
//!
//! Exactly one runtime feature must be enabled:
//!
//! - `runtime-tokio` (default)
//! - `runtime-async-std`
//! - `runtime-smol`
//!
//! # Example
//!
//! ```toml
//! [dependencies]
//! # Using async-std
//! lifx-lights-rs = { version = "0.1", default-features = false, features = ["runtime-async-std"] }
//!
//! # Using smol
//! lifx-lights-rs = { version = "0.1", default-features = false, features = ["runtime-smol"] }
//! ```

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

#[cfg(feature = "runtime-tokio")]
mod tokio_impl;

#[cfg(feature = "runtime-async-std")]
mod async_std_impl;

#[cfg(feature = "runtime-smol")]
mod smol_impl;

#[cfg(all(test, feature = "runtime-tokio"))]
pub(crate) mod mock;

// The selected runtime's socket, task handle and spawn.
#[cfg(feature = "runtime-tokio")]
pub use tokio_impl::{JoinHandle, UdpSocket, spawn};
#[cfg(feature = "runtime-tokio")]
use tokio_impl::{InstantInner, timeout_impl};

#[cfg(feature = "runtime-async-std")]
pub use async_std_impl::{JoinHandle, UdpSocket, spawn};
#[cfg(feature = "runtime-async-std")]
use async_std_impl::{InstantInner, timeout_impl};

#[cfg(feature = "runtime-smol")]
pub use smol_impl::{JoinHandle, UdpSocket, spawn};
#[cfg(feature = "runtime-smol")]
use smol_impl::{InstantInner, timeout_impl};

/// A broadcast-capable UDP endpoint.
///
/// This is the transport the engines are handed. Implement it to inject a custom or simulated transport with
/// [`crate::Client::with_socket`]. `recv_from` must be cancel safe, since the
/// engines race it against their deadline.
pub trait AsyncUdpSocket: Send + Sync + Sized {
    /// Bind to `addr` (`host:port`).
    fn bind(addr: &str) -> impl Future<Output = io::Result<Self>> + Send;

    /// Send one datagram.
    fn send_to(
        &self,
        buf: &[u8],
        addr: SocketAddr,
    ) -> impl Future<Output = io::Result<usize>> + Send;

    /// Wait for one datagram, returning its length and sender.
    fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = io::Result<(usize, SocketAddr)>> + Send;

    /// Allow sending to broadcast addresses.
    fn set_broadcast(&self, broadcast: bool) -> io::Result<()>;
}

/// Run `future` for at most `duration`.
///
/// The future is polled before the deadline is checked, so a zero duration
/// still picks up a result that is immediately ready.
pub async fn timeout<F, T>(duration: Duration, future: F) -> Result<T, TimedOut>
where
    F: Future<Output = T>,
{
    timeout_impl(duration, future).await
}

/// The deadline of [`timeout`] passed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut;

impl std::fmt::Display for TimedOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "operation timed out")
    }
}

impl std::error::Error for TimedOut {}

/// A measurement of monotonically increasing time, on the runtime's clock.
#[derive(Debug, Clone, Copy)]
pub struct Instant(InstantInner);

impl Instant {
    pub fn now() -> Self {
        Instant(InstantInner::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }
}

// Lock held by a client for the duration of one call.
#[cfg(feature = "runtime-tokio")]
pub use tokio::sync::Mutex;

#[cfg(feature = "runtime-async-std")]
pub use async_std::sync::Mutex;

#[cfg(feature = "runtime-smol")]
pub use async_lock::Mutex;

// Exactly one runtime.
#[cfg(not(any(
    feature = "runtime-tokio",
    feature = "runtime-async-std",
    feature = "runtime-smol"
)))]
compile_error!(
    "One of \"runtime-tokio\", \"runtime-async-std\", or \"runtime-smol\" features must be enabled"
);

#[cfg(all(feature = "runtime-tokio", feature = "runtime-async-std"))]
compile_error!("Features \"runtime-tokio\" and \"runtime-async-std\" are mutually exclusive");

#[cfg(all(feature = "runtime-tokio", feature = "runtime-smol"))]
compile_error!("Features \"runtime-tokio\" and \"runtime-smol\" are mutually exclusive");

#[cfg(all(feature = "runtime-async-std", feature = "runtime-smol"))]
compile_error!("Features \"runtime-async-std\" and \"runtime-smol\" are mutually exclusive");
