//! The send/receive plumbing shared by the discovery and exchange engines.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use log::{debug, trace, warn};

use crate::codec::{Frame, Header, Message, decode};
use crate::config::ClientConfig;
use crate::device::DeviceId;
use crate::errors::Error;
use crate::history::MessageHistory;
use crate::runtime::{self, AsyncUdpSocket, Instant, TimedOut};
use crate::sequence::SequenceGenerator;

type Result<T> = std::result::Result<T, Error>;

/// A point in time the receive loops give up at.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    start: Instant,
    after: Duration,
}

impl Deadline {
    pub(crate) fn after(after: Duration) -> Self {
        Deadline {
            start: Instant::now(),
            after,
        }
    }

    pub(crate) fn remaining(&self) -> Duration {
        self.after.saturating_sub(self.start.elapsed())
    }
}

/// Exclusive use of a client's socket for the duration of one engine call.
///
/// A session only exists while the client's lock is held, so two calls can
/// never read each other's replies.
pub(crate) struct Session<'a, S> {
    socket: &'a S,
    history: &'a mut MessageHistory,
    buf: &'a mut [u8],
    config: &'a ClientConfig,
    sequence: &'a SequenceGenerator,
    source: u32,
}

impl<'a, S: AsyncUdpSocket> Session<'a, S> {
    pub(crate) fn new(
        socket: &'a S,
        history: &'a mut MessageHistory,
        buf: &'a mut [u8],
        config: &'a ClientConfig,
        sequence: &'a SequenceGenerator,
        source: u32,
    ) -> Self {
        Session {
            socket,
            history,
            buf,
            config,
            sequence,
            source,
        }
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        self.config
    }

    /// Send `message` to `target` at `addr`, returning the sequence number used.
    pub(crate) async fn send(
        &mut self,
        message: Message,
        target: DeviceId,
        addr: SocketAddr,
        res_required: bool,
    ) -> Result<u8> {
        let header = Header {
            tagged: target.is_all(),
            source: self.source,
            target,
            ack_required: false,
            res_required,
            sequence: self.sequence.next(),
        };
        let frame = Frame::new(header, message);

        if let Err(err) = self.socket.send_to(&frame.encode(), addr).await {
            warn!("sending {} to {addr} failed: {err}", frame.message.kind());
            self.history.record_error(&err.to_string());
            return Err(Error::socket("send_to", err));
        }

        trace!(
            "sent {} seq={} to {target}@{addr}",
            frame.message.kind(),
            header.sequence
        );
        self.history.record_sent(&frame, addr);
        Ok(header.sequence)
    }

    /// Send `message` to every device through the broadcast address.
    pub(crate) async fn broadcast(&mut self, message: Message) -> Result<u8> {
        let addr = self.config.broadcast_addr();
        self.send(message, DeviceId::ALL, addr, false).await
    }

    /// Wait for the next decodable frame until `deadline`.
    ///
    /// Returns `Ok(None)` once the deadline passes. Datagrams that fail to
    /// decode are dropped and the wait continues. Datagrams that are already
    /// buffered are still returned after the deadline.
    pub(crate) async fn next_frame(
        &mut self,
        deadline: Deadline,
    ) -> Result<Option<(Frame, SocketAddr)>> {
        loop {
            let received =
                runtime::timeout(deadline.remaining(), self.socket.recv_from(self.buf)).await;

            let (len, peer) = match received {
                Err(TimedOut) => return Ok(None),
                Ok(Ok(datagram)) => datagram,
                Ok(Err(err)) if is_transient(&err) => {
                    debug!("ignoring transient receive error: {err}");
                    continue;
                }
                Ok(Err(err)) => {
                    warn!("receive failed: {err}");
                    self.history.record_error(&err.to_string());
                    return Err(Error::socket("recv_from", err));
                }
            };

            match decode(&self.buf[..len]) {
                Ok(frame) => {
                    trace!(
                        "received {} seq={} from {}@{peer}",
                        frame.message.kind(),
                        frame.header.sequence,
                        frame.header.target
                    );
                    self.history.record_received(&frame, peer);
                    return Ok(Some((frame, peer)));
                }
                Err(err) => {
                    debug!("dropping {len} byte datagram from {peer}: {err}");
                    self.history.record_dropped(peer);
                }
            }
        }
    }
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock
            | io::ErrorKind::Interrupted
            | io::ErrorKind::TimedOut
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
    )
}
