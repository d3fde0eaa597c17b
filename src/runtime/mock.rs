//! Scripted in-memory transport for engine tests.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use super::AsyncUdpSocket;
use crate::codec::{Frame, Header, Message, SERVICE_UDP};
use crate::device::DeviceId;
use crate::types::Hsbk;

type Datagram = io::Result<(Vec<u8>, SocketAddr)>;

struct Inner {
    feeder: UnboundedSender<Datagram>,
    inbox: tokio::sync::Mutex<UnboundedReceiver<Datagram>>,
    sent: std::sync::Mutex<Vec<(Vec<u8>, SocketAddr)>>,
    fail_sends: AtomicBool,
}

/// Clones share the same inbox and outbox, so a test keeps one clone to
/// script replies while the client owns the other.
#[derive(Clone)]
pub(crate) struct MockSocket {
    inner: Arc<Inner>,
}

impl MockSocket {
    pub(crate) fn new() -> Self {
        let (feeder, inbox) = unbounded_channel();
        MockSocket {
            inner: Arc::new(Inner {
                feeder,
                inbox: tokio::sync::Mutex::new(inbox),
                sent: std::sync::Mutex::new(Vec::new()),
                fail_sends: AtomicBool::new(false),
            }),
        }
    }

    /// Queue a datagram for immediate receipt.
    pub(crate) fn deliver_now(&self, bytes: Vec<u8>, from: SocketAddr) {
        let _ = self.inner.feeder.send(Ok((bytes, from)));
    }

    /// Queue a datagram once `delay` of (virtual) time has passed.
    pub(crate) fn deliver_after(&self, delay: Duration, bytes: Vec<u8>, from: SocketAddr) {
        let feeder = self.inner.feeder.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = feeder.send(Ok((bytes, from)));
        });
    }

    /// Make the next receive fail with `kind`.
    pub(crate) fn fail_recv(&self, kind: io::ErrorKind) {
        let _ = self.inner.feeder.send(Err(io::Error::from(kind)));
    }

    pub(crate) fn fail_sends(&self) {
        self.inner.fail_sends.store(true, Ordering::SeqCst);
    }

    /// Every frame sent so far, decoded, with its destination.
    pub(crate) fn sent(&self) -> Vec<(Frame, SocketAddr)> {
        let sent = self.inner.sent.lock().unwrap();
        sent.iter()
            .map(|(bytes, to)| (Frame::decode(bytes).unwrap(), *to))
            .collect()
    }
}

impl AsyncUdpSocket for MockSocket {
    async fn bind(_addr: &str) -> io::Result<Self> {
        Ok(MockSocket::new())
    }

    async fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        if self.inner.fail_sends.load(Ordering::SeqCst) {
            return Err(io::Error::other("network unreachable"));
        }
        self.inner.sent.lock().unwrap().push((buf.to_vec(), addr));
        Ok(buf.len())
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let mut inbox = self.inner.inbox.lock().await;
        // The mock holds a sender itself, so the channel never closes.
        let Some(datagram) = inbox.recv().await else {
            return std::future::pending().await;
        };
        let (bytes, from) = datagram?;
        let len = bytes.len().min(buf.len());
        buf[..len].copy_from_slice(&bytes[..len]);
        Ok((len, from))
    }

    fn set_broadcast(&self, _broadcast: bool) -> io::Result<()> {
        Ok(())
    }
}

/// `10.0.0.<host>:56700`
pub(crate) fn addr(host: u8) -> SocketAddr {
    SocketAddr::from(([10, 0, 0, host], 56700))
}

pub(crate) fn id(last: u8) -> DeviceId {
    DeviceId([0xd0, 0x73, 0xd5, 0x00, 0x00, last])
}

/// Encode a reply as device `from` would send it.
pub(crate) fn reply(from: DeviceId, message: Message) -> Vec<u8> {
    Frame::new(
        Header {
            source: 42,
            target: from,
            ..Default::default()
        },
        message,
    )
    .encode()
}

pub(crate) fn state_service(from: DeviceId) -> Vec<u8> {
    reply(
        from,
        Message::StateService {
            service: SERVICE_UDP,
            port: 56700,
        },
    )
}

pub(crate) fn light_state(from: DeviceId, color: Hsbk, power: u16, label: &str) -> Vec<u8> {
    reply(
        from,
        Message::LightState {
            color,
            power,
            label: label.to_string(),
        },
    )
}
