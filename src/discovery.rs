//! Device discovery via UDP broadcast.

use std::net::SocketAddr;
use std::time::Duration;

use log::debug;

use crate::client::Client;
use crate::codec::{Frame, Message, SERVICE_UDP};
use crate::config::ClientConfig;
use crate::device::Device;
use crate::errors::Error;
use crate::runtime::AsyncUdpSocket;
use crate::session::{Deadline, Session};

type Result<T> = std::result::Result<T, Error>;

/// Discover LIFX devices on the local network with a default [`Client`].
///
/// Binds a fresh socket, broadcasts one discovery request and collects
/// replies until `expected` distinct devices have answered or `timeout`
/// elapses, whichever comes first. Running out of time is not an error: the
/// devices found so far are returned.
///
/// # Examples
///
/// ```ignore
/// use std::time::Duration;
/// use lifx_lights_rs::discover_devices;
///
/// let devices = discover_devices(None, Duration::from_secs(2)).await?;
/// println!("Found {} devices", devices.len());
/// for device in devices {
///     println!("  {device}");
/// }
/// ```
pub async fn discover_devices(expected: Option<usize>, timeout: Duration) -> Result<Vec<Device>> {
    Client::bind(ClientConfig::default())
        .await?
        .discover(expected, timeout)
        .await
}

/// Broadcast a discovery request and collect distinct devices in arrival order.
pub(crate) async fn discover<S, F>(
    session: &mut Session<'_, S>,
    expected: Option<usize>,
    timeout: Duration,
    mut on_device: F,
) -> Result<Vec<Device>>
where
    S: AsyncUdpSocket,
    F: FnMut(&Device),
{
    let deadline = Deadline::after(timeout);
    let every = session.config().rebroadcast_every();
    let mut found = Found::new(expected);

    session.broadcast(Message::GetService).await?;
    let mut next_broadcast = every.map(Deadline::after);

    while !found.is_complete() {
        let (wait, rebroadcast_due) = match next_broadcast {
            Some(next) if next.remaining() < deadline.remaining() => (next, true),
            _ => (deadline, false),
        };

        match session.next_frame(wait).await? {
            Some((frame, peer)) => {
                if let Some(device) = device_from_reply(&frame, peer) {
                    if found.insert(device) {
                        debug!("discovered {device}");
                        on_device(&device);
                    }
                }
            }
            None if rebroadcast_due => {
                session.broadcast(Message::GetService).await?;
                next_broadcast = every.map(Deadline::after);
            }
            None => break,
        }
    }

    debug!(
        "discovery finished with {} device(s), expected {expected:?}",
        found.devices.len()
    );
    Ok(found.devices)
}

/// Devices seen so far in one discovery call.
struct Found {
    expected: Option<usize>,
    devices: Vec<Device>,
}

impl Found {
    fn new(expected: Option<usize>) -> Self {
        Found {
            expected,
            devices: Vec::new(),
        }
    }

    fn is_complete(&self) -> bool {
        self.expected
            .is_some_and(|expected| self.devices.len() >= expected)
    }

    /// Returns false when the device already replied.
    fn insert(&mut self, device: Device) -> bool {
        if self.devices.iter().any(|seen| same_device(seen, &device)) {
            return false;
        }
        self.devices.push(device);
        true
    }
}

// Replies without an identifier can only be told apart by address.
fn same_device(a: &Device, b: &Device) -> bool {
    if a.id().is_all() || b.id().is_all() {
        a.id() == b.id() && a.addr() == b.addr()
    } else {
        a.id() == b.id()
    }
}

fn device_from_reply(frame: &Frame, peer: SocketAddr) -> Option<Device> {
    match frame.message {
        Message::StateService {
            service: SERVICE_UDP,
            port,
        } => {
            let port = u16::try_from(port).ok().filter(|port| *port != 0)?;
            Some(Device::new(
                frame.header.target,
                SocketAddr::new(peer.ip(), port),
            ))
        }
        _ => None,
    }
}
