//! Per-device request/response exchanges: state queries and commands.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::time::Duration;

use log::{debug, trace};

use crate::codec::{Frame, Message};
use crate::device::{Device, DeviceId};
use crate::errors::Error;
use crate::runtime::AsyncUdpSocket;
use crate::session::{Deadline, Session};
use crate::state::State;
use crate::types::{Hsbk, PowerMode};

type Result<T> = std::result::Result<T, Error>;

/// Replies still outstanding for one exchange.
struct Pending<'d, T> {
    devices: &'d [Device],
    wanted: usize,
    replies: HashMap<Device, T>,
}

impl<'d, T> Pending<'d, T> {
    fn new(devices: &'d [Device]) -> Self {
        Pending {
            devices,
            wanted: devices.iter().collect::<HashSet<_>>().len(),
            replies: HashMap::new(),
        }
    }

    fn is_complete(&self) -> bool {
        self.replies.len() >= self.wanted
    }

    /// The requested device a reply came from, unless it already answered.
    ///
    /// Replies are matched on the identifier in their header. A reply without
    /// one, or a device known without one, is matched on the sender's IP.
    fn claim(&self, from: DeviceId, peer: SocketAddr) -> Option<&'d Device> {
        self.devices
            .iter()
            .filter(|device| !self.replies.contains_key(*device))
            .find(|device| {
                if from.is_all() || device.id().is_all() {
                    device.addr().ip() == peer.ip()
                } else {
                    device.id() == from
                }
            })
    }

    fn insert(&mut self, device: Device, reply: T) {
        self.replies.insert(device, reply);
    }
}

/// Collect one reply per device until all have answered or `timeout` passes.
async fn collect<S, T, F>(
    session: &mut Session<'_, S>,
    devices: &[Device],
    timeout: Duration,
    mut extract: F,
) -> Result<HashMap<Device, T>>
where
    S: AsyncUdpSocket,
    F: FnMut(&Device, &Frame) -> Option<T>,
{
    let deadline = Deadline::after(timeout);
    let mut pending = Pending::new(devices);

    while !pending.is_complete() {
        let Some((frame, peer)) = session.next_frame(deadline).await? else {
            break;
        };
        let Some(device) = pending.claim(frame.header.target, peer) else {
            trace!("ignoring {} from {peer}", frame.message.kind());
            continue;
        };
        if let Some(reply) = extract(device, &frame) {
            pending.insert(*device, reply);
        }
    }

    debug!(
        "collected {} of {} replies",
        pending.replies.len(),
        pending.wanted
    );
    Ok(pending.replies)
}

async fn send_each<S: AsyncUdpSocket>(
    session: &mut Session<'_, S>,
    devices: &[Device],
    message: &Message,
    res_required: bool,
) -> Result<()> {
    for device in devices {
        session
            .send(message.clone(), device.id(), device.addr(), res_required)
            .await?;
    }
    Ok(())
}

fn light_state(device: &Device, frame: &Frame) -> Option<State> {
    match &frame.message {
        Message::LightState {
            color,
            power,
            label,
        } => Some(State::from_reply(device.id(), *color, *power, label)),
        _ => None,
    }
}

fn power_state(_device: &Device, frame: &Frame) -> Option<bool> {
    match frame.message {
        Message::StatePower { level } => Some(PowerMode::from_level(level).is_on()),
        _ => None,
    }
}

/// Fade durations are whole milliseconds, saturating at the wire maximum.
pub(crate) fn fade_millis(fade: Duration) -> u32 {
    u32::try_from(fade.as_millis()).unwrap_or(u32::MAX)
}

pub(crate) async fn get_state<S: AsyncUdpSocket>(
    session: &mut Session<'_, S>,
    devices: &[Device],
    timeout: Duration,
) -> Result<HashMap<Device, State>> {
    if devices.is_empty() {
        return Ok(HashMap::new());
    }
    send_each(session, devices, &Message::LightGet, true).await?;
    collect(session, devices, timeout, light_state).await
}

pub(crate) async fn set_state<S: AsyncUdpSocket>(
    session: &mut Session<'_, S>,
    devices: &[Device],
    color: Hsbk,
    fade: Duration,
) -> Result<()> {
    let message = Message::LightSetColor {
        color,
        duration: fade_millis(fade),
    };
    send_each(session, devices, &message, false).await
}

/// Like [`set_state`], then wait for every device to report its new state.
pub(crate) async fn set_state_confirmed<S: AsyncUdpSocket>(
    session: &mut Session<'_, S>,
    devices: &[Device],
    color: Hsbk,
    fade: Duration,
    timeout: Duration,
) -> Result<HashMap<Device, State>> {
    if devices.is_empty() {
        return Ok(HashMap::new());
    }
    let message = Message::LightSetColor {
        color,
        duration: fade_millis(fade),
    };
    send_each(session, devices, &message, true).await?;
    collect(session, devices, timeout, light_state).await
}

pub(crate) async fn set_power<S: AsyncUdpSocket>(
    session: &mut Session<'_, S>,
    devices: &[Device],
    power: PowerMode,
) -> Result<()> {
    let message = Message::SetPower {
        level: power.level(),
    };
    send_each(session, devices, &message, false).await
}

pub(crate) async fn set_power_confirmed<S: AsyncUdpSocket>(
    session: &mut Session<'_, S>,
    devices: &[Device],
    power: PowerMode,
    timeout: Duration,
) -> Result<HashMap<Device, bool>> {
    if devices.is_empty() {
        return Ok(HashMap::new());
    }
    let message = Message::SetPower {
        level: power.level(),
    };
    send_each(session, devices, &message, true).await?;
    collect(session, devices, timeout, power_state).await
}

pub(crate) async fn set_state_all<S: AsyncUdpSocket>(
    session: &mut Session<'_, S>,
    color: Hsbk,
    fade: Duration,
) -> Result<()> {
    session
        .broadcast(Message::LightSetColor {
            color,
            duration: fade_millis(fade),
        })
        .await
        .map(drop)
}

pub(crate) async fn set_power_all<S: AsyncUdpSocket>(
    session: &mut Session<'_, S>,
    power: PowerMode,
) -> Result<()> {
    session
        .broadcast(Message::SetPower {
            level: power.level(),
        })
        .await
        .map(drop)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_millis() {
        assert_eq!(fade_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(fade_millis(Duration::from_micros(2999)), 2);
        assert_eq!(fade_millis(Duration::from_secs(u64::MAX)), u32::MAX);
    }

    #[test]
    fn test_pending_claims_each_device_once() {
        let a = Device::new(DeviceId([1; 6]), "10.0.0.1:56700".parse().unwrap());
        let b = Device::new(DeviceId([2; 6]), "10.0.0.2:56700".parse().unwrap());
        let devices = [a, b, a];
        let mut pending = Pending::new(&devices);
        assert_eq!(pending.wanted, 2);

        let peer = a.addr();
        assert_eq!(pending.claim(a.id(), peer), Some(&a));
        pending.insert(a, ());
        assert_eq!(pending.claim(a.id(), peer), None);
        assert!(!pending.is_complete());

        // No identifier in the reply: fall back to the sender.
        assert_eq!(pending.claim(DeviceId::ALL, b.addr()), Some(&b));
        assert_eq!(pending.claim(DeviceId([3; 6]), b.addr()), None);
        pending.insert(b, ());
        assert!(pending.is_complete());
    }
}

#[cfg(all(test, feature = "runtime-tokio"))]
mod engine_tests {
    use super::*;
    use crate::client::Client;
    use crate::config::ClientConfig;
    use crate::runtime::mock::{MockSocket, addr, id, light_state, reply, state_service};
    use crate::types::{Color, Scale};

    fn client(socket: &MockSocket) -> Client<MockSocket> {
        Client::with_socket(socket.clone(), ClientConfig::default())
    }

    fn device(host: u8) -> Device {
        Device::new(id(host), addr(host))
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_state_ignores_unrequested_devices() {
        let socket = MockSocket::new();
        let red = Hsbk::new(0, 65535, 65535, 3500);
        socket.deliver_after(
            Duration::from_millis(10),
            light_state(id(3), red, 65535, "C"),
            addr(3),
        );
        socket.deliver_after(
            Duration::from_millis(20),
            light_state(id(1), red, 65535, "A"),
            addr(1),
        );
        socket.deliver_after(
            Duration::from_millis(30),
            light_state(id(2), red, 0, "B"),
            addr(2),
        );

        let start = tokio::time::Instant::now();
        let states = client(&socket)
            .get_state(&[device(1), device(2)], Duration::from_secs(5))
            .await
            .unwrap();

        assert!(start.elapsed() < Duration::from_millis(100));
        assert_eq!(states.len(), 2);
        assert_eq!(states[&device(1)].label(), "A");
        assert!(states[&device(1)].power());
        assert_eq!(states[&device(2)].label(), "B");
        assert!(!states[&device(2)].power());
        assert_eq!(states[&device(2)].hue(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_state_sends_unicast_requests() {
        let socket = MockSocket::new();
        let client = client(&socket);
        client
            .get_state(&[device(1), device(2)], Duration::from_millis(50))
            .await
            .unwrap();

        let sent = socket.sent();
        assert_eq!(sent.len(), 2);
        for ((frame, to), host) in sent.iter().zip([1, 2]) {
            assert_eq!(*to, addr(host));
            assert_eq!(frame.message, Message::LightGet);
            assert_eq!(frame.header.target, id(host));
            assert!(!frame.header.tagged);
            assert!(frame.header.res_required);
            assert_eq!(frame.header.source, client.source());
        }
        assert_ne!(sent[0].0.header.sequence, sent[1].0.header.sequence);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_state_partial_on_timeout() {
        let socket = MockSocket::new();
        socket.deliver_after(
            Duration::from_millis(10),
            light_state(id(1), Hsbk::default(), 0, "A"),
            addr(1),
        );
        // Wrong kind of reply from a requested device does not count.
        socket.deliver_after(
            Duration::from_millis(20),
            reply(id(2), Message::StatePower { level: 65535 }),
            addr(2),
        );

        let start = tokio::time::Instant::now();
        let states = client(&socket)
            .get_state(&[device(1), device(2)], Duration::from_millis(300))
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_millis(300));
        assert_eq!(states.len(), 1);
        assert!(states.contains_key(&device(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_reply_wins() {
        let socket = MockSocket::new();
        socket.deliver_now(light_state(id(1), Hsbk::default(), 0, "first"), addr(1));
        socket.deliver_now(light_state(id(1), Hsbk::default(), 0, "second"), addr(1));

        let states = client(&socket)
            .get_state(&[device(1)], Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(states[&device(1)].label(), "first");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_device_set_is_a_no_op() {
        let socket = MockSocket::new();
        let client = client(&socket);

        let start = tokio::time::Instant::now();
        let states = client.get_state(&[], Duration::from_secs(5)).await.unwrap();
        assert!(states.is_empty());
        let white = Color::white(1.0, 3500);
        client
            .set_state(&[], &white, Duration::ZERO, Scale::Normalized)
            .await
            .unwrap();
        assert!(
            client
                .set_power_confirmed(&[], true, Duration::from_secs(5))
                .await
                .unwrap()
                .is_empty()
        );

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(socket.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_state_encodes_wire_color() {
        let socket = MockSocket::new();
        client(&socket)
            .set_state(
                &[device(1)],
                &Color::new(180.0, 0.5, 1.0, 4000),
                Duration::from_millis(1500),
                Scale::Normalized,
            )
            .await
            .unwrap();

        let sent = socket.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].0.message,
            Message::LightSetColor {
                color: Hsbk::new(32768, 32768, 65535, 4000),
                duration: 1500,
            }
        );
        assert!(!sent[0].0.header.res_required);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_state_raw_passthrough() {
        let socket = MockSocket::new();
        client(&socket)
            .set_state(
                &[device(1)],
                &Color::new(1000.0, 2000.0, 3000.0, 9000),
                Duration::ZERO,
                Scale::Raw,
            )
            .await
            .unwrap();

        assert_eq!(
            socket.sent()[0].0.message,
            Message::LightSetColor {
                color: Hsbk::new(1000, 2000, 3000, 9000),
                duration: 0,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_range_rejected_before_sending() {
        let socket = MockSocket::new();
        let client = client(&socket);

        for color in [
            Color::new(400.0, 0.5, 0.5, 3500),
            Color::new(90.0, -0.1, 0.5, 3500),
            Color::new(90.0, 0.5, f64::NAN, 3500),
            Color::new(90.0, 0.5, 0.5, 1500),
        ] {
            let err = client
                .set_state(&[device(1)], &color, Duration::ZERO, Scale::Normalized)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::OutOfRange { .. }));
        }
        let err = client
            .set_state_all(&Color::new(70000.0, 0.0, 0.0, 0), Duration::ZERO, Scale::Raw)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::OutOfRange { field: "hue", .. }));

        assert!(socket.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_state_confirmed_collects_states() {
        let socket = MockSocket::new();
        let blue = Hsbk::new(43690, 65535, 65535, 3500);
        socket.deliver_after(
            Duration::from_millis(40),
            light_state(id(1), blue, 65535, "A"),
            addr(1),
        );

        let states = client(&socket)
            .set_state_confirmed(
                &[device(1)],
                &Color::new(240.0, 1.0, 1.0, 3500),
                Duration::ZERO,
                Scale::Normalized,
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        assert_eq!(states[&device(1)].hsbk(), blue);
        assert_eq!(states[&device(1)].hue(), 240.0);
        assert!(socket.sent()[0].0.header.res_required);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_power_levels() {
        let socket = MockSocket::new();
        let client = client(&socket);
        client.set_power(&[device(1)], true).await.unwrap();
        client.set_power(&[device(1)], false).await.unwrap();

        let levels: Vec<Message> = socket
            .sent()
            .into_iter()
            .map(|(frame, _)| frame.message)
            .collect();
        assert_eq!(
            levels,
            vec![
                Message::SetPower { level: 65535 },
                Message::SetPower { level: 0 }
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_power_confirmed() {
        let socket = MockSocket::new();
        socket.deliver_after(
            Duration::from_millis(5),
            reply(id(1), Message::StatePower { level: 65535 }),
            addr(1),
        );
        socket.deliver_after(
            Duration::from_millis(6),
            reply(DeviceId::ALL, Message::StatePower { level: 0 }),
            addr(2),
        );

        let powers = client(&socket)
            .set_power_confirmed(&[device(1), device(2)], true, Duration::from_secs(1))
            .await
            .unwrap();

        assert!(powers[&device(1)]);
        assert!(!powers[&device(2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_variants_broadcast_one_tagged_frame() {
        let socket = MockSocket::new();
        let client = client(&socket);
        client
            .set_state_all(&Color::white(0.5, 2700), Duration::from_secs(2), Scale::Normalized)
            .await
            .unwrap();
        client.set_power_all(false).await.unwrap();

        let sent = socket.sent();
        assert_eq!(sent.len(), 2);
        for (frame, to) in &sent {
            assert_eq!(to.to_string(), "255.255.255.255:56700");
            assert!(frame.header.tagged);
            assert!(frame.header.target.is_all());
        }
        assert_eq!(
            sent[0].0.message,
            Message::LightSetColor {
                color: Hsbk::new(0, 0, 32768, 2700),
                duration: 2000,
            }
        );
        assert_eq!(sent[1].0.message, Message::SetPower { level: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_discovers_then_queries() {
        let socket = MockSocket::new();
        socket.deliver_after(Duration::from_millis(10), state_service(id(1)), addr(1));
        socket.deliver_after(
            Duration::from_millis(20),
            light_state(id(1), Hsbk::default(), 65535, "Kitchen"),
            addr(1),
        );

        let states = client(&socket)
            .refresh(Some(1), Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(states.len(), 1);
        assert_eq!(states[0].label(), "Kitchen");
        assert_eq!(states[0].device_id(), id(1));
    }
}
