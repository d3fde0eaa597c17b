//! The LIFX LAN client.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::codec::HEADER_SIZE;
use crate::config::ClientConfig;
use crate::device::Device;
use crate::discovery;
use crate::errors::Error;
use crate::exchange;
use crate::history::MessageHistory;
use crate::runtime::{self, AsyncUdpSocket, JoinHandle, Mutex, UdpSocket};
use crate::sequence::SequenceGenerator;
use crate::session::Session;
use crate::state::State;
use crate::types::{Color, PowerMode, Scale};

type Result<T> = std::result::Result<T, Error>;

/// Everything one engine call needs exclusive access to.
struct Inner<S> {
    socket: S,
    history: MessageHistory,
    buf: Vec<u8>,
}

/// A client for LIFX devices on the local network.
///
/// The client owns one UDP socket. Every call (discovery, state query or
/// command) takes the socket for its whole duration, so concurrent calls on
/// one client run one after another instead of reading each other's replies.
/// Use several clients to run calls in parallel.
///
/// # Examples
///
/// ```ignore
/// use std::time::Duration;
/// use lifx_lights_rs::{Client, ClientConfig, Color, Scale};
///
/// let client = Client::bind(ClientConfig::default()).await?;
/// let devices = client.discover(None, Duration::from_secs(1)).await?;
///
/// let red = Color::new(0.0, 1.0, 1.0, 3500);
/// client
///     .set_state(&devices, &red, Duration::from_millis(500), Scale::Normalized)
///     .await?;
///
/// for (device, state) in client.get_state(&devices, Duration::from_secs(1)).await? {
///     println!("{device}: {} power={}", state.label(), state.power());
/// }
/// ```
pub struct Client<S = UdpSocket> {
    inner: Mutex<Inner<S>>,
    config: ClientConfig,
    source: u32,
    sequence: SequenceGenerator,
}

impl Client {
    /// Bind a UDP socket at `config.bind_addr` with broadcast enabled.
    pub async fn bind(config: ClientConfig) -> Result<Self> {
        let socket = UdpSocket::bind(&config.bind_addr.to_string())
            .await
            .map_err(|e| Error::socket("bind", e))?;

        socket
            .set_broadcast(true)
            .map_err(|e| Error::socket("set_broadcast", e))?;

        Ok(Client::with_socket(socket, config))
    }
}

impl<S: AsyncUdpSocket> Client<S> {
    /// Build a client on an already configured transport.
    ///
    /// The socket must be able to send to `config.broadcast_addr()`.
    pub fn with_socket(socket: S, config: ClientConfig) -> Self {
        let source = config.source.unwrap_or_else(random_source);
        debug!("client source id {source:#010x}");

        Client {
            inner: Mutex::new(Inner {
                socket,
                history: MessageHistory::with_max_entries(config.history_size),
                buf: vec![0; config.recv_buffer_size.max(HEADER_SIZE)],
            }),
            config,
            source,
            sequence: SequenceGenerator::new(),
        }
    }

    /// Source identifier stamped on every frame this client sends.
    pub fn source(&self) -> u32 {
        self.source
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A snapshot of the recent traffic.
    pub async fn history(&self) -> MessageHistory {
        self.inner.lock().await.history.clone()
    }

    pub async fn clear_history(&self) {
        self.inner.lock().await.history.clear();
    }

    /// Returns diagnostics including configuration and history.
    pub async fn diagnostics(&self) -> Value {
        let mut diag = json!({
            "source": self.source,
            "sequence": self.sequence.current(),
            "config": serde_json::to_value(&self.config).unwrap_or(Value::Null),
        });

        let inner = self.inner.lock().await;
        diag["history"] = serde_json::to_value(inner.history.summary()).unwrap_or(Value::Null);
        diag
    }

    /// Broadcast a discovery request and collect the devices that answer.
    ///
    /// Returns once `expected` distinct devices have replied or `timeout`
    /// elapses. With `expected` unset the full timeout is always waited. A
    /// zero timeout only picks up replies that are already buffered.
    ///
    /// Devices are returned in the order they first replied, each once.
    pub async fn discover(&self, expected: Option<usize>, timeout: Duration) -> Result<Vec<Device>> {
        self.discover_with(expected, timeout, |_| {}).await
    }

    /// [`Client::discover`] bounded by `config.default_timeout`.
    pub async fn discover_default(&self, expected: Option<usize>) -> Result<Vec<Device>> {
        self.discover(expected, self.config.default_timeout).await
    }

    /// Like [`Client::discover`], calling `on_device` as each new device replies.
    pub async fn discover_with<F>(
        &self,
        expected: Option<usize>,
        timeout: Duration,
        on_device: F,
    ) -> Result<Vec<Device>>
    where
        F: FnMut(&Device),
    {
        let mut inner = self.inner.lock().await;
        let mut session = self.session(&mut inner);
        discovery::discover(&mut session, expected, timeout, on_device).await
    }

    /// Run [`Client::discover`] as a background task.
    pub fn spawn_discover(
        self: &Arc<Self>,
        expected: Option<usize>,
        timeout: Duration,
    ) -> JoinHandle<Result<Vec<Device>>>
    where
        S: 'static,
    {
        let client = Arc::clone(self);
        runtime::spawn(async move { client.discover(expected, timeout).await })
    }

    /// Query the current state of each device.
    ///
    /// Devices that do not answer within `timeout` are missing from the
    /// result. Replies from devices that were not asked are ignored.
    pub async fn get_state(
        &self,
        devices: &[Device],
        timeout: Duration,
    ) -> Result<HashMap<Device, State>> {
        let mut inner = self.inner.lock().await;
        let mut session = self.session(&mut inner);
        exchange::get_state(&mut session, devices, timeout).await
    }

    /// [`Client::get_state`] bounded by `config.default_timeout`.
    pub async fn get_state_default(&self, devices: &[Device]) -> Result<HashMap<Device, State>> {
        self.get_state(devices, self.config.default_timeout).await
    }

    /// Change the color of each device, fading over `fade`.
    ///
    /// The color is checked against `scale` before anything is sent; values
    /// outside the accepted range fail with [`Error::OutOfRange`].
    pub async fn set_state(
        &self,
        devices: &[Device],
        color: &Color,
        fade: Duration,
        scale: Scale,
    ) -> Result<()> {
        let hsbk = scale.to_wire(color)?;
        let mut inner = self.inner.lock().await;
        let mut session = self.session(&mut inner);
        exchange::set_state(&mut session, devices, hsbk, fade).await
    }

    /// Like [`Client::set_state`], then collect the state each device reports.
    pub async fn set_state_confirmed(
        &self,
        devices: &[Device],
        color: &Color,
        fade: Duration,
        scale: Scale,
        timeout: Duration,
    ) -> Result<HashMap<Device, State>> {
        let hsbk = scale.to_wire(color)?;
        let mut inner = self.inner.lock().await;
        let mut session = self.session(&mut inner);
        exchange::set_state_confirmed(&mut session, devices, hsbk, fade, timeout).await
    }

    pub async fn set_power(&self, devices: &[Device], on: bool) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let mut session = self.session(&mut inner);
        exchange::set_power(&mut session, devices, PowerMode::from(on)).await
    }

    /// Switch each device on or off and collect the power level it reports.
    pub async fn set_power_confirmed(
        &self,
        devices: &[Device],
        on: bool,
        timeout: Duration,
    ) -> Result<HashMap<Device, bool>> {
        let mut inner = self.inner.lock().await;
        let mut session = self.session(&mut inner);
        exchange::set_power_confirmed(&mut session, devices, PowerMode::from(on), timeout).await
    }

    /// Change the color of every device with a single broadcast frame.
    pub async fn set_state_all(&self, color: &Color, fade: Duration, scale: Scale) -> Result<()> {
        let hsbk = scale.to_wire(color)?;
        let mut inner = self.inner.lock().await;
        let mut session = self.session(&mut inner);
        exchange::set_state_all(&mut session, hsbk, fade).await
    }

    pub async fn set_power_all(&self, on: bool) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let mut session = self.session(&mut inner);
        exchange::set_power_all(&mut session, PowerMode::from(on)).await
    }

    /// Discover devices, then query each one's state.
    ///
    /// States are returned in discovery order. Both steps use `timeout`.
    pub async fn refresh(&self, expected: Option<usize>, timeout: Duration) -> Result<Vec<State>> {
        let devices = self.discover(expected, timeout).await?;
        let mut states = self.get_state(&devices, timeout).await?;
        Ok(devices
            .iter()
            .filter_map(|device| states.remove(device))
            .collect())
    }

    fn session<'a>(&'a self, inner: &'a mut Inner<S>) -> Session<'a, S> {
        Session::new(
            &inner.socket,
            &mut inner.history,
            &mut inner.buf,
            &self.config,
            &self.sequence,
            self.source,
        )
    }
}

// Devices use source 0 to mean "broadcast the reply", so never pick it.
fn random_source() -> u32 {
    match Uuid::new_v4().as_u128() as u32 {
        0 => 1,
        source => source,
    }
}

#[cfg(all(test, feature = "runtime-tokio"))]
mod tests {
    use super::*;
    use crate::runtime::mock::{MockSocket, addr, id, state_service};

    #[test]
    fn test_random_source_is_non_zero() {
        for _ in 0..32 {
            assert_ne!(random_source(), 0);
        }
    }

    #[tokio::test]
    async fn test_fixed_source_from_config() {
        let config = ClientConfig {
            source: Some(0xfeed),
            ..Default::default()
        };
        let client = Client::with_socket(MockSocket::new(), config);
        assert_eq!(client.source(), 0xfeed);
    }

    #[tokio::test]
    async fn test_clients_have_independent_sequences() {
        let first_socket = MockSocket::new();
        let second_socket = MockSocket::new();
        let first = Client::with_socket(first_socket.clone(), ClientConfig::default());
        let second = Client::with_socket(second_socket.clone(), ClientConfig::default());

        first.set_power_all(true).await.unwrap();
        first.set_power_all(true).await.unwrap();
        second.set_power_all(true).await.unwrap();

        assert_eq!(first_socket.sent()[1].0.header.sequence, 1);
        assert_eq!(second_socket.sent()[0].0.header.sequence, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_diagnostics() {
        let socket = MockSocket::new();
        socket.deliver_now(state_service(id(1)), addr(1));
        socket.deliver_now(b"noise".to_vec(), addr(2));

        let client = Client::with_socket(
            socket,
            ClientConfig {
                source: Some(99),
                ..Default::default()
            },
        );
        client
            .discover(Some(1), Duration::from_secs(1))
            .await
            .unwrap();

        let diag = client.diagnostics().await;
        assert_eq!(diag["source"], 99);
        assert_eq!(diag["sequence"], 1);
        assert_eq!(diag["config"]["port"], 56700);
        assert_eq!(diag["history"]["sent_count"], 1);
        assert_eq!(diag["history"]["received_count"], 1);
        assert_eq!(diag["history"]["dropped_count"], 0);

        client.clear_history().await;
        assert!(client.history().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_timeout_bounds_calls_without_one() {
        let socket = MockSocket::new();
        socket.deliver_after(Duration::from_millis(20), state_service(id(1)), addr(1));
        let config = ClientConfig {
            default_timeout: Duration::from_millis(300),
            ..Default::default()
        };
        let client = Client::with_socket(socket, config);

        let start = tokio::time::Instant::now();
        let devices = client.discover_default(Some(3)).await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(300) && elapsed < Duration::from_millis(350));
        assert_eq!(devices.len(), 1);

        let start = tokio::time::Instant::now();
        let states = client.get_state_default(&devices).await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(300) && elapsed < Duration::from_millis(350));
        assert!(states.is_empty());
    }

    #[tokio::test]
    async fn test_history_is_bounded_by_config() {
        let config = ClientConfig {
            history_size: 2,
            ..Default::default()
        };
        let client = Client::with_socket(MockSocket::new(), config);
        for _ in 0..5 {
            client.set_power_all(false).await.unwrap();
        }

        let history = client.history().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history.summary().sent_count, 5);
    }
}
