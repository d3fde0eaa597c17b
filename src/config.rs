//! Client configuration.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};

use crate::codec::LIFX_PORT;

/// Settings for a [`crate::Client`].
///
/// Every field has a default, so a partial document deserializes fine.
/// Durations are expressed in milliseconds.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use lifx_lights_rs::ClientConfig;
///
/// let config: ClientConfig =
///     serde_json::from_str(r#"{"default_timeout": 2500, "source": 77}"#).unwrap();
/// assert_eq!(config.default_timeout, Duration::from_millis(2500));
/// assert_eq!(config.source, Some(77));
/// assert_eq!(config.port, 56700);
/// ```
#[serde_as]
#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Port devices listen on.
    pub port: u16,
    /// Address discovery and "all devices" frames are broadcast to.
    pub broadcast: Ipv4Addr,
    /// Local address [`crate::Client::bind`] binds to.
    pub bind_addr: SocketAddr,
    /// Fixed source identifier. A random non-zero one is chosen when unset.
    pub source: Option<u32>,
    pub recv_buffer_size: usize,
    /// Timeout for [`crate::Client::discover_default`] and
    /// [`crate::Client::get_state_default`].
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub default_timeout: Duration,
    /// Re-send the discovery frame at this interval while waiting for replies.
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    pub rebroadcast_interval: Option<Duration>,
    /// Number of frames kept in the message history.
    pub history_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            port: LIFX_PORT,
            broadcast: Ipv4Addr::BROADCAST,
            bind_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)),
            source: None,
            recv_buffer_size: 65536,
            default_timeout: Duration::from_secs(1),
            rebroadcast_interval: None,
            history_size: 100,
        }
    }
}

impl ClientConfig {
    pub fn broadcast_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.broadcast, self.port))
    }

    /// The rebroadcast interval, with a zero interval meaning "never".
    pub(crate) fn rebroadcast_every(&self) -> Option<Duration> {
        self.rebroadcast_interval.filter(|every| !every.is_zero())
    }
}
