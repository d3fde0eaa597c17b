//! Device identity and addressing.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The 6-byte hardware address that uniquely names a LIFX device.
///
/// It travels in the `target` field of every frame header. The all-zero
/// identifier ([`DeviceId::ALL`]) addresses every device.
///
/// # Examples
///
/// ```
/// use lifx_lights_rs::DeviceId;
///
/// let id: DeviceId = "d0:73:d5:01:02:03".parse().unwrap();
/// assert_eq!(id.to_string(), "d0:73:d5:01:02:03");
/// assert!(!id.is_all());
/// assert!("d0:73:d5".parse::<DeviceId>().is_err());
/// ```
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub [u8; 6]);

impl DeviceId {
    pub const ALL: DeviceId = DeviceId([0; 6]);

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    pub fn is_all(&self) -> bool {
        *self == Self::ALL
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for DeviceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(format!("expected 6 colon separated octets in {s:?}"));
        }

        let mut bytes = [0u8; 6];
        for (slot, part) in bytes.iter_mut().zip(parts) {
            *slot = u8::from_str_radix(part, 16).map_err(|e| format!("bad octet {part:?}: {e}"))?;
        }
        Ok(DeviceId(bytes))
    }
}

/// A LIFX device found on the network.
///
/// Devices are produced by discovery, but can also be built by hand when
/// the address and identifier are already known.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Device {
    id: DeviceId,
    addr: SocketAddr,
}

impl Device {
    pub fn new(id: DeviceId, addr: SocketAddr) -> Self {
        Device { id, addr }
    }

    /// Hardware identifier, stable across discoveries.
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Endpoint to send unicast requests to. May change between runs.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.addr)
    }
}
