//! Wire-scale color representation.

use serde::{Deserialize, Serialize};

/// Hue, saturation, brightness and kelvin exactly as they travel on the wire.
///
/// Hue, saturation and brightness use the full `0..=65535` range; kelvin is the
/// white point in degrees. Use [`crate::Scale`] to convert to and from the
/// caller-facing [`crate::Color`].
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hsbk {
    pub hue: u16,
    pub saturation: u16,
    pub brightness: u16,
    pub kelvin: u16,
}

impl Hsbk {
    /// Size of an encoded `Hsbk` in bytes.
    pub const WIRE_SIZE: usize = 8;

    pub fn new(hue: u16, saturation: u16, brightness: u16, kelvin: u16) -> Self {
        Hsbk {
            hue,
            saturation,
            brightness,
            kelvin,
        }
    }
}
