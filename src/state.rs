//! Light state snapshots.

use serde::{Deserialize, Serialize};

use crate::device::DeviceId;
use crate::types::{Color, Hsbk, PowerMode, Scale};

/// The state one device reported at one point in time.
///
/// States are only produced by decoding a reply; a new query yields a new
/// snapshot rather than updating an old one.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct State {
    device_id: DeviceId,
    color: Hsbk,
    power: bool,
    label: String,
}

impl State {
    pub(crate) fn from_reply(device_id: DeviceId, color: Hsbk, power: u16, label: &str) -> Self {
        State {
            device_id,
            color,
            power: PowerMode::from_level(power).is_on(),
            label: label.to_string(),
        }
    }

    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    /// Wire-scale color as reported.
    pub fn hsbk(&self) -> Hsbk {
        self.color
    }

    /// Color in the requested scale.
    pub fn color(&self, scale: Scale) -> Color {
        scale.from_wire(&self.color)
    }

    /// Hue in whole degrees (0-360).
    pub fn hue(&self) -> f64 {
        self.color(Scale::Normalized).hue
    }

    pub fn saturation(&self) -> f64 {
        self.color(Scale::Normalized).saturation
    }

    pub fn brightness(&self) -> f64 {
        self.color(Scale::Normalized).brightness
    }

    pub fn kelvin(&self) -> u16 {
        self.color.kelvin
    }

    pub fn power(&self) -> bool {
        self.power
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_accessors() {
        let state = State::from_reply(
            DeviceId([1, 2, 3, 4, 5, 6]),
            Hsbk::new(32768, 65535, 0, 3500),
            65535,
            "Desk",
        );
        assert_eq!(state.hue(), 180.0);
        assert_eq!(state.saturation(), 1.0);
        assert_eq!(state.brightness(), 0.0);
        assert_eq!(state.kelvin(), 3500);
        assert!(state.power());
        assert_eq!(state.label(), "Desk");
        assert_eq!(state.color(Scale::Raw).hue, 32768.0);
    }

    #[test]
    fn test_zero_power_is_off() {
        let state = State::from_reply(DeviceId::ALL, Hsbk::default(), 0, "");
        assert!(!state.power());
    }
}
