//! Power mode for light control.

use serde::{Deserialize, Serialize};

/// Power state for a light.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum PowerMode {
    /// Turn the light on
    On,
    /// Turn the light off
    Off,
}

impl PowerMode {
    /// The 16-bit level carried by power frames.
    ///
    /// ```
    /// use lifx_lights_rs::PowerMode;
    ///
    /// assert_eq!(PowerMode::On.level(), 65535);
    /// assert_eq!(PowerMode::Off.level(), 0);
    /// ```
    pub fn level(self) -> u16 {
        match self {
            PowerMode::On => u16::MAX,
            PowerMode::Off => 0,
        }
    }

    /// Devices report intermediate levels while fading; anything non-zero is on.
    pub fn from_level(level: u16) -> Self {
        if level == 0 {
            PowerMode::Off
        } else {
            PowerMode::On
        }
    }

    pub fn is_on(self) -> bool {
        self == PowerMode::On
    }
}

impl From<bool> for PowerMode {
    fn from(on: bool) -> Self {
        if on { PowerMode::On } else { PowerMode::Off }
    }
}
