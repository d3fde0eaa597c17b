//! White point temperature.

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// A white point in Kelvin, from 2000K (warm) to 8000K (cool).
///
/// The white point only has a visible effect when saturation is at or near
/// zero, but devices always report one and every color command carries one.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u16", into = "u16")]
pub struct Kelvin(u16);

impl Kelvin {
    pub const MIN: u16 = 2000;
    pub const MAX: u16 = 8000;
    /// Neutral white, what devices ship with.
    pub const NEUTRAL: Kelvin = Kelvin(3500);

    pub fn kelvin(self) -> u16 {
        self.0
    }

    /// Returns `None` if `kelvin` is outside `2000..=8000`.
    ///
    /// ```
    /// use lifx_lights_rs::Kelvin;
    ///
    /// assert!(Kelvin::create(1999).is_none());
    /// assert_eq!(Kelvin::create(2700).map(Kelvin::kelvin), Some(2700));
    /// assert!(Kelvin::create(8001).is_none());
    /// ```
    pub fn create(kelvin: u16) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&kelvin)
            .then_some(Kelvin(kelvin))
    }
}

impl Default for Kelvin {
    fn default() -> Self {
        Kelvin::NEUTRAL
    }
}

impl TryFrom<u16> for Kelvin {
    type Error = Error;

    fn try_from(kelvin: u16) -> Result<Self, Error> {
        Kelvin::create(kelvin).ok_or_else(|| {
            Error::out_of_range(
                "kelvin",
                f64::from(kelvin),
                f64::from(Kelvin::MIN),
                f64::from(Kelvin::MAX),
            )
        })
    }
}

impl From<Kelvin> for u16 {
    fn from(kelvin: Kelvin) -> u16 {
        kelvin.0
    }
}
