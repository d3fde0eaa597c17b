//! Caller-facing color values and their conversion to wire scale.

use serde::{Deserialize, Serialize};

use super::{Hsbk, Kelvin};
use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

const WIRE_MAX: f64 = u16::MAX as f64;
const HUE_MAX: f64 = 360.0;

/// The scale a [`Color`] is expressed in.
///
/// - `Normalized`: hue in degrees (0-360), saturation and brightness as
///   fractions (0.0-1.0), kelvin 2000-8000.
/// - `Raw`: hue, saturation and brightness are wire integers (0-65535) and
///   kelvin is sent verbatim.
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    #[default]
    Normalized,
    Raw,
}

/// A light color as a caller sees it.
///
/// The meaning of each field depends on the [`Scale`] it is used with.
///
/// # Examples
///
/// ```
/// use lifx_lights_rs::{Color, Scale};
///
/// let teal = Color::new(180.0, 0.5, 1.0, 3500);
/// let wire = Scale::Normalized.to_wire(&teal).unwrap();
/// assert_eq!(wire.brightness, 65535);
/// assert_eq!(Scale::Normalized.from_wire(&wire).hue, 180.0);
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Color {
    pub hue: f64,
    pub saturation: f64,
    pub brightness: f64,
    pub kelvin: u16,
}

impl Color {
    pub fn new(hue: f64, saturation: f64, brightness: f64, kelvin: u16) -> Self {
        Color {
            hue,
            saturation,
            brightness,
            kelvin,
        }
    }

    /// A white at the given normalized brightness and white point.
    pub fn white(brightness: f64, kelvin: u16) -> Self {
        Color::new(0.0, 0.0, brightness, kelvin)
    }
}

impl Scale {
    /// Convert a color in this scale to wire values.
    ///
    /// Out-of-range and non-finite inputs are rejected, never clamped or
    /// wrapped.
    ///
    /// # Examples
    ///
    /// ```
    /// use lifx_lights_rs::{Color, Scale};
    ///
    /// assert!(Scale::Normalized.to_wire(&Color::new(361.0, 0.5, 0.5, 3500)).is_err());
    /// assert!(Scale::Normalized.to_wire(&Color::new(90.0, 1.5, 0.5, 3500)).is_err());
    /// assert!(Scale::Normalized.to_wire(&Color::new(90.0, 0.5, 0.5, 9000)).is_err());
    ///
    /// let raw = Scale::Raw.to_wire(&Color::new(1000.0, 2000.0, 3000.0, 0)).unwrap();
    /// assert_eq!((raw.hue, raw.saturation, raw.brightness, raw.kelvin), (1000, 2000, 3000, 0));
    /// ```
    pub fn to_wire(self, color: &Color) -> Result<Hsbk> {
        match self {
            Scale::Normalized => {
                let hue = check("hue", color.hue, 0.0, HUE_MAX)?;
                let saturation = check("saturation", color.saturation, 0.0, 1.0)?;
                let brightness = check("brightness", color.brightness, 0.0, 1.0)?;
                let kelvin = Kelvin::try_from(color.kelvin)?;
                Ok(Hsbk::new(
                    hue_to_wire(hue),
                    unit_to_wire(saturation),
                    unit_to_wire(brightness),
                    kelvin.kelvin(),
                ))
            }
            Scale::Raw => {
                let hue = check("hue", color.hue, 0.0, WIRE_MAX)?;
                let saturation = check("saturation", color.saturation, 0.0, WIRE_MAX)?;
                let brightness = check("brightness", color.brightness, 0.0, WIRE_MAX)?;
                Ok(Hsbk::new(
                    hue.round() as u16,
                    saturation.round() as u16,
                    brightness.round() as u16,
                    color.kelvin,
                ))
            }
        }
    }

    /// Convert wire values to a color in this scale.
    pub fn from_wire(self, hsbk: &Hsbk) -> Color {
        match self {
            Scale::Normalized => Color::new(
                hue_from_wire(hsbk.hue),
                unit_from_wire(hsbk.saturation),
                unit_from_wire(hsbk.brightness),
                hsbk.kelvin,
            ),
            Scale::Raw => Color::new(
                f64::from(hsbk.hue),
                f64::from(hsbk.saturation),
                f64::from(hsbk.brightness),
                hsbk.kelvin,
            ),
        }
    }
}

/// Degrees (0-360) to wire scale. The caller guarantees the range.
pub fn hue_to_wire(degrees: f64) -> u16 {
    (degrees * WIRE_MAX / HUE_MAX).round() as u16
}

/// Wire scale to whole degrees.
///
/// One degree spans ~182 wire units, so rounding makes every integer hue
/// survive a round trip exactly.
pub fn hue_from_wire(wire: u16) -> f64 {
    (f64::from(wire) * HUE_MAX / WIRE_MAX).round()
}

/// A fraction (0.0-1.0) to wire scale. The caller guarantees the range.
pub fn unit_to_wire(fraction: f64) -> u16 {
    (fraction * WIRE_MAX).round() as u16
}

pub fn unit_from_wire(wire: u16) -> f64 {
    f64::from(wire) / WIRE_MAX
}

fn check(field: &'static str, value: f64, min: f64, max: f64) -> Result<f64> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(Error::out_of_range(field, value, min, max))
    }
}
