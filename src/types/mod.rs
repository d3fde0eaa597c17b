//! Value types for light control parameters.

mod color;
mod hsbk;
mod kelvin;
mod power;

pub use color::{Color, Scale, hue_from_wire, hue_to_wire, unit_from_wire, unit_to_wire};
pub use hsbk::Hsbk;
pub use kelvin::Kelvin;
pub use power::PowerMode;
