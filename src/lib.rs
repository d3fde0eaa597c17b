//! # lifx_lights_rs
//!
//! An async Rust library for discovering and controlling LIFX smart lights
//! over the LIFX LAN protocol.
//!
//! This crate provides a **runtime-agnostic** async API that talks to bulbs on
//! your local network with nothing but UDP broadcast and unicast datagrams. No
//! cloud account or pairing is involved.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::time::Duration;
//! use lifx_lights_rs::{Client, ClientConfig, Color, Scale};
//!
//! async fn paint_it_red() -> Result<(), lifx_lights_rs::Error> {
//!     let client = Client::bind(ClientConfig::default()).await?;
//!
//!     // Wait for up to two bulbs, or one second, whichever comes first
//!     let devices = client.discover(Some(2), Duration::from_secs(1)).await?;
//!
//!     let red = Color::new(0.0, 1.0, 1.0, 3500);
//!     client
//!         .set_state(&devices, &red, Duration::from_millis(300), Scale::Normalized)
//!         .await
//! }
//! ```
//!
//! ## Features
//!
//! - **Runtime Agnostic**: Works with tokio, async-std, or smol async runtimes
//! - **Discovery**: Find bulbs with [`Client::discover`] or [`discover_devices`];
//!   returns as soon as the expected number answered, or when the timeout hits
//! - **State Queries**: Read color, power and label with [`Client::get_state`]
//! - **Commands**: Set color ([`Client::set_state`]) and power
//!   ([`Client::set_power`]) per device or for every device at once
//! - **Scales**: Give colors in degrees and fractions or as raw wire values, see [`Scale`]
//! - **Codec**: Encode and decode protocol frames directly with [`encode`] and [`decode`]
//! - **Diagnostics**: Recent traffic via [`MessageHistory`] and [`Client::diagnostics`]
//!
//! ## Communication
//!
//! Devices listen on UDP port 56700. Discovery and "all devices" commands are
//! sent to the broadcast address, everything else is sent to each device's
//! address. Replies that arrive after a call's timeout are not waited for, and
//! a call that times out returns whatever it collected so far.
//!
//! ## Runtime Selection
//!
//! This library is runtime-agnostic. Select your preferred runtime using feature flags:
//!
//! ### Using tokio (default)
//!
//! ```toml
//! [dependencies]
//! lifx-lights-rs = "0.1"
//! tokio = { version = "1", features = ["rt-multi-thread", "macros"] }
//! ```
//!
//! ### Using async-std
//!
//! ```toml
//! [dependencies]
//! lifx-lights-rs = { version = "0.1", default-features = false, features = ["runtime-async-std"] }
//! async-std = { version = "1.12", features = ["attributes"] }
//! ```
//!
//! ### Using smol
//!
//! ```toml
//! [dependencies]
//! lifx-lights-rs = { version = "0.1", default-features = false, features = ["runtime-smol"] }
//! smol = "2"
//! ```
//!
//! ## Feature Flags
//!
//! - `runtime-tokio` (default): Use the tokio async runtime
//! - `runtime-async-std`: Use the async-std runtime
//! - `runtime-smol`: Use the smol runtime

mod client;
mod codec;
mod config;
mod device;
mod discovery;
mod errors;
mod exchange;
mod history;
pub mod runtime;
mod sequence;
mod session;
mod state;
pub mod types;

// Re-export public API
pub use client::Client;
pub use codec::{
    Frame, HEADER_SIZE, Header, LABEL_SIZE, LIFX_PORT, Message, MessageKind, PROTOCOL_NUMBER,
    SERVICE_UDP, decode, encode,
};
pub use config::ClientConfig;
pub use device::{Device, DeviceId};
pub use discovery::discover_devices;
pub use errors::{DecodeError, Error};
pub use history::{Direction, HistoryEntry, HistorySummary, MessageHistory};
pub use sequence::SequenceGenerator;
pub use state::State;
pub use types::{Color, Hsbk, Kelvin, PowerMode, Scale};
