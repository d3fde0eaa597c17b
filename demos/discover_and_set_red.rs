//! Discover LIFX lights on the network and set them to red.
//!
//! This example demonstrates:
//! - Discovery of LIFX bulbs on the local network
//! - Setting every discovered light to red with a short fade
//! - Reading the state back to confirm the change
//!
//! Run with: cargo run --example discover_and_set_red

use std::time::Duration;
use lifx_lights_rs::{Client, ClientConfig, Color, Scale};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Discovering LIFX lights on the network...");

    let client = Client::bind(ClientConfig::default()).await?;

    // No expected count: listen for the whole 3 seconds
    let devices = client.discover(None, Duration::from_secs(3)).await?;

    if devices.is_empty() {
        println!("No lights found on the network.");
        return Ok(());
    }

    println!("Found {} light(s):", devices.len());
    for device in &devices {
        println!("  - {device}");
    }

    let red = Color::new(0.0, 1.0, 1.0, 3500);

    println!("\nSetting all lights to red...");
    let states = client
        .set_state_confirmed(
            &devices,
            &red,
            Duration::from_millis(500),
            Scale::Normalized,
            Duration::from_secs(1),
        )
        .await?;

    for device in &devices {
        match states.get(device) {
            Some(state) => println!(
                "  ✓ {} ({}) hue={} saturation={:.2} brightness={:.2}",
                state.label(),
                device.id(),
                state.hue(),
                state.saturation(),
                state.brightness()
            ),
            None => eprintln!("  ✗ {} did not confirm", device.id()),
        }
    }

    println!("\nDone!");
    Ok(())
}
