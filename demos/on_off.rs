//! Switch every LIFX light off and back on.
//!
//! Uses the broadcast variants, so no discovery is needed.
//!
//! Run with: cargo run --example on_off

use std::time::Duration;
use lifx_lights_rs::{Client, ClientConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::bind(ClientConfig::default()).await?;

    println!("Turning all lights off...");
    client.set_power_all(false).await?;

    tokio::time::sleep(Duration::from_secs(2)).await;

    println!("Turning all lights on...");
    client.set_power_all(true).await?;

    let diagnostics = client.diagnostics().await;
    println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    Ok(())
}
