//! Connect to the TradeAgent server, send a test packet, run until Ctrl+C.
//!
//! Usage:
//!   cargo run --example 001_client -- [--debug] [--settings vt_setting.json]
//!
//! Start `002_server` first for a local endpoint.

mod common;

use std::sync::Arc;

use serde_json::json;
use tradeagent_ws::{ConnectionCallbacks, ErrorReport, Packet, Result, WebsocketClient};

// ============================================================================
// Callbacks
// ============================================================================

/// Logs every event with the account it belongs to.
struct GatewayCallbacks {
    account_id: String,
}

impl ConnectionCallbacks for GatewayCallbacks {
    fn on_connected(&self) {
        println!("[{}] Trade websocket API connected", self.account_id);
    }

    fn on_disconnected(&self) {
        println!("[{}] Trade websocket API disconnected", self.account_id);
    }

    fn on_packet(&self, packet: Packet) -> Result<()> {
        match packet {
            Packet::Json(map) => println!("[{}] json: {map:?}", self.account_id),
            Packet::Text(text) => println!("[{}] text: {text}", self.account_id),
        }
        Ok(())
    }

    fn on_error(&self, report: &ErrorReport) {
        eprintln!("[{}] {report}", self.account_id);
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = common::Args::parse();
    let settings = common::load_settings(&args)?;
    common::init_logging(&settings, args.debug);

    let client = tradeagent_ws::ClientBuilder::from_settings(&settings)
        .callbacks(Arc::new(GatewayCallbacks {
            account_id: settings.account_id.clone(),
        }))
        .build()?;

    let stopper = client.stop_on_signal();

    if !connect(&client, &settings.server_host).await {
        return Ok(());
    }

    client.send_json(&json!({"msg": "test"})).await?;
    println!("Sent test packet, press Ctrl+C to exit...");

    stopper.await?;
    client.wait_closed().await;
    println!("Exit.");

    Ok(())
}

/// Connects once, reporting the outcome.
async fn connect(client: &WebsocketClient, address: &str) -> bool {
    match client.connect(address).await {
        Ok(true) => true,
        Ok(false) => {
            println!("Already connected");
            false
        }
        Err(e) => {
            eprintln!("Connection to {address} failed: {e}");
            false
        }
    }
}
