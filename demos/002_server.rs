//! Run the test harness server on 0.0.0.0:9443 and print client messages.
//!
//! Usage:
//!   cargo run --example 002_server -- [--debug]

mod common;

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use tradeagent_ws::Packet;
use tradeagent_ws::transport::{DEFAULT_GREETING, ServerOptions, TestServer};

const PORT: u16 = 9443;
const POLL: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = common::Args::parse();
    let settings = common::load_settings(&args)?;
    common::init_logging(&settings, args.debug);

    let server = TestServer::bind(
        IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        PORT,
        ServerOptions::new().with_greeting(DEFAULT_GREETING),
    )
    .await?;

    println!("Listening on {}, press Ctrl+C to exit...", server.ws_url());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,

            message = server.next_message(POLL) => {
                if let Some(text) = message {
                    match Packet::decode(&text) {
                        Ok(packet) => println!("[{} clients] {packet}", server.client_count()),
                        Err(e) => println!("Undecodable message {text:?}: {e}"),
                    }
                }
            }
        }
    }

    server.shutdown();
    println!("Exit.");
    Ok(())
}
