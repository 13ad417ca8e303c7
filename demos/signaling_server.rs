//! Anonymous chat signaling server
//!
//! Run with: cargo run --example signaling_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example signaling_server                  # binds to 0.0.0.0:3000
//!   cargo run --example signaling_server localhost        # binds to 127.0.0.1:3000
//!   cargo run --example signaling_server 127.0.0.1:3001   # binds to 127.0.0.1:3001
//!
//! Speak to it with any WebSocket client, e.g. two websocat sessions:
//!
//!   websocat ws://localhost:3000
//!   {"type":"start_chat","gender":"male","preference":"any","name":"Alex"}
//!
//! The first session receives {"type":"waiting"}; once a compatible second
//! session joins, both receive {"type":"matched",...} and can exchange
//! offer/answer/ice-candidate/message frames, which are relayed verbatim
//! to the partner. {"type":"next",...} skips to a new partner.

use std::net::SocketAddr;

use roulette_rs::{ServerConfig, SignalingServer};

/// Parse bind address from command line argument.
///
/// Accepts "localhost", "IP", or "IP:PORT".
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 3000;

    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    let bind_addr = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!("Usage: signaling_server [BIND_ADDR]");
                std::process::exit(1);
            }
        },
        None => "0.0.0.0:3000".parse().unwrap(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("roulette_rs=debug".parse()?),
        )
        .init();

    let config = ServerConfig::default().bind(bind_addr);
    println!("Starting signaling server on ws://{}", config.bind_addr);

    let server = SignalingServer::new(config);

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                eprintln!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    Ok(())
}
