//! Ping-pong demo: a server and a client exchanging typed messages over
//! the in-process memory transport.
//!
//! Run with `RUST_LOG=debug` to watch the session lifecycle.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use courier::{Client, MemoryNetwork, PeerId, Server, message, protocol};

message! {
    /// Ping probe carrying a sequence counter.
    pub struct PingMessage {
        pub sequence: u32,
    }
}

message! {
    /// Answer to a ping, echoing its sequence counter.
    pub struct PongMessage {
        pub sequence: u32,
    }
}

protocol! {
    /// Messages spoken by the ping-pong demo.
    pub enum PingPongProtocol {
        PingMessage,
        PongMessage,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let network = MemoryNetwork::new();

    let mut server = Server::new(PingPongProtocol::registry(), network.endpoint());
    // Handlers run inside update(), so answers are collected there and
    // sent from the main loop.
    let pending: Arc<Mutex<Vec<(PeerId, u32)>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let pending = Arc::clone(&pending);
        server.subscribe::<PingMessage, _>(move |ping, peer| {
            println!("server: ping {} from {peer}", ping.sequence);
            pending.lock().unwrap().push((peer, ping.sequence));
        })?;
    }
    server.on_peer_connected(|peer| println!("server: {peer} joined"));
    server.start(7777)?;

    let mut client = Client::new(PingPongProtocol::registry(), network.endpoint());
    client.subscribe::<PongMessage, _>(|pong, _peer| {
        println!("client: pong {}", pong.sequence);
    })?;
    client.connect("memory", 7777)?;

    let mut sequence = 0u32;
    for _ in 0..40 {
        server.update();
        client.update();

        for (peer, echoed) in pending.lock().unwrap().drain(..) {
            server.send_to(&PongMessage { sequence: echoed }, peer)?;
        }

        if client.peer().is_some() && sequence < 3 {
            sequence += 1;
            client.send(&PingMessage { sequence })?;
        }

        thread::sleep(Duration::from_millis(25));
    }

    client.disconnect();
    server.stop();
    println!("done");
    Ok(())
}
