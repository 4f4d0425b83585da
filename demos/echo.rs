//! Echo peers - two dispatchers wired back to back in memory.
//!
//! This example demonstrates:
//! - Registering emit and ack handlers
//! - Lifecycle callbacks
//! - Calling a remote handler with `Channel::ack` and awaiting the reply
//!
//! Run with `RUST_LOG=debug cargo run --example echo` to see dispatch logs.

use serde::{Deserialize, Serialize};
use sockwire::protocol::Message;
use sockwire::{Channel, Dispatcher, Reply, Session};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Serialize, Deserialize, Debug)]
struct Echo {
    text: String,
}

/// Forward everything one side queues into the other side's session.
fn pipe(mut outbound: mpsc::Receiver<Message>, inbound: mpsc::Sender<Message>) {
    tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            if inbound.send(message).await.is_err() {
                break;
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let server = Dispatcher::new();
    server.on("echo", |_ch: Channel, msg: Echo| async move { Ok(Reply(msg)) })?;
    server.on("chat", |ch: Channel, line: String| async move {
        println!("[{}] {}", ch.id(), line);
        Ok(())
    })?;
    server.on_connection(|ch| println!("{} connected", ch.id()));
    server.on_disconnection(|ch| println!("{} disconnected", ch.id()));

    let client = Dispatcher::new();

    let (server_ch, server_out) = server.channel("client-1");
    let (client_ch, client_out) = client.channel("server");
    let (server_in_tx, server_in) = mpsc::channel(64);
    let (client_in_tx, client_in) = mpsc::channel(64);

    pipe(client_out, server_in_tx);
    pipe(server_out, client_in_tx);

    let server_task = Session::new(server, server_ch, server_in).spawn();
    let client_task = Session::new(client, client_ch.clone(), client_in).spawn();

    client_ch.emit("chat", &"hello from the client").await?;

    let reply: Echo = client_ch
        .ack("echo", &Echo {
            text: "hi".to_string(),
        })
        .await?;
    println!("echo replied: {}", reply.text);

    // Dropping the last sender ends both sessions.
    drop(client_ch);
    client_task.abort();
    let _ = server_task.await;

    Ok(())
}
