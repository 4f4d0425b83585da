//! Integration tests for sockwire.
//!
//! Two dispatchers are wired back to back: each side's outbound queue feeds
//! the other side's session, standing in for a real transport.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sockwire::codec::PayloadFormat;
use sockwire::protocol::Message;
use sockwire::{Channel, Config, Dispatcher, Reply, Session, SockwireError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
struct Echo {
    text: String,
}

struct Link {
    client: Channel,
    client_task: JoinHandle<()>,
    server_task: JoinHandle<()>,
}

fn forward(mut from: mpsc::Receiver<Message>, to: mpsc::Sender<Message>) {
    tokio::spawn(async move {
        while let Some(message) = from.recv().await {
            if to.send(message).await.is_err() {
                break;
            }
        }
    });
}

fn connect(server: &Dispatcher, client: &Dispatcher) -> Link {
    let (server_ch, server_out) = server.channel("client");
    let (client_ch, client_out) = client.channel("server");
    let (server_in_tx, server_in) = mpsc::channel(64);
    let (client_in_tx, client_in) = mpsc::channel(64);

    forward(client_out, server_in_tx);
    forward(server_out, client_in_tx);

    Link {
        client: client_ch.clone(),
        server_task: Session::new(server.clone(), server_ch, server_in).spawn(),
        client_task: Session::new(client.clone(), client_ch, client_in).spawn(),
    }
}

fn echo_server() -> Dispatcher {
    let server = Dispatcher::new();
    server
        .on("echo", |_ch: Channel, msg: Echo| async move { Ok(Reply(msg)) })
        .unwrap();
    server
}

#[tokio::test]
async fn test_ack_round_trip_between_peers() {
    let server = echo_server();
    let link = connect(&server, &Dispatcher::new());

    let reply: Echo = link
        .client
        .ack(
            "echo",
            &Echo {
                text: "hi".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(reply.text, "hi");
    assert!(link.client.waiters().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_acks_keep_correlation() {
    let server = Dispatcher::new();
    server
        .on("delayed", |_ch: Channel, (delay_ms, tag): (u64, u32)| async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Ok(Reply(tag))
        })
        .unwrap();
    let link = connect(&server, &Dispatcher::new());

    // Calls race onto the wire, so ack ids and arrival order differ from tags.
    let calls: Vec<_> = (0..10u32)
        .map(|tag| {
            let client = link.client.clone();
            tokio::spawn(async move {
                let delay = u64::from(50 - tag * 5);
                let got: u32 = client.ack("delayed", &(delay, tag)).await.unwrap();
                (tag, got)
            })
        })
        .collect();

    for call in calls {
        let (sent, got) = call.await.unwrap();
        assert_eq!(sent, got);
    }
    assert!(link.client.waiters().is_empty());
}

#[tokio::test]
async fn test_emit_reaches_handler() {
    let server = Dispatcher::new();
    let (seen_tx, mut seen_rx) = mpsc::channel(4);
    server
        .on("chat", move |ch: Channel, line: String| {
            let seen_tx = seen_tx.clone();
            async move {
                seen_tx.send((ch.id().to_string(), line)).await?;
                Ok(())
            }
        })
        .unwrap();
    let link = connect(&server, &Dispatcher::new());

    link.client.emit("chat", &"hello").await.unwrap();

    let (peer, line) = seen_rx.recv().await.unwrap();
    assert_eq!(peer, "client");
    assert_eq!(line, "hello");
}

#[tokio::test]
async fn test_ack_to_unknown_method_times_out() {
    let link = connect(&Dispatcher::new(), &Dispatcher::new());

    let result: sockwire::Result<Echo> = link
        .client
        .ack_with_timeout("missing", &(), Duration::from_millis(50))
        .await;

    assert!(matches!(result, Err(SockwireError::AwaitTimeout(_))));
    assert!(link.client.waiters().is_empty());
}

#[tokio::test]
async fn test_server_calls_back_into_client() {
    // The server's handler issues its own ack request to the client while
    // answering the client's request.
    let server = Dispatcher::new();
    server
        .on("greet", |ch: Channel, name: String| async move {
            let title: String = ch.ack("title", &name).await?;
            Ok(Reply(format!("hello {} {}", title, name)))
        })
        .unwrap();

    let client = Dispatcher::new();
    client
        .on("title", |_ch: Channel, _name: String| async move {
            Ok(Reply("dr".to_string()))
        })
        .unwrap();

    let link = connect(&server, &client);
    let greeting: String = link.client.ack("greet", &"who").await.unwrap();
    assert_eq!(greeting, "hello dr who");
}

#[tokio::test]
async fn test_lifecycle_events_per_connection() {
    let server = echo_server();
    let connected = Arc::new(AtomicUsize::new(0));
    let disconnected = Arc::new(AtomicUsize::new(0));

    let count = connected.clone();
    server.on_connection(move |_ch| {
        count.fetch_add(1, Ordering::SeqCst);
    });
    let count = disconnected.clone();
    server.on_disconnection(move |_ch| {
        count.fetch_add(1, Ordering::SeqCst);
    });

    let first = connect(&server, &Dispatcher::new());
    let second = connect(&server, &Dispatcher::new());

    for link in [first, second] {
        let _: Echo = link
            .client
            .ack(
                "echo",
                &Echo {
                    text: "x".to_string(),
                },
            )
            .await
            .unwrap();

        // Dropping every client-side sender ends the server session.
        drop(link.client);
        link.client_task.abort();
        link.server_task.await.unwrap();
    }

    assert_eq!(connected.load(Ordering::SeqCst), 2);
    assert_eq!(disconnected.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_msgpack_peers() {
    let config = Config::new().format(PayloadFormat::MsgPack);
    let server = Dispatcher::with_config(config.clone());
    server
        .on("echo", |_ch: Channel, msg: Echo| async move { Ok(Reply(msg)) })
        .unwrap();
    let link = connect(&server, &Dispatcher::with_config(config));

    let reply: Echo = link
        .client
        .ack(
            "echo",
            &Echo {
                text: "binary".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(reply.text, "binary");
}
