// Shared primitives for one-time server bootstrapping across integration tests.
use std::{
    // `Arc` shares data between threads; `OnceLock` writes a value only once.
    sync::{Arc, OnceLock},
    // Sleep durations are used in readiness polling loops.
    time::Duration,
};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

// Global ws endpoint used by all tests after the server publishes its bound address.
static SERVER_WS_URL: OnceLock<String> = OnceLock::new();
// One-time guard that ensures the server bootstrap path runs only once.
static SERVER_READY: OnceLock<()> = OnceLock::new();

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

// Ensure the test server is running and return the shared `ws://` endpoint.
pub fn ensure_server() -> &'static str {
    // Run initialization exactly once even if multiple tests call this function.
    SERVER_READY.get_or_init(|| {
        // Local one-time slot where the server thread publishes its bound address.
        let published_addr = Arc::new(OnceLock::<String>::new());
        // Clone so the spawned thread can write into the same shared slot.
        let published_addr_thread = Arc::clone(&published_addr);
        // Spawn an OS thread so the server outlives individual `#[tokio::test]` runtimes.
        std::thread::spawn(move || {
            // Each server thread owns its own Tokio runtime.
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            // Run async server startup and serving on this dedicated runtime.
            runtime.block_on(async move {
                // Bind to an ephemeral port to avoid collisions with local services.
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                // Capture the exact address that was assigned by the OS.
                let addr = listener.local_addr().expect("get local addr");
                // Publish the bound address so test code can target the right server.
                let _ = published_addr_thread.set(addr.to_string());
                // Start serving requests until the test process exits.
                number_duel_server::run(listener).await.expect("server failed");
            });
        });
        // Block until the address is published and the port starts accepting connections.
        wait_for_readiness(published_addr);
    });

    // Return the stable shared endpoint used by all tests in this binary.
    SERVER_WS_URL
        .get()
        .expect("server url should be initialized")
        .as_str()
}

// Wait for address publication and then wait for the socket to accept TCP connections.
fn wait_for_readiness(published_addr: Arc<OnceLock<String>>) {
    // Poll until the server thread publishes the bound address.
    let addr = loop {
        // If the address is published, clone it and stop waiting.
        if let Some(addr) = published_addr.get() {
            break addr.clone();
        }
        // Avoid a tight loop while waiting for the background thread.
        std::thread::sleep(Duration::from_millis(10));
    };

    // Persist the ws endpoint globally so every test gets the same target.
    let _ = SERVER_WS_URL.set(format!("ws://{addr}/ws"));

    // Retry for a short period to avoid racing server bind/accept.
    for _ in 0..100 {
        // Successful connect means the server socket is accepting connections.
        if std::net::TcpStream::connect(&addr).is_ok() {
            return;
        }
        // Wait briefly before the next readiness probe.
        std::thread::sleep(Duration::from_millis(20));
    }

    // Fail fast if startup never reached an accepting state.
    panic!("server did not become ready in time");
}

/// Connect a client, consume its identity message, and return the socket and
/// the server-assigned client id.
pub async fn connect_client() -> (WsClient, String) {
    let url = ensure_server();
    let (mut socket, _response) = connect_async(url).await.expect("websocket connect");
    let identity = recv_json(&mut socket).await;
    assert_eq!(identity["type"], "identity");
    let client_id = identity["data"]["clientId"]
        .as_str()
        .expect("identity carries a client id")
        .to_string();
    (socket, client_id)
}

/// Send one protocol message as a JSON text frame.
pub async fn send_json(socket: &mut WsClient, value: serde_json::Value) {
    socket
        .send(Message::text(value.to_string()))
        .await
        .expect("websocket send");
}

/// Receive the next text frame as JSON, failing the test on timeout.
pub async fn recv_json(socket: &mut WsClient) -> serde_json::Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for a server message")
            .expect("stream ended while waiting for a server message")
            .expect("websocket receive");
        match frame {
            Message::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("server sent invalid json");
            }
            // Transport frames are not protocol messages.
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame while waiting for json: {other:?}"),
        }
    }
}

/// Room codes are uuid-suffixed so tests never collide on the shared server.
pub fn unique_room(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}
