// tests/common/mod.rs
//
// In-process HTTP server on an ephemeral port, so fetch/notify paths run
// against real sockets without leaving the machine.
#![allow(dead_code)]

use axum::Router;
use tokio::net::TcpListener;

/// Serve `app` on 127.0.0.1:<random>, return its base url.
pub async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{addr}")
}

/// A url on which nothing is listening.
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}/gone")
}

/// Answer one connection with `response` verbatim, then hang up. For
/// responses a well-behaved server would never send.
pub async fn serve_raw_once(response: &'static [u8]) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind raw listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.expect("accept");
        let mut buf = [0u8; 4096];
        let _ = sock.read(&mut buf).await;
        let _ = sock.write_all(response).await;
        let _ = sock.shutdown().await;
    });
    format!("http://{addr}/raw")
}
