use axum::body::{Body, Bytes};
use futures::StreamExt;
use tokio::sync::oneshot;
use tracing::{debug, warn};

// Chunks in flight between the origin reader and the client writer.
const STREAM_BUFFER: usize = 32;

/// Relay an upstream body to the client without buffering it.
///
/// The reader task stops as soon as the client side of the channel is gone,
/// dropping the upstream response so its connection goes back to the pool.
pub fn relay_body(upstream: reqwest::Response) -> Body {
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<Bytes, std::io::Error>>(STREAM_BUFFER);
    let url = upstream.url().clone();

    tokio::spawn(async move {
        let mut stream = upstream.bytes_stream();
        let mut sent: u64 = 0;

        loop {
            let chunk = tokio::select! {
                _ = tx.closed() => {
                    debug!(%url, bytes = sent, "client went away, abandoning upstream body");
                    break;
                }
                chunk = stream.next() => chunk,
            };
            match chunk {
                Some(Ok(bytes)) => {
                    let len = bytes.len() as u64;
                    if tx.send(Ok(bytes)).await.is_err() {
                        debug!(%url, bytes = sent, "client went away, abandoning upstream body");
                        break;
                    }
                    sent += len;
                }
                Some(Err(e)) => {
                    warn!(%url, bytes = sent, "stream copy error: {e}");
                    let _ = tx.send(Err(std::io::Error::other(e.to_string()))).await;
                    break;
                }
                None => break,
            }
        }
    });

    Body::from_stream(tokio_stream::wrappers::ReceiverStream::new(rx))
}

/// Hand the client's upload to reqwest as a stream.
///
/// axum's body is `Send` but not `Sync`, so it is pumped through a channel
/// rather than wrapped directly. The returned receiver resolves once the
/// upload has been fully handed over (or abandoned).
pub fn request_body(body: Body) -> (reqwest::Body, oneshot::Receiver<()>) {
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<Bytes, std::io::Error>>(STREAM_BUFFER);
    let (done_tx, done_rx) = oneshot::channel();

    tokio::spawn(async move {
        let mut stream = body.into_data_stream();
        while let Some(chunk) = stream.next().await {
            let item = chunk.map_err(|e| std::io::Error::other(e.to_string()));
            let failed = item.is_err();
            if tx.send(item).await.is_err() || failed {
                break;
            }
        }
        let _ = done_tx.send(());
    });

    (
        reqwest::Body::wrap_stream(tokio_stream::wrappers::ReceiverStream::new(rx)),
        done_rx,
    )
}
