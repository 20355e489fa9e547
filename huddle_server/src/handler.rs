//! WebSocket connection handling
//!
//! Each accepted socket gets one task reading frames in arrival order and one
//! writer task draining the client's outbound queue into the socket.

use crate::dispatcher::EventDispatcher;
use crate::error::{ClientRequestError, SignalingError};
use crate::registry::ClientHandle;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// Extract the text of a frame; `Ok(None)` for control frames
fn read_frame(
    message: Result<Message, tokio_tungstenite::tungstenite::Error>,
) -> Result<Option<String>, ClientRequestError> {
    match message? {
        Message::Text(text) => Ok(Some(text.to_string())),
        Message::Close(_) => Err(ClientRequestError::Close),
        Message::Binary(_) => Err(ClientRequestError::UnsupportedType),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Ok(None),
    }
}

/// Drive one client connection until the socket closes
pub async fn handle_connection(
    stream: TcpStream,
    dispatcher: EventDispatcher,
    outbound_buffer: usize,
) -> Result<(), ClientRequestError> {
    let addr = stream.peer_addr().ok();
    let ws_stream = accept_async(stream).await?;
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    let (handle, mut outbound) = ClientHandle::channel(outbound_buffer);
    let client_id = dispatcher.on_connect(handle)?;
    info!(client = %client_id, ?addr, "WebSocket session started");

    let writer_id = client_id.clone();
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if let Err(e) = ws_tx.send(Message::text(frame.to_string())).await {
                warn!(client = %writer_id, error = %e, "failed to write frame");
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    while let Some(message) = ws_rx.next().await {
        match read_frame(message) {
            Ok(Some(text)) => match dispatcher.on_message(&client_id, &text) {
                Ok(_) => {}
                // Already logged by the dispatcher
                Err(SignalingError::MalformedMessage(_)) => {}
                Err(e) => warn!(client = %client_id, error = %e, "failed to route event"),
            },
            Ok(None) => {}
            Err(ClientRequestError::Close) => {
                debug!(client = %client_id, "close frame received");
                break;
            }
            Err(ClientRequestError::UnsupportedType) => {
                warn!(client = %client_id, "ignoring non-text frame");
            }
            Err(e) => {
                warn!(client = %client_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Unregistering drops the last sender, so the writer flushes what is
    // already queued and then closes the socket
    dispatcher.on_disconnect(&client_id);
    if let Err(e) = writer.await {
        warn!(client = %client_id, error = %e, "writer task failed");
    }
    info!(client = %client_id, "WebSocket session ended");
    Ok(())
}
