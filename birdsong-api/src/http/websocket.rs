//! Viewer push channel
//!
//! Each socket gets one relay session. Frames from the session are written to
//! the socket as text messages; anything the viewer sends is read only to
//! notice that it has gone away.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use birdsong_relay::ViewerSession;
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use tracing::{debug, info, warn};

use crate::http::{AppResult, AppState};

/// Viewers never send anything meaningful; cap what we will buffer from them
const MAX_INBOUND_MESSAGE: usize = 4 * 1024;

/// Why a forwarding loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardEnd {
    /// The viewer closed the socket or its stream ended
    ClientClosed,
    /// Reading from the socket failed
    SocketError,
    /// Writing a frame to the socket failed
    SendFailed,
    /// The session was removed from the relay
    Unregistered,
}

/// WebSocket handler for tweet events
///
/// The session is registered before the upgrade so a full relay answers
/// with 503 instead of accepting and then closing the socket.
pub async fn websocket_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> AppResult<impl IntoResponse> {
    let session = state.relay.register()?;

    Ok(ws
        .max_message_size(MAX_INBOUND_MESSAGE)
        .on_upgrade(move |socket| handle_socket(socket, session)))
}

async fn handle_socket(socket: WebSocket, session: ViewerSession) {
    let session_id = session.id().clone();
    info!(session_id = %session_id, "WebSocket connection established");

    let (sink, stream) = socket.split();
    let end = forward_frames(session, sink, stream).await;

    info!(session_id = %session_id, reason = ?end, "WebSocket connection closed");
}

/// Pump frames from a session into a socket sink until either side ends
///
/// The session is consumed; it is unregistered when this returns.
pub async fn forward_frames<S, R, E>(
    mut session: ViewerSession,
    mut sink: S,
    mut inbound: R,
) -> ForwardEnd
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    loop {
        tokio::select! {
            frame = session.recv() => {
                let Some(frame) = frame else {
                    return ForwardEnd::Unregistered;
                };
                if let Err(e) = sink.send(Message::Text(frame.to_string().into())).await {
                    warn!(session_id = %session.id(), error = %e, "Failed to send WebSocket message");
                    return ForwardEnd::SendFailed;
                }
            }
            message = inbound.next() => match message {
                None | Some(Ok(Message::Close(_))) => return ForwardEnd::ClientClosed,
                Some(Err(e)) => {
                    debug!(session_id = %session.id(), error = %e, "WebSocket read error");
                    return ForwardEnd::SocketError;
                }
                Some(Ok(_)) => {}
            },
        }
    }
}
