//! WebSocket delivery of terminal notifications.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::broadcast::{error::RecvError, Receiver};

use super::handlers::AppState;
use super::types::ErrorResponse;
use crate::notify::{NotificationHub, TerminalEvent};
use crate::security::Caller;
use crate::session::UserId;

/// WebSocket upgrade handler for the caller's notification topic.
///
/// The subscription is taken before upgrading, so events published after
/// this request was accepted are not missed.
pub async fn events_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Caller(user): Caller,
) -> Response {
    let events = match state.terminal.hub().subscribe(user) {
        Ok(rx) => rx,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal_error(e.to_string())),
            )
                .into_response();
        }
    };

    let hub = Arc::clone(state.terminal.hub());
    ws.on_upgrade(move |socket| stream_events(socket, events, hub, user))
}

async fn stream_events(
    socket: WebSocket,
    events: Receiver<TerminalEvent>,
    hub: Arc<NotificationHub>,
    user: UserId,
) {
    tracing::debug!(%user, "Notification stream opened");
    let (sink, stream) = socket.split();
    relay(sink, stream, events, user).await;
    hub.release(user);
    tracing::debug!(%user, "Notification stream closed");
}

/// Forward events to the sink until either side goes away.
///
/// The receiver is dropped on return.
async fn relay<S, R, E>(
    mut sink: S,
    mut stream: R,
    mut events: Receiver<TerminalEvent>,
    user: UserId,
) where
    S: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, E>> + Unpin,
{
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::error!("Failed to encode terminal event: {}", e);
                            continue;
                        }
                    };
                    if sink.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%user, skipped, "Notification subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            },
            msg = stream.next() => match msg {
                Some(Ok(Message::Ping(data))) => {
                    if sink.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}
