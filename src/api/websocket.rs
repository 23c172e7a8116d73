//! WebSocket handler streaming session changes.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};

use super::handlers::AppState;
use super::types::{WsMessage, WsRequest};

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn send(sink: &mut SplitSink<WebSocket, Message>, msg: &WsMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sink.send(Message::Text(json.into())).await.is_ok(),
        Err(_) => true,
    }
}

/// Push the current session, then every replacement, until the client leaves.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let mut changes = state.session.subscribe();

    let initial = WsMessage::Session {
        session: changes.borrow_and_update().view(),
    };
    if !send(&mut sink, &initial).await {
        return;
    }

    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let msg = WsMessage::Session {
                    session: changes.borrow_and_update().view(),
                };
                if !send(&mut sink, &msg).await {
                    break;
                }
            }
            msg = stream.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text.to_string(),
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                        continue;
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                };

                let reply = match serde_json::from_str::<WsRequest>(&text) {
                    Ok(WsRequest::Ping) => WsMessage::Pong,
                    Err(e) => WsMessage::Error {
                        code: "PARSE_ERROR".to_string(),
                        message: e.to_string(),
                    },
                };
                if !send(&mut sink, &reply).await {
                    break;
                }
            }
        }
    }
}
