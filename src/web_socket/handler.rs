use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::game::{GameError, LobbyCommand, PlayerConn, SessionCommand, SessionHandle};
use crate::models::{ErrorMessage, Outbound, PlayerAction};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    lobby_tx: mpsc::Sender<LobbyCommand>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, lobby_tx))
}

async fn handle_socket(mut socket: WebSocket, lobby_tx: mpsc::Sender<LobbyCommand>) {
    let player_id = Uuid::new_v4();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    let (paired_tx, mut paired_rx) = oneshot::channel();

    let conn = PlayerConn { player_id, outbound: out_tx };
    if lobby_tx.send(LobbyCommand::Join { conn, paired: paired_tx }).await.is_err() {
        return;
    }

    tracing::info!("[WS] connected {}", player_id);

    let mut session: Option<SessionHandle> = None;

    loop {
        tokio::select! {
            res = &mut paired_rx, if session.is_none() => {
                match res {
                    Ok(handle) => session = Some(handle),
                    // The lobby dropped the pairing slot.
                    Err(_) => break,
                }
            }

            out = out_rx.recv() => {
                let Some(payload) = out else {
                    // Session torn down; nothing more will arrive.
                    break;
                };
                if send_payload(&mut socket, &payload).await.is_err() {
                    notify_disconnect(&session, &lobby_tx, player_id).await;
                    break;
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let action: PlayerAction = match serde_json::from_str(&text) {
                            Ok(action) => action,
                            Err(_) => {
                                tracing::warn!("[WS] {} sent an unreadable action", player_id);
                                continue;
                            }
                        };
                        if handle_action(&mut socket, &session, player_id, action).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        notify_disconnect(&session, &lobby_tx, player_id).await;
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) => {
                        notify_disconnect(&session, &lobby_tx, player_id).await;
                        break;
                    }
                }
            }
        }
    }

    tracing::info!("[WS] disconnected {}", player_id);
}

async fn send_payload(socket: &mut WebSocket, payload: &Outbound) -> Result<(), axum::Error> {
    let json = match payload {
        Outbound::State(view) => serde_json::to_string(view),
        Outbound::Error(msg) => serde_json::to_string(msg),
    };
    match json {
        Ok(json) => socket.send(Message::Text(json)).await,
        Err(err) => {
            tracing::error!(error = %err, "unserializable payload");
            Ok(())
        }
    }
}

/// Submits one parsed action to the session and reports a rejection back
/// on the same socket. Fatal errors are not echoed here; the session actor
/// broadcasts those itself before tearing down.
async fn handle_action(
    socket: &mut WebSocket,
    session: &Option<SessionHandle>,
    player_id: Uuid,
    action: PlayerAction,
) -> Result<(), ()> {
    let Some(handle) = session else {
        let notice = ErrorMessage::from(&GameError::NotInProgress);
        return send_payload(socket, &Outbound::Error(notice)).await.map_err(|_| ());
    };

    let (reply_tx, reply_rx) = oneshot::channel();
    if handle
        .tx
        .send(SessionCommand::Action { player_id, action, reply: reply_tx })
        .await
        .is_err()
    {
        return Err(());
    }

    match reply_rx.await {
        Ok(Err(err)) if !err.is_fatal() => {
            tracing::debug!("[WS] {} action rejected: {}", player_id, err);
            let notice = ErrorMessage::from(&err);
            send_payload(socket, &Outbound::Error(notice)).await.map_err(|_| ())
        }
        Ok(_) => Ok(()),
        // Actor went away mid-action.
        Err(_) => Err(()),
    }
}

async fn notify_disconnect(
    session: &Option<SessionHandle>,
    lobby_tx: &mpsc::Sender<LobbyCommand>,
    player_id: Uuid,
) {
    match session {
        Some(handle) => {
            let _ = handle.tx.send(SessionCommand::Disconnect { player_id }).await;
        }
        None => {
            let _ = lobby_tx.send(LobbyCommand::Leave { player_id }).await;
        }
    }
}
