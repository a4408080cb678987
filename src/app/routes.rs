use axum::{routing::get, Router};
use tokio::sync::mpsc;

use crate::game::LobbyCommand;

pub fn create_routes(lobby_tx: mpsc::Sender<LobbyCommand>) -> Router {
    Router::new().route(
        "/ws",
        get(move |ws| crate::web_socket::ws_handler(ws, lobby_tx.clone())),
    )
}
