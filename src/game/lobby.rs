use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::domain::Rules;
use crate::game::{GameSession, SessionActor, SessionCommand, SessionHandle};
use crate::models::Outbound;

/// One player's end of the wire, as the lobby and session actors see it.
pub struct PlayerConn {
    pub player_id: Uuid,
    pub outbound: mpsc::UnboundedSender<Outbound>,
}

pub enum LobbyCommand {
    /// A fresh connection wants a match; `paired` resolves once an
    /// opponent shows up.
    Join {
        conn: PlayerConn,
        paired: oneshot::Sender<SessionHandle>,
    },
    /// A connection closed before it learned about its session: either
    /// still waiting for an opponent, or paired but gone before reading
    /// the pairing reply.
    Leave { player_id: Uuid },
    /// A session actor finished tearing down.
    SessionClosed { session_id: Uuid },
}

/// Matchmaker and session registry. Holds at most one waiting player;
/// the next arrival is paired with them, first come first served. Paired
/// sessions run on their own actors and share nothing with each other.
struct SessionEntry {
    handle: SessionHandle,
    players: [Uuid; 2],
}

pub struct Lobby {
    rules: Rules,
    waiting: Option<(PlayerConn, oneshot::Sender<SessionHandle>)>,
    sessions: HashMap<Uuid, SessionEntry>,
    tx: mpsc::Sender<LobbyCommand>,
}

impl Lobby {
    pub fn start(rules: Rules) -> mpsc::Sender<LobbyCommand> {
        let (tx, rx) = mpsc::channel(64);
        let lobby = Lobby { rules, waiting: None, sessions: HashMap::new(), tx: tx.clone() };
        tokio::spawn(async move { lobby.run(rx).await });
        tx
    }

    async fn run(mut self, mut rx: mpsc::Receiver<LobbyCommand>) {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                LobbyCommand::Join { conn, paired } => self.handle_join(conn, paired),
                LobbyCommand::Leave { player_id } => self.handle_leave(player_id),
                LobbyCommand::SessionClosed { session_id } => {
                    self.sessions.remove(&session_id);
                    tracing::info!(session = %session_id, live = self.sessions.len(), "session torn down");
                }
            }
        }
        tracing::info!("lobby exiting (command channel closed)");
    }

    /// A `Leave` can race the pairing: the lobby may have seated the
    /// player in a session the connection never heard about. In that case
    /// the session still has to learn about the disconnect, or it would
    /// linger with one dead channel and the survivor kept in the dark.
    fn handle_leave(&mut self, player_id: Uuid) {
        if self.waiting.as_ref().is_some_and(|(c, _)| c.player_id == player_id) {
            self.waiting = None;
            tracing::info!(player = %player_id, "waiting player left");
            return;
        }
        if let Some(entry) = self.sessions.values().find(|e| e.players.contains(&player_id)) {
            tracing::info!(
                player = %player_id,
                session = %entry.handle.session_id,
                "player left during pairing, forwarding disconnect"
            );
            let tx = entry.handle.tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(SessionCommand::Disconnect { player_id }).await;
            });
        }
    }

    fn handle_join(&mut self, conn: PlayerConn, paired: oneshot::Sender<SessionHandle>) {
        match self.waiting.take() {
            None => {
                tracing::info!(player = %conn.player_id, "player waiting for an opponent");
                self.waiting = Some((conn, paired));
            }
            Some((first, first_paired)) => {
                let session_id = Uuid::new_v4();
                let mut session =
                    GameSession::new(first.player_id, self.rules, StdRng::from_entropy());
                if let Err(err) = session.join(conn.player_id) {
                    // Unreachable with a fresh session; keep the first
                    // player queued rather than dropping them.
                    tracing::error!(error = %err, "pairing failed");
                    self.waiting = Some((first, first_paired));
                    return;
                }

                tracing::info!(
                    session = %session_id,
                    first = %first.player_id,
                    second = %conn.player_id,
                    "session started"
                );

                let handle = SessionActor::spawn(
                    session_id,
                    session,
                    vec![(first.player_id, first.outbound), (conn.player_id, conn.outbound)],
                    self.tx.clone(),
                );
                self.sessions.insert(
                    session_id,
                    SessionEntry {
                        handle: handle.clone(),
                        players: [first.player_id, conn.player_id],
                    },
                );
                let _ = first_paired.send(handle.clone());
                let _ = paired.send(handle);
            }
        }
    }
}
