use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::game::lobby::LobbyCommand;
use crate::game::{GameError, GameSession, PlayOutcome, RedealOutcome};
use crate::models::{ErrorMessage, Outbound, PlayerAction};

/// Commands funneled into one session's single mutation order.
#[derive(Debug)]
pub enum SessionCommand {
    Action {
        player_id: Uuid,
        action: PlayerAction,
        reply: oneshot::Sender<Result<(), GameError>>,
    },
    Disconnect {
        player_id: Uuid,
    },
}

#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub session_id: Uuid,
    pub tx: mpsc::Sender<SessionCommand>,
}

/// Single-writer arbiter for one match. Both connections submit into the
/// same channel, so mutations apply one at a time in arrival order and a
/// play racing another is simply re-validated against the pile top it
/// finds when its turn comes.
pub struct SessionActor {
    session_id: Uuid,
    session: GameSession,
    connections: Vec<(Uuid, mpsc::UnboundedSender<Outbound>)>,
}

impl SessionActor {
    pub fn spawn(
        session_id: Uuid,
        session: GameSession,
        connections: Vec<(Uuid, mpsc::UnboundedSender<Outbound>)>,
        lobby_tx: mpsc::Sender<LobbyCommand>,
    ) -> SessionHandle {
        let (tx, rx) = mpsc::channel(64);
        let actor = SessionActor { session_id, session, connections };
        tokio::spawn(async move { actor.run(rx, lobby_tx).await });
        SessionHandle { session_id, tx }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<SessionCommand>, lobby_tx: mpsc::Sender<LobbyCommand>) {
        // Both players see the initial deal before any action lands.
        self.broadcast_state();

        while let Some(cmd) = rx.recv().await {
            match cmd {
                SessionCommand::Action { player_id, action, reply } => {
                    let result = self.apply(player_id, action);
                    let fatal = matches!(&result, Err(e) if e.is_fatal());
                    let _ = reply.send(result);
                    if fatal {
                        break;
                    }
                }
                SessionCommand::Disconnect { player_id } => {
                    self.handle_disconnect(player_id);
                    break;
                }
            }
        }

        let _ = lobby_tx.send(LobbyCommand::SessionClosed { session_id: self.session_id }).await;
        tracing::info!(session = %self.session_id, "session closed");
    }

    fn apply(&mut self, player_id: Uuid, action: PlayerAction) -> Result<(), GameError> {
        match action {
            PlayerAction::PlayCard { card_index, target_pile } => {
                match self.session.play_card(player_id, card_index, target_pile)? {
                    PlayOutcome::Won => {
                        tracing::info!(session = %self.session_id, winner = %player_id, "game finished");
                    }
                    PlayOutcome::Played => {}
                }
                self.broadcast_state();
                Ok(())
            }
            PlayerAction::RequestNewCenterCards => {
                match self.session.request_new_center_cards(player_id) {
                    // Flag recorded; acknowledged through the reply alone.
                    Ok(RedealOutcome::Pending) => Ok(()),
                    Ok(RedealOutcome::Redealt) => {
                        tracing::debug!(session = %self.session_id, "center piles redealt");
                        self.broadcast_state();
                        Ok(())
                    }
                    Err(err) => {
                        if let GameError::Deadlock = err {
                            // An unresolvable stall concerns both players.
                            tracing::warn!(session = %self.session_id, "session deadlocked");
                            self.broadcast_error(&err);
                        }
                        Err(err)
                    }
                }
            }
        }
    }

    fn handle_disconnect(&self, player_id: Uuid) {
        tracing::info!(session = %self.session_id, player = %player_id, "player disconnected");
        let notice = Outbound::Error(ErrorMessage::from(&GameError::OpponentDisconnected));
        for (id, tx) in &self.connections {
            if *id != player_id {
                let _ = tx.send(notice.clone());
            }
        }
    }

    fn broadcast_state(&self) {
        for (id, tx) in &self.connections {
            match self.session.view_for(*id) {
                Ok(view) => {
                    // A dead connection must not disturb the other player's
                    // delivery; the disconnect command will follow anyway.
                    if tx.send(Outbound::State(view)).is_err() {
                        tracing::warn!(session = %self.session_id, player = %id, "dropped state push");
                    }
                }
                Err(err) => {
                    tracing::warn!(session = %self.session_id, player = %id, error = %err, "no view for player");
                }
            }
        }
    }

    fn broadcast_error(&self, err: &GameError) {
        let notice = Outbound::Error(ErrorMessage::from(err));
        for (_, tx) in &self.connections {
            let _ = tx.send(notice.clone());
        }
    }
}
