pub mod actor;
pub mod error;
pub mod lobby;
pub mod session;

pub use actor::{SessionActor, SessionCommand, SessionHandle};
pub use error::GameError;
pub use lobby::{Lobby, LobbyCommand, PlayerConn};
pub use session::{GameSession, PlayOutcome, RedealOutcome, SessionStatus};
