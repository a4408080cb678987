pub mod messages;
pub mod view;

pub use messages::{ErrorMessage, Outbound, PlayerAction};
pub use view::PlayerView;
