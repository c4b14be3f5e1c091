// Use cases layer: application workflows for the duel server.

pub mod room;
pub mod session;
pub mod types;

pub use room::{GameError, Room};
pub use session::session_task;
pub use types::{ClientId, GameCommand, SessionEvent, SessionOutput};
