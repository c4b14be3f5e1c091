use crate::use_cases::SessionEvent;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct AppState {
    // Events flowing from connection tasks into the session coordinator.
    pub session_tx: mpsc::Sender<SessionEvent>,
}
