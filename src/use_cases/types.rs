// Use-case level inputs/outputs for the session coordinator.

use tokio::sync::mpsc;

use super::room::GameError;

/// Process-unique identifier the transport assigns to each connection.
pub type ClientId = u64;

/// Events consumed by the coordinator task, in arrival order.
#[derive(Debug)]
pub enum SessionEvent {
    Connected {
        client_id: ClientId,
        outbound_tx: mpsc::Sender<SessionOutput>,
    },
    Command {
        client_id: ClientId,
        command: GameCommand,
    },
    Disconnected {
        client_id: ClientId,
    },
}

/// The four game operations a client can request.
#[derive(Debug, Clone)]
pub enum GameCommand {
    CreateRoom { room_id: String },
    JoinRoom { room_id: String },
    SetNumber { room_id: String, number: String },
    MakeGuess { room_id: String, guess: String },
}

/// Notices delivered to individual clients. Wire formatting happens at the
/// adapter layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutput {
    PlayerCount(usize),
    YourTurn(bool),
    Rejected(GameError),
    NumberSet {
        player_id: ClientId,
        player_count: usize,
        numbers_set: usize,
    },
    GameReady,
    GuessResult {
        guess: String,
        result: String,
    },
    GameOver {
        winner: ClientId,
    },
    PlayerDisconnected(ClientId),
}
