// Wire protocol DTOs and conversions for the duel server's WebSocket messages.
// Event names and payload shapes follow the browser client's vocabulary.

use serde::{Deserialize, Serialize};

use crate::use_cases::{GameCommand, SessionOutput};

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    // Room code to open; the creator becomes the host.
    CreateRoom(String),
    // Room code to join as the guest.
    JoinRoom(String),
    // Secret commit for the requesting player.
    #[serde(rename_all = "camelCase")]
    SetNumber { room_id: String, number: String },
    // A guess against the opponent's secret.
    #[serde(rename_all = "camelCase")]
    MakeGuess { room_id: String, guess: String },
}

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    // Assigned identity for the connection, sent once after accept.
    #[serde(rename_all = "camelCase")]
    Identity { client_id: String },
    // Current member count of the room the recipient is in.
    PlayerCount(usize),
    // Whether the recipient's guess will be accepted next.
    YourTurn(bool),
    // Human-readable rejection, delivered only to the requester.
    Error(String),
    // A player committed their secret; counts let clients show progress.
    #[serde(rename_all = "camelCase")]
    NumberSet {
        player_id: String,
        player_count: usize,
        numbers_set: usize,
    },
    // Both secrets are in; the guessing phase starts.
    GameReady,
    // Private echo of a guess with its formatted score.
    #[serde(rename_all = "camelCase")]
    GuessResult { guess: String, result: String },
    // A correct guess ended the duel.
    GameOver { winner: String },
    // A room member dropped; carries the departing client id.
    PlayerDisconnected(String),
}

impl From<ClientMessage> for GameCommand {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::CreateRoom(room_id) => GameCommand::CreateRoom { room_id },
            ClientMessage::JoinRoom(room_id) => GameCommand::JoinRoom { room_id },
            ClientMessage::SetNumber { room_id, number } => {
                GameCommand::SetNumber { room_id, number }
            }
            ClientMessage::MakeGuess { room_id, guess } => {
                GameCommand::MakeGuess { room_id, guess }
            }
        }
    }
}

impl From<SessionOutput> for ServerMessage {
    fn from(output: SessionOutput) -> Self {
        match output {
            SessionOutput::PlayerCount(count) => ServerMessage::PlayerCount(count),
            SessionOutput::YourTurn(is_turn) => ServerMessage::YourTurn(is_turn),
            SessionOutput::Rejected(error) => {
                ServerMessage::Error(error.user_message().to_string())
            }
            SessionOutput::NumberSet {
                player_id,
                player_count,
                numbers_set,
            } => ServerMessage::NumberSet {
                player_id: player_id.to_string(),
                player_count,
                numbers_set,
            },
            SessionOutput::GameReady => ServerMessage::GameReady,
            SessionOutput::GuessResult { guess, result } => {
                ServerMessage::GuessResult { guess, result }
            }
            SessionOutput::GameOver { winner } => ServerMessage::GameOver {
                winner: winner.to_string(),
            },
            SessionOutput::PlayerDisconnected(client_id) => {
                ServerMessage::PlayerDisconnected(client_id.to_string())
            }
        }
    }
}
