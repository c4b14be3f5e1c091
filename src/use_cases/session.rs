// Session coordinator: a single-writer task owning every room.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::score_guess;

use super::room::{GameError, Room, ROOM_CAPACITY};
use super::types::{ClientId, GameCommand, SessionEvent, SessionOutput};

/// Runs the coordinator until every event sender is dropped.
///
/// All room mutations happen inside this task, one event at a time, which
/// preserves the at-most-one-mutator guarantee the game rules assume.
pub async fn session_task(mut event_rx: mpsc::Receiver<SessionEvent>) {
    let mut coordinator = Coordinator::new();
    while let Some(event) = event_rx.recv().await {
        match event {
            SessionEvent::Connected {
                client_id,
                outbound_tx,
            } => coordinator.register_client(client_id, outbound_tx),
            SessionEvent::Command { client_id, command } => {
                coordinator.dispatch(client_id, command)
            }
            SessionEvent::Disconnected { client_id } => coordinator.disconnect(client_id),
        }
    }
    info!("session event channel closed; coordinator exiting");
}

type Outbound = mpsc::Sender<SessionOutput>;

/// Non-blocking delivery so one slow client never stalls the coordinator.
fn deliver(clients: &HashMap<ClientId, Outbound>, client_id: ClientId, output: SessionOutput) {
    let Some(tx) = clients.get(&client_id) else {
        debug!(client_id, "dropping notice for unknown client");
        return;
    };
    if let Err(err) = tx.try_send(output) {
        warn!(client_id, error = %err, "dropping notice; outbound channel unavailable");
    }
}

/// Room-scoped broadcast: every current member gets a copy.
fn broadcast(clients: &HashMap<ClientId, Outbound>, room: &Room, output: SessionOutput) {
    for player in room.players() {
        deliver(clients, *player, output.clone());
    }
}

struct Coordinator {
    rooms: HashMap<String, Room>,
    clients: HashMap<ClientId, Outbound>,
}

impl Coordinator {
    fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            clients: HashMap::new(),
        }
    }

    fn register_client(&mut self, client_id: ClientId, outbound_tx: Outbound) {
        self.clients.insert(client_id, outbound_tx);
        debug!(client_id, "client registered");
    }

    fn dispatch(&mut self, client_id: ClientId, command: GameCommand) {
        match command {
            GameCommand::CreateRoom { room_id } => self.create_room(client_id, room_id),
            GameCommand::JoinRoom { room_id } => self.join_room(client_id, room_id),
            GameCommand::SetNumber { room_id, number } => {
                self.set_number(client_id, room_id, number)
            }
            GameCommand::MakeGuess { room_id, guess } => {
                self.make_guess(client_id, room_id, guess)
            }
        }
    }

    fn create_room(&mut self, client_id: ClientId, room_id: String) {
        // A repeated create with the same code silently replaces the old room.
        let room = Room::new(client_id);
        broadcast(
            &self.clients,
            &room,
            SessionOutput::PlayerCount(room.player_count()),
        );
        deliver(&self.clients, client_id, SessionOutput::YourTurn(true));
        info!(client_id, %room_id, "room created");
        self.rooms.insert(room_id, room);
    }

    fn join_room(&mut self, client_id: ClientId, room_id: String) {
        let Some(room) = self.rooms.get_mut(&room_id) else {
            deliver(
                &self.clients,
                client_id,
                SessionOutput::Rejected(GameError::RoomNotFound),
            );
            return;
        };
        if room.is_full() {
            deliver(
                &self.clients,
                client_id,
                SessionOutput::Rejected(GameError::RoomFull),
            );
            return;
        }

        room.join(client_id);
        info!(client_id, %room_id, players = room.player_count(), "player joined room");
        broadcast(
            &self.clients,
            room,
            SessionOutput::PlayerCount(room.player_count()),
        );
        deliver(&self.clients, client_id, SessionOutput::YourTurn(false));
    }

    fn set_number(&mut self, client_id: ClientId, room_id: String, number: String) {
        let Some(room) = self.rooms.get_mut(&room_id) else {
            debug!(client_id, %room_id, "set number for unknown room ignored");
            return;
        };
        if !room.is_member(client_id) {
            debug!(client_id, %room_id, "set number from non-member ignored");
            return;
        }

        // The committed value is trusted to be 4 distinct digits; see DESIGN.md.
        let committed = room.commit_secret(client_id, number);
        broadcast(
            &self.clients,
            room,
            SessionOutput::NumberSet {
                player_id: client_id,
                player_count: room.player_count(),
                numbers_set: committed,
            },
        );

        if committed == ROOM_CAPACITY {
            broadcast(&self.clients, room, SessionOutput::GameReady);
            // The host opens the guessing phase.
            if let Some(host) = room.host() {
                room.grant_turn(host);
                deliver(&self.clients, host, SessionOutput::YourTurn(true));
            }
            if let Some(guest) = room.guest() {
                deliver(&self.clients, guest, SessionOutput::YourTurn(false));
            }
            info!(%room_id, "game ready");
        }
    }

    fn make_guess(&mut self, client_id: ClientId, room_id: String, guess: String) {
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return;
        };
        if room.is_game_over() {
            return;
        }
        if room.current_turn() != client_id {
            deliver(
                &self.clients,
                client_id,
                SessionOutput::Rejected(GameError::NotYourTurn),
            );
            return;
        }
        let Some(opponent) = room.opponent_of(client_id) else {
            debug!(client_id, %room_id, "guess without an opponent ignored");
            return;
        };
        let Some(secret) = room.secret_of(opponent) else {
            // Turn state is only granted once both secrets exist, so this
            // window stays a silent drop.
            debug!(client_id, %room_id, "guess before opponent committed ignored");
            return;
        };

        let score = score_guess(&guess, secret);
        if score.is_win() {
            room.record_win(client_id);
            info!(winner = client_id, %room_id, "game over");
            broadcast(
                &self.clients,
                room,
                SessionOutput::GameOver { winner: client_id },
            );
        } else {
            room.grant_turn(opponent);
            deliver(&self.clients, opponent, SessionOutput::YourTurn(true));
            deliver(&self.clients, client_id, SessionOutput::YourTurn(false));
        }
        deliver(
            &self.clients,
            client_id,
            SessionOutput::GuessResult {
                guess,
                result: score.to_string(),
            },
        );
    }

    fn disconnect(&mut self, client_id: ClientId) {
        self.clients.remove(&client_id);

        let clients = &self.clients;
        self.rooms.retain(|room_id, room| {
            if !room.remove_player(client_id) {
                return true;
            }
            if room.is_empty() {
                info!(%room_id, "last player left; removing room");
                return false;
            }
            broadcast(clients, room, SessionOutput::PlayerCount(room.player_count()));
            broadcast(clients, room, SessionOutput::PlayerDisconnected(client_id));
            true
        });

        info!(client_id, "client disconnected");
    }
}
