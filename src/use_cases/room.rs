// Per-room duel state and its transitions.

use std::collections::HashMap;

use super::types::ClientId;

/// Players per duel.
pub const ROOM_CAPACITY: usize = 2;

/// User-facing rejections. The wire strings are the ones the original client
/// displays verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    RoomNotFound,
    RoomFull,
    NotYourTurn,
}

impl GameError {
    pub fn user_message(&self) -> &'static str {
        match self {
            GameError::RoomNotFound => "Oda bulunamadı",
            GameError::RoomFull => "Oda dolu",
            GameError::NotYourTurn => "Sıra sizde değil",
        }
    }
}

/// One duel instance scoped to a client-chosen room code. The first player in
/// `players` is the host and opens the guessing phase.
#[derive(Debug)]
pub struct Room {
    players: Vec<ClientId>,
    secrets: HashMap<ClientId, String>,
    current_turn: ClientId,
    game_over: bool,
    winner: Option<ClientId>,
}

impl Room {
    pub fn new(host: ClientId) -> Self {
        Self {
            players: vec![host],
            secrets: HashMap::new(),
            current_turn: host,
            game_over: false,
            winner: None,
        }
    }

    pub fn players(&self) -> &[ClientId] {
        &self.players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= ROOM_CAPACITY
    }

    pub fn is_member(&self, client_id: ClientId) -> bool {
        self.players.contains(&client_id)
    }

    pub fn join(&mut self, client_id: ClientId) {
        self.players.push(client_id);
    }

    pub fn host(&self) -> Option<ClientId> {
        self.players.first().copied()
    }

    pub fn guest(&self) -> Option<ClientId> {
        self.players.get(1).copied()
    }

    /// The other entry in `players`, if a second player is present.
    pub fn opponent_of(&self, client_id: ClientId) -> Option<ClientId> {
        self.players.iter().copied().find(|id| *id != client_id)
    }

    /// Records a committed secret and returns how many are now present.
    /// Re-commits by the same player overwrite without complaint.
    pub fn commit_secret(&mut self, client_id: ClientId, number: String) -> usize {
        self.secrets.insert(client_id, number);
        self.secrets.len()
    }

    pub fn secret_of(&self, client_id: ClientId) -> Option<&str> {
        self.secrets.get(&client_id).map(String::as_str)
    }

    pub fn current_turn(&self) -> ClientId {
        self.current_turn
    }

    pub fn grant_turn(&mut self, client_id: ClientId) {
        self.current_turn = client_id;
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn record_win(&mut self, winner: ClientId) {
        self.game_over = true;
        self.winner = Some(winner);
    }

    pub fn winner(&self) -> Option<ClientId> {
        self.winner
    }

    /// Drops a player and their secret. Returns whether they were a member.
    pub fn remove_player(&mut self, client_id: ClientId) -> bool {
        let Some(index) = self.players.iter().position(|id| *id == client_id) else {
            return false;
        };
        self.players.remove(index);
        self.secrets.remove(&client_id);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_room_is_created_then_host_holds_the_turn() {
        let room = Room::new(7);
        assert_eq!(room.host(), Some(7));
        assert_eq!(room.current_turn(), 7);
        assert!(!room.is_full());
        assert!(!room.is_game_over());
    }

    #[test]
    fn when_second_player_joins_then_room_is_full() {
        let mut room = Room::new(7);
        room.join(8);
        assert!(room.is_full());
        assert_eq!(room.guest(), Some(8));
        assert_eq!(room.opponent_of(7), Some(8));
        assert_eq!(room.opponent_of(8), Some(7));
    }

    #[test]
    fn when_both_secrets_commit_then_count_reaches_capacity() {
        let mut room = Room::new(7);
        room.join(8);
        assert_eq!(room.commit_secret(7, "1234".to_string()), 1);
        assert_eq!(room.commit_secret(8, "5678".to_string()), 2);
        assert_eq!(room.secret_of(8), Some("5678"));
    }

    #[test]
    fn when_player_is_removed_then_secret_goes_with_them() {
        let mut room = Room::new(7);
        room.join(8);
        room.commit_secret(8, "5678".to_string());
        assert!(room.remove_player(8));
        assert_eq!(room.secret_of(8), None);
        assert!(!room.remove_player(8));
        assert!(!room.is_empty());
        assert!(room.remove_player(7));
        assert!(room.is_empty());
    }

    #[test]
    fn when_win_is_recorded_then_room_stays_closed() {
        let mut room = Room::new(7);
        room.join(8);
        room.record_win(7);
        assert!(room.is_game_over());
        assert_eq!(room.winner(), Some(7));
    }
}
